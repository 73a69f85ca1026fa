//! Patient models.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult};

/// Sex category used to pick a reference-formula branch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SexCategory {
    Male,
    Female,
}

impl SexCategory {
    /// Parse a sex token or a name prefix (Mr/Mrs, นาย/นาง, ด.ช./ด.ญ.).
    pub fn from_prefix(token: &str) -> CalcResult<Self> {
        let lower = token.trim().to_lowercase();
        match lower.trim_end_matches('.') {
            "male" | "m" | "mr" | "boy" | "นาย" | "ด.ช" => Ok(Self::Male),
            "female" | "f" | "mrs" | "ms" | "miss" | "girl" | "นาง" | "นางสาว" | "ด.ญ" => {
                Ok(Self::Female)
            }
            _ => {
                tracing::warn!(token, "Rejected unknown sex category");
                Err(CalcError::UnknownValue {
                    field: "sex category",
                    value: token.to_string(),
                })
            }
        }
    }
}

impl FromStr for SexCategory {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_prefix(s)
    }
}

impl fmt::Display for SexCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
        }
    }
}

/// Demographics the engine needs for one patient.
///
/// Owned and persisted by the host registry; the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    /// Hospital number or other opaque identifier
    pub patient_id: String,
    /// Date of birth
    pub date_of_birth: NaiveDate,
    /// Height in cm (0 when unknown)
    pub height_cm: f64,
    /// Formula branch selector
    pub sex: SexCategory,
    /// Previously recorded personal-best reading (L/min)
    pub personal_best: Option<u32>,
}

impl PatientProfile {
    /// Create a profile with no recorded personal best.
    pub fn new(patient_id: &str, date_of_birth: NaiveDate, height_cm: f64, sex: SexCategory) -> Self {
        Self {
            patient_id: normalize_patient_id(patient_id),
            date_of_birth,
            height_cm,
            sex,
            personal_best: None,
        }
    }

    /// Set the recorded personal best.
    pub fn with_personal_best(mut self, personal_best: u32) -> Self {
        self.personal_best = Some(personal_best);
        self
    }

    /// Age in whole years on `as_of`.
    pub fn age_on(&self, as_of: NaiveDate) -> CalcResult<u32> {
        age_on(self.date_of_birth, as_of)
    }

    /// Personal best, ignoring a recorded 0.
    pub fn usable_personal_best(&self) -> Option<u32> {
        self.personal_best.filter(|&best| best > 0)
    }
}

/// Whole years between `date_of_birth` and `as_of`.
///
/// The count drops by one until the birthday has passed in the `as_of` year.
pub fn age_on(date_of_birth: NaiveDate, as_of: NaiveDate) -> CalcResult<u32> {
    if date_of_birth > as_of {
        return Err(CalcError::InvalidInput(format!(
            "date of birth {date_of_birth} is after {as_of}"
        )));
    }

    let mut years = as_of.year() - date_of_birth.year();
    if (as_of.month(), as_of.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }

    u32::try_from(years).map_err(|_| CalcError::InvalidInput(format!("age {years} out of range")))
}

/// Trim whitespace and drop zero padding from a hospital number.
pub fn normalize_patient_id(raw: &str) -> String {
    raw.trim().trim_start_matches('0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let dob = date(1990, 6, 15);
        assert_eq!(age_on(dob, date(2020, 6, 14)).unwrap(), 29);
        assert_eq!(age_on(dob, date(2020, 6, 15)).unwrap(), 30);
        assert_eq!(age_on(dob, date(2020, 12, 31)).unwrap(), 30);
    }

    #[test]
    fn test_age_on_birth_date_is_zero() {
        let dob = date(2024, 2, 29);
        assert_eq!(age_on(dob, dob).unwrap(), 0);
        assert_eq!(age_on(dob, date(2025, 2, 28)).unwrap(), 0);
        assert_eq!(age_on(dob, date(2025, 3, 1)).unwrap(), 1);
    }

    #[test]
    fn test_future_birth_date_rejected() {
        let result = age_on(date(2030, 1, 1), date(2026, 1, 1));
        assert!(matches!(result, Err(CalcError::InvalidInput(_))));
    }

    #[test]
    fn test_normalize_patient_id() {
        assert_eq!(normalize_patient_id("0012345"), "12345");
        assert_eq!(normalize_patient_id("  12345 "), "12345");
        assert_eq!(normalize_patient_id(""), "");
    }

    #[test]
    fn test_sex_from_prefix() {
        assert_eq!(SexCategory::from_prefix("นาย").unwrap(), SexCategory::Male);
        assert_eq!(SexCategory::from_prefix("ด.ช.").unwrap(), SexCategory::Male);
        assert_eq!(SexCategory::from_prefix("Mr.").unwrap(), SexCategory::Male);
        assert_eq!(SexCategory::from_prefix("นางสาว").unwrap(), SexCategory::Female);
        assert_eq!(SexCategory::from_prefix(" FEMALE ").unwrap(), SexCategory::Female);
        assert_eq!("ด.ญ.".parse::<SexCategory>().unwrap(), SexCategory::Female);
    }

    #[test]
    fn test_unknown_prefix_rejected() {
        let result = SexCategory::from_prefix("Dr.");
        assert!(matches!(result, Err(CalcError::UnknownValue { .. })));
    }

    #[test]
    fn test_usable_personal_best() {
        let profile = PatientProfile::new("007", date(1990, 1, 1), 170.0, SexCategory::Male);
        assert_eq!(profile.patient_id, "7");
        assert_eq!(profile.usable_personal_best(), None);
        assert_eq!(profile.clone().with_personal_best(0).usable_personal_best(), None);
        assert_eq!(profile.with_personal_best(450).usable_personal_best(), Some(450));
    }
}
