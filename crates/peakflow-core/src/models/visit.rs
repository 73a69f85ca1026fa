//! Clinic visit models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::checklist::TechniqueOutcome;
use crate::error::{CalcError, CalcResult};

/// Highest plausible peak flow reading (L/min).
pub const MAX_PLAUSIBLE_READING: u32 = 900;

/// Perceived symptom control at a visit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ControlLevel {
    #[serde(rename = "Well-controlled")]
    WellControlled,
    #[serde(rename = "Partly Controlled")]
    PartlyControlled,
    #[serde(rename = "Uncontrolled")]
    Uncontrolled,
}

impl ControlLevel {
    /// Stored label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::WellControlled => "Well-controlled",
            Self::PartlyControlled => "Partly Controlled",
            Self::Uncontrolled => "Uncontrolled",
        }
    }
}

impl FromStr for ControlLevel {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s
            .trim()
            .to_lowercase()
            .replace('-', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match key.as_str() {
            "well controlled" | "well" => Ok(Self::WellControlled),
            "partly controlled" | "partly" => Ok(Self::PartlyControlled),
            "uncontrolled" | "not controlled" => Ok(Self::Uncontrolled),
            _ => Err(CalcError::UnknownValue {
                field: "control level",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ControlLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One clinic visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitRecord {
    /// Patient identifier
    pub patient_id: String,
    /// Visit date
    pub visit_date: NaiveDate,
    /// Peak flow in L/min; 0 means not measured
    pub reading: u32,
    /// Perceived control
    pub control_level: ControlLevel,
    /// Technique outcome, present only when an assessment was done this visit
    pub technique: Option<TechniqueOutcome>,
    /// Comma-separated controller medications
    pub controller: Option<String>,
    /// Comma-separated reliever medications
    pub reliever: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
}

impl VisitRecord {
    /// Create a visit without technique assessment, medications or notes.
    pub fn new(
        patient_id: String,
        visit_date: NaiveDate,
        reading: u32,
        control_level: ControlLevel,
    ) -> Self {
        Self {
            patient_id,
            visit_date,
            reading,
            control_level,
            technique: None,
            controller: None,
            reliever: None,
            notes: None,
        }
    }

    /// Attach a technique assessment outcome.
    pub fn with_technique(mut self, outcome: TechniqueOutcome) -> Self {
        self.technique = Some(outcome);
        self
    }

    /// Whether a technique assessment happened at this visit.
    pub fn technique_assessed(&self) -> bool {
        self.technique.is_some()
    }

    /// The reading, or `None` when it was not measured.
    pub fn measured_reading(&self) -> Option<u32> {
        (self.reading > 0).then_some(self.reading)
    }
}

/// Reject implausibly high readings. 0 passes as "not measured".
pub fn validate_reading(reading: u32) -> CalcResult<u32> {
    if reading > MAX_PLAUSIBLE_READING {
        return Err(CalcError::InvalidInput(format!(
            "reading {reading} exceeds {MAX_PLAUSIBLE_READING} L/min"
        )));
    }
    Ok(reading)
}

/// Sort visits by date. Same-day visits keep their input order.
pub fn sorted_by_date(visits: &[VisitRecord]) -> Vec<&VisitRecord> {
    let mut ordered: Vec<&VisitRecord> = visits.iter().collect();
    ordered.sort_by_key(|visit| visit.visit_date);
    ordered
}
