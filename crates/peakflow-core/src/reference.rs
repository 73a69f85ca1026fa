//! Predicted (reference) peak flow.
//!
//! Formulas are linear regressions on height and age, one per age band and sex.
//! The band is chosen by an age threshold; there is no interpolation between
//! pediatric and adult values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult};
use crate::error::{CalcError, CalcResult};
use crate::models::{PatientProfile, SexCategory};

/// `height_coef * height_cm + age_coef * age + intercept`, in L/min.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RegressionFormula {
    pub height_coef: f64,
    pub age_coef: f64,
    pub intercept: f64,
}

impl RegressionFormula {
    pub const fn new(height_coef: f64, age_coef: f64, intercept: f64) -> Self {
        Self {
            height_coef,
            age_coef,
            intercept,
        }
    }

    /// Raw regression value, unrounded and unclamped.
    pub fn evaluate(&self, age: u32, height_cm: f64) -> f64 {
        self.height_coef * height_cm + self.age_coef * f64::from(age) + self.intercept
    }

    fn is_finite(&self) -> bool {
        self.height_coef.is_finite() && self.age_coef.is_finite() && self.intercept.is_finite()
    }
}

/// Formula set supplied by the clinic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReferenceFormulas {
    /// Youngest age that uses the adult formulas
    pub adult_min_age: u32,
    pub adult_male: RegressionFormula,
    pub adult_female: RegressionFormula,
    pub pediatric_male: RegressionFormula,
    pub pediatric_female: RegressionFormula,
}

impl Default for ReferenceFormulas {
    fn default() -> Self {
        // Children: (height - 100) * 5 + 100, no age or sex term.
        let pediatric = RegressionFormula::new(5.0, 0.0, -400.0);
        Self {
            adult_min_age: 18,
            adult_male: RegressionFormula::new(5.48, -1.51, -279.7),
            adult_female: RegressionFormula::new(3.72, -2.24, -96.6),
            pediatric_male: pediatric,
            pediatric_female: pediatric,
        }
    }
}

impl ReferenceFormulas {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.adult_min_age == 0 {
            return Err(ConfigError::Invalid("adult_min_age must be positive".into()));
        }
        let all = [
            &self.adult_male,
            &self.adult_female,
            &self.pediatric_male,
            &self.pediatric_female,
        ];
        if all.iter().any(|formula| !formula.is_finite()) {
            return Err(ConfigError::Invalid("formula coefficients must be finite".into()));
        }
        Ok(())
    }
}

/// Where a patient's reference value came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum ReferenceFlow {
    /// Computed from demographics
    Predicted(u32),
    /// Recorded personal best, used when the prediction is 0
    PersonalBest(u32),
    /// Nothing usable; zones cannot be computed
    NoReference,
}

impl ReferenceFlow {
    /// The reference value, if any.
    pub fn value(&self) -> Option<u32> {
        match self {
            Self::Predicted(value) | Self::PersonalBest(value) => Some(*value),
            Self::NoReference => None,
        }
    }

    /// The reference value, or [`CalcError::NoReference`].
    pub fn require(&self) -> CalcResult<u32> {
        self.value().ok_or(CalcError::NoReference)
    }
}

/// Predicted peak flow calculator.
pub struct ReferenceFlowCalculator<'a> {
    formulas: &'a ReferenceFormulas,
}

impl<'a> ReferenceFlowCalculator<'a> {
    pub fn new(formulas: &'a ReferenceFormulas) -> Self {
        Self { formulas }
    }

    /// Formula branch for an age and sex.
    pub fn formula_for(&self, age: u32, sex: SexCategory) -> &'a RegressionFormula {
        let adult = age >= self.formulas.adult_min_age;
        match (adult, sex) {
            (true, SexCategory::Male) => &self.formulas.adult_male,
            (true, SexCategory::Female) => &self.formulas.adult_female,
            (false, SexCategory::Male) => &self.formulas.pediatric_male,
            (false, SexCategory::Female) => &self.formulas.pediatric_female,
        }
    }

    /// Predicted flow rounded to L/min.
    ///
    /// Returns 0 when the regression is not positive or height is unknown (0).
    /// Out-of-range ages and heights still produce a value.
    pub fn predict(&self, age: u32, height_cm: f64, sex: SexCategory) -> CalcResult<u32> {
        if !height_cm.is_finite() || height_cm < 0.0 {
            return Err(CalcError::InvalidInput(format!("height {height_cm} cm")));
        }
        if height_cm == 0.0 {
            return Ok(0);
        }

        let raw = self.formula_for(age, sex).evaluate(age, height_cm);
        let predicted = if raw.is_finite() && raw > 0.0 {
            raw.round().min(f64::from(u32::MAX)) as u32
        } else {
            0
        };

        tracing::debug!(age, height_cm, %sex, predicted, "Computed predicted peak flow");
        Ok(predicted)
    }

    /// Reference for a patient on `as_of`: prediction, then personal best.
    pub fn resolve(&self, profile: &PatientProfile, as_of: NaiveDate) -> CalcResult<ReferenceFlow> {
        let age = profile.age_on(as_of)?;
        let predicted = self.predict(age, profile.height_cm, profile.sex)?;
        if predicted > 0 {
            return Ok(ReferenceFlow::Predicted(predicted));
        }

        match profile.usable_personal_best() {
            Some(best) => {
                tracing::warn!(
                    patient_id = %profile.patient_id,
                    personal_best = best,
                    "Prediction unusable, falling back to personal best"
                );
                Ok(ReferenceFlow::PersonalBest(best))
            }
            None => {
                tracing::warn!(patient_id = %profile.patient_id, "No usable reference flow");
                Ok(ReferenceFlow::NoReference)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_adult_male_formula() {
        let formulas = ReferenceFormulas::default();
        let calc = ReferenceFlowCalculator::new(&formulas);
        // 5.48*170 - 1.51*30 - 279.7 = 606.6
        assert_eq!(calc.predict(30, 170.0, SexCategory::Male).unwrap(), 607);
    }

    #[test]
    fn test_adult_female_formula() {
        let formulas = ReferenceFormulas::default();
        let calc = ReferenceFlowCalculator::new(&formulas);
        // 3.72*160 - 2.24*30 - 96.6 = 431.4
        assert_eq!(calc.predict(30, 160.0, SexCategory::Female).unwrap(), 431);
    }

    #[test]
    fn test_pediatric_branch_by_threshold() {
        let formulas = ReferenceFormulas::default();
        let calc = ReferenceFlowCalculator::new(&formulas);
        assert_eq!(calc.predict(10, 140.0, SexCategory::Male).unwrap(), 300);
        assert_eq!(calc.predict(17, 140.0, SexCategory::Female).unwrap(), 300);
        // 18 switches to the adult formula: 3.72*140 - 2.24*18 - 96.6 = 383.88
        assert_eq!(calc.predict(18, 140.0, SexCategory::Female).unwrap(), 384);
    }

    #[test]
    fn test_degenerate_inputs_return_zero() {
        let formulas = ReferenceFormulas::default();
        let calc = ReferenceFlowCalculator::new(&formulas);
        assert_eq!(calc.predict(100, 50.0, SexCategory::Male).unwrap(), 0);
        assert_eq!(calc.predict(30, 0.0, SexCategory::Male).unwrap(), 0);
        assert_eq!(calc.predict(5, 60.0, SexCategory::Female).unwrap(), 0);
    }

    #[test]
    fn test_negative_height_rejected() {
        let formulas = ReferenceFormulas::default();
        let calc = ReferenceFlowCalculator::new(&formulas);
        assert!(matches!(
            calc.predict(30, -170.0, SexCategory::Male),
            Err(CalcError::InvalidInput(_))
        ));
        assert!(calc.predict(30, f64::NAN, SexCategory::Male).is_err());
    }

    #[test]
    fn test_predict_is_idempotent() {
        let formulas = ReferenceFormulas::default();
        let calc = ReferenceFlowCalculator::new(&formulas);
        let first = calc.predict(30, 170.0, SexCategory::Male).unwrap();
        let second = calc.predict(30, 170.0, SexCategory::Male).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_fallback_chain() {
        let formulas = ReferenceFormulas::default();
        let calc = ReferenceFlowCalculator::new(&formulas);
        let today = date(2026, 1, 1);

        let normal = PatientProfile::new("1", date(1996, 1, 1), 170.0, SexCategory::Male);
        assert_eq!(calc.resolve(&normal, today).unwrap(), ReferenceFlow::Predicted(607));

        let no_height = PatientProfile::new("2", date(1996, 1, 1), 0.0, SexCategory::Male);
        assert_eq!(calc.resolve(&no_height, today).unwrap(), ReferenceFlow::NoReference);

        let with_best = no_height.clone().with_personal_best(480);
        assert_eq!(calc.resolve(&with_best, today).unwrap(), ReferenceFlow::PersonalBest(480));

        let zero_best = no_height.with_personal_best(0);
        assert_eq!(calc.resolve(&zero_best, today).unwrap(), ReferenceFlow::NoReference);
    }

    #[test]
    fn test_reference_flow_require() {
        assert_eq!(ReferenceFlow::Predicted(500).require().unwrap(), 500);
        assert_eq!(ReferenceFlow::PersonalBest(420).value(), Some(420));
        assert_eq!(ReferenceFlow::NoReference.require(), Err(CalcError::NoReference));
    }

    #[test]
    fn test_reference_flow_serde_shape() {
        let json = serde_json::to_value(ReferenceFlow::PersonalBest(450)).unwrap();
        assert_eq!(json, serde_json::json!({"source": "personal_best", "value": 450}));
    }

    #[test]
    fn test_custom_formula_swappable() {
        let formulas = ReferenceFormulas {
            adult_male: RegressionFormula::new(0.0, 0.0, 500.0),
            ..ReferenceFormulas::default()
        };
        let calc = ReferenceFlowCalculator::new(&formulas);
        assert_eq!(calc.predict(40, 175.0, SexCategory::Male).unwrap(), 500);
    }

    #[test]
    fn test_invalid_formulas_rejected() {
        let mut formulas = ReferenceFormulas::default();
        formulas.adult_female.intercept = f64::INFINITY;
        assert!(formulas.validate().is_err());

        let formulas = ReferenceFormulas {
            adult_min_age: 0,
            ..ReferenceFormulas::default()
        };
        assert!(formulas.validate().is_err());
    }
}
