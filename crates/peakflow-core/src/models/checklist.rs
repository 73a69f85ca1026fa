//! Inhaler technique checklist models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult};

/// Number of steps in the metered-dose inhaler checklist.
pub const CHECKLIST_LEN: usize = 8;

/// Metered-dose inhaler steps, in assessment order.
pub const MDI_STEPS: [&str; CHECKLIST_LEN] = [
    "Shake the inhaler upright 3-4 times",
    "Hold the inhaler upright",
    "Breathe out fully through the mouth",
    "Keep the head upright",
    "Seal the lips around the mouthpiece",
    "Breathe in slowly and deeply while pressing the canister once",
    "Hold the breath for about 10 seconds",
    "Breathe out slowly through the mouth or nose",
];

/// Answers from one assessment session. Not persisted by the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TechniqueChecklist {
    /// Step results, step 1 first
    pub items: [bool; CHECKLIST_LEN],
    /// Patient was reminded to rinse the mouth
    #[serde(default)]
    pub rinse_advised: bool,
    /// Patient was reminded to clean the device
    #[serde(default)]
    pub cleaning_advised: bool,
}

impl TechniqueChecklist {
    /// Checklist with the given step results and no advisories.
    pub fn new(items: [bool; CHECKLIST_LEN]) -> Self {
        Self {
            items,
            rinse_advised: false,
            cleaning_advised: false,
        }
    }

    /// Build from a slice, which must hold exactly [`CHECKLIST_LEN`] answers.
    pub fn from_slice(items: &[bool]) -> CalcResult<Self> {
        let items: [bool; CHECKLIST_LEN] = items.try_into().map_err(|_| {
            CalcError::InvalidInput(format!(
                "checklist needs {CHECKLIST_LEN} items, got {}",
                items.len()
            ))
        })?;
        Ok(Self::new(items))
    }

    /// Every step passed.
    pub fn all_passed() -> Self {
        Self::new([true; CHECKLIST_LEN])
    }

    /// Result for a 1-indexed step, `None` when out of range.
    pub fn step(&self, position: usize) -> Option<bool> {
        position
            .checked_sub(1)
            .and_then(|index| self.items.get(index).copied())
    }

    /// Set a 1-indexed step. Out-of-range positions are ignored.
    pub fn with_step(mut self, position: usize, passed: bool) -> Self {
        if let Some(slot) = position.checked_sub(1).and_then(|i| self.items.get_mut(i)) {
            *slot = passed;
        }
        self
    }
}

/// Categorical result of a technique assessment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TechniqueOutcome {
    #[serde(rename = "Pass")]
    Pass,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    #[serde(rename = "Fail (Critical)")]
    CriticalFail,
}

impl TechniqueOutcome {
    /// Stored label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::NeedsImprovement => "Needs Improvement",
            Self::CriticalFail => "Fail (Critical)",
        }
    }
}

impl FromStr for TechniqueOutcome {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pass" => Ok(Self::Pass),
            "needs improvement" => Ok(Self::NeedsImprovement),
            "fail (critical)" | "critical fail" => Ok(Self::CriticalFail),
            _ => Err(CalcError::UnknownValue {
                field: "technique outcome",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TechniqueOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
