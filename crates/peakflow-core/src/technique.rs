//! Inhaler technique scoring.
//!
//! Outcome rules, in priority order:
//! 1. any safety-critical step failed → Critical Fail
//! 2. all steps passed → Pass
//! 3. otherwise → Needs Improvement

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult};
use crate::models::{TechniqueChecklist, TechniqueOutcome, CHECKLIST_LEN, MDI_STEPS};

/// Which checklist steps are safety-critical.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TechniquePolicy {
    /// 1-indexed step positions
    pub critical_items: Vec<usize>,
}

impl Default for TechniquePolicy {
    fn default() -> Self {
        // Lip seal, actuation with inhalation, breath-hold.
        Self {
            critical_items: vec![5, 6, 7],
        }
    }
}

impl TechniquePolicy {
    pub fn validate(&self) -> ConfigResult<()> {
        for (i, &position) in self.critical_items.iter().enumerate() {
            if !(1..=CHECKLIST_LEN).contains(&position) {
                return Err(ConfigError::Invalid(format!(
                    "critical item {position} outside 1..={CHECKLIST_LEN}"
                )));
            }
            if self.critical_items[..i].contains(&position) {
                return Err(ConfigError::Invalid(format!(
                    "critical item {position} listed twice"
                )));
            }
        }
        Ok(())
    }

    pub fn is_critical(&self, position: usize) -> bool {
        self.critical_items.contains(&position)
    }
}

/// Scored checklist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechniqueScore {
    /// Number of passed steps
    pub score: u32,
    pub outcome: TechniqueOutcome,
    /// Steps short of a perfect score
    pub deficit: u32,
    /// 1-indexed failed steps, ascending
    pub failed_items: Vec<usize>,
    /// Failed steps that are safety-critical
    pub critical_failures: Vec<usize>,
    pub rinse_advised: bool,
    pub cleaning_advised: bool,
    /// One-line summary for the visit log
    pub summary: String,
}

impl TechniqueScore {
    /// Failed steps joined with commas, or "None".
    pub fn failed_items_label(&self) -> String {
        join_positions(&self.failed_items)
    }

    /// Descriptions of the failed safety-critical steps.
    pub fn critical_failure_steps(&self) -> Vec<&'static str> {
        self.critical_failures
            .iter()
            .filter_map(|&position| MDI_STEPS.get(position - 1).copied())
            .collect()
    }
}

/// Checklist scorer.
pub struct TechniqueScorer<'a> {
    policy: &'a TechniquePolicy,
}

impl<'a> TechniqueScorer<'a> {
    pub fn new(policy: &'a TechniquePolicy) -> Self {
        Self { policy }
    }

    /// Score one checklist.
    pub fn score(&self, checklist: &TechniqueChecklist) -> TechniqueScore {
        let failed_items: Vec<usize> = checklist
            .items
            .iter()
            .enumerate()
            .filter(|&(_, &passed)| !passed)
            .map(|(index, _)| index + 1)
            .collect();

        let critical_failures: Vec<usize> = failed_items
            .iter()
            .copied()
            .filter(|&position| self.policy.is_critical(position))
            .collect();

        let max_score = CHECKLIST_LEN as u32;
        let score = max_score - failed_items.len() as u32;

        let outcome = if !critical_failures.is_empty() {
            TechniqueOutcome::CriticalFail
        } else if failed_items.is_empty() {
            TechniqueOutcome::Pass
        } else {
            TechniqueOutcome::NeedsImprovement
        };

        let mut summary = format!(
            "Score: {score}/{max_score} ({}) | Fail: {}",
            outcome.label(),
            join_positions(&failed_items)
        );
        if checklist.rinse_advised {
            summary.push_str(" | Adv:Rinse");
        }
        if checklist.cleaning_advised {
            summary.push_str(" | Adv:Clean");
        }

        if outcome == TechniqueOutcome::CriticalFail {
            tracing::debug!(?critical_failures, score, "Technique critical fail");
        }

        TechniqueScore {
            score,
            outcome,
            deficit: max_score - score,
            failed_items,
            critical_failures,
            rinse_advised: checklist.rinse_advised,
            cleaning_advised: checklist.cleaning_advised,
            summary,
        }
    }
}

fn join_positions(positions: &[usize]) -> String {
    if positions.is_empty() {
        return "None".to_string();
    }
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
