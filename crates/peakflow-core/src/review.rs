//! Inhaler technique re-assessment scheduling.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult};
use crate::models::VisitRecord;

/// How often technique must be re-assessed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReviewPolicy {
    pub interval_days: u32,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self { interval_days: 90 }
    }
}

impl ReviewPolicy {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.interval_days == 0 {
            return Err(ConfigError::Invalid("review interval must be positive".into()));
        }
        Ok(())
    }
}

/// Re-assessment state for one patient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewStatus {
    /// No assessment anywhere in the history
    Never,
    Overdue {
        days_overdue: i64,
        last_assessed: NaiveDate,
    },
    OnTrack {
        days_remaining: i64,
        last_assessed: NaiveDate,
    },
}

impl ReviewStatus {
    pub fn last_assessed(&self) -> Option<NaiveDate> {
        match self {
            Self::Never => None,
            Self::Overdue { last_assessed, .. } | Self::OnTrack { last_assessed, .. } => {
                Some(*last_assessed)
            }
        }
    }

    /// Whether an assessment should be done at the next visit.
    pub fn needs_assessment(&self) -> bool {
        !matches!(self, Self::OnTrack { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Overdue { .. } => "overdue",
            Self::OnTrack { .. } => "on-track",
        }
    }
}

/// Scheduler over a review policy.
pub struct ReviewScheduler<'a> {
    policy: &'a ReviewPolicy,
}

impl<'a> ReviewScheduler<'a> {
    pub fn new(policy: &'a ReviewPolicy) -> Self {
        Self { policy }
    }

    /// Date of the latest assessed visit, regardless of input order.
    pub fn last_assessment(&self, visits: &[VisitRecord]) -> Option<NaiveDate> {
        visits
            .iter()
            .filter(|visit| visit.technique_assessed())
            .map(|visit| visit.visit_date)
            .max()
    }

    /// Status as of `today`. Elapsed exactly equal to the interval is on-track.
    pub fn status(&self, visits: &[VisitRecord], today: NaiveDate) -> ReviewStatus {
        let Some(last_assessed) = self.last_assessment(visits) else {
            return ReviewStatus::Never;
        };

        let elapsed = (today - last_assessed).num_days();
        let interval = i64::from(self.policy.interval_days);

        if elapsed > interval {
            ReviewStatus::Overdue {
                days_overdue: elapsed - interval,
                last_assessed,
            }
        } else {
            ReviewStatus::OnTrack {
                days_remaining: interval - elapsed,
                last_assessed,
            }
        }
    }

    /// Date the next assessment falls due, if there has been one and the
    /// date is representable.
    pub fn next_due(&self, visits: &[VisitRecord]) -> Option<NaiveDate> {
        let interval = Duration::days(i64::from(self.policy.interval_days));
        self.last_assessment(visits)?.checked_add_signed(interval)
    }
}
