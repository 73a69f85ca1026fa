//! Clinic-tunable policy.
//!
//! Every threshold the engine uses lives here so a deploying clinic can retune
//! it without touching classification logic. Sections may be omitted from the
//! JSON form; missing fields fall back to [`Default`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::medication::MedicationVocabulary;
use crate::reference::ReferenceFormulas;
use crate::review::ReviewPolicy;
use crate::technique::TechniquePolicy;
use crate::zone::ZoneThresholds;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Full engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub zones: ZoneThresholds,
    pub review: ReviewPolicy,
    pub technique: TechniquePolicy,
    pub formulas: ReferenceFormulas,
    pub medications: MedicationVocabulary,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.zones.validate()?;
        self.review.validate()?;
        self.technique.validate()?;
        self.formulas.validate()?;
        Ok(())
    }
}
