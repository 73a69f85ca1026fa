//! Controller/reliever medication vocabulary.
//!
//! Handles:
//! - Splitting comma-separated medication history fields
//! - Brand alias expansion (ventolin→Salbutamol, advair→Seretide)
//! - Filtering to the clinic's allowed set; unknown tokens are dropped

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Allowed medication names and their aliases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MedicationVocabulary {
    /// Canonical controller names
    pub controllers: Vec<String>,
    /// Canonical reliever names
    pub relievers: Vec<String>,
    /// Alias (lowercase) → canonical name
    pub aliases: HashMap<String, String>,
}

impl Default for MedicationVocabulary {
    fn default() -> Self {
        Self {
            controllers: vec!["Seretide".into(), "Budesonide".into(), "Symbicort".into()],
            relievers: vec!["Salbutamol".into(), "Berodual".into()],
            aliases: Self::default_aliases(),
        }
    }
}

impl MedicationVocabulary {
    /// Parse a controller history field.
    pub fn parse_controllers(&self, field: &str) -> Vec<String> {
        self.parse(field, &self.controllers)
    }

    /// Parse a reliever history field.
    pub fn parse_relievers(&self, field: &str) -> Vec<String> {
        self.parse(field, &self.relievers)
    }

    /// Canonical name for a token, if it maps to anything in `allowed`.
    pub fn canonicalize(&self, token: &str, allowed: &[String]) -> Option<String> {
        let lower = token.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }

        let expanded = self.aliases.get(&lower).map(String::as_str).unwrap_or(lower.as_str());
        allowed
            .iter()
            .find(|name| name.to_lowercase() == expanded.to_lowercase())
            .cloned()
    }

    /// Add a custom alias mapping.
    pub fn add_alias(&mut self, alias: &str, canonical: &str) {
        self.aliases.insert(alias.to_lowercase(), canonical.to_string());
    }

    fn parse(&self, field: &str, allowed: &[String]) -> Vec<String> {
        let mut parsed: Vec<String> = Vec::new();
        for token in field.split(',') {
            match self.canonicalize(token, allowed) {
                Some(name) if !parsed.contains(&name) => parsed.push(name),
                Some(_) => {}
                None if token.trim().is_empty() => {}
                None => tracing::debug!(token = token.trim(), "Dropped unrecognized medication"),
            }
        }
        parsed
    }

    /// Default brand and generic aliases.
    fn default_aliases() -> HashMap<String, String> {
        let mut map = HashMap::new();

        // Controllers
        map.insert("fluticasone/salmeterol".into(), "Seretide".into());
        map.insert("salmeterol/fluticasone".into(), "Seretide".into());
        map.insert("advair".into(), "Seretide".into());
        map.insert("pulmicort".into(), "Budesonide".into());
        map.insert("budesonide/formoterol".into(), "Symbicort".into());

        // Relievers
        map.insert("ventolin".into(), "Salbutamol".into());
        map.insert("albuterol".into(), "Salbutamol".into());
        map.insert("fenoterol/ipratropium".into(), "Berodual".into());

        map
    }
}
