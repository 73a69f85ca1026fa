//! Peak Flow Core Library
//!
//! Decision support for asthma/COPD follow-up: predicted peak flow, action-plan
//! zones, inhaler technique scoring and re-assessment scheduling.
//!
//! # Architecture
//!
//! ```text
//! PatientProfile ──► ReferenceFlowCalculator ──► ReferenceFlow
//!                                                     │
//!                         ┌───────────────────────────┼───────────────────┐
//!                         ▼                           ▼                   ▼
//! VisitRecord[] ──► ZoneClassifier           PercentPredicted   TimeSeriesProjector
//!       │
//!       └────────► ReviewScheduler ──► ReviewStatus
//!
//! TechniqueChecklist ──► TechniqueScorer ──► TechniqueScore
//! ```
//!
//! Every operation is a pure function of its inputs. "Today" is always passed
//! in; nothing reads the clock.
//!
//! # Modules
//!
//! - [`models`]: Domain types (PatientProfile, VisitRecord, TechniqueChecklist)
//! - [`config`]: Clinic-tunable thresholds and vocabularies
//! - [`reference`]: Predicted peak flow and the personal-best fallback
//! - [`zone`]: Percent predicted and Green/Yellow/Red classification
//! - [`technique`]: Inhaler checklist scoring
//! - [`review`]: Technique re-assessment due dates
//! - [`chart`]: Trend series for plotting
//! - [`medication`]: Medication history parsing
//! - [`assessment`]: Per-patient snapshot

pub mod assessment;
pub mod chart;
pub mod config;
pub mod error;
pub mod medication;
pub mod models;
pub mod reference;
pub mod review;
pub mod technique;
pub mod zone;

// Re-export commonly used types
pub use assessment::{assess_patient, LatestReading, PatientAssessment};
pub use chart::{ChartPoint, ChartSeries, TimeSeriesProjector};
pub use config::{ConfigError, EngineConfig};
pub use error::{CalcError, CalcResult};
pub use medication::MedicationVocabulary;
pub use models::{
    ControlLevel, PatientProfile, SexCategory, TechniqueChecklist, TechniqueOutcome, VisitRecord,
};
pub use reference::{ReferenceFlow, ReferenceFlowCalculator, ReferenceFormulas};
pub use review::{ReviewPolicy, ReviewScheduler, ReviewStatus};
pub use technique::{TechniquePolicy, TechniqueScore, TechniqueScorer};
pub use zone::{percent_predicted, Zone, ZoneClassifier, ZoneLimits, ZoneResult, ZoneThresholds};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PeakFlowError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not measured: {0}")]
    NotMeasured(String),

    #[error("Division undefined: {0}")]
    DivisionUndefined(String),

    #[error("No reference: {0}")]
    NoReference(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<CalcError> for PeakFlowError {
    fn from(e: CalcError) -> Self {
        match e {
            CalcError::InvalidInput(_) | CalcError::UnknownValue { .. } => {
                PeakFlowError::InvalidInput(e.to_string())
            }
            CalcError::NotMeasured => PeakFlowError::NotMeasured(e.to_string()),
            CalcError::DivisionUndefined => PeakFlowError::DivisionUndefined(e.to_string()),
            CalcError::NoReference => PeakFlowError::NoReference(e.to_string()),
        }
    }
}

impl From<ConfigError> for PeakFlowError {
    fn from(e: ConfigError) -> Self {
        PeakFlowError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for PeakFlowError {
    fn from(e: serde_json::Error) -> Self {
        PeakFlowError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Create an engine from a JSON configuration, or the defaults when `None`.
#[uniffi::export]
pub fn new_engine(config_json: Option<String>) -> Result<Arc<PeakFlowEngine>, PeakFlowError> {
    let config = match config_json {
        Some(json) => EngineConfig::from_json(&json)?,
        None => EngineConfig::default(),
    };
    Ok(Arc::new(PeakFlowEngine { config }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Stateless engine bound to one clinic configuration.
#[derive(uniffi::Object)]
pub struct PeakFlowEngine {
    config: EngineConfig,
}

impl PeakFlowEngine {
    /// Engine over an already validated configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[uniffi::export]
impl PeakFlowEngine {
    /// Active configuration as JSON.
    pub fn config_json(&self) -> Result<String, PeakFlowError> {
        Ok(self.config.to_json()?)
    }

    // =========================================================================
    // Reference Flow
    // =========================================================================

    /// Predicted flow for demographics; 0 means no usable prediction.
    pub fn predicted_flow(&self, age: u32, height_cm: f64, sex: String) -> Result<u32, PeakFlowError> {
        let sex = SexCategory::from_prefix(&sex)?;
        let calculator = ReferenceFlowCalculator::new(&self.config.formulas);
        Ok(calculator.predict(age, height_cm, sex)?)
    }

    /// Reference flow for a patient, with personal-best fallback.
    pub fn reference_flow(
        &self,
        patient: FfiPatient,
        as_of: String,
    ) -> Result<FfiReferenceFlow, PeakFlowError> {
        let profile = PatientProfile::try_from(patient)?;
        let as_of = parse_date("as_of", &as_of)?;
        let calculator = ReferenceFlowCalculator::new(&self.config.formulas);
        Ok(calculator.resolve(&profile, as_of)?.into())
    }

    // =========================================================================
    // Zones
    // =========================================================================

    /// Integer percent of reference.
    pub fn percent_predicted(&self, reading: u32, reference: u32) -> Result<u32, PeakFlowError> {
        Ok(percent_predicted(reading, reference)?)
    }

    /// Classify a reading into Green/Yellow/Red.
    pub fn classify_reading(
        &self,
        reading: u32,
        reference: u32,
    ) -> Result<FfiZoneResult, PeakFlowError> {
        let classifier = ZoneClassifier::new(&self.config.zones);
        Ok(classifier.classify(reading, reference)?.into())
    }

    /// Band limits for the action-plan card.
    pub fn zone_limits(&self, reference: u32) -> Result<FfiZoneLimits, PeakFlowError> {
        Ok(ZoneLimits::for_reference(reference, &self.config.zones)?.into())
    }

    // =========================================================================
    // Technique
    // =========================================================================

    /// Score an 8-step checklist.
    pub fn score_technique(
        &self,
        items: Vec<bool>,
        rinse_advised: bool,
        cleaning_advised: bool,
    ) -> Result<FfiTechniqueScore, PeakFlowError> {
        let mut checklist = TechniqueChecklist::from_slice(&items)?;
        checklist.rinse_advised = rinse_advised;
        checklist.cleaning_advised = cleaning_advised;
        let scorer = TechniqueScorer::new(&self.config.technique);
        Ok(scorer.score(&checklist).into())
    }

    /// Technique re-assessment status as of `today`.
    pub fn review_status(
        &self,
        visits: Vec<FfiVisit>,
        today: String,
    ) -> Result<FfiReviewStatus, PeakFlowError> {
        let visits = convert_visits(visits)?;
        let today = parse_date("today", &today)?;
        let scheduler = ReviewScheduler::new(&self.config.review);
        Ok(scheduler.status(&visits, today).into())
    }

    // =========================================================================
    // Chart & Medications
    // =========================================================================

    /// Chart points for measured visits. A reference of 0 leaves zones empty.
    pub fn chart_points(
        &self,
        visits: Vec<FfiVisit>,
        reference: u32,
    ) -> Result<Vec<FfiChartPoint>, PeakFlowError> {
        let visits = convert_visits(visits)?;
        let reference = if reference > 0 {
            ReferenceFlow::Predicted(reference)
        } else {
            ReferenceFlow::NoReference
        };
        let projector = TimeSeriesProjector::new(&self.config.zones)?;
        let series = projector.project(&visits, reference);
        Ok(series.points().map(FfiChartPoint::from).collect())
    }

    pub fn parse_controllers(&self, field: String) -> Vec<String> {
        self.config.medications.parse_controllers(&field)
    }

    pub fn parse_relievers(&self, field: String) -> Vec<String> {
        self.config.medications.parse_relievers(&field)
    }

    // =========================================================================
    // Assessment
    // =========================================================================

    /// Full patient snapshot as JSON.
    pub fn assess_patient_json(
        &self,
        patient: FfiPatient,
        visits: Vec<FfiVisit>,
        as_of: String,
    ) -> Result<String, PeakFlowError> {
        let profile = PatientProfile::try_from(patient)?;
        let visits = convert_visits(visits)?;
        let as_of = parse_date("as_of", &as_of)?;
        let assessment = assess_patient(&profile, &visits, as_of, &self.config)?;
        Ok(serde_json::to_string_pretty(&assessment)?)
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, PeakFlowError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| PeakFlowError::InvalidInput(format!("{field} {value:?}: {e}")))
}

fn convert_visits(visits: Vec<FfiVisit>) -> Result<Vec<VisitRecord>, PeakFlowError> {
    visits.into_iter().map(VisitRecord::try_from).collect()
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub patient_id: String,
    /// YYYY-MM-DD
    pub date_of_birth: String,
    pub height_cm: f64,
    /// Sex token or name prefix
    pub sex: String,
    pub personal_best: Option<u32>,
}

impl TryFrom<FfiPatient> for PatientProfile {
    type Error = PeakFlowError;

    fn try_from(patient: FfiPatient) -> Result<Self, Self::Error> {
        let date_of_birth = parse_date("date_of_birth", &patient.date_of_birth)?;
        let sex = SexCategory::from_prefix(&patient.sex)?;
        let mut profile = PatientProfile::new(&patient.patient_id, date_of_birth, patient.height_cm, sex);
        profile.personal_best = patient.personal_best;
        Ok(profile)
    }
}

/// FFI-safe visit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisit {
    pub patient_id: String,
    /// YYYY-MM-DD
    pub visit_date: String,
    /// 0 when not measured
    pub reading: u32,
    pub control_level: String,
    /// Technique outcome label, only when assessed at this visit
    pub technique: Option<String>,
    pub controller: Option<String>,
    pub reliever: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<FfiVisit> for VisitRecord {
    type Error = PeakFlowError;

    fn try_from(visit: FfiVisit) -> Result<Self, Self::Error> {
        let technique = visit
            .technique
            .as_deref()
            .map(str::parse::<TechniqueOutcome>)
            .transpose()?;
        Ok(VisitRecord {
            patient_id: models::normalize_patient_id(&visit.patient_id),
            visit_date: parse_date("visit_date", &visit.visit_date)?,
            reading: models::validate_reading(visit.reading)?,
            control_level: visit.control_level.parse()?,
            technique,
            controller: visit.controller,
            reliever: visit.reliever,
            notes: visit.notes,
        })
    }
}

/// FFI-safe reference flow.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReferenceFlow {
    /// "predicted", "personal_best" or "none"
    pub source: String,
    /// 0 when there is no reference
    pub value: u32,
}

impl From<ReferenceFlow> for FfiReferenceFlow {
    fn from(reference: ReferenceFlow) -> Self {
        let source = match reference {
            ReferenceFlow::Predicted(_) => "predicted",
            ReferenceFlow::PersonalBest(_) => "personal_best",
            ReferenceFlow::NoReference => "none",
        };
        Self {
            source: source.to_string(),
            value: reference.value().unwrap_or(0),
        }
    }
}

/// FFI-safe zone result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiZoneResult {
    pub zone: String,
    pub title: String,
    pub percent: u32,
    pub color: String,
    pub advisory: String,
}

impl From<ZoneResult> for FfiZoneResult {
    fn from(result: ZoneResult) -> Self {
        Self {
            zone: result.zone.label().to_string(),
            title: result.zone.title().to_string(),
            percent: result.percent,
            color: result.color,
            advisory: result.advisory,
        }
    }
}

/// FFI-safe zone limits.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiZoneLimits {
    pub reference: u32,
    pub green_from: u32,
    pub yellow_from: u32,
}

impl From<ZoneLimits> for FfiZoneLimits {
    fn from(limits: ZoneLimits) -> Self {
        Self {
            reference: limits.reference,
            green_from: limits.green_from,
            yellow_from: limits.yellow_from,
        }
    }
}

/// FFI-safe technique score.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTechniqueScore {
    pub score: u32,
    pub outcome: String,
    pub deficit: u32,
    pub failed_items: Vec<u32>,
    pub critical_failures: Vec<u32>,
    pub rinse_advised: bool,
    pub cleaning_advised: bool,
    pub summary: String,
}

impl From<TechniqueScore> for FfiTechniqueScore {
    fn from(score: TechniqueScore) -> Self {
        let positions = |items: &[usize]| items.iter().map(|&p| p as u32).collect::<Vec<_>>();
        Self {
            score: score.score,
            outcome: score.outcome.label().to_string(),
            deficit: score.deficit,
            failed_items: positions(&score.failed_items),
            critical_failures: positions(&score.critical_failures),
            rinse_advised: score.rinse_advised,
            cleaning_advised: score.cleaning_advised,
            summary: score.summary,
        }
    }
}

/// FFI-safe review status.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReviewStatus {
    /// "never", "overdue" or "on-track"
    pub status: String,
    /// Days overdue or days remaining; 0 for "never"
    pub days: i64,
    pub last_assessed: Option<String>,
}

impl From<ReviewStatus> for FfiReviewStatus {
    fn from(status: ReviewStatus) -> Self {
        let days = match status {
            ReviewStatus::Never => 0,
            ReviewStatus::Overdue { days_overdue, .. } => days_overdue,
            ReviewStatus::OnTrack { days_remaining, .. } => days_remaining,
        };
        Self {
            status: status.label().to_string(),
            days,
            last_assessed: status.last_assessed().map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// FFI-safe chart point.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiChartPoint {
    pub date: String,
    pub reading: u32,
    pub zone: Option<String>,
}

impl From<ChartPoint> for FfiChartPoint {
    fn from(point: ChartPoint) -> Self {
        Self {
            date: point.date.format("%Y-%m-%d").to_string(),
            reading: point.reading,
            zone: point.zone.map(|zone| zone.label().to_string()),
        }
    }
}
