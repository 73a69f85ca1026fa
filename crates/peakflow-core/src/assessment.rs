//! Per-patient snapshot combining every calculator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{CalcError, CalcResult};
use crate::models::{sorted_by_date, ControlLevel, PatientProfile, TechniqueOutcome, VisitRecord};
use crate::reference::{ReferenceFlow, ReferenceFlowCalculator};
use crate::review::{ReviewScheduler, ReviewStatus};
use crate::zone::{ZoneClassifier, ZoneLimits, ZoneResult};

/// Most recent measured reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatestReading {
    pub date: NaiveDate,
    pub reading: u32,
    /// `None` when there is no reference flow
    pub result: Option<ZoneResult>,
}

/// What a clinician sees at the top of a patient's follow-up page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientAssessment {
    pub patient_id: String,
    pub age: u32,
    pub reference: ReferenceFlow,
    pub zone_limits: Option<ZoneLimits>,
    pub last_visit: Option<NaiveDate>,
    pub latest_reading: Option<LatestReading>,
    pub latest_control: Option<ControlLevel>,
    pub latest_technique: Option<TechniqueOutcome>,
    pub review: ReviewStatus,
    /// Controllers carried over from the last visit
    pub controllers: Vec<String>,
    /// Relievers carried over from the last visit
    pub relievers: Vec<String>,
}

/// Build the snapshot for one patient as of `as_of`.
///
/// A configuration that fails [`EngineConfig::validate`] is `InvalidInput`.
pub fn assess_patient(
    profile: &PatientProfile,
    visits: &[VisitRecord],
    as_of: NaiveDate,
    config: &EngineConfig,
) -> CalcResult<PatientAssessment> {
    config.validate()?;
    let age = profile.age_on(as_of)?;
    let reference = ReferenceFlowCalculator::new(&config.formulas).resolve(profile, as_of)?;
    let zone_limits = match reference.value() {
        Some(value) => Some(ZoneLimits::for_reference(value, &config.zones)?),
        None => None,
    };

    let ordered = sorted_by_date(visits);
    let last = ordered.last().copied();

    let classifier = ZoneClassifier::new(&config.zones);
    let latest_reading = match ordered.iter().rev().find(|v| v.measured_reading().is_some()) {
        Some(visit) => {
            let result = match reference.value() {
                Some(value) => Some(classifier.classify(visit.reading, value)?),
                None => None,
            };
            Some(LatestReading {
                date: visit.visit_date,
                reading: visit.reading,
                result,
            })
        }
        None => None,
    };

    let latest_technique = ordered.iter().rev().find_map(|visit| visit.technique);
    let review = ReviewScheduler::new(&config.review).status(visits, as_of);

    let vocab = &config.medications;
    let controllers = last
        .and_then(|visit| visit.controller.as_deref())
        .map(|field| vocab.parse_controllers(field))
        .unwrap_or_default();
    let relievers = last
        .and_then(|visit| visit.reliever.as_deref())
        .map(|field| vocab.parse_relievers(field))
        .unwrap_or_default();

    Ok(PatientAssessment {
        patient_id: profile.patient_id.clone(),
        age,
        reference,
        zone_limits,
        last_visit: last.map(|visit| visit.visit_date),
        latest_reading,
        latest_control: last.map(|visit| visit.control_level),
        latest_technique,
        review,
        controllers,
        relievers,
    })
}
