//! Traffic-light zones and percent of predicted.
//!
//! A reading is compared to the patient's reference flow:
//!
//! ```text
//! ratio >= green_min               → Green
//! yellow_min <= ratio < green_min  → Yellow
//! ratio < yellow_min               → Red
//! ```
//!
//! Each band includes its lower bound. A reading of 0 is "not measured" and
//! never classified.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult};
use crate::error::{CalcError, CalcResult};

/// Zone boundaries as fractions of the reference flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZoneThresholds {
    /// Lowest ratio that is Green
    pub green_min: f64,
    /// Lowest ratio that is Yellow
    pub yellow_min: f64,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            green_min: 0.80,
            yellow_min: 0.60,
        }
    }
}

impl ZoneThresholds {
    /// Require `0 < yellow_min < green_min <= 1`.
    pub fn validate(&self) -> ConfigResult<()> {
        let ordered = self.yellow_min > 0.0
            && self.yellow_min < self.green_min
            && self.green_min <= 1.0;
        if !ordered {
            return Err(ConfigError::Invalid(format!(
                "zone thresholds must satisfy 0 < yellow_min < green_min <= 1 (got {} / {})",
                self.yellow_min, self.green_min
            )));
        }
        Ok(())
    }
}

/// Action-plan zone, ordered from lowest to highest risk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Zone {
    Green,
    Yellow,
    Red,
}

impl Zone {
    pub fn label(&self) -> &'static str {
        match self {
            Zone::Green => "Green",
            Zone::Yellow => "Yellow",
            Zone::Red => "Red",
        }
    }

    /// Clinical meaning of the zone.
    pub fn title(&self) -> &'static str {
        match self {
            Zone::Green => "Normal/Controlled",
            Zone::Yellow => "Caution",
            Zone::Red => "Danger",
        }
    }

    /// Display color token.
    pub fn color(&self) -> &'static str {
        match self {
            Zone::Green => "#22c55e",
            Zone::Yellow => "#eab308",
            Zone::Red => "#ef4444",
        }
    }

    pub fn advisory(&self) -> &'static str {
        match self {
            Zone::Green => "Maintain the current controller regimen.",
            Zone::Yellow => {
                "Step up the controller per the action plan and reassess within a few days."
            }
            Zone::Red => "Use the reliever now, escalate urgently and seek medical care.",
        }
    }
}

/// Classification of one reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneResult {
    pub zone: Zone,
    /// Percent of reference, truncated
    pub percent: u32,
    pub color: String,
    pub advisory: String,
}

/// Integer percent of reference, truncated toward zero.
///
/// Fails with [`CalcError::DivisionUndefined`] when `reference` is 0 and with
/// [`CalcError::NotMeasured`] when `reading` is 0.
pub fn percent_predicted(reading: u32, reference: u32) -> CalcResult<u32> {
    if reference == 0 {
        return Err(CalcError::DivisionUndefined);
    }
    if reading == 0 {
        return Err(CalcError::NotMeasured);
    }
    let percent = u64::from(reading) * 100 / u64::from(reference);
    Ok(u32::try_from(percent).unwrap_or(u32::MAX))
}

/// Zone classifier over a set of thresholds.
pub struct ZoneClassifier<'a> {
    thresholds: &'a ZoneThresholds,
}

impl<'a> ZoneClassifier<'a> {
    pub fn new(thresholds: &'a ZoneThresholds) -> Self {
        Self { thresholds }
    }

    /// Zone for a reading/reference ratio.
    pub fn zone_for_ratio(&self, ratio: f64) -> Zone {
        if ratio >= self.thresholds.green_min {
            Zone::Green
        } else if ratio >= self.thresholds.yellow_min {
            Zone::Yellow
        } else {
            Zone::Red
        }
    }

    /// Zone only, without building the full result.
    ///
    /// Thresholds that fail [`ZoneThresholds::validate`] are `InvalidInput`.
    pub fn zone(&self, reading: u32, reference: u32) -> CalcResult<Zone> {
        self.thresholds.validate()?;
        check_inputs(reading, reference)?;
        Ok(self.zone_for_ratio(f64::from(reading) / f64::from(reference)))
    }

    /// Classify a measured reading against a positive reference.
    pub fn classify(&self, reading: u32, reference: u32) -> CalcResult<ZoneResult> {
        let zone = self.zone(reading, reference)?;
        let percent = percent_predicted(reading, reference)?;

        tracing::debug!(reading, reference, percent, zone = zone.label(), "Classified reading");

        Ok(ZoneResult {
            zone,
            percent,
            color: zone.color().to_string(),
            advisory: zone.advisory().to_string(),
        })
    }
}

fn check_inputs(reading: u32, reference: u32) -> CalcResult<()> {
    if reference == 0 {
        return Err(CalcError::DivisionUndefined);
    }
    if reading == 0 {
        return Err(CalcError::NotMeasured);
    }
    Ok(())
}

/// Lowest reading in each band for a given reference, for action-plan cards
/// and chart guide lines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneLimits {
    pub reference: u32,
    /// Readings at or above this are Green
    pub green_from: u32,
    /// Readings at or above this (and below `green_from`) are Yellow
    pub yellow_from: u32,
}

impl ZoneLimits {
    pub fn for_reference(reference: u32, thresholds: &ZoneThresholds) -> CalcResult<Self> {
        thresholds.validate()?;
        if reference == 0 {
            return Err(CalcError::DivisionUndefined);
        }
        Ok(Self {
            reference,
            green_from: lowest_reading_at(reference, thresholds.green_min),
            yellow_from: lowest_reading_at(reference, thresholds.yellow_min),
        })
    }
}

/// Smallest reading whose ratio to `reference` reaches `fraction`, using the
/// same floating-point comparison as the classifier. Never exceeds `reference`.
fn lowest_reading_at(reference: u32, fraction: f64) -> u32 {
    let reaches = |reading: u32| f64::from(reading) / f64::from(reference) >= fraction;
    let mut reading = (f64::from(reference) * fraction)
        .ceil()
        .clamp(0.0, f64::from(reference)) as u32;
    while reading > 0 && reaches(reading - 1) {
        reading -= 1;
    }
    while !reaches(reading) {
        match reading.checked_add(1) {
            Some(next) if next <= reference => reading = next,
            _ => break,
        }
    }
    reading
}
