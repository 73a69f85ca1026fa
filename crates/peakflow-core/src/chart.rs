//! Peak flow trend data for charting.
//!
//! Only data shaping happens here. Unmeasured visits (reading 0) are dropped
//! and the rest are ordered by date; same-day visits keep their input order.

use std::slice;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CalcResult;
use crate::models::{sorted_by_date, VisitRecord};
use crate::reference::ReferenceFlow;
use crate::zone::{Zone, ZoneClassifier, ZoneLimits, ZoneThresholds};

/// One plotted reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub reading: u32,
    /// `None` when the patient has no reference flow
    pub zone: Option<Zone>,
}

/// Builds chart series from visit histories.
pub struct TimeSeriesProjector {
    thresholds: ZoneThresholds,
}

impl TimeSeriesProjector {
    /// Fails with `InvalidInput` when the thresholds do not validate.
    pub fn new(thresholds: &ZoneThresholds) -> CalcResult<Self> {
        thresholds.validate()?;
        Ok(Self {
            thresholds: *thresholds,
        })
    }

    pub fn project<'v>(&self, visits: &'v [VisitRecord], reference: ReferenceFlow) -> ChartSeries<'v> {
        let measured = sorted_by_date(visits)
            .into_iter()
            .filter(|visit| visit.measured_reading().is_some())
            .collect();

        ChartSeries {
            visits: measured,
            reference: reference.value(),
            thresholds: self.thresholds,
        }
    }
}

/// Measured visits in date order. Iterating is lazy and can be repeated.
#[derive(Debug, Clone)]
pub struct ChartSeries<'v> {
    visits: Vec<&'v VisitRecord>,
    reference: Option<u32>,
    thresholds: ZoneThresholds,
}

impl<'v> ChartSeries<'v> {
    pub fn points(&self) -> ChartPoints<'_, 'v> {
        ChartPoints {
            inner: self.visits.iter(),
            reference: self.reference,
            thresholds: &self.thresholds,
        }
    }

    /// Green and yellow guide lines, when a reference exists.
    pub fn limits(&self) -> Option<ZoneLimits> {
        self.reference
            .and_then(|reference| ZoneLimits::for_reference(reference, &self.thresholds).ok())
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }
}

impl<'s, 'v> IntoIterator for &'s ChartSeries<'v> {
    type Item = ChartPoint;
    type IntoIter = ChartPoints<'s, 'v>;

    fn into_iter(self) -> Self::IntoIter {
        self.points()
    }
}

/// Iterator over [`ChartPoint`]s.
pub struct ChartPoints<'s, 'v> {
    inner: slice::Iter<'s, &'v VisitRecord>,
    reference: Option<u32>,
    thresholds: &'s ZoneThresholds,
}

impl Iterator for ChartPoints<'_, '_> {
    type Item = ChartPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.inner.next()?;
        let zone = self.reference.and_then(|reference| {
            ZoneClassifier::new(self.thresholds)
                .zone(visit.reading, reference)
                .ok()
        });
        Some(ChartPoint {
            date: visit.visit_date,
            reading: visit.reading,
            zone,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ChartPoints<'_, '_> {}
