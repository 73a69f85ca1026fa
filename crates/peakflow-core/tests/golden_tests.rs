//! Golden tests for zone classification, technique scoring and review scheduling.
//!
//! Cases mirror the worked examples clinicians use when checking an action plan.

use chrono::{Duration, NaiveDate};
use peakflow_core::models::{ControlLevel, SexCategory, TechniqueChecklist, TechniqueOutcome, VisitRecord};
use peakflow_core::{
    percent_predicted, ReferenceFlow, ReferenceFlowCalculator, ReferenceFormulas, ReviewPolicy,
    ReviewScheduler, ReviewStatus, TechniquePolicy, TechniqueScorer, TimeSeriesProjector, Zone,
    ZoneClassifier, ZoneThresholds,
};

/// Zone case: reading against reference.
struct ZoneCase {
    id: &'static str,
    reading: u32,
    reference: u32,
    expected_percent: u32,
    expected_zone: Zone,
}

fn get_zone_cases() -> Vec<ZoneCase> {
    vec![
        ZoneCase {
            id: "green-boundary",
            reading: 240,
            reference: 300,
            expected_percent: 80,
            expected_zone: Zone::Green,
        },
        ZoneCase {
            id: "yellow-boundary",
            reading: 180,
            reference: 300,
            expected_percent: 60,
            expected_zone: Zone::Yellow,
        },
        ZoneCase {
            id: "just-below-yellow",
            reading: 179,
            reference: 300,
            expected_percent: 59,
            expected_zone: Zone::Red,
        },
        ZoneCase {
            id: "just-below-green",
            reading: 239,
            reference: 300,
            expected_percent: 79,
            expected_zone: Zone::Yellow,
        },
        ZoneCase {
            id: "above-reference",
            reading: 650,
            reference: 500,
            expected_percent: 130,
            expected_zone: Zone::Green,
        },
        ZoneCase {
            id: "severe-obstruction",
            reading: 120,
            reference: 607,
            expected_percent: 19,
            expected_zone: Zone::Red,
        },
    ]
}

#[test]
fn test_zone_golden_cases() {
    let thresholds = ZoneThresholds::default();
    let classifier = ZoneClassifier::new(&thresholds);

    for case in get_zone_cases() {
        let percent = percent_predicted(case.reading, case.reference).unwrap();
        assert_eq!(percent, case.expected_percent, "Case {}: percent mismatch", case.id);

        let result = classifier.classify(case.reading, case.reference).unwrap();
        assert_eq!(result.zone, case.expected_zone, "Case {}: zone mismatch", case.id);
        assert_eq!(result.percent, case.expected_percent, "Case {}: result percent", case.id);
        assert_eq!(result.color, case.expected_zone.color(), "Case {}: color", case.id);
    }
}

/// Technique case: failed steps (1-indexed) and expected outcome.
struct TechniqueCase {
    id: &'static str,
    failed_steps: &'static [usize],
    expected_score: u32,
    expected_outcome: TechniqueOutcome,
}

fn get_technique_cases() -> Vec<TechniqueCase> {
    vec![
        TechniqueCase {
            id: "all-correct",
            failed_steps: &[],
            expected_score: 8,
            expected_outcome: TechniqueOutcome::Pass,
        },
        TechniqueCase {
            id: "critical-lip-seal",
            failed_steps: &[5],
            expected_score: 7,
            expected_outcome: TechniqueOutcome::CriticalFail,
        },
        TechniqueCase {
            id: "critical-coordination",
            failed_steps: &[6],
            expected_score: 7,
            expected_outcome: TechniqueOutcome::CriticalFail,
        },
        TechniqueCase {
            id: "critical-breath-hold",
            failed_steps: &[7],
            expected_score: 7,
            expected_outcome: TechniqueOutcome::CriticalFail,
        },
        TechniqueCase {
            id: "non-critical-single",
            failed_steps: &[2],
            expected_score: 7,
            expected_outcome: TechniqueOutcome::NeedsImprovement,
        },
        TechniqueCase {
            id: "non-critical-many",
            failed_steps: &[1, 2, 3, 4, 8],
            expected_score: 3,
            expected_outcome: TechniqueOutcome::NeedsImprovement,
        },
        TechniqueCase {
            id: "critical-dominates-low-score",
            failed_steps: &[1, 2, 3, 4, 7, 8],
            expected_score: 2,
            expected_outcome: TechniqueOutcome::CriticalFail,
        },
    ]
}

#[test]
fn test_technique_golden_cases() {
    let policy = TechniquePolicy::default();
    let scorer = TechniqueScorer::new(&policy);

    for case in get_technique_cases() {
        let checklist = case
            .failed_steps
            .iter()
            .fold(TechniqueChecklist::all_passed(), |list, &step| list.with_step(step, false));

        let result = scorer.score(&checklist);
        assert_eq!(result.score, case.expected_score, "Case {}: score mismatch", case.id);
        assert_eq!(result.outcome, case.expected_outcome, "Case {}: outcome mismatch", case.id);
        assert_eq!(result.failed_items, case.failed_steps, "Case {}: failed items", case.id);
        assert_eq!(result.deficit, 8 - case.expected_score, "Case {}: deficit", case.id);
    }
}

#[test]
fn test_technique_summary_lines() {
    let policy = TechniquePolicy::default();
    let scorer = TechniqueScorer::new(&policy);

    let pass = scorer.score(&TechniqueChecklist::all_passed());
    assert_eq!(pass.summary, "Score: 8/8 (Pass) | Fail: None");

    let mut checklist = TechniqueChecklist::all_passed().with_step(2, false);
    checklist.rinse_advised = true;
    checklist.cleaning_advised = true;
    let needs_work = scorer.score(&checklist);
    assert_eq!(
        needs_work.summary,
        "Score: 7/8 (Needs Improvement) | Fail: 2 | Adv:Rinse | Adv:Clean"
    );
}

fn visit(on: NaiveDate, reading: u32, outcome: Option<TechniqueOutcome>) -> VisitRecord {
    let record = VisitRecord::new("1001".into(), on, reading, ControlLevel::PartlyControlled);
    match outcome {
        Some(outcome) => record.with_technique(outcome),
        None => record,
    }
}

#[test]
fn test_review_golden_cases() {
    let policy = ReviewPolicy::default();
    let scheduler = ReviewScheduler::new(&policy);
    let now = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

    let cases: Vec<(&str, Vec<VisitRecord>, ReviewStatus)> = vec![
        (
            "exactly-interval",
            vec![visit(now - Duration::days(90), 300, Some(TechniqueOutcome::Pass))],
            ReviewStatus::OnTrack {
                days_remaining: 0,
                last_assessed: now - Duration::days(90),
            },
        ),
        (
            "one-day-late",
            vec![visit(now - Duration::days(91), 300, Some(TechniqueOutcome::CriticalFail))],
            ReviewStatus::Overdue {
                days_overdue: 1,
                last_assessed: now - Duration::days(91),
            },
        ),
        ("empty-history", vec![], ReviewStatus::Never),
        (
            "no-assessed-visits",
            vec![visit(now - Duration::days(10), 300, None), visit(now, 0, None)],
            ReviewStatus::Never,
        ),
    ];

    for (id, visits, expected) in cases {
        assert_eq!(scheduler.status(&visits, now), expected, "Case {}: status mismatch", id);
    }
}

#[test]
fn test_reference_flow_is_deterministic() {
    let formulas = ReferenceFormulas::default();
    let calculator = ReferenceFlowCalculator::new(&formulas);

    let first = calculator.predict(30, 170.0, SexCategory::Male).unwrap();
    let second = calculator.predict(30, 170.0, SexCategory::Male).unwrap();
    assert!(first > 0);
    assert_eq!(first, second);
    assert_eq!(first, 607);
}

#[test]
fn test_chart_excludes_unmeasured_in_date_order() {
    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let visits: Vec<VisitRecord> = [(30, 400), (0, 350), (10, 0), (20, 280), (5, 0)]
        .iter()
        .map(|&(offset, reading)| visit(start + Duration::days(offset), reading, None))
        .collect();

    let projector = TimeSeriesProjector::new(&ZoneThresholds::default()).unwrap();
    let series = projector.project(&visits, ReferenceFlow::Predicted(400));
    let points: Vec<_> = series.points().collect();

    assert_eq!(
        points.iter().map(|p| p.reading).collect::<Vec<_>>(),
        vec![350, 280, 400]
    );
    assert!(points.windows(2).all(|w| w[0].date <= w[1].date));
    assert_eq!(points[1].zone, Some(Zone::Yellow));
}
