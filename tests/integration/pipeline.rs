//! Whole-run scenarios: budget gate, per-listing failures, decisions,
//! and final ranking.

use chrono::{Local, TimeZone};

use property_report::config::AppConfig;
use property_report::engine::{
    Pipeline, PipelineEvent, PipelineSettings, RecordingSink,
};
use property_report::report::{render_html, ReportSummary};
use property_report::types::{
    AnalysisFailure, Decision, ListingStage, ReportError, ZipFilter,
};

use crate::mock_provider::{listing, listings, sold, Call, MockProvider};

fn settings(max_api_calls: usize) -> PipelineSettings {
    PipelineSettings {
        max_api_calls,
        ..PipelineSettings::default()
    }
}

fn zips(codes: &[&str]) -> Vec<ZipFilter> {
    codes.iter().map(|z| ZipFilter::new(*z)).collect()
}

// -- Budget gate --

#[tokio::test]
async fn test_budget_overrun_aborts_with_no_comp_searches() {
    // 3 zips + (10 + 5 + 8) listings = 26 > 20
    let provider = MockProvider::new()
        .with_listings("10001", listings(1, 10, "10001"))
        .with_listings("10002", listings(100, 5, "10002"))
        .with_listings("10003", listings(200, 8, "10003"));
    let sink = RecordingSink::new();

    let result = Pipeline::new(&provider, settings(20), &sink)
        .run(&zips(&["10001", "10002", "10003"]))
        .await;

    match result {
        Err(ReportError::BudgetExceeded { estimated, ceiling }) => {
            assert_eq!(estimated, 26);
            assert_eq!(ceiling, 20);
        }
        other => panic!("expected budget abort, got {other:?}"),
    }
    assert_eq!(provider.sold_calls(), 0);
    assert_eq!(provider.calls().len(), 3);
    assert!(sink.events().iter().any(|e| matches!(
        e,
        PipelineEvent::BudgetExceeded {
            estimated_calls: 26,
            max_api_calls: 20
        }
    )));
}

#[tokio::test]
async fn test_budget_exactly_at_limit_proceeds() {
    let a = listing(1, "78701", 200_000.0);
    let b = listing(2, "78701", 210_000.0);
    let provider = MockProvider::new().with_listings("78701", vec![a, b]);
    let sink = RecordingSink::new();

    let analyses = Pipeline::new(&provider, settings(3), &sink)
        .run(&zips(&["78701"]))
        .await
        .unwrap();

    assert_eq!(analyses.len(), 2);
    assert_eq!(provider.sold_calls(), 2);
}

#[tokio::test]
async fn test_budget_one_over_limit_aborts() {
    let provider = MockProvider::new().with_listings(
        "78701",
        vec![listing(1, "78701", 1.0), listing(2, "78701", 2.0)],
    );
    let sink = RecordingSink::new();

    let result = Pipeline::new(&provider, settings(2), &sink)
        .run(&zips(&["78701"]))
        .await;

    assert!(matches!(
        result,
        Err(ReportError::BudgetExceeded {
            estimated: 3,
            ceiling: 2
        })
    ));
    assert_eq!(provider.sold_calls(), 0);
}

// -- Per-listing outcomes --

#[tokio::test]
async fn test_reference_deal_is_yes() {
    let subject = listing(1, "78701", 200_000.0);
    let provider = MockProvider::new()
        .with_listings("78701", vec![subject.clone()])
        .with_sold(
            &subject,
            vec![
                sold("too cheap", 250_000.0),
                sold("A", 310_000.0),
                sold("B", 360_000.0),
                sold("mansion", 2_000_000.0),
            ],
        );
    let sink = RecordingSink::new();

    let analyses = Pipeline::new(&provider, settings(100), &sink)
        .run(&zips(&["78701"]))
        .await
        .unwrap();

    let a = &analyses[0];
    assert!(!a.is_error());
    assert_eq!(a.best_offer_price(), 200_000.0);
    assert_eq!(a.build_up_cost(), 75_000.0);
    assert_eq!(a.financing_cost(), 33_000.0);
    assert_eq!(a.all_inclusive_cost(), 308_000.0);
    assert_eq!(a.upside_value(), 360_000.0);
    assert_eq!(a.upside_profit(), 52_000.0);
    assert_eq!(a.decision(), Decision::Yes);
    assert_eq!(
        a.upside_comparables().to_vec(),
        vec!["A ($310,000)".to_string(), "B ($360,000)".to_string()]
    );
    assert_eq!(
        sink.stages_for(&subject.address),
        vec![
            ListingStage::Pending,
            ListingStage::CoordinatesChecked,
            ListingStage::CompsFetched,
            ListingStage::CompsFiltered,
            ListingStage::Scored,
        ]
    );
}

#[tokio::test]
async fn test_failures_are_recorded_and_run_continues() {
    let mut no_coords = listing(1, "78701", 100_000.0);
    no_coords.latitude = None;
    let lonely = listing(2, "78701", 110_000.0);
    let flaky = listing(3, "78701", 120_000.0);
    let good = listing(4, "78701", 130_000.0);

    let provider = MockProvider::new()
        .with_listings(
            "78701",
            vec![no_coords.clone(), lonely.clone(), flaky.clone(), good.clone()],
        )
        .with_sold(&lonely, Vec::new())
        .with_sold_error(&flaky, 500)
        .with_sold(&good, vec![sold("comp", 300_000.0)]);
    let sink = RecordingSink::new();

    let analyses = Pipeline::new(&provider, settings(100), &sink)
        .run(&zips(&["78701"]))
        .await
        .unwrap();

    assert_eq!(analyses.len(), 4);
    // Only listings with coordinates reach the provider.
    assert_eq!(provider.sold_calls(), 3);

    let by_address = |addr: &str| {
        analyses
            .iter()
            .find(|a| a.subject.address == addr)
            .unwrap()
    };

    let a = by_address(&no_coords.address);
    assert_eq!(a.failure(), Some(&AnalysisFailure::MissingCoordinates));
    assert_eq!(a.upside_profit(), 0.0);
    assert_eq!(a.decision(), Decision::No);

    let a = by_address(&lonely.address);
    assert_eq!(a.failure(), Some(&AnalysisFailure::NoComparables));
    assert_eq!(
        a.error_message().as_deref(),
        Some("No sold properties found within the search radius")
    );

    let a = by_address(&flaky.address);
    assert!(a.error_message().unwrap().contains("HTTP 500"));

    let a = by_address(&good.address);
    assert!(!a.is_error());
    // 300000 - (130000 + 75000) * 1.12
    assert!((a.upside_profit() - 70_400.0).abs() < 1e-6);

    assert!(sink.events().iter().any(|e| matches!(
        e,
        PipelineEvent::RunCompleted {
            analyzed: 4,
            scored: 1,
            skipped: 3,
            recommended: 1
        }
    )));
}

#[tokio::test]
async fn test_failed_zip_is_dropped_but_counted() {
    let provider = MockProvider::new()
        .with_listing_error("00000", 503)
        .with_listings("78701", vec![listing(1, "78701", 200_000.0)]);
    let sink = RecordingSink::new();

    // 2 zips + 1 listing = 3
    let analyses = Pipeline::new(&provider, settings(3), &sink)
        .run(&zips(&["00000", "78701"]))
        .await
        .unwrap();

    assert_eq!(analyses.len(), 1);
    assert!(sink.events().iter().any(|e| matches!(
        e,
        PipelineEvent::BudgetChecked {
            zips_queried: 2,
            listings: 1,
            estimated_calls: 3,
            ..
        }
    )));
}

// -- Ordering --

#[tokio::test]
async fn test_listings_are_processed_cheapest_first_per_zip() {
    let provider = MockProvider::new()
        .with_listings(
            "B",
            vec![listing(1, "B", 300_000.0), listing(2, "B", 100_000.0)],
        )
        .with_listings("A", vec![listing(3, "A", 50_000.0)]);
    let sink = RecordingSink::new();

    Pipeline::new(&provider, settings(100), &sink)
        .run(&zips(&["B", "A"]))
        .await
        .unwrap();

    let sold_order: Vec<f64> = provider
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::Sold(center) => Some(center.latitude),
            Call::Listings(_) => None,
        })
        .collect();
    let expected: Vec<f64> = [2, 1, 3]
        .iter()
        .filter_map(|id| listing(*id, "", 0.0).latitude)
        .collect();
    assert_eq!(sold_order, expected);
}

#[tokio::test]
async fn test_ranking_is_descending_and_stable() {
    // Same list price and comps: equal profit, so scan order must survive.
    let tie_a = listing(1, "78701", 200_000.0);
    let tie_b = listing(2, "78701", 200_000.0);
    let best = listing(3, "78702", 200_000.0);
    let mut broken = listing(4, "78702", 10_000.0);
    broken.longitude = None;

    let provider = MockProvider::new()
        .with_listings("78701", vec![tie_a.clone(), tie_b.clone()])
        .with_listings("78702", vec![best.clone(), broken.clone()])
        .with_sold(&tie_a, vec![sold("x", 340_000.0)])
        .with_sold(&tie_b, vec![sold("y", 340_000.0)])
        .with_sold(&best, vec![sold("z", 500_000.0)]);
    let sink = RecordingSink::new();

    let analyses = Pipeline::new(&provider, settings(100), &sink)
        .run(&zips(&["78701", "78702"]))
        .await
        .unwrap();

    let order: Vec<&str> = analyses.iter().map(|a| a.subject.address.as_str()).collect();
    assert_eq!(
        order,
        vec![
            best.address.as_str(),
            tie_a.address.as_str(),
            tie_b.address.as_str(),
            broken.address.as_str(),
        ]
    );
    for pair in analyses.windows(2) {
        assert!(pair[0].upside_profit() >= pair[1].upside_profit());
    }
}

// -- Config to report --

#[tokio::test]
async fn test_config_driven_run_renders_report() {
    let cfg = AppConfig::from_toml(
        r#"
[filters]
zip_codes = ["78701"]
max_price = 250000

[decision]
upside_threshold = 60000.0

[budget]
max_api_calls = 10
"#,
    )
    .unwrap();

    let subject = listing(1, "78701", 200_000.0);
    let provider = MockProvider::new()
        .with_listings("78701", vec![subject.clone()])
        .with_sold(&subject, vec![sold("comp", 360_000.0)]);
    let sink = RecordingSink::new();
    let settings = cfg.pipeline_settings();

    let analyses = Pipeline::new(&provider, settings.clone(), &sink)
        .run(&cfg.zip_filters())
        .await
        .unwrap();

    // 52000 profit does not clear a 60000 threshold
    assert_eq!(analyses[0].decision(), Decision::No);
    assert_eq!(provider.calls()[0], Call::Listings("78701".to_string()));

    let summary = ReportSummary::from_analyses(&analyses);
    assert_eq!(summary.total, 1);
    assert_eq!(summary.yes, 0);
    assert_eq!(summary.total_positive_upside, 52_000.0);

    let generated_at = Local.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    let html = render_html(&analyses, &settings, generated_at);
    assert!(html.contains(&subject.address));
    assert!(html.contains("$52,000"));
    assert!(html.contains("decision-no"));
}
