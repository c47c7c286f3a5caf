//! Property-based tests for baseline invariants
//!
//! Verifies the distribution-summary invariants that downstream detectors
//! rely on, over arbitrary non-empty sample series:
//!
//! 1. **Percentile ordering**: min <= p50 <= p95 <= p99 <= max
//! 2. **Non-negative spread**: std_dev >= 0
//! 3. **Mean bounds**: min <= mean <= max
//! 4. **Correlation determinism**: identical inputs give identical results
//!
//! Run with more iterations to find rarer edge cases:
//! ```bash
//! PROPTEST_CASES=10000 cargo test -p driftline proptests --release
//! ```

use proptest::prelude::*;

use crate::baseline::{BaselineEngine, BaselineMethod};
use crate::config::{BaselineConfig, CorrelationConfig};
use crate::correlation::{correlate, ChangeEvent};
use chrono::{Duration, TimeZone, Utc};

fn arb_samples() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-1.0e6..1.0e6f64, 1..200)
}

fn arb_events() -> impl Strategy<Value = Vec<(i64, Option<i64>)>> {
    // (minutes before detection, user delta)
    proptest::collection::vec((-120i64..2_000, proptest::option::of(0i64..10_000)), 0..20)
}

proptest! {
    #[test]
    fn percentiles_are_ordered(samples in arb_samples()) {
        let engine = BaselineEngine::new(BaselineConfig::default());
        let stats = engine
            .compute("metric", &samples, 30, BaselineMethod::SimpleStats)
            .unwrap();
        prop_assert!(stats.min_value <= stats.p50);
        prop_assert!(stats.p50 <= stats.p95);
        prop_assert!(stats.p95 <= stats.p99);
        prop_assert!(stats.p99 <= stats.max_value);
    }

    #[test]
    fn std_dev_is_non_negative(samples in arb_samples()) {
        let engine = BaselineEngine::new(BaselineConfig::default());
        let stats = engine
            .compute("metric", &samples, 30, BaselineMethod::SimpleStats)
            .unwrap();
        prop_assert!(stats.std_dev >= 0.0);
        prop_assert_eq!(stats.sample_count, samples.len());
    }

    #[test]
    fn mean_is_within_bounds(samples in arb_samples()) {
        let engine = BaselineEngine::new(BaselineConfig::default());
        let stats = engine
            .compute("metric", &samples, 30, BaselineMethod::SimpleStats)
            .unwrap();
        // Allow for floating point accumulation at the boundaries.
        let tolerance = 1e-6 * (1.0 + stats.max_value.abs() + stats.min_value.abs());
        prop_assert!(stats.mean >= stats.min_value - tolerance);
        prop_assert!(stats.mean <= stats.max_value + tolerance);
    }

    #[test]
    fn delegating_methods_match_simple_stats(samples in arb_samples()) {
        let engine = BaselineEngine::new(BaselineConfig::default());
        let simple = engine
            .compute("metric", &samples, 30, BaselineMethod::SimpleStats)
            .unwrap();
        let rolling = engine
            .compute("metric", &samples, 30, BaselineMethod::RollingAverage)
            .unwrap();
        prop_assert_eq!(simple.mean.to_bits(), rolling.mean.to_bits());
        prop_assert_eq!(simple.p99.to_bits(), rolling.p99.to_bits());
        prop_assert!(rolling.notes.contains("rolling_average"));
    }

    #[test]
    fn correlation_is_deterministic(raw_events in arb_events()) {
        let detected_at = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        let events: Vec<ChangeEvent> = raw_events
            .iter()
            .enumerate()
            .map(|(i, (minutes_before, user_delta))| ChangeEvent {
                event_id: format!("evt-{i}"),
                change_type: "user_migration".to_string(),
                occurred_at: detected_at - Duration::minutes(*minutes_before),
                source_system: String::new(),
                target_system: String::new(),
                user_count_change: *user_delta,
                resource_requirements: None,
                description: String::new(),
                status: "completed".to_string(),
            })
            .collect();

        let windows = CorrelationConfig::default();
        let first = correlate(detected_at, &events, &windows);
        let second = correlate(detected_at, &events, &windows);
        prop_assert_eq!(first.likely_cause, second.likely_cause);
        prop_assert_eq!(first.related.len(), second.related.len());
        prop_assert_eq!(&first.impact_summary, &second.impact_summary);

        // Every related change sits inside the half-open retention window.
        for change in &first.related {
            prop_assert!(change.hours_before_anomaly >= 0.0);
            prop_assert!(change.hours_before_anomaly < windows.lookback_hours);
        }
    }
}
