// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Change-event correlation
//!
//! Decides whether recorded system changes (migrations, deployments, feature
//! rollouts) temporally and causally correlate with an anomaly.
//! [`correlate`] is a pure function of the detection time and the event list:
//! no clock access, no side effects, identical inputs give identical output.
//!
//! Window semantics: an event is retained when it occurred in the half-open
//! window `[0, lookback_hours)` before the anomaly. A retained event only
//! becomes *related* when it carries at least one potential-impact note, and
//! related changes make the anomaly's likely cause only when one of them
//! occurred strictly less than `causal_hours` before detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::config::CorrelationConfig;

/// Resource requirement change attached to a migration record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceDelta {
    /// Additional CPU required, percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_increase: Option<f64>,
    /// Additional memory required, percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_increase: Option<f64>,
}

impl ResourceDelta {
    /// True when no dimension changed.
    pub fn is_empty(&self) -> bool {
        self.cpu_increase.is_none() && self.memory_increase.is_none()
    }
}

/// A recorded system change. Read-only input to correlation; produced by the
/// change-event reader collaborator.
///
/// Optional fields may be missing in stored records and deserialize as
/// absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Record identity
    pub event_id: String,
    /// Type tag, e.g. "user_migration", "functionality_rollout"
    pub change_type: String,
    /// When the change happened
    pub occurred_at: DateTime<Utc>,
    /// System the change moved from
    #[serde(default)]
    pub source_system: String,
    /// System the change moved to
    #[serde(default)]
    pub target_system: String,
    /// Users added (positive) or removed (negative) by the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_count_change: Option<i64>,
    /// Resource requirement delta, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_requirements: Option<ResourceDelta>,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Record status, e.g. "completed"
    #[serde(default)]
    pub status: String,
}

/// One change event that correlates with the anomaly, with the reasons why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedChange {
    /// The underlying event
    pub event: ChangeEvent,
    /// Hours between the event and the anomaly detection
    pub hours_before_anomaly: f64,
    /// Why this event could explain the anomaly
    pub potential_impact: Vec<String>,
}

/// Outcome of correlating an anomaly with recent change events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeCorrelation {
    /// True when a related change occurred shortly before the anomaly
    pub likely_cause: bool,
    /// Changes with at least one potential-impact note, input order
    pub related: Vec<RelatedChange>,
    /// Natural-language summary of the migration impact
    pub impact_summary: String,
    /// Flat list of impact factors across all related changes
    pub impact_factors: Vec<String>,
}

impl ChangeCorrelation {
    /// The `correlation_data` object embedding this result as a
    /// `migration_analysis` block, the shape the narrative composer and the
    /// persistence record read.
    pub fn to_correlation_data(&self) -> JsonValue {
        json!({ "migration_analysis": self })
    }
}

/// Correlate an anomaly detected at `detected_at` with `events`.
pub fn correlate(
    detected_at: DateTime<Utc>,
    events: &[ChangeEvent],
    windows: &CorrelationConfig,
) -> ChangeCorrelation {
    let mut related = Vec::new();
    let mut impact_factors = Vec::new();

    for event in events {
        let hours_before = hours_between(event.occurred_at, detected_at);

        // Future events and events at or beyond the lookback horizon carry
        // no causal weight.
        if hours_before < 0.0 || hours_before >= windows.lookback_hours {
            continue;
        }

        let mut potential_impact = Vec::new();

        if let Some(added) = event.user_count_change {
            if added > 0 {
                potential_impact.push(format!("Added {added} users, increasing system load"));
                impact_factors.push(format!(
                    "User migration added {added} users {hours_before:.1}h before anomaly"
                ));
            }
        }

        let change_type = event.change_type.to_lowercase();
        if change_type.contains("functionality") || change_type.contains("feature") {
            potential_impact.push("New functionality may require additional resources".to_string());
            impact_factors.push(format!(
                "New functionality deployed {hours_before:.1}h before anomaly"
            ));
        }

        if let Some(delta) = &event.resource_requirements {
            let mut resource_changed = false;
            if let Some(cpu) = delta.cpu_increase {
                if cpu > 0.0 {
                    potential_impact.push(format!("Requires {cpu}% more CPU"));
                    resource_changed = true;
                }
            }
            if let Some(memory) = delta.memory_increase {
                if memory > 0.0 {
                    potential_impact.push(format!("Requires {memory}% more memory"));
                    resource_changed = true;
                }
            }
            if resource_changed {
                impact_factors.push(format!(
                    "Resource requirements changed {hours_before:.1}h before anomaly"
                ));
            }
        }

        if !potential_impact.is_empty() {
            related.push(RelatedChange {
                event: event.clone(),
                hours_before_anomaly: hours_before,
                potential_impact,
            });
        }
    }

    let likely_cause = !related.is_empty()
        && related
            .iter()
            .any(|m| m.hours_before_anomaly < windows.causal_hours);

    let impact_summary = summarize(&related, likely_cause, &impact_factors);

    ChangeCorrelation {
        likely_cause,
        related,
        impact_summary,
        impact_factors,
    }
}

fn hours_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 3_600_000.0
}

fn summarize(related: &[RelatedChange], likely_cause: bool, impact_factors: &[String]) -> String {
    if related.is_empty() {
        return "No recent migrations detected that correlate with the anomaly timing.".to_string();
    }
    if likely_cause {
        let top_factors = impact_factors
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join("; ");
        return format!(
            "Found {} recent migration(s) that likely contributed to this anomaly. \
             The migration(s) occurred shortly before the anomaly was detected and involved \
             changes that could explain the observed behavior: {top_factors}",
            related.len()
        );
    }
    format!(
        "Found {} migration(s) in the time window, but timing suggests they may not be \
         the primary cause. However, they should be considered as potential contributing factors.",
        related.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn windows() -> CorrelationConfig {
        CorrelationConfig::default()
    }

    fn event_at(detected_at: DateTime<Utc>, hours_before: f64) -> ChangeEvent {
        ChangeEvent {
            event_id: format!("mig-{hours_before}"),
            change_type: "user_migration".to_string(),
            occurred_at: detected_at - Duration::milliseconds((hours_before * 3_600_000.0) as i64),
            source_system: "legacy".to_string(),
            target_system: "cloud".to_string(),
            user_count_change: Some(500),
            resource_requirements: None,
            description: "moved a tenant".to_string(),
            status: "completed".to_string(),
        }
    }

    #[test]
    fn test_no_events() {
        let now = Utc::now();
        let result = correlate(now, &[], &windows());
        assert!(!result.likely_cause);
        assert!(result.related.is_empty());
        assert!(result.impact_summary.contains("No recent migrations"));
    }

    #[test]
    fn test_event_exactly_at_lookback_boundary_excluded() {
        let now = Utc::now();
        let result = correlate(now, &[event_at(now, 24.0)], &windows());
        assert!(result.related.is_empty());
    }

    #[test]
    fn test_event_just_inside_lookback_included() {
        let now = Utc::now();
        let result = correlate(now, &[event_at(now, 23.9)], &windows());
        assert_eq!(result.related.len(), 1);
    }

    #[test]
    fn test_event_at_detection_time_included() {
        let now = Utc::now();
        let result = correlate(now, &[event_at(now, 0.0)], &windows());
        assert_eq!(result.related.len(), 1);
        assert!(result.likely_cause);
    }

    #[test]
    fn test_event_after_anomaly_excluded() {
        let now = Utc::now();
        let result = correlate(now, &[event_at(now, -1.0)], &windows());
        assert!(result.related.is_empty());
    }

    #[test]
    fn test_event_exactly_six_hours_not_likely_cause() {
        let now = Utc::now();
        let result = correlate(now, &[event_at(now, 6.0)], &windows());
        assert_eq!(result.related.len(), 1);
        assert!(!result.likely_cause);
        assert!(result.impact_summary.contains("may not be the primary cause"));
    }

    #[test]
    fn test_event_just_under_six_hours_is_likely_cause() {
        let now = Utc::now();
        let result = correlate(now, &[event_at(now, 5.99)], &windows());
        assert!(result.likely_cause);
        assert!(result.impact_summary.contains("likely contributed"));
    }

    #[test]
    fn test_event_without_impact_notes_not_related() {
        let now = Utc::now();
        let mut event = event_at(now, 2.0);
        event.user_count_change = Some(0);
        event.change_type = "config_change".to_string();
        let result = correlate(now, &[event], &windows());
        assert!(result.related.is_empty());
        assert!(!result.likely_cause);
    }

    #[test]
    fn test_functionality_type_produces_note() {
        let now = Utc::now();
        let mut event = event_at(now, 3.0);
        event.user_count_change = None;
        event.change_type = "New-Functionality rollout".to_string();
        let result = correlate(now, &[event], &windows());
        assert_eq!(result.related.len(), 1);
        assert!(result.related[0].potential_impact[0].contains("New functionality"));
    }

    #[test]
    fn test_resource_delta_one_note_per_dimension() {
        let now = Utc::now();
        let mut event = event_at(now, 2.0);
        event.user_count_change = None;
        event.change_type = "capacity_change".to_string();
        event.resource_requirements = Some(ResourceDelta {
            cpu_increase: Some(20.0),
            memory_increase: Some(35.0),
        });
        let result = correlate(now, &[event], &windows());
        let notes = &result.related[0].potential_impact;
        assert_eq!(notes.len(), 2);
        assert!(notes[0].contains("20% more CPU"));
        assert!(notes[1].contains("35% more memory"));
    }

    #[test]
    fn test_idempotent() {
        let now = Utc::now();
        let events = vec![event_at(now, 2.0), event_at(now, 10.0), event_at(now, 30.0)];
        let first = correlate(now, &events, &windows());
        let second = correlate(now, &events, &windows());
        assert_eq!(first.likely_cause, second.likely_cause);
        assert_eq!(first.related.len(), second.related.len());
        assert_eq!(first.impact_summary, second.impact_summary);
        assert_eq!(first.impact_factors, second.impact_factors);
    }

    #[test]
    fn test_summary_names_top_three_factors() {
        let now = Utc::now();
        let events = vec![
            event_at(now, 1.0),
            event_at(now, 2.0),
            event_at(now, 3.0),
            event_at(now, 4.0),
        ];
        let result = correlate(now, &events, &windows());
        assert!(result.likely_cause);
        assert_eq!(result.impact_factors.len(), 4);
        // Only the first three factors appear in the summary.
        assert!(result.impact_summary.contains("1.0h before anomaly"));
        assert!(result.impact_summary.contains("3.0h before anomaly"));
        assert!(!result.impact_summary.contains("4.0h before anomaly"));
    }

    #[test]
    fn test_correlation_data_shape() {
        let now = Utc::now();
        let result = correlate(now, &[event_at(now, 1.0)], &windows());
        let data = result.to_correlation_data();
        assert_eq!(data["migration_analysis"]["likely_cause"], true);
        assert!(data["migration_analysis"]["impact_summary"].is_string());
    }

    #[test]
    fn test_change_event_tolerates_missing_optional_fields() {
        let event: ChangeEvent = serde_json::from_str(
            r#"{
                "event_id": "mig-1",
                "change_type": "user_migration",
                "occurred_at": "2026-01-10T08:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(event.user_count_change.is_none());
        assert!(event.resource_requirements.is_none());
        assert!(event.status.is_empty());
    }

    #[test]
    fn test_resource_delta_empty() {
        assert!(ResourceDelta::default().is_empty());
        assert!(!ResourceDelta {
            cpu_increase: Some(1.0),
            memory_increase: None
        }
        .is_empty());
    }
}
