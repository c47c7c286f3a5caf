// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Core data model for anomaly analysis
//!
//! An [`Anomaly`] is produced by an upstream detector and is immutable input
//! to this crate. The pipeline turns it into an [`AnomalyAnalysis`]: one
//! [`RootCause`], an ordered list of [`Recommendation`]s and a
//! [`HumanReadableSummary`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Category of a detected anomaly.
///
/// Drives the deterministic root-cause table, the recommendation catalogs and
/// the impact/benefit narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyType {
    /// Error rates, crash loops, failed requests
    Stability,
    /// Latency, execution time, throughput
    Performance,
    /// Spend and billing metrics
    Cost,
    /// CPU, memory, disk pressure
    Resource,
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnomalyType::Stability => "stability",
            AnomalyType::Performance => "performance",
            AnomalyType::Cost => "cost",
            AnomalyType::Resource => "resource",
        };
        f.write_str(s)
    }
}

/// Severity assigned by the upstream detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Immediate user impact expected
    Critical,
    /// Significant degradation within hours
    High,
    /// Gradual degradation over days
    Medium,
    /// Minor, monitor for escalation
    Low,
}

impl Severity {
    /// Severities that warrant an urgency clause in the narrative.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        };
        f.write_str(s)
    }
}

/// A detected anomaly, as handed over by the upstream detector.
///
/// Immutable once created. `deviation_sigma` is the distance of
/// `current_value` from the baseline mean in standard deviations;
/// `deviation_percentage` is the relative change against `baseline_value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    /// Detector-assigned identity
    pub anomaly_id: String,
    /// When the detector flagged the deviation
    pub detected_at: DateTime<Utc>,
    /// Metric identifier, e.g. "error_rate"
    pub metric_name: String,
    /// Unit-bearing metric tag, e.g. "Error_Rate _%_" or "Compute_Cost _USD_"
    pub metric_type: String,
    /// Observed value at detection time
    pub current_value: f64,
    /// Baseline value the detector compared against
    pub baseline_value: f64,
    /// Deviation in standard deviations
    pub deviation_sigma: f64,
    /// Deviation in percent of baseline
    pub deviation_percentage: f64,
    /// Anomaly category
    pub anomaly_type: AnomalyType,
    /// Detector-assigned severity
    pub severity: Severity,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
    /// Resources the detector attributed the deviation to, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_resources: Option<Vec<String>>,
    /// Free-form detector metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, JsonValue>>,
}

/// Root cause produced by the resolver, either arm.
///
/// `correlation_data` is a JSON object; when change-event correlation ran it
/// carries a `migration_analysis` block (see the accessor helpers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootCause {
    /// Primary cause statement
    pub primary_cause: String,
    /// Contributing factors, most significant first
    pub contributing_factors: Vec<String>,
    /// Resolver confidence in [0, 1]
    pub confidence: f64,
    /// Observations supporting the analysis
    pub evidence: Vec<String>,
    /// Structured correlation context
    #[serde(default = "empty_object")]
    pub correlation_data: JsonValue,
}

fn empty_object() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}

impl RootCause {
    /// The embedded migration-analysis block, if any.
    pub fn migration_analysis(&self) -> Option<&JsonValue> {
        self.correlation_data.get("migration_analysis")
    }

    /// True when correlation concluded a recent migration likely caused the
    /// anomaly.
    pub fn migration_likely_cause(&self) -> bool {
        self.migration_analysis()
            .and_then(|m| m.get("likely_cause"))
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Natural-language migration impact summary, if present.
    pub fn migration_impact_summary(&self) -> Option<&str> {
        self.migration_analysis()
            .and_then(|m| m.get("impact_summary"))
            .and_then(JsonValue::as_str)
    }

    /// Individual migration impact factors, empty when absent.
    pub fn migration_impact_factors(&self) -> Vec<&str> {
        self.migration_analysis()
            .and_then(|m| m.get("impact_factors"))
            .and_then(JsonValue::as_array)
            .map(|a| a.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default()
    }
}

/// Priority of a recommendation.
///
/// Ordering matters: recommendation lists are emitted priority-descending and
/// are not re-sorted downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Act immediately
    Critical,
    /// Act soon
    High,
    /// Schedule
    Medium,
    /// Opportunistic
    Low,
}

impl Priority {
    /// Rank for descending sort, lower is more urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// Marker used when rendering recommendation lists.
    pub fn marker(&self) -> &'static str {
        match self {
            Priority::Critical => "\u{1F534}",
            Priority::High => "\u{1F7E0}",
            Priority::Medium => "\u{1F7E1}",
            Priority::Low => "\u{1F7E2}",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        f.write_str(s)
    }
}

/// Risk of applying a recommendation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Safe to apply
    #[default]
    Low,
    /// Needs monitoring during rollout
    Medium,
    /// Needs a rollback plan
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(s)
    }
}

/// A single actionable remediation item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Urgency of this item
    pub priority: Priority,
    /// Concrete action to take
    pub action: String,
    /// Why this action addresses the root cause
    pub rationale: String,
    /// What is expected to improve
    pub expected_impact: String,
    /// Ordered implementation steps
    #[serde(default)]
    pub implementation_steps: Vec<String>,
    /// Time or resources required, free text
    #[serde(default)]
    pub estimated_effort: String,
    /// Risk of applying this recommendation
    #[serde(default)]
    pub risk_level: RiskLevel,
    /// Savings estimate and performance note, cost anomalies only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_impact: Option<String>,
}

/// Plain-language summary for non-technical audiences.
///
/// Answers, in order: what happened, why it happened, what the impact is,
/// what can be improved and what the expected benefit is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanReadableSummary {
    /// Clear explanation of the issue
    pub what_happened: String,
    /// Root cause in simple terms
    pub why_it_happened: String,
    /// Business and operational impact
    pub what_is_the_impact: String,
    /// Recommended actions
    pub what_improvements_can_be_made: String,
    /// Expected outcomes if the actions are taken
    pub estimated_benefit_if_implemented: String,
}

/// Terminal artifact of the pipeline.
///
/// References exactly one [`Anomaly`] and exactly one [`RootCause`]. Owned by
/// the orchestrator until it is handed to the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyAnalysis {
    /// The anomaly this analysis explains
    pub anomaly: Anomaly,
    /// Resolved root cause
    pub root_cause: RootCause,
    /// Remediation items, priority-descending as emitted by the resolver
    pub recommendations: Vec<Recommendation>,
    /// Plain-language summary
    pub summary: HumanReadableSummary,
    /// When the analysis completed
    pub analyzed_at: DateTime<Utc>,
    /// Wall-clock duration of the full pipeline
    pub analysis_duration: Duration,
    /// Model name when the reasoning arm produced the root cause, otherwise
    /// "rule-based"
    pub ai_model_used: String,
    /// Summary of the historical sample window
    pub historical_context: String,
    /// Trend description over the context window
    pub trend_analysis: String,
    /// Expected impact if the anomaly is not addressed
    pub predicted_impact: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn anomaly() -> Anomaly {
        Anomaly {
            anomaly_id: "test-001".to_string(),
            detected_at: Utc::now(),
            metric_name: "error_rate".to_string(),
            metric_type: "Error_Rate _%_".to_string(),
            current_value: 45.0,
            baseline_value: 22.8,
            deviation_sigma: 5.3,
            deviation_percentage: 97.4,
            anomaly_type: AnomalyType::Stability,
            severity: Severity::Critical,
            confidence: 0.95,
            affected_resources: None,
            metadata: None,
        }
    }

    #[test]
    fn test_anomaly_type_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&AnomalyType::Stability).unwrap(),
            "\"stability\""
        );
        let parsed: AnomalyType = serde_json::from_str("\"cost\"").unwrap();
        assert_eq!(parsed, AnomalyType::Cost);
    }

    #[test]
    fn test_severity_urgency() {
        assert!(Severity::Critical.is_urgent());
        assert!(Severity::High.is_urgent());
        assert!(!Severity::Medium.is_urgent());
        assert!(!Severity::Low.is_urgent());
    }

    #[test]
    fn test_priority_rank_ordering() {
        assert!(Priority::Critical.rank() < Priority::High.rank());
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }

    #[test]
    fn test_risk_level_defaults_low() {
        assert_eq!(RiskLevel::default(), RiskLevel::Low);
    }

    #[test]
    fn test_recommendation_deserialize_defaults() {
        // Only the mandatory fields are present; the rest must default.
        let rec: Recommendation = serde_json::from_value(json!({
            "priority": "high",
            "action": "Scale out the worker pool",
            "rationale": "Queue depth is growing",
            "expected_impact": "Latency returns to baseline"
        }))
        .unwrap();
        assert_eq!(rec.priority, Priority::High);
        assert!(rec.implementation_steps.is_empty());
        assert_eq!(rec.risk_level, RiskLevel::Low);
        assert!(rec.cost_impact.is_none());
    }

    #[test]
    fn test_root_cause_migration_helpers() {
        let root_cause = RootCause {
            primary_cause: "cause".to_string(),
            contributing_factors: vec!["factor".to_string()],
            confidence: 0.8,
            evidence: vec![],
            correlation_data: json!({
                "migration_analysis": {
                    "likely_cause": true,
                    "impact_summary": "migration added load",
                    "impact_factors": ["added 500 users"]
                }
            }),
        };
        assert!(root_cause.migration_likely_cause());
        assert_eq!(
            root_cause.migration_impact_summary(),
            Some("migration added load")
        );
        assert_eq!(
            root_cause.migration_impact_factors(),
            vec!["added 500 users"]
        );
    }

    #[test]
    fn test_root_cause_empty_correlation_data() {
        let root_cause = RootCause {
            primary_cause: "cause".to_string(),
            contributing_factors: vec!["factor".to_string()],
            confidence: 0.75,
            evidence: vec![],
            correlation_data: serde_json::json!({}),
        };
        assert!(!root_cause.migration_likely_cause());
        assert!(root_cause.migration_impact_summary().is_none());
        assert!(root_cause.migration_impact_factors().is_empty());
    }

    #[test]
    fn test_root_cause_correlation_data_default_on_deserialize() {
        let root_cause: RootCause = serde_json::from_value(json!({
            "primary_cause": "cause",
            "contributing_factors": ["f"],
            "confidence": 0.5,
            "evidence": ["e"]
        }))
        .unwrap();
        assert!(root_cause.correlation_data.is_object());
    }

    #[test]
    fn test_anomaly_roundtrip() {
        let a = anomaly();
        let text = serde_json::to_string(&a).unwrap();
        let back: Anomaly = serde_json::from_str(&text).unwrap();
        assert_eq!(back.anomaly_id, a.anomaly_id);
        assert_eq!(back.anomaly_type, a.anomaly_type);
        assert_eq!(back.severity, a.severity);
    }

    #[test]
    fn test_anomaly_optional_fields_tolerated() {
        // Upstream detectors may omit affected_resources and metadata.
        let text = r#"{
            "anomaly_id": "a-1",
            "detected_at": "2026-01-10T12:00:00Z",
            "metric_name": "request_latency",
            "metric_type": "Request_Latency _ms_",
            "current_value": 950.0,
            "baseline_value": 220.0,
            "deviation_sigma": 3.4,
            "deviation_percentage": 331.8,
            "anomaly_type": "performance",
            "severity": "high",
            "confidence": 0.9
        }"#;
        let a: Anomaly = serde_json::from_str(text).unwrap();
        assert!(a.affected_resources.is_none());
        assert!(a.metadata.is_none());
    }
}
