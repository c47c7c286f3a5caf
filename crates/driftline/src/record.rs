// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Flat persistence record
//!
//! [`AnalysisRecord`] is the row handed to the persistence collaborator. It
//! flattens the analysis into scalar columns plus the serialized
//! recommendation list, and carries reviewer-feedback fields that this crate
//! only initializes: a human later marks false positives, this pipeline never
//! sets them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::anomaly::{
    AnomalyAnalysis, AnomalyType, Priority, Recommendation, RiskLevel, Severity,
};

/// One recommendation as stored, all eight fields always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRecord {
    /// Urgency
    pub priority: Priority,
    /// Concrete action
    pub action: String,
    /// Why it addresses the root cause
    pub rationale: String,
    /// Expected improvement
    pub expected_impact: String,
    /// Ordered steps
    pub implementation_steps: Vec<String>,
    /// Effort estimate
    pub estimated_effort: String,
    /// Application risk
    pub risk_level: RiskLevel,
    /// Savings note, null for non-cost items
    pub cost_impact: Option<String>,
}

impl From<&Recommendation> for RecommendationRecord {
    fn from(rec: &Recommendation) -> Self {
        Self {
            priority: rec.priority,
            action: rec.action.clone(),
            rationale: rec.rationale.clone(),
            expected_impact: rec.expected_impact.clone(),
            implementation_steps: rec.implementation_steps.clone(),
            estimated_effort: rec.estimated_effort.clone(),
            risk_level: rec.risk_level,
            cost_impact: rec.cost_impact.clone(),
        }
    }
}

/// Flat analysis row for the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Record identity
    pub analysis_id: String,
    /// Identity of the analyzed anomaly
    pub anomaly_id: String,
    /// When the analysis completed
    pub analyzed_at: DateTime<Utc>,

    // Anomaly details
    /// When the anomaly was detected
    pub anomaly_detected_at: DateTime<Utc>,
    /// Metric identifier
    pub metric_name: String,
    /// Unit-bearing metric tag
    pub metric_type: String,
    /// Observed value
    pub current_value: f64,
    /// Baseline value
    pub baseline_value: f64,
    /// Deviation in standard deviations
    pub deviation_sigma: f64,
    /// Deviation in percent
    pub deviation_percentage: f64,
    /// Anomaly category
    pub anomaly_type: AnomalyType,
    /// Detector severity
    pub severity: Severity,
    /// Detector confidence
    pub confidence: f64,

    // Root cause
    /// Primary cause statement
    pub root_cause_primary: String,
    /// Contributing factors
    pub root_cause_factors: Vec<String>,
    /// Resolver confidence
    pub root_cause_confidence: f64,
    /// Supporting evidence
    pub root_cause_evidence: Vec<String>,

    /// Serialized recommendation list
    pub recommendations: Vec<RecommendationRecord>,

    // Human-readable summary
    /// What happened
    pub summary_what_happened: String,
    /// Why it happened
    pub summary_why_happened: String,
    /// Operational impact
    pub summary_impact: String,
    /// Recommended improvements
    pub summary_improvements: String,
    /// Expected benefits
    pub summary_benefits: String,

    // Analysis metadata
    /// Model tag or "rule-based"
    pub ai_model_used: String,
    /// Pipeline duration in milliseconds
    pub analysis_duration_ms: u64,

    // Migration context
    /// Whether correlation flagged a migration as the likely cause
    pub migration_detected: bool,
    /// Migration impact summary, if correlation ran
    pub migration_summary: Option<String>,

    // Reviewer feedback, initialized null and set by humans later
    /// Reviewer verdict
    pub is_false_positive: Option<bool>,
    /// Reviewer identity
    pub reviewed_by: Option<String>,
    /// When the review happened
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reviewer comments
    pub review_notes: Option<String>,
    /// Why a false positive, e.g. "expected_behavior" or "incorrect_baseline"
    pub feedback_category: Option<String>,

    // Notification bookkeeping
    /// Whether a notification was sent
    pub notified: bool,
    /// Delivery attempts so far
    pub notification_attempts: u32,
}

impl AnalysisRecord {
    /// Flatten an analysis into a record with a fresh identity and null
    /// feedback fields.
    pub fn from_analysis(analysis: &AnomalyAnalysis) -> Self {
        let anomaly = &analysis.anomaly;
        let root_cause = &analysis.root_cause;

        Self {
            analysis_id: Uuid::new_v4().to_string(),
            anomaly_id: anomaly.anomaly_id.clone(),
            analyzed_at: analysis.analyzed_at,

            anomaly_detected_at: anomaly.detected_at,
            metric_name: anomaly.metric_name.clone(),
            metric_type: anomaly.metric_type.clone(),
            current_value: anomaly.current_value,
            baseline_value: anomaly.baseline_value,
            deviation_sigma: anomaly.deviation_sigma,
            deviation_percentage: anomaly.deviation_percentage,
            anomaly_type: anomaly.anomaly_type,
            severity: anomaly.severity,
            confidence: anomaly.confidence,

            root_cause_primary: root_cause.primary_cause.clone(),
            root_cause_factors: root_cause.contributing_factors.clone(),
            root_cause_confidence: root_cause.confidence,
            root_cause_evidence: root_cause.evidence.clone(),

            recommendations: analysis
                .recommendations
                .iter()
                .map(RecommendationRecord::from)
                .collect(),

            summary_what_happened: analysis.summary.what_happened.clone(),
            summary_why_happened: analysis.summary.why_it_happened.clone(),
            summary_impact: analysis.summary.what_is_the_impact.clone(),
            summary_improvements: analysis.summary.what_improvements_can_be_made.clone(),
            summary_benefits: analysis.summary.estimated_benefit_if_implemented.clone(),

            ai_model_used: analysis.ai_model_used.clone(),
            analysis_duration_ms: analysis.analysis_duration.as_millis() as u64,

            migration_detected: root_cause.migration_likely_cause(),
            migration_summary: root_cause.migration_impact_summary().map(str::to_string),

            is_false_positive: None,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            feedback_category: None,

            notified: false,
            notification_attempts: 0,
        }
    }
}
