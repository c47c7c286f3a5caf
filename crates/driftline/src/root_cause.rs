// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Root-cause resolution
//!
//! Two arms behind one call: a reasoning arm that asks the text-generation
//! capability for a structured analysis, and a deterministic arm driven by a
//! fixed table keyed on the anomaly type. Any reasoning failure (call error,
//! malformed response, missing keys) falls through to the deterministic arm;
//! a raw capability error never escapes this module.

use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::analyzer::AnalysisContext;
use crate::anomaly::{Anomaly, AnomalyType, RootCause};
use crate::capability::{GenerationOptions, TextGenerator};
use crate::error::{Error, Result};
use crate::json::extract_json_object;
use crate::prompts;

/// Confidence reported by the deterministic arm.
pub const RULE_BASED_CONFIDENCE: f64 = 0.75;

/// Which arm produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverArm {
    /// The reasoning capability produced the result
    Reasoning,
    /// The deterministic fallback produced the result
    RuleBased,
}

impl fmt::Display for ResolverArm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolverArm::Reasoning => "reasoning",
            ResolverArm::RuleBased => "rule-based",
        };
        f.write_str(s)
    }
}

/// Resolves the root cause of an anomaly.
#[derive(Default)]
pub struct RootCauseResolver {
    generator: Option<Arc<dyn TextGenerator>>,
    options: GenerationOptions,
}

impl RootCauseResolver {
    /// Create a resolver with only the deterministic arm.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a reasoning capability.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Override the capability sampling options.
    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve a root cause. Never fails; every reasoning-arm failure falls
    /// through to the deterministic arm.
    pub async fn resolve(
        &self,
        anomaly: &Anomaly,
        context: &AnalysisContext,
    ) -> (RootCause, ResolverArm) {
        if let Some(generator) = &self.generator {
            match self.reasoning_arm(generator.as_ref(), anomaly, context).await {
                Ok(root_cause) => {
                    debug!(anomaly_id = %anomaly.anomaly_id, "reasoning arm resolved root cause");
                    return (root_cause, ResolverArm::Reasoning);
                }
                Err(e) => {
                    warn!(
                        anomaly_id = %anomaly.anomaly_id,
                        error = %e,
                        "reasoning root-cause analysis failed, using rule-based"
                    );
                }
            }
        }
        (Self::rule_based(anomaly, context), ResolverArm::RuleBased)
    }

    async fn reasoning_arm(
        &self,
        generator: &dyn TextGenerator,
        anomaly: &Anomaly,
        context: &AnalysisContext,
    ) -> Result<RootCause> {
        let prompt = prompts::root_cause_prompt(anomaly, context);
        let response = generator.generate(&prompt, &self.options).await?;
        let value = extract_json_object(&response)?;

        let primary_cause = required_str(&value, "primary_cause")?.to_string();
        let contributing_factors = required_string_list(&value, "contributing_factors")?;
        if contributing_factors.is_empty() {
            return Err(Error::MalformedCapabilityResponse {
                reason: "'contributing_factors' is empty".to_string(),
            });
        }
        let confidence = value
            .get("confidence")
            .and_then(JsonValue::as_f64)
            .ok_or_else(|| Error::MalformedCapabilityResponse {
                reason: "missing 'confidence'".to_string(),
            })?
            .clamp(0.0, 1.0);
        let evidence = required_string_list(&value, "evidence")?;

        // Carry the correlation result through even when the model omits it.
        let mut correlation_data = value
            .get("correlation_data")
            .cloned()
            .unwrap_or_else(|| json!({}));
        if !correlation_data.is_object() {
            correlation_data = json!({});
        }
        if correlation_data.get("migration_analysis").is_none() {
            if let (Some(map), Ok(analysis)) = (
                correlation_data.as_object_mut(),
                serde_json::to_value(&context.correlation),
            ) {
                map.insert("migration_analysis".to_string(), analysis);
            }
        }

        Ok(RootCause {
            primary_cause,
            contributing_factors,
            confidence,
            evidence,
            correlation_data,
        })
    }

    /// Deterministic root cause from the fixed per-type table.
    pub fn rule_based(anomaly: &Anomaly, context: &AnalysisContext) -> RootCause {
        let (primary_cause, mut contributing_factors) = match anomaly.anomaly_type {
            AnomalyType::Stability => (
                format!(
                    "Elevated {} indicating system instability",
                    anomaly.metric_name
                ),
                vec![
                    "Increased error rate beyond normal thresholds".to_string(),
                    "Potential resource contention".to_string(),
                    "Possible configuration changes".to_string(),
                ],
            ),
            AnomalyType::Performance => (
                format!("Performance degradation in {}", anomaly.metric_name),
                vec![
                    "Increased workload or traffic".to_string(),
                    "Resource bottleneck".to_string(),
                    "Inefficient processing".to_string(),
                ],
            ),
            AnomalyType::Cost => (
                format!("Unexpected cost increase in {}", anomaly.metric_name),
                vec![
                    "Over-provisioned resources".to_string(),
                    "Inefficient resource utilization".to_string(),
                    "Unnecessary redundancy".to_string(),
                ],
            ),
            AnomalyType::Resource => (
                format!("Anomalous behavior detected in {}", anomaly.metric_name),
                vec!["Deviation from established baseline".to_string()],
            ),
        };

        if !context.recent_changes.is_empty() {
            contributing_factors.push("Recent system changes or migrations".to_string());
        }

        let evidence = vec![
            format!(
                "Current value ({:.2}) deviates {:.2} sigma from baseline ({:.2})",
                anomaly.current_value, anomaly.deviation_sigma, anomaly.baseline_value
            ),
            format!(
                "Deviation represents {:.1}% change",
                anomaly.deviation_percentage
            ),
            format!("Confidence level: {:.0}%", anomaly.confidence * 100.0),
        ];

        RootCause {
            primary_cause,
            contributing_factors,
            confidence: RULE_BASED_CONFIDENCE,
            evidence,
            correlation_data: json!({}),
        }
    }
}

fn required_str<'a>(value: &'a JsonValue, key: &str) -> Result<&'a str> {
    value
        .get(key)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::MalformedCapabilityResponse {
            reason: format!("missing '{key}'"),
        })
}

fn required_string_list(value: &JsonValue, key: &str) -> Result<Vec<String>> {
    let array = value
        .get(key)
        .and_then(JsonValue::as_array)
        .ok_or_else(|| Error::MalformedCapabilityResponse {
            reason: format!("missing '{key}'"),
        })?;
    Ok(array
        .iter()
        .filter_map(JsonValue::as_str)
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::Severity;
    use crate::correlation::{ChangeEvent, ResourceDelta};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    struct ScriptedGenerator {
        text: Option<String>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            match &self.text {
                Some(text) => Ok(text.clone()),
                None => Err(Error::CapabilityUnavailable {
                    reason: "scripted failure".to_string(),
                }),
            }
        }
    }

    fn anomaly(anomaly_type: AnomalyType) -> Anomaly {
        Anomaly {
            anomaly_id: "a-1".to_string(),
            detected_at: Utc::now(),
            metric_name: "error_rate".to_string(),
            metric_type: "Error_Rate _%_".to_string(),
            current_value: 8.5,
            baseline_value: 2.52,
            deviation_sigma: 4.12,
            deviation_percentage: 237.3,
            anomaly_type,
            severity: Severity::High,
            confidence: 0.9,
            affected_resources: None,
            metadata: None,
        }
    }

    fn context_with_change() -> AnalysisContext {
        let now = Utc::now();
        let events = vec![ChangeEvent {
            event_id: "mig-1".to_string(),
            change_type: "user_migration".to_string(),
            occurred_at: now - Duration::hours(2),
            source_system: "legacy".to_string(),
            target_system: "cloud".to_string(),
            user_count_change: Some(500),
            resource_requirements: Some(ResourceDelta::default()),
            description: String::new(),
            status: "completed".to_string(),
        }];
        AnalysisContext::for_events(now, events)
    }

    #[tokio::test]
    async fn test_failing_capability_falls_back() {
        let resolver =
            RootCauseResolver::new().with_generator(Arc::new(ScriptedGenerator { text: None }));
        let (root_cause, arm) = resolver
            .resolve(&anomaly(AnomalyType::Stability), &AnalysisContext::empty())
            .await;
        assert_eq!(arm, ResolverArm::RuleBased);
        assert!((root_cause.confidence - 0.75).abs() < f64::EPSILON);
        assert_eq!(root_cause.evidence.len(), 3);
    }

    #[tokio::test]
    async fn test_reasoning_arm_maps_fields() {
        let response = r#"```json
        {
            "primary_cause": "Deployment doubled request volume",
            "contributing_factors": ["Traffic spike", "Cold caches"],
            "confidence": 0.88,
            "evidence": ["Requests 2x baseline", "Cache hit rate dropped"],
            "correlation_data": {"temporal_correlation": 0.9}
        }
        ```"#;
        let resolver = RootCauseResolver::new().with_generator(Arc::new(ScriptedGenerator {
            text: Some(response.to_string()),
        }));
        let (root_cause, arm) = resolver
            .resolve(&anomaly(AnomalyType::Performance), &context_with_change())
            .await;
        assert_eq!(arm, ResolverArm::Reasoning);
        assert_eq!(root_cause.primary_cause, "Deployment doubled request volume");
        assert_eq!(root_cause.contributing_factors.len(), 2);
        assert!((root_cause.confidence - 0.88).abs() < 1e-9);
        // The correlation block is grafted in when the model omits it.
        assert!(root_cause.migration_analysis().is_some());
        assert!(root_cause.migration_likely_cause());
    }

    #[tokio::test]
    async fn test_confidence_clamped() {
        let response = r#"{
            "primary_cause": "cause",
            "contributing_factors": ["f"],
            "confidence": 1.7,
            "evidence": ["e"]
        }"#;
        let resolver = RootCauseResolver::new().with_generator(Arc::new(ScriptedGenerator {
            text: Some(response.to_string()),
        }));
        let (root_cause, _) = resolver
            .resolve(&anomaly(AnomalyType::Stability), &AnalysisContext::empty())
            .await;
        assert!((root_cause.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_missing_keys_fall_back() {
        let response = r#"{"primary_cause": "cause only"}"#;
        let resolver = RootCauseResolver::new().with_generator(Arc::new(ScriptedGenerator {
            text: Some(response.to_string()),
        }));
        let (root_cause, arm) = resolver
            .resolve(&anomaly(AnomalyType::Stability), &AnalysisContext::empty())
            .await;
        assert_eq!(arm, ResolverArm::RuleBased);
        assert!((root_cause.confidence - RULE_BASED_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_empty_factors_fall_back() {
        let response = r#"{
            "primary_cause": "cause",
            "contributing_factors": [],
            "confidence": 0.9,
            "evidence": ["e"]
        }"#;
        let resolver = RootCauseResolver::new().with_generator(Arc::new(ScriptedGenerator {
            text: Some(response.to_string()),
        }));
        let (_, arm) = resolver
            .resolve(&anomaly(AnomalyType::Stability), &AnalysisContext::empty())
            .await;
        assert_eq!(arm, ResolverArm::RuleBased);
    }

    #[tokio::test]
    async fn test_non_json_falls_back() {
        let resolver = RootCauseResolver::new().with_generator(Arc::new(ScriptedGenerator {
            text: Some("I am unable to analyze this anomaly.".to_string()),
        }));
        let (_, arm) = resolver
            .resolve(&anomaly(AnomalyType::Cost), &AnalysisContext::empty())
            .await;
        assert_eq!(arm, ResolverArm::RuleBased);
    }

    #[test]
    fn test_rule_based_per_type_tables() {
        let ctx = AnalysisContext::empty();
        let stability =
            RootCauseResolver::rule_based(&anomaly(AnomalyType::Stability), &ctx);
        assert!(stability.primary_cause.contains("system instability"));
        assert_eq!(stability.contributing_factors.len(), 3);

        let performance =
            RootCauseResolver::rule_based(&anomaly(AnomalyType::Performance), &ctx);
        assert!(performance.primary_cause.contains("Performance degradation"));

        let cost = RootCauseResolver::rule_based(&anomaly(AnomalyType::Cost), &ctx);
        assert!(cost.primary_cause.contains("cost increase"));

        let resource = RootCauseResolver::rule_based(&anomaly(AnomalyType::Resource), &ctx);
        assert!(resource.primary_cause.contains("Anomalous behavior"));
        assert_eq!(resource.contributing_factors.len(), 1);
    }

    #[test]
    fn test_rule_based_appends_change_factor() {
        let root_cause = RootCauseResolver::rule_based(
            &anomaly(AnomalyType::Stability),
            &context_with_change(),
        );
        assert_eq!(root_cause.contributing_factors.len(), 4);
        assert_eq!(
            root_cause.contributing_factors.last().map(String::as_str),
            Some("Recent system changes or migrations")
        );
    }

    #[test]
    fn test_rule_based_evidence_templates() {
        let root_cause = RootCauseResolver::rule_based(
            &anomaly(AnomalyType::Stability),
            &AnalysisContext::empty(),
        );
        assert_eq!(root_cause.evidence.len(), 3);
        assert!(root_cause.evidence[0].contains("8.50"));
        assert!(root_cause.evidence[0].contains("4.12 sigma"));
        assert!(root_cause.evidence[1].contains("237.3%"));
        assert!(root_cause.evidence[2].contains("90%"));
        assert_eq!(root_cause.correlation_data, json!({}));
    }
}
