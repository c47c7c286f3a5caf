// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Recommendation generation
//!
//! Same two-arm shape as the root-cause resolver. The reasoning arm asks the
//! capability for 2-4 prioritized recommendations and falls through to the
//! deterministic catalogs on any failure. The deterministic arm carries a
//! fixed two-item catalog per anomaly type; types without a catalog yield an
//! empty list, which downstream consumers handle gracefully.
//!
//! Lists are emitted priority-descending and are not re-sorted downstream.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::analyzer::AnalysisContext;
use crate::anomaly::{Anomaly, AnomalyType, Priority, Recommendation, RiskLevel, RootCause};
use crate::capability::{GenerationOptions, TextGenerator};
use crate::error::{Error, Result};
use crate::json::extract_json_object;
use crate::prompts;
use crate::root_cause::ResolverArm;

/// Generates remediation recommendations for an analyzed anomaly.
#[derive(Default)]
pub struct RecommendationGenerator {
    generator: Option<Arc<dyn TextGenerator>>,
    options: GenerationOptions,
}

impl RecommendationGenerator {
    /// Create a generator with only the deterministic arm.
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

    /// Generate recommendations. Never fails; reasoning-arm failures fall
    /// through to the deterministic catalogs.
    pub async fn generate(
        &self,
        anomaly: &Anomaly,
        root_cause: &RootCause,
        _context: &AnalysisContext,
    ) -> (Vec<Recommendation>, ResolverArm) {
        if let Some(generator) = &self.generator {
            match self
                .reasoning_arm(generator.as_ref(), anomaly, root_cause)
                .await
            {
                Ok(recommendations) => {
                    debug!(
                        anomaly_id = %anomaly.anomaly_id,
                        count = recommendations.len(),
                        "reasoning arm produced recommendations"
                    );
                    return (recommendations, ResolverArm::Reasoning);
                }
                Err(e) => {
                    warn!(
                        anomaly_id = %anomaly.anomaly_id,
                        error = %e,
                        "reasoning recommendation generation failed, using rule-based"
                    );
                }
            }
        }
        (Self::rule_based(anomaly), ResolverArm::RuleBased)
    }

    async fn reasoning_arm(
        &self,
        generator: &dyn TextGenerator,
        anomaly: &Anomaly,
        root_cause: &RootCause,
    ) -> Result<Vec<Recommendation>> {
        let prompt = prompts::recommendation_prompt(anomaly, root_cause);
        let response = generator.generate(&prompt, &self.options).await?;
        let value = extract_json_object(&response)?;

        let items = value
            .get("recommendations")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| Error::MalformedCapabilityResponse {
                reason: "missing 'recommendations'".to_string(),
            })?;
        if items.is_empty() {
            return Err(Error::MalformedCapabilityResponse {
                reason: "'recommendations' is empty".to_string(),
            });
        }

        let mut recommendations = items
            .iter()
            .map(|item| {
                serde_json::from_value::<Recommendation>(item.clone()).map_err(|e| {
                    Error::MalformedCapabilityResponse {
                        reason: format!("recommendation does not match the expected shape: {e}"),
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Emit priority-descending; downstream consumers never re-sort.
        recommendations.sort_by_key(|r| r.priority.rank());
        Ok(recommendations)
    }

    /// Deterministic catalog keyed on the anomaly type.
    pub fn rule_based(anomaly: &Anomaly) -> Vec<Recommendation> {
        match anomaly.anomaly_type {
            AnomalyType::Stability => vec![
                Recommendation {
                    priority: Priority::High,
                    action: format!(
                        "Investigate and address elevated {}",
                        anomaly.metric_name
                    ),
                    rationale: "High error rates indicate system instability that requires immediate attention"
                        .to_string(),
                    expected_impact: "Restore system stability and prevent cascading failures"
                        .to_string(),
                    implementation_steps: vec![
                        "Review recent logs for error patterns".to_string(),
                        "Check for resource constraints".to_string(),
                        "Verify configuration changes".to_string(),
                        "Implement additional error handling".to_string(),
                    ],
                    estimated_effort: "30-60 minutes".to_string(),
                    risk_level: RiskLevel::Low,
                    cost_impact: None,
                },
                Recommendation {
                    priority: Priority::Medium,
                    action: "Implement enhanced monitoring and alerting".to_string(),
                    rationale: "Early detection prevents issues from escalating".to_string(),
                    expected_impact: "Faster incident response and reduced downtime".to_string(),
                    implementation_steps: vec![
                        "Set up alerts for error rate thresholds".to_string(),
                        "Configure log aggregation".to_string(),
                        "Create dashboard for key metrics".to_string(),
                    ],
                    estimated_effort: "1-2 hours".to_string(),
                    risk_level: RiskLevel::Low,
                    cost_impact: None,
                },
            ],
            AnomalyType::Performance => vec![
                Recommendation {
                    priority: Priority::High,
                    action: "Optimize resource allocation".to_string(),
                    rationale: "Performance degradation often indicates resource bottlenecks"
                        .to_string(),
                    expected_impact: "Improve response times by 20-40%".to_string(),
                    implementation_steps: vec![
                        "Analyze resource utilization patterns".to_string(),
                        "Identify bottlenecks (CPU, memory, I/O)".to_string(),
                        "Scale resources appropriately".to_string(),
                        "Implement caching where applicable".to_string(),
                    ],
                    estimated_effort: "1-3 hours".to_string(),
                    risk_level: RiskLevel::Medium,
                    cost_impact: None,
                },
                Recommendation {
                    priority: Priority::Medium,
                    action: "Review and optimize queries/operations".to_string(),
                    rationale: "Inefficient operations compound under load".to_string(),
                    expected_impact: "Reduce latency and improve throughput".to_string(),
                    implementation_steps: vec![
                        "Profile slow operations".to_string(),
                        "Optimize database queries".to_string(),
                        "Implement connection pooling".to_string(),
                        "Add appropriate indexes".to_string(),
                    ],
                    estimated_effort: "2-4 hours".to_string(),
                    risk_level: RiskLevel::Low,
                    cost_impact: None,
                },
            ],
            AnomalyType::Cost => vec![
                Recommendation {
                    priority: Priority::High,
                    action: "Right-size over-provisioned resources".to_string(),
                    rationale: "Resources are allocated beyond actual usage requirements"
                        .to_string(),
                    expected_impact: "Reduce costs by 20-40% without performance impact"
                        .to_string(),
                    implementation_steps: vec![
                        "Analyze actual resource utilization".to_string(),
                        "Identify over-provisioned instances".to_string(),
                        "Gradually reduce resource allocation".to_string(),
                        "Monitor performance during changes".to_string(),
                    ],
                    estimated_effort: "1-2 hours".to_string(),
                    risk_level: RiskLevel::Low,
                    cost_impact: Some(
                        "Performance will not be affected because current utilization is well below provisioned capacity"
                            .to_string(),
                    ),
                },
                Recommendation {
                    priority: Priority::Medium,
                    action: "Implement auto-scaling policies".to_string(),
                    rationale: "Match resource allocation to actual demand".to_string(),
                    expected_impact: "Optimize costs while maintaining performance".to_string(),
                    implementation_steps: vec![
                        "Define scaling metrics and thresholds".to_string(),
                        "Configure auto-scaling groups".to_string(),
                        "Set minimum and maximum limits".to_string(),
                        "Test scaling behavior".to_string(),
                    ],
                    estimated_effort: "2-3 hours".to_string(),
                    risk_level: RiskLevel::Medium,
                    cost_impact: Some(
                        "Save 30-50% on compute costs during low-traffic periods".to_string(),
                    ),
                },
            ],
            // No catalog for this type; callers handle zero recommendations.
            AnomalyType::Resource => Vec::new(),
        }
    }
}
