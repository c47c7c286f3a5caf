// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Prompt builders for the reasoning capability
//!
//! Each prompt embeds the structured context and pins the expected JSON
//! response shape. Keep the response-shape blocks in sync with the parsers in
//! [`crate::root_cause`], [`crate::recommend`] and
//! [`crate::baseline::optimizer`].

use crate::analyzer::AnalysisContext;
use crate::anomaly::{Anomaly, AnomalyType, RootCause};
use crate::baseline::DataCharacteristics;

/// Prompt asking the capability to determine an anomaly's root cause.
pub fn root_cause_prompt(anomaly: &Anomaly, context: &AnalysisContext) -> String {
    let recent_changes =
        serde_json::to_string_pretty(&context.recent_changes).unwrap_or_else(|_| "[]".to_string());
    let migration_analysis = serde_json::to_string_pretty(&context.correlation)
        .unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are an expert cloud infrastructure analyst specializing in anomaly detection and root cause analysis.

ANOMALY DETAILS:
- Type: {anomaly_type}
- Metric: {metric}
- Current Value: {current:.2}
- Baseline Value: {baseline:.2}
- Deviation: {sigma:.2} sigma ({percentage:.1}%)
- Severity: {severity}
- Detected At: {detected_at}

CONTEXT:
- Historical Summary: {historical}
- Trend: {trend}
- Recent Changes: {recent_changes}

MIGRATION ANALYSIS:
{migration_analysis}

TASK:
Analyze this anomaly and determine the root cause. Consider:
1. What is the PRIMARY cause of this anomaly?
2. What are the CONTRIBUTING factors?
3. What EVIDENCE supports your analysis?
4. Are there CORRELATIONS with other events?
5. IMPORTANT: Did recent MIGRATIONS cause this? Check for:
   - User migrations (additional users added to the system)
   - Functionality changes (new features requiring more resources)
   - Configuration changes
   - Resource requirement changes

RESPOND IN JSON FORMAT:
{{
  "primary_cause": "Clear, specific statement of the root cause",
  "contributing_factors": [
    "Factor 1",
    "Factor 2",
    "Factor 3"
  ],
  "confidence": 0.85,
  "evidence": [
    "Specific data point or observation 1",
    "Specific data point or observation 2",
    "Specific data point or observation 3"
  ],
  "correlation_data": {{
    "correlated_events": ["event1", "event2"],
    "temporal_correlation": 0.92,
    "migration_analysis": {{
      "likely_cause": true,
      "impact_summary": "Description of migration impact",
      "impact_factors": ["factor1", "factor2"]
    }}
  }}
}}

IMPORTANT:
- Be specific and data-driven
- Cite evidence from the provided context
- Focus on actionable insights
- Pay special attention to migration events, they are a common cause of anomalies
- If migrations added users or functionality, explain how that increased resource demands
- Consider both technical and operational factors
"#,
        anomaly_type = anomaly.anomaly_type,
        metric = anomaly.metric_name,
        current = anomaly.current_value,
        baseline = anomaly.baseline_value,
        sigma = anomaly.deviation_sigma,
        percentage = anomaly.deviation_percentage,
        severity = anomaly.severity,
        detected_at = anomaly.detected_at.to_rfc3339(),
        historical = context.historical_summary,
        trend = context.trend_analysis,
    )
}

/// Prompt asking the capability for remediation recommendations.
pub fn recommendation_prompt(anomaly: &Anomaly, root_cause: &RootCause) -> String {
    let guidance = match anomaly.anomaly_type {
        AnomalyType::Stability => {
            "STABILITY ISSUE - Focus on:\n\
             - How to restore system stability\n\
             - Preventing cascading failures\n\
             - Improving error handling and resilience\n\
             - Monitoring and alerting improvements"
        }
        AnomalyType::Performance => {
            "PERFORMANCE ISSUE - Focus on:\n\
             - How to improve response times\n\
             - Optimizing resource utilization\n\
             - Scaling strategies\n\
             - Caching and optimization opportunities"
        }
        AnomalyType::Cost => {
            "COST OPTIMIZATION - Focus on:\n\
             - Cost-saving opportunities\n\
             - Right-sizing resources\n\
             - Eliminating waste\n\
             - WHY changes won't negatively impact performance\n\
             - Cost-benefit analysis"
        }
        AnomalyType::Resource => "",
    };

    format!(
        r#"You are an expert cloud infrastructure consultant providing actionable recommendations.

ANOMALY:
- Type: {anomaly_type}
- Severity: {severity}
- Metric: {metric}
- Deviation: {percentage:.1}%

ROOT CAUSE:
- Primary: {primary_cause}
- Contributing Factors: {factors}
- Confidence: {confidence:.0}%

{guidance}

TASK:
Provide 2-4 specific, actionable recommendations to address this anomaly.

For EACH recommendation, provide:
1. Priority: critical/high/medium/low
2. Action: Specific action to take (be concrete)
3. Rationale: Why this action addresses the root cause
4. Expected Impact: What will improve and by how much
5. Implementation Steps: Detailed steps to implement
6. Estimated Effort: Time/resources required
7. Risk Level: low/medium/high
8. Cost Impact: (for cost anomalies) Savings estimate and performance impact

RESPOND IN JSON FORMAT:
{{
  "recommendations": [
    {{
      "priority": "high",
      "action": "Specific action to take",
      "rationale": "Why this addresses the root cause",
      "expected_impact": "What will improve (be specific with metrics)",
      "implementation_steps": [
        "Step 1: Detailed instruction",
        "Step 2: Detailed instruction",
        "Step 3: Detailed instruction"
      ],
      "estimated_effort": "15 minutes",
      "risk_level": "low",
      "cost_impact": "Save $X/month with no performance impact because..."
    }}
  ]
}}

IMPORTANT:
- Be specific and actionable
- Prioritize by impact and urgency
- Consider implementation complexity
- For cost recommendations, ALWAYS explain why performance won't be affected
- Provide concrete metrics where possible
"#,
        anomaly_type = anomaly.anomaly_type,
        severity = anomaly.severity,
        metric = anomaly.metric_name,
        percentage = anomaly.deviation_percentage,
        primary_cause = root_cause.primary_cause,
        factors = root_cause.contributing_factors.join(", "),
        confidence = root_cause.confidence * 100.0,
    )
}

/// Prompt asking the capability to pick a baseline calculation method.
pub fn method_selection_prompt(metric_name: &str, characteristics: &DataCharacteristics) -> String {
    format!(
        r#"You are an expert in time series analysis and anomaly detection. Analyze the following metric data and recommend the best baseline calculation method.

METRIC: {metric_name}

DATA CHARACTERISTICS:
- Sample Count: {samples}
- Mean: {mean:.2}
- Standard Deviation: {std_dev:.2}
- Coefficient of Variation: {cv:.2}
- Trend: {trend} (slope: {slope:.4})
- Volatility: {volatility}
- Distribution: {distribution} (skewness: {skewness:.2})
- Range: [{min:.2}, {max:.2}]

AVAILABLE BASELINE METHODS:

1. simple_stats: Basic statistical baseline (mean, std dev, percentiles)
   - Best for: Stable data with normal distribution
   - Pros: Fast, simple, reliable
   - Cons: Doesn't handle trends or seasonality
   - Lookback: 30-90 days

2. rolling_average: Time-based rolling window average
   - Best for: Data with gradual trends
   - Pros: Adapts to slow changes
   - Cons: Lags behind rapid changes
   - Lookback: 7-30 days

3. seasonal_decomposition: Separates trend, seasonal, and residual components
   - Best for: Data with clear seasonal patterns (daily, weekly, monthly)
   - Pros: Handles complex patterns
   - Cons: Requires more data, computationally expensive
   - Lookback: 60-180 days (multiple seasons)

TASK:
Analyze the data characteristics and recommend the BEST baseline calculation method for this metric.

RESPOND IN JSON FORMAT:
{{
  "recommended_method": "simple_stats|rolling_average|seasonal_decomposition",
  "confidence": 0.85,
  "reasoning": "Detailed explanation of why this method is best for this data...",
  "parameters": {{
    "lookback_days": 30
  }}
}}

IMPORTANT:
- Be specific and data-driven in your reasoning
- Consider the trade-offs between accuracy and computational cost
- Recommend parameters that balance performance and resource usage
"#,
        samples = characteristics.sample_count,
        mean = characteristics.mean,
        std_dev = characteristics.std_dev,
        cv = characteristics.coefficient_of_variation,
        trend = characteristics.trend,
        slope = characteristics.trend_slope,
        volatility = characteristics.volatility,
        distribution = characteristics.distribution,
        skewness = characteristics.skewness,
        min = characteristics.min,
        max = characteristics.max,
    )
}
