// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Baseline method selection
//!
//! Analyzes a metric's sample series and recommends a calculation method,
//! lookback window and confidence. Two paths:
//!
//! 1. A reasoning path (when a [`TextGenerator`] is attached) that asks the
//!    capability to pick a method. Its answer is used if and only if its
//!    self-reported confidence is at or above the configured threshold.
//! 2. A deterministic rule table over the data characteristics. This is the
//!    authoritative fallback for a missing capability, a failed call, a
//!    malformed response or a below-threshold confidence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::baseline::{stats, BaselineMethod};
use crate::capability::{GenerationOptions, TextGenerator};
use crate::error::{Error, Result};
use crate::json::extract_json_object;
use crate::prompts;

/// Direction of the series over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// No meaningful slope
    Stable,
    /// Upward slope
    Increasing,
    /// Downward slope
    Decreasing,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Stable => "stable",
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
        };
        f.write_str(s)
    }
}

/// Volatility bucket from the coefficient of variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    /// CV below 0.1
    Low,
    /// CV below 0.3
    Medium,
    /// CV at or above 0.3
    High,
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Volatility::Low => "low",
            Volatility::Medium => "medium",
            Volatility::High => "high",
        };
        f.write_str(s)
    }
}

/// Skewness bucket of the sample distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionShape {
    /// |skewness| below 0.5
    Normal,
    /// Positive skew
    RightSkewed,
    /// Negative skew
    LeftSkewed,
}

impl fmt::Display for DistributionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DistributionShape::Normal => "normal",
            DistributionShape::RightSkewed => "right_skewed",
            DistributionShape::LeftSkewed => "left_skewed",
        };
        f.write_str(s)
    }
}

/// Statistical characteristics of a sample series, the input to method
/// selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataCharacteristics {
    /// Number of samples
    pub sample_count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    /// std_dev / mean, 0 when the mean is 0
    pub coefficient_of_variation: f64,
    /// Direction of the series
    pub trend: Trend,
    /// Least-squares slope per sample index
    pub trend_slope: f64,
    /// Volatility bucket
    pub volatility: Volatility,
    /// Skewness bucket
    pub distribution: DistributionShape,
    /// Adjusted sample skewness
    pub skewness: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
}

impl DataCharacteristics {
    /// Derive characteristics from a sample series.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self {
                sample_count: 0,
                mean: 0.0,
                std_dev: 0.0,
                coefficient_of_variation: 0.0,
                trend: Trend::Stable,
                trend_slope: 0.0,
                volatility: Volatility::Low,
                distribution: DistributionShape::Normal,
                skewness: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }

        let mean = stats::mean(samples);
        let std_dev = stats::sample_std_dev(samples, mean);
        let cv = if mean != 0.0 { std_dev / mean } else { 0.0 };

        let trend_slope = least_squares_slope(samples);
        let trend = if trend_slope.abs() < 0.01 * mean.abs() {
            Trend::Stable
        } else if trend_slope > 0.0 {
            Trend::Increasing
        } else {
            Trend::Decreasing
        };

        let volatility = if cv < 0.1 {
            Volatility::Low
        } else if cv < 0.3 {
            Volatility::Medium
        } else {
            Volatility::High
        };

        let skewness = stats::sample_skewness(samples, mean, std_dev);
        let distribution = if skewness.abs() < 0.5 {
            DistributionShape::Normal
        } else if skewness > 0.0 {
            DistributionShape::RightSkewed
        } else {
            DistributionShape::LeftSkewed
        };

        let (min, max) = stats::min_max(samples);

        Self {
            sample_count: samples.len(),
            mean,
            std_dev,
            coefficient_of_variation: cv,
            trend,
            trend_slope,
            volatility,
            distribution,
            skewness,
            min,
            max,
        }
    }
}

/// Least-squares slope of `samples` against their index.
fn least_squares_slope(samples: &[f64]) -> f64 {
    let n = samples.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = stats::mean(samples);
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in samples.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }
    numerator / denominator
}

/// A method recommendation with its supporting context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodRecommendation {
    /// Recommended calculation method
    pub method: BaselineMethod,
    /// Recommended lookback window
    pub lookback_days: u32,
    /// Confidence in the recommendation, in [0, 1]
    pub confidence: f64,
    /// Why this method fits the data
    pub reasoning: String,
    /// The characteristics the recommendation was derived from
    pub characteristics: DataCharacteristics,
}

/// Recommends a baseline method for a metric's data.
pub struct MethodOptimizer {
    generator: Option<Arc<dyn TextGenerator>>,
    options: GenerationOptions,
    confidence_threshold: f64,
}

impl MethodOptimizer {
    /// Create an optimizer with only the deterministic rule path.
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            generator: None,
            options: GenerationOptions::default(),
            confidence_threshold,
        }
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

    /// Recommend a method for `samples`.
    ///
    /// The reasoning path's answer is used only when its confidence reaches
    /// the threshold; every other outcome yields the rule-based
    /// recommendation.
    pub async fn recommend(&self, metric_name: &str, samples: &[f64]) -> MethodRecommendation {
        let characteristics = DataCharacteristics::from_samples(samples);
        debug!(
            metric = metric_name,
            samples = characteristics.sample_count,
            trend = %characteristics.trend,
            volatility = %characteristics.volatility,
            distribution = %characteristics.distribution,
            "analyzing metric for method selection"
        );

        if let Some(generator) = &self.generator {
            match self
                .reasoning_recommendation(generator.as_ref(), metric_name, &characteristics)
                .await
            {
                Ok(recommendation) => {
                    if recommendation.confidence >= self.confidence_threshold {
                        info!(
                            metric = metric_name,
                            method = %recommendation.method,
                            confidence = recommendation.confidence,
                            "using reasoning-path method recommendation"
                        );
                        return recommendation;
                    }
                    warn!(
                        metric = metric_name,
                        confidence = recommendation.confidence,
                        threshold = self.confidence_threshold,
                        "reasoning confidence below threshold, using rule-based recommendation"
                    );
                }
                Err(e) => {
                    warn!(
                        metric = metric_name,
                        error = %e,
                        "reasoning recommendation failed, using rule-based recommendation"
                    );
                }
            }
        }

        Self::rule_based(characteristics)
    }

    /// Deterministic recommendation from the fixed rule table.
    pub fn rule_based(characteristics: DataCharacteristics) -> MethodRecommendation {
        let (method, lookback_days, confidence, reasoning) =
            if characteristics.volatility == Volatility::High {
                (
                    BaselineMethod::RollingAverage,
                    14,
                    0.80,
                    "High volatility detected. Rolling average will adapt better to rapid changes."
                        .to_string(),
                )
            } else if characteristics.trend != Trend::Stable {
                (
                    BaselineMethod::RollingAverage,
                    21,
                    0.85,
                    format!(
                        "Data shows {} trend. Rolling average will track the trend better than a static baseline.",
                        characteristics.trend
                    ),
                )
            } else if characteristics.sample_count > 10_000 {
                (
                    BaselineMethod::SeasonalDecomposition,
                    90,
                    0.70,
                    "Large dataset available. Seasonal decomposition can capture complex patterns."
                        .to_string(),
                )
            } else {
                (
                    BaselineMethod::SimpleStats,
                    30,
                    0.75,
                    "Data shows stable characteristics suitable for a simple statistical baseline."
                        .to_string(),
                )
            };

        MethodRecommendation {
            method,
            lookback_days,
            confidence,
            reasoning,
            characteristics,
        }
    }

    async fn reasoning_recommendation(
        &self,
        generator: &dyn TextGenerator,
        metric_name: &str,
        characteristics: &DataCharacteristics,
    ) -> Result<MethodRecommendation> {
        let prompt = prompts::method_selection_prompt(metric_name, characteristics);
        let response = generator.generate(&prompt, &self.options).await?;
        let value = extract_json_object(&response)?;

        let method_name = value
            .get("recommended_method")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::MalformedCapabilityResponse {
                reason: "missing 'recommended_method'".to_string(),
            })?;
        let confidence = value
            .get("confidence")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| Error::MalformedCapabilityResponse {
                reason: "missing 'confidence'".to_string(),
            })?
            .clamp(0.0, 1.0);
        let lookback_days = value
            .get("parameters")
            .and_then(|p| p.get("lookback_days"))
            .and_then(|v| v.as_u64())
            .ok_or_else(|| Error::MalformedCapabilityResponse {
                reason: "missing 'parameters.lookback_days'".to_string(),
            })? as u32;
        let reasoning = value
            .get("reasoning")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(MethodRecommendation {
            method: BaselineMethod::parse_lossy(method_name),
            lookback_days,
            confidence,
            reasoning,
            characteristics: characteristics.clone(),
        })
    }
}
