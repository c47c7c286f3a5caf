// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Baseline computation
//!
//! Turns a metric's historical sample series into a [`BaselineStats`]
//! distribution summary. Conventions, fixed because downstream detectors
//! compare baseline values numerically:
//!
//! - Standard deviation is the **sample** standard deviation (n − 1 divisor).
//! - Percentiles use **linear interpolation** between closest ranks.
//!
//! [`BaselineMethod`] is a closed enumeration. `rolling_average` and
//! `seasonal_decomposition` are accepted and deterministically delegate to
//! `simple_stats`; the originally requested method is recorded in the result
//! notes so the substitution is never silent.

pub mod optimizer;

mod stats;

#[cfg(test)]
mod proptests;

pub use optimizer::{
    DataCharacteristics, DistributionShape, MethodOptimizer, MethodRecommendation, Trend,
    Volatility,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::config::{BaselineConfig, MetricSpec};
use crate::error::{Error, Result};
use crate::store::MetricSampleReader;

/// Baseline calculation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineMethod {
    /// Mean, standard deviation and percentiles over the full window
    SimpleStats,
    /// Rolling window average (delegates to `simple_stats` for now)
    RollingAverage,
    /// Trend/seasonal/residual decomposition (delegates to `simple_stats`
    /// for now)
    SeasonalDecomposition,
}

impl BaselineMethod {
    /// Parse a method name, falling back to `simple_stats` for anything
    /// unrecognized. The substitution is logged, not an error.
    pub fn parse_lossy(name: &str) -> Self {
        match name {
            "simple_stats" => BaselineMethod::SimpleStats,
            "rolling_average" => BaselineMethod::RollingAverage,
            "seasonal_decomposition" => BaselineMethod::SeasonalDecomposition,
            other => {
                warn!(method = other, "unknown baseline method, using simple_stats");
                BaselineMethod::SimpleStats
            }
        }
    }
}

impl fmt::Display for BaselineMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BaselineMethod::SimpleStats => "simple_stats",
            BaselineMethod::RollingAverage => "rolling_average",
            BaselineMethod::SeasonalDecomposition => "seasonal_decomposition",
        };
        f.write_str(s)
    }
}

/// Statistical summary of a metric's normal historical behavior.
///
/// One per metric per computation; later computations supersede earlier ones
/// by `calculated_at` ordering rather than mutating them. `sample_count` is
/// always greater than zero: a zero-sample computation fails with
/// [`Error::EmptyDataset`] instead of producing a stats row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineStats {
    /// Identity, `baseline-{metric}-{timestamp}`
    pub baseline_id: String,
    /// Metric this baseline describes
    pub metric_name: String,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    /// Smallest sample
    pub min_value: f64,
    /// Largest sample
    pub max_value: f64,
    /// 50th percentile
    pub p50: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
    /// When this baseline was computed
    pub calculated_at: DateTime<Utc>,
    /// Days of history the computation covered
    pub lookback_days: u32,
    /// Number of samples, always > 0
    pub sample_count: usize,
    /// Where the samples came from
    pub data_source: String,
    /// Computation notes, records method substitutions
    pub notes: String,
}

/// Computes baselines from sample series or through a sample reader.
#[derive(Debug, Clone)]
pub struct BaselineEngine {
    config: BaselineConfig,
}

impl BaselineEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: BaselineConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &BaselineConfig {
        &self.config
    }

    /// Compute a baseline over an in-memory sample series.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyDataset`] when `samples` is empty.
    pub fn compute(
        &self,
        metric_name: &str,
        samples: &[f64],
        lookback_days: u32,
        method: BaselineMethod,
    ) -> Result<BaselineStats> {
        self.simple_or_delegated(metric_name, samples, lookback_days, method, "sample_series")
    }

    /// Fetch samples for a configured metric and compute its baseline with
    /// the engine's default method and lookback.
    ///
    /// # Errors
    ///
    /// [`Error::NoDataForMetric`] when the query returns zero rows.
    pub async fn compute_from_source(
        &self,
        reader: &dyn MetricSampleReader,
        spec: &MetricSpec,
    ) -> Result<BaselineStats> {
        let samples = reader
            .fetch_samples(&spec.column, &spec.table, None)
            .await?;
        if samples.is_empty() {
            warn!(metric = %spec.name, table = %spec.table, "query returned no rows");
            return Err(Error::NoDataForMetric {
                metric: spec.name.clone(),
                source_name: spec.table.clone(),
            });
        }

        self.simple_or_delegated(
            &spec.name,
            &samples,
            self.config.lookback_days,
            self.config.method,
            &spec.table,
        )
    }

    /// Compute baselines for every enabled configured metric, continuing
    /// past per-metric failures.
    pub async fn compute_all(&self, reader: &dyn MetricSampleReader) -> Vec<BaselineStats> {
        let mut baselines = Vec::new();
        for spec in &self.config.metrics {
            if !spec.enabled {
                info!(metric = %spec.name, "skipping disabled metric");
                continue;
            }
            match self.compute_from_source(reader, spec).await {
                Ok(stats) => {
                    info!(
                        metric = %spec.name,
                        mean = stats.mean,
                        std_dev = stats.std_dev,
                        samples = stats.sample_count,
                        "baseline computed"
                    );
                    baselines.push(stats);
                }
                Err(e) => {
                    warn!(metric = %spec.name, error = %e, "baseline computation failed");
                }
            }
        }
        baselines
    }

    /// Compute a baseline using the method the optimizer recommends for the
    /// metric's data. Falls back to the configured defaults when the
    /// optimizer path fails.
    ///
    /// # Errors
    ///
    /// [`Error::NoDataForMetric`] when the query returns zero rows.
    pub async fn compute_with_recommendation(
        &self,
        reader: &dyn MetricSampleReader,
        optimizer: &MethodOptimizer,
        spec: &MetricSpec,
    ) -> Result<BaselineStats> {
        let samples = reader
            .fetch_samples(&spec.column, &spec.table, None)
            .await?;
        if samples.is_empty() {
            return Err(Error::NoDataForMetric {
                metric: spec.name.clone(),
                source_name: spec.table.clone(),
            });
        }

        let recommendation = optimizer.recommend(&spec.name, &samples).await;
        info!(
            metric = %spec.name,
            method = %recommendation.method,
            confidence = recommendation.confidence,
            lookback_days = recommendation.lookback_days,
            "using recommended baseline method"
        );

        self.simple_or_delegated(
            &spec.name,
            &samples,
            recommendation.lookback_days,
            recommendation.method,
            &spec.table,
        )
    }

    fn simple_or_delegated(
        &self,
        metric_name: &str,
        samples: &[f64],
        lookback_days: u32,
        method: BaselineMethod,
        data_source: &str,
    ) -> Result<BaselineStats> {
        if method != BaselineMethod::SimpleStats {
            warn!(
                metric = metric_name,
                requested = %method,
                "method not yet implemented, falling back to simple_stats"
            );
        }
        self.simple_stats(metric_name, samples, lookback_days, method, data_source)
    }

    fn simple_stats(
        &self,
        metric_name: &str,
        samples: &[f64],
        lookback_days: u32,
        requested: BaselineMethod,
        data_source: &str,
    ) -> Result<BaselineStats> {
        if samples.is_empty() {
            return Err(Error::EmptyDataset {
                metric: metric_name.to_string(),
            });
        }

        let mean = stats::mean(samples);
        let std_dev = stats::sample_std_dev(samples, mean);
        let (min_value, max_value) = stats::min_max(samples);

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let p50 = stats::percentile_sorted(&sorted, 50.0);
        let p95 = stats::percentile_sorted(&sorted, 95.0);
        let p99 = stats::percentile_sorted(&sorted, 99.0);

        let calculated_at = Utc::now();
        let notes = match requested {
            BaselineMethod::SimpleStats => {
                format!("computed from {} samples using simple_stats", samples.len())
            }
            other => format!("{other} not yet implemented; computed using simple_stats"),
        };

        Ok(BaselineStats {
            baseline_id: format!(
                "baseline-{metric_name}-{}",
                calculated_at.format("%Y%m%d-%H%M%S")
            ),
            metric_name: metric_name.to_string(),
            mean,
            std_dev,
            min_value,
            max_value,
            p50,
            p95,
            p99,
            calculated_at,
            lookback_days,
            sample_count: samples.len(),
            data_source: data_source.to_string(),
            notes,
        })
    }
}
