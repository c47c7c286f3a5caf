// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Configuration structs
//!
//! Every component takes its configuration as an explicit argument. There is
//! no process-wide config singleton; construct an [`AnalyzerConfig`] (or the
//! sub-config a component needs) and pass it down.

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineMethod;
use crate::capability::GenerationOptions;

/// One metric the baseline engine is configured to track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Baseline name, e.g. "error_rate"
    pub name: String,
    /// Column in the source table, e.g. "Error_Rate _%_"
    pub column: String,
    /// Source table name
    pub table: String,
    /// Disabled metrics are skipped by bulk computation
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl MetricSpec {
    /// Create an enabled metric spec.
    pub fn new(
        name: impl Into<String>,
        column: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            table: table.into(),
            enabled: true,
        }
    }
}

/// Baseline engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Calculation method used when none is requested explicitly
    pub method: BaselineMethod,
    /// Days of history to consider
    pub lookback_days: u32,
    /// Minimum self-reported confidence for a reasoning-path method
    /// recommendation to override the rule-based one
    pub confidence_threshold: f64,
    /// Metrics to compute baselines for
    pub metrics: Vec<MetricSpec>,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            method: BaselineMethod::SimpleStats,
            lookback_days: 30,
            confidence_threshold: 0.75,
            metrics: default_metrics(),
        }
    }
}

fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new("error_rate", "Error_Rate _%_", "cloud_workload_dataset"),
        MetricSpec::new(
            "cpu_utilization",
            "CPU_Utilization _%_",
            "cloud_workload_dataset",
        ),
        MetricSpec::new(
            "memory_consumption",
            "Memory_Consumption _MB_",
            "cloud_workload_dataset",
        ),
        MetricSpec::new(
            "execution_time",
            "Task_Execution_Time _ms_",
            "cloud_workload_dataset",
        ),
    ]
}

/// Time windows for change-event correlation, in hours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Events older than this (relative to detection time) are not
    /// considered causally; the window is half-open, an event exactly this
    /// many hours old is excluded
    pub lookback_hours: f64,
    /// An event strictly less than this many hours before the anomaly makes
    /// a correlated change the likely cause
    pub causal_hours: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 24.0,
            causal_hours: 6.0,
        }
    }
}

/// Top-level configuration for the analysis pipeline.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Model name reported in `ai_model_used` when the reasoning arm runs
    pub model: String,
    /// Sampling options for capability calls
    pub generation: GenerationOptions,
    /// Baseline engine settings
    pub baseline: BaselineConfig,
    /// Correlation windows
    pub correlation: CorrelationConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-pro".to_string(),
            generation: GenerationOptions::default(),
            baseline: BaselineConfig::default(),
            correlation: CorrelationConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Set the reported model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the capability sampling options.
    #[must_use]
    pub fn with_generation(mut self, generation: GenerationOptions) -> Self {
        self.generation = generation;
        self
    }

    /// Set the baseline configuration.
    #[must_use]
    pub fn with_baseline(mut self, baseline: BaselineConfig) -> Self {
        self.baseline = baseline;
        self
    }

    /// Set the correlation windows.
    #[must_use]
    pub fn with_correlation(mut self, correlation: CorrelationConfig) -> Self {
        self.correlation = correlation;
        self
    }
}
