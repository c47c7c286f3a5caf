// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! # Driftline
//!
//! Anomaly analysis pipeline: given a detected anomaly, explain it. Driftline
//! computes statistical baselines, correlates deviations with recent system
//! changes, resolves a root cause, generates prioritized recommendations and
//! renders a plain-language summary.
//!
//! Decisions flow through strategy pairs with fallback ordering: each
//! nontrivial decision (root cause, recommendations, baseline method
//! selection) has a reasoning-capable path backed by a [`TextGenerator`] and
//! a deterministic rule-based path. The reasoning path is preferred; a
//! failed call, a malformed response or a below-threshold confidence falls
//! back to the deterministic path, never to an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use driftline::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(anomaly: Anomaly) {
//! let analyzer = AnomalyAnalyzer::new(AnalyzerConfig::default())
//!     .with_change_reader(Arc::new(my_change_reader))
//!     .with_sink(Arc::new(my_warehouse_sink));
//!
//! let analysis = analyzer.analyze(anomaly).await;
//! println!("{}", analysis.summary.what_happened);
//! # }
//! ```
//!
//! # Components
//!
//! - [`baseline`]: baseline computation and method selection
//! - [`correlation`]: change-event correlation
//! - [`root_cause`]: root-cause resolution, two arms
//! - [`recommend`]: recommendation generation, two arms
//! - [`narrative`]: plain-language summary composition
//! - [`analyzer`]: end-to-end orchestration
//! - [`store`]: collaborator traits (sample reader, change reader, sink)

pub mod analyzer;
pub mod anomaly;
pub mod baseline;
pub mod capability;
pub mod config;
pub mod correlation;
pub mod error;
pub mod json;
pub mod narrative;
pub mod prompts;
pub mod recommend;
pub mod record;
pub mod root_cause;
pub mod store;

pub use analyzer::{AnalysisContext, AnomalyAnalyzer};
pub use anomaly::{
    Anomaly, AnomalyAnalysis, AnomalyType, HumanReadableSummary, Priority, Recommendation,
    RiskLevel, RootCause, Severity,
};
pub use capability::{GenerationOptions, TextGenerator};
pub use config::AnalyzerConfig;
pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::analyzer::{AnalysisContext, AnomalyAnalyzer};
    pub use crate::anomaly::{
        Anomaly, AnomalyAnalysis, AnomalyType, HumanReadableSummary, Priority, Recommendation,
        RiskLevel, RootCause, Severity,
    };
    pub use crate::baseline::{BaselineEngine, BaselineMethod, BaselineStats, MethodOptimizer};
    pub use crate::capability::{GenerationOptions, TextGenerator};
    pub use crate::config::{AnalyzerConfig, BaselineConfig, CorrelationConfig, MetricSpec};
    pub use crate::correlation::{correlate, ChangeCorrelation, ChangeEvent, ResourceDelta};
    pub use crate::error::{Error, Result};
    pub use crate::record::AnalysisRecord;
    pub use crate::store::{AnalysisSink, ChangeEventReader, MetricSampleReader, TimeRange};
}
