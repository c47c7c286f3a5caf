// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Analysis orchestration
//!
//! [`AnomalyAnalyzer`] sequences the pipeline for one anomaly: gather context
//! (metric history and change events), resolve the root cause, generate
//! recommendations, compose the narrative, assemble the result and hand it to
//! the persistence sink. The call is infallible by design: reader failures
//! degrade to an empty context, capability failures fall back to the
//! deterministic arms and persistence failures are logged and swallowed. The
//! wall-clock duration is recorded regardless of outcome.
//!
//! Independent anomalies may be analyzed concurrently; the analyzer holds no
//! mutable state and each call builds its own context.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::anomaly::{Anomaly, AnomalyAnalysis};
use crate::baseline::DataCharacteristics;
use crate::capability::TextGenerator;
use crate::config::{AnalyzerConfig, CorrelationConfig};
use crate::correlation::{correlate, ChangeCorrelation, ChangeEvent};
use crate::narrative;
use crate::recommend::RecommendationGenerator;
use crate::record::AnalysisRecord;
use crate::root_cause::{ResolverArm, RootCauseResolver};
use crate::store::{AnalysisSink, ChangeEventReader, MetricSampleReader, TimeRange};

/// Context gathered for one analysis: metric history and recent changes.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    /// Samples over the context window, oldest first
    pub historical_samples: Vec<f64>,
    /// Summary of the sample window
    pub historical_summary: String,
    /// Trend description over the window
    pub trend_analysis: String,
    /// Change events in the window, as fetched
    pub recent_changes: Vec<ChangeEvent>,
    /// Correlation of the anomaly with those changes
    pub correlation: ChangeCorrelation,
}

impl AnalysisContext {
    /// Context with no history and no change events.
    pub fn empty() -> Self {
        Self::for_events(Utc::now(), Vec::new())
    }

    /// Context for a set of change events, correlated with the default
    /// windows against `detected_at`. History stays empty.
    pub fn for_events(detected_at: chrono::DateTime<Utc>, events: Vec<ChangeEvent>) -> Self {
        let correlation = correlate(detected_at, &events, &CorrelationConfig::default());
        Self {
            historical_samples: Vec::new(),
            historical_summary: "No historical data available".to_string(),
            trend_analysis: "Insufficient data for trend analysis".to_string(),
            recent_changes: events,
            correlation,
        }
    }
}

/// End-to-end analyzer for detected anomalies.
pub struct AnomalyAnalyzer {
    config: AnalyzerConfig,
    root_cause: RootCauseResolver,
    recommendations: RecommendationGenerator,
    samples: Option<Arc<dyn MetricSampleReader>>,
    changes: Option<Arc<dyn ChangeEventReader>>,
    sink: Option<Arc<dyn AnalysisSink>>,
}

impl AnomalyAnalyzer {
    /// Create an analyzer with only the deterministic arms and no
    /// collaborators attached.
    pub fn new(config: AnalyzerConfig) -> Self {
        let root_cause = RootCauseResolver::new().with_options(config.generation);
        let recommendations = RecommendationGenerator::new().with_options(config.generation);
        Self {
            config,
            root_cause,
            recommendations,
            samples: None,
            changes: None,
            sink: None,
        }
    }

    /// Attach the reasoning capability to both resolver arms.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.root_cause = RootCauseResolver::new()
            .with_generator(Arc::clone(&generator))
            .with_options(self.config.generation);
        self.recommendations = RecommendationGenerator::new()
            .with_generator(generator)
            .with_options(self.config.generation);
        self
    }

    /// Attach a metric history reader.
    #[must_use]
    pub fn with_sample_reader(mut self, reader: Arc<dyn MetricSampleReader>) -> Self {
        self.samples = Some(reader);
        self
    }

    /// Attach a change-event reader.
    #[must_use]
    pub fn with_change_reader(mut self, reader: Arc<dyn ChangeEventReader>) -> Self {
        self.changes = Some(reader);
        self
    }

    /// Attach a persistence sink for finished analyses.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn AnalysisSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Analyze one anomaly end to end.
    pub async fn analyze(&self, anomaly: Anomaly) -> AnomalyAnalysis {
        let started = Instant::now();
        info!(
            anomaly_id = %anomaly.anomaly_id,
            anomaly_type = %anomaly.anomaly_type,
            severity = %anomaly.severity,
            "analyzing anomaly"
        );

        let context = self.gather_context(&anomaly).await;
        if context.correlation.likely_cause {
            info!(
                anomaly_id = %anomaly.anomaly_id,
                summary = %context.correlation.impact_summary,
                "migration likely caused anomaly"
            );
        }

        let (root_cause, arm) = self.root_cause.resolve(&anomaly, &context).await;
        let (recommendations, _) = self
            .recommendations
            .generate(&anomaly, &root_cause, &context)
            .await;

        let summary = narrative::compose(&anomaly, &root_cause, &recommendations);
        let predicted_impact = narrative::predict_impact(&anomaly);
        let ai_model_used = match arm {
            ResolverArm::Reasoning => self.config.model.clone(),
            ResolverArm::RuleBased => "rule-based".to_string(),
        };

        let analysis = AnomalyAnalysis {
            anomaly,
            root_cause,
            recommendations,
            summary,
            analyzed_at: Utc::now(),
            analysis_duration: started.elapsed(),
            ai_model_used,
            historical_context: context.historical_summary,
            trend_analysis: context.trend_analysis,
            predicted_impact,
        };

        info!(
            anomaly_id = %analysis.anomaly.anomaly_id,
            duration_ms = analysis.analysis_duration.as_millis() as u64,
            root_cause = %analysis.root_cause.primary_cause,
            recommendations = analysis.recommendations.len(),
            "analysis complete"
        );

        self.persist(&analysis).await;
        analysis
    }

    async fn gather_context(&self, anomaly: &Anomaly) -> AnalysisContext {
        debug!(anomaly_id = %anomaly.anomaly_id, "gathering context");
        let window = TimeRange::hours_before(
            anomaly.detected_at,
            self.config.correlation.lookback_hours as i64,
        );

        let historical_samples = self.fetch_history(anomaly, &window).await;
        let (historical_summary, trend_analysis) = if historical_samples.is_empty() {
            (
                "No historical data available".to_string(),
                "Insufficient data for trend analysis".to_string(),
            )
        } else {
            let characteristics = DataCharacteristics::from_samples(&historical_samples);
            (
                format!(
                    "Historical data shows {} data points (mean {:.2}, std dev {:.2})",
                    characteristics.sample_count, characteristics.mean, characteristics.std_dev
                ),
                format!(
                    "Metric shows a {} trend with {} volatility over the analysis window",
                    characteristics.trend, characteristics.volatility
                ),
            )
        };

        let recent_changes = self.fetch_changes(&window).await;
        let correlation = correlate(
            anomaly.detected_at,
            &recent_changes,
            &self.config.correlation,
        );

        AnalysisContext {
            historical_samples,
            historical_summary,
            trend_analysis,
            recent_changes,
            correlation,
        }
    }

    async fn fetch_history(&self, anomaly: &Anomaly, window: &TimeRange) -> Vec<f64> {
        let Some(reader) = &self.samples else {
            return Vec::new();
        };
        let Some(spec) = self
            .config
            .baseline
            .metrics
            .iter()
            .find(|m| m.name == anomaly.metric_name)
        else {
            debug!(metric = %anomaly.metric_name, "metric not configured, skipping history");
            return Vec::new();
        };
        match reader
            .fetch_samples(&spec.column, &spec.table, Some(window))
            .await
        {
            Ok(samples) => samples,
            Err(e) => {
                warn!(metric = %anomaly.metric_name, error = %e, "failed to fetch metric history");
                Vec::new()
            }
        }
    }

    async fn fetch_changes(&self, window: &TimeRange) -> Vec<ChangeEvent> {
        let Some(reader) = &self.changes else {
            return Vec::new();
        };
        match reader.fetch_change_events(window.start, window.end).await {
            Ok(events) => {
                info!(count = events.len(), "found recent migrations/changes");
                events
            }
            Err(e) => {
                warn!(error = %e, "failed to query change events");
                Vec::new()
            }
        }
    }

    async fn persist(&self, analysis: &AnomalyAnalysis) {
        let Some(sink) = &self.sink else {
            return;
        };
        let record = AnalysisRecord::from_analysis(analysis);
        match sink.save(&record).await {
            Ok(()) => {
                info!(
                    analysis_id = %record.analysis_id,
                    anomaly_id = %record.anomaly_id,
                    "analysis record saved"
                );
            }
            Err(e) => {
                // The analysis is still returned; storage is best effort.
                warn!(error = %e, "failed to persist analysis record");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{AnomalyType, Severity};
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use parking_lot::Mutex;

    struct FailingReader;

    #[async_trait]
    impl MetricSampleReader for FailingReader {
        async fn fetch_samples(
            &self,
            _metric_column: &str,
            _source_table: &str,
            _range: Option<&TimeRange>,
        ) -> Result<Vec<f64>> {
            Err(Error::Generic("reader offline".to_string()))
        }
    }

    #[async_trait]
    impl ChangeEventReader for FailingReader {
        async fn fetch_change_events(
            &self,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<ChangeEvent>> {
            Err(Error::Generic("reader offline".to_string()))
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AnalysisSink for FailingSink {
        async fn save(&self, _record: &AnalysisRecord) -> Result<()> {
            Err(Error::Persistence("insert rejected".to_string()))
        }
    }

    struct CountingSink {
        saved: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AnalysisSink for CountingSink {
        async fn save(&self, record: &AnalysisRecord) -> Result<()> {
            self.saved.lock().push(record.anomaly_id.clone());
            Ok(())
        }
    }

    fn anomaly() -> Anomaly {
        Anomaly {
            anomaly_id: "anom-1".to_string(),
            detected_at: Utc::now(),
            metric_name: "error_rate".to_string(),
            metric_type: "Error_Rate _%_".to_string(),
            current_value: 8.5,
            baseline_value: 2.52,
            deviation_sigma: 4.12,
            deviation_percentage: 237.3,
            anomaly_type: AnomalyType::Stability,
            severity: Severity::High,
            confidence: 0.9,
            affected_resources: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_analyze_without_collaborators() {
        let analyzer = AnomalyAnalyzer::new(AnalyzerConfig::default());
        let analysis = analyzer.analyze(anomaly()).await;
        assert_eq!(analysis.ai_model_used, "rule-based");
        assert_eq!(analysis.historical_context, "No historical data available");
        assert!(analysis.root_cause.primary_cause.contains("error_rate"));
        assert_eq!(analysis.recommendations.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_readers_degrade_to_empty_context() {
        let analyzer = AnomalyAnalyzer::new(AnalyzerConfig::default())
            .with_sample_reader(Arc::new(FailingReader))
            .with_change_reader(Arc::new(FailingReader));
        let analysis = analyzer.analyze(anomaly()).await;
        assert_eq!(analysis.historical_context, "No historical data available");
        assert!(!analysis.root_cause.migration_likely_cause());
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let analyzer =
            AnomalyAnalyzer::new(AnalyzerConfig::default()).with_sink(Arc::new(FailingSink));
        let analysis = analyzer.analyze(anomaly()).await;
        // The analysis is produced even though the write failed.
        assert!(!analysis.summary.what_happened.is_empty());
    }

    #[tokio::test]
    async fn test_sink_receives_record() {
        let sink = Arc::new(CountingSink {
            saved: Mutex::new(Vec::new()),
        });
        let analyzer =
            AnomalyAnalyzer::new(AnalyzerConfig::default()).with_sink(sink.clone());
        analyzer.analyze(anomaly()).await;
        assert_eq!(sink.saved.lock().as_slice(), ["anom-1".to_string()]);
    }

    #[tokio::test]
    async fn test_context_for_events_correlates() {
        let now = Utc::now();
        let event = ChangeEvent {
            event_id: "mig-1".to_string(),
            change_type: "user_migration".to_string(),
            occurred_at: now - Duration::hours(2),
            source_system: String::new(),
            target_system: String::new(),
            user_count_change: Some(100),
            resource_requirements: None,
            description: String::new(),
            status: "completed".to_string(),
        };
        let context = AnalysisContext::for_events(now, vec![event]);
        assert!(context.correlation.likely_cause);
        assert_eq!(context.recent_changes.len(), 1);
    }
}
