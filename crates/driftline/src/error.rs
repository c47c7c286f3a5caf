// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Error types for Driftline
//!
//! The taxonomy distinguishes data failures (which propagate) from reasoning
//! capability failures (which are caught at the component boundary and
//! converted into a deterministic fallback):
//!
//! - [`Error::EmptyDataset`] / [`Error::NoDataForMetric`]: absent data cannot
//!   be guessed; the baseline engine surfaces these to its caller.
//! - [`Error::CapabilityUnavailable`] / [`Error::MalformedCapabilityResponse`]:
//!   the reasoning capability failed or returned something unparseable; the
//!   root-cause resolver and recommendation generator catch these locally and
//!   fall back to their rule-based arms.
//! - [`Error::Persistence`]: writing the final analysis record failed; the
//!   orchestrator logs and swallows this, the analysis is still returned.

use thiserror::Error;

/// Driftline error types
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// A baseline was requested over an empty sample series
    #[error("no samples available to compute a baseline for metric '{metric}'")]
    EmptyDataset {
        /// Metric the baseline was requested for
        metric: String,
    },

    /// A metric query returned zero rows
    #[error("no data returned for metric '{metric}' from source '{source_name}'")]
    NoDataForMetric {
        /// Metric that was queried
        metric: String,
        /// Source table or stream the query ran against
        source_name: String,
    },

    /// The reasoning capability returned text that does not contain the
    /// expected JSON structure
    #[error("malformed capability response: {reason}")]
    MalformedCapabilityResponse {
        /// Why the response could not be parsed
        reason: String,
    },

    /// The reasoning capability call itself failed
    #[error("reasoning capability unavailable: {reason}")]
    CapabilityUnavailable {
        /// Underlying failure description
        reason: String,
    },

    /// Writing the final analysis record failed
    #[error("failed to persist analysis record: {0}")]
    Persistence(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Generic(String),
}

/// Result type for Driftline operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if this error came from the reasoning capability and
    /// should trigger a fall back to the deterministic arm rather than
    /// propagate.
    pub fn is_capability_failure(&self) -> bool {
        matches!(
            self,
            Error::CapabilityUnavailable { .. } | Error::MalformedCapabilityResponse { .. }
        )
    }

    /// Returns true if this error means the requested data simply does not
    /// exist. These are surfaced to the caller; there is nothing to fall
    /// back to.
    pub fn is_missing_data(&self) -> bool {
        matches!(
            self,
            Error::EmptyDataset { .. } | Error::NoDataForMetric { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dataset_message() {
        let err = Error::EmptyDataset {
            metric: "error_rate".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no samples available to compute a baseline for metric 'error_rate'"
        );
    }

    #[test]
    fn test_no_data_for_metric_message() {
        let err = Error::NoDataForMetric {
            metric: "cpu_utilization".to_string(),
            source_name: "cloud_workload_dataset".to_string(),
        };
        assert!(err.to_string().contains("cpu_utilization"));
        assert!(err.to_string().contains("cloud_workload_dataset"));
    }

    #[test]
    fn test_capability_failures_classified() {
        let unavailable = Error::CapabilityUnavailable {
            reason: "connection refused".to_string(),
        };
        let malformed = Error::MalformedCapabilityResponse {
            reason: "no JSON object found".to_string(),
        };
        assert!(unavailable.is_capability_failure());
        assert!(malformed.is_capability_failure());
        assert!(!unavailable.is_missing_data());
    }

    #[test]
    fn test_missing_data_classified() {
        let empty = Error::EmptyDataset {
            metric: "m".to_string(),
        };
        let no_data = Error::NoDataForMetric {
            metric: "m".to_string(),
            source_name: "s".to_string(),
        };
        assert!(empty.is_missing_data());
        assert!(no_data.is_missing_data());
        assert!(!empty.is_capability_failure());
    }

    #[test]
    fn test_persistence_is_neither() {
        let err = Error::Persistence("insert rejected".to_string());
        assert!(!err.is_capability_failure());
        assert!(!err.is_missing_data());
    }

    #[test]
    fn test_serialization_error_from() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_error_propagation() {
        fn might_fail() -> Result<i32> {
            Err(Error::Generic("boom".to_string()))
        }

        fn calls_might_fail() -> Result<i32> {
            might_fail()?;
            Ok(42)
        }

        assert!(calls_might_fail().is_err());
    }
}
