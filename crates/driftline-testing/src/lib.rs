// Allow unwrap in testing utilities - test code should panic on errors
#![allow(clippy::unwrap_used)]

//! # Driftline Testing Utilities
//!
//! This crate provides test doubles for Driftline pipelines:
//!
//! - **MockTextGenerator**: scripted reasoning capability with a failure mode
//! - **StaticSampleReader** / **StaticChangeEventReader**: in-memory readers
//! - **RecordingSink** / **FailingSink**: persistence doubles
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use driftline_testing::{MockTextGenerator, RecordingSink};
//! use driftline::prelude::*;
//! use std::sync::Arc;
//!
//! let generator = Arc::new(MockTextGenerator::failing());
//! let sink = Arc::new(RecordingSink::new());
//! let analyzer = AnomalyAnalyzer::new(AnalyzerConfig::default())
//!     .with_generator(generator)
//!     .with_sink(sink.clone());
//! ```

mod mock_generator;
mod stores;

pub use mock_generator::MockTextGenerator;
pub use stores::{FailingSink, RecordingSink, StaticChangeEventReader, StaticSampleReader};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        FailingSink, MockTextGenerator, RecordingSink, StaticChangeEventReader, StaticSampleReader,
    };
}
