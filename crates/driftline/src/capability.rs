// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Reasoning capability abstraction
//!
//! The pipeline treats the generative model behind it as a capability: given
//! a prompt, return text, possibly failing or returning malformed output.
//! Implementations live outside this crate (and in `driftline-testing` for
//! tests). A failed call is never retried here; callers fall back to their
//! deterministic arms instead.

use async_trait::async_trait;

use crate::error::Result;

/// Sampling options for a single capability call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2048,
        }
    }
}

impl GenerationOptions {
    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the token budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Text-generation capability invoked with a structured prompt.
///
/// The returned text is expected, but not guaranteed, to contain a JSON
/// payload; parsing is the caller's concern (see [`crate::json`]).
///
/// # Errors
///
/// Implementations should return [`crate::Error::CapabilityUnavailable`] for
/// call-level failures. Callers in this crate treat any error as "capability
/// unavailable for this call" and degrade gracefully.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for the given prompt.
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 2048);
    }

    #[test]
    fn test_generation_options_builder() {
        let opts = GenerationOptions::default()
            .with_temperature(0.7)
            .with_max_tokens(512);
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 512);
    }

    #[test]
    fn test_trait_is_object_safe() {
        fn assert_object_safe(_: &dyn TextGenerator) {}
        let _ = assert_object_safe;
    }
}
