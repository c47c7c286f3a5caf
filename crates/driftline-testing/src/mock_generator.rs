// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Scripted mock for the text-generation capability.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use driftline::capability::{GenerationOptions, TextGenerator};
use driftline::error::{Error, Result};

/// A [`TextGenerator`] that replays scripted responses.
///
/// Responses are consumed in order; once the script runs out, further calls
/// fail with [`Error::CapabilityUnavailable`], which is also what
/// [`MockTextGenerator::failing`] returns from the first call on. Prompts
/// are captured for assertions.
///
/// # Example
///
/// ```rust
/// use driftline_testing::MockTextGenerator;
///
/// let generator = MockTextGenerator::new()
///     .with_response(r#"{"confidence": 0.9}"#)
///     .with_response(r#"{"confidence": 0.5}"#);
/// ```
#[derive(Default)]
pub struct MockTextGenerator {
    responses: Mutex<VecDeque<String>>,
    always_fail: bool,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockTextGenerator {
    /// Create a mock with no scripted responses. Every call fails until a
    /// response is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose every call fails with `CapabilityUnavailable`.
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    /// Queue one response.
    #[must_use]
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.responses.lock().push_back(text.into());
        self
    }

    /// Number of `generate` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        if self.always_fail {
            return Err(Error::CapabilityUnavailable {
                reason: "mock generator configured to fail".to_string(),
            });
        }
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| Error::CapabilityUnavailable {
                reason: "mock generator has no scripted response".to_string(),
            })
    }
}
