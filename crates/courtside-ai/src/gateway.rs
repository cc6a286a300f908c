// crates/courtside-ai/src/gateway.rs
// ============================================================================
// Module: AI Gateway
// Description: Retrying wrapper over a text provider with usage capture.
// Purpose: One bounded entry point for every model call in the system.
// Dependencies: crate::{http, mock}, courtside-core, log
// ============================================================================

//! ## Overview
//! The gateway is the single seam between the system and text generation.
//! Transient failures retry with linear backoff up to a small bound;
//! permanent failures surface typed so callers can queue (governance) or
//! degrade to the mock (commentary). Every call's usage record is captured
//! into an in-memory log the orchestrator flushes to storage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::time::Duration;

use courtside_core::Generation;
use courtside_core::GenerationError;
use courtside_core::Purpose;
use courtside_core::TextGenerator;
use courtside_core::UsageRecord;

use crate::mock::MockProvider;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Retry policy for the gateway.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts beyond the first call.
    pub max_retries: u32,
    /// Linear backoff step between attempts.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, backoff_ms: 500 }
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Retrying gateway over a configured provider.
///
/// When no provider is configured the gateway runs entirely on the
/// deterministic mock; `degrade_to_mock` lets commentary callers fall back
/// after a permanent failure without re-plumbing.
pub struct AiGateway {
    /// External provider; absent means mock-only operation.
    provider: Option<Box<dyn TextGenerator + Send + Sync>>,
    /// Deterministic fallback provider.
    mock: MockProvider,
    /// Retry policy for transient failures.
    policy: RetryPolicy,
    /// Usage records captured since the last drain.
    usage: Mutex<Vec<UsageRecord>>,
}

impl AiGateway {
    /// Builds a gateway over an optional external provider.
    #[must_use]
    pub fn new(
        provider: Option<Box<dyn TextGenerator + Send + Sync>>,
        policy: RetryPolicy,
    ) -> Self {
        Self { provider, mock: MockProvider, policy, usage: Mutex::new(Vec::new()) }
    }

    /// Builds a mock-only gateway, the configuration used by tests.
    #[must_use]
    pub fn mock_only() -> Self {
        Self::new(None, RetryPolicy::default())
    }

    /// Returns true when no external provider is configured.
    #[must_use]
    pub fn is_mock_only(&self) -> bool {
        self.provider.is_none()
    }

    /// Generates text, retrying transient failures with backoff.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Transient`] after retry exhaustion or
    /// [`GenerationError::Permanent`] immediately; callers decide whether to
    /// queue or degrade.
    pub fn generate(
        &self,
        purpose: Purpose,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<Generation, GenerationError> {
        let Some(provider) = self.provider.as_deref() else {
            return self.generate_mock(purpose, system_prompt, user_prompt, max_tokens);
        };
        let mut attempt = 0;
        loop {
            match provider.generate(purpose, system_prompt, user_prompt, max_tokens) {
                Ok(generation) => {
                    self.record(generation.usage.clone());
                    return Ok(generation);
                }
                Err(GenerationError::Transient(message)) if attempt < self.policy.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "transient generation failure ({purpose:?}, attempt {attempt}): {message}"
                    );
                    std::thread::sleep(Duration::from_millis(
                        self.policy.backoff_ms * u64::from(attempt),
                    ));
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Generates on the deterministic mock path, recording usage.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Permanent`] only when mock serialization
    /// fails, which indicates a programming bug.
    pub fn generate_mock(
        &self,
        purpose: Purpose,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<Generation, GenerationError> {
        let generation = self.mock.generate(purpose, system_prompt, user_prompt, max_tokens)?;
        self.record(generation.usage.clone());
        Ok(generation)
    }

    /// Generates with automatic degradation to the mock on any failure.
    ///
    /// Used by commentary and report paths where a missing model must never
    /// fail the round.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Permanent`] only when the mock itself
    /// fails.
    pub fn generate_or_mock(
        &self,
        purpose: Purpose,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<Generation, GenerationError> {
        match self.generate(purpose, system_prompt, user_prompt, max_tokens) {
            Ok(generation) => Ok(generation),
            Err(err) => {
                log::warn!("degrading {purpose:?} to mock after failure: {err}");
                self.generate_mock(purpose, system_prompt, user_prompt, max_tokens)
            }
        }
    }

    /// Drains captured usage records for persistence.
    #[must_use]
    pub fn drain_usage(&self) -> Vec<UsageRecord> {
        self.usage.lock().map(|mut usage| std::mem::take(&mut *usage)).unwrap_or_default()
    }

    /// Appends one usage record.
    fn record(&self, record: UsageRecord) {
        if let Ok(mut usage) = self.usage.lock() {
            usage.push(record);
        }
    }
}

impl TextGenerator for AiGateway {
    fn generate(
        &self,
        purpose: Purpose,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<Generation, GenerationError> {
        Self::generate(self, purpose, system_prompt, user_prompt, max_tokens)
    }
}
