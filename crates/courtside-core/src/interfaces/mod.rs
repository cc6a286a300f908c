// crates/courtside-core/src/interfaces/mod.rs
// ============================================================================
// Module: Courtside Interfaces
// Description: Backend-agnostic seams for storage and text generation.
// Purpose: Define the contract surfaces used by governance and the runtime.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the kernel and the runtime integrate with durable
//! storage and with the text generation service without embedding backend
//! detail. Implementations must be deterministic where the contract says so
//! and fail closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::events::GovernanceEvent;
use crate::core::identifiers::SeasonId;

// ============================================================================
// SECTION: Event Store
// ============================================================================

/// Event store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage I/O failed.
    #[error("store io error: {0}")]
    Io(String),
    /// Stored data is corrupt or failed integrity checks.
    #[error("store corruption: {0}")]
    Corrupt(String),
    /// Sequence collision on append; fatal under the writer lock.
    #[error("store conflict: {0}")]
    Conflict(String),
    /// The writer lock timed out; retryable.
    #[error("store busy: {0}")]
    Busy(String),
    /// Stored data is invalid.
    #[error("store invalid data: {0}")]
    Invalid(String),
}

/// Append-only governance event store.
///
/// Reads are replayable and idempotent; writes are single-producer per
/// season under the enclosing session's writer lock.
pub trait EventStore {
    /// Appends an event, assigning the next sequence number atomically with
    /// insertion, and returns the sequenced envelope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] only on a sequence collision; other
    /// failures surface as fatal and roll back the enclosing transaction.
    fn append_event(&mut self, event: GovernanceEvent) -> Result<GovernanceEvent, StoreError>;

    /// Reads a season's events in sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when reading fails.
    fn events_for_season(&self, season_id: &SeasonId) -> Result<Vec<GovernanceEvent>, StoreError>;

    /// Reads a season's events of one type in sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when reading fails.
    fn events_by_type(
        &self,
        season_id: &SeasonId,
        event_type: &str,
    ) -> Result<Vec<GovernanceEvent>, StoreError>;

    /// Reads a season's events for one aggregate in sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when reading fails.
    fn events_for_aggregate(
        &self,
        season_id: &SeasonId,
        aggregate_id: &str,
    ) -> Result<Vec<GovernanceEvent>, StoreError>;
}

// ============================================================================
// SECTION: Text Generation
// ============================================================================

/// Tag describing what a generation is for; drives prompts and mocks.
///
/// # Invariants
/// - Variants are stable for serialization and usage accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Proposal interpretation into structured effects.
    Interpreter,
    /// Per-game commentary.
    Commentary,
    /// Round simulation report.
    ReportSim,
    /// Round governance report.
    ReportGov,
    /// Per-governor private report.
    ReportPrivate,
    /// Prompt-injection classification.
    Classifier,
    /// Evaluation harness diagnostics.
    Evaluator,
}

impl Purpose {
    /// Returns a stable label for usage accounting.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interpreter => "interpreter",
            Self::Commentary => "commentary",
            Self::ReportSim => "report_sim",
            Self::ReportGov => "report_gov",
            Self::ReportPrivate => "report_private",
            Self::Classifier => "classifier",
            Self::Evaluator => "evaluator",
        }
    }
}

/// Usage record written to the usage log after each call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Purpose tag.
    pub purpose: Purpose,
    /// Model identifier, or `mock` on the fallback path.
    pub model_id: String,
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens produced.
    pub output_tokens: u64,
    /// Cached tokens served.
    pub cache_tokens: u64,
    /// Request latency in milliseconds.
    pub latency_ms: u64,
}

/// Text plus its usage accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Generated text.
    pub text: String,
    /// Usage record for the call.
    pub usage: UsageRecord,
}

/// Text generation errors.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transient failure; the gateway retried and exhausted its budget.
    #[error("generation transient failure: {0}")]
    Transient(String),
    /// Permanent failure the caller must handle (queue or degrade).
    #[error("generation permanent failure: {0}")]
    Permanent(String),
}

/// Stateless text generation seam.
///
/// Implementations must provide a deterministic mock path keyed on
/// `(purpose, user_prompt)` so tests run without the external service.
pub trait TextGenerator {
    /// Generates text for a purpose.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] after bounded retries.
    fn generate(
        &self,
        purpose: Purpose,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<Generation, GenerationError>;
}
