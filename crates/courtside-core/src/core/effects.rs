// crates/courtside-core/src/core/effects.rs
// ============================================================================
// Module: Courtside Effect Specifications
// Description: Durable effect records, the mutation DSL, and scoping.
// Purpose: Define the wire forms bridging governance outcomes into the
// engine. Dependencies: crate::core::{identifiers, rules}, serde, sieve-logic
// ============================================================================

//! ## Overview
//! Passed proposals install effects: durable records whose actions intercept
//! hook points during simulation. Actions and scopes are tagged unions (no
//! callables are embedded in records) and any expression text inside action
//! arguments evaluates through the restricted grammar, never arbitrary code.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sieve_logic::Condition;

use crate::core::identifiers::EffectId;
use crate::core::identifiers::PlayerId;
use crate::core::identifiers::ProposalId;
use crate::core::identifiers::TeamId;
use crate::core::rules::RuleValue;

// ============================================================================
// SECTION: Effect Kind and Duration
// ============================================================================

/// Kind of rule mutation a registered effect performs.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Changes a rule set parameter through validated application.
    ParameterChange,
    /// Installs a hook callback firing during simulation.
    HookCallback,
    /// Writes to a team or player meta bucket.
    MetaMutation,
    /// Grants a move to a player.
    MoveGrant,
    /// Narrative-only flavor with no mechanical impact.
    Narrative,
    /// Free-form mechanic requiring admin review.
    CustomMechanic,
}

/// How long a registered effect stays active.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectDuration {
    /// Active until the season ends.
    Permanent,
    /// Active for a fixed number of rounds from activation.
    Rounds {
        /// Round count.
        count: u32,
    },
    /// Active for exactly one game.
    OneGame,
    /// Active until a repealing proposal passes.
    UntilRepealed,
}

// ============================================================================
// SECTION: Target Selectors
// ============================================================================

/// Target selector for scoping and state mutation.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetSelector {
    /// The whole league; the default scope.
    League,
    /// A specific team.
    Team {
        /// Team identifier.
        team_id: TeamId,
    },
    /// A specific player.
    Player {
        /// Player identifier.
        player_id: PlayerId,
    },
    /// The team on offense for the current event.
    OffenseTeam,
    /// The team on defense for the current event.
    DefenseTeam,
    /// The current ball handler.
    BallHandler,
    /// The current primary defender.
    Defender,
}

/// Mutation operator for state writes.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateOp {
    /// Overwrite the field.
    Set,
    /// Add to the field.
    Add,
    /// Subtract from the field.
    Subtract,
}

// ============================================================================
// SECTION: Action Arguments
// ============================================================================

/// Argument value for mutation actions.
///
/// Strings are expression source evaluated against the unified context at
/// fire time; numbers and booleans are literals.
///
/// # Invariants
/// - Untagged wire form: booleans, then numbers, then expression strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Num(f64),
    /// Expression source in the restricted grammar.
    Expr(String),
}

// ============================================================================
// SECTION: Mutation DSL
// ============================================================================

/// One mutation performed by an effect when its condition holds.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Rewrites a field on the current event payload.
    MutateEvent {
        /// Event field to rewrite.
        field: String,
        /// New value or expression.
        value: ArgValue,
    },
    /// Writes to game, player, or team state via a target selector.
    MutateState {
        /// Mutation target.
        target: TargetSelector,
        /// Field path on the target (meta paths use a `meta.` prefix).
        field: String,
        /// Mutation operator.
        op: StateOp,
        /// Operand value or expression.
        value: ArgValue,
    },
    /// Credits points to a team.
    Score {
        /// Team receiving the points.
        target: TargetSelector,
        /// Points value or expression.
        points: ArgValue,
    },
    /// Raises a sub-event of the given name.
    Emit {
        /// Sub-event name.
        event: String,
    },
    /// Raises N sub-events with the count from an expression.
    EmitN {
        /// Sub-event name.
        event: String,
        /// Count value or expression.
        count: ArgValue,
    },
    /// Appends a line to the commentary buffer.
    Narrative {
        /// Narration text.
        text: String,
    },
    /// Suppresses lower-priority rules for this event.
    BlockDefault,
    /// Cancels event propagation entirely.
    BlockEvent,
}

// ============================================================================
// SECTION: Effect Specification
// ============================================================================

/// Structured effect produced by interpretation and stored on registration.
///
/// # Invariants
/// - `parameter`/`value` are set exactly when `kind` is `ParameterChange`.
/// - `hook_points` entries are dotted names; wildcards allowed at any depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    /// Effect kind.
    pub kind: EffectKind,
    /// Short display name.
    pub name: String,
    /// Hook points the effect subscribes to.
    #[serde(default)]
    pub hook_points: Vec<String>,
    /// Optional condition gating the actions.
    #[serde(default)]
    pub condition: Option<Condition>,
    /// Actions applied in order when the condition holds.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Scope selector.
    pub scope: TargetSelector,
    /// Duration policy.
    pub duration: EffectDuration,
    /// Priority; higher fires first, ties break by effect id.
    #[serde(default)]
    pub priority: i64,
    /// Changed parameter name for `ParameterChange` effects.
    #[serde(default)]
    pub parameter: Option<String>,
    /// New parameter value for `ParameterChange` effects.
    #[serde(default)]
    pub value: Option<RuleValue>,
}

/// Durable record of a registered effect.
///
/// # Invariants
/// - Records outlive their source proposal and reference it by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRecord {
    /// Registered effect identifier.
    pub id: EffectId,
    /// Proposal that installed the effect.
    pub source_proposal_id: ProposalId,
    /// Effect specification.
    pub spec: EffectSpec,
    /// Round the effect became active.
    pub activation_round: u32,
    /// Round the effect expires, when bounded.
    pub expiration_round: Option<u32>,
}

impl EffectRecord {
    /// Returns true when the effect is active at the given round.
    #[must_use]
    pub fn active_at(&self, round: u32) -> bool {
        round >= self.activation_round
            && self.expiration_round.is_none_or(|expiry| round < expiry)
    }
}
