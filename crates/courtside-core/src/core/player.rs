// crates/courtside-core/src/core/player.rs
// ============================================================================
// Module: Courtside Player Model
// Description: Player attributes, moves, and archetypes.
// Purpose: Define the immutable player record consumed by the engine.
// Dependencies: crate::core::identifiers, serde, sieve-logic
// ============================================================================

//! ## Overview
//! A player owns an immutable attribute vector, an ordered set of moves
//! (named conditional modifiers), an archetype tag, and a backstory. In-game
//! state (current attributes, stamina, fouls) is ephemeral and lives in the
//! engine; the record here is what persists and what replay rebuilds from.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sieve_logic::Condition;

use crate::core::identifiers::PlayerId;

// ============================================================================
// SECTION: Attributes
// ============================================================================

/// Immutable per-player attribute vector.
///
/// # Invariants
/// - Every attribute lies in `[1, 100]` after [`AttributeVector::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeVector {
    /// Shot-making ability.
    pub scoring: u8,
    /// Passing and playmaking.
    pub passing: u8,
    /// On-ball and help defense.
    pub defense: u8,
    /// Speed and transition play.
    pub speed: u8,
    /// Stamina pool and recovery.
    pub stamina: u8,
    /// Decision quality under pressure.
    pub iq: u8,
    /// Appetite for the ball.
    pub ego: u8,
    /// Susceptibility to chaotic effects.
    pub chaotic_alignment: u8,
    /// Narrative luck.
    pub fate: u8,
}

impl AttributeVector {
    /// Returns true when every attribute lies in `[1, 100]`.
    #[must_use]
    pub fn validate(&self) -> bool {
        [
            self.scoring,
            self.passing,
            self.defense,
            self.speed,
            self.stamina,
            self.iq,
            self.ego,
            self.chaotic_alignment,
            self.fate,
        ]
        .iter()
        .all(|attribute| (1..=100).contains(attribute))
    }

    /// Reads an attribute by field name, for context resolution.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u8> {
        match name {
            "scoring" => Some(self.scoring),
            "passing" => Some(self.passing),
            "defense" => Some(self.defense),
            "speed" => Some(self.speed),
            "stamina" => Some(self.stamina),
            "iq" => Some(self.iq),
            "ego" => Some(self.ego),
            "chaotic_alignment" => Some(self.chaotic_alignment),
            "fate" => Some(self.fate),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Moves
// ============================================================================

/// Effect applied when a move triggers.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveEffect {
    /// Adds to the shot probability on the triggering possession.
    ShotBonus {
        /// Additive probability bonus.
        amount: f64,
    },
    /// Adds to the points credited when the triggering shot scores.
    PointBonus {
        /// Additional points.
        amount: i64,
    },
    /// Restores stamina to the mover.
    StaminaSurge {
        /// Stamina restored, clamped to the legal band.
        amount: f64,
    },
    /// Appends a narration line to the play log.
    Flourish {
        /// Narration text.
        line: String,
    },
}

/// Named conditional modifier owned by a player.
///
/// Move conditions evaluate against the possession context after the
/// action resolves; effects apply in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    /// Display name.
    pub name: String,
    /// Trigger condition over the possession context.
    pub trigger: Condition,
    /// Effect applied when the trigger holds.
    pub effect: MoveEffect,
}

// ============================================================================
// SECTION: Player Record
// ============================================================================

/// Player archetype tag biasing action selection.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Prefers rim pressure and drives.
    Slasher,
    /// Prefers three-point volume.
    Sniper,
    /// Prefers post-ups and interior play.
    Anchor,
    /// Distributes and takes what the defense gives.
    Conductor,
    /// No strong tendency.
    Journeyman,
}

/// Durable player record.
///
/// # Invariants
/// - `base_attributes` never change after season creation; in-game
///   adjustments live on ephemeral engine state only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Player identifier (new each season).
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Immutable attribute vector.
    pub base_attributes: AttributeVector,
    /// Ordered conditional modifiers.
    pub moves: Vec<Move>,
    /// Archetype tag.
    pub archetype: Archetype,
    /// Backstory text used by narrative generation.
    pub backstory: String,
}
