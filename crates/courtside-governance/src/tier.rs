// crates/courtside-governance/src/tier.rs
// ============================================================================
// Module: Tier Detection
// Description: Impact tiers, vote thresholds, and admin flagging rules.
// Purpose: Classify proposals by blast radius before they open for votes.
// Dependencies: courtside-core
// ============================================================================

//! ## Overview
//! Tiers grade a proposal's impact from 1 (cosmetic parameter nudges) to 7+
//! (structural chaos). Parameter changes map from the affected parameter;
//! other effect kinds have fixed tiers; compound proposals take the maximum.
//! The tier fixes the strict vote threshold and feeds the admin flag rule.

// ============================================================================
// SECTION: Imports
// ============================================================================

use courtside_core::EffectKind;
use courtside_core::EffectSpec;
use courtside_core::Interpretation;

// ============================================================================
// SECTION: Parameter Tiers
// ============================================================================

/// Maps a rule parameter to its impact tier (1 through 4).
#[must_use]
pub fn parameter_tier(parameter: &str) -> u8 {
    match parameter {
        // Cosmetic pacing and flavor knobs.
        "pace_seconds_per_possession" | "quarter_break_recovery" | "bench_recovery_per_possession" => 1,
        // Scoring and shot economy.
        "three_point_value" | "two_point_value" | "free_throw_value" | "value_per_pass"
        | "free_throw_probability" => 1,
        // Game shape.
        "quarter_minutes" | "quarter_possessions" | "shot_clock_seconds" | "elam_margin"
        | "elam_trigger_quarter" | "elam_enabled" => 2,
        // Player safety and fairness dials.
        "personal_foul_limit" | "foul_base_rate" | "turnover_base_rate"
        | "offensive_rebound_base" | "stamina_drain_base" | "halftime_stamina_recovery"
        | "substitution_stamina_threshold" | "stamina_floor" => 3,
        // Structural and governance self-modification.
        _ => 4,
    }
}

/// Tier for a single interpreted effect.
#[must_use]
pub fn effect_tier(effect: &EffectSpec) -> u8 {
    match effect.kind {
        EffectKind::ParameterChange => {
            effect.parameter.as_deref().map_or(4, parameter_tier)
        }
        EffectKind::HookCallback | EffectKind::MetaMutation | EffectKind::MoveGrant => 3,
        EffectKind::Narrative => 2,
        EffectKind::CustomMechanic => 5,
    }
}

/// Tier for a whole interpretation: maximum across effects, with empty or
/// injection-flagged interpretations escalated to tier 5.
#[must_use]
pub fn interpretation_tier(interpretation: &Interpretation) -> u8 {
    if interpretation.effects.is_empty() || interpretation.injection_flagged {
        return 5;
    }
    interpretation.effects.iter().map(effect_tier).max().unwrap_or(5)
}

// ============================================================================
// SECTION: Thresholds and Flagging
// ============================================================================

/// Strict vote threshold for a tier.
#[must_use]
pub fn threshold_for_tier(tier: u8) -> f64 {
    match tier {
        0..=2 => 0.50,
        3..=4 => 0.60,
        5..=6 => 0.67,
        _ => 0.75,
    }
}

/// Admin review flag rule.
///
/// Flagged proposals still open for votes immediately; the flag only gates
/// whether an admin look is requested before the outcome is trusted.
#[must_use]
pub fn needs_admin_review(interpretation: &Interpretation, tier: u8) -> bool {
    interpretation.injection_flagged
        || interpretation.confidence < 0.5
        || tier >= 5
        || interpretation
            .effects
            .iter()
            .any(|effect| effect.kind == EffectKind::CustomMechanic)
}
