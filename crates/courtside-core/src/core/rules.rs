// crates/courtside-core/src/core/rules.rs
// ============================================================================
// Module: Courtside Rule Set
// Description: Range-validated simulation and governance parameters.
// Purpose: Provide immutable, auditable rule bundles with atomic mutation.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A rule set bundles every numeric and boolean parameter bounding the
//! simulation and governance. Construction validates all ranges and fails
//! closed naming the offending field; mutation produces a new validated
//! instance so a failed change can never leave a half-applied bundle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Rule Values
// ============================================================================

/// Dynamically typed rule value used by mutation and audit surfaces.
///
/// # Invariants
/// - Untagged wire form: booleans, then integers, then floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    /// Boolean parameter value.
    Bool(bool),
    /// Integer parameter value.
    Int(i64),
    /// Floating-point parameter value.
    Float(f64),
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => value.fmt(f),
            Self::Int(value) => value.fmt(f),
            Self::Float(value) => value.fmt(f),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rule validation failure naming the offending field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidRuleError {
    /// Parameter name is not part of the rule set.
    #[error("unknown rule parameter: {0}")]
    UnknownParameter(String),
    /// Value type does not match the parameter.
    #[error("rule parameter {parameter} expects {expected}")]
    WrongType {
        /// Offending parameter name.
        parameter: String,
        /// Expected type label.
        expected: &'static str,
    },
    /// Value fell outside the allowed range.
    #[error("rule parameter {parameter} out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        /// Offending parameter name.
        parameter: String,
        /// Rejected value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
}

// ============================================================================
// SECTION: Rule Set
// ============================================================================

/// Validated bundle of simulation and governance parameters.
///
/// # Invariants
/// - Every field lies inside its declared range after construction or
///   [`RuleSet::apply`]; instances are treated as immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Number of quarters in a regulation game.
    pub quarters: i64,
    /// Quarter length in minutes, consumed by the possession clock.
    pub quarter_minutes: i64,
    /// Maximum possessions per team pairing per quarter.
    pub quarter_possessions: i64,
    /// Shot clock in seconds, bounding per-possession time draw.
    pub shot_clock_seconds: i64,
    /// Average wall seconds consumed by one possession.
    pub pace_seconds_per_possession: i64,
    /// Point value of a made three-pointer.
    pub three_point_value: i64,
    /// Point value of a made two-pointer.
    pub two_point_value: i64,
    /// Point value of a made free throw.
    pub free_throw_value: i64,
    /// Whether the Elam ending replaces the final period clock.
    pub elam_enabled: bool,
    /// Quarter after which the Elam target activates.
    pub elam_trigger_quarter: i64,
    /// Margin added to the leader's score to form the Elam target.
    pub elam_margin: i64,
    /// Hard bound on total possessions, guarding runaway effects.
    pub safety_cap_possessions: i64,
    /// Personal fouls before ejection.
    pub personal_foul_limit: i64,
    /// Base per-possession foul probability.
    pub foul_base_rate: f64,
    /// Probability a free throw scores.
    pub free_throw_probability: f64,
    /// Base per-possession turnover probability.
    pub turnover_base_rate: f64,
    /// Base offensive rebound probability.
    pub offensive_rebound_base: f64,
    /// Base stamina drained per possession on court.
    pub stamina_drain_base: f64,
    /// Hard stamina floor enforced on every drain.
    pub stamina_floor: f64,
    /// Stamina recovered per possession on the bench.
    pub bench_recovery_per_possession: f64,
    /// Stamina recovered at quarter breaks.
    pub quarter_break_recovery: f64,
    /// Stamina recovered at halftime.
    pub halftime_stamina_recovery: f64,
    /// On-court stamina below which quarter-break substitution triggers.
    pub substitution_stamina_threshold: f64,
    /// Points credited per bonus pass when an effect grants them.
    pub value_per_pass: f64,
    /// Governance window length in seconds.
    pub governance_window_seconds: i64,
    /// Rounds between governance tallies.
    pub governance_interval_rounds: i64,
    /// PROPOSE tokens regenerated per governance window.
    pub tokens_propose_per_window: i64,
    /// AMEND tokens regenerated per governance window.
    pub tokens_amend_per_window: i64,
    /// BOOST tokens regenerated per governance window.
    pub tokens_boost_per_window: i64,
    /// Maximum amendments accepted per proposal.
    pub amendment_cap: i64,
    /// Background interpretation retries before expiry with refund.
    pub interpretation_max_retries: i64,
    /// Scheduled rounds in a regular season.
    pub rounds_per_season: i64,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            quarters: 4,
            quarter_minutes: 10,
            quarter_possessions: 20,
            shot_clock_seconds: 24,
            pace_seconds_per_possession: 16,
            three_point_value: 3,
            two_point_value: 2,
            free_throw_value: 1,
            elam_enabled: true,
            elam_trigger_quarter: 3,
            elam_margin: 11,
            safety_cap_possessions: 220,
            personal_foul_limit: 5,
            foul_base_rate: 0.08,
            free_throw_probability: 0.7,
            turnover_base_rate: 0.10,
            offensive_rebound_base: 0.27,
            stamina_drain_base: 0.03,
            stamina_floor: 0.15,
            bench_recovery_per_possession: 0.02,
            quarter_break_recovery: 0.08,
            halftime_stamina_recovery: 0.25,
            substitution_stamina_threshold: 0.35,
            value_per_pass: 0.0,
            governance_window_seconds: 900,
            governance_interval_rounds: 1,
            tokens_propose_per_window: 1,
            tokens_amend_per_window: 1,
            tokens_boost_per_window: 1,
            amendment_cap: 3,
            interpretation_max_retries: 3,
            rounds_per_season: 20,
        }
    }
}

/// Declared bounds for one rule parameter.
struct RuleBounds {
    /// Parameter name on the wire.
    name: &'static str,
    /// Inclusive lower bound (booleans use 0).
    min: f64,
    /// Inclusive upper bound (booleans use 1).
    max: f64,
    /// Whether the parameter is an integer (or boolean).
    integral: bool,
}

/// Bounds table for every parameter, in stable wire order.
const RULE_BOUNDS: &[RuleBounds] = &[
    RuleBounds { name: "quarters", min: 1.0, max: 8.0, integral: true },
    RuleBounds { name: "quarter_minutes", min: 4.0, max: 20.0, integral: true },
    RuleBounds { name: "quarter_possessions", min: 4.0, max: 48.0, integral: true },
    RuleBounds { name: "shot_clock_seconds", min: 8.0, max: 48.0, integral: true },
    RuleBounds { name: "pace_seconds_per_possession", min: 6.0, max: 48.0, integral: true },
    RuleBounds { name: "three_point_value", min: 1.0, max: 10.0, integral: true },
    RuleBounds { name: "two_point_value", min: 1.0, max: 10.0, integral: true },
    RuleBounds { name: "free_throw_value", min: 1.0, max: 5.0, integral: true },
    RuleBounds { name: "elam_enabled", min: 0.0, max: 1.0, integral: true },
    RuleBounds { name: "elam_trigger_quarter", min: 1.0, max: 8.0, integral: true },
    RuleBounds { name: "elam_margin", min: 1.0, max: 30.0, integral: true },
    RuleBounds { name: "safety_cap_possessions", min: 40.0, max: 600.0, integral: true },
    RuleBounds { name: "personal_foul_limit", min: 2.0, max: 10.0, integral: true },
    RuleBounds { name: "foul_base_rate", min: 0.0, max: 0.5, integral: false },
    RuleBounds { name: "free_throw_probability", min: 0.1, max: 1.0, integral: false },
    RuleBounds { name: "turnover_base_rate", min: 0.0, max: 0.5, integral: false },
    RuleBounds { name: "offensive_rebound_base", min: 0.0, max: 1.0, integral: false },
    RuleBounds { name: "stamina_drain_base", min: 0.0, max: 0.2, integral: false },
    RuleBounds { name: "stamina_floor", min: 0.05, max: 0.5, integral: false },
    RuleBounds { name: "bench_recovery_per_possession", min: 0.0, max: 0.2, integral: false },
    RuleBounds { name: "quarter_break_recovery", min: 0.0, max: 0.5, integral: false },
    RuleBounds { name: "halftime_stamina_recovery", min: 0.0, max: 1.0, integral: false },
    RuleBounds { name: "substitution_stamina_threshold", min: 0.0, max: 1.0, integral: false },
    RuleBounds { name: "value_per_pass", min: 0.0, max: 5.0, integral: false },
    RuleBounds { name: "governance_window_seconds", min: 60.0, max: 86_400.0, integral: true },
    RuleBounds { name: "governance_interval_rounds", min: 1.0, max: 20.0, integral: true },
    RuleBounds { name: "tokens_propose_per_window", min: 0.0, max: 10.0, integral: true },
    RuleBounds { name: "tokens_amend_per_window", min: 0.0, max: 10.0, integral: true },
    RuleBounds { name: "tokens_boost_per_window", min: 0.0, max: 10.0, integral: true },
    RuleBounds { name: "amendment_cap", min: 1.0, max: 10.0, integral: true },
    RuleBounds { name: "interpretation_max_retries", min: 0.0, max: 10.0, integral: true },
    RuleBounds { name: "rounds_per_season", min: 1.0, max: 500.0, integral: true },
];

/// One changed parameter, for audit trails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleChange {
    /// Parameter name.
    pub parameter: String,
    /// Value before the change.
    pub old_value: RuleValue,
    /// Value after the change.
    pub new_value: RuleValue,
}

impl RuleSet {
    /// Lists every parameter name in stable wire order.
    #[must_use]
    pub fn parameter_names() -> Vec<&'static str> {
        RULE_BOUNDS.iter().map(|bounds| bounds.name).collect()
    }

    /// Constructs a rule set from a map of overrides on top of defaults.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRuleError`] naming the first offending field; no
    /// partial construction escapes.
    pub fn from_map(overrides: &BTreeMap<String, RuleValue>) -> Result<Self, InvalidRuleError> {
        let mut rules = Self::default();
        for (parameter, value) in overrides {
            rules = rules.apply(parameter, *value)?;
        }
        Ok(rules)
    }

    /// Validates every field against its declared bounds.
    ///
    /// Used at load boundaries: stored snapshots are untrusted.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRuleError::OutOfRange`] naming the offending field.
    pub fn validate(&self) -> Result<(), InvalidRuleError> {
        for bounds in RULE_BOUNDS {
            let value = self.numeric(bounds.name);
            if value < bounds.min || value > bounds.max {
                return Err(InvalidRuleError::OutOfRange {
                    parameter: bounds.name.to_string(),
                    value,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }
        Ok(())
    }

    /// Reads a parameter by name.
    #[must_use]
    pub fn get(&self, parameter: &str) -> Option<RuleValue> {
        match parameter {
            "elam_enabled" => Some(RuleValue::Bool(self.elam_enabled)),
            "foul_base_rate" => Some(RuleValue::Float(self.foul_base_rate)),
            "free_throw_probability" => Some(RuleValue::Float(self.free_throw_probability)),
            "turnover_base_rate" => Some(RuleValue::Float(self.turnover_base_rate)),
            "offensive_rebound_base" => Some(RuleValue::Float(self.offensive_rebound_base)),
            "stamina_drain_base" => Some(RuleValue::Float(self.stamina_drain_base)),
            "stamina_floor" => Some(RuleValue::Float(self.stamina_floor)),
            "bench_recovery_per_possession" => {
                Some(RuleValue::Float(self.bench_recovery_per_possession))
            }
            "quarter_break_recovery" => Some(RuleValue::Float(self.quarter_break_recovery)),
            "halftime_stamina_recovery" => Some(RuleValue::Float(self.halftime_stamina_recovery)),
            "substitution_stamina_threshold" => {
                Some(RuleValue::Float(self.substitution_stamina_threshold))
            }
            "value_per_pass" => Some(RuleValue::Float(self.value_per_pass)),
            "quarters" => Some(RuleValue::Int(self.quarters)),
            "quarter_minutes" => Some(RuleValue::Int(self.quarter_minutes)),
            "quarter_possessions" => Some(RuleValue::Int(self.quarter_possessions)),
            "shot_clock_seconds" => Some(RuleValue::Int(self.shot_clock_seconds)),
            "pace_seconds_per_possession" => Some(RuleValue::Int(self.pace_seconds_per_possession)),
            "three_point_value" => Some(RuleValue::Int(self.three_point_value)),
            "two_point_value" => Some(RuleValue::Int(self.two_point_value)),
            "free_throw_value" => Some(RuleValue::Int(self.free_throw_value)),
            "elam_trigger_quarter" => Some(RuleValue::Int(self.elam_trigger_quarter)),
            "elam_margin" => Some(RuleValue::Int(self.elam_margin)),
            "safety_cap_possessions" => Some(RuleValue::Int(self.safety_cap_possessions)),
            "personal_foul_limit" => Some(RuleValue::Int(self.personal_foul_limit)),
            "governance_window_seconds" => Some(RuleValue::Int(self.governance_window_seconds)),
            "governance_interval_rounds" => Some(RuleValue::Int(self.governance_interval_rounds)),
            "tokens_propose_per_window" => Some(RuleValue::Int(self.tokens_propose_per_window)),
            "tokens_amend_per_window" => Some(RuleValue::Int(self.tokens_amend_per_window)),
            "tokens_boost_per_window" => Some(RuleValue::Int(self.tokens_boost_per_window)),
            "amendment_cap" => Some(RuleValue::Int(self.amendment_cap)),
            "interpretation_max_retries" => Some(RuleValue::Int(self.interpretation_max_retries)),
            "rounds_per_season" => Some(RuleValue::Int(self.rounds_per_season)),
            _ => None,
        }
    }

    /// Produces a new rule set with one parameter changed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRuleError`] when the parameter is unknown, the value
    /// has the wrong type, or the value is out of range. The receiver is
    /// untouched on failure.
    pub fn apply(&self, parameter: &str, value: RuleValue) -> Result<Self, InvalidRuleError> {
        let bounds = RULE_BOUNDS
            .iter()
            .find(|bounds| bounds.name == parameter)
            .ok_or_else(|| InvalidRuleError::UnknownParameter(parameter.to_string()))?;
        let numeric = match (value, bounds.integral) {
            (RuleValue::Bool(flag), true) if parameter == "elam_enabled" => f64::from(flag),
            (RuleValue::Int(int), true) => int as f64,
            (RuleValue::Float(float), false) => float,
            (RuleValue::Int(int), false) => int as f64,
            _ => {
                return Err(InvalidRuleError::WrongType {
                    parameter: parameter.to_string(),
                    expected: if bounds.integral { "integer" } else { "number" },
                });
            }
        };
        if numeric < bounds.min || numeric > bounds.max {
            return Err(InvalidRuleError::OutOfRange {
                parameter: parameter.to_string(),
                value: numeric,
                min: bounds.min,
                max: bounds.max,
            });
        }
        let mut next = self.clone();
        next.set_numeric(parameter, numeric);
        Ok(next)
    }

    /// Enumerates parameters that differ from `other`, for audit.
    #[must_use]
    pub fn diff(&self, other: &Self) -> Vec<RuleChange> {
        let mut changes = Vec::new();
        for bounds in RULE_BOUNDS {
            let (old_value, new_value) = match (self.get(bounds.name), other.get(bounds.name)) {
                (Some(old_value), Some(new_value)) => (old_value, new_value),
                _ => continue,
            };
            if old_value != new_value {
                changes.push(RuleChange {
                    parameter: bounds.name.to_string(),
                    old_value,
                    new_value,
                });
            }
        }
        changes
    }

    /// Reads a parameter as f64 for bounds checking.
    fn numeric(&self, parameter: &str) -> f64 {
        match self.get(parameter) {
            Some(RuleValue::Bool(flag)) => f64::from(flag),
            Some(RuleValue::Int(int)) => int as f64,
            Some(RuleValue::Float(float)) => float,
            None => f64::NAN,
        }
    }

    /// Writes a validated numeric into the named field.
    fn set_numeric(&mut self, parameter: &str, numeric: f64) {
        let int = numeric as i64;
        match parameter {
            "quarters" => self.quarters = int,
            "quarter_minutes" => self.quarter_minutes = int,
            "quarter_possessions" => self.quarter_possessions = int,
            "shot_clock_seconds" => self.shot_clock_seconds = int,
            "pace_seconds_per_possession" => self.pace_seconds_per_possession = int,
            "three_point_value" => self.three_point_value = int,
            "two_point_value" => self.two_point_value = int,
            "free_throw_value" => self.free_throw_value = int,
            "elam_enabled" => self.elam_enabled = numeric != 0.0,
            "elam_trigger_quarter" => self.elam_trigger_quarter = int,
            "elam_margin" => self.elam_margin = int,
            "safety_cap_possessions" => self.safety_cap_possessions = int,
            "personal_foul_limit" => self.personal_foul_limit = int,
            "foul_base_rate" => self.foul_base_rate = numeric,
            "free_throw_probability" => self.free_throw_probability = numeric,
            "turnover_base_rate" => self.turnover_base_rate = numeric,
            "offensive_rebound_base" => self.offensive_rebound_base = numeric,
            "stamina_drain_base" => self.stamina_drain_base = numeric,
            "stamina_floor" => self.stamina_floor = numeric,
            "bench_recovery_per_possession" => self.bench_recovery_per_possession = numeric,
            "quarter_break_recovery" => self.quarter_break_recovery = numeric,
            "halftime_stamina_recovery" => self.halftime_stamina_recovery = numeric,
            "substitution_stamina_threshold" => self.substitution_stamina_threshold = numeric,
            "value_per_pass" => self.value_per_pass = numeric,
            "governance_window_seconds" => self.governance_window_seconds = int,
            "governance_interval_rounds" => self.governance_interval_rounds = int,
            "tokens_propose_per_window" => self.tokens_propose_per_window = int,
            "tokens_amend_per_window" => self.tokens_amend_per_window = int,
            "tokens_boost_per_window" => self.tokens_boost_per_window = int,
            "amendment_cap" => self.amendment_cap = int,
            "interpretation_max_retries" => self.interpretation_max_retries = int,
            "rounds_per_season" => self.rounds_per_season = int,
            _ => {}
        }
    }
}
