// crates/courtside-effects/src/registry.rs
// ============================================================================
// Module: Effect Registry
// Description: Activation replay, compilation, and hook firing.
// Purpose: Bridge governance-installed effects into the simulation.
// Dependencies: crate::{context, hooks, meta}, courtside-core, sieve-logic
// ============================================================================

//! ## Overview
//! The registry replays `effect.registered` and `effect.expired` events to
//! find the effects active at a round, compiles their conditions and
//! expression arguments once, and fires them at hook points in a stable
//! order: priority descending, then effect id ascending. Randomness inside
//! conditions draws from the game RNG the engine passes in, never from a
//! global source.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use courtside_core::Action;
use courtside_core::ArgValue;
use courtside_core::EffectDuration;
use courtside_core::EffectId;
use courtside_core::EffectKind;
use courtside_core::EffectRecord;
use courtside_core::EventKind;
use courtside_core::GovernanceEvent;
use courtside_core::Interpretation;
use courtside_core::MetaEntityKind;
use courtside_core::MetaKey;
use courtside_core::ProposalId;
use courtside_core::StateOp;
use courtside_core::TargetSelector;
use sieve_logic::Condition;
use sieve_logic::ContextResolver;
use sieve_logic::Expr;
use sieve_logic::LogicError;
use sieve_logic::RandomSource;
use sieve_logic::Scalar;
use sieve_logic::parse_expr;
use thiserror::Error;

use crate::context::EventContext;
use crate::context::MetaScope;
use crate::hooks::pattern_matches;
use crate::meta::MetaStore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Effect registration and firing errors.
#[derive(Debug, Error)]
pub enum EffectError {
    /// Condition or expression failed validation or evaluation.
    #[error("effect logic error: {0}")]
    Logic(#[from] LogicError),
}

// ============================================================================
// SECTION: Compiled Forms
// ============================================================================

/// Argument compiled at registration time.
#[derive(Debug, Clone)]
enum CompiledArg {
    /// Literal scalar.
    Literal(Scalar),
    /// Parsed expression evaluated at fire time.
    Expr(Expr),
}

impl CompiledArg {
    /// Compiles a wire argument, parsing expression strings once.
    fn compile(value: &ArgValue) -> Result<Self, LogicError> {
        match value {
            ArgValue::Bool(flag) => Ok(Self::Literal(Scalar::Bool(*flag))),
            ArgValue::Num(number) => Ok(Self::Literal(Scalar::Num(*number))),
            ArgValue::Expr(source) => Ok(Self::Expr(parse_expr(source)?)),
        }
    }

    /// Evaluates the argument against the unified context.
    fn eval<C, R>(&self, ctx: &C, rng: &mut R) -> Result<Scalar, LogicError>
    where
        C: ContextResolver,
        R: RandomSource,
    {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Expr(expr) => expr.eval(ctx, rng),
        }
    }
}

/// Action compiled at registration time.
#[derive(Debug, Clone)]
enum CompiledAction {
    /// Rewrites a field on the current event payload.
    MutateEvent {
        /// Event field to rewrite.
        field: String,
        /// Compiled value.
        value: CompiledArg,
    },
    /// Writes to game, player, team, or meta state.
    MutateState {
        /// Mutation target.
        target: TargetSelector,
        /// Field path on the target.
        field: String,
        /// Mutation operator.
        op: StateOp,
        /// Compiled operand.
        value: CompiledArg,
    },
    /// Credits points to a team.
    Score {
        /// Team receiving the points.
        target: TargetSelector,
        /// Compiled points value.
        points: CompiledArg,
    },
    /// Raises sub-events.
    Emit {
        /// Sub-event name.
        event: String,
        /// Compiled count (1 for plain `emit`).
        count: CompiledArg,
    },
    /// Appends to the commentary buffer.
    Narrative {
        /// Narration text.
        text: String,
    },
    /// Suppresses lower-priority effects for this event.
    BlockDefault,
    /// Cancels event propagation.
    BlockEvent,
}

impl CompiledAction {
    /// Compiles a wire action.
    fn compile(action: &Action) -> Result<Self, LogicError> {
        Ok(match action {
            Action::MutateEvent { field, value } => {
                Self::MutateEvent { field: field.clone(), value: CompiledArg::compile(value)? }
            }
            Action::MutateState { target, field, op, value } => Self::MutateState {
                target: target.clone(),
                field: field.clone(),
                op: *op,
                value: CompiledArg::compile(value)?,
            },
            Action::Score { target, points } => {
                Self::Score { target: target.clone(), points: CompiledArg::compile(points)? }
            }
            Action::Emit { event } => Self::Emit {
                event: event.clone(),
                count: CompiledArg::Literal(Scalar::Num(1.0)),
            },
            Action::EmitN { event, count } => {
                Self::Emit { event: event.clone(), count: CompiledArg::compile(count)? }
            }
            Action::Narrative { text } => Self::Narrative { text: text.clone() },
            Action::BlockDefault => Self::BlockDefault,
            Action::BlockEvent => Self::BlockEvent,
        })
    }
}

/// One active effect with compiled condition and actions.
#[derive(Debug, Clone)]
struct ActiveEffect {
    /// Durable record backing the effect.
    record: EffectRecord,
    /// Compiled condition, absent when unconditional.
    condition: Option<Condition>,
    /// Compiled actions in declaration order.
    actions: Vec<CompiledAction>,
}

// ============================================================================
// SECTION: Fire Outcome
// ============================================================================

/// State mutation the engine applies to its own structures.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMutation {
    /// Mutation target.
    pub target: TargetSelector,
    /// Field path on the target.
    pub field: String,
    /// Mutation operator.
    pub op: StateOp,
    /// Resolved operand.
    pub value: Scalar,
}

/// Accumulated result of firing one hook point.
#[derive(Debug, Clone, Default)]
pub struct FireOutcome {
    /// State mutations for the engine to apply, in firing order.
    pub state_mutations: Vec<StateMutation>,
    /// Score credits as (target, points) pairs.
    pub scores: Vec<(TargetSelector, f64)>,
    /// Sub-events raised as (name, count) pairs.
    pub sub_events: Vec<(String, u32)>,
    /// Narration lines for the commentary buffer.
    pub narratives: Vec<String>,
    /// Whether a `block_event` action cancelled propagation.
    pub block_event: bool,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Runtime registry of active, compiled effects.
///
/// # Invariants
/// - Iteration order is priority descending, then effect id ascending.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    /// Active effects in firing order.
    effects: Vec<ActiveEffect>,
}

impl EffectRegistry {
    /// Compiles a set of records into a registry.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::Logic`] when a condition fails validation or
    /// an expression argument fails to parse.
    pub fn from_records(mut records: Vec<EffectRecord>) -> Result<Self, EffectError> {
        records.sort_by(|a, b| {
            b.spec.priority.cmp(&a.spec.priority).then_with(|| a.id.cmp(&b.id))
        });
        let mut effects = Vec::with_capacity(records.len());
        for record in records {
            if let Some(condition) = &record.spec.condition {
                condition.validate()?;
            }
            let actions = record
                .spec
                .actions
                .iter()
                .map(CompiledAction::compile)
                .collect::<Result<Vec<_>, _>>()?;
            effects.push(ActiveEffect {
                condition: record.spec.condition.clone(),
                actions,
                record,
            });
        }
        Ok(Self { effects })
    }

    /// Replays a season's event log and compiles the effects active at
    /// `round`.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::Logic`] from compilation.
    pub fn load_active(
        events: &[GovernanceEvent],
        round: u32,
    ) -> Result<Self, EffectError> {
        let mut records: BTreeMap<EffectId, EffectRecord> = BTreeMap::new();
        for event in events {
            match event.decode() {
                EventKind::EffectRegistered { effect } => {
                    records.insert(effect.id.clone(), effect);
                }
                EventKind::EffectExpired { effect_id, round: expired_round } => {
                    if let Some(record) = records.get_mut(&effect_id) {
                        record.expiration_round = Some(expired_round);
                    }
                }
                _ => {}
            }
        }
        let active =
            records.into_values().filter(|record| record.active_at(round)).collect::<Vec<_>>();
        Self::from_records(active)
    }

    /// Converts a passed proposal's interpretation into registrable records.
    ///
    /// Parameter changes are excluded: they apply through validated rule set
    /// mutation, not through the hook pipeline. Durations resolve to
    /// expiration rounds relative to `activation_round`.
    #[must_use]
    pub fn records_from_interpretation(
        interpretation: &Interpretation,
        source_proposal_id: &ProposalId,
        activation_round: u32,
    ) -> Vec<EffectRecord> {
        interpretation
            .effects
            .iter()
            .filter(|spec| spec.kind != EffectKind::ParameterChange)
            .map(|spec| {
                let expiration_round = match spec.duration {
                    EffectDuration::Permanent | EffectDuration::UntilRepealed => None,
                    EffectDuration::Rounds { count } => Some(activation_round + count),
                    EffectDuration::OneGame => Some(activation_round + 1),
                };
                EffectRecord {
                    id: EffectId::fresh(),
                    source_proposal_id: source_proposal_id.clone(),
                    spec: spec.clone(),
                    activation_round,
                    expiration_round,
                }
            })
            .collect()
    }

    /// Returns the active records, for audit surfaces.
    #[must_use]
    pub fn records(&self) -> Vec<&EffectRecord> {
        self.effects.iter().map(|effect| &effect.record).collect()
    }

    /// Returns true when no effect subscribes to the hook point.
    #[must_use]
    pub fn is_quiet(&self, hook: &str) -> bool {
        !self.effects.iter().any(|effect| {
            effect.record.spec.hook_points.iter().any(|pattern| pattern_matches(pattern, hook))
        })
    }

    /// Fires a hook point, accumulating mutations in effect-priority order.
    ///
    /// `event` is mutated in place by `mutate_event` actions so later
    /// effects observe earlier rewrites; meta mutations apply directly to
    /// the store. Everything else is returned for the engine to apply.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::Logic`] when an expression evaluates to an
    /// unusable type; the engine treats this as fatal for the game.
    pub fn fire<C, R>(
        &self,
        hook: &str,
        event: &mut BTreeMap<String, Scalar>,
        inner: &C,
        meta: &mut MetaStore,
        scope: &MetaScope,
        rng: &mut R,
    ) -> Result<FireOutcome, EffectError>
    where
        C: ContextResolver,
        R: RandomSource,
    {
        let mut outcome = FireOutcome::default();
        let mut suppress_below: Option<i64> = None;
        for effect in &self.effects {
            if !effect
                .record
                .spec
                .hook_points
                .iter()
                .any(|pattern| pattern_matches(pattern, hook))
            {
                continue;
            }
            if suppress_below.is_some_and(|limit| effect.record.spec.priority < limit) {
                continue;
            }
            let triggered = match &effect.condition {
                Some(condition) => {
                    let ctx = EventContext { event, meta, scope, inner };
                    condition.evaluate(&ctx, rng)?
                }
                None => true,
            };
            if !triggered {
                continue;
            }
            for action in &effect.actions {
                match action {
                    CompiledAction::MutateEvent { field, value } => {
                        let resolved = {
                            let ctx = EventContext { event, meta, scope, inner };
                            value.eval(&ctx, rng)?
                        };
                        event.insert(field.clone(), resolved);
                    }
                    CompiledAction::MutateState { target, field, op, value } => {
                        let resolved = {
                            let ctx = EventContext { event, meta, scope, inner };
                            value.eval(&ctx, rng)?
                        };
                        if let Some(meta_field) = field.strip_prefix("meta.") {
                            apply_meta_mutation(
                                meta,
                                scope,
                                target,
                                meta_field,
                                *op,
                                &resolved,
                            );
                        } else {
                            outcome.state_mutations.push(StateMutation {
                                target: target.clone(),
                                field: field.clone(),
                                op: *op,
                                value: resolved,
                            });
                        }
                    }
                    CompiledAction::Score { target, points } => {
                        let resolved = {
                            let ctx = EventContext { event, meta, scope, inner };
                            points.eval(&ctx, rng)?
                        };
                        outcome.scores.push((target.clone(), resolved.as_num().unwrap_or(0.0)));
                    }
                    CompiledAction::Emit { event: name, count } => {
                        let resolved = {
                            let ctx = EventContext { event, meta, scope, inner };
                            count.eval(&ctx, rng)?
                        };
                        let count = resolved.as_num().unwrap_or(0.0).max(0.0) as u32;
                        if count > 0 {
                            outcome.sub_events.push((name.clone(), count));
                        }
                    }
                    CompiledAction::Narrative { text } => {
                        outcome.narratives.push(text.clone());
                    }
                    CompiledAction::BlockDefault => {
                        suppress_below = Some(effect.record.spec.priority);
                    }
                    CompiledAction::BlockEvent => {
                        outcome.block_event = true;
                        return Ok(outcome);
                    }
                }
            }
        }
        Ok(outcome)
    }
}

// ============================================================================
// SECTION: Meta Mutation
// ============================================================================

/// Applies a `mutate_state` action whose field targets a meta bucket.
fn apply_meta_mutation(
    meta: &mut MetaStore,
    scope: &MetaScope,
    target: &TargetSelector,
    field: &str,
    op: StateOp,
    value: &Scalar,
) {
    let (kind, entity_id) = match target {
        TargetSelector::Team { team_id } => (MetaEntityKind::Team, team_id.to_string()),
        TargetSelector::Player { player_id } => (MetaEntityKind::Player, player_id.to_string()),
        TargetSelector::OffenseTeam | TargetSelector::DefenseTeam | TargetSelector::League => {
            match &scope.team_id {
                Some(team_id) => (MetaEntityKind::Team, team_id.clone()),
                None => return,
            }
        }
        TargetSelector::BallHandler | TargetSelector::Defender => match &scope.player_id {
            Some(player_id) => (MetaEntityKind::Player, player_id.clone()),
            None => return,
        },
    };
    let key = MetaKey { kind, entity_id, season_id: scope.season_id.clone() };
    match op {
        StateOp::Set => meta.set(key, field, value.clone()),
        StateOp::Add => meta.add(key, field, value.as_num().unwrap_or(0.0)),
        StateOp::Subtract => meta.add(key, field, -value.as_num().unwrap_or(0.0)),
    }
}
