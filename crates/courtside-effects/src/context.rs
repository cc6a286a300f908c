// crates/courtside-effects/src/context.rs
// ============================================================================
// Module: Unified Evaluation Context
// Description: Layered field resolution over event, state, and meta spaces.
// Purpose: Give conditions and expressions one namespace for everything.
// Dependencies: courtside-core, sieve-logic
// ============================================================================

//! ## Overview
//! Effect conditions see one unified namespace: `event.*` resolves against
//! the fired event's fields, `meta.{kind}.{key}` against the scoped meta
//! buckets, and everything else (`game.*`, `player.*`, `team:{id}.*`, ...)
//! delegates to the engine-provided resolver. Because delegation is
//! generic, adding a new game-state field makes it queryable without any
//! evaluator change.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use courtside_core::MetaEntityKind;
use courtside_core::SeasonId;
use sieve_logic::ContextResolver;
use sieve_logic::Scalar;

use crate::meta::MetaStore;

// ============================================================================
// SECTION: Meta Scope
// ============================================================================

/// Entities the current event's meta paths resolve against.
#[derive(Debug, Clone)]
pub struct MetaScope {
    /// Season owning the buckets.
    pub season_id: SeasonId,
    /// Player for `meta.player.*`, typically the ball handler.
    pub player_id: Option<String>,
    /// Team for `meta.team.*`, typically the offense.
    pub team_id: Option<String>,
}

// ============================================================================
// SECTION: Layered Context
// ============================================================================

/// Unified context layering event fields and meta over an inner resolver.
pub struct EventContext<'a, C> {
    /// Fields of the fired event.
    pub event: &'a BTreeMap<String, Scalar>,
    /// Meta store snapshot.
    pub meta: &'a MetaStore,
    /// Scope for meta path resolution.
    pub scope: &'a MetaScope,
    /// Engine-provided resolver for game, player, and team paths.
    pub inner: &'a C,
}

impl<C: ContextResolver> ContextResolver for EventContext<'_, C> {
    fn resolve(&self, path: &str) -> Option<Scalar> {
        if let Some(field) = path.strip_prefix("event.") {
            return self.event.get(field).cloned();
        }
        if let Some(rest) = path.strip_prefix("meta.") {
            return self.resolve_meta(rest);
        }
        self.inner.resolve(path)
    }
}

impl<C: ContextResolver> EventContext<'_, C> {
    /// Resolves `meta.{kind}.{key}` against the scoped buckets.
    fn resolve_meta(&self, rest: &str) -> Option<Scalar> {
        let (kind_segment, field) = rest.split_once('.')?;
        let (kind, entity_id) = match kind_segment {
            "player" => (MetaEntityKind::Player, self.scope.player_id.as_deref()?),
            "team" => (MetaEntityKind::Team, self.scope.team_id.as_deref()?),
            _ => return None,
        };
        self.meta.get_scoped(kind, entity_id, &self.scope.season_id, field)
    }
}
