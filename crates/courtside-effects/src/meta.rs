// crates/courtside-effects/src/meta.rs
// ============================================================================
// Module: Meta Store Runtime
// Description: Per-round in-memory snapshot of meta buckets.
// Purpose: Let effects read and write scoped overlays between possessions.
// Dependencies: courtside-core, sieve-logic
// ============================================================================

//! ## Overview
//! The meta store is loaded once at round start from the JSON columns on
//! team and player rows, mutated in memory while games run, and flushed once
//! at round end under the second write session. Dirty tracking keeps the
//! flush limited to buckets that actually changed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use courtside_core::MetaBucket;
use courtside_core::MetaEntityKind;
use courtside_core::MetaKey;
use courtside_core::SeasonId;
use sieve_logic::Scalar;

// ============================================================================
// SECTION: Meta Store
// ============================================================================

/// In-memory snapshot of meta buckets for one round.
///
/// # Invariants
/// - Keys and bucket entries iterate in stable order (BTree-backed).
/// - No I/O: loading and flushing are the repository's concern.
#[derive(Debug, Clone, Default)]
pub struct MetaStore {
    /// Buckets keyed by scoped entity.
    buckets: BTreeMap<MetaKey, MetaBucket>,
    /// Keys mutated since load.
    dirty: BTreeSet<MetaKey>,
}

impl MetaStore {
    /// Builds a store from loaded buckets.
    #[must_use]
    pub fn from_buckets(buckets: BTreeMap<MetaKey, MetaBucket>) -> Self {
        Self { buckets, dirty: BTreeSet::new() }
    }

    /// Reads one value from a scoped bucket.
    #[must_use]
    pub fn get(&self, key: &MetaKey, field: &str) -> Option<Scalar> {
        self.buckets.get(key).and_then(|bucket| bucket.get(field).cloned())
    }

    /// Convenience read by entity parts.
    #[must_use]
    pub fn get_scoped(
        &self,
        kind: MetaEntityKind,
        entity_id: &str,
        season_id: &SeasonId,
        field: &str,
    ) -> Option<Scalar> {
        let key =
            MetaKey { kind, entity_id: entity_id.to_string(), season_id: season_id.clone() };
        self.get(&key, field)
    }

    /// Writes one value, marking the bucket dirty.
    pub fn set(&mut self, key: MetaKey, field: impl Into<String>, value: Scalar) {
        self.buckets.entry(key.clone()).or_default().insert(field.into(), value);
        self.dirty.insert(key);
    }

    /// Adds to a numeric value, treating missing or non-numeric as zero.
    pub fn add(&mut self, key: MetaKey, field: &str, delta: f64) {
        let current = self
            .buckets
            .get(&key)
            .and_then(|bucket| bucket.get(field))
            .and_then(Scalar::as_num)
            .unwrap_or(0.0);
        self.set(key, field, Scalar::Num(current + delta));
    }

    /// Returns the dirty buckets for flushing and clears the dirty set.
    pub fn take_dirty(&mut self) -> Vec<(MetaKey, MetaBucket)> {
        let keys = std::mem::take(&mut self.dirty);
        keys.into_iter()
            .filter_map(|key| self.buckets.get(&key).cloned().map(|bucket| (key, bucket)))
            .collect()
    }

    /// Returns true when no bucket has been mutated since load.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dirty.is_empty()
    }
}
