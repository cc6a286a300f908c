// crates/courtside-governance/tests/common/mod.rs
// ============================================================================
// Module: Governance Test Fixtures
// Description: In-memory event store and league fixtures.
// ============================================================================
//! ## Overview
//! An in-memory [`EventStore`] with the same sequencing contract as the
//! durable store, plus season and roster fixtures shared across the suite.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    dead_code,
    reason = "Test-only fixtures shared across integration binaries."
)]

use std::collections::BTreeMap;

use courtside_core::EventStore;
use courtside_core::GovernanceEvent;
use courtside_core::GovernorId;
use courtside_core::LeagueId;
use courtside_core::LifecycleConfig;
use courtside_core::RuleSet;
use courtside_core::Season;
use courtside_core::SeasonId;
use courtside_core::SeasonPhase;
use courtside_core::StoreError;
use courtside_core::TeamId;
use courtside_core::Timestamp;
use courtside_governance::GovernorRoster;

// ============================================================================
// SECTION: In-Memory Event Store
// ============================================================================

/// Vec-backed event store with per-season monotonic sequencing.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    /// Appended events in insertion order.
    pub events: Vec<GovernanceEvent>,
}

impl EventStore for MemoryEventStore {
    fn append_event(&mut self, event: GovernanceEvent) -> Result<GovernanceEvent, StoreError> {
        let next = self
            .events
            .iter()
            .filter(|existing| existing.season_id == event.season_id)
            .map(|existing| existing.sequence_number)
            .max()
            .unwrap_or(0)
            + 1;
        let mut sequenced = event;
        sequenced.sequence_number = next;
        self.events.push(sequenced.clone());
        Ok(sequenced)
    }

    fn events_for_season(&self, season_id: &SeasonId) -> Result<Vec<GovernanceEvent>, StoreError> {
        Ok(self
            .events
            .iter()
            .filter(|event| &event.season_id == season_id)
            .cloned()
            .collect())
    }

    fn events_by_type(
        &self,
        season_id: &SeasonId,
        event_type: &str,
    ) -> Result<Vec<GovernanceEvent>, StoreError> {
        Ok(self
            .events
            .iter()
            .filter(|event| &event.season_id == season_id && event.event_type == event_type)
            .cloned()
            .collect())
    }

    fn events_for_aggregate(
        &self,
        season_id: &SeasonId,
        aggregate_id: &str,
    ) -> Result<Vec<GovernanceEvent>, StoreError> {
        Ok(self
            .events
            .iter()
            .filter(|event| &event.season_id == season_id && event.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a season in the ACTIVE phase with default rules.
#[must_use]
pub fn fixture_season() -> Season {
    let rules = RuleSet::default();
    Season {
        id: SeasonId::from("season-1"),
        league_id: LeagueId::from("league-1"),
        number: 1,
        phase: SeasonPhase::Active,
        starting_rules: rules.clone(),
        current_rules: rules,
        completed_rounds: 0,
        lifecycle: LifecycleConfig::default(),
    }
}

/// Builds a four-governor roster, one governor per team.
#[must_use]
pub fn fixture_roster() -> GovernorRoster {
    let mut assignments = BTreeMap::new();
    for index in 1..=4 {
        assignments.insert(
            GovernorId::from(format!("gov-{index}").as_str()),
            TeamId::from(format!("team-{index}").as_str()),
        );
    }
    GovernorRoster::new(assignments)
}

/// A fixed test timestamp.
#[must_use]
pub fn fixture_now() -> Timestamp {
    Timestamp::from_unix_millis(1_700_000_000_000)
}
