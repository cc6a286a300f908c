// crates/courtside-runtime/src/scheduler.rs
// ============================================================================
// Module: Scheduler
// Description: Periodic round ticker with singleton and lease guards.
// Purpose: Advance the league in wall-clock time without overlapping work.
// Dependencies: crate::{bus, config, orchestrator, presenter},
// courtside-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! The scheduler fires `tick_round` on the pace interval. Two guards keep
//! ticks from overlapping: the in-process reentrancy flag (skip while a tick
//! or a presentation is running) and a durable lease in `bot_state` that
//! prevents duplicate ticks from racing process startups. Startup recovery
//! marks any unpresented games from the latest round visible; an
//! interrupted replay loses the live experience, never the results.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use courtside_core::Timestamp;
use courtside_store_sqlite::SCHEDULER_LEASE_KEY;

use crate::config::PresentationMode;
use crate::orchestrator::Orchestrator;
use crate::orchestrator::RoundError;
use crate::presenter::PresentationState;
use crate::presenter::PresenterTiming;
use crate::presenter::present_round;

// ============================================================================
// SECTION: Scheduler
// ============================================================================

/// Periodic round scheduler.
pub struct Scheduler {
    /// Orchestrator executing rounds.
    orchestrator: Arc<Orchestrator>,
    /// Shared presentation state (singleton + cancel + live snapshot).
    presentation: Arc<PresentationState>,
    /// Reentrancy guard: a tick is in flight.
    tick_running: AtomicBool,
    /// Durable lease holder tag.
    holder: String,
}

impl Scheduler {
    /// Creates a scheduler over the orchestrator.
    #[must_use]
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        presentation: Arc<PresentationState>,
    ) -> Self {
        Self {
            orchestrator,
            presentation,
            tick_running: AtomicBool::new(false),
            holder: process_tag(),
        }
    }

    /// Startup recovery: make interrupted-presentation games visible.
    ///
    /// # Errors
    ///
    /// Returns [`RoundError`] on storage failure.
    pub fn recover(&self) -> Result<(), RoundError> {
        let Some(season) = self.orchestrator.repo.latest_season()? else {
            return Ok(());
        };
        let unpresented = self.orchestrator.repo.unpresented_latest_round(&season.id)?;
        for game_id in &unpresented {
            self.orchestrator.repo.mark_presented(game_id)?;
        }
        if !unpresented.is_empty() {
            log::warn!(
                "recovery marked {} interrupted games presented; replay not resumed",
                unpresented.len()
            );
        }
        Ok(())
    }

    /// Runs the tick loop until the task is dropped.
    ///
    /// Manual pace returns immediately; rounds then advance only through
    /// the CLI.
    pub async fn run(self: Arc<Self>) {
        let Some(interval_seconds) = self.orchestrator.config.presentation_pace.interval_seconds()
        else {
            log::info!("manual pace: scheduler ticks disabled");
            return;
        };
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.clone().tick_round(interval_seconds).await;
        }
    }

    /// Executes one guarded tick.
    pub async fn tick_round(self: Arc<Self>, interval_seconds: u64) {
        if self.presentation.is_active() {
            log::debug!("tick skipped: presentation active");
            return;
        }
        if self.tick_running.swap(true, Ordering::SeqCst) {
            log::debug!("tick skipped: previous tick still running");
            return;
        }
        let outcome = self.clone().tick_inner(interval_seconds).await;
        self.tick_running.store(false, Ordering::SeqCst);
        if let Err(err) = outcome {
            log::error!("round tick failed: {err}");
        }
    }

    /// The tick body: lease, round, presentation launch.
    async fn tick_inner(self: Arc<Self>, interval_seconds: u64) -> Result<(), RoundError> {
        let now_ms = unix_millis();
        let lease_ms = i64::try_from(interval_seconds * 2_000).unwrap_or(i64::MAX);
        if !self.orchestrator.repo.try_acquire_lease(
            SCHEDULER_LEASE_KEY,
            &self.holder,
            now_ms,
            lease_ms,
        )? {
            log::info!("tick skipped: another instance holds the scheduler lease");
            return Ok(());
        }

        let orchestrator = Arc::clone(&self.orchestrator);
        let now = Timestamp::from_unix_millis(now_ms);
        let output = tokio::task::spawn_blocking(move || orchestrator.run_round(now))
            .await
            .map_err(|err| RoundError::Partial(format!("round task panicked: {err}")))??;

        if output.governance_only {
            log::info!("governance-only tick: tally examined {}", output.tally.examined);
            return Ok(());
        }
        log::info!(
            "round {} complete: {} games, tally {}/{} passed/failed",
            output.round,
            output.results.len(),
            output.tally.passed,
            output.tally.failed
        );

        if self.orchestrator.config.presentation_mode == PresentationMode::Replay
            && !output.results.is_empty()
        {
            let teams = self.orchestrator.repo.teams_for_season(&output.season_id)?;
            let team_names: BTreeMap<_, _> =
                teams.into_iter().map(|team| (team.id.clone(), team.name)).collect();
            let timing = PresenterTiming {
                quarter_replay_seconds: self.orchestrator.config.quarter_replay_seconds,
                game_interval_seconds: self.orchestrator.config.game_interval_seconds,
            };
            tokio::spawn(present_round(
                Arc::clone(&self.presentation),
                Arc::clone(&self.orchestrator.bus),
                self.orchestrator.repo.clone(),
                timing,
                team_names,
                output.results,
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Best-effort unique lease-holder tag for this process.
fn process_tag() -> String {
    format!("courtside-{}", std::process::id())
}

/// Current wall-clock time in unix milliseconds.
fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
