// crates/courtside-runtime/src/presenter.rs
// ============================================================================
// Module: Presenter
// Description: Real-time replay of pre-computed game results.
// Purpose: Drip paced possession events onto the bus and flip visibility.
// Dependencies: crate::bus, courtside-core, courtside-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! The presenter replays already-simulated games over wall-clock time: one
//! `presentation.possession` per play-by-play entry, paced so each quarter
//! fills its replay budget. A process-wide [`PresentationState`] enforces
//! the singleton, exposes a live snapshot for server-rendered hydration, and
//! carries the cooperative cancel flag: the presenter only ever stops
//! between possessions, never inside one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use courtside_core::GameResult;
use courtside_core::TeamId;
use courtside_store_sqlite::Repository;

use crate::bus::EventBus;

// ============================================================================
// SECTION: Live State
// ============================================================================

/// Snapshot of the game currently being presented.
#[derive(Debug, Clone)]
pub struct LiveGameState {
    /// Game identifier.
    pub game_id: String,
    /// Home team identifier.
    pub home_team_id: String,
    /// Away team identifier.
    pub away_team_id: String,
    /// Home score as presented so far.
    pub home_score: u32,
    /// Away score as presented so far.
    pub away_score: u32,
    /// Quarter being presented.
    pub quarter: u32,
    /// Last narration line shown.
    pub last_narration: String,
}

/// Process-wide presentation state.
///
/// # Invariants
/// - At most one presentation runs while `is_active` holds.
#[derive(Debug, Default)]
pub struct PresentationState {
    /// Whether a presentation is running.
    active: AtomicBool,
    /// Cooperative cancellation flag.
    cancelled: AtomicBool,
    /// Live snapshot for HTTP hydration.
    live: Mutex<Option<LiveGameState>>,
}

impl PresentationState {
    /// Attempts to claim the singleton; returns false when already active.
    pub fn try_activate(&self) -> bool {
        self.cancelled.store(false, Ordering::SeqCst);
        !self.active.swap(true, Ordering::SeqCst)
    }

    /// Releases the singleton and clears the live snapshot.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
        if let Ok(mut live) = self.live.lock() {
            *live = None;
        }
    }

    /// Returns true while a presentation is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Requests cooperative cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true when cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Reads the live snapshot.
    #[must_use]
    pub fn live(&self) -> Option<LiveGameState> {
        self.live.lock().ok().and_then(|live| live.clone())
    }

    /// Writes the live snapshot.
    fn set_live(&self, snapshot: LiveGameState) {
        if let Ok(mut live) = self.live.lock() {
            *live = Some(snapshot);
        }
    }
}

// ============================================================================
// SECTION: Timing
// ============================================================================

/// Presenter pacing knobs.
#[derive(Debug, Clone, Copy)]
pub struct PresenterTiming {
    /// Total replay budget per quarter, in seconds.
    pub quarter_replay_seconds: u64,
    /// Gap between games, in seconds.
    pub game_interval_seconds: u64,
}

// ============================================================================
// SECTION: Presentation
// ============================================================================

/// Presents a round's results, marking each game visible as it finishes.
///
/// Runs as one long-lived task per round. Cancellation is cooperative:
/// checked between possessions, and already-started games are marked
/// presented on the way out so results never stay hidden.
pub async fn present_round(
    state: Arc<PresentationState>,
    bus: Arc<EventBus>,
    repo: Repository,
    timing: PresenterTiming,
    team_names: BTreeMap<TeamId, String>,
    results: Vec<GameResult>,
) {
    if !state.try_activate() {
        log::warn!("presentation already active; skipping replay for this round");
        return;
    }
    for (index, result) in results.iter().enumerate() {
        if state.is_cancelled() {
            break;
        }
        if index > 0 {
            tokio::time::sleep(Duration::from_secs(timing.game_interval_seconds)).await;
        }
        present_game(&state, &bus, &timing, &team_names, result).await;
        // Mark visible even when cancelled mid-game: the live experience is
        // lost but the result must not stay hidden.
        if let Err(err) = repo.mark_presented(&result.id) {
            log::error!("failed to mark game {} presented: {err}", result.id);
        }
        bus.publish(
            "presentation.game_finished",
            serde_json::json!({
                "game_id": result.id.as_str(),
                "home_team_id": result.home_team_id.as_str(),
                "away_team_id": result.away_team_id.as_str(),
                "home_score": result.home_score,
                "away_score": result.away_score,
                "leaders": leaders(result),
            }),
        );
    }
    bus.publish(
        "presentation.round_finished",
        serde_json::json!({ "games": results.len() }),
    );
    state.deactivate();
}

/// Presents one game's possessions with per-quarter pacing.
async fn present_game(
    state: &PresentationState,
    bus: &EventBus,
    timing: &PresenterTiming,
    team_names: &BTreeMap<TeamId, String>,
    result: &GameResult,
) {
    let name = |team_id: &TeamId| {
        team_names.get(team_id).cloned().unwrap_or_else(|| team_id.to_string())
    };
    bus.publish(
        "presentation.game_starting",
        serde_json::json!({
            "game_id": result.id.as_str(),
            "home": name(&result.home_team_id),
            "away": name(&result.away_team_id),
        }),
    );

    // Per-quarter possession counts set the per-event sleep so every quarter
    // fills its replay budget regardless of possession count.
    let mut per_quarter: BTreeMap<u32, u32> = BTreeMap::new();
    for entry in &result.play_by_play {
        *per_quarter.entry(entry.quarter).or_insert(0) += 1;
    }

    for entry in &result.play_by_play {
        if state.is_cancelled() {
            return;
        }
        let possessions = per_quarter.get(&entry.quarter).copied().unwrap_or(1).max(1);
        let delay = timing.quarter_replay_seconds as f64 / f64::from(possessions);
        tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        state.set_live(LiveGameState {
            game_id: result.id.to_string(),
            home_team_id: result.home_team_id.to_string(),
            away_team_id: result.away_team_id.to_string(),
            home_score: entry.home_score,
            away_score: entry.away_score,
            quarter: entry.quarter,
            last_narration: entry.narration.clone(),
        });
        bus.publish(
            "presentation.possession",
            serde_json::json!({
                "game_id": result.id.as_str(),
                "quarter": entry.quarter,
                "clock_seconds": entry.clock_seconds,
                "possession": entry.possession,
                "offense": name(&entry.offense_team_id),
                "action": entry.action,
                "outcome": entry.outcome,
                "points": entry.points,
                "home_score": entry.home_score,
                "away_score": entry.away_score,
                "narration": entry.narration,
            }),
        );
    }
}

/// Computes scoring leaders for the game-finished payload.
fn leaders(result: &GameResult) -> serde_json::Value {
    let mut lines: Vec<_> = result.box_scores.iter().collect();
    lines.sort_by(|a, b| b.points.cmp(&a.points));
    serde_json::Value::Array(
        lines
            .iter()
            .take(3)
            .map(|line| {
                serde_json::json!({
                    "player_id": line.player_id.as_str(),
                    "points": line.points,
                })
            })
            .collect(),
    )
}
