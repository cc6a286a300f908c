// crates/courtside-runtime/src/orchestrator.rs
// ============================================================================
// Module: Round Orchestrator
// Description: Three-phase round executor over short write sessions.
// Purpose: Sequence tally, simulation, narratives, and persistence.
// Dependencies: crate::{bus, config}, courtside-ai, courtside-core,
// courtside-effects, courtside-engine, courtside-governance,
// courtside-store-sqlite
// ============================================================================

//! ## Overview
//! A round runs in three phases. Phase A holds a short write session:
//! pre-tally governance, simulate every scheduled game serially, persist
//! results, regenerate tokens at window boundaries. Phase B holds no session
//! and may take the better part of a minute: commentary and reports through
//! the AI gateway, every call with a deterministic mock fallback. Phase C
//! reopens a short session: store reports, flush meta, run the evaluation
//! harness, advance the season lifecycle, and publish `round.completed`.
//!
//! The split exists because the embedded store is single-writer: holding the
//! session across AI latency would starve every other writer in the process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::hash::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use courtside_ai::AiGateway;
use courtside_core::EventStore;
use courtside_core::GameId;
use courtside_core::GameResult;
use courtside_core::GovernorId;
use courtside_core::LifecycleError;
use courtside_core::Purpose;
use courtside_core::ScheduledGame;
use courtside_core::Season;
use courtside_core::SeasonId;
use courtside_core::SeasonPhase;
use courtside_core::StoreError;
use courtside_core::Team;
use courtside_core::TeamId;
use courtside_core::Timestamp;
use courtside_effects::EffectRegistry;
use courtside_effects::MetaScope;
use courtside_effects::MetaStore;
use courtside_effects::SeededSequence;
use courtside_effects::hooks;
use courtside_effects::registry::EffectError;
use courtside_engine::GameInputs;
use courtside_engine::SimError;
use courtside_engine::simulate_game;
use courtside_governance::GovernanceError;
use courtside_governance::GovernanceKernel;
use courtside_governance::GovernorRoster;
use courtside_governance::TallyReport;
use courtside_governance::load_strategies;
use courtside_store_sqlite::Repository;
use courtside_store_sqlite::RepositoryError;
use sieve_logic::EmptyContext;
use sieve_logic::Scalar;
use thiserror::Error;

use crate::bus::EventBus;
use crate::config::PresentationMode;
use crate::config::RuntimeConfig;

// ============================================================================
// SECTION: Errors and Summaries
// ============================================================================

/// Round execution errors, tagged by phase semantics.
#[derive(Debug, Error)]
pub enum RoundError {
    /// No season exists yet; seed the league first.
    #[error("no active season")]
    NoSeason,
    /// Repository failure.
    #[error("round storage failure: {0}")]
    Repository(#[from] RepositoryError),
    /// Event store seam failure.
    #[error("round event store failure: {0}")]
    Store(#[from] StoreError),
    /// Governance kernel failure.
    #[error("round governance failure: {0}")]
    Governance(#[from] GovernanceError),
    /// Simulation failure; the round aborts before phase B.
    #[error("round simulation failure: {0}")]
    Simulation(#[from] SimError),
    /// Effect compilation failure.
    #[error("round effect failure: {0}")]
    Effects(#[from] EffectError),
    /// Illegal lifecycle transition.
    #[error("round lifecycle failure: {0}")]
    Lifecycle(#[from] LifecycleError),
    /// Phase C failed after games persisted; the round is partial.
    #[error("round partial (reports lost): {0}")]
    Partial(String),
}

/// Summary of a completed round.
#[derive(Debug)]
pub struct RoundOutput {
    /// Round number executed (0 for governance-only passes).
    pub round: u32,
    /// Whether only governance ran.
    pub governance_only: bool,
    /// Tally summary.
    pub tally: TallyReport,
    /// Simulated results in slot order, for the presenter.
    pub results: Vec<GameResult>,
    /// Season id the round ran under.
    pub season_id: SeasonId,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Round orchestrator wiring storage, governance, engine, AI, and the bus.
pub struct Orchestrator {
    /// Repository facade.
    pub repo: Repository,
    /// In-process event bus.
    pub bus: Arc<EventBus>,
    /// AI gateway.
    pub gateway: Arc<AiGateway>,
    /// Runtime configuration.
    pub config: RuntimeConfig,
}

impl Orchestrator {
    /// Executes one full round (or a governance-only pass).
    ///
    /// Blocking: callers on the async loop wrap this in `spawn_blocking`.
    ///
    /// # Errors
    ///
    /// Returns [`RoundError`]; see the phase semantics in the module docs.
    pub fn run_round(&self, now: Timestamp) -> Result<RoundOutput, RoundError> {
        let Some(mut season) = self.repo.latest_season()? else {
            return Err(RoundError::NoSeason);
        };
        let roster = GovernorRoster::new(self.repo.roster_for_season(&season.id)?);

        // Governance never starves: a COMPLETE season still tallies.
        if season.phase == SeasonPhase::Complete {
            let tally = self.governance_only_pass(&season, &roster, now)?;
            return Ok(RoundOutput {
                round: season.completed_rounds,
                governance_only: true,
                tally,
                results: Vec::new(),
                season_id: season.id.clone(),
            });
        }

        // Offseason closes on its deadline before anything else happens.
        if season.phase == SeasonPhase::Offseason {
            let deadline = season.lifecycle.offseason_closes_at;
            if deadline.is_some_and(|deadline| now >= deadline) {
                self.close_offseason(&mut season)?;
                let tally = self.governance_only_pass(&season, &roster, now)?;
                return Ok(RoundOutput {
                    round: season.completed_rounds,
                    governance_only: true,
                    tally,
                    results: Vec::new(),
                    season_id: season.id.clone(),
                });
            }
        }

        let round = season.completed_rounds + 1;
        let (tally, results, mut meta, eval_meta, registry) =
            self.phase_a(&mut season, &roster, round, now)?;
        let reports =
            self.phase_b(&season, &roster, round, &results, &tally, &registry, &mut meta);
        self.phase_c(&mut season, round, &results, reports, meta, eval_meta, now)
            .map_err(|err| match err {
                RoundError::Partial(message) => RoundError::Partial(message),
                other => RoundError::Partial(other.to_string()),
            })?;

        Ok(RoundOutput {
            round,
            governance_only: false,
            tally,
            results,
            season_id: season.id.clone(),
        })
    }

    // ------------------------------------------------------------------
    // Phase A
    // ------------------------------------------------------------------

    /// Simulate-and-tally under one short write session.
    #[allow(clippy::type_complexity, reason = "Phase hand-off tuple stays internal.")]
    fn phase_a(
        &self,
        season: &mut Season,
        roster: &GovernorRoster,
        round: u32,
        now: Timestamp,
    ) -> Result<
        (TallyReport, Vec<GameResult>, MetaStore, Option<MetaStore>, EffectRegistry),
        RoundError,
    > {
        let mut meta = MetaStore::from_buckets(self.repo.load_meta_buckets(&season.id)?);
        let pre_events = self.repo.events_for_season(&season.id)?;
        let pre_registry = EffectRegistry::load_active(&pre_events, round)?;
        self.fire_round_hook(&pre_registry, hooks::GOV_PRE, &mut meta, season, round)?;

        let mut repo = self.repo.clone();
        let mut kernel = GovernanceKernel::new(
            &mut repo,
            self.gateway.as_ref(),
            roster,
            self.config.governance_admin_id.clone(),
        );
        kernel.retry_interpretations(season, round, now)?;
        let tally = kernel.tally_pending(season, round, now)?;
        if let Some(updated) = &tally.updated_rules {
            season.current_rules = updated.clone();
        }

        // Token regeneration at window boundaries.
        let interval = season.current_rules.governance_interval_rounds.max(1) as u32;
        if round % interval == 0 {
            kernel.regenerate_tokens(season, round, now)?;
        }
        self.fire_round_hook(&pre_registry, hooks::GOV_POST, &mut meta, season, round)?;

        let events = self.repo.events_for_season(&season.id)?;
        let registry = EffectRegistry::load_active(&events, round)?;
        let strategies = load_strategies(&events);
        let teams: BTreeMap<TeamId, Team> = self
            .repo
            .teams_for_season(&season.id)?
            .into_iter()
            .map(|team| (team.id.clone(), team))
            .collect();

        let schedule = self.repo.schedule_for_round(&season.id, round)?;
        let eval_meta = self.config.evals_enabled.then(|| meta.clone());

        // Serial simulation in schedule order keeps event ordering trivial.
        let mut results = Vec::with_capacity(schedule.len());
        for scheduled in &schedule {
            let result =
                self.simulate_one(season, scheduled, &teams, &strategies, &registry, &mut meta)?;
            self.repo.insert_game_result(&result)?;
            if self.config.presentation_mode == PresentationMode::Instant {
                self.bus.publish(
                    "game.completed",
                    serde_json::json!({
                        "game_id": result.id.as_str(),
                        "round": result.round,
                        "home_team_id": result.home_team_id.as_str(),
                        "away_team_id": result.away_team_id.as_str(),
                        "home_score": result.home_score,
                        "away_score": result.away_score,
                    }),
                );
            }
            results.push(result);
        }

        season.completed_rounds = round;
        self.repo.upsert_season(season)?;
        Ok((tally, results, meta, eval_meta, registry))
    }

    /// Fires a governance or report hook with the round's seeded sequence.
    fn fire_round_hook(
        &self,
        registry: &EffectRegistry,
        hook: &str,
        meta: &mut MetaStore,
        season: &Season,
        round: u32,
    ) -> Result<Vec<String>, RoundError> {
        if registry.is_quiet(hook) {
            return Ok(Vec::new());
        }
        let mut event = BTreeMap::new();
        event.insert("round".to_string(), Scalar::Num(f64::from(round)));
        let scope =
            MetaScope { season_id: season.id.clone(), player_id: None, team_id: None };
        let mut seed = DefaultHasher::new();
        season.id.as_str().hash(&mut seed);
        hook.hash(&mut seed);
        round.hash(&mut seed);
        let mut sequence = SeededSequence::new(seed.finish());
        let outcome =
            registry.fire(hook, &mut event, &EmptyContext, meta, &scope, &mut sequence)?;
        Ok(outcome.narratives)
    }

    /// Simulates one scheduled game.
    fn simulate_one(
        &self,
        season: &Season,
        scheduled: &ScheduledGame,
        teams: &BTreeMap<TeamId, Team>,
        strategies: &BTreeMap<TeamId, courtside_core::TeamStrategy>,
        registry: &EffectRegistry,
        meta: &mut MetaStore,
    ) -> Result<GameResult, RoundError> {
        let home = teams.get(&scheduled.home_team_id).ok_or_else(|| {
            RoundError::Repository(RepositoryError::Invalid(format!(
                "scheduled home team missing: {}",
                scheduled.home_team_id
            )))
        })?;
        let away = teams.get(&scheduled.away_team_id).ok_or_else(|| {
            RoundError::Repository(RepositoryError::Invalid(format!(
                "scheduled away team missing: {}",
                scheduled.away_team_id
            )))
        })?;
        let inputs = GameInputs {
            game_id: GameId::fresh(),
            season_id: season.id.clone(),
            round: scheduled.round,
            slot: scheduled.slot,
            home,
            away,
            home_strategy: strategies.get(&home.id).cloned().unwrap_or_default(),
            away_strategy: strategies.get(&away.id).cloned().unwrap_or_default(),
            rules: &season.current_rules,
            seed: scheduled.seed,
            registry,
        };
        let mut result = simulate_game(&inputs, meta)?;
        result.presented = self.config.presentation_mode == PresentationMode::Instant;
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Phase B
    // ------------------------------------------------------------------

    /// Generates narratives with no storage session held.
    ///
    /// Every call degrades to the deterministic mock on failure; phase B
    /// cannot fail the round. Report hooks fire against the in-memory meta
    /// snapshot, so they never touch the store either.
    #[allow(clippy::too_many_arguments, reason = "Phase hand-off shape.")]
    fn phase_b(
        &self,
        season: &Season,
        roster: &GovernorRoster,
        round: u32,
        results: &[GameResult],
        tally: &TallyReport,
        registry: &EffectRegistry,
        meta: &mut MetaStore,
    ) -> Vec<(String, Option<GovernorId>, String)> {
        let mut reports = Vec::new();
        let commentary_lines = self
            .fire_round_hook(registry, hooks::REPORT_COMMENTARY_PRE, meta, season, round)
            .unwrap_or_default();
        for result in results {
            let mut prompt = commentary_prompt(result);
            for line in &commentary_lines {
                prompt.push(' ');
                prompt.push_str(line);
            }
            if let Ok(generation) =
                self.gateway.generate_or_mock(Purpose::Commentary, "", &prompt, 512)
            {
                reports.push((
                    format!("commentary:{}", result.id.as_str()),
                    None,
                    generation.text,
                ));
            }
        }
        let sim_lines = self
            .fire_round_hook(registry, hooks::REPORT_SIMULATION_PRE, meta, season, round)
            .unwrap_or_default();
        let sim_prompt = format!(
            "Season {} round {round}: {} games played. {}",
            season.number,
            results.len(),
            sim_lines.join(" ")
        );
        if let Ok(generation) =
            self.gateway.generate_or_mock(Purpose::ReportSim, "", &sim_prompt, 1_024)
        {
            reports.push(("report_sim".to_string(), None, generation.text));
        }
        let gov_prompt = format!(
            "Round {round} governance: {} examined, {} passed, {} failed, {} deferred.",
            tally.examined, tally.passed, tally.failed, tally.deferred
        );
        if let Ok(generation) =
            self.gateway.generate_or_mock(Purpose::ReportGov, "", &gov_prompt, 1_024)
        {
            reports.push(("report_gov".to_string(), None, generation.text));
        }
        for (governor_id, team_id) in roster.governors() {
            let prompt = format!("Private round {round} outlook for team {team_id}.");
            if let Ok(generation) =
                self.gateway.generate_or_mock(Purpose::ReportPrivate, "", &prompt, 512)
            {
                reports.push((
                    "report_private".to_string(),
                    Some(governor_id.clone()),
                    generation.text,
                ));
            }
        }
        reports
    }

    // ------------------------------------------------------------------
    // Phase C
    // ------------------------------------------------------------------

    /// Persist-and-finalize under a second short write session.
    #[allow(clippy::too_many_arguments, reason = "Phase hand-off shape.")]
    fn phase_c(
        &self,
        season: &mut Season,
        round: u32,
        results: &[GameResult],
        reports: Vec<(String, Option<GovernorId>, String)>,
        mut meta: MetaStore,
        eval_meta: Option<MetaStore>,
        now: Timestamp,
    ) -> Result<(), RoundError> {
        for (kind, governor_id, body) in &reports {
            self.repo.insert_report(&season.id, round, kind, governor_id.as_ref(), body)?;
            self.bus.publish(
                "report.generated",
                serde_json::json!({ "round": round, "kind": kind }),
            );
        }
        self.repo.flush_meta(&meta.take_dirty())?;
        self.repo.append_usage(&self.gateway.drain_usage(), now.unix_millis())?;

        if let Some(eval_meta) = eval_meta {
            self.run_evals(season, results, eval_meta);
        }

        self.advance_lifecycle(season, round, results, now)?;
        self.repo.upsert_season(season)?;
        self.bus.publish(
            "round.completed",
            serde_json::json!({
                "season_id": season.id.as_str(),
                "round": round,
                "games": results.len(),
                "phase": season.phase.as_str(),
            }),
        );
        Ok(())
    }

    /// Non-blocking determinism diagnostics: replay one game and compare.
    fn run_evals(&self, season: &Season, results: &[GameResult], eval_meta: MetaStore) {
        let Some(reference) = results.first() else { return };
        let teams = match self.repo.teams_for_season(&season.id) {
            Ok(teams) => teams,
            Err(err) => {
                log::warn!("evals skipped, teams unavailable: {err}");
                return;
            }
        };
        let find = |team_id: &TeamId| teams.iter().find(|team| &team.id == team_id);
        let (Some(home), Some(away)) =
            (find(&reference.home_team_id), find(&reference.away_team_id))
        else {
            log::warn!("evals skipped, rosters unavailable");
            return;
        };
        let events = match self.repo.events_for_season(&season.id) {
            Ok(events) => events,
            Err(err) => {
                log::warn!("evals skipped, events unavailable: {err}");
                return;
            }
        };
        let Ok(registry) = EffectRegistry::load_active(&events, reference.round) else {
            log::warn!("evals skipped, registry failed to compile");
            return;
        };
        let strategies = load_strategies(&events);
        let inputs = GameInputs {
            game_id: reference.id.clone(),
            season_id: season.id.clone(),
            round: reference.round,
            slot: reference.slot,
            home,
            away,
            home_strategy: strategies.get(&home.id).cloned().unwrap_or_default(),
            away_strategy: strategies.get(&away.id).cloned().unwrap_or_default(),
            rules: &reference.ruleset_snapshot,
            seed: reference.seed,
            registry: &registry,
        };
        let mut meta = eval_meta;
        match simulate_game(&inputs, &mut meta) {
            Ok(replayed) => {
                if replayed.play_by_play != reference.play_by_play {
                    log::error!(
                        "determinism eval failed for game {}: replay diverged",
                        reference.id
                    );
                } else {
                    log::info!("determinism eval passed for game {}", reference.id);
                }
            }
            Err(err) => log::error!("determinism eval errored: {err}"),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Advances the season lifecycle after a completed round.
    fn advance_lifecycle(
        &self,
        season: &mut Season,
        round: u32,
        results: &[GameResult],
        now: Timestamp,
    ) -> Result<(), RoundError> {
        match season.phase {
            SeasonPhase::Active => {
                if i64::from(round) < season.current_rules.rounds_per_season {
                    return Ok(());
                }
                season.transition_to(SeasonPhase::TiebreakerCheck)?;
                self.publish_phase(season);
                self.bus.publish(
                    "season.regular_season_complete",
                    serde_json::json!({ "season_id": season.id.as_str(), "round": round }),
                );
                let standings = self.repo.standings(&season.id)?;
                let mut ranked: Vec<(&TeamId, &(u32, u32))> = standings.iter().collect();
                ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then_with(|| a.0.cmp(b.0)));
                let tied_for_first = ranked.len() >= 2 && ranked[0].1.0 == ranked[1].1.0;
                if tied_for_first {
                    season.transition_to(SeasonPhase::Tiebreakers)?;
                    self.publish_phase(season);
                    let pairing = [(ranked[0].0.clone(), ranked[1].0.clone())];
                    self.schedule_round(season, round + 1, &pairing)?;
                    self.bus.publish(
                        "season.tiebreaker_games_generated",
                        serde_json::json!({ "season_id": season.id.as_str() }),
                    );
                } else {
                    self.enter_playoffs(season, round, &ranked)?;
                }
            }
            SeasonPhase::Tiebreakers => {
                let standings = self.repo.standings(&season.id)?;
                let mut ranked: Vec<(&TeamId, &(u32, u32))> = standings.iter().collect();
                ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then_with(|| a.0.cmp(b.0)));
                self.enter_playoffs(season, round, &ranked)?;
            }
            SeasonPhase::Playoffs => {
                season.transition_to(SeasonPhase::Championship)?;
                self.publish_phase(season);
                self.bus.publish(
                    "season.semifinals_complete",
                    serde_json::json!({ "season_id": season.id.as_str() }),
                );
                let winners: Vec<TeamId> =
                    results.iter().filter_map(|result| result.winner().cloned()).collect();
                if winners.len() >= 2 {
                    let pairing = [(winners[0].clone(), winners[1].clone())];
                    self.schedule_round(season, round + 1, &pairing)?;
                }
                self.bus.publish(
                    "season.championship_started",
                    serde_json::json!({ "season_id": season.id.as_str() }),
                );
            }
            SeasonPhase::Championship => {
                let champion = results.first().and_then(|result| result.winner().cloned());
                season.lifecycle.champion_team_id = champion.clone();
                let window = season.current_rules.governance_window_seconds;
                season.lifecycle.offseason_closes_at = Some(now.plus_seconds(window));
                season.transition_to(SeasonPhase::Offseason)?;
                self.publish_phase(season);
                self.bus.publish(
                    "season.playoffs_complete",
                    serde_json::json!({
                        "season_id": season.id.as_str(),
                        "champion_team_id": champion.as_ref().map(TeamId::as_str),
                    }),
                );
                self.bus.publish(
                    "season.offseason_started",
                    serde_json::json!({ "season_id": season.id.as_str() }),
                );
            }
            _ => {}
        }
        Ok(())
    }

    /// Transitions TiebreakerCheck or Tiebreakers into playoffs and builds
    /// the semifinal schedule.
    fn enter_playoffs(
        &self,
        season: &mut Season,
        round: u32,
        ranked: &[(&TeamId, &(u32, u32))],
    ) -> Result<(), RoundError> {
        season.transition_to(SeasonPhase::Playoffs)?;
        self.publish_phase(season);
        if ranked.len() >= 4 {
            let pairings = [
                (ranked[0].0.clone(), ranked[3].0.clone()),
                (ranked[1].0.clone(), ranked[2].0.clone()),
            ];
            self.schedule_round(season, round + 1, &pairings)?;
        } else if ranked.len() >= 2 {
            let pairings = [(ranked[0].0.clone(), ranked[1].0.clone())];
            self.schedule_round(season, round + 1, &pairings)?;
        }
        Ok(())
    }

    /// Schedules a generated round with deterministic seeds.
    fn schedule_round(
        &self,
        season: &Season,
        round: u32,
        pairings: &[(TeamId, TeamId)],
    ) -> Result<(), RoundError> {
        let games: Vec<ScheduledGame> = pairings
            .iter()
            .enumerate()
            .map(|(slot, (home, away))| ScheduledGame {
                round,
                slot: slot as u32,
                home_team_id: home.clone(),
                away_team_id: away.clone(),
                seed: derive_seed(&season.id, round, slot as u32),
            })
            .collect();
        self.repo.insert_schedule(&season.id, &games)?;
        Ok(())
    }

    /// Closes the offseason: archive, COMPLETE transition, bus events.
    fn close_offseason(&self, season: &mut Season) -> Result<(), RoundError> {
        let standings = self.repo.standings(&season.id)?;
        let archive = serde_json::json!({
            "season_id": season.id.as_str(),
            "number": season.number,
            "champion_team_id":
                season.lifecycle.champion_team_id.as_ref().map(TeamId::as_str),
            "standings": standings
                .iter()
                .map(|(team_id, (wins, losses))| {
                    serde_json::json!({
                        "team_id": team_id.as_str(),
                        "wins": wins,
                        "losses": losses,
                    })
                })
                .collect::<Vec<_>>(),
            "rule_changes": season
                .starting_rules
                .diff(&season.current_rules)
                .iter()
                .map(|change| {
                    serde_json::json!({
                        "parameter": change.parameter,
                        "old_value": change.old_value,
                        "new_value": change.new_value,
                    })
                })
                .collect::<Vec<_>>(),
        });
        self.repo.insert_archive(&season.id, &archive)?;
        season.transition_to(SeasonPhase::Complete)?;
        self.repo.upsert_season(season)?;
        self.publish_phase(season);
        self.bus.publish(
            "season.offseason_closed",
            serde_json::json!({ "season_id": season.id.as_str() }),
        );
        Ok(())
    }

    /// Publishes a `season.phase_changed` bus event.
    fn publish_phase(&self, season: &Season) {
        self.bus.publish(
            "season.phase_changed",
            serde_json::json!({
                "season_id": season.id.as_str(),
                "phase": season.phase.as_str(),
            }),
        );
    }

    // ------------------------------------------------------------------
    // Governance-only mode
    // ------------------------------------------------------------------

    /// Tallies pending governance without touching games.
    fn governance_only_pass(
        &self,
        season: &Season,
        roster: &GovernorRoster,
        now: Timestamp,
    ) -> Result<TallyReport, RoundError> {
        let mut repo = self.repo.clone();
        let mut kernel = GovernanceKernel::new(
            &mut repo,
            self.gateway.as_ref(),
            roster,
            self.config.governance_admin_id.clone(),
        );
        kernel.retry_interpretations(season, season.completed_rounds, now)?;
        let tally = kernel.tally_pending(season, season.completed_rounds, now)?;
        // A COMPLETE season's rule set stays frozen; enacted changes carry
        // into the next season when configured.
        Ok(tally)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Deterministic seed for generated (playoff, tiebreaker) games.
fn derive_seed(season_id: &SeasonId, round: u32, slot: u32) -> u64 {
    let mut hasher = DefaultHasher::new();
    season_id.as_str().hash(&mut hasher);
    round.hash(&mut hasher);
    slot.hash(&mut hasher);
    hasher.finish()
}

/// Builds the commentary prompt for one game.
fn commentary_prompt(result: &GameResult) -> String {
    let top_scorer = result
        .box_scores
        .iter()
        .max_by_key(|line| line.points)
        .map_or_else(String::new, |line| {
            format!(" Top scorer put up {} points.", line.points)
        });
    format!(
        "Final {}-{} over {} possessions with {} lead changes.{}",
        result.home_score, result.away_score, result.total_possessions, result.lead_changes,
        top_scorer
    )
}
