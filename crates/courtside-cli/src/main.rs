// crates/courtside-cli/src/main.rs
// ============================================================================
// Module: Courtside CLI Entry Point
// Description: Command dispatcher for serving, seeding, stepping, and stats.
// Purpose: Provide the operational surface over the runtime.
// Dependencies: clap, courtside-ai, courtside-core, courtside-runtime,
// courtside-store-sqlite, env_logger, tokio
// ============================================================================

//! ## Overview
//! Subcommands: `serve` starts the scheduler process, `seed` creates a
//! league from a structured config, `step N` advances rounds synchronously
//! in instant mode, and `ask` answers simple natural-language stats
//! questions over league state. Exit codes: 0 success, 1 invalid config,
//! 2 storage failure, 3 governance constraint violation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use courtside_ai::AiGateway;
use courtside_ai::HttpProvider;
use courtside_ai::HttpProviderConfig;
use courtside_ai::RetryPolicy;
use courtside_core::Timestamp;
use courtside_runtime::EventBus;
use courtside_runtime::Orchestrator;
use courtside_runtime::PresentationMode;
use courtside_runtime::PresentationState;
use courtside_runtime::RoundError;
use courtside_runtime::RuntimeConfig;
use courtside_runtime::Scheduler;
use courtside_runtime::load_seed_config;
use courtside_runtime::seed_league;
use courtside_store_sqlite::Repository;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Success.
const EXIT_OK: u8 = 0;
/// Invalid configuration.
const EXIT_INVALID_CONFIG: u8 = 1;
/// Storage failure.
const EXIT_STORAGE: u8 = 2;
/// Governance constraint violation.
const EXIT_GOVERNANCE: u8 = 3;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "courtside", arg_required_else_help = true)]
struct Cli {
    /// Optional config file path (defaults to courtside.toml or env
    /// override).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the scheduler process.
    Serve,
    /// Create a league from a structured seed file.
    Seed(SeedCommand),
    /// Advance N rounds synchronously (instant presentation).
    Step(StepCommand),
    /// Answer a natural-language stats question over league state.
    Ask(AskCommand),
}

/// Arguments for `seed`.
#[derive(Args, Debug)]
struct SeedCommand {
    /// Path to the seed TOML file.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
}

/// Arguments for `step`.
#[derive(Args, Debug)]
struct StepCommand {
    /// Rounds to advance.
    #[arg(default_value_t = 1)]
    rounds: u32,
}

/// Arguments for `ask`.
#[derive(Args, Debug)]
struct AskCommand {
    /// The question text.
    question: Vec<String>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = RuntimeConfig::resolve_path(cli.config.as_deref());
    let mut config = match RuntimeConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            return fail(EXIT_INVALID_CONFIG, &format!("config error: {err}"));
        }
    };
    init_logging(&config.log_level);

    match cli.command {
        Commands::Serve => run_serve(config),
        Commands::Seed(command) => run_seed(&config, &command),
        Commands::Step(command) => {
            // Synchronous stepping always presents instantly.
            config.production = false;
            config.presentation_mode = PresentationMode::Instant;
            run_step(config, command.rounds)
        }
        Commands::Ask(command) => run_ask(&config, &command.question.join(" ")),
    }
}

/// Initializes the logger from the configured level.
fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level),
    );
    let _ = builder.format_timestamp_millis().try_init();
}

/// Writes a message to stderr and returns the exit code.
fn fail(code: u8, message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "{message}");
    ExitCode::from(code)
}

/// Writes a line to stdout.
fn say(message: &str) {
    let mut stdout = std::io::stdout();
    let _ = writeln!(stdout, "{message}");
}

/// Current wall-clock timestamp.
fn now() -> Timestamp {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    Timestamp::from_unix_millis(millis)
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Builds the orchestrator stack from configuration.
fn build_orchestrator(config: RuntimeConfig) -> Result<Orchestrator, ExitCode> {
    let repo = Repository::open(&config.database)
        .map_err(|err| fail(EXIT_STORAGE, &format!("storage error: {err}")))?;
    let gateway = build_gateway(&config)?;
    Ok(Orchestrator {
        repo,
        bus: Arc::new(EventBus::default()),
        gateway: Arc::new(gateway),
        config,
    })
}

/// Builds the AI gateway: HTTP provider when configured, otherwise mock.
fn build_gateway(config: &RuntimeConfig) -> Result<AiGateway, ExitCode> {
    if !config.ai_configured() {
        log::info!("no AI endpoint configured; running on the deterministic mock");
        return Ok(AiGateway::mock_only());
    }
    let endpoint = config
        .ai
        .endpoint
        .as_deref()
        .unwrap_or_default()
        .parse::<url::Url>()
        .map_err(|err| fail(EXIT_INVALID_CONFIG, &format!("ai.endpoint invalid: {err}")))?;
    let provider = HttpProvider::new(HttpProviderConfig {
        endpoint,
        api_key: config.ai.api_key.clone().unwrap_or_default(),
        model_id: config.ai.model_id.clone().unwrap_or_default(),
        timeout_ms: config.ai.timeout_ms,
    })
    .map_err(|err| fail(EXIT_INVALID_CONFIG, &format!("ai provider error: {err}")))?;
    Ok(AiGateway::new(Some(Box::new(provider)), RetryPolicy::default()))
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the scheduler process until interrupted.
fn run_serve(config: RuntimeConfig) -> ExitCode {
    let orchestrator = match build_orchestrator(config) {
        Ok(orchestrator) => Arc::new(orchestrator),
        Err(code) => return code,
    };
    let presentation = Arc::new(PresentationState::default());
    let scheduler = Arc::new(Scheduler::new(Arc::clone(&orchestrator), Arc::clone(&presentation)));
    if let Err(err) = scheduler.recover() {
        return fail(EXIT_STORAGE, &format!("startup recovery failed: {err}"));
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => return fail(EXIT_STORAGE, &format!("runtime build failed: {err}")),
    };
    runtime.block_on(async move {
        let ticker = tokio::spawn(Arc::clone(&scheduler).run());
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("shutdown requested; cancelling presentation"),
            Err(err) => log::error!("signal handler failed: {err}"),
        }
        presentation.cancel();
        ticker.abort();
    });
    ExitCode::from(EXIT_OK)
}

/// Seeds a league from the given file.
fn run_seed(config: &RuntimeConfig, command: &SeedCommand) -> ExitCode {
    let seed_config = match load_seed_config(&command.file) {
        Ok(seed_config) => seed_config,
        Err(err) => return fail(EXIT_INVALID_CONFIG, &format!("seed config error: {err}")),
    };
    let repo = match Repository::open(&config.database) {
        Ok(repo) => repo,
        Err(err) => return fail(EXIT_STORAGE, &format!("storage error: {err}")),
    };
    match seed_league(&repo, &seed_config) {
        Ok(season) => {
            say(&format!(
                "seeded league '{}' season {} with {} teams",
                seed_config.league_name,
                season.number,
                seed_config.teams.len()
            ));
            ExitCode::from(EXIT_OK)
        }
        Err(err) => fail(EXIT_INVALID_CONFIG, &format!("seeding failed: {err}")),
    }
}

/// Advances N rounds synchronously.
fn run_step(config: RuntimeConfig, rounds: u32) -> ExitCode {
    let orchestrator = match build_orchestrator(config) {
        Ok(orchestrator) => orchestrator,
        Err(code) => return code,
    };
    for _ in 0..rounds.max(1) {
        match orchestrator.run_round(now()) {
            Ok(output) if output.governance_only => {
                say(&format!(
                    "governance-only pass: {} proposals examined",
                    output.tally.examined
                ));
            }
            Ok(output) => {
                say(&format!(
                    "round {} complete: {} games, {} passed / {} failed proposals",
                    output.round,
                    output.results.len(),
                    output.tally.passed,
                    output.tally.failed
                ));
            }
            Err(RoundError::Governance(err)) => {
                return fail(EXIT_GOVERNANCE, &format!("governance failure: {err}"));
            }
            Err(RoundError::NoSeason) => {
                return fail(EXIT_INVALID_CONFIG, "no season: run `courtside seed` first");
            }
            Err(err) => return fail(EXIT_STORAGE, &format!("round failed: {err}")),
        }
    }
    ExitCode::from(EXIT_OK)
}

/// Answers a stats question with keyword routing over stored state.
fn run_ask(config: &RuntimeConfig, question: &str) -> ExitCode {
    let repo = match Repository::open(&config.database) {
        Ok(repo) => repo,
        Err(err) => return fail(EXIT_STORAGE, &format!("storage error: {err}")),
    };
    let Ok(Some(season)) = repo.latest_season() else {
        return fail(EXIT_INVALID_CONFIG, "no season: run `courtside seed` first");
    };
    let lowered = question.to_lowercase();

    if lowered.contains("standing") || lowered.contains("record") || lowered.contains("rank") {
        let standings = match repo.standings(&season.id) {
            Ok(standings) => standings,
            Err(err) => return fail(EXIT_STORAGE, &format!("storage error: {err}")),
        };
        let teams = repo.teams_for_season(&season.id).unwrap_or_default();
        let name = |team_id: &courtside_core::TeamId| {
            teams
                .iter()
                .find(|team| &team.id == team_id)
                .map_or_else(|| team_id.to_string(), |team| team.name.clone())
        };
        let mut rows: Vec<_> = standings.iter().collect();
        rows.sort_by(|a, b| b.1.0.cmp(&a.1.0));
        for (team_id, (wins, losses)) in rows {
            say(&format!("{:<24} {wins}-{losses}", name(team_id)));
        }
        return ExitCode::from(EXIT_OK);
    }

    if lowered.contains("scorer") || lowered.contains("leader") || lowered.contains("points") {
        let results = match repo.results_for_season(&season.id) {
            Ok(results) => results,
            Err(err) => return fail(EXIT_STORAGE, &format!("storage error: {err}")),
        };
        let mut totals: std::collections::BTreeMap<String, u32> =
            std::collections::BTreeMap::new();
        for result in &results {
            for line in &result.box_scores {
                *totals.entry(line.player_id.to_string()).or_insert(0) += line.points;
            }
        }
        let mut rows: Vec<_> = totals.into_iter().collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        for (player_id, points) in rows.into_iter().take(5) {
            say(&format!("{player_id}: {points} pts"));
        }
        return ExitCode::from(EXIT_OK);
    }

    if lowered.contains("champion") || lowered.contains("winner") {
        match &season.lifecycle.champion_team_id {
            Some(team_id) => say(&format!("champion: {team_id}")),
            None => say("no champion yet; the season is still running"),
        }
        return ExitCode::from(EXIT_OK);
    }

    say(&format!(
        "season {} is {} after {} rounds; try asking about standings, leaders, or the champion",
        season.number,
        season.phase.as_str(),
        season.completed_rounds
    ));
    ExitCode::from(EXIT_OK)
}
