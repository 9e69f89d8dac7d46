#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless runner that plays games to completion without a frame loop.
//!
//! Every run owns its own engine and random stream, so batches fan out across
//! a `rayon` pool while each report stays reproducible from its seed alone.

use std::fmt::Write as _;

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use snake_autopilot_core::{Algorithm, Cell, Event, GameConfig, GameStatus, TickResult};
use snake_autopilot_system_engine::{Engine, InitError};
use snake_autopilot_world::{set_status, GameState};

/// Limits applied to a single headless run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimulationOptions {
    /// Maximum number of ticks before the run is abandoned.
    ///
    /// `None` allows twice the square of the cell count, which is enough for
    /// cycle following to fill any board.
    pub max_ticks: Option<u64>,
    /// Whether the report keeps every head position.
    pub record_trajectory: bool,
}

impl SimulationOptions {
    fn tick_budget(&self, cells: usize) -> u64 {
        self.max_ticks
            .unwrap_or_else(|| (cells as u64).saturating_mul(cells as u64).saturating_mul(2))
    }
}

/// Outcome of one headless game.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationReport {
    /// Seed the run was played with.
    pub seed: u32,
    /// Strategy that planned the run.
    pub algorithm: Algorithm,
    /// Status when the run ended.
    pub status: GameStatus,
    /// Ticks executed, including the final one.
    pub ticks: u64,
    /// Moves made by the snake.
    pub moves: u64,
    /// Final score.
    pub score: u64,
    /// Final snake length.
    pub length: usize,
    /// Fruit eaten.
    pub fruit_eaten: u64,
    /// Moves that left the Hamiltonian cycle.
    pub shortcuts: u64,
    /// Explanation of the last tick when it was not a plain move.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// SHA-256 over the head trajectory, as lowercase hex.
    pub digest: String,
    /// Head positions starting with the opening cell, when recorded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trajectory: Vec<Cell>,
}

impl SimulationReport {
    /// Whether the snake filled the board.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.status == GameStatus::Complete
    }

    /// Fruit eaten per move, or zero before the first move.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        if self.moves == 0 {
            0.0
        } else {
            self.fruit_eaten as f64 / self.moves as f64
        }
    }
}

/// Aggregate statistics over a batch of runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Number of runs.
    pub runs: usize,
    /// Runs that filled the board.
    pub completed: usize,
    /// Fraction of runs that filled the board.
    pub completion_rate: f64,
    /// Mean moves per run.
    pub mean_moves: f64,
    /// Mean final score per run.
    pub mean_score: f64,
    /// Highest final score.
    pub max_score: u64,
    /// Shortcut moves across every run.
    pub total_shortcuts: u64,
}

impl BatchSummary {
    /// Summarises `reports`.
    #[must_use]
    pub fn from_reports(reports: &[SimulationReport]) -> Self {
        if reports.is_empty() {
            return Self::default();
        }

        let runs = reports.len();
        let completed = reports.iter().filter(|report| report.completed()).count();
        let moves: u64 = reports.iter().map(|report| report.moves).sum();
        let score: u64 = reports.iter().map(|report| report.score).sum();

        Self {
            runs,
            completed,
            completion_rate: completed as f64 / runs as f64,
            mean_moves: moves as f64 / runs as f64,
            mean_score: score as f64 / runs as f64,
            max_score: reports.iter().map(|report| report.score).max().unwrap_or(0),
            total_shortcuts: reports.iter().map(|report| report.shortcuts).sum(),
        }
    }
}

/// Reports for every seed of a batch together with their summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchReport {
    /// Per-seed reports, in the order the seeds were given.
    pub runs: Vec<SimulationReport>,
    /// Aggregate over `runs`.
    pub summary: BatchSummary,
}

/// Plays the game described by `config` until it ends or the tick budget runs out.
pub fn run_game(
    config: &GameConfig,
    options: SimulationOptions,
) -> Result<SimulationReport, InitError> {
    let (mut engine, state) = Engine::new(config)?;
    let mut state = set_status(&state, GameStatus::Playing);
    let budget = options.tick_budget(state.cycle().len());

    let mut recorder = Trajectory::new(options.record_trajectory);
    recorder.push(state.head());

    let mut ticks = 0;
    let mut fruit_eaten = 0;
    let mut shortcuts = 0;
    let mut last = None;

    while state.status() == GameStatus::Playing && ticks < budget {
        let tick = engine.tick(state);
        ticks += 1;
        state = tick.state;

        for event in &tick.events {
            match event {
                Event::SnakeAdvanced { to, shortcut, .. } => {
                    recorder.push(*to);
                    if *shortcut {
                        shortcuts += 1;
                    }
                }
                Event::FruitConsumed { .. } => fruit_eaten += 1,
                Event::FruitPlaced { .. } | Event::StatusChanged { .. } => {}
            }
        }

        let stalled = matches!(tick.result, TickResult::PlannerFailed(_));
        last = Some(tick.result);
        if stalled {
            break;
        }
    }

    if state.status() == GameStatus::Playing {
        debug!("seed {} stopped after {ticks} ticks", config.seed);
    }

    Ok(report(config, &state, ticks, fruit_eaten, shortcuts, last, recorder))
}

/// Plays one game per seed in parallel. Reports keep the order of `seeds`.
pub fn run_batch(
    config: &GameConfig,
    seeds: &[u32],
    options: SimulationOptions,
) -> Result<BatchReport, InitError> {
    let _ = config.validate()?;

    let results: Vec<Result<SimulationReport, InitError>> = seeds
        .par_iter()
        .map(|&seed| run_game(&config.clone().with_seed(seed), options))
        .collect();
    let runs = results.into_iter().collect::<Result<Vec<_>, _>>()?;

    let summary = BatchSummary::from_reports(&runs);
    info!(
        "batch of {} runs on {}x{} with {}: {} completed",
        summary.runs, config.rows, config.cols, config.algorithm, summary.completed
    );
    Ok(BatchReport { runs, summary })
}

fn report(
    config: &GameConfig,
    state: &GameState,
    ticks: u64,
    fruit_eaten: u64,
    shortcuts: u64,
    last: Option<TickResult>,
    recorder: Trajectory,
) -> SimulationReport {
    let outcome = last.and_then(|result| describe(&result));
    let (digest, trajectory) = recorder.finish();
    SimulationReport {
        seed: config.seed,
        algorithm: config.algorithm,
        status: state.status(),
        ticks,
        moves: state.moves(),
        score: state.score(),
        length: state.snake().len(),
        fruit_eaten,
        shortcuts,
        outcome,
        digest,
        trajectory,
    }
}

fn describe(result: &TickResult) -> Option<String> {
    match result {
        TickResult::Valid | TickResult::AteFruit | TickResult::NotRunning => None,
        TickResult::GameComplete => Some("board filled".to_owned()),
        TickResult::Collision { kind, reason } => Some(format!("{kind:?} collision: {reason}")),
        TickResult::InvalidPlan { reason } => Some(format!("invalid plan: {reason}")),
        TickResult::PlannerFailed(error) => Some(format!("planner failed: {error}")),
    }
}

/// Streams head positions into the digest and optionally keeps them.
struct Trajectory {
    hasher: Sha256,
    cells: Option<Vec<Cell>>,
}

impl Trajectory {
    fn new(record: bool) -> Self {
        Self {
            hasher: Sha256::new(),
            cells: record.then(Vec::new),
        }
    }

    fn push(&mut self, cell: Cell) {
        self.hasher.update(cell.get().to_le_bytes());
        if let Some(cells) = &mut self.cells {
            cells.push(cell);
        }
    }

    fn finish(self) -> (String, Vec<Cell>) {
        let bytes = self.hasher.finalize();
        let mut digest = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            let _ = write!(digest, "{byte:02x}");
        }
        (digest, self.cells.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> SimulationOptions {
        SimulationOptions {
            max_ticks: None,
            record_trajectory: true,
        }
    }

    #[test]
    fn cycle_following_fills_small_boards() {
        let config = GameConfig::new(4, 4)
            .with_seed(3)
            .with_algorithm(Algorithm::Hamiltonian);
        let report = run_game(&config, options()).expect("valid config");

        assert!(report.completed());
        assert_eq!(report.length, 16);
        assert_eq!(report.fruit_eaten, 15);
        assert_eq!(report.score, 150);
        assert_eq!(report.shortcuts, 0);
        assert_eq!(report.ticks, report.moves);
        assert_eq!(report.trajectory.len() as u64, report.moves + 1);
        assert_eq!(report.outcome.as_deref(), Some("board filled"));
        assert_eq!(report.digest.len(), 64);
    }

    #[test]
    fn tick_budget_stops_long_runs() {
        let config = GameConfig::new(6, 6).with_seed(8);
        let report = run_game(
            &config,
            SimulationOptions {
                max_ticks: Some(10),
                record_trajectory: false,
            },
        )
        .expect("valid config");

        assert_eq!(report.status, GameStatus::Playing);
        assert_eq!(report.ticks, 10);
        assert_eq!(report.moves, 10);
        assert!(report.trajectory.is_empty());
        assert!(!report.completed());
    }

    #[test]
    fn digest_ignores_whether_the_trajectory_is_kept() {
        let config = GameConfig::new(6, 6).with_seed(21);
        let kept = run_game(&config, options()).expect("valid config");
        let dropped = run_game(
            &config,
            SimulationOptions {
                record_trajectory: false,
                ..options()
            },
        )
        .expect("valid config");

        assert_eq!(kept.digest, dropped.digest);
    }

    #[test]
    fn invalid_boards_are_rejected_up_front() {
        let config = GameConfig::new(3, 3);
        assert!(matches!(
            run_batch(&config, &[1, 2], options()),
            Err(InitError::Config(_))
        ));
    }

    #[test]
    fn summary_of_nothing_is_empty() {
        assert_eq!(BatchSummary::from_reports(&[]), BatchSummary::default());
    }
}
