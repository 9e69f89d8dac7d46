#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays headless Snake autopilot batches.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use snake_autopilot_core::{Algorithm, GameConfig};
use snake_autopilot_system_simulator::{run_batch, BatchReport, SimulationOptions};

/// Plays one or more seeded games and reports how the autopilot fared.
#[derive(Debug, Parser)]
#[command(name = "snake-autopilot", version)]
#[command(about = "Deterministic Snake autopilot driven by a Hamiltonian cycle")]
struct Cli {
    /// TOML file with game settings; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Board rows
    #[arg(long)]
    rows: Option<u32>,

    /// Board columns
    #[arg(long)]
    cols: Option<u32>,

    /// Seed of the first run; later runs use consecutive seeds
    #[arg(long)]
    seed: Option<u32>,

    /// Planning strategy (hamiltonian, hamiltonian-shortcuts, astar, bfs)
    #[arg(long)]
    algorithm: Option<Algorithm>,

    /// Keep shortcut-capable strategies on the cycle
    #[arg(long)]
    no_shortcuts: bool,

    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Abandon a game after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Print the batch as JSON instead of text
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => GameConfig::default(),
        };

        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.cols = cols;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if self.no_shortcuts {
            config.shortcuts_enabled = false;
        }

        let _ = config.validate().context("invalid game configuration")?;
        Ok(config)
    }

    fn seeds(&self, first: u32) -> Vec<u32> {
        (0..self.runs).map(|offset| first.wrapping_add(offset)).collect()
    }
}

fn load_config(path: &Path) -> Result<GameConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn render_text(batch: &BatchReport) -> String {
    let mut lines: Vec<String> = batch
        .runs
        .iter()
        .map(|run| {
            format!(
                "seed={} status={:?} moves={} score={} length={} shortcuts={} efficiency={:.3} digest={}",
                run.seed,
                run.status,
                run.moves,
                run.score,
                run.length,
                run.shortcuts,
                run.efficiency(),
                &run.digest[..12.min(run.digest.len())],
            )
        })
        .collect();

    let summary = &batch.summary;
    lines.push(format!(
        "runs={} completed={} completion_rate={:.3} mean_moves={:.1} mean_score={:.1} max_score={} shortcuts={}",
        summary.runs,
        summary.completed,
        summary.completion_rate,
        summary.mean_moves,
        summary.mean_score,
        summary.max_score,
        summary.total_shortcuts,
    ));
    lines.join("\n")
}

/// Entry point for the Snake autopilot command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = cli.game_config()?;
    debug!("resolved configuration: {config:?}");

    let options = SimulationOptions {
        max_ticks: cli.max_ticks,
        record_trajectory: false,
    };
    let batch = run_batch(&config, &cli.seeds(config.seed), options)
        .context("failed to start simulation")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&batch).context("failed to encode report")?
        );
    } else {
        println!("{}", render_text(&batch));
    }
    Ok(())
}
