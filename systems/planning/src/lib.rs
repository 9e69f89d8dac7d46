#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Planning strategies that choose the snake's next cell.
//!
//! Every strategy reads an immutable [`GameState`] and returns a
//! [`PlanResult`]; none of them mutates the game. The [`PlannerManager`]
//! keeps the registry of strategies by name and forwards plan requests to the
//! active one.

mod follow;
mod manager;
mod search;
mod shortcuts;

use std::fmt;

use snake_autopilot_core::{Cell, GameConfig, PlanError, PlanResult};
use snake_autopilot_world::{check_collision, GameState, HamiltonianCycle};

pub use follow::HamiltonianFollow;
pub use manager::PlannerManager;
pub use search::{AStar, Bfs};
pub use shortcuts::HamiltonianShortcuts;

/// A planning strategy registered with the [`PlannerManager`].
pub trait Strategy: fmt::Debug + Send {
    /// Registry name, matching [`snake_autopilot_core::Algorithm::as_str`].
    fn name(&self) -> &'static str;

    /// Whether a host may prefer to run the strategy off the main thread.
    fn is_expensive(&self) -> bool {
        false
    }

    /// Prepares cached data for a new board.
    fn initialize(&mut self, _cycle: &HamiltonianCycle) {}

    /// Chooses the next cell for the head.
    fn plan(&mut self, state: &GameState, options: &PlanOptions) -> Result<PlanResult, PlanError>;
}

/// Runtime tuning forwarded with every plan request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanOptions {
    /// Whether shortcut-capable strategies may leave the cycle.
    pub shortcuts_enabled: bool,
    /// Minimum margin kept between the head and the tail.
    pub safety_buffer: u32,
    /// Free-cell count at or below which shortcuts are disallowed.
    pub late_game_lock: u32,
    /// Minimum safe window required before shortcuts are considered.
    pub min_shortcut_window: u32,
}

impl PlanOptions {
    /// Extracts the planning tuning from a game configuration.
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            shortcuts_enabled: config.shortcuts_enabled,
            safety_buffer: config.safety_buffer,
            late_game_lock: config.late_game_lock,
            min_shortcut_window: config.min_shortcut_window,
        }
    }
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

fn cycle_position(state: &GameState, cell: Cell, strategy: &'static str) -> Result<usize, PlanError> {
    state
        .cycle()
        .position(cell)
        .ok_or_else(|| PlanError::StrategyFailed {
            strategy,
            reason: format!("{cell} is not on the cycle"),
        })
}

/// Legal neighbour of the head closest to `target` by Manhattan distance.
///
/// Without a target the first legal neighbour wins. Ties resolve in north,
/// east, south, west order.
fn survival_move(state: &GameState, target: Option<Cell>) -> Option<Cell> {
    let grid = state.grid();
    let mut best: Option<(u32, Cell)> = None;
    for neighbor in grid.neighbors(state.head()) {
        if check_collision(state, neighbor).is_some() {
            continue;
        }
        let rank = target.map_or(0, |target| grid.manhattan_distance(neighbor, target));
        if best.map_or(true, |(current, _)| rank < current) {
            best = Some((rank, neighbor));
        }
    }
    best.map(|(_, cell)| cell)
}
