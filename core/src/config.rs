use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Grid;

/// Planning strategy selected for a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Follow the Hamiltonian cycle without deviation.
    Hamiltonian,
    /// Follow the cycle but take validated shortcuts toward the fruit.
    HamiltonianShortcuts,
    /// A* search toward the fruit with a Manhattan heuristic.
    #[serde(rename = "astar")]
    AStar,
    /// Breadth-first search toward the fruit.
    Bfs,
}

impl Algorithm {
    /// Every algorithm in registration order.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Hamiltonian,
        Algorithm::HamiltonianShortcuts,
        Algorithm::AStar,
        Algorithm::Bfs,
    ];

    /// Registry name of the algorithm.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hamiltonian => "hamiltonian",
            Self::HamiltonianShortcuts => "hamiltonian-shortcuts",
            Self::AStar => "astar",
            Self::Bfs => "bfs",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str() == value)
            .ok_or_else(|| ConfigError::UnknownAlgorithm {
                name: value.to_owned(),
            })
    }
}

/// Immutable parameters of a single game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of board rows.
    pub rows: u32,
    /// Number of board columns.
    pub cols: u32,
    /// Target wall-clock interval between ticks, in milliseconds.
    pub tick_ms: u64,
    /// Seed for the deterministic fruit generator.
    pub seed: u32,
    /// Planning strategy.
    pub algorithm: Algorithm,
    /// Whether shortcut-capable strategies may leave the cycle.
    pub shortcuts_enabled: bool,
    /// Minimum margin, in cycle steps, kept between the head and the tail.
    pub safety_buffer: u32,
    /// Free-cell count at or below which shortcuts are disallowed.
    pub late_game_lock: u32,
    /// Minimum safe window required before shortcuts are considered.
    pub min_shortcut_window: u32,
    /// Points awarded per fruit.
    pub score_per_fruit: u64,
    /// Extra points awarded when the fruit is eaten by a shortcut move.
    pub shortcut_bonus: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 20,
            cols: 20,
            tick_ms: 100,
            seed: 1,
            algorithm: Algorithm::HamiltonianShortcuts,
            shortcuts_enabled: true,
            safety_buffer: 2,
            late_game_lock: 0,
            min_shortcut_window: 2,
            score_per_fruit: 10,
            shortcut_bonus: 0,
        }
    }
}

impl GameConfig {
    /// Creates a configuration for a `rows` by `cols` board with default tuning.
    #[must_use]
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            ..Default::default()
        }
    }

    /// Replaces the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Replaces the planning algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Board described by the configuration, without validation.
    #[must_use]
    pub const fn grid(&self) -> Grid {
        Grid::new(self.rows, self.cols)
    }

    /// Tick interval as a [`Duration`].
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Checks every invariant and returns the validated board.
    pub fn validate(&self) -> Result<Grid, ConfigError> {
        let grid = Grid::validated(self.rows, self.cols)?;

        at_least("safety_buffer", u64::from(self.safety_buffer), 1)?;
        at_least("min_shortcut_window", u64::from(self.min_shortcut_window), 1)?;
        at_least("tick_ms", self.tick_ms, 1)?;

        Ok(grid)
    }
}

impl Grid {
    /// Creates a grid after checking that it can host a Hamiltonian cycle.
    pub fn validated(rows: u32, cols: u32) -> Result<Self, ConfigError> {
        match board_defect(rows, cols) {
            Some(defect) => Err(ConfigError::InvalidBoard { rows, cols, defect }),
            None => Ok(Self::new(rows, cols)),
        }
    }
}

fn board_defect(rows: u32, cols: u32) -> Option<BoardDefect> {
    let cells = u64::from(rows) * u64::from(cols);
    if cells < 4 {
        Some(BoardDefect::TooFewCells)
    } else if rows < 2 || cols < 2 {
        Some(BoardDefect::NarrowDimension)
    } else if rows % 2 == 1 && cols % 2 == 1 {
        Some(BoardDefect::BothOdd)
    } else if cells > u64::from(u32::MAX) {
        Some(BoardDefect::TooLarge)
    } else {
        None
    }
}

fn at_least(field: &'static str, value: u64, min: u64) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::BelowMinimum { field, min, value });
    }
    Ok(())
}

/// Why a board cannot host a Hamiltonian cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoardDefect {
    /// Fewer than four cells.
    TooFewCells,
    /// One dimension is a single cell wide.
    NarrowDimension,
    /// Both dimensions are odd.
    BothOdd,
    /// The cell count does not fit a 32-bit cell index.
    TooLarge,
}

impl fmt::Display for BoardDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewCells => write!(f, "at least four cells are required"),
            Self::NarrowDimension => write!(f, "both dimensions must be at least two"),
            Self::BothOdd => write!(f, "rows or columns must be even"),
            Self::TooLarge => write!(f, "too many cells"),
        }
    }
}

/// Errors raised while validating or parsing configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The board cannot host a Hamiltonian cycle.
    #[error("invalid board {rows}x{cols}: {defect}")]
    InvalidBoard {
        /// Requested rows.
        rows: u32,
        /// Requested columns.
        cols: u32,
        /// Specific defect.
        defect: BoardDefect,
    },
    /// A tuning value is below its minimum.
    #[error("{field} must be at least {min} (got {value})")]
    BelowMinimum {
        /// Offending field.
        field: &'static str,
        /// Minimum accepted value.
        min: u64,
        /// Provided value.
        value: u64,
    },
    /// An algorithm name did not match any known strategy.
    #[error("unknown algorithm '{name}'")]
    UnknownAlgorithm {
        /// Name that failed to parse.
        name: String,
    },
}
