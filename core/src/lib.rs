#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the snake autopilot.
//!
//! This crate defines the vocabulary that connects the authoritative game
//! state, the pure planning systems, and any adapters. Systems submit
//! [`Command`] values describing desired mutations, the world crate executes
//! those commands via its `apply` entry point, and then reports [`Event`]
//! values describing what actually changed. Everything here is plain data:
//! grid math, configuration, plan and tick results, and the deterministic
//! random number generator used for fruit placement.

mod config;
mod plan;
mod rng;

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

pub use config::{Algorithm, BoardDefect, ConfigError, GameConfig};
pub use plan::{PlanError, PlanMeta, PlanResult};
pub use rng::Lcg;

/// Index of a single board cell in row-major order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell(u32);

impl Cell {
    /// Creates a cell from its row-major index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Retrieves the numeric representation of the cell.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Row-major index suitable for addressing dense per-cell arrays.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Converts a row-major index into its coordinate on a board `columns` wide.
///
/// A zero-width board maps every index onto the origin.
#[must_use]
pub fn index_to_position(index: usize, columns: u32) -> CellCoord {
    let width = columns as usize;
    let row = index.checked_div(width).unwrap_or(0);
    let column = index.checked_rem(width).unwrap_or(0);
    CellCoord::new(column as u32, row as u32)
}

/// Converts a coordinate into its row-major index on a board `columns` wide.
#[must_use]
pub fn position_to_index(coord: CellCoord, columns: u32) -> usize {
    coord.row() as usize * columns as usize + coord.column() as usize
}

/// Forward distance from `from` to `to` around a cycle of length `len`.
#[must_use]
pub fn cyclic_distance(from: usize, to: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (to % len + len - from % len) % len
}

/// Cardinal movement directions available to the snake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in the canonical enumeration order used for tie-breaking.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
}

/// Rectangular board dimensions together with the cell arithmetic they imply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    rows: u32,
    columns: u32,
}

impl Grid {
    /// Creates a grid description. Dimensions are not validated here; see
    /// [`GameConfig::validate`].
    #[must_use]
    pub const fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Total number of cells, `L = rows * columns`.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Reports whether the cell index lies inside `[0, L)`.
    #[must_use]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.index() < self.cell_count()
    }

    /// Coordinate of the provided cell.
    #[must_use]
    pub fn coord(&self, cell: Cell) -> CellCoord {
        index_to_position(cell.index(), self.columns)
    }

    /// Cell located at the provided coordinate, if it lies on the board.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<Cell> {
        if coord.column() >= self.columns || coord.row() >= self.rows {
            return None;
        }
        let index = position_to_index(coord, self.columns);
        u32::try_from(index).ok().map(Cell::new)
    }

    /// Cell reached by moving one step from `cell`, or `None` when the step
    /// would leave the board.
    #[must_use]
    pub fn step(&self, cell: Cell, direction: Direction) -> Option<Cell> {
        if !self.contains(cell) {
            return None;
        }

        let coord = self.coord(cell);
        let next = match direction {
            Direction::North => CellCoord::new(coord.column(), coord.row().checked_sub(1)?),
            Direction::East => CellCoord::new(coord.column().checked_add(1)?, coord.row()),
            Direction::South => CellCoord::new(coord.column(), coord.row().checked_add(1)?),
            Direction::West => CellCoord::new(coord.column().checked_sub(1)?, coord.row()),
        };
        self.cell(next)
    }

    /// In-bounds orthogonal neighbours of `cell` in [`Direction::ALL`] order.
    #[must_use]
    pub fn neighbors(&self, cell: Cell) -> Neighbors {
        let mut neighbors = Neighbors::default();
        for direction in Direction::ALL {
            if let Some(next) = self.step(cell, direction) {
                neighbors.push(next);
            }
        }
        neighbors
    }

    /// Reports whether two in-bounds cells share an edge.
    #[must_use]
    pub fn are_adjacent(&self, a: Cell, b: Cell) -> bool {
        self.contains(a) && self.contains(b) && self.manhattan_distance(a, b) == 1
    }

    /// Direction leading from `from` to an adjacent `to`.
    #[must_use]
    pub fn direction_between(&self, from: Cell, to: Cell) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| self.step(from, *direction) == Some(to))
    }

    /// Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan_distance(&self, a: Cell, b: Cell) -> u32 {
        self.coord(a).manhattan_distance(self.coord(b))
    }
}

/// Fixed-capacity iterator over up to four neighbouring cells.
#[derive(Clone, Debug, Default)]
pub struct Neighbors {
    buffer: [Option<Cell>; 4],
    len: usize,
    cursor: usize,
}

impl Neighbors {
    fn push(&mut self, cell: Cell) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(cell);
            self.len += 1;
        }
    }
}

impl Iterator for Neighbors {
    type Item = Cell;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

/// Lifecycle status of a game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    /// The game is initialised but not advancing.
    #[default]
    Paused,
    /// Ticks advance the game.
    Playing,
    /// The snake collided or the planner failed irrecoverably. Terminal.
    GameOver,
    /// The snake fills the whole board. Terminal.
    Complete,
}

impl GameStatus {
    /// Reports whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Complete)
    }
}

/// Kind of collision detected by the collision oracle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionKind {
    /// The move leaves the board.
    Wall,
    /// The move enters a cell occupied by the snake's own body.
    SelfCollision,
}

/// Reason a game ended, as recorded through [`Command::Finish`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FinishReason {
    /// The snake collided; transitions to [`GameStatus::GameOver`].
    Collision(CollisionKind),
    /// Neither the plan nor the cycle fallback produced a usable cell.
    InvalidPlan,
    /// Every cell is covered by the snake; transitions to [`GameStatus::Complete`].
    BoardFilled,
}

impl FinishReason {
    /// Terminal status implied by the reason.
    #[must_use]
    pub const fn status(self) -> GameStatus {
        match self {
            Self::Collision(_) | Self::InvalidPlan => GameStatus::GameOver,
            Self::BoardFilled => GameStatus::Complete,
        }
    }
}

/// Outcome of a single tick, carried next to the resulting state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickResult {
    /// The snake advanced one cell without eating.
    Valid,
    /// The snake advanced onto the fruit and grew.
    AteFruit,
    /// The board is full; the game transitioned to [`GameStatus::Complete`].
    GameComplete,
    /// The planned move collided; the game transitioned to [`GameStatus::GameOver`].
    Collision {
        /// Kind of collision detected.
        kind: CollisionKind,
        /// Planner reason attached to the fatal move.
        reason: String,
    },
    /// No usable move could be derived; the game transitioned to [`GameStatus::GameOver`].
    InvalidPlan {
        /// Human-readable explanation.
        reason: String,
    },
    /// The tick was requested while the game was not playing. State unchanged.
    NotRunning,
    /// The planner itself failed. State unchanged.
    PlannerFailed(PlanError),
}

impl TickResult {
    /// Reports whether the tick moved the game into a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::GameComplete | Self::Collision { .. } | Self::InvalidPlan { .. }
        )
    }

    /// Reports whether the tick produced a new state without failing.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Valid | Self::AteFruit | Self::GameComplete)
    }
}

/// Visualisation aid recorded with every successful tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannerTrace {
    /// Cells the planner expects to visit after the current head.
    pub planned_path: Arc<[Cell]>,
    /// Edge taken when the last move was a shortcut.
    pub shortcut_edge: Option<(Cell, Cell)>,
}

impl PlannerTrace {
    /// Builds a trace from an owned path.
    #[must_use]
    pub fn new(planned_path: Vec<Cell>, shortcut_edge: Option<(Cell, Cell)>) -> Self {
        Self {
            planned_path: Arc::from(planned_path),
            shortcut_edge,
        }
    }
}

impl Default for PlannerTrace {
    fn default() -> Self {
        Self::new(Vec::new(), None)
    }
}

/// Commands that express all permissible game-state mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests a transition between [`GameStatus::Paused`] and [`GameStatus::Playing`].
    ///
    /// Terminal targets and transitions out of terminal states are ignored.
    SetStatus {
        /// Desired status.
        status: GameStatus,
    },
    /// Moves the head onto `to`, growing when `to` holds the fruit.
    AdvanceSnake {
        /// Destination cell; must be a validated, collision-free neighbour.
        to: Cell,
        /// Whether the move was a planner shortcut.
        shortcut: bool,
    },
    /// Installs a freshly spawned fruit, or clears it when the board is full.
    PlaceFruit {
        /// Fruit location.
        cell: Option<Cell>,
    },
    /// Stores the planner's visualisation trace.
    RecordPlan {
        /// Trace to store.
        trace: PlannerTrace,
    },
    /// Ends the game for the provided reason.
    Finish {
        /// Why the game ended.
        reason: FinishReason,
    },
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the snake's head moved between two cells.
    SnakeAdvanced {
        /// Head before the move.
        from: Cell,
        /// Head after the move.
        to: Cell,
        /// Whether the snake grew.
        grew: bool,
        /// Whether the move was a shortcut.
        shortcut: bool,
    },
    /// Confirms that the fruit was eaten.
    FruitConsumed {
        /// Cell that held the fruit.
        cell: Cell,
        /// Points awarded.
        points: u64,
    },
    /// Confirms that a fruit was placed on the board.
    FruitPlaced {
        /// Cell now holding the fruit.
        cell: Cell,
    },
    /// Announces a status transition.
    StatusChanged {
        /// Status before the transition.
        from: GameStatus,
        /// Status after the transition.
        to: GameStatus,
    },
}
