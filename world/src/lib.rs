#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative game state for the snake autopilot.
//!
//! A [`GameState`] is a cheap-to-clone snapshot: the configuration and the
//! Hamiltonian cycle are shared handles, and the snake body is copied only
//! when a shared snapshot is advanced. All mutation flows through [`apply`],
//! which executes a [`Command`] and reports what changed as [`Event`] values.

mod cycle;
mod fruit;
mod navigation;
mod snake;

use std::sync::Arc;

use log::{debug, info, warn};
use snake_autopilot_core::{
    Cell, CollisionKind, Command, ConfigError, Direction, Event, GameConfig, GameStatus, Grid,
    Lcg, PlannerTrace,
};
use thiserror::Error;

pub use cycle::HamiltonianCycle;
pub use fruit::spawn_fruit;
pub use navigation::NavigationField;
pub use snake::{Snake, SnakeError};

/// Snapshot of a single game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    config: Arc<GameConfig>,
    cycle: HamiltonianCycle,
    snake: Snake,
    fruit: Option<Cell>,
    moves: u64,
    score: u64,
    status: GameStatus,
    last_move_was_shortcut: bool,
    planner: PlannerTrace,
}

impl GameState {
    /// Assembles a paused state from an explicit body (head first) and fruit.
    ///
    /// Intended for scenarios and tests that need a specific position; games
    /// normally start from [`initialize_game`].
    pub fn from_parts(
        config: GameConfig,
        body: &[Cell],
        fruit: Option<Cell>,
    ) -> Result<Self, StateError> {
        let grid = config.validate()?;
        let cycle = HamiltonianCycle::build(grid)?;
        let snake = Snake::from_cells(body, grid.cell_count())?;

        for pair in body.windows(2) {
            if !grid.are_adjacent(pair[0], pair[1]) {
                return Err(StateError::Disjoint {
                    from: pair[0],
                    to: pair[1],
                });
            }
        }

        match fruit {
            Some(cell) if !grid.contains(cell) => return Err(StateError::FruitOutOfBounds { cell }),
            Some(cell) if snake.is_occupied(cell) => return Err(StateError::FruitOnSnake { cell }),
            None if snake.len() < grid.cell_count() => return Err(StateError::MissingFruit),
            _ => {}
        }

        Ok(Self {
            config: Arc::new(config),
            cycle,
            snake,
            fruit,
            moves: 0,
            score: 0,
            status: GameStatus::Paused,
            last_move_was_shortcut: false,
            planner: PlannerTrace::default(),
        })
    }

    /// Configuration the game was started with.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Board dimensions.
    #[must_use]
    pub fn grid(&self) -> Grid {
        self.cycle.grid()
    }

    /// Hamiltonian cycle shared by every snapshot of the game.
    #[must_use]
    pub fn cycle(&self) -> &HamiltonianCycle {
        &self.cycle
    }

    /// Current snake body.
    #[must_use]
    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    /// Cell holding the fruit, absent only when the board is full.
    #[must_use]
    pub fn fruit(&self) -> Option<Cell> {
        self.fruit
    }

    /// Successful ticks so far.
    #[must_use]
    pub fn moves(&self) -> u64 {
        self.moves
    }

    /// Accumulated score.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Lifecycle status.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Whether the most recent move left the cycle.
    #[must_use]
    pub fn last_move_was_shortcut(&self) -> bool {
        self.last_move_was_shortcut
    }

    /// Visualisation trace recorded by the most recent tick.
    #[must_use]
    pub fn planner(&self) -> &PlannerTrace {
        &self.planner
    }

    /// Cell occupied by the snake's head.
    #[must_use]
    pub fn head(&self) -> Cell {
        self.snake.head()
    }

    /// Number of cells not covered by the snake.
    #[must_use]
    pub fn free_cells(&self) -> usize {
        self.cycle.len().saturating_sub(self.snake.len())
    }

    /// Reports whether the snake covers every cell.
    #[must_use]
    pub fn is_board_full(&self) -> bool {
        self.snake.len() >= self.cycle.len()
    }
}

/// Reasons a hand-assembled state is inconsistent.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StateError {
    /// The configuration does not describe a playable board.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The body is malformed.
    #[error(transparent)]
    Snake(#[from] SnakeError),
    /// Consecutive body segments do not share an edge.
    #[error("segments {from} and {to} are not adjacent")]
    Disjoint {
        /// Earlier segment.
        from: Cell,
        /// Later segment.
        to: Cell,
    },
    /// The fruit lies outside the board.
    #[error("fruit {cell} lies outside the board")]
    FruitOutOfBounds {
        /// Offending fruit cell.
        cell: Cell,
    },
    /// The fruit lies on the snake.
    #[error("fruit {cell} lies on the snake")]
    FruitOnSnake {
        /// Offending fruit cell.
        cell: Cell,
    },
    /// No fruit was provided although free cells remain.
    #[error("a fruit is required while free cells remain")]
    MissingFruit,
}

/// Creates the opening state of a game.
///
/// The snake starts with a single segment at cycle position zero, the fruit is
/// drawn from `rng`, and the game waits in [`GameStatus::Paused`].
pub fn initialize_game(config: &GameConfig, rng: &mut Lcg) -> Result<GameState, ConfigError> {
    let grid = config.validate()?;
    let cycle = HamiltonianCycle::build(grid)?;
    let snake = Snake::new(cycle.cell_at(0), cycle.len());
    let fruit = spawn_fruit(&snake, cycle.len(), rng);

    info!(
        "initialised {}x{} game with {} (seed {})",
        grid.rows(),
        grid.columns(),
        config.algorithm,
        config.seed
    );

    Ok(GameState {
        config: Arc::new(config.clone()),
        cycle,
        snake,
        fruit,
        moves: 0,
        score: 0,
        status: GameStatus::Paused,
        last_move_was_shortcut: false,
        planner: PlannerTrace::default(),
    })
}

/// Returns a copy of `state` with the requested status applied.
///
/// Only transitions between [`GameStatus::Paused`] and [`GameStatus::Playing`]
/// take effect; everything else returns an unchanged copy.
#[must_use]
pub fn set_status(state: &GameState, status: GameStatus) -> GameState {
    let mut next = state.clone();
    let mut events = Vec::new();
    apply(&mut next, Command::SetStatus { status }, &mut events);
    next
}

/// Classifies what would happen if the head entered `cell`.
#[must_use]
pub fn check_collision(state: &GameState, cell: Cell) -> Option<CollisionKind> {
    if !state.grid().contains(cell) {
        return Some(CollisionKind::Wall);
    }
    let will_eat = state.fruit == Some(cell);
    state
        .snake
        .would_collide(cell, will_eat)
        .then_some(CollisionKind::SelfCollision)
}

/// Classifies a step of the head in `direction`.
#[must_use]
pub fn check_step(state: &GameState, direction: Direction) -> Option<CollisionKind> {
    match state.grid().step(state.head(), direction) {
        Some(cell) => check_collision(state, cell),
        None => Some(CollisionKind::Wall),
    }
}

/// Applies the provided command to the game, mutating state deterministically.
pub fn apply(state: &mut GameState, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetStatus { status } => {
            let from = state.status;
            if from.is_terminal() || status.is_terminal() || from == status {
                return;
            }
            state.status = status;
            out_events.push(Event::StatusChanged { from, to: status });
        }
        Command::AdvanceSnake { to, shortcut } => {
            if state.status.is_terminal() || !state.grid().contains(to) {
                warn!("ignoring advance to {to} in status {:?}", state.status);
                return;
            }

            let from = state.head();
            let grew = state.fruit == Some(to);
            state.snake.advance(to, grew);
            state.moves = state.moves.saturating_add(1);
            state.last_move_was_shortcut = shortcut;
            out_events.push(Event::SnakeAdvanced {
                from,
                to,
                grew,
                shortcut,
            });

            if grew {
                let bonus = if shortcut {
                    state.config.shortcut_bonus
                } else {
                    0
                };
                let points = state.config.score_per_fruit.saturating_add(bonus);
                state.score = state.score.saturating_add(points);
                state.fruit = None;
                out_events.push(Event::FruitConsumed { cell: to, points });
            }
        }
        Command::PlaceFruit { cell } => match cell {
            Some(cell) if state.grid().contains(cell) && !state.snake.is_occupied(cell) => {
                state.fruit = Some(cell);
                out_events.push(Event::FruitPlaced { cell });
            }
            Some(cell) => warn!("refusing to place fruit on {cell}"),
            None => state.fruit = None,
        },
        Command::RecordPlan { trace } => {
            state.planner = trace;
        }
        Command::Finish { reason } => {
            let from = state.status;
            if from.is_terminal() {
                return;
            }
            let to = reason.status();
            state.status = to;
            out_events.push(Event::StatusChanged { from, to });
            if to == GameStatus::Complete {
                info!("board filled after {} moves", state.moves);
            } else {
                debug!("game over after {} moves: {reason:?}", state.moves);
            }
        }
    }
}

/// Query functions that provide read-only access to the game state.
pub mod query {
    use serde::Serialize;
    use snake_autopilot_core::GameStatus;

    use super::GameState;

    /// Summary figures for overlays and reports.
    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct Stats {
        /// Successful ticks so far.
        pub moves: u64,
        /// Snake length.
        pub length: usize,
        /// Accumulated score.
        pub score: u64,
        /// Cells not covered by the snake.
        pub free: usize,
        /// Forward cycle distance from head to fruit, absent when no fruit exists.
        pub dist_head_apple: Option<usize>,
        /// Forward cycle distance from head to tail.
        pub dist_head_tail: usize,
        /// Whether the last move was a shortcut.
        pub shortcut: bool,
        /// Fruit eaten per move, zero before the first move.
        pub efficiency: f64,
        /// Lifecycle status.
        pub status: GameStatus,
    }

    /// Computes the summary figures of `state`.
    #[must_use]
    pub fn stats(state: &GameState) -> Stats {
        let head = state.head();
        let cycle = state.cycle();
        let length = state.snake().len();
        let efficiency = if state.moves() == 0 {
            0.0
        } else {
            (length - 1) as f64 / state.moves() as f64
        };

        Stats {
            moves: state.moves(),
            length,
            score: state.score(),
            free: state.free_cells(),
            dist_head_apple: state.fruit().and_then(|fruit| cycle.distance(head, fruit)),
            dist_head_tail: cycle.distance(head, state.snake().tail()).unwrap_or(0),
            shortcut: state.last_move_was_shortcut(),
            efficiency,
            status: state.status(),
        }
    }

    /// Cells of the snake from head to tail.
    #[must_use]
    pub fn body(state: &GameState) -> Vec<snake_autopilot_core::Cell> {
        state.snake().body().collect()
    }
}
