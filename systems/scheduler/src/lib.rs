#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-timestep loop that drives a game from host frame callbacks.
//!
//! Frames feed wall-clock time into an accumulator. Every whole tick interval
//! becomes an automatic task on a FIFO update queue that also carries manual
//! step requests, so ticks never interleave. Observers see the resulting
//! state after each frame, manual step and lifecycle change.

use std::{collections::VecDeque, fmt, time::Duration};

use log::{debug, info, warn};
use snake_autopilot_core::{Command, Event, GameConfig, GameStatus, TickResult};
use snake_autopilot_system_engine::{Engine, InitError};
use snake_autopilot_world::{self as world, set_status, GameState};
use thiserror::Error;

/// Upper bound on automatic ticks enqueued by a single frame.
pub const DEFAULT_MAX_TICKS_PER_FRAME: u32 = 5;

/// Identifier assigned to every queued task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Origin of a queued task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Enqueued by the accumulator.
    Auto,
    /// Requested explicitly through [`GameLoop::step`] or [`GameLoop::request_step`].
    Manual,
}

/// Why a queued task was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// The loop was stopped.
    Stopped,
    /// The loop was paused; only automatic tasks are dropped.
    Paused,
    /// The game was reset.
    Reset,
    /// The game reached a terminal status before the task ran.
    GameEnded,
    /// The planner configuration changed after the task was queued.
    StalePlanner,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Stopped => "loop stopped",
            Self::Paused => "loop paused",
            Self::Reset => "game reset",
            Self::GameEnded => "game ended",
            Self::StalePlanner => "planner changed",
        };
        f.write_str(text)
    }
}

/// Errors reported for queued tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LoopError {
    /// The task was dropped before it ran.
    #[error("task cancelled: {reason}")]
    Cancelled {
        /// Why the task was dropped.
        reason: CancelReason,
    },
}

/// Resolution of a queued task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Task identifier.
    pub id: TaskId,
    /// Task origin.
    pub kind: TaskKind,
    /// Tick outcome, or why the task never ran.
    pub result: Result<TickResult, LoopError>,
}

/// Summary of a single frame callback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Automatic ticks enqueued by the frame.
    pub scheduled: u32,
    /// Tasks resolved during the frame, in queue order.
    pub outcomes: Vec<TaskOutcome>,
}

impl FrameReport {
    /// Number of tasks that advanced the game.
    #[must_use]
    pub fn advanced(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(&outcome.result, Ok(result) if result.is_success()))
            .count()
    }

    /// Whether any resolved task replaced the published state.
    fn changed_state(&self) -> bool {
        self.outcomes.iter().any(|outcome| {
            matches!(&outcome.result, Ok(result) if result.is_success() || result.is_terminal())
        })
    }
}

#[derive(Clone, Copy, Debug)]
struct Task {
    id: TaskId,
    kind: TaskKind,
    generation: u64,
}

type Observer = Box<dyn FnMut(&GameState)>;

/// Cooperative fixed-timestep driver around an [`Engine`].
pub struct GameLoop {
    engine: Engine,
    state: GameState,
    tick_interval: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
    last_frame: Option<Duration>,
    running: bool,
    queue: VecDeque<Task>,
    next_task: u64,
    observers: Vec<Observer>,
}

impl fmt::Debug for GameLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameLoop")
            .field("state", &self.state)
            .field("tick_interval", &self.tick_interval)
            .field("accumulator", &self.accumulator)
            .field("running", &self.running)
            .field("queued", &self.queue.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl GameLoop {
    /// Creates a paused loop for a fresh game described by `config`.
    pub fn new(config: &GameConfig) -> Result<Self, InitError> {
        let (engine, state) = Engine::new(config)?;
        Ok(Self {
            engine,
            state,
            tick_interval: config.tick_interval(),
            max_ticks_per_frame: DEFAULT_MAX_TICKS_PER_FRAME,
            accumulator: Duration::ZERO,
            last_frame: None,
            running: false,
            queue: VecDeque::new(),
            next_task: 0,
            observers: Vec::new(),
        })
    }

    /// Replaces the per-frame tick cap. A cap of zero is raised to one.
    #[must_use]
    pub fn with_max_ticks_per_frame(mut self, max_ticks: u32) -> Self {
        self.max_ticks_per_frame = max_ticks.max(1);
        self
    }

    /// Registers a callback that receives published states in tick order.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&GameState) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Latest published state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Whether frames currently advance the game.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of tasks waiting on the update queue.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    /// Engine driving the game.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable engine access, for example to switch strategies mid-game.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Moves the game to [`GameStatus::Playing`] and resumes frame processing.
    ///
    /// Terminal games stay untouched.
    pub fn start(&mut self) {
        if self.state.status().is_terminal() {
            return;
        }
        self.state = set_status(&self.state, GameStatus::Playing);
        self.running = true;
        self.last_frame = None;
        info!("loop started");
        self.notify();
    }

    /// Moves the game to [`GameStatus::Paused`] and drops queued automatic ticks.
    pub fn pause(&mut self) -> Vec<TaskOutcome> {
        self.running = false;
        self.accumulator = Duration::ZERO;
        self.last_frame = None;
        let cancelled = self.cancel_auto(CancelReason::Paused);

        self.state = set_status(&self.state, GameStatus::Paused);
        self.notify();
        cancelled
    }

    /// Processes one host frame at monotonic time `now`.
    pub fn frame(&mut self, now: Duration) -> FrameReport {
        let mut report = FrameReport::default();
        if !self.running {
            return report;
        }

        let delta = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_frame = Some(now);
        self.accumulator = self.accumulator.saturating_add(delta);

        while self.accumulator >= self.tick_interval
            && report.scheduled < self.max_ticks_per_frame
        {
            self.accumulator -= self.tick_interval;
            let _ = self.enqueue(TaskKind::Auto);
            report.scheduled += 1;
        }
        if self.accumulator >= self.tick_interval {
            debug!("dropping {:?} of tick backlog", self.accumulator);
            self.accumulator = Duration::ZERO;
        }

        report.outcomes = self.drain();
        if report.changed_state() {
            self.notify();
        }
        report
    }

    /// Queues a manual tick that runs with the next frame or step.
    pub fn request_step(&mut self) -> TaskId {
        self.enqueue(TaskKind::Manual)
    }

    /// Runs one manual tick immediately, after anything already queued.
    ///
    /// A paused game advances exactly once and returns to paused unless the
    /// tick ended it.
    pub fn step(&mut self) -> Result<TickResult, LoopError> {
        let id = self.enqueue(TaskKind::Manual);
        let outcomes = self.drain();
        self.notify();

        outcomes
            .into_iter()
            .find(|outcome| outcome.id == id)
            .map_or(
                Err(LoopError::Cancelled {
                    reason: CancelReason::GameEnded,
                }),
                |outcome| outcome.result,
            )
    }

    /// Halts frame processing and rejects every queued task.
    pub fn stop(&mut self) -> Vec<TaskOutcome> {
        self.running = false;
        self.accumulator = Duration::ZERO;
        self.last_frame = None;
        info!("loop stopped");
        self.cancel_all(CancelReason::Stopped)
    }

    /// Starts a new game for `config`, rejecting queued tasks and publishing
    /// the fresh paused state.
    pub fn reset(&mut self, config: &GameConfig) -> Result<Vec<TaskOutcome>, InitError> {
        let state = self.engine.restart(config)?;
        self.running = false;
        self.accumulator = Duration::ZERO;
        self.last_frame = None;
        self.tick_interval = config.tick_interval();
        let cancelled = self.cancel_all(CancelReason::Reset);
        self.state = state;
        self.notify();
        Ok(cancelled)
    }

    fn enqueue(&mut self, kind: TaskKind) -> TaskId {
        let id = TaskId(self.next_task);
        self.next_task += 1;
        self.queue.push_back(Task {
            id,
            kind,
            generation: self.engine.manager().generation(),
        });
        id
    }

    fn drain(&mut self) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(self.queue.len());
        while let Some(task) = self.queue.pop_front() {
            if task.generation != self.engine.manager().generation() {
                debug!("task {} queued for an outdated planner", task.id.get());
                outcomes.push(cancel(task, CancelReason::StalePlanner));
                continue;
            }

            let result = self.run(task);
            let failed = matches!(result, TickResult::PlannerFailed(_));
            outcomes.push(TaskOutcome {
                id: task.id,
                kind: task.kind,
                result: Ok(result),
            });
            if failed {
                outcomes.extend(self.cancel_auto(CancelReason::Paused));
            }

            if self.state.status().is_terminal() {
                self.running = false;
                self.accumulator = Duration::ZERO;
                info!("game finished with {:?}", self.state.status());
                outcomes.extend(self.cancel_all(CancelReason::GameEnded));
                break;
            }
        }
        outcomes
    }

    fn run(&mut self, task: Task) -> TickResult {
        let single_step =
            task.kind == TaskKind::Manual && self.state.status() == GameStatus::Paused;
        let mut events = Vec::new();
        if single_step {
            self.apply_status(GameStatus::Playing, &mut events);
        }

        let result = self.engine.advance(&mut self.state, &mut events);
        match &result {
            TickResult::PlannerFailed(error) => {
                warn!("pausing loop after planner failure: {error}");
                self.running = false;
                self.accumulator = Duration::ZERO;
                self.apply_status(GameStatus::Paused, &mut events);
            }
            TickResult::NotRunning => {}
            _ if single_step => self.apply_status(GameStatus::Paused, &mut events),
            _ => {}
        }
        result
    }

    fn apply_status(&mut self, status: GameStatus, events: &mut Vec<Event>) {
        world::apply(&mut self.state, Command::SetStatus { status }, events);
    }

    fn cancel_all(&mut self, reason: CancelReason) -> Vec<TaskOutcome> {
        let cancelled: Vec<TaskOutcome> = self
            .queue
            .drain(..)
            .map(|task| cancel(task, reason))
            .collect();
        if !cancelled.is_empty() {
            debug!("cancelled {} queued tasks: {reason}", cancelled.len());
        }
        cancelled
    }

    fn cancel_auto(&mut self, reason: CancelReason) -> Vec<TaskOutcome> {
        let mut cancelled = Vec::new();
        let mut kept = VecDeque::with_capacity(self.queue.len());
        for task in self.queue.drain(..) {
            if task.kind == TaskKind::Auto {
                cancelled.push(cancel(task, reason));
            } else {
                kept.push_back(task);
            }
        }
        self.queue = kept;
        cancelled
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer(&self.state);
        }
    }
}

fn cancel(task: Task, reason: CancelReason) -> TaskOutcome {
    TaskOutcome {
        id: task.id,
        kind: task.kind,
        result: Err(LoopError::Cancelled { reason }),
    }
}
