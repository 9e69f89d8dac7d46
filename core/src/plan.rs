use thiserror::Error;

use crate::Cell;

/// Move chosen by a planning strategy together with its explanation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanResult {
    /// Cell the head should enter next.
    pub next_move: Cell,
    /// Whether the move leaves the Hamiltonian cycle.
    pub is_shortcut: bool,
    /// Human-readable justification.
    pub reason: String,
    /// Cells the strategy expects to visit after `next_move`'s predecessor.
    pub planned_path: Vec<Cell>,
    /// Edge taken by a shortcut, from the current head to `next_move`.
    pub shortcut_edge: Option<(Cell, Cell)>,
    /// Strategy-specific diagnostics.
    pub meta: PlanMeta,
}

impl PlanResult {
    /// Creates a non-shortcut plan with an empty path.
    #[must_use]
    pub fn new(next_move: Cell, reason: impl Into<String>, meta: PlanMeta) -> Self {
        Self {
            next_move,
            is_shortcut: false,
            reason: reason.into(),
            planned_path: Vec::new(),
            shortcut_edge: None,
            meta,
        }
    }

    /// Attaches the expected path.
    #[must_use]
    pub fn with_path(mut self, planned_path: Vec<Cell>) -> Self {
        self.planned_path = planned_path;
        self
    }

    /// Marks the plan as a shortcut leaving `from`.
    #[must_use]
    pub fn as_shortcut(mut self, from: Cell) -> Self {
        self.is_shortcut = true;
        self.shortcut_edge = Some((from, self.next_move));
        self
    }
}

/// Diagnostics attached to a [`PlanResult`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlanMeta {
    /// Registry name of the strategy that produced the plan.
    pub strategy: &'static str,
    /// Search nodes expanded while planning.
    pub nodes_expanded: u32,
    /// Cycle steps the head may take before reaching the buffered tail.
    pub safe_window: Option<u32>,
    /// Forward cycle distance from head to tail.
    pub tail_distance: Option<u32>,
    /// Forward cycle jump of the chosen shortcut.
    pub forward_jump: Option<u32>,
    /// Whether the strategy fell back to a secondary rule.
    pub fallback: bool,
}

impl PlanMeta {
    /// Empty diagnostics for the named strategy.
    #[must_use]
    pub fn for_strategy(strategy: &'static str) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

/// Errors surfaced by the planner manager and its strategies.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlanError {
    /// No strategy is registered under the requested name.
    #[error("unknown strategy '{name}'")]
    UnknownStrategy {
        /// Requested name.
        name: String,
    },
    /// A plan was requested before any strategy was selected.
    #[error("no strategy selected")]
    NoActiveStrategy,
    /// The strategy could not work with the provided state.
    #[error("strategy '{strategy}' failed: {reason}")]
    StrategyFailed {
        /// Strategy that failed.
        strategy: &'static str,
        /// Explanation.
        reason: String,
    },
}
