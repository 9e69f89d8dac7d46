use log::{debug, info};
use snake_autopilot_core::{Algorithm, Grid, PlanError, PlanResult};
use snake_autopilot_world::GameState;

use crate::{AStar, Bfs, HamiltonianFollow, HamiltonianShortcuts, PlanOptions, Strategy};

/// Registry of strategies by name with a single active selection.
///
/// The manager re-initialises the active strategy whenever the selection or
/// the board changes. Each such change bumps [`PlannerManager::generation`],
/// which lets hosts discard plans computed for an outdated configuration.
#[derive(Debug, Default)]
pub struct PlannerManager {
    strategies: Vec<Box<dyn Strategy>>,
    active: Option<usize>,
    board: Option<Grid>,
    generation: u64,
}

impl PlannerManager {
    /// Creates a manager with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager with every built-in strategy registered and none selected.
    #[must_use]
    pub fn with_default_strategies() -> Self {
        let mut manager = Self::new();
        manager.register(Box::new(HamiltonianFollow));
        manager.register(Box::new(HamiltonianShortcuts));
        manager.register(Box::new(AStar::default()));
        manager.register(Box::new(Bfs::default()));
        manager
    }

    /// Adds a strategy, replacing any previously registered under the same name.
    pub fn register(&mut self, strategy: Box<dyn Strategy>) {
        let name = strategy.name();
        match self.index_of(name) {
            Some(index) => {
                self.strategies[index] = strategy;
                if self.active == Some(index) {
                    self.board = None;
                    self.bump();
                }
            }
            None => self.strategies.push(strategy),
        }
    }

    /// Names of the registered strategies in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.iter().map(|strategy| strategy.name())
    }

    /// Activates the strategy registered under `name`.
    pub fn select(&mut self, name: &str) -> Result<(), PlanError> {
        let index = self
            .index_of(name)
            .ok_or_else(|| PlanError::UnknownStrategy {
                name: name.to_owned(),
            })?;
        if self.active != Some(index) {
            self.active = Some(index);
            self.board = None;
            self.bump();
            info!("planner switched to {name}");
        }
        Ok(())
    }

    /// Activates the strategy implementing `algorithm`.
    pub fn select_algorithm(&mut self, algorithm: Algorithm) -> Result<(), PlanError> {
        self.select(algorithm.as_str())
    }

    /// Name of the active strategy.
    #[must_use]
    pub fn active_name(&self) -> Option<&'static str> {
        self.active_strategy().map(|strategy| strategy.name())
    }

    /// Whether the active strategy is marked as expensive.
    #[must_use]
    pub fn is_expensive(&self) -> bool {
        self.active_strategy()
            .map_or(false, |strategy| strategy.is_expensive())
    }

    /// Counter bumped whenever previously computed plans become stale.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forces the active strategy to re-initialise before its next plan.
    pub fn invalidate(&mut self) {
        self.board = None;
        self.bump();
    }

    /// Forwards a plan request to the active strategy.
    pub fn plan(&mut self, state: &GameState, options: &PlanOptions) -> Result<PlanResult, PlanError> {
        let index = self.active.ok_or(PlanError::NoActiveStrategy)?;
        let grid = state.grid();

        if self.board != Some(grid) {
            if self.board.is_some() {
                self.bump();
            }
            self.strategies[index].initialize(state.cycle());
            self.board = Some(grid);
            debug!(
                "initialised {} for {}x{} board",
                self.strategies[index].name(),
                grid.rows(),
                grid.columns()
            );
        }

        self.strategies[index].plan(state, options)
    }

    fn active_strategy(&self) -> Option<&dyn Strategy> {
        self.active
            .and_then(|index| self.strategies.get(index))
            .map(|strategy| strategy.as_ref())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.strategies
            .iter()
            .position(|strategy| strategy.name() == name)
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
