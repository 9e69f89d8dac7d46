#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic tick engine that advances a game by one planned move.
//!
//! [`tick`] asks the planner for a move, validates it, runs the collision
//! oracle and expresses the outcome as world commands. [`tick`] consumes the
//! previous snapshot; callers that need to keep it clone it first, which
//! leaves the clone untouched. [`advance`] mutates a snapshot in place.

use log::{debug, info, warn};
use snake_autopilot_core::{
    Cell, CollisionKind, Command, ConfigError, Event, FinishReason, GameConfig, GameStatus, Lcg,
    PlanError, PlanResult, PlannerTrace, TickResult,
};
use snake_autopilot_system_planning::{PlanOptions, PlannerManager};
use snake_autopilot_world::{
    self as world, check_collision, initialize_game, spawn_fruit, GameState,
};
use thiserror::Error;

/// State produced by a tick together with its outcome.
#[derive(Clone, Debug)]
pub struct Tick {
    /// Snapshot after the tick; identical to the input when nothing advanced.
    pub state: GameState,
    /// What happened.
    pub result: TickResult,
    /// World events emitted while applying the tick.
    pub events: Vec<Event>,
}

/// Advances `state` by one move chosen by the active strategy of `manager`.
///
/// Fruit respawns draw from `rng`. Errors never escape as `Err`: they are
/// reported through [`TickResult`], and the state is either fully advanced or
/// returned untouched.
pub fn tick(state: GameState, manager: &mut PlannerManager, rng: &mut Lcg) -> Tick {
    let mut state = state;
    let mut events = Vec::new();
    let result = advance(&mut state, manager, rng, &mut events);
    Tick {
        state,
        result,
        events,
    }
}

/// Advances `state` in place, appending world events to `out_events`.
///
/// A state that is not shared with other snapshots moves its snake without
/// copying the body. `NotRunning` and `PlannerFailed` leave `state` untouched.
pub fn advance(
    state: &mut GameState,
    manager: &mut PlannerManager,
    rng: &mut Lcg,
    out_events: &mut Vec<Event>,
) -> TickResult {
    if state.status() != GameStatus::Playing {
        return TickResult::NotRunning;
    }

    if state.is_board_full() {
        finish(state, FinishReason::BoardFilled, out_events);
        return TickResult::GameComplete;
    }

    let options = PlanOptions::from_config(state.config());
    let plan = match manager.plan(state, &options) {
        Ok(plan) => plan,
        Err(error) => {
            warn!("planner failed: {error}");
            return TickResult::PlannerFailed(error);
        }
    };

    let Some(step) = resolve_step(state, &plan) else {
        let reason = format!(
            "no usable move from {} (planned {})",
            state.head(),
            plan.next_move
        );
        warn!("{reason}");
        finish(state, FinishReason::InvalidPlan, out_events);
        return TickResult::InvalidPlan { reason };
    };

    let collision = if step.to == state.head() {
        Some(CollisionKind::SelfCollision)
    } else {
        check_collision(state, step.to)
    };
    if let Some(kind) = collision {
        debug!(
            "collision {kind:?} moving {} -> {}: {}",
            state.head(),
            step.to,
            plan.reason
        );
        finish(state, FinishReason::Collision(kind), out_events);
        return TickResult::Collision {
            kind,
            reason: plan.reason,
        };
    }

    let emitted = out_events.len();
    world::apply(
        state,
        Command::AdvanceSnake {
            to: step.to,
            shortcut: step.shortcut,
        },
        out_events,
    );
    let ate = out_events[emitted..]
        .iter()
        .any(|event| matches!(event, Event::FruitConsumed { .. }));

    let trace = if step.substituted {
        PlannerTrace::default()
    } else {
        PlannerTrace::new(plan.planned_path, plan.shortcut_edge)
    };
    world::apply(state, Command::RecordPlan { trace }, out_events);

    if !ate {
        return TickResult::Valid;
    }

    let fruit = spawn_fruit(state.snake(), state.cycle().len(), rng);
    world::apply(state, Command::PlaceFruit { cell: fruit }, out_events);
    if fruit.is_none() {
        finish(state, FinishReason::BoardFilled, out_events);
        return TickResult::GameComplete;
    }

    TickResult::AteFruit
}

#[derive(Clone, Copy, Debug)]
struct Step {
    to: Cell,
    shortcut: bool,
    substituted: bool,
}

/// Accepts the planned cell when it is the head or one of its neighbours,
/// otherwise substitutes the cycle successor of the head.
fn resolve_step(state: &GameState, plan: &PlanResult) -> Option<Step> {
    let grid = state.grid();
    let head = state.head();
    let planned = plan.next_move;
    if grid.contains(planned) && (planned == head || grid.are_adjacent(head, planned)) {
        return Some(Step {
            to: planned,
            shortcut: plan.is_shortcut,
            substituted: false,
        });
    }

    warn!("planned move {head} -> {planned} is not a step; following cycle");
    let follow = state.cycle().next(head)?;
    grid.are_adjacent(head, follow).then_some(Step {
        to: follow,
        shortcut: false,
        substituted: true,
    })
}

fn finish(state: &mut GameState, reason: FinishReason, events: &mut Vec<Event>) {
    world::apply(state, Command::Finish { reason }, events);
}

/// Errors raised while preparing a game.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InitError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The configured algorithm has no registered strategy.
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Planner manager and random stream driving a single game.
#[derive(Debug)]
pub struct Engine {
    manager: PlannerManager,
    rng: Lcg,
}

impl Engine {
    /// Creates an engine seeded from `config` and the opening state of its game.
    pub fn new(config: &GameConfig) -> Result<(Self, GameState), InitError> {
        let mut engine = Self {
            manager: PlannerManager::with_default_strategies(),
            rng: Lcg::new(config.seed),
        };
        let state = engine.restart(config)?;
        Ok((engine, state))
    }

    /// Reseeds the random stream, reselects the strategy and returns a fresh
    /// opening state for `config`.
    pub fn restart(&mut self, config: &GameConfig) -> Result<GameState, InitError> {
        self.rng.reseed(config.seed);
        self.manager.select_algorithm(config.algorithm)?;
        self.manager.invalidate();
        let state = initialize_game(config, &mut self.rng)?;
        info!("engine ready with {}", config.algorithm);
        Ok(state)
    }

    /// Advances `state` by one tick.
    pub fn tick(&mut self, state: GameState) -> Tick {
        tick(state, &mut self.manager, &mut self.rng)
    }

    /// Advances `state` in place by one tick. See [`crate::advance`].
    pub fn advance(&mut self, state: &mut GameState, out_events: &mut Vec<Event>) -> TickResult {
        advance(state, &mut self.manager, &mut self.rng, out_events)
    }

    /// Planner manager driving the game.
    #[must_use]
    pub fn manager(&self) -> &PlannerManager {
        &self.manager
    }

    /// Mutable access to the planner manager, for switching strategies mid-game.
    pub fn manager_mut(&mut self) -> &mut PlannerManager {
        &mut self.manager
    }

    /// Random stream used for fruit placement.
    #[must_use]
    pub fn rng(&self) -> &Lcg {
        &self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snake_autopilot_core::PlanMeta;
    use snake_autopilot_system_planning::Strategy;
    use snake_autopilot_world::set_status;

    #[derive(Debug)]
    struct Fixed(Cell);

    impl Strategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn plan(&mut self, _state: &GameState, _options: &PlanOptions) -> Result<PlanResult, PlanError> {
            Ok(PlanResult::new(self.0, "fixed", PlanMeta::for_strategy("fixed")))
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl Strategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn plan(&mut self, _state: &GameState, _options: &PlanOptions) -> Result<PlanResult, PlanError> {
            Err(PlanError::StrategyFailed {
                strategy: "failing",
                reason: "always".to_owned(),
            })
        }
    }

    fn manager_with(strategy: Box<dyn Strategy>) -> PlannerManager {
        let name = strategy.name();
        let mut manager = PlannerManager::new();
        manager.register(strategy);
        manager.select(name).expect("registered");
        manager
    }

    fn playing(body: &[u32], fruit: Option<u32>) -> GameState {
        let body: Vec<Cell> = body.iter().copied().map(Cell::new).collect();
        let state = GameState::from_parts(GameConfig::new(4, 4), &body, fruit.map(Cell::new))
            .expect("valid state");
        set_status(&state, GameStatus::Playing)
    }

    #[test]
    fn paused_games_do_not_advance() {
        let state = set_status(&playing(&[0], Some(5)), GameStatus::Paused);
        let mut manager = PlannerManager::with_default_strategies();
        let mut rng = Lcg::new(1);

        let outcome = tick(state.clone(), &mut manager, &mut rng);
        assert_eq!(outcome.result, TickResult::NotRunning);
        assert_eq!(outcome.state, state);
    }

    #[test]
    fn advancing_in_place_matches_tick() {
        let mut state = playing(&[0], Some(4));
        let mut tick_manager = PlannerManager::with_default_strategies();
        tick_manager.select("hamiltonian").expect("registered");
        let mut advance_manager = PlannerManager::with_default_strategies();
        advance_manager.select("hamiltonian").expect("registered");
        let mut tick_rng = Lcg::new(7);
        let mut advance_rng = Lcg::new(7);

        for _ in 0..6 {
            let expected = tick(state.clone(), &mut tick_manager, &mut tick_rng);
            let mut events = Vec::new();
            let result = advance(&mut state, &mut advance_manager, &mut advance_rng, &mut events);

            assert_eq!(result, expected.result);
            assert_eq!(events, expected.events);
            assert_eq!(state, expected.state);
        }
        assert_eq!(state.moves(), 6);
    }

    #[test]
    fn out_of_range_plans_follow_the_cycle() {
        let state = playing(&[0], Some(10));
        let mut manager = manager_with(Box::new(Fixed(Cell::new(99))));
        let mut rng = Lcg::new(1);

        let outcome = tick(state.clone(), &mut manager, &mut rng);
        assert_eq!(outcome.result, TickResult::Valid);
        assert_eq!(Some(outcome.state.head()), state.cycle().next(state.head()));
        assert!(!outcome.state.last_move_was_shortcut());
    }

    #[test]
    fn non_adjacent_plans_follow_the_cycle() {
        let state = playing(&[0], Some(10));
        let mut manager = manager_with(Box::new(Fixed(Cell::new(5))));
        let mut rng = Lcg::new(1);

        let outcome = tick(state, &mut manager, &mut rng);
        assert_eq!(outcome.result, TickResult::Valid);
        assert_eq!(outcome.state.head(), Cell::new(1));
    }

    #[test]
    fn staying_in_place_is_a_self_collision() {
        let state = playing(&[0], Some(10));
        let mut manager = manager_with(Box::new(Fixed(Cell::new(0))));
        let mut rng = Lcg::new(1);

        let outcome = tick(state, &mut manager, &mut rng);
        assert_eq!(
            outcome.result,
            TickResult::Collision {
                kind: CollisionKind::SelfCollision,
                reason: "fixed".to_owned()
            }
        );
        assert_eq!(outcome.state.status(), GameStatus::GameOver);
        assert_eq!(outcome.state.moves(), 0);
    }

    #[test]
    fn entering_the_body_ends_the_game() {
        let state = playing(&[5, 1, 0, 4, 8], Some(15));
        let mut manager = manager_with(Box::new(Fixed(Cell::new(4))));
        let mut rng = Lcg::new(1);

        let outcome = tick(state, &mut manager, &mut rng);
        assert!(matches!(
            outcome.result,
            TickResult::Collision {
                kind: CollisionKind::SelfCollision,
                ..
            }
        ));
        assert!(outcome.result.is_terminal());
        assert_eq!(
            outcome.events,
            vec![Event::StatusChanged {
                from: GameStatus::Playing,
                to: GameStatus::GameOver
            }]
        );
    }

    #[test]
    fn planner_failures_leave_the_state_untouched() {
        let state = playing(&[0], Some(10));
        let mut manager = manager_with(Box::new(Failing));
        let mut rng = Lcg::new(1);

        let outcome = tick(state.clone(), &mut manager, &mut rng);
        assert!(matches!(outcome.result, TickResult::PlannerFailed(_)));
        assert_eq!(outcome.state, state);
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn eating_scores_and_respawns() {
        let state = playing(&[0], Some(1));
        let mut manager = manager_with(Box::new(Fixed(Cell::new(1))));
        let mut rng = Lcg::new(1);

        let outcome = tick(state, &mut manager, &mut rng);
        assert_eq!(outcome.result, TickResult::AteFruit);
        assert_eq!(outcome.state.score(), 10);
        assert_eq!(outcome.state.snake().len(), 2);
        let fruit = outcome.state.fruit().expect("respawned");
        assert!(!outcome.state.snake().is_occupied(fruit));
        assert!(outcome
            .events
            .iter()
            .any(|event| matches!(event, Event::FruitPlaced { .. })));
    }

    #[test]
    fn eating_the_last_fruit_completes_the_game() {
        // 4x4 cycle: 0 1 2 3 7 6 5 9 10 11 15 14 13 12 8 4.
        let body = [12, 13, 14, 15, 11, 10, 9, 5, 6, 7, 3, 2, 1, 0, 4];
        let state = playing(&body, Some(8));
        let mut manager = PlannerManager::with_default_strategies();
        manager.select("hamiltonian").expect("registered");
        let mut rng = Lcg::new(1);

        let outcome = tick(state, &mut manager, &mut rng);
        assert_eq!(outcome.result, TickResult::GameComplete);
        assert_eq!(outcome.state.status(), GameStatus::Complete);
        assert_eq!(outcome.state.fruit(), None);
        assert_eq!(outcome.state.snake().len(), 16);

        let after = tick(outcome.state, &mut manager, &mut rng);
        assert_eq!(after.result, TickResult::NotRunning);
    }

    #[test]
    fn engine_restart_reseeds_the_stream() {
        let config = GameConfig::new(6, 6).with_seed(9);
        let (mut engine, first) = Engine::new(&config).expect("valid config");
        assert_eq!(engine.manager().active_name(), Some("hamiltonian-shortcuts"));

        let mut state = set_status(&first, GameStatus::Playing);
        for _ in 0..10 {
            state = engine.tick(state).state;
        }
        let second = engine.restart(&config).expect("valid config");
        assert_eq!(first, second);
        assert_eq!(
            Engine::new(&GameConfig::new(3, 3)).map(|(_, state)| state.moves()),
            Err(InitError::Config(ConfigError::InvalidBoard {
                rows: 3,
                cols: 3,
                defect: snake_autopilot_core::BoardDefect::BothOdd
            }))
        );
    }
}
