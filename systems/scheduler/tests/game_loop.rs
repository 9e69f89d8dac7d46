use std::{cell::RefCell, rc::Rc, time::Duration};

use snake_autopilot_core::{
    Algorithm, CollisionKind, GameConfig, GameStatus, PlanError, PlanMeta, PlanResult, TickResult,
};
use snake_autopilot_system_planning::{PlanOptions, Strategy};
use snake_autopilot_system_scheduler::{CancelReason, GameLoop, LoopError, TaskKind, TaskOutcome};
use snake_autopilot_world::GameState;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn config() -> GameConfig {
    let mut config = GameConfig::new(6, 6).with_seed(11);
    config.tick_ms = 100;
    config
}

fn recorder(game: &mut GameLoop) -> Rc<RefCell<Vec<(u64, GameStatus)>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    game.subscribe(move |state: &GameState| {
        sink.borrow_mut().push((state.moves(), state.status()));
    });
    seen
}

#[test]
fn frames_convert_elapsed_time_into_ticks() {
    let mut game = GameLoop::new(&config()).expect("valid config");
    game.start();

    assert_eq!(game.frame(ms(0)).scheduled, 0);
    let report = game.frame(ms(250));
    assert_eq!(report.scheduled, 2);
    assert_eq!(report.advanced(), 2);
    assert_eq!(game.state().moves(), 2);

    // The 50ms remainder carries into the next frame.
    assert_eq!(game.frame(ms(300)).scheduled, 1);
    assert_eq!(game.state().moves(), 3);
}

#[test]
fn long_frames_are_capped() {
    let mut game = GameLoop::new(&config())
        .expect("valid config")
        .with_max_ticks_per_frame(5);
    game.start();
    let _ = game.frame(ms(0));

    let report = game.frame(ms(2_000));
    assert_eq!(report.scheduled, 5);
    assert_eq!(game.state().moves(), 5);

    // The backlog beyond the cap is discarded rather than replayed.
    assert_eq!(game.frame(ms(2_050)).scheduled, 0);
}

#[test]
fn observers_see_one_state_per_frame_and_lifecycle_change() {
    let mut game = GameLoop::new(&config()).expect("valid config");
    let seen = recorder(&mut game);

    game.start();
    let _ = game.frame(ms(0));
    let _ = game.frame(ms(350));
    let _ = game.pause();

    assert_eq!(
        *seen.borrow(),
        vec![
            (0, GameStatus::Playing),
            (3, GameStatus::Playing),
            (3, GameStatus::Paused),
        ]
    );
}

#[test]
fn paused_loops_ignore_frames_but_allow_single_steps() {
    let mut game = GameLoop::new(&config()).expect("valid config");
    let seen = recorder(&mut game);

    assert_eq!(game.frame(ms(1_000)).scheduled, 0);
    let result = game.step().expect("step ran");
    assert!(result.is_success());
    assert_eq!(game.state().moves(), 1);
    assert_eq!(game.state().status(), GameStatus::Paused);
    assert_eq!(*seen.borrow(), vec![(1, GameStatus::Paused)]);
}

#[test]
fn manual_requests_share_the_queue_with_frames() {
    let mut game = GameLoop::new(&config()).expect("valid config");
    game.start();
    let _ = game.frame(ms(0));

    let requested = game.request_step();
    assert_eq!(game.pending_tasks(), 1);

    let report = game.frame(ms(100));
    let order: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| (outcome.id, outcome.kind))
        .collect();
    assert_eq!(order.first(), Some(&(requested, TaskKind::Manual)));
    assert_eq!(order.get(1).map(|(_, kind)| *kind), Some(TaskKind::Auto));
    assert_eq!(game.state().moves(), 2);
}

#[test]
fn stop_rejects_queued_tasks() {
    let mut game = GameLoop::new(&config()).expect("valid config");
    game.start();
    let first = game.request_step();
    let second = game.request_step();

    let cancelled = game.stop();
    assert_eq!(cancelled.len(), 2);
    assert_eq!(cancelled[0].id, first);
    assert_eq!(cancelled[1].id, second);
    assert!(cancelled.iter().all(|outcome| outcome.result
        == Err(LoopError::Cancelled {
            reason: CancelReason::Stopped
        })));
    assert!(!game.is_running());
    assert_eq!(game.pending_tasks(), 0);
    assert_eq!(game.state().moves(), 0);
}

#[test]
fn strategy_changes_cancel_stale_tasks() {
    let mut game = GameLoop::new(&config()).expect("valid config");
    let stale = game.request_step();
    game.engine_mut()
        .manager_mut()
        .select_algorithm(Algorithm::Bfs)
        .expect("registered");

    game.start();
    let report = game.frame(ms(0));
    assert_eq!(
        report.outcomes,
        vec![TaskOutcome {
            id: stale,
            kind: TaskKind::Manual,
            result: Err(LoopError::Cancelled {
                reason: CancelReason::StalePlanner
            }),
        }]
    );
    assert_eq!(game.state().moves(), 0);

    let result = game.step().expect("fresh step ran");
    assert!(result.is_success());
    assert_eq!(game.state().moves(), 1);
    assert_eq!(game.engine().manager().active_name(), Some("bfs"));
}

#[derive(Debug)]
struct Broken;

impl Strategy for Broken {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn plan(&mut self, _state: &GameState, _options: &PlanOptions) -> Result<PlanResult, PlanError> {
        Err(PlanError::StrategyFailed {
            strategy: "broken",
            reason: "unavailable".to_owned(),
        })
    }
}

#[test]
fn planner_failures_pause_the_loop() {
    let mut game = GameLoop::new(&config()).expect("valid config");
    let manager = game.engine_mut().manager_mut();
    manager.register(Box::new(Broken));
    manager.select("broken").expect("registered");

    game.start();
    let _ = game.frame(ms(0));
    let report = game.frame(ms(300));

    assert_eq!(report.outcomes.len(), 3);
    assert!(matches!(
        report.outcomes[0].result,
        Ok(TickResult::PlannerFailed(_))
    ));
    assert!(report.outcomes[1..].iter().all(|outcome| outcome.result
        == Err(LoopError::Cancelled {
            reason: CancelReason::Paused
        })));
    assert!(!game.is_running());
    assert_eq!(game.state().status(), GameStatus::Paused);
    assert_eq!(game.state().moves(), 0);
}

#[derive(Debug)]
struct StandStill;

impl Strategy for StandStill {
    fn name(&self) -> &'static str {
        "stand-still"
    }

    fn plan(&mut self, state: &GameState, _options: &PlanOptions) -> Result<PlanResult, PlanError> {
        Ok(PlanResult::new(
            state.head(),
            "stand still",
            PlanMeta::for_strategy("stand-still"),
        ))
    }
}

#[test]
fn observers_see_the_game_end() {
    let mut game = GameLoop::new(&config()).expect("valid config");
    let seen = recorder(&mut game);
    let manager = game.engine_mut().manager_mut();
    manager.register(Box::new(StandStill));
    manager.select("stand-still").expect("registered");

    game.start();
    let _ = game.frame(ms(0));
    let report = game.frame(ms(150));

    assert!(matches!(
        report.outcomes[0].result,
        Ok(TickResult::Collision {
            kind: CollisionKind::SelfCollision,
            ..
        })
    ));
    assert_eq!(report.advanced(), 0);
    assert!(!game.is_running());
    assert_eq!(game.state().status(), GameStatus::GameOver);
    assert_eq!(
        *seen.borrow(),
        vec![(0, GameStatus::Playing), (0, GameStatus::GameOver)]
    );
}

#[test]
fn paused_single_steps_report_collisions() {
    let mut game = GameLoop::new(&config()).expect("valid config");
    let seen = recorder(&mut game);
    let manager = game.engine_mut().manager_mut();
    manager.register(Box::new(StandStill));
    manager.select("stand-still").expect("registered");

    let result = game.step().expect("step ran");
    assert!(result.is_terminal());
    assert_eq!(game.state().status(), GameStatus::GameOver);
    assert_eq!(seen.borrow().last(), Some(&(0, GameStatus::GameOver)));
}

#[test]
fn terminal_games_stop_the_loop() {
    let mut config = GameConfig::new(2, 2).with_algorithm(Algorithm::Hamiltonian);
    config.tick_ms = 10;
    let mut game = GameLoop::new(&config).expect("valid config");
    game.start();
    let _ = game.frame(ms(0));

    let mut now = 0;
    while game.is_running() {
        now += 50;
        let _ = game.frame(ms(now));
        assert!(now < 10_000, "2x2 game never finished");
    }

    assert_eq!(game.state().status(), GameStatus::Complete);
    assert_eq!(game.pending_tasks(), 0);
    assert_eq!(game.step(), Ok(TickResult::NotRunning));
}

#[test]
fn reset_publishes_a_fresh_game() {
    let mut game = GameLoop::new(&config()).expect("valid config");
    let seen = recorder(&mut game);
    game.start();
    let _ = game.frame(ms(0));
    let _ = game.frame(ms(500));
    let pending = game.request_step();

    let cancelled = game.reset(&config()).expect("valid config");
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, pending);
    assert_eq!(game.state().moves(), 0);
    assert_eq!(game.state().status(), GameStatus::Paused);
    assert_eq!(seen.borrow().last(), Some(&(0, GameStatus::Paused)));
}
