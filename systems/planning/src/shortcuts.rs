use log::debug;
use snake_autopilot_core::{cyclic_distance, Cell, PlanError, PlanMeta, PlanResult};
use snake_autopilot_world::GameState;

use crate::{cycle_position, follow::follow_plan, PlanOptions, Strategy};

/// Snakes at or below this length ignore the safety buffer.
const SHORT_SNAKE_LEN: usize = 3;
/// Snakes at or below this length ignore the late-game lock.
const EARLY_GAME_LEN: usize = 5;

/// Follows the cycle but jumps ahead along it whenever a neighbouring cell is
/// closer to the fruit and the jump provably leaves room to reach the tail.
///
/// A jump only ever moves the head forward inside the free arc between head
/// and tail, so the body stays ordered along the cycle and plain cycle
/// following remains safe after every shortcut.
#[derive(Clone, Copy, Debug, Default)]
pub struct HamiltonianShortcuts;

impl HamiltonianShortcuts {
    /// Registry name.
    pub const NAME: &'static str = "hamiltonian-shortcuts";
}

impl Strategy for HamiltonianShortcuts {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn plan(&mut self, state: &GameState, options: &PlanOptions) -> Result<PlanResult, PlanError> {
        let window = SafeWindow::measure(state, options)?;
        let mut meta = PlanMeta::for_strategy(Self::NAME);
        meta.safe_window = Some(window.safe_window as u32);
        meta.tail_distance = Some(window.tail_distance as u32);

        let Some(fruit) = state.fruit() else {
            return follow_plan(state, meta, "no fruit; following cycle");
        };
        if !window.allows_shortcuts(state, options) {
            return follow_plan(state, meta, "shortcuts locked; following cycle");
        }

        let cycle = state.cycle();
        let len = cycle.len();
        let head = state.head();
        let fruit_position = cycle_position(state, fruit, Self::NAME)?;
        let baseline = cyclic_distance(window.head + 1, fruit_position, len);

        let mut best: Option<Candidate> = None;
        for neighbor in state.grid().neighbors(head) {
            let position = cycle_position(state, neighbor, Self::NAME)?;
            let forward_jump = cyclic_distance(window.head, position, len);
            if forward_jump == 0 || forward_jump >= window.safe_window {
                continue;
            }

            let will_eat = neighbor == fruit;
            if state.snake().would_collide(neighbor, will_eat) {
                continue;
            }

            let candidate = Candidate {
                cell: neighbor,
                position,
                dist_to_fruit: cyclic_distance(position, fruit_position, len),
                forward_jump,
            };
            if candidate.dist_to_fruit >= baseline {
                continue;
            }
            if best.map_or(true, |existing| candidate.is_better_than(existing)) {
                best = Some(candidate);
            }
            if candidate.dist_to_fruit == 0 {
                break;
            }
        }

        let Some(candidate) = best else {
            return follow_plan(state, meta, "no shorter neighbour; following cycle");
        };

        meta.forward_jump = Some(candidate.forward_jump as u32);
        if !window.validates(state, options, candidate) {
            meta.fallback = true;
            debug!(
                "rejected shortcut {head} -> {} (jump {})",
                candidate.cell, candidate.forward_jump
            );
            return follow_plan(state, meta, "shortcut failed validation; following cycle");
        }

        debug!(
            "shortcut {head} -> {} saves {} steps",
            candidate.cell,
            baseline - candidate.dist_to_fruit
        );
        let mut path = Vec::with_capacity(candidate.dist_to_fruit + 1);
        path.push(candidate.cell);
        path.extend(cycle.path(candidate.cell, fruit));

        Ok(PlanResult::new(candidate.cell, "shortcut toward fruit", meta)
            .with_path(path)
            .as_shortcut(head))
    }
}

/// Cyclic positions and the margin the head may use before reaching the tail.
#[derive(Clone, Copy, Debug)]
struct SafeWindow {
    head: usize,
    tail: usize,
    tail_distance: usize,
    safe_window: usize,
}

impl SafeWindow {
    fn measure(state: &GameState, options: &PlanOptions) -> Result<Self, PlanError> {
        let len = state.cycle().len();
        let snake = state.snake();
        let head = cycle_position(state, snake.head(), HamiltonianShortcuts::NAME)?;
        let tail = cycle_position(state, snake.tail(), HamiltonianShortcuts::NAME)?;

        let tail_distance = if snake.len() == 1 {
            // Head and tail share a cell, so the whole cycle ahead is free.
            len
        } else {
            cyclic_distance(head, tail, len)
        };
        let buffer = if snake.len() <= SHORT_SNAKE_LEN {
            0
        } else {
            options.safety_buffer as usize
        };

        Ok(Self {
            head,
            tail,
            tail_distance,
            safe_window: tail_distance.saturating_sub(buffer),
        })
    }

    fn allows_shortcuts(&self, state: &GameState, options: &PlanOptions) -> bool {
        let minimum = options.min_shortcut_window.saturating_sub(1).max(1) as usize;
        let free_cells = state.free_cells();
        let late_game_ok = free_cells > options.late_game_lock as usize
            || state.snake().len() <= EARLY_GAME_LEN;

        options.shortcuts_enabled && self.safe_window > minimum && late_game_ok
    }

    fn validates(&self, state: &GameState, options: &PlanOptions, candidate: Candidate) -> bool {
        let return_path = cyclic_distance(candidate.position, self.tail, state.cycle().len());
        let required = state.snake().len() + options.safety_buffer as usize;
        candidate.forward_jump > 1 && return_path >= required
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    cell: Cell,
    position: usize,
    dist_to_fruit: usize,
    forward_jump: usize,
}

impl Candidate {
    fn is_better_than(self, other: Candidate) -> bool {
        (self.dist_to_fruit, self.forward_jump) < (other.dist_to_fruit, other.forward_jump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snake_autopilot_core::GameConfig;

    fn cells(indices: &[u32]) -> Vec<Cell> {
        indices.iter().copied().map(Cell::new).collect()
    }

    fn plan(state: &GameState, options: PlanOptions) -> PlanResult {
        HamiltonianShortcuts.plan(state, &options).expect("plan")
    }

    fn six_by_six(body: &[u32], fruit: u32) -> GameState {
        GameState::from_parts(GameConfig::new(6, 6), &cells(body), Some(Cell::new(fruit)))
            .expect("valid state")
    }

    #[test]
    fn jumps_straight_onto_a_fruit_ahead() {
        let state = GameState::from_parts(GameConfig::new(4, 4), &cells(&[1]), Some(Cell::new(5)))
            .expect("valid state");

        let result = plan(&state, PlanOptions::default());

        assert_eq!(result.next_move, Cell::new(5));
        assert!(result.is_shortcut);
        assert_eq!(result.shortcut_edge, Some((Cell::new(1), Cell::new(5))));
        assert_eq!(result.meta.forward_jump, Some(5));
        assert_eq!(result.meta.tail_distance, Some(16));
        assert_eq!(result.planned_path, cells(&[5]));
    }

    #[test]
    fn minimum_window_enables_and_blocks_shortcuts() {
        let state = GameState::from_parts(GameConfig::new(4, 4), &cells(&[1]), Some(Cell::new(5)))
            .expect("valid state");

        let enabling = PlanOptions {
            min_shortcut_window: 16,
            ..PlanOptions::default()
        };
        assert!(plan(&state, enabling).is_shortcut);

        let blocking = PlanOptions {
            min_shortcut_window: 17,
            ..PlanOptions::default()
        };
        let result = plan(&state, blocking);
        assert!(!result.is_shortcut);
        assert_eq!(result.next_move, Cell::new(2));
    }

    #[test]
    fn disabled_shortcuts_follow_the_cycle() {
        let state = six_by_six(&[1, 0, 6, 12, 18, 24], 7);
        let options = PlanOptions {
            shortcuts_enabled: false,
            ..PlanOptions::default()
        };
        let result = plan(&state, options);
        assert!(!result.is_shortcut);
        assert_eq!(result.next_move, Cell::new(2));
    }

    #[test]
    fn late_game_lock_applies_only_to_long_snakes() {
        let long = six_by_six(&[1, 0, 6, 12, 18, 24], 7);
        assert!(plan(&long, PlanOptions::default()).is_shortcut);

        let locked = PlanOptions {
            late_game_lock: 30,
            ..PlanOptions::default()
        };
        assert!(!plan(&long, locked).is_shortcut);

        let unlocked = PlanOptions {
            late_game_lock: 29,
            ..PlanOptions::default()
        };
        assert!(plan(&long, unlocked).is_shortcut);

        let short = six_by_six(&[1, 0, 6, 12, 18], 7);
        let strict = PlanOptions {
            late_game_lock: 40,
            ..PlanOptions::default()
        };
        let result = plan(&short, strict);
        assert!(result.is_shortcut);
        assert_eq!(result.next_move, Cell::new(7));
    }

    #[test]
    fn shortcut_without_return_room_is_rejected() {
        let state = GameState::from_parts(
            GameConfig::new(4, 4),
            &cells(&[1, 0, 4, 8, 12, 13]),
            Some(Cell::new(5)),
        )
        .expect("valid state");

        let result = plan(&state, PlanOptions::default());

        assert!(!result.is_shortcut);
        assert_eq!(result.next_move, Cell::new(2));
        assert!(result.meta.fallback);
        assert_eq!(result.meta.forward_jump, Some(5));
        assert_eq!(result.meta.safe_window, Some(9));
    }

    #[test]
    fn prefers_the_smaller_jump_on_equal_progress() {
        let a = Candidate {
            cell: Cell::new(3),
            position: 3,
            dist_to_fruit: 4,
            forward_jump: 3,
        };
        let b = Candidate {
            cell: Cell::new(9),
            position: 9,
            dist_to_fruit: 4,
            forward_jump: 5,
        };
        assert!(a.is_better_than(b));
        assert!(!b.is_better_than(a));
    }
}
