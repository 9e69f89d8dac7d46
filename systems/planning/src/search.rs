//! Graph searches toward the fruit over the free cells of the board.

use std::{cmp::Reverse, collections::BinaryHeap};

use log::debug;
use snake_autopilot_core::{Cell, PlanError, PlanMeta, PlanResult};
use snake_autopilot_world::{GameState, HamiltonianCycle, NavigationField};

use crate::{survival_move, PlanOptions, Strategy};

/// A* search with a Manhattan heuristic.
///
/// Open-set ties resolve by lower heuristic and then by insertion order, and
/// neighbours are expanded north, east, south, west, so a given state always
/// yields the same path.
#[derive(Clone, Debug, Default)]
pub struct AStar {
    scratch: SearchScratch,
}

impl AStar {
    /// Registry name.
    pub const NAME: &'static str = "astar";
}

impl Strategy for AStar {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn is_expensive(&self) -> bool {
        true
    }

    fn initialize(&mut self, cycle: &HamiltonianCycle) {
        self.scratch.resize(cycle.len());
    }

    fn plan(&mut self, state: &GameState, _options: &PlanOptions) -> Result<PlanResult, PlanError> {
        let mut meta = PlanMeta::for_strategy(Self::NAME);
        let head = state.head();
        let Some(fruit) = state.fruit() else {
            return Ok(survive(state, None, meta, "no fruit"));
        };
        if head == fruit {
            return Ok(PlanResult::new(head, "already on the fruit", meta));
        }

        let search = self.scratch.search(state, head, fruit);
        meta.nodes_expanded = search.expanded;
        match search.path {
            Some(path) => match path.first().copied() {
                Some(next) => Ok(PlanResult::new(next, "shortest path to fruit", meta).with_path(path)),
                None => Ok(survive(state, Some(fruit), meta, "empty path")),
            },
            None => Ok(survive(state, Some(fruit), meta, "fruit unreachable")),
        }
    }
}

/// Breadth-first search toward the fruit.
///
/// The distance field is grown backwards from the fruit and the head steps
/// down its gradient, which picks the first neighbour of an unweighted
/// shortest path.
#[derive(Clone, Debug, Default)]
pub struct Bfs {
    field: NavigationField,
}

impl Bfs {
    /// Registry name.
    pub const NAME: &'static str = "bfs";
}

impl Strategy for Bfs {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn is_expensive(&self) -> bool {
        true
    }

    fn initialize(&mut self, _cycle: &HamiltonianCycle) {
        self.field = NavigationField::default();
    }

    fn plan(&mut self, state: &GameState, _options: &PlanOptions) -> Result<PlanResult, PlanError> {
        let mut meta = PlanMeta::for_strategy(Self::NAME);
        let head = state.head();
        let Some(fruit) = state.fruit() else {
            return Ok(survive(state, None, meta, "no fruit"));
        };
        if head == fruit {
            return Ok(PlanResult::new(head, "already on the fruit", meta));
        }

        let snake = state.snake();
        let tail = snake.tail();
        self.field.rebuild_with(state.grid(), &[fruit], |cell| {
            cell != tail && snake.is_occupied(cell)
        });
        meta.nodes_expanded = self.field.visited();

        let path = self.field.trace_path(head);
        match path.first().copied() {
            Some(next) => Ok(PlanResult::new(next, "shortest path to fruit", meta).with_path(path)),
            None => Ok(survive(state, Some(fruit), meta, "fruit unreachable")),
        }
    }
}

fn survive(state: &GameState, target: Option<Cell>, mut meta: PlanMeta, why: &str) -> PlanResult {
    meta.fallback = true;
    match survival_move(state, target) {
        Some(next) => {
            debug!("{}: {why}; survival move to {next}", meta.strategy);
            PlanResult::new(next, format!("{why}; survival move"), meta)
        }
        None => {
            debug!("{}: {why}; no legal move", meta.strategy);
            PlanResult::new(state.head(), format!("{why}; no legal move"), meta)
        }
    }
}

#[derive(Clone, Debug, Default)]
struct SearchScratch {
    g_scores: Vec<u32>,
    came_from: Vec<Option<Cell>>,
    closed: Vec<bool>,
}

struct SearchOutcome {
    path: Option<Vec<Cell>>,
    expanded: u32,
}

impl SearchScratch {
    fn resize(&mut self, cell_count: usize) {
        self.g_scores = vec![u32::MAX; cell_count];
        self.came_from = vec![None; cell_count];
        self.closed = vec![false; cell_count];
    }

    fn search(&mut self, state: &GameState, start: Cell, goal: Cell) -> SearchOutcome {
        let grid = state.grid();
        let snake = state.snake();
        let tail = snake.tail();
        if self.g_scores.len() != grid.cell_count() {
            self.resize(grid.cell_count());
        } else {
            self.g_scores.fill(u32::MAX);
            self.came_from.fill(None);
            self.closed.fill(false);
        }

        let mut open = BinaryHeap::new();
        let mut sequence: u32 = 0;
        let mut expanded: u32 = 0;
        self.g_scores[start.index()] = 0;
        let start_heuristic = grid.manhattan_distance(start, goal);
        open.push(Reverse((start_heuristic, start_heuristic, sequence, start)));

        while let Some(Reverse((_, _, _, current))) = open.pop() {
            if self.closed[current.index()] {
                continue;
            }
            self.closed[current.index()] = true;
            expanded += 1;

            if current == goal {
                return SearchOutcome {
                    path: Some(self.reconstruct(start, goal)),
                    expanded,
                };
            }

            let next_g = self.g_scores[current.index()].saturating_add(1);
            for neighbor in grid.neighbors(current) {
                if neighbor != tail && snake.is_occupied(neighbor) {
                    continue;
                }
                if self.closed[neighbor.index()] || next_g >= self.g_scores[neighbor.index()] {
                    continue;
                }
                self.g_scores[neighbor.index()] = next_g;
                self.came_from[neighbor.index()] = Some(current);
                sequence += 1;
                let heuristic = grid.manhattan_distance(neighbor, goal);
                open.push(Reverse((next_g + heuristic, heuristic, sequence, neighbor)));
            }
        }

        SearchOutcome {
            path: None,
            expanded,
        }
    }

    fn reconstruct(&self, start: Cell, goal: Cell) -> Vec<Cell> {
        let mut path = Vec::new();
        let mut current = goal;
        while current != start {
            path.push(current);
            match self.came_from[current.index()] {
                Some(previous) => current = previous,
                None => break,
            }
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snake_autopilot_core::GameConfig;
    use snake_autopilot_world::check_collision;

    fn cells(indices: &[u32]) -> Vec<Cell> {
        indices.iter().copied().map(Cell::new).collect()
    }

    fn state(rows: u32, cols: u32, body: &[u32], fruit: u32) -> GameState {
        GameState::from_parts(GameConfig::new(rows, cols), &cells(body), Some(Cell::new(fruit)))
            .expect("valid state")
    }

    fn plan_with(strategy: &mut dyn Strategy, state: &GameState) -> PlanResult {
        strategy.plan(state, &PlanOptions::default()).expect("plan")
    }

    #[test]
    fn searches_agree_on_open_board_distance() {
        let board = state(5, 6, &[0], 29);
        let astar = plan_with(&mut AStar::default(), &board);
        let bfs = plan_with(&mut Bfs::default(), &board);

        assert_eq!(astar.planned_path.len(), 9);
        assert_eq!(bfs.planned_path.len(), 9);
        assert_eq!(astar.planned_path.last().copied(), Some(Cell::new(29)));
        assert_eq!(bfs.planned_path.last().copied(), Some(Cell::new(29)));
        assert!(astar.meta.nodes_expanded > 0);
        assert!(!astar.meta.fallback);
    }

    #[test]
    fn searches_route_around_the_body() {
        // Body fills column 1 down to the tail.
        let board = state(4, 4, &[0, 1, 5, 9], 2);
        for strategy in [&mut AStar::default() as &mut dyn Strategy, &mut Bfs::default()] {
            let result = plan_with(strategy, &board);
            assert_eq!(result.next_move, Cell::new(4), "{}", result.meta.strategy);
            let path = &result.planned_path;
            assert_eq!(path.last().copied(), Some(Cell::new(2)));
            let mut previous = board.head();
            for &cell in path {
                assert!(board.grid().are_adjacent(previous, cell));
                previous = cell;
            }
        }
    }

    #[test]
    fn tail_cell_counts_as_free() {
        // Head at 5 is boxed in except for the tail at 4.
        let board = state(4, 4, &[5, 1, 2, 6, 10, 9, 8, 4], 0);
        for strategy in [&mut AStar::default() as &mut dyn Strategy, &mut Bfs::default()] {
            let result = plan_with(strategy, &board);
            assert_eq!(result.next_move, Cell::new(4), "{}", result.meta.strategy);
            assert_eq!(result.planned_path, cells(&[4, 0]));
            assert!(!result.meta.fallback);
            assert_eq!(check_collision(&board, result.next_move), None);
        }
    }

    #[test]
    fn unreachable_fruit_triggers_survival_move() {
        // Fruit at 0 is sealed off by the body.
        let board = state(4, 4, &[14, 10, 9, 8, 4, 5, 1, 2], 0);
        for strategy in [&mut AStar::default() as &mut dyn Strategy, &mut Bfs::default()] {
            let result = plan_with(strategy, &board);
            assert!(result.meta.fallback, "{}", result.meta.strategy);
            assert_eq!(result.next_move, Cell::new(13));
            assert_eq!(check_collision(&board, result.next_move), None);
            assert!(board.grid().are_adjacent(board.head(), result.next_move));
        }
    }

    #[test]
    fn boxed_in_heads_stay_put() {
        // Both neighbours of the head at 0 are body segments; the tail is at 2.
        let board = state(4, 4, &[0, 4, 5, 1, 2], 15);
        for strategy in [&mut AStar::default() as &mut dyn Strategy, &mut Bfs::default()] {
            let result = plan_with(strategy, &board);
            assert_eq!(result.next_move, board.head(), "{}", result.meta.strategy);
            assert!(result.meta.fallback);
            assert!(result.reason.ends_with("no legal move"));
            assert!(!result.is_shortcut);
        }
    }
}
