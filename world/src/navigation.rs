//! Reverse breadth-first distance field used by the search strategies.

use std::collections::VecDeque;

use snake_autopilot_core::{Cell, Grid};

/// Dense step-distance grid seeded from one or more target cells.
///
/// Distances default to `u32::MAX` for blocked or unreachable cells so
/// callers can tell walls of body apart from open floor. The field can be
/// rebuilt in place to reuse its allocation between plans.
#[derive(Clone, Debug, Default)]
pub struct NavigationField {
    grid: Option<Grid>,
    distances: Vec<u32>,
    visited: u32,
}

impl NavigationField {
    /// Rebuilds the distances using a reverse breadth-first search from
    /// `targets`, never entering cells for which `is_blocked` holds.
    pub fn rebuild_with<F>(&mut self, grid: Grid, targets: &[Cell], mut is_blocked: F)
    where
        F: FnMut(Cell) -> bool,
    {
        let cell_count = grid.cell_count();
        if self.distances.len() != cell_count {
            self.distances = vec![u32::MAX; cell_count];
        } else {
            self.distances.fill(u32::MAX);
        }
        self.grid = Some(grid);
        self.visited = 0;

        let mut queue = VecDeque::new();
        for &target in targets {
            if !grid.contains(target) || is_blocked(target) {
                continue;
            }
            if self.distances[target.index()] == 0 {
                continue;
            }
            self.distances[target.index()] = 0;
            queue.push_back(target);
        }

        while let Some(cell) = queue.pop_front() {
            self.visited += 1;
            let next_distance = self.distances[cell.index()].saturating_add(1);

            for neighbor in grid.neighbors(cell) {
                if self.distances[neighbor.index()] <= next_distance {
                    continue;
                }
                if is_blocked(neighbor) {
                    continue;
                }
                self.distances[neighbor.index()] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Distance recorded for `cell`, or `None` when it is unreachable.
    #[must_use]
    pub fn distance(&self, cell: Cell) -> Option<u32> {
        self.distances
            .get(cell.index())
            .copied()
            .filter(|&distance| distance != u32::MAX)
    }

    /// Number of cells dequeued during the last rebuild.
    #[must_use]
    pub fn visited(&self) -> u32 {
        self.visited
    }

    /// Reachable neighbour of `from` closest to the targets.
    ///
    /// Ties resolve in north, east, south, west order. `from` itself does not
    /// need to be reachable, which lets a blocked head query its way out.
    #[must_use]
    pub fn descend(&self, from: Cell) -> Option<Cell> {
        let grid = self.grid?;
        let mut best: Option<(u32, Cell)> = None;
        for neighbor in grid.neighbors(from) {
            let Some(distance) = self.distance(neighbor) else {
                continue;
            };
            if best.map_or(true, |(current, _)| distance < current) {
                best = Some((distance, neighbor));
            }
        }
        best.map(|(_, cell)| cell)
    }

    /// Follows the gradient from `from` down to a target.
    ///
    /// The returned path excludes `from` and ends on a target. It is empty
    /// when no reachable neighbour exists.
    #[must_use]
    pub fn trace_path(&self, from: Cell) -> Vec<Cell> {
        let mut path = Vec::new();
        let Some(mut current) = self.descend(from) else {
            return path;
        };
        path.push(current);

        while let Some(distance) = self.distance(current) {
            if distance == 0 {
                break;
            }
            let Some(next) = self
                .grid
                .and_then(|grid| {
                    grid.neighbors(current)
                        .find(|&neighbor| self.distance(neighbor) == Some(distance - 1))
                })
            else {
                break;
            };
            path.push(next);
            current = next;
        }
        path
    }
}
