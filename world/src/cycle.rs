//! Hamiltonian cycle construction and cyclic arithmetic.

use std::sync::Arc;

use snake_autopilot_core::{cyclic_distance, Cell, CellCoord, ConfigError, Grid};

/// Closed tour visiting every board cell exactly once.
///
/// Both the ordering and its inverse are stored behind shared handles, so
/// cloning a cycle into every state snapshot costs two reference-count bumps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HamiltonianCycle {
    grid: Grid,
    order: Arc<[Cell]>,
    positions: Arc<[u32]>,
}

impl HamiltonianCycle {
    /// Builds the cycle for the provided board.
    ///
    /// Boards with an even number of rows are swept row by row; otherwise the
    /// even column count is swept column by column. Column zero (or row zero)
    /// is kept free as the return lane that closes the loop.
    pub fn build(grid: Grid) -> Result<Self, ConfigError> {
        let grid = Grid::validated(grid.rows(), grid.columns())?;
        let coords = if grid.rows() % 2 == 0 {
            row_sweep(grid.rows(), grid.columns())
        } else {
            column_sweep(grid.rows(), grid.columns())
        };

        let order: Vec<Cell> = coords
            .into_iter()
            .filter_map(|coord| grid.cell(coord))
            .collect();

        let mut positions = vec![0u32; order.len()];
        for (position, cell) in order.iter().enumerate() {
            positions[cell.index()] = position as u32;
        }

        Ok(Self {
            grid,
            order: Arc::from(order),
            positions: Arc::from(positions),
        })
    }

    /// Board the cycle covers.
    #[must_use]
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Number of cells in the cycle, `L`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always `false` for a built cycle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Cells in cycle order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.order
    }

    /// Cell at the provided cyclic position, wrapping around the cycle.
    #[must_use]
    pub fn cell_at(&self, position: usize) -> Cell {
        self.order[position % self.order.len()]
    }

    /// Cyclic position of `cell`, or `None` when the cell is off the board.
    #[must_use]
    pub fn position(&self, cell: Cell) -> Option<usize> {
        self.positions
            .get(cell.index())
            .map(|&position| position as usize)
    }

    /// Successor of `cell` along the cycle.
    #[must_use]
    pub fn next(&self, cell: Cell) -> Option<Cell> {
        self.position(cell)
            .map(|position| self.cell_at(position + 1))
    }

    /// Predecessor of `cell` along the cycle.
    #[must_use]
    pub fn prev(&self, cell: Cell) -> Option<Cell> {
        self.position(cell)
            .map(|position| self.cell_at(position + self.len() - 1))
    }

    /// Forward distance from `from` to `to` along the cycle.
    #[must_use]
    pub fn distance(&self, from: Cell, to: Cell) -> Option<usize> {
        let from = self.position(from)?;
        let to = self.position(to)?;
        Some(cyclic_distance(from, to, self.len()))
    }

    /// Cells visited when following the cycle from `from` to `to`.
    ///
    /// The path excludes `from` and ends with `to`, so its length equals
    /// [`HamiltonianCycle::distance`]. Off-board endpoints yield an empty path.
    #[must_use]
    pub fn path(&self, from: Cell, to: Cell) -> Vec<Cell> {
        let (Some(start), Some(steps)) = (self.position(from), self.distance(from, to)) else {
            return Vec::new();
        };
        (1..=steps)
            .map(|offset| self.cell_at(start + offset))
            .collect()
    }
}

fn row_sweep(rows: u32, columns: u32) -> Vec<CellCoord> {
    let mut coords = Vec::with_capacity(rows as usize * columns as usize);
    coords.extend((0..columns).map(|column| CellCoord::new(column, 0)));
    for row in 1..rows {
        if row % 2 == 1 {
            coords.extend((1..columns).rev().map(|column| CellCoord::new(column, row)));
        } else {
            coords.extend((1..columns).map(|column| CellCoord::new(column, row)));
        }
    }
    coords.extend((1..rows).rev().map(|row| CellCoord::new(0, row)));
    coords
}

fn column_sweep(rows: u32, columns: u32) -> Vec<CellCoord> {
    let mut coords = Vec::with_capacity(rows as usize * columns as usize);
    coords.extend((0..rows).map(|row| CellCoord::new(0, row)));
    for column in 1..columns {
        if column % 2 == 1 {
            coords.extend((1..rows).rev().map(|row| CellCoord::new(column, row)));
        } else {
            coords.extend((1..rows).map(|row| CellCoord::new(column, row)));
        }
    }
    coords.extend((1..columns).rev().map(|column| CellCoord::new(column, 0)));
    coords
}
