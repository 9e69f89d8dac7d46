//! Snake body stored as a fixed-capacity ring buffer with an occupancy bitset.

use std::sync::Arc;

use snake_autopilot_core::Cell;
use thiserror::Error;

/// Ordered snake body, head first, with O(1) head/tail/move/grow.
///
/// The body is a logically immutable value: [`Snake::moved`] returns a new
/// snake and leaves the original untouched. Storage is shared behind an
/// [`Arc`] and copied only when a shared snapshot is advanced, so the
/// common single-owner case reuses the same buffer every tick.
#[derive(Clone, Debug)]
pub struct Snake {
    body: Arc<RingBody>,
}

impl Snake {
    /// Creates a snake of length one at `start` on a board of `capacity` cells.
    #[must_use]
    pub fn new(start: Cell, capacity: usize) -> Self {
        let capacity = capacity.max(start.index() + 1);
        let mut body = RingBody::with_capacity(capacity);
        body.cells[0] = start;
        body.len = 1;
        body.occupancy.insert(start);
        Self {
            body: Arc::new(body),
        }
    }

    /// Creates a snake from an explicit body listed head first.
    pub fn from_cells(cells: &[Cell], capacity: usize) -> Result<Self, SnakeError> {
        if cells.is_empty() {
            return Err(SnakeError::Empty);
        }
        if cells.len() > capacity {
            return Err(SnakeError::TooLong {
                len: cells.len(),
                capacity,
            });
        }

        let mut body = RingBody::with_capacity(capacity);
        let head_slot = cells.len() - 1;
        for (offset, &cell) in cells.iter().enumerate() {
            if cell.index() >= capacity {
                return Err(SnakeError::OutOfBounds { cell });
            }
            if body.occupancy.contains(cell) {
                return Err(SnakeError::Duplicate { cell });
            }
            body.occupancy.insert(cell);
            body.cells[head_slot - offset] = cell;
        }
        body.head = head_slot;
        body.len = cells.len();

        Ok(Self {
            body: Arc::new(body),
        })
    }

    /// Cell occupied by the head.
    #[must_use]
    pub fn head(&self) -> Cell {
        self.body.cells[self.body.head]
    }

    /// Cell occupied by the last body segment.
    #[must_use]
    pub fn tail(&self) -> Cell {
        self.body.segment(self.body.len - 1)
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len
    }

    /// Always `false`; a snake has at least one segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.len == 0
    }

    /// Maximum number of segments, equal to the board's cell count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.body.cells.len()
    }

    /// Reports whether any segment occupies `cell`.
    #[must_use]
    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.body.occupancy.contains(cell)
    }

    /// Size of the occupancy set; always equal to [`Snake::len`].
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.body.occupancy.count
    }

    /// Iterates the body from head to tail.
    pub fn body(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.body.len).map(move |offset| self.body.segment(offset))
    }

    /// Reports whether moving the head onto `cell` hits the body.
    ///
    /// The tail cell is vacated during a non-growing move, so stepping onto it
    /// is legal unless the snake eats on the same tick.
    #[must_use]
    pub fn would_collide(&self, cell: Cell, will_eat: bool) -> bool {
        self.is_occupied(cell) && (will_eat || cell != self.tail())
    }

    /// Returns the snake after moving its head onto `to`.
    #[must_use]
    pub fn moved(&self, to: Cell, grow: bool) -> Self {
        let mut next = self.clone();
        next.advance(to, grow);
        next
    }

    /// Moves the head onto `to`, dropping the tail unless `grow` is set.
    ///
    /// Growth is capped at the capacity of the board.
    pub fn advance(&mut self, to: Cell, grow: bool) {
        let body = Arc::make_mut(&mut self.body);
        let capacity = body.cells.len();
        let grow = grow && body.len < capacity;

        if !grow {
            let tail = body.segment(body.len - 1);
            body.occupancy.remove(tail);
        }

        body.head = (body.head + 1) % capacity;
        body.cells[body.head] = to;
        body.occupancy.insert(to);

        if grow {
            body.len += 1;
        }
    }
}

impl PartialEq for Snake {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.capacity() == other.capacity()
            && self.body().eq(other.body())
    }
}

impl Eq for Snake {}

/// Reasons an explicit body cannot form a snake.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SnakeError {
    /// No cells were provided.
    #[error("a snake needs at least one segment")]
    Empty,
    /// More cells than the board holds.
    #[error("body of {len} segments exceeds capacity {capacity}")]
    TooLong {
        /// Provided length.
        len: usize,
        /// Board capacity.
        capacity: usize,
    },
    /// A cell lies outside the board.
    #[error("segment {cell} lies outside the board")]
    OutOfBounds {
        /// Offending cell.
        cell: Cell,
    },
    /// A cell appears twice.
    #[error("segment {cell} appears more than once")]
    Duplicate {
        /// Offending cell.
        cell: Cell,
    },
}

#[derive(Clone, Debug)]
struct RingBody {
    cells: Vec<Cell>,
    head: usize,
    len: usize,
    occupancy: Occupancy,
}

impl RingBody {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: vec![Cell::new(0); capacity],
            head: 0,
            len: 0,
            occupancy: Occupancy::new(capacity),
        }
    }

    fn segment(&self, offset: usize) -> Cell {
        let capacity = self.cells.len();
        self.cells[(self.head + capacity - offset) % capacity]
    }
}

#[derive(Clone, Debug)]
struct Occupancy {
    words: Vec<u64>,
    count: usize,
}

impl Occupancy {
    fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            count: 0,
        }
    }

    fn contains(&self, cell: Cell) -> bool {
        let (word, bit) = Self::locate(cell);
        self.words
            .get(word)
            .map_or(false, |bits| bits & (1 << bit) != 0)
    }

    fn insert(&mut self, cell: Cell) {
        let (word, bit) = Self::locate(cell);
        if let Some(bits) = self.words.get_mut(word) {
            if *bits & (1 << bit) == 0 {
                *bits |= 1 << bit;
                self.count += 1;
            }
        }
    }

    fn remove(&mut self, cell: Cell) {
        let (word, bit) = Self::locate(cell);
        if let Some(bits) = self.words.get_mut(word) {
            if *bits & (1 << bit) != 0 {
                *bits &= !(1 << bit);
                self.count -= 1;
            }
        }
    }

    fn locate(cell: Cell) -> (usize, u32) {
        (cell.index() / 64, cell.get() % 64)
    }
}
