use snake_autopilot_core::{Cell, Lcg};

use crate::snake::Snake;

/// Picks a uniformly random free cell, or `None` when the snake fills the board.
///
/// The generator is consulted exactly once per successful spawn, so a given
/// seed reproduces the same fruit sequence for the same sequence of bodies.
pub fn spawn_fruit(snake: &Snake, total_cells: usize, rng: &mut Lcg) -> Option<Cell> {
    let free = total_cells.saturating_sub(snake.occupied_count());
    let nth = rng.next_index(free)?;

    (0..total_cells)
        .filter_map(|index| u32::try_from(index).ok().map(Cell::new))
        .filter(|&cell| !snake.is_occupied(cell))
        .nth(nth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn full_board_yields_no_fruit_and_keeps_the_stream() {
        let cells: Vec<Cell> = (0..4).map(Cell::new).collect();
        let snake = Snake::from_cells(&cells, 4).expect("valid body");
        let mut rng = Lcg::new(9);

        assert_eq!(spawn_fruit(&snake, 4, &mut rng), None);
        assert_eq!(rng, Lcg::new(9));
    }

    #[test]
    fn fruit_never_lands_on_the_body() {
        let mut sampler = ChaCha8Rng::seed_from_u64(0xf00d);
        for seed in 0..64 {
            let len = sampler.gen_range(1..15u32);
            let cells: Vec<Cell> = (0..len).map(Cell::new).collect();
            let snake = Snake::from_cells(&cells, 16).expect("valid body");
            let mut rng = Lcg::new(seed);

            let fruit = spawn_fruit(&snake, 16, &mut rng).expect("free cells remain");
            assert!(!snake.is_occupied(fruit));
            assert!(fruit.index() < 16);
        }
    }

    #[test]
    fn last_free_cell_is_always_chosen() {
        let cells: Vec<Cell> = [0, 1, 3].into_iter().map(Cell::new).collect();
        let snake = Snake::from_cells(&cells, 4).expect("valid body");
        let mut rng = Lcg::new(1234);
        assert_eq!(spawn_fruit(&snake, 4, &mut rng), Some(Cell::new(2)));
    }
}
