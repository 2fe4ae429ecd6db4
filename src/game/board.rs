//! Fixed 8×8 board: coordinate validity, distance, random placement.
//!
//! Coordinates are 1-based, `row` and `col` both in `[1, BOARD_SIZE]`.

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{CoreError, Result};

pub const BOARD_SIZE: u8 = 8;

/// Number of cells on the board.
pub const CELL_COUNT: usize = BOARD_SIZE as usize * BOARD_SIZE as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl Cell {
    /// Validates raw (possibly negative) coordinates coming off the wire.
    pub fn checked(row: i32, col: i32) -> Result<Cell> {
        let max = i32::from(BOARD_SIZE);
        if (1..=max).contains(&row) && (1..=max).contains(&col) {
            Ok(Cell {
                row: row as u8,
                col: col as u8,
            })
        } else {
            Err(CoreError::OutOfBounds { row, col })
        }
    }

    pub fn in_bounds(self) -> bool {
        (1..=BOARD_SIZE).contains(&self.row) && (1..=BOARD_SIZE).contains(&self.col)
    }

    /// Row-major index into a `CELL_COUNT` array.
    pub fn index(self) -> usize {
        (self.row as usize - 1) * BOARD_SIZE as usize + (self.col as usize - 1)
    }

    pub fn from_index(i: usize) -> Cell {
        Cell {
            row: (i / BOARD_SIZE as usize) as u8 + 1,
            col: (i % BOARD_SIZE as usize) as u8 + 1,
        }
    }

    /// King-move distance.
    pub fn distance(self, other: Cell) -> u8 {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }
}

/// Every cell in `(row, col)` ascending order.
pub fn all_cells() -> impl Iterator<Item = Cell> {
    (0..CELL_COUNT).map(Cell::from_index)
}

/// Picks `n` distinct cells avoiding `taken`.
pub fn random_free_cells<R: Rng + ?Sized>(
    rng: &mut R,
    taken: &HashSet<Cell>,
    n: usize,
) -> Result<Vec<Cell>> {
    let mut free: Vec<Cell> = all_cells().filter(|c| !taken.contains(c)).collect();
    if free.len() < n {
        return Err(CoreError::BoardFull { requested: n });
    }
    free.shuffle(rng);
    free.truncate(n);
    Ok(free)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn checked_rejects_outside() {
        assert!(Cell::checked(1, 1).is_ok());
        assert!(Cell::checked(8, 8).is_ok());
        assert_eq!(
            Cell::checked(0, 3),
            Err(CoreError::OutOfBounds { row: 0, col: 3 })
        );
        assert!(Cell::checked(3, 9).is_err());
        assert!(Cell::checked(-1, 2).is_err());
    }

    #[test]
    fn index_roundtrip_is_row_major() {
        assert_eq!(Cell { row: 1, col: 1 }.index(), 0);
        assert_eq!(Cell { row: 1, col: 8 }.index(), 7);
        assert_eq!(Cell { row: 2, col: 1 }.index(), 8);
        for i in 0..CELL_COUNT {
            assert_eq!(Cell::from_index(i).index(), i);
        }
    }

    #[test]
    fn distance_is_king_moves() {
        let a = Cell { row: 1, col: 1 };
        assert_eq!(a.distance(Cell { row: 3, col: 2 }), 2);
        assert_eq!(a.distance(a), 0);
        assert_eq!(a.distance(Cell { row: 8, col: 8 }), 7);
    }

    #[test]
    fn random_free_cells_are_distinct_and_avoid_taken() {
        let mut rng = StdRng::seed_from_u64(7);
        let taken: HashSet<Cell> = all_cells().take(60).collect();
        let picked = random_free_cells(&mut rng, &taken, 4).unwrap();
        let unique: HashSet<Cell> = picked.iter().copied().collect();
        assert_eq!(unique.len(), 4);
        assert!(picked.iter().all(|c| !taken.contains(c)));
        assert!(random_free_cells(&mut rng, &taken, 5).is_err());
    }
}
