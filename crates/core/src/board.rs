//! Board model and rules for the 3x3 game.
//!
//! The board is a plain value type; move legality and win/draw detection
//! live here so the session controller and the search never have to
//! reimplement the rules.

use std::fmt;
use thiserror::Error;

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// Every three-in-a-row line, ordered rows, then columns, then diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// One of the two turn-taking symbols occupying a board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The mark taking the other side of the game.
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// Why a move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("cell index {0} is outside the board")]
    OutOfRange(usize),
    #[error("cell is already occupied by {by}")]
    Occupied { by: Mark },
}

/// Result of evaluating a board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Undecided,
    Win(Mark),
    Draw,
}

/// The 3x3 grid. Cells are indexed 0..=8, row-major.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Mark>; CELL_COUNT],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mark occupying `index`, if any.
    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    /// Applies a move, rejecting out-of-range indices and occupied cells.
    pub fn apply(&mut self, index: usize, mark: Mark) -> Result<(), MoveError> {
        if index >= CELL_COUNT {
            return Err(MoveError::OutOfRange(index));
        }
        if let Some(by) = self.cells[index] {
            return Err(MoveError::Occupied { by });
        }
        self.cells[index] = Some(mark);
        Ok(())
    }

    /// Writes a mark without legality checks. Only the search uses this,
    /// on cells it already knows are empty.
    pub(crate) fn place(&mut self, index: usize, mark: Mark) {
        debug_assert!(self.cells[index].is_none());
        self.cells[index] = Some(mark);
    }

    /// Indices of all empty cells, in board order.
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(i, _)| i)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    /// Evaluates the position. Win lines are checked before the draw
    /// condition, so a final filling move that completes a line still
    /// counts as a win.
    pub fn outcome(&self) -> Outcome {
        for line in &LINES {
            if let Some(mark) = self.cells[line[0]] {
                if self.cells[line[1]] == Some(mark) && self.cells[line[2]] == Some(mark) {
                    return Outcome::Win(mark);
                }
            }
        }
        if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::Undecided
        }
    }
}
