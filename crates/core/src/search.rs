//! Exhaustive minimax over the 9-cell game tree, plus the difficulty
//! policy layered on top.
//!
//! The tree is small enough (at most 9! positions) that no pruning or
//! caching is needed. `best_move` is fully deterministic: ties break to
//! the lowest cell index, which is what makes the Impossible difficulty
//! reproducible under test.

use crate::board::{Board, Mark, Outcome};
use rand::Rng;

/// Opponent strength, applied fresh on every AI turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Impossible,
}

impl Difficulty {
    /// Parses the settings string, falling back to `Easy` for anything
    /// unrecognized.
    pub fn parse(value: &str) -> Difficulty {
        match value.trim().to_lowercase().as_str() {
            "medium" => Difficulty::Medium,
            "impossible" => Difficulty::Impossible,
            _ => Difficulty::Easy,
        }
    }
}

/// Returns the optimal cell for `ai` to play.
///
/// Terminal positions score `+10 - depth` for an AI win and `depth - 10`
/// for a user win, so the search prefers faster wins and slower losses.
///
/// # Panics
///
/// Debug-asserts that the board has at least one empty cell; callers only
/// invoke the search on undecided positions.
pub fn best_move(board: &Board, ai: Mark, user: Mark) -> usize {
    debug_assert_ne!(ai, user);
    let mut best_score = i32::MIN;
    let mut best_index = 0;
    for index in board.empty_cells() {
        let mut next = *board;
        next.place(index, ai);
        let score = score_position(&next, ai, user, 1, false);
        // Strict comparison keeps the leftmost cell on ties.
        if score > best_score {
            best_score = score;
            best_index = index;
        }
    }
    debug_assert_ne!(best_score, i32::MIN, "best_move called on a full board");
    best_index
}

fn score_position(board: &Board, ai: Mark, user: Mark, depth: i32, maximizing: bool) -> i32 {
    match board.outcome() {
        Outcome::Win(mark) if mark == ai => 10 - depth,
        Outcome::Win(_) => depth - 10,
        Outcome::Draw => 0,
        Outcome::Undecided => {
            if maximizing {
                let mut best = i32::MIN;
                for index in board.empty_cells() {
                    let mut next = *board;
                    next.place(index, ai);
                    best = best.max(score_position(&next, ai, user, depth + 1, false));
                }
                best
            } else {
                let mut worst = i32::MAX;
                for index in board.empty_cells() {
                    let mut next = *board;
                    next.place(index, user);
                    worst = worst.min(score_position(&next, ai, user, depth + 1, true));
                }
                worst
            }
        }
    }
}

/// Picks the AI's move for the given difficulty.
///
/// Easy plays uniformly at random; Medium plays the optimal move 70% of
/// the time; Impossible always plays it.
pub fn choose_move<R: Rng + ?Sized>(
    board: &Board,
    ai: Mark,
    user: Mark,
    difficulty: Difficulty,
    rng: &mut R,
) -> usize {
    match difficulty {
        Difficulty::Easy => random_empty_cell(board, rng),
        Difficulty::Medium => {
            if rng.random_bool(0.7) {
                best_move(board, ai, user)
            } else {
                random_empty_cell(board, rng)
            }
        }
        Difficulty::Impossible => best_move(board, ai, user),
    }
}

fn random_empty_cell<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> usize {
    let open: Vec<usize> = board.empty_cells().collect();
    open[rng.random_range(0..open.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn play_out(
        mut human: impl FnMut(&Board) -> usize,
        mut ai_player: impl FnMut(&Board) -> usize,
        ai: Mark,
        ai_starts: bool,
    ) -> Outcome {
        let user = ai.opponent();
        let mut board = Board::new();
        let mut ai_to_move = ai_starts;
        loop {
            match board.outcome() {
                Outcome::Undecided => {}
                decided => return decided,
            }
            if ai_to_move {
                board.place(ai_player(&board), ai);
            } else {
                board.place(human(&board), user);
            }
            ai_to_move = !ai_to_move;
        }
    }

    #[test]
    fn best_move_is_deterministic() {
        let mut board = Board::new();
        board.place(0, Mark::O);
        let first = best_move(&board, Mark::X, Mark::O);
        for _ in 0..10 {
            assert_eq!(best_move(&board, Mark::X, Mark::O), first);
        }
    }

    #[test]
    fn opening_move_is_center_or_corner() {
        let board = Board::new();
        let index = best_move(&board, Mark::X, Mark::O);
        assert!(
            [0, 2, 4, 6, 8].contains(&index),
            "opening at {index} is neither center nor corner"
        );
    }

    #[test]
    fn blocks_an_immediate_loss() {
        // O threatens 0-1-2; X must play 2.
        let mut board = Board::new();
        board.place(0, Mark::O);
        board.place(1, Mark::O);
        board.place(4, Mark::X);
        board.place(8, Mark::X);
        assert_eq!(best_move(&board, Mark::X, Mark::O), 2);
    }

    #[test]
    fn takes_an_immediate_win_over_a_block() {
        // X can win at 2; O also threatens at 5. Winning comes first.
        let mut board = Board::new();
        board.place(0, Mark::X);
        board.place(1, Mark::X);
        board.place(3, Mark::O);
        board.place(4, Mark::O);
        assert_eq!(best_move(&board, Mark::X, Mark::O), 2);
    }

    #[test]
    fn optimal_self_play_always_draws() {
        for ai_starts in [true, false] {
            let outcome = play_out(
                |b| best_move(b, Mark::O, Mark::X),
                |b| best_move(b, Mark::X, Mark::O),
                Mark::X,
                ai_starts,
            );
            assert_eq!(outcome, Outcome::Draw);
        }
    }

    #[test]
    fn impossible_never_loses_across_randomized_games() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for game in 0..1000 {
            let ai_starts = game % 2 == 0;
            let outcome = play_out(
                |b| {
                    let open: Vec<usize> = b.empty_cells().collect();
                    open[rng.random_range(0..open.len())]
                },
                |b| best_move(b, Mark::X, Mark::O),
                Mark::X,
                ai_starts,
            );
            assert_ne!(outcome, Outcome::Win(Mark::O), "lost game {game}");
        }
    }

    #[test]
    fn easy_difficulty_picks_only_empty_cells() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut board = Board::new();
        board.place(0, Mark::X);
        board.place(4, Mark::O);
        for _ in 0..50 {
            let index = choose_move(&board, Mark::O, Mark::X, Difficulty::Easy, &mut rng);
            assert!(board.cell(index).is_none());
        }
    }

    #[test]
    fn difficulty_parse_defaults_to_easy() {
        assert_eq!(Difficulty::parse("Impossible"), Difficulty::Impossible);
        assert_eq!(Difficulty::parse("medium"), Difficulty::Medium);
        assert_eq!(Difficulty::parse("Easy"), Difficulty::Easy);
        assert_eq!(Difficulty::parse("nightmare"), Difficulty::Easy);
        assert_eq!(Difficulty::parse(""), Difficulty::Easy);
    }
}
