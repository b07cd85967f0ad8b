//! Game session controller.
//!
//! A pure state machine owning one user's game: turn sequencing, command
//! parsing, AI invocation, and the message choreography. Instead of
//! nesting timers, every transition returns a linear plan of [`Step`]s; a
//! single driver in the service renders them in order and sleeps the
//! declared hold between renders. Replacing the pending plan is how stale
//! output gets cancelled.

use crate::board::{Board, Mark, MoveError, Outcome};
use crate::search::{self, Difficulty};
use rand::Rng;

/// Delay before the AI's move is played after the board renders.
pub const AI_MOVE_HOLD_MS: u64 = 1_500;
/// How long a transient advisory stays up before the board re-renders.
pub const ADVISORY_HOLD_MS: u64 = 2_000;
/// Delay between the final board and the conclusion banner.
pub const CONCLUSION_HOLD_MS: u64 = 1_500;

/// One entry in a session's render plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Display `text`, then wait `hold_ms` before the next step.
    Render { text: String, hold_ms: u64 },
    /// Let the AI take its turn; the controller returns the follow-up
    /// steps when the driver reaches this point.
    AiMove,
}

impl Step {
    fn render(text: impl Into<String>, hold_ms: u64) -> Step {
        Step::Render {
            text: text.into(),
            hold_ms,
        }
    }
}

/// Turn-based game state for one user.
#[derive(Debug, Clone)]
pub struct GameSession {
    board: Board,
    current_turn: Mark,
    user_mark: Mark,
    ai_mark: Mark,
    outcome: Outcome,
    difficulty: Difficulty,
}

impl GameSession {
    /// Starts a game with a random 50/50 mark assignment. X always moves
    /// first, so the AI opens whenever it draws X.
    pub fn new<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Self {
        let user_mark = if rng.random_bool(0.5) { Mark::X } else { Mark::O };
        Self::with_marks(user_mark, difficulty)
    }

    /// Starts a game with a fixed mark assignment.
    pub fn with_marks(user_mark: Mark, difficulty: Difficulty) -> Self {
        Self {
            board: Board::new(),
            current_turn: Mark::X,
            user_mark,
            ai_mark: user_mark.opponent(),
            outcome: Outcome::Undecided,
            difficulty,
        }
    }

    pub fn user_mark(&self) -> Mark {
        self.user_mark
    }

    pub fn ai_mark(&self) -> Mark {
        self.ai_mark
    }

    pub fn current_turn(&self) -> Mark {
        self.current_turn
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// The first-render plan: show the board, and when the AI holds X,
    /// play its forced opening move. Also correct for resumed sessions:
    /// it re-renders whatever state the game is in and picks the AI turn
    /// back up if one was pending.
    pub fn opening(&self) -> Vec<Step> {
        if self.outcome == Outcome::Undecided && self.current_turn == self.ai_mark {
            vec![
                Step::render(self.render_board(), AI_MOVE_HOLD_MS),
                Step::AiMove,
            ]
        } else {
            vec![Step::render(self.render_board(), 0)]
        }
    }

    /// Clears the board, re-randomizes marks, and returns the opening
    /// plan for the fresh game.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Step> {
        *self = Self::new(self.difficulty, rng);
        self.opening()
    }

    /// Interprets one final transcript.
    ///
    /// "new game"/"restart" (case-insensitive, punctuation ignored)
    /// resets; the first digit 1-9 anywhere in the text is a move at that
    /// cell; anything else is ignored and yields an empty plan.
    pub fn handle_transcript<R: Rng + ?Sized>(&mut self, text: &str, rng: &mut R) -> Vec<Step> {
        let stripped: String = text
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_lowercase();
        if stripped == "newgame" || stripped == "restart" {
            tracing::info!("reset command recognized");
            return self.reset(rng);
        }
        if let Some(digit) = text.chars().find(|c| ('1'..='9').contains(c)) {
            let index = digit as usize - '1' as usize;
            return self.handle_user_move(index);
        }
        Vec::new()
    }

    /// Applies the user's move, or plans a transient advisory when the
    /// move is rejected. No state changes on rejection.
    pub fn handle_user_move(&mut self, index: usize) -> Vec<Step> {
        if self.outcome != Outcome::Undecided {
            return self.advisory("The game is over. Say 'new game' for a rematch.");
        }
        if self.current_turn != self.user_mark {
            return self.advisory("Hold on, it's not your turn yet.");
        }
        match self.board.apply(index, self.user_mark) {
            Err(MoveError::OutOfRange(_)) => {
                self.advisory("Pick a position between 1 and 9.")
            }
            Err(MoveError::Occupied { by }) if by == self.ai_mark => self.advisory(format!(
                "Position {} is already taken by me.",
                index + 1
            )),
            Err(MoveError::Occupied { .. }) => {
                self.advisory(format!("Position {} is already taken.", index + 1))
            }
            Ok(()) => {
                self.conclude_or_pass_turn();
                if self.outcome == Outcome::Undecided {
                    vec![
                        Step::render(self.render_board(), AI_MOVE_HOLD_MS),
                        Step::AiMove,
                    ]
                } else {
                    self.concluded_plan()
                }
            }
        }
    }

    /// Plays the AI's move per the current difficulty. Returns an empty
    /// plan when it is not actually the AI's turn, which is how a stale
    /// `AiMove` step left over from before a reset fizzles harmlessly.
    pub fn ai_turn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Step> {
        if self.outcome != Outcome::Undecided || self.current_turn != self.ai_mark {
            return Vec::new();
        }
        let index = search::choose_move(
            &self.board,
            self.ai_mark,
            self.user_mark,
            self.difficulty,
            rng,
        );
        self.board.place(index, self.ai_mark);
        tracing::debug!(cell = index + 1, "ai move");
        self.conclude_or_pass_turn();
        if self.outcome == Outcome::Undecided {
            vec![Step::render(self.render_board(), 0)]
        } else {
            self.concluded_plan()
        }
    }

    /// Re-derives the outcome from the board and only toggles the turn
    /// while the game is still in progress.
    fn conclude_or_pass_turn(&mut self) {
        self.outcome = self.board.outcome();
        if self.outcome == Outcome::Undecided {
            self.current_turn = self.current_turn.opponent();
        }
    }

    fn concluded_plan(&self) -> Vec<Step> {
        vec![
            Step::render(self.render_board(), CONCLUSION_HOLD_MS),
            Step::render(self.conclusion_text(), 0),
        ]
    }

    fn advisory(&self, message: impl Into<String>) -> Vec<Step> {
        // Advisories are informational; the authoritative board view
        // always follows them.
        vec![
            Step::render(message, ADVISORY_HOLD_MS),
            Step::render(self.render_board(), 0),
        ]
    }

    /// The board as a text wall: a status header over the 3x3 grid, with
    /// cell numbers shown in empty cells.
    pub fn render_board(&self) -> String {
        let header = match self.outcome {
            Outcome::Undecided if self.current_turn == self.user_mark => {
                format!("You are {} | Your turn", self.user_mark)
            }
            Outcome::Undecided => format!("You are {} | My turn...", self.user_mark),
            Outcome::Win(mark) if mark == self.user_mark => "You win!".to_string(),
            Outcome::Win(_) => "I win!".to_string(),
            Outcome::Draw => "Draw game".to_string(),
        };
        let cell = |index: usize| match self.board.cell(index) {
            Some(mark) => mark.to_string(),
            None => (index + 1).to_string(),
        };
        format!(
            "{header}\n {} | {} | {}\n---+---+---\n {} | {} | {}\n---+---+---\n {} | {} | {}",
            cell(0),
            cell(1),
            cell(2),
            cell(3),
            cell(4),
            cell(5),
            cell(6),
            cell(7),
            cell(8)
        )
    }

    fn conclusion_text(&self) -> String {
        match self.outcome {
            Outcome::Win(mark) if mark == self.user_mark => {
                "You won this round! Say 'new game' for a rematch.".to_string()
            }
            Outcome::Win(_) => "I won this round! Say 'new game' for a rematch.".to_string(),
            _ => "A draw! Say 'new game' for a rematch.".to_string(),
        }
    }
}
