use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info};

use crate::board::{pair_count, Board, BoardError, FlipOutcome, Ignored, PairResolution, Verdict};
use crate::command::Direction;
use crate::timer::Scheduler;

/// Work the play screen defers to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Settle the pair captured when the second tile was flipped.
    Resolve(PairResolution),
    /// Tell the controller the board is solved.
    EndGame,
}

/// A deferred task tagged with the play session that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayTask {
    pub generation: u64,
    pub deferred: Deferred,
}

/// What a screen asks its controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    EndGame,
}

/// Result of a flip request, as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlipReport {
    pub outcome: FlipOutcome,
    /// A pair just matched; the caller should fire the celebration.
    pub celebrate: bool,
}

/// One play session: the board, the try counter and the grid cursor.
///
/// The board is dealt on first use and kept until the session is dropped.
#[derive(Debug)]
pub struct PlayScreen {
    generation: u64,
    tile_count: usize,
    columns: usize,
    reveal_delay: Duration,
    seed: Option<u64>,
    board: Option<Board>,
    tries: u32,
    cursor: usize,
}

impl PlayScreen {
    pub fn new(generation: u64, tile_count: usize, columns: usize, reveal_delay: Duration) -> Self {
        PlayScreen {
            generation,
            tile_count,
            columns: columns.max(1),
            reveal_delay,
            seed: None,
            board: None,
            tries: 0,
            cursor: 0,
        }
    }

    /// Deal this session's board from `seed` instead of the caller's rng.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Start a session on an already laid-out board (for testing).
    #[cfg(test)]
    pub fn with_board(generation: u64, board: Board, columns: usize, reveal_delay: Duration) -> Self {
        let mut screen = Self::new(generation, board.len(), columns, reveal_delay);
        screen.board = Some(board);
        screen
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Return the session's board, dealing it on the first call.  A seeded
    /// session ignores `rng`.
    pub fn ensure_board<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&Board, BoardError> {
        pair_count(self.tile_count)?;

        let board = match self.board.take() {
            Some(board) => board,
            None => {
                let board = match self.seed {
                    Some(seed) => Board::deal_seeded(self.tile_count, seed)?,
                    None => Board::deal_with(self.tile_count, rng)?,
                };
                info!(
                    generation = self.generation,
                    seed = ?self.seed,
                    tiles = board.len(),
                    "dealt a new board"
                );
                board
            }
        };

        Ok(&*self.board.insert(board))
    }

    // -------------------------------------------------------------------------
    // Flip handling
    // -------------------------------------------------------------------------

    /// Handle the player selecting tile `index`.
    ///
    /// The try counter goes up before the pair's resolution is queued, so
    /// the displayed count covers every comparison already made.
    pub fn flip(&mut self, index: usize, now: Instant, timers: &mut Scheduler<PlayTask>) -> FlipReport {
        let Some(board) = self.board.as_mut() else {
            return FlipReport {
                outcome: FlipOutcome::Ignored(Ignored::OutOfRange),
                celebrate: false,
            };
        };

        let outcome = board.flip(index);
        let mut celebrate = false;

        match outcome {
            FlipOutcome::Ignored(reason) => {
                debug!(index, ?reason, "flip ignored");
            }
            FlipOutcome::FirstReveal => {
                debug!(index, "first tile revealed");
            }
            FlipOutcome::Compared(resolution) => {
                self.tries += 1;
                celebrate = resolution.verdict == Verdict::Match;
                debug!(
                    pair = ?resolution.pair,
                    verdict = ?resolution.verdict,
                    tries = self.tries,
                    "pair compared"
                );
                timers.schedule(
                    now,
                    self.reveal_delay,
                    PlayTask {
                        generation: self.generation,
                        deferred: Deferred::Resolve(resolution),
                    },
                );
            }
        }

        FlipReport { outcome, celebrate }
    }

    /// Flip whatever tile the cursor is on.
    pub fn flip_at_cursor(&mut self, now: Instant, timers: &mut Scheduler<PlayTask>) -> FlipReport {
        self.flip(self.cursor, now, timers)
    }

    /// Run a task that fell due.  Tasks from another session are dropped.
    pub fn on_task(
        &mut self,
        task: PlayTask,
        now: Instant,
        timers: &mut Scheduler<PlayTask>,
    ) -> Option<ScreenAction> {
        if task.generation != self.generation {
            debug!(
                task_generation = task.generation,
                generation = self.generation,
                "dropping stale task"
            );
            return None;
        }

        let board = self.board.as_mut()?;

        match task.deferred {
            Deferred::Resolve(resolution) => {
                let changed = board.resolve(resolution);
                debug!(pair = ?resolution.pair, changed, "pair resolved");

                if board.is_complete() {
                    info!(tries = self.tries, "board solved");
                    timers.schedule(
                        now,
                        Duration::ZERO,
                        PlayTask {
                            generation: self.generation,
                            deferred: Deferred::EndGame,
                        },
                    );
                }
                None
            }
            Deferred::EndGame => Some(ScreenAction::EndGame),
        }
    }

    // -------------------------------------------------------------------------
    // Cursor
    // -------------------------------------------------------------------------

    /// Move the grid cursor one cell, clamped to the board edges.
    pub fn move_cursor(&mut self, dir: Direction) {
        let len = self.board.as_ref().map_or(self.tile_count, Board::len);
        if len == 0 {
            return;
        }

        let cols = self.columns;
        let (row, col) = (self.cursor / cols, self.cursor % cols);
        let next = match dir {
            Direction::Left if col > 0 => self.cursor - 1,
            Direction::Right if col + 1 < cols => self.cursor + 1,
            Direction::Up if row > 0 => self.cursor - cols,
            Direction::Down => self.cursor + cols,
            _ => self.cursor,
        };

        if next < len {
            self.cursor = next;
        }
    }

    /// Point the cursor at a tile (used by mouse clicks).
    pub fn set_cursor(&mut self, index: usize) {
        if self.board.as_ref().is_some_and(|b| index < b.len()) {
            self.cursor = index;
        }
    }
}
