use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::BoardObserver;
use crate::error::Result;
use crate::model::Board;
use crate::storage::Storage;

/// Writes the board to disk shortly after it stops changing.
///
/// Each change takes a snapshot and pushes the deadline out by the
/// debounce interval; [`Persister::poll`] writes once the deadline has
/// passed. A failed write is logged and retried after another interval.
pub struct Persister {
    storage: Storage,
    debounce: Duration,
    pending: Option<Board>,
    deadline: Option<Instant>,
    saves: usize,
}

impl Persister {
    pub fn new(storage: Storage, debounce: Duration) -> Self {
        Self {
            storage,
            debounce,
            pending: None,
            deadline: None,
            saves: 0,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    /// Successful writes so far.
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Write if the debounce deadline has passed. Returns whether a write
    /// happened.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => match self.write() {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "saving board failed, will retry");
                    self.deadline = Some(now + self.debounce);
                    false
                }
            },
            _ => false,
        }
    }

    /// Write now if anything is pending.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_some() {
            self.write()?;
        }
        Ok(())
    }

    fn write(&mut self) -> Result<()> {
        if let Some(board) = &self.pending {
            self.storage.save_board(board)?;
            self.saves += 1;
        }
        self.pending = None;
        self.deadline = None;
        Ok(())
    }
}

impl BoardObserver for Persister {
    fn board_changed(&mut self, board: &Board) {
        self.pending = Some(board.clone());
        self.deadline = Some(Instant::now() + self.debounce);
        debug!(debounce_ms = self.debounce.as_millis() as u64, "save scheduled");
    }
}
