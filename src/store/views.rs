use super::BoardObserver;
use crate::model::{Board, Progress};

/// State derived from the board and recomputed on every change: the
/// progress summary and the column selector choices.
#[derive(Debug, Clone, Default)]
pub struct DerivedViews {
    progress: Progress,
    column_options: Vec<(String, String)>,
}

impl DerivedViews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// `(column id, title)` in board order.
    pub fn column_options(&self) -> &[(String, String)] {
        &self.column_options
    }
}

impl BoardObserver for DerivedViews {
    fn board_changed(&mut self, board: &Board) {
        self.progress = Progress::of(board);
        self.column_options = board
            .columns
            .iter()
            .map(|c| (c.id.clone(), c.title.clone()))
            .collect();
    }
}
