use std::collections::HashSet;

use super::Board;

/// Completion summary shown in the title bar. Floating cards count
/// towards neither side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn of(board: &Board) -> Self {
        let floating: HashSet<&str> = board
            .floating_column()
            .map(|c| board.list(&c.id).iter().map(String::as_str).collect())
            .unwrap_or_default();

        let counted = |id: &&String| !floating.contains(id.as_str());
        let total = board.cards.keys().filter(counted).count();
        let completed = board
            .done_column()
            .map(|c| {
                board
                    .list(&c.id)
                    .iter()
                    .filter(counted)
                    .filter(|id| board.cards.contains_key(id.as_str()))
                    .count()
            })
            .unwrap_or(0);

        Self { completed, total }
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.completed as f64 / self.total as f64 * 100.0).round() as u8
    }

    pub fn label(&self) -> String {
        format!("{} of {} done", self.completed, self.total)
    }
}
