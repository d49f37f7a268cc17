use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{LanesError, Result};
use crate::model::{Board, Card, CardDraft, Column};

/// Something that wants to hear about every committed change.
pub trait BoardObserver {
    fn board_changed(&mut self, board: &Board);
}

pub type SharedObserver = Rc<RefCell<dyn BoardObserver>>;

/// Owns the board and is the only place it is mutated. Every successful
/// mutation ends with one change notification to every observer.
pub struct BoardStore {
    board: Board,
    observers: Vec<SharedObserver>,
}

impl BoardStore {
    pub fn new(mut board: Board) -> Self {
        board.normalize();
        Self {
            board,
            observers: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Register an observer and bring it up to date immediately.
    pub fn subscribe(&mut self, observer: SharedObserver) {
        observer.borrow_mut().board_changed(&self.board);
        self.observers.push(observer);
    }

    fn notify(&self) {
        for observer in &self.observers {
            observer.borrow_mut().board_changed(&self.board);
        }
    }

    /// Move a card into `target` before `before`, or to the tail when
    /// `before` is absent or not in that list. Unknown card or column ids
    /// are ignored.
    pub fn move_card(&mut self, card_id: &str, target: &str, before: Option<&str>) {
        if self.relocate(card_id, target, before) {
            self.notify();
        }
    }

    fn relocate(&mut self, card_id: &str, target: &str, before: Option<&str>) -> bool {
        if !self.board.cards.contains_key(card_id) || !self.board.has_column(target) {
            debug!(card = %card_id, column = %target, "ignoring move of unknown card or column");
            return false;
        }
        for ids in self.board.lists.values_mut() {
            if let Some(pos) = ids.iter().position(|id| id == card_id) {
                ids.remove(pos);
                break;
            }
        }
        let list = self.board.lists.entry(target.to_string()).or_default();
        let at = before
            .and_then(|b| list.iter().position(|id| id == b))
            .unwrap_or(list.len());
        list.insert(at, card_id.to_string());

        if let Some(card) = self.board.cards.get_mut(card_id) {
            card.column_id = target.to_string();
        }
        debug!(card = %card_id, column = %target, index = at, "card moved");
        true
    }

    /// Replace the column order. Ids missing from `order` leave the order
    /// (their list and cards stay); repeated ids count once; unknown ids
    /// are skipped.
    pub fn move_column(&mut self, order: &[String]) {
        let mut seen = HashSet::new();
        let columns: Vec<Column> = order
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| self.board.column(id).cloned())
            .collect();
        if columns.len() != self.board.columns.len() {
            debug!(
                kept = columns.len(),
                had = self.board.columns.len(),
                "column reorder dropped columns"
            );
        }
        self.board.columns = columns;
        self.notify();
    }

    /// Validate and append a new card; returns its id. An empty column id
    /// means the first column.
    pub fn add_card(&mut self, mut draft: CardDraft, today: NaiveDate) -> Result<String> {
        draft.validate(today)?;
        if draft.column_id.is_empty() {
            draft.column_id = self
                .board
                .columns
                .first()
                .map(|c| c.id.clone())
                .ok_or_else(|| LanesError::Other("Board has no columns".into()))?;
        }
        if !self.board.has_column(&draft.column_id) {
            return Err(LanesError::ColumnNotFound(draft.column_id));
        }
        let card = Card::from_draft(draft);
        let id = card.id.clone();
        self.board
            .lists
            .entry(card.column_id.clone())
            .or_default()
            .push(id.clone());
        info!(card = %id, column = %card.column_id, "card added");
        self.board.cards.insert(id.clone(), card);
        self.notify();
        Ok(id)
    }

    /// Overwrite a card from an edit. A changed column moves the card to
    /// the tail of the new column.
    pub fn update_card(&mut self, card_id: &str, mut draft: CardDraft, today: NaiveDate) -> Result<()> {
        draft.validate(today)?;
        if !self.board.has_column(&draft.column_id) {
            return Err(LanesError::ColumnNotFound(draft.column_id));
        }
        let card = self
            .board
            .cards
            .get_mut(card_id)
            .ok_or_else(|| LanesError::CardNotFound(card_id.into()))?;
        card.apply(&draft);
        if card.column_id != draft.column_id {
            self.relocate(card_id, &draft.column_id, None);
        }
        info!(card = %card_id, "card updated");
        self.notify();
        Ok(())
    }

    /// Remove a card from its list and the records. Returns whether it
    /// existed.
    pub fn delete_card(&mut self, card_id: &str) -> bool {
        for ids in self.board.lists.values_mut() {
            ids.retain(|id| id != card_id);
        }
        let existed = self.board.cards.remove(card_id).is_some();
        if existed {
            info!(card = %card_id, "card deleted");
            self.notify();
        }
        existed
    }

    /// Append an empty column; returns its id.
    pub fn add_column(&mut self, title: &str) -> Result<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LanesError::EmptyTitle);
        }
        let col = Column::new(title);
        let id = col.id.clone();
        self.board.lists.insert(id.clone(), Vec::new());
        self.board.columns.push(col);
        info!(column = %id, title, "column added");
        self.notify();
        Ok(id)
    }

    /// Remove a column, its list and every card in it. Any column may be
    /// deleted, including the floating one.
    pub fn delete_column(&mut self, column_id: &str) -> bool {
        if !self.board.has_column(column_id) {
            return false;
        }
        let ids = self.board.lists.remove(column_id).unwrap_or_default();
        for id in &ids {
            self.board.cards.remove(id);
        }
        self.board.columns.retain(|c| c.id != column_id);
        info!(column = %column_id, cards = ids.len(), "column deleted");
        self.notify();
        true
    }

    /// Rename in place; blank titles become "Untitled".
    pub fn rename_column(&mut self, column_id: &str, title: &str) -> bool {
        let Some(col) = self.board.column_mut(column_id) else {
            return false;
        };
        let title = title.trim();
        col.title = if title.is_empty() {
            "Untitled".into()
        } else {
            title.into()
        };
        debug!(column = %column_id, title = %col.title, "column renamed");
        self.notify();
        true
    }

    /// Swap in a whole board, e.g. from an import.
    pub fn replace(&mut self, mut board: Board) {
        board.normalize();
        self.board = board;
        info!(
            columns = self.board.columns.len(),
            cards = self.board.cards.len(),
            "board replaced"
        );
        self.notify();
    }

    /// Start over from the seed board.
    pub fn reset(&mut self) {
        self.replace(Board::seed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
    }

    fn ids(board: &Board, col: usize) -> Vec<String> {
        board.list(&board.columns[col].id).to_vec()
    }

    /// Columns A, B with cards a1 a2 a3 in A and b1 in B.
    fn store() -> BoardStore {
        let mut store = BoardStore::new(Board::default());
        let a = store.add_column("A").unwrap();
        let b = store.add_column("B").unwrap();
        for (title, col) in [("a1", &a), ("a2", &a), ("a3", &a), ("b1", &b)] {
            store.add_card(CardDraft::new(title, col.as_str()), today()).unwrap();
        }
        store
    }

    fn id_of(store: &BoardStore, title: &str) -> String {
        store
            .board()
            .cards
            .values()
            .find(|c| c.title == title)
            .unwrap()
            .id
            .clone()
    }

    struct Counter(usize);

    impl BoardObserver for Counter {
        fn board_changed(&mut self, _board: &Board) {
            self.0 += 1;
        }
    }

    #[test]
    fn move_card_before_target() {
        let mut s = store();
        let (a1, a3, b1) = (id_of(&s, "a1"), id_of(&s, "a3"), id_of(&s, "b1"));
        let a = s.board().columns[0].id.clone();
        s.move_card(&b1, &a, Some(&a3));
        let board = s.board();
        assert_eq!(ids(board, 0), vec![a1.clone(), id_of(&s, "a2"), b1.clone(), a3]);
        assert_eq!(board.cards[&b1].column_id, a);
        assert!(ids(board, 1).is_empty());
        assert!(board.violations().is_empty());
    }

    #[test]
    fn move_card_without_before_appends() {
        let mut s = store();
        let a1 = id_of(&s, "a1");
        let b = s.board().columns[1].id.clone();
        s.move_card(&a1, &b, None);
        assert_eq!(ids(s.board(), 1).last(), Some(&a1));
    }

    #[test]
    fn move_card_with_missing_before_appends() {
        let mut s = store();
        let a1 = id_of(&s, "a1");
        let b = s.board().columns[1].id.clone();
        s.move_card(&a1, &b, Some("card_gone"));
        assert_eq!(ids(s.board(), 1).last(), Some(&a1));
    }

    #[test]
    fn move_card_to_same_position_is_idempotent() {
        let mut s = store();
        let (a2, a3) = (id_of(&s, "a2"), id_of(&s, "a3"));
        let a = s.board().columns[0].id.clone();
        let before = ids(s.board(), 0);
        s.move_card(&a2, &a, Some(&a3));
        assert_eq!(ids(s.board(), 0), before);
        let a3_again = id_of(&s, "a3");
        s.move_card(&a3_again, &a, None);
        assert_eq!(ids(s.board(), 0), before);
    }

    #[test]
    fn move_unknown_card_is_a_silent_noop() {
        let mut s = store();
        let counter = Rc::new(RefCell::new(Counter(0)));
        s.subscribe(counter.clone());
        let before = s.board().clone();
        let a = s.board().columns[0].id.clone();
        let a1 = id_of(&s, "a1");
        s.move_card("card_nope", &a, None);
        s.move_card(&a1, "col_nope", None);
        assert_eq!(s.board(), &before);
        assert_eq!(counter.borrow().0, 1);
    }

    #[test]
    fn move_column_reorders() {
        let mut s = store();
        let c = s.add_column("C").unwrap();
        let cols: Vec<String> = s.board().columns.iter().map(|c| c.id.clone()).collect();
        let lists_before = s.board().lists.clone();
        s.move_column(&[c.clone(), cols[0].clone(), cols[1].clone()]);
        let titles: Vec<&str> = s.board().columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
        assert_eq!(s.board().lists, lists_before);
    }

    #[test]
    fn move_column_missing_id_keeps_data() {
        let mut s = store();
        let cols: Vec<String> = s.board().columns.iter().map(|c| c.id.clone()).collect();
        s.move_column(&[cols[1].clone()]);
        assert_eq!(s.board().columns.len(), 1);
        assert_eq!(s.board().list(&cols[0]).len(), 3);
        assert_eq!(s.board().cards.len(), 4);
    }

    #[test]
    fn move_column_duplicates_keep_first() {
        let mut s = store();
        let cols: Vec<String> = s.board().columns.iter().map(|c| c.id.clone()).collect();
        s.move_column(&[cols[1].clone(), cols[0].clone(), cols[1].clone()]);
        let order: Vec<&str> = s.board().columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec![cols[1].as_str(), cols[0].as_str()]);
    }

    #[test]
    fn add_card_rejects_invalid_draft_without_touching_state() {
        let mut s = store();
        let before = s.board().clone();
        let col = before.columns[0].id.clone();
        assert!(matches!(
            s.add_card(CardDraft::new("  ", col.as_str()), today()),
            Err(LanesError::EmptyTitle)
        ));
        let mut past = CardDraft::new("Late", col.as_str());
        past.due = NaiveDate::from_ymd_opt(2029, 12, 31);
        assert!(s.add_card(past, today()).is_err());
        assert!(matches!(
            s.add_card(CardDraft::new("x", "col_nope"), today()),
            Err(LanesError::ColumnNotFound(_))
        ));
        assert_eq!(s.board(), &before);
    }

    #[test]
    fn add_card_defaults_to_first_column() {
        let mut s = store();
        let id = s.add_card(CardDraft::new("Loose", ""), today()).unwrap();
        assert_eq!(ids(s.board(), 0).last(), Some(&id));
    }

    #[test]
    fn update_card_moving_column_goes_to_tail() {
        let mut s = store();
        let a1 = id_of(&s, "a1");
        let b = s.board().columns[1].id.clone();
        let mut draft = CardDraft::new("a1 edited", b.as_str());
        draft.tags = vec!["x".into()];
        s.update_card(&a1, draft, today()).unwrap();
        let board = s.board();
        assert_eq!(board.cards[&a1].title, "a1 edited");
        assert_eq!(board.cards[&a1].column_id, b);
        assert_eq!(ids(board, 1).last(), Some(&a1));
        assert!(board.violations().is_empty());
    }

    #[test]
    fn update_unknown_card_errors() {
        let mut s = store();
        let a = s.board().columns[0].id.clone();
        assert!(matches!(
            s.update_card("card_nope", CardDraft::new("x", a.as_str()), today()),
            Err(LanesError::CardNotFound(_))
        ));
    }

    #[test]
    fn delete_card_removes_record_and_list_entry() {
        let mut s = store();
        let a2 = id_of(&s, "a2");
        assert!(s.delete_card(&a2));
        assert!(!s.board().cards.contains_key(&a2));
        assert_eq!(ids(s.board(), 0).len(), 2);
        assert!(!s.delete_card(&a2));
    }

    #[test]
    fn delete_column_cascades() {
        let mut s = store();
        let a = s.board().columns[0].id.clone();
        let doomed: Vec<String> = s.board().list(&a).to_vec();
        assert!(s.delete_column(&a));
        let board = s.board();
        assert!(!board.lists.contains_key(&a));
        assert!(doomed.iter().all(|id| !board.cards.contains_key(id)));
        assert_eq!(board.cards.len(), 1);
        assert!(board.violations().is_empty());
    }

    #[test]
    fn floating_column_is_deletable() {
        let mut s = BoardStore::new(Board::seed());
        let floating = s.board().floating_column().unwrap().id.clone();
        assert!(s.delete_column(&floating));
        assert!(s.board().floating_column().is_none());
    }

    #[test]
    fn rename_column_trims_and_defaults() {
        let mut s = store();
        let a = s.board().columns[0].id.clone();
        s.rename_column(&a, "  Backlog ");
        assert_eq!(s.board().columns[0].title, "Backlog");
        s.rename_column(&a, "   ");
        assert_eq!(s.board().columns[0].title, "Untitled");
        assert!(!s.rename_column("col_nope", "x"));
    }

    #[test]
    fn add_column_rejects_blank() {
        let mut s = store();
        assert!(s.add_column("  ").is_err());
        assert_eq!(s.board().columns.len(), 2);
    }

    #[test]
    fn every_mutation_notifies_once() {
        let mut s = store();
        let counter = Rc::new(RefCell::new(Counter(0)));
        s.subscribe(counter.clone());
        let a1 = id_of(&s, "a1");
        let b = s.board().columns[1].id.clone();
        s.move_card(&a1, &b, None);
        s.rename_column(&b, "Bee");
        s.delete_card(&a1);
        assert_eq!(counter.borrow().0, 4);
    }

    #[test]
    fn reset_restores_seed() {
        let mut s = store();
        s.reset();
        assert_eq!(s.board().columns.len(), 4);
        assert_eq!(s.board().columns[3].title, "Floating");
    }
}
