use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::Card;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub id: String,
    pub title: String,
}

impl Column {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: format!("col_{}", Ulid::new()),
            title: title.into(),
        }
    }

    /// Cards in the floating lane are left out of progress accounting.
    pub fn is_floating(&self) -> bool {
        has_word(&self.title, "floating")
    }

    pub fn is_done(&self) -> bool {
        has_word(&self.title, "done")
    }
}

/// Case-insensitive whole-word match, where a word is a run of
/// alphanumerics and underscores.
fn has_word(title: &str, word: &str) -> bool {
    title
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|w| w.eq_ignore_ascii_case(word))
}

/// The aggregate root. `lists` holds the display order of every column's
/// cards; `cards` holds the records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Board {
    pub columns: Vec<Column>,
    pub lists: BTreeMap<String, Vec<String>>,
    pub cards: BTreeMap<String, Card>,
}

impl Board {
    /// First-run board: three working columns, a Floating lane and a card
    /// in each working column.
    pub fn seed() -> Self {
        let todo = Column::new("To-Do");
        let doing = Column::new("Doing");
        let done = Column::new("Done");
        let floating = Column::new("Floating");

        let mut board = Board {
            columns: vec![todo, doing, done, floating],
            ..Default::default()
        };
        for col in &board.columns {
            board.lists.insert(col.id.clone(), Vec::new());
        }

        let seeds = [
            ("Set up project", "Create initial board and categories", "setup", 0),
            ("Draft first tasks", "Outline must-haves", "planning", 1),
            ("Celebrate small wins", "Move a card to Done", "motivation", 2),
        ];
        for (title, notes, tag, col_idx) in seeds {
            let column_id = board.columns[col_idx].id.clone();
            let mut card = Card::new(title, &column_id);
            card.notes = notes.into();
            card.tags = vec![tag.into()];
            board
                .lists
                .entry(column_id)
                .or_default()
                .push(card.id.clone());
            board.cards.insert(card.id.clone(), card);
        }
        board
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_mut(&mut self, id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == id)
    }

    pub fn has_column(&self, id: &str) -> bool {
        self.column(id).is_some()
    }

    pub fn find_card(&self, id: &str) -> Option<&Card> {
        self.cards.get(id)
    }

    /// Card ids of a column in display order.
    pub fn list(&self, column_id: &str) -> &[String] {
        self.lists.get(column_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Card records of a column in display order. Dangling ids are skipped.
    pub fn column_cards(&self, column_id: &str) -> Vec<&Card> {
        self.list(column_id)
            .iter()
            .filter_map(|id| self.cards.get(id))
            .collect()
    }

    /// The column whose list currently holds `card_id`.
    pub fn list_of(&self, card_id: &str) -> Option<&str> {
        self.lists
            .iter()
            .find(|(_, ids)| ids.iter().any(|id| id == card_id))
            .map(|(col, _)| col.as_str())
    }

    pub fn floating_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_floating())
    }

    pub fn done_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_done())
    }

    /// Resolve a column by id, or by case-insensitive title.
    pub fn resolve_column(&self, id_or_title: &str) -> Option<&Column> {
        self.column(id_or_title).or_else(|| {
            self.columns
                .iter()
                .find(|c| c.title.eq_ignore_ascii_case(id_or_title.trim()))
        })
    }

    /// Resolve a card by id, or by 1-based number in board display order
    /// (columns left to right, cards top to bottom).
    pub fn resolve_card(&self, id_or_num: &str) -> Option<&Card> {
        if let Ok(num) = id_or_num.parse::<usize>() {
            self.display_order().get(num.wrapping_sub(1)).copied()
        } else {
            self.find_card(id_or_num)
        }
    }

    pub fn display_order(&self) -> Vec<&Card> {
        self.columns
            .iter()
            .flat_map(|col| self.column_cards(&col.id))
            .collect()
    }

    /// Give every column a list. Imported documents may omit empty ones.
    pub fn normalize(&mut self) {
        for col in &self.columns {
            self.lists.entry(col.id.clone()).or_default();
        }
    }

    /// Every violated structural invariant, described. Empty when the
    /// board is consistent.
    pub fn violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();

        for (col_id, ids) in &self.lists {
            if !self.has_column(col_id) {
                problems.push(format!("list {col_id} has no column"));
            }
            for id in ids {
                if let Some(prev) = seen.insert(id, col_id) {
                    problems.push(format!("card {id} listed in {prev} and {col_id}"));
                }
                match self.cards.get(id) {
                    None => problems.push(format!("list {col_id} references missing card {id}")),
                    Some(card) if card.column_id != *col_id => problems.push(format!(
                        "card {id} says column {} but is listed in {col_id}",
                        card.column_id
                    )),
                    Some(_) => {}
                }
            }
        }
        for col in &self.columns {
            if !self.lists.contains_key(&col.id) {
                problems.push(format!("column {} has no list", col.id));
            }
        }
        for id in self.cards.keys() {
            if !seen.contains_key(id.as_str()) {
                problems.push(format!("card {id} is in no list"));
            }
        }
        problems
    }
}
