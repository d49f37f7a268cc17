use crate::error::Result;
use crate::model::{Card, CardDraft, DEFAULT_COLOR, parse_color, parse_due, parse_tags, parse_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Due,
    Time,
    Column,
    Tags,
    Color,
    Notes,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Title,
        Field::Due,
        Field::Time,
        Field::Column,
        Field::Tags,
        Field::Color,
        Field::Notes,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Due => "Due date",
            Field::Time => "Due time",
            Field::Column => "Category",
            Field::Tags => "Tags",
            Field::Color => "Colour",
            Field::Notes => "Notes",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            Field::Due => "YYYY-MM-DD",
            Field::Time => "HH:MM",
            Field::Tags => "comma, separated",
            Field::Color => "#rrggbb",
            _ => "",
        }
    }

    fn step(self, by: isize) -> Field {
        let i = Field::ALL.iter().position(|f| *f == self).unwrap_or(0) as isize;
        let n = Field::ALL.len() as isize;
        Field::ALL[(i + by).rem_euclid(n) as usize]
    }
}

/// The add/edit form. Text fields hold raw input; parsing happens on save.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// The card being edited; `None` for a new card.
    pub editing: Option<String>,
    pub title: String,
    pub due: String,
    pub time: String,
    pub column_id: String,
    pub tags: String,
    pub color: String,
    pub notes: String,
    pub focus: Field,
    pub error: Option<String>,
}

impl Sheet {
    pub fn add(column_id: impl Into<String>) -> Self {
        Self {
            editing: None,
            title: String::new(),
            due: String::new(),
            time: String::new(),
            column_id: column_id.into(),
            tags: String::new(),
            color: DEFAULT_COLOR.into(),
            notes: String::new(),
            focus: Field::Title,
            error: None,
        }
    }

    pub fn edit(card: &Card) -> Self {
        Self {
            editing: Some(card.id.clone()),
            title: card.title.clone(),
            due: card.due.map(|d| d.to_string()).unwrap_or_default(),
            time: card
                .due_time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            column_id: card.column_id.clone(),
            tags: card.tags.join(", "),
            color: card.color.clone(),
            notes: card.notes.clone(),
            focus: Field::Title,
            error: None,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    /// Nothing typed yet, so it can be dismissed without losing work.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.due.trim().is_empty()
            && self.time.trim().is_empty()
            && self.tags.trim().is_empty()
            && self.notes.trim().is_empty()
            && (self.color.trim().is_empty() || self.color.trim().eq_ignore_ascii_case(DEFAULT_COLOR))
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.step(1);
    }

    pub fn prev_field(&mut self) {
        self.focus = self.focus.step(-1);
    }

    /// The text buffer behind the focused field; the category has none.
    pub fn buffer_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Title => Some(&mut self.title),
            Field::Due => Some(&mut self.due),
            Field::Time => Some(&mut self.time),
            Field::Column => None,
            Field::Tags => Some(&mut self.tags),
            Field::Color => Some(&mut self.color),
            Field::Notes => Some(&mut self.notes),
        }
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Due => &self.due,
            Field::Time => &self.time,
            Field::Column => &self.column_id,
            Field::Tags => &self.tags,
            Field::Color => &self.color,
            Field::Notes => &self.notes,
        }
    }

    /// Step the category through `options`, wrapping around.
    pub fn cycle_column(&mut self, options: &[(String, String)], by: isize) {
        if options.is_empty() {
            return;
        }
        let i = options
            .iter()
            .position(|(id, _)| *id == self.column_id)
            .unwrap_or(0) as isize;
        let n = options.len() as isize;
        self.column_id = options[(i + by).rem_euclid(n) as usize].0.clone();
    }

    /// Keep the selection if it still exists, otherwise fall back to the
    /// first option.
    pub fn sync_columns(&mut self, options: &[(String, String)]) {
        if !options.iter().any(|(id, _)| *id == self.column_id)
            && let Some((id, _)) = options.first()
        {
            self.column_id = id.clone();
        }
    }

    /// Parse the raw fields. Title and due-date rules are checked by the
    /// store.
    pub fn to_draft(&self) -> Result<CardDraft> {
        let mut draft = CardDraft::new(self.title.clone(), self.column_id.clone());
        draft.notes = self.notes.clone();
        draft.due = parse_due(&self.due)?;
        draft.due_time = parse_time(&self.time)?;
        draft.tags = parse_tags(&self.tags);
        draft.color = parse_color(&self.color)?;
        Ok(draft)
    }
}
