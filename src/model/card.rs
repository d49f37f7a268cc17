use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{LanesError, Result};

pub const DEFAULT_COLOR: &str = "#ffffff";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub due: Option<NaiveDate>,
    #[serde(default, with = "hhmm")]
    pub due_time: Option<NaiveTime>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub column_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

fn default_color() -> String {
    DEFAULT_COLOR.into()
}

impl Card {
    pub fn new(title: impl Into<String>, column_id: impl Into<String>) -> Self {
        Self {
            id: format!("card_{}", Ulid::new()),
            title: title.into(),
            notes: String::new(),
            due: None,
            due_time: None,
            color: default_color(),
            tags: Vec::new(),
            column_id: column_id.into(),
            // stored as epoch milliseconds
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// Build a card from a validated draft.
    pub fn from_draft(draft: CardDraft) -> Self {
        let mut card = Card::new(draft.title, draft.column_id);
        card.notes = draft.notes;
        card.due = draft.due;
        card.due_time = draft.due_time;
        card.color = draft.color;
        card.tags = draft.tags;
        card
    }

    /// Overwrite the editable fields. `column_id` is left alone; moving
    /// between lists is the store's job.
    pub fn apply(&mut self, draft: &CardDraft) {
        self.title = draft.title.clone();
        self.notes = draft.notes.clone();
        self.due = draft.due;
        self.due_time = draft.due_time;
        self.color = draft.color.clone();
        self.tags = draft.tags.clone();
    }

    pub fn has_custom_color(&self) -> bool {
        !self.color.eq_ignore_ascii_case(DEFAULT_COLOR)
    }

    /// The moment the card falls due: the given time, or the last second of
    /// the day when no time is set.
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        let date = self.due?;
        let time = self
            .due_time
            .or_else(|| NaiveTime::from_hms_opt(23, 59, 59))?;
        Some(date.and_time(time))
    }

    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        self.due_at().is_some_and(|due| due < now)
    }

    /// "Mar 4" or "Mar 4 3:05 PM".
    pub fn due_label(&self) -> Option<String> {
        let date = self.due?;
        let mut label = date.format("%b %-d").to_string();
        if let Some(time) = self.due_time {
            label.push(' ');
            label.push_str(&time.format("%-I:%M %p").to_string());
        }
        Some(label)
    }
}

/// The fields collected by the add/edit sheet, already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDraft {
    pub title: String,
    pub notes: String,
    pub due: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub color: String,
    pub tags: Vec<String>,
    pub column_id: String,
}

impl CardDraft {
    pub fn new(title: impl Into<String>, column_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            notes: String::new(),
            due: None,
            due_time: None,
            color: default_color(),
            tags: Vec::new(),
            column_id: column_id.into(),
        }
    }

    /// Rejects an empty title and a due date before `today`.
    /// Trims the title and notes in place.
    pub fn validate(&mut self, today: NaiveDate) -> Result<()> {
        self.title = self.title.trim().to_string();
        self.notes = self.notes.trim().to_string();
        if self.title.is_empty() {
            return Err(LanesError::EmptyTitle);
        }
        if let Some(due) = self.due
            && due < today
        {
            return Err(LanesError::PastDueDate(due));
        }
        Ok(())
    }

    pub fn validate_now(&mut self) -> Result<()> {
        self.validate(Local::now().date_naive())
    }
}

pub fn parse_due(raw: &str) -> Result<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| LanesError::InvalidDate(raw.into()))
}

pub fn parse_time(raw: &str) -> Result<Option<NaiveTime>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map(Some)
        .map_err(|_| LanesError::InvalidTime(raw.into()))
}

/// Comma-separated tags, trimmed, empties dropped.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// `#rrggbb`; empty input means the default white.
pub fn parse_color(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default_color());
    }
    let hex = raw
        .strip_prefix('#')
        .filter(|h| h.len() == 6 && h.chars().all(|c| c.is_ascii_hexdigit()));
    match hex {
        Some(h) => Ok(format!("#{}", h.to_ascii_lowercase())),
        None => Err(LanesError::InvalidColor(raw.into())),
    }
}

/// Splits a `#rrggbb` string into its channels.
pub fn color_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let h = hex.strip_prefix('#').filter(|h| h.len() == 6)?;
    let r = u8::from_str_radix(&h[0..2], 16).ok()?;
    let g = u8::from_str_radix(&h[2..4], 16).ok()?;
    let b = u8::from_str_radix(&h[4..6], 16).ok()?;
    Some((r, g, b))
}

/// `dueTime` is stored as "HH:MM".
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_time(s).map_err(serde::de::Error::custom),
        }
    }
}
