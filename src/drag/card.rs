use std::time::{Duration, Instant};

use tracing::debug;

use super::{DragTuning, Modality};
use crate::geometry::{HitMap, Point, Rect};

/// Where the placeholder currently reserves space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub column_id: String,
    /// Position among the column's visible cards (the dragged card excluded).
    pub index: usize,
    /// The visible card right after the placeholder, if any.
    pub before: Option<String>,
    pub height: i32,
}

/// Pointer is down on a card but the gesture is not yet a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCardDrag {
    pub card_id: String,
    pub column_id: String,
    pub card_rect: Rect,
    pub start: Point,
    pub last: Point,
    pub modality: Modality,
    /// Long-press deadline; only coarse pointers arm it.
    pub long_press: Option<Instant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveCardDrag {
    pub card_id: String,
    pub source_column: String,
    /// Pointer offset inside the card at the moment it was grabbed.
    pub grab: (i32, i32),
    /// Where the detached proxy is drawn.
    pub proxy: Rect,
    pub placeholder: Placeholder,
    /// Column under the pointer, highlighted while dragging.
    pub hovered: Option<String>,
    pub pointer: Point,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CardDrag {
    #[default]
    Idle,
    Pending(PendingCardDrag),
    Active(ActiveCardDrag),
}

/// What a released gesture amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardDrop {
    /// Nothing to do.
    None,
    /// Released before the gesture became a drag: an ordinary click.
    Tap { card_id: String },
    /// Released over a column.
    Move {
        card_id: String,
        column_id: String,
        before: Option<String>,
    },
    /// Released outside every column. Needs confirmation before anything
    /// is removed.
    Delete { card_id: String },
}

/// Drag lifecycle of a single card: `Idle -> Pending -> Active -> Idle`.
#[derive(Debug, Clone)]
pub struct CardDragEngine {
    state: CardDrag,
    threshold: i32,
    long_press: Duration,
}

impl CardDragEngine {
    pub fn new(tuning: &DragTuning) -> Self {
        Self {
            state: CardDrag::Idle,
            threshold: tuning.threshold,
            long_press: Duration::from_millis(tuning.long_press_ms),
        }
    }

    pub fn state(&self) -> &CardDrag {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveCardDrag> {
        match &self.state {
            CardDrag::Active(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, CardDrag::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CardDrag::Active(_))
    }

    /// Pointer went down on a card. Ignored unless idle.
    pub fn press(
        &mut self,
        card_id: &str,
        column_id: &str,
        card_rect: Rect,
        pointer: Point,
        modality: Modality,
        now: Instant,
    ) -> bool {
        if !self.is_idle() {
            return false;
        }
        let long_press = match modality {
            Modality::Coarse => Some(now + self.long_press),
            Modality::Precise => None,
        };
        self.state = CardDrag::Pending(PendingCardDrag {
            card_id: card_id.into(),
            column_id: column_id.into(),
            card_rect,
            start: pointer,
            last: pointer,
            modality,
            long_press,
        });
        true
    }

    /// Returns `true` when this move turned a pending press into a drag.
    pub fn pointer_move(&mut self, pointer: Point, map: &HitMap) -> bool {
        match &mut self.state {
            CardDrag::Idle => false,
            CardDrag::Pending(p) => {
                p.last = pointer;
                let (dx, dy) = pointer.offset_from(p.start);
                if dx.abs() > self.threshold || dy.abs() > self.threshold {
                    self.activate(map);
                    true
                } else {
                    false
                }
            }
            CardDrag::Active(_) => {
                self.track(pointer, map);
                false
            }
        }
    }

    /// Fires the long-press timer. Returns `true` when it started the drag.
    pub fn tick(&mut self, now: Instant, map: &HitMap) -> bool {
        let due = matches!(
            &self.state,
            CardDrag::Pending(p) if p.long_press.is_some_and(|at| now >= at)
        );
        if due {
            self.activate(map);
        }
        due
    }

    /// Re-run move handling at the last pointer position, for when the
    /// content moved under a still pointer.
    pub fn refresh(&mut self, map: &HitMap) {
        if let CardDrag::Active(a) = &self.state {
            let pointer = a.pointer;
            self.track(pointer, map);
        }
    }

    /// Pointer released (or cancelled). Always returns the engine to idle.
    pub fn release(&mut self, pointer: Point, map: &HitMap) -> CardDrop {
        if self.is_active() {
            self.track(pointer, map);
        }
        match std::mem::take(&mut self.state) {
            CardDrag::Idle => CardDrop::None,
            // the long-press timer dies with the pending state
            CardDrag::Pending(p) => CardDrop::Tap { card_id: p.card_id },
            CardDrag::Active(a) => match a.hovered {
                None => {
                    debug!(card = %a.card_id, "card dropped outside any column");
                    CardDrop::Delete { card_id: a.card_id }
                }
                Some(column_id) => {
                    debug!(
                        card = %a.card_id,
                        column = %column_id,
                        before = ?a.placeholder.before,
                        "card dropped"
                    );
                    CardDrop::Move {
                        card_id: a.card_id,
                        column_id,
                        before: a.placeholder.before,
                    }
                }
            },
        }
    }

    fn activate(&mut self, map: &HitMap) {
        let CardDrag::Pending(p) = std::mem::take(&mut self.state) else {
            return;
        };
        let (index, before) = map
            .column(&p.column_id)
            .and_then(|col| {
                let visible: Vec<&str> = col.cards.iter().map(|c| c.card_id.as_str()).collect();
                let at = visible.iter().position(|id| *id == p.card_id)?;
                let next = visible[at + 1..].first().map(|s| s.to_string());
                Some((at, next))
            })
            .unwrap_or((0, None));

        debug!(card = %p.card_id, modality = ?p.modality, "card drag started");
        let grab = p.start.offset_from(p.card_rect.origin());
        self.state = CardDrag::Active(ActiveCardDrag {
            card_id: p.card_id,
            source_column: p.column_id.clone(),
            grab,
            proxy: p.card_rect,
            placeholder: Placeholder {
                column_id: p.column_id,
                index,
                before,
                height: p.card_rect.height,
            },
            hovered: None,
            pointer: p.last,
        });
        self.track(p.last, map);
    }

    fn track(&mut self, pointer: Point, map: &HitMap) {
        let CardDrag::Active(a) = &mut self.state else {
            return;
        };
        a.pointer = pointer;
        a.proxy.x = pointer.x - a.grab.0;
        a.proxy.y = pointer.y - a.grab.1;

        match map.column_at(pointer) {
            Some(col) => {
                let (index, before) = col.card_insertion(pointer, &a.card_id);
                a.hovered = Some(col.column_id.clone());
                a.placeholder.column_id = col.column_id.clone();
                a.placeholder.index = index;
                a.placeholder.before = before;
            }
            None => {
                a.hovered = None;
                if a.placeholder.column_id != a.source_column {
                    let len = map
                        .column(&a.source_column)
                        .map(|c| c.cards.iter().filter(|c| c.card_id != a.card_id).count())
                        .unwrap_or(0);
                    a.placeholder.column_id = a.source_column.clone();
                    a.placeholder.index = len;
                    a.placeholder.before = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CardRegion, ColumnRegion, HeaderRegions};

    fn column(id: &str, x: i32, cards: &[&str]) -> ColumnRegion {
        ColumnRegion {
            column_id: id.into(),
            rect: Rect::new(x, 0, 10, 40),
            header: HeaderRegions {
                rect: Rect::new(x, 0, 10, 2),
                grip: Rect::new(x, 1, 1, 1),
                title: Rect::new(x + 2, 1, 5, 1),
                tools: Vec::new(),
            },
            cards: cards
                .iter()
                .enumerate()
                .map(|(i, c)| CardRegion {
                    card_id: c.to_string(),
                    rect: Rect::new(x, 2 + 4 * i as i32, 10, 4),
                })
                .collect(),
        }
    }

    fn map() -> HitMap {
        HitMap {
            viewport: Rect::new(0, 0, 40, 40),
            columns: vec![column("todo", 0, &["a", "b", "c"]), column("done", 12, &["d"])],
        }
    }

    fn engine() -> CardDragEngine {
        CardDragEngine::new(&DragTuning::pixels())
    }

    fn press(e: &mut CardDragEngine, modality: Modality, now: Instant) {
        // card "a" sits at (0, 2) 10x4
        assert!(e.press("a", "todo", Rect::new(0, 2, 10, 4), Point::new(3, 3), modality, now));
    }

    #[test]
    fn mouse_click_without_movement_is_a_tap() {
        let mut e = engine();
        let m = map();
        press(&mut e, Modality::Precise, Instant::now());
        assert!(!e.pointer_move(Point::new(5, 4), &m));
        assert_eq!(
            e.release(Point::new(5, 4), &m),
            CardDrop::Tap { card_id: "a".into() }
        );
        assert!(e.is_idle());
    }

    #[test]
    fn mouse_movement_past_threshold_starts_drag() {
        let mut e = engine();
        let m = map();
        press(&mut e, Modality::Precise, Instant::now());
        assert!(e.pointer_move(Point::new(3, 10), &m));
        let a = e.active().unwrap();
        assert_eq!(a.grab, (3, 1));
        assert_eq!(a.proxy, Rect::new(0, 9, 10, 4));
        assert_eq!(a.placeholder.height, 4);
    }

    #[test]
    fn mouse_does_not_arm_long_press() {
        let mut e = engine();
        let m = map();
        let t0 = Instant::now();
        press(&mut e, Modality::Precise, t0);
        assert!(!e.tick(t0 + Duration::from_secs(5), &m));
        assert!(matches!(e.state(), CardDrag::Pending(_)));
    }

    #[test]
    fn touch_long_press_starts_drag() {
        let mut e = engine();
        let m = map();
        let t0 = Instant::now();
        press(&mut e, Modality::Coarse, t0);
        assert!(!e.tick(t0 + Duration::from_millis(100), &m));
        assert!(e.tick(t0 + Duration::from_millis(220), &m));
        assert!(e.is_active());
        // placeholder starts in the card's own slot
        let ph = &e.active().unwrap().placeholder;
        assert_eq!(ph.column_id, "todo");
        assert_eq!(ph.index, 0);
    }

    #[test]
    fn touch_movement_races_the_timer() {
        let mut e = engine();
        let m = map();
        let t0 = Instant::now();
        press(&mut e, Modality::Coarse, t0);
        assert!(e.pointer_move(Point::new(3, 20), &m));
        // the timer lost the race and must not restart anything
        assert!(!e.tick(t0 + Duration::from_secs(1), &m));
        assert!(e.is_active());
    }

    #[test]
    fn touch_release_before_timer_cancels_it() {
        let mut e = engine();
        let m = map();
        let t0 = Instant::now();
        press(&mut e, Modality::Coarse, t0);
        assert_eq!(
            e.release(Point::new(3, 3), &m),
            CardDrop::Tap { card_id: "a".into() }
        );
        assert!(!e.tick(t0 + Duration::from_secs(1), &m));
        assert!(e.is_idle());
    }

    #[test]
    fn second_press_is_ignored_while_busy() {
        let mut e = engine();
        press(&mut e, Modality::Precise, Instant::now());
        assert!(!e.press(
            "b",
            "todo",
            Rect::new(0, 6, 10, 4),
            Point::new(1, 7),
            Modality::Precise,
            Instant::now()
        ));
    }

    #[test]
    fn placeholder_follows_pointer_across_columns() {
        let mut e = engine();
        let m = map();
        press(&mut e, Modality::Precise, Instant::now());
        e.pointer_move(Point::new(14, 3), &m);
        let a = e.active().unwrap();
        assert_eq!(a.hovered.as_deref(), Some("done"));
        assert_eq!(a.placeholder.column_id, "done");
        assert_eq!(a.placeholder.before.as_deref(), Some("d"));

        e.pointer_move(Point::new(14, 30), &m);
        let a = e.active().unwrap();
        assert_eq!(a.placeholder.index, 1);
        assert!(a.placeholder.before.is_none());
    }

    #[test]
    fn leaving_all_columns_returns_placeholder_to_source() {
        let mut e = engine();
        let m = map();
        press(&mut e, Modality::Precise, Instant::now());
        e.pointer_move(Point::new(14, 3), &m);
        e.pointer_move(Point::new(11, 3), &m);
        let a = e.active().unwrap();
        assert!(a.hovered.is_none());
        assert_eq!(a.placeholder.column_id, "todo");
        // appended after b and c
        assert_eq!(a.placeholder.index, 2);
    }

    #[test]
    fn release_over_column_commits_with_following_card() {
        let mut e = engine();
        let m = map();
        press(&mut e, Modality::Precise, Instant::now());
        e.pointer_move(Point::new(3, 20), &m);
        // c spans 10..14, so y=11 is above its midpoint
        let drop = e.release(Point::new(3, 11), &m);
        assert_eq!(
            drop,
            CardDrop::Move {
                card_id: "a".into(),
                column_id: "todo".into(),
                before: Some("c".into()),
            }
        );
        assert!(e.is_idle());
    }

    #[test]
    fn release_outside_requests_delete() {
        let mut e = engine();
        let m = map();
        press(&mut e, Modality::Precise, Instant::now());
        e.pointer_move(Point::new(3, 20), &m);
        assert_eq!(
            e.release(Point::new(30, 20), &m),
            CardDrop::Delete { card_id: "a".into() }
        );
        assert!(e.is_idle());
    }

    #[test]
    fn refresh_reuses_last_pointer() {
        let mut e = engine();
        let m = map();
        press(&mut e, Modality::Precise, Instant::now());
        e.pointer_move(Point::new(14, 30), &m);

        // the board scrolled left under the pointer; "done" is gone
        let mut scrolled = map();
        scrolled.columns.retain(|c| c.column_id == "todo");
        e.refresh(&scrolled);
        let a = e.active().unwrap();
        assert!(a.hovered.is_none());
        assert_eq!(a.placeholder.column_id, "todo");
    }

    #[test]
    fn release_when_idle_is_nothing() {
        let mut e = engine();
        assert_eq!(e.release(Point::new(0, 0), &map()), CardDrop::None);
    }
}
