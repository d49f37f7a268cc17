//! Pointer-driven reordering of cards and columns.
//!
//! [`DragController`] is what the presentation layer talks to. It owns one
//! [`CardDragEngine`], one [`ColumnDragEngine`] and the [`AutoScroller`]
//! they share, and makes sure at most one gesture is in flight: a press
//! while any engine is busy is dropped.
//!
//! The engines never touch the board. They turn pointer events plus the
//! last rendered [`HitMap`] into a [`DragOutcome`], and the caller commits
//! that outcome to the store.

mod autoscroll;
mod card;
mod column;

pub use autoscroll::{AutoScroller, velocity};
pub use card::{ActiveCardDrag, CardDrag, CardDragEngine, CardDrop, PendingCardDrag, Placeholder};
pub use column::{ActiveColumnDrag, ColumnDrag, ColumnDragEngine};

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::geometry::{HeaderHit, HitMap, Point, Rect};

/// Kind of pointer reported by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Mouse-like: a drag starts once the pointer travels past the threshold.
    #[default]
    Precise,
    /// Touch-like: a long press or movement starts the drag.
    Coarse,
}

/// Gesture and scrolling constants, in presentation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragTuning {
    /// Movement (in either axis) that turns a press into a drag.
    pub threshold: i32,
    pub long_press_ms: u64,
    /// Width of the auto-scroll band at each edge of the board.
    pub scroll_zone: i32,
    /// Auto-scroll speed at the very edge, per tick.
    pub max_scroll_speed: i32,
    /// Keyboard/wheel scroll nudge.
    pub scroll_step: i32,
}

impl Default for DragTuning {
    /// Terminal cells.
    fn default() -> Self {
        Self {
            threshold: 1,
            long_press_ms: 220,
            scroll_zone: 6,
            max_scroll_speed: 3,
            scroll_step: 8,
        }
    }
}

impl DragTuning {
    /// Pixel-scale constants for pointer devices with fine resolution.
    pub fn pixels() -> Self {
        Self {
            threshold: 6,
            long_press_ms: 220,
            scroll_zone: 60,
            max_scroll_speed: 28,
            scroll_step: 80,
        }
    }
}

/// A finished gesture, for the caller to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    None,
    Card(CardDrop),
    Columns(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct DragController {
    cards: CardDragEngine,
    columns: ColumnDragEngine,
    scroller: AutoScroller,
}

impl DragController {
    pub fn new(tuning: &DragTuning) -> Self {
        Self {
            cards: CardDragEngine::new(tuning),
            columns: ColumnDragEngine::new(),
            scroller: AutoScroller::new(tuning.scroll_zone, tuning.max_scroll_speed),
        }
    }

    pub fn card(&self) -> &CardDragEngine {
        &self.cards
    }

    pub fn column(&self) -> &ColumnDragEngine {
        &self.columns
    }

    pub fn scroller(&self) -> &AutoScroller {
        &self.scroller
    }

    /// Some gesture is in flight, pending or active.
    pub fn is_busy(&self) -> bool {
        !self.cards.is_idle() || self.columns.is_active()
    }

    /// A drag has taken over the pointer; clicks are suppressed.
    pub fn is_dragging(&self) -> bool {
        self.cards.is_active() || self.columns.is_active()
    }

    pub fn press_card(
        &mut self,
        card_id: &str,
        column_id: &str,
        card_rect: Rect,
        pointer: Point,
        modality: Modality,
        now: Instant,
    ) -> bool {
        if self.is_busy() {
            return false;
        }
        self.scroller.track(pointer);
        self.cards
            .press(card_id, column_id, card_rect, pointer, modality, now)
    }

    pub fn press_header(
        &mut self,
        column_id: &str,
        column_rect: Rect,
        hit: HeaderHit,
        pointer: Point,
        map: &HitMap,
    ) -> bool {
        if self.is_busy() {
            return false;
        }
        self.scroller.track(pointer);
        let started = self.columns.press(column_id, column_rect, hit, pointer, map);
        if started {
            self.scroller.acquire();
        }
        started
    }

    pub fn pointer_move(&mut self, pointer: Point, map: &HitMap) {
        self.scroller.track(pointer);
        if self.cards.pointer_move(pointer, map) {
            self.scroller.acquire();
        }
        self.columns.pointer_move(pointer, map);
    }

    /// Pointer released or cancelled.
    pub fn release(&mut self, pointer: Point, map: &HitMap) -> DragOutcome {
        self.scroller.track(pointer);
        if self.columns.is_active() {
            self.scroller.release();
            return self
                .columns
                .release(pointer, map)
                .map(DragOutcome::Columns)
                .unwrap_or(DragOutcome::None);
        }
        if self.cards.is_active() {
            self.scroller.release();
        }
        match self.cards.release(pointer, map) {
            CardDrop::None => DragOutcome::None,
            drop => DragOutcome::Card(drop),
        }
    }

    /// One frame: fires the long-press timer and runs auto-scroll. Returns
    /// the horizontal scroll delta to apply; after applying a non-zero delta
    /// and re-rendering, call [`DragController::refresh`] with the new map.
    pub fn tick(&mut self, now: Instant, map: &HitMap) -> i32 {
        if self.cards.tick(now, map) {
            self.scroller.acquire();
        }
        self.scroller.tick(map.viewport)
    }

    /// Re-run move handling at the last pointer after the board scrolled.
    pub fn refresh(&mut self, map: &HitMap) {
        self.cards.refresh(map);
        self.columns.refresh(map);
    }
}
