//! Where everything goes on screen, computed from the board and the drag
//! state before each frame.
//!
//! The same [`BoardLayout`] feeds the renderer and, through its
//! [`HitMap`], the drag engines, so what the user sees is exactly what the
//! pointer is tested against.

use ratatui::layout::{Constraint, Direction, Layout, Rect as Area};

use crate::drag::{CardDrag, ColumnDrag, DragController};
use crate::geometry::{CardRegion, ColumnRegion, HeaderRegions, HeaderTool, HitMap, Rect};
use crate::model::{Board, Card};

pub const COLUMN_GAP: i32 = 1;
pub const MIN_COLUMN_WIDTH: u16 = 18;
pub const ADD_COLUMN_WIDTH: i32 = 16;
/// Rows above the first card: top border and the header line.
const HEADER_ROWS: i32 = 2;

/// One vertical slot inside a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Card { card_id: String, rect: Rect },
    Placeholder(Rect),
    /// Shown in place of cards when a column is empty.
    Hint(Rect),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    pub column_id: String,
    pub rect: Rect,
    pub header: HeaderRegions,
    pub slots: Vec<Slot>,
    /// A card drag is hovering this column.
    pub hovered: bool,
    /// This is the gap left behind by the column being dragged.
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardProxy {
    pub card_id: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, Default)]
pub struct BoardLayout {
    pub title_bar: Area,
    pub board: Area,
    pub status_bar: Area,
    pub columns: Vec<ColumnView>,
    /// The trailing "+ Column" button.
    pub add_column: Option<Rect>,
    pub card_proxy: Option<CardProxy>,
    pub column_proxy: Option<ColumnView>,
    pub hit_map: HitMap,
    pub content_width: i32,
}

impl BoardLayout {
    /// Largest horizontal scroll offset that still shows content.
    pub fn max_scroll(&self) -> i32 {
        (self.content_width - self.board.width as i32).max(0)
    }
}

pub fn card_height(card: &Card) -> i32 {
    if card.due.is_some() || !card.tags.is_empty() {
        4
    } else {
        3
    }
}

pub fn compute(
    board: &Board,
    drag: &DragController,
    area: Area,
    scroll_x: i32,
    column_width: u16,
) -> BoardLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Board
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    let viewport = to_rect(chunks[1]);
    let width = column_width.max(MIN_COLUMN_WIDTH) as i32;
    let stride = width + COLUMN_GAP;

    let dragged_card = match drag.card().state() {
        CardDrag::Active(a) => Some(a),
        _ => None,
    };
    let dragged_column = match drag.column().state() {
        ColumnDrag::Active(a) => Some(a),
        ColumnDrag::Idle => None,
    };

    let order: Vec<&str> = match dragged_column {
        Some(a) => a
            .order
            .iter()
            .map(String::as_str)
            .filter(|id| board.has_column(id))
            .collect(),
        None => board.columns.iter().map(|c| c.id.as_str()).collect(),
    };

    let mut columns = Vec::with_capacity(order.len());
    for (i, column_id) in order.iter().enumerate() {
        let rect = Rect::new(
            viewport.x + i as i32 * stride - scroll_x,
            viewport.y,
            width,
            viewport.height,
        );
        let is_gap = dragged_column.is_some_and(|a| a.column_id == *column_id);
        let mut view = column_view(board, column_id, rect, dragged_card.map(|a| a.card_id.as_str()));
        if is_gap {
            view.slots.clear();
            view.placeholder = true;
        } else if let Some(a) = dragged_card {
            view.hovered = a.hovered.as_deref() == Some(*column_id);
            if a.placeholder.column_id == *column_id {
                insert_placeholder(&mut view, a.placeholder.index, a.placeholder.height);
            }
        }
        columns.push(view);
    }

    let n = columns.len() as i32;
    let add_column = Some(Rect::new(
        viewport.x + n * stride - scroll_x,
        viewport.y,
        ADD_COLUMN_WIDTH,
        3,
    ));

    let hit_map = HitMap {
        viewport,
        columns: columns
            .iter()
            .map(|v| ColumnRegion {
                column_id: v.column_id.clone(),
                rect: v.rect,
                header: v.header.clone(),
                cards: v
                    .slots
                    .iter()
                    .filter_map(|s| match s {
                        Slot::Card { card_id, rect } => Some(CardRegion {
                            card_id: card_id.clone(),
                            rect: *rect,
                        }),
                        _ => None,
                    })
                    .collect(),
            })
            .collect(),
    };

    let card_proxy = dragged_card.map(|a| CardProxy {
        card_id: a.card_id.clone(),
        rect: a.proxy,
    });
    let column_proxy = dragged_column.map(|a| {
        let rect = Rect::new(a.proxy.x, viewport.y, width, viewport.height);
        column_view(board, &a.column_id, rect, None)
    });

    BoardLayout {
        title_bar: chunks[0],
        board: chunks[1],
        status_bar: chunks[2],
        columns,
        add_column,
        card_proxy,
        column_proxy,
        hit_map,
        content_width: n * stride + ADD_COLUMN_WIDTH,
    }
}

fn column_view(board: &Board, column_id: &str, rect: Rect, hidden: Option<&str>) -> ColumnView {
    let title_len = board
        .column(column_id)
        .map(|c| c.title.chars().count() as i32)
        .unwrap_or(0);
    let y = rect.y + 1;
    let header = HeaderRegions {
        rect: Rect::new(rect.x, rect.y, rect.width, HEADER_ROWS),
        grip: Rect::new(rect.x + 1, y, 2, 1),
        title: Rect::new(rect.x + 4, y, title_len.min(rect.width - 13).max(1), 1),
        tools: vec![
            (HeaderTool::AddCard, Rect::new(rect.right() - 8, y, 3, 1)),
            (HeaderTool::Delete, Rect::new(rect.right() - 4, y, 3, 1)),
        ],
    };

    let inner_x = rect.x + 1;
    let inner_w = rect.width - 2;
    let mut top = rect.y + HEADER_ROWS;
    let mut slots = Vec::new();
    for card in board.column_cards(column_id) {
        if hidden == Some(card.id.as_str()) {
            continue;
        }
        let h = card_height(card);
        slots.push(Slot::Card {
            card_id: card.id.clone(),
            rect: Rect::new(inner_x, top, inner_w, h),
        });
        top += h;
    }
    if slots.is_empty() {
        slots.push(Slot::Hint(Rect::new(inner_x, top, inner_w, 1)));
    }

    ColumnView {
        column_id: column_id.to_string(),
        rect,
        header,
        slots,
        hovered: false,
        placeholder: false,
    }
}

/// Open a gap of `height` rows before the `index`th card and push the rest
/// down.
fn insert_placeholder(view: &mut ColumnView, index: usize, height: i32) {
    view.slots.retain(|s| !matches!(s, Slot::Hint(_)));
    let at = index.min(view.slots.len());
    let top = match view.slots.get(at) {
        Some(Slot::Card { rect, .. }) => rect.y,
        _ => view
            .slots
            .last()
            .map(|s| match s {
                Slot::Card { rect, .. } | Slot::Placeholder(rect) | Slot::Hint(rect) => rect.bottom(),
            })
            .unwrap_or(view.rect.y + HEADER_ROWS),
    };
    for slot in &mut view.slots[at..] {
        if let Slot::Card { rect, .. } = slot {
            rect.y += height;
        }
    }
    let rect = Rect::new(view.rect.x + 1, top, view.rect.width - 2, height);
    view.slots.insert(at, Slot::Placeholder(rect));
}

pub fn to_rect(a: Area) -> Rect {
    Rect::new(a.x as i32, a.y as i32, a.width as i32, a.height as i32)
}

/// The part of `r` inside `bounds`, as a drawable area.
pub fn clip(r: Rect, bounds: Area) -> Option<Area> {
    let x0 = r.x.max(bounds.x as i32);
    let y0 = r.y.max(bounds.y as i32);
    let x1 = r.right().min(bounds.right() as i32);
    let y1 = r.bottom().min(bounds.bottom() as i32);
    (x1 > x0 && y1 > y0).then(|| Area::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16))
}

pub fn centered_fixed(width: u16, height: u16, r: Area) -> Area {
    let x = r.x + r.width.saturating_sub(width) / 2;
    let y = r.y + r.height.saturating_sub(height) / 2;
    Area::new(x, y, width.min(r.width), height.min(r.height))
}

pub fn sheet_area(area: Area) -> Area {
    centered_fixed(64, 14, area)
}

pub fn dialog_area(area: Area) -> Area {
    centered_fixed(50, 6, area)
}

pub fn help_area(area: Area) -> Area {
    centered_fixed(62, 24, area)
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::drag::{DragTuning, Modality};
    use crate::geometry::{HeaderHit, Point};

    fn area() -> Area {
        Area::new(0, 0, 120, 30)
    }

    fn idle() -> DragController {
        DragController::new(&DragTuning::default())
    }

    #[test]
    fn columns_are_laid_out_left_to_right_below_the_title_bar() {
        let board = Board::seed();
        let l = compute(&board, &idle(), area(), 0, 24);
        assert_eq!(l.hit_map.viewport, Rect::new(0, 1, 120, 28));
        let xs: Vec<i32> = l.columns.iter().map(|c| c.rect.x).collect();
        assert_eq!(xs, vec![0, 25, 50, 75]);
        assert_eq!(l.content_width, 4 * 25 + ADD_COLUMN_WIDTH);
        assert_eq!(l.max_scroll(), 0);
    }

    #[test]
    fn scroll_shifts_columns_left() {
        let board = Board::seed();
        let l = compute(&board, &idle(), Area::new(0, 0, 60, 30), 20, 24);
        assert_eq!(l.columns[0].rect.x, -20);
        assert_eq!(l.max_scroll(), 4 * 25 + ADD_COLUMN_WIDTH - 60);
    }

    #[test]
    fn empty_column_shows_a_hint_and_no_card_regions() {
        let board = Board::seed();
        let l = compute(&board, &idle(), area(), 0, 24);
        assert!(matches!(l.columns[3].slots[..], [Slot::Hint(_)]));
        assert!(l.hit_map.columns[3].cards.is_empty());
    }

    #[test]
    fn cards_with_meta_are_taller() {
        let board = Board::seed();
        let l = compute(&board, &idle(), area(), 0, 24);
        // seed cards all carry a tag
        assert_eq!(l.hit_map.columns[0].cards[0].rect, Rect::new(1, 3, 22, 4));
    }

    #[test]
    fn active_card_drag_hides_the_original_and_opens_a_placeholder() {
        let board = Board::seed();
        let mut drag = idle();
        let l = compute(&board, &drag, area(), 0, 24);
        let card = l.hit_map.columns[0].cards[0].clone();
        drag.press_card(&card.card_id, &l.columns[0].column_id, card.rect, Point::new(5, 4), Modality::Precise, Instant::now());
        drag.pointer_move(Point::new(30, 4), &l.hit_map);

        let l = compute(&board, &drag, area(), 0, 24);
        assert!(l.hit_map.columns[0].cards.is_empty());
        assert!(l.columns[1].hovered);
        // pointer is above the Doing card's midpoint, so the gap goes first
        assert!(matches!(l.columns[1].slots[0], Slot::Placeholder(r) if r.height == 4));
        assert_eq!(l.hit_map.columns[1].cards[0].rect.y, 3 + 4);
        assert_eq!(l.card_proxy.unwrap().rect, Rect::new(26, 3, 22, 4));
    }

    #[test]
    fn column_drag_lays_out_by_candidate_order() {
        let board = Board::seed();
        let mut drag = idle();
        let l = compute(&board, &drag, area(), 0, 24);
        let last = l.columns[3].clone();
        assert!(drag.press_header(&last.column_id, last.rect, HeaderHit::Grip, Point::new(76, 2), &l.hit_map));
        drag.pointer_move(Point::new(2, 2), &l.hit_map);

        let l = compute(&board, &drag, area(), 0, 24);
        assert_eq!(l.columns[0].column_id, last.column_id);
        assert!(l.columns[0].placeholder);
        assert_eq!(l.column_proxy.unwrap().rect.x, 1);
    }

    #[test]
    fn clip_drops_offscreen_parts() {
        let bounds = Area::new(0, 1, 50, 20);
        assert_eq!(clip(Rect::new(-5, 0, 10, 5), bounds), Some(Area::new(0, 1, 5, 4)));
        assert_eq!(clip(Rect::new(60, 2, 10, 5), bounds), None);
    }
}
