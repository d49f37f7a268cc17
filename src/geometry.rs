//! Points, rectangles and the hit map the presentation layer hands to the
//! drag engines.
//!
//! Coordinates are signed so that pointer offsets and scrolled-out regions
//! can go negative. The unit is whatever the presentation layer renders in
//! (terminal cells for the TUI).

/// A pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset_from(self, origin: Point) -> (i32, i32) {
        (self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Whether `coord` has not yet crossed this rect's midpoint along `axis`.
    /// Compared in doubled units so odd sizes need no rounding.
    pub fn before_midpoint(&self, coord: i32, axis: Axis) -> bool {
        match axis {
            Axis::Vertical => 2 * coord < 2 * self.y + self.height,
            Axis::Horizontal => 2 * coord < 2 * self.x + self.width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Columns are ranked by horizontal midpoints.
    Horizontal,
    /// Cards are ranked by vertical midpoints.
    Vertical,
}

impl Axis {
    pub fn pick(self, p: Point) -> i32 {
        match self {
            Axis::Horizontal => p.x,
            Axis::Vertical => p.y,
        }
    }
}

/// Index of the first candidate whose midpoint the pointer has not yet
/// crossed, or the candidate count when it has crossed them all.
///
/// Cards and columns share this rule.
pub fn insertion_index<I>(candidates: I, pointer: Point, axis: Axis) -> usize
where
    I: IntoIterator<Item = Rect>,
{
    let coord = axis.pick(pointer);
    let mut count = 0;
    for (i, rect) in candidates.into_iter().enumerate() {
        if rect.before_midpoint(coord, axis) {
            return i;
        }
        count = i + 1;
    }
    count
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderTool {
    AddCard,
    Delete,
}

/// What part of a column header a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderHit {
    Grip,
    Title,
    Tool(HeaderTool),
    Background,
}

impl HeaderHit {
    /// Title text and action buttons keep their click behaviour.
    pub fn starts_column_drag(self) -> bool {
        matches!(self, HeaderHit::Grip | HeaderHit::Background)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRegion {
    pub card_id: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRegions {
    pub rect: Rect,
    pub grip: Rect,
    pub title: Rect,
    pub tools: Vec<(HeaderTool, Rect)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRegion {
    pub column_id: String,
    pub rect: Rect,
    pub header: HeaderRegions,
    /// Rendered cards in display order. The hidden original of a dragged
    /// card is not part of this list.
    pub cards: Vec<CardRegion>,
}

/// Snapshot of where everything was drawn, in screen coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HitMap {
    /// The scrollable board's visible area.
    pub viewport: Rect,
    /// Columns in display order.
    pub columns: Vec<ColumnRegion>,
}

impl HitMap {
    /// The topmost column under `p`. Points outside the viewport hit nothing.
    pub fn column_at(&self, p: Point) -> Option<&ColumnRegion> {
        if !self.viewport.contains(p) {
            return None;
        }
        self.columns.iter().rev().find(|c| c.rect.contains(p))
    }

    pub fn column(&self, column_id: &str) -> Option<&ColumnRegion> {
        self.columns.iter().find(|c| c.column_id == column_id)
    }

    pub fn card_at(&self, p: Point) -> Option<(&ColumnRegion, &CardRegion)> {
        let col = self.column_at(p)?;
        col.cards
            .iter()
            .find(|c| c.rect.contains(p))
            .map(|card| (col, card))
    }

    pub fn header_at(&self, p: Point) -> Option<(&ColumnRegion, HeaderHit)> {
        let col = self.column_at(p)?;
        let header = &col.header;
        if !header.rect.contains(p) {
            return None;
        }
        let hit = if header.grip.contains(p) {
            HeaderHit::Grip
        } else if let Some((tool, _)) = header.tools.iter().find(|(_, r)| r.contains(p)) {
            HeaderHit::Tool(*tool)
        } else if header.title.contains(p) {
            HeaderHit::Title
        } else {
            HeaderHit::Background
        };
        Some((col, hit))
    }
}

impl ColumnRegion {
    /// Insertion index among this column's cards, ignoring `skip`, together
    /// with the id of the card the insertion lands before.
    pub fn card_insertion(&self, p: Point, skip: &str) -> (usize, Option<String>) {
        let visible: Vec<&CardRegion> = self.cards.iter().filter(|c| c.card_id != skip).collect();
        let index = insertion_index(visible.iter().map(|c| c.rect), p, Axis::Vertical);
        let before = visible.get(index).map(|c| c.card_id.clone());
        (index, before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(tops: &[i32], height: i32) -> Vec<Rect> {
        tops.iter().map(|&y| Rect::new(0, y, 10, height)).collect()
    }

    #[test]
    fn pointer_between_midpoints_lands_on_later_card() {
        // midpoints at 2, 6, 10
        let cards = stack(&[0, 4, 8], 4);
        assert_eq!(insertion_index(cards.clone(), Point::new(0, 3), Axis::Vertical), 1);
        assert_eq!(insertion_index(cards.clone(), Point::new(0, 7), Axis::Vertical), 2);
    }

    #[test]
    fn pointer_above_first_midpoint_is_index_zero() {
        let cards = stack(&[0, 4], 4);
        assert_eq!(insertion_index(cards, Point::new(0, 1), Axis::Vertical), 0);
    }

    #[test]
    fn pointer_on_midpoint_counts_as_crossed() {
        let cards = stack(&[0, 4], 4);
        assert_eq!(insertion_index(cards, Point::new(0, 2), Axis::Vertical), 1);
    }

    #[test]
    fn pointer_past_everything_is_end() {
        let cards = stack(&[0, 4, 8], 4);
        assert_eq!(insertion_index(cards, Point::new(0, 50), Axis::Vertical), 3);
        assert_eq!(insertion_index(Vec::new(), Point::new(0, 0), Axis::Vertical), 0);
    }

    #[test]
    fn odd_heights_compare_without_rounding() {
        // midpoint of [0, 3) is 1.5
        let r = Rect::new(0, 0, 3, 3);
        assert!(r.before_midpoint(1, Axis::Vertical));
        assert!(!r.before_midpoint(2, Axis::Vertical));
    }

    #[test]
    fn horizontal_axis_uses_x() {
        let cols: Vec<Rect> = [0, 10, 20].iter().map(|&x| Rect::new(x, 0, 10, 40)).collect();
        assert_eq!(insertion_index(cols.clone(), Point::new(12, 99), Axis::Horizontal), 1);
        assert_eq!(insertion_index(cols, Point::new(16, 0), Axis::Horizontal), 2);
    }

    fn region(id: &str, x: i32) -> ColumnRegion {
        let rect = Rect::new(x, 0, 10, 20);
        ColumnRegion {
            column_id: id.into(),
            rect,
            header: HeaderRegions {
                rect: Rect::new(x, 0, 10, 2),
                grip: Rect::new(x + 1, 1, 1, 1),
                title: Rect::new(x + 3, 1, 4, 1),
                tools: vec![(HeaderTool::Delete, Rect::new(x + 8, 1, 1, 1))],
            },
            cards: vec![
                CardRegion {
                    card_id: format!("{id}-a"),
                    rect: Rect::new(x, 2, 10, 4),
                },
                CardRegion {
                    card_id: format!("{id}-b"),
                    rect: Rect::new(x, 6, 10, 4),
                },
            ],
        }
    }

    fn map() -> HitMap {
        HitMap {
            viewport: Rect::new(0, 0, 25, 20),
            columns: vec![region("a", 0), region("b", 12)],
        }
    }

    #[test]
    fn column_at_resolves_gaps_as_outside() {
        let m = map();
        assert_eq!(m.column_at(Point::new(3, 5)).unwrap().column_id, "a");
        assert_eq!(m.column_at(Point::new(15, 5)).unwrap().column_id, "b");
        assert!(m.column_at(Point::new(11, 5)).is_none());
        // clipped by the viewport
        assert!(m.column_at(Point::new(40, 5)).is_none());
    }

    #[test]
    fn header_regions() {
        let m = map();
        assert_eq!(m.header_at(Point::new(1, 1)).unwrap().1, HeaderHit::Grip);
        assert_eq!(m.header_at(Point::new(4, 1)).unwrap().1, HeaderHit::Title);
        assert_eq!(
            m.header_at(Point::new(8, 1)).unwrap().1,
            HeaderHit::Tool(HeaderTool::Delete)
        );
        assert_eq!(m.header_at(Point::new(0, 0)).unwrap().1, HeaderHit::Background);
        assert!(m.header_at(Point::new(4, 5)).is_none());
        assert!(HeaderHit::Grip.starts_column_drag());
        assert!(!HeaderHit::Title.starts_column_drag());
    }

    #[test]
    fn card_insertion_skips_dragged_card() {
        let m = map();
        let col = m.column("a").unwrap();
        assert_eq!(col.card_insertion(Point::new(0, 3), "none"), (0, Some("a-a".into())));
        // skipping a-a makes a-b the only candidate
        assert_eq!(col.card_insertion(Point::new(0, 7), "a-a"), (0, Some("a-b".into())));
        assert_eq!(col.card_insertion(Point::new(0, 19), "none"), (2, None));
    }

    #[test]
    fn card_at_finds_card() {
        let m = map();
        let (col, card) = m.card_at(Point::new(14, 7)).unwrap();
        assert_eq!(col.column_id, "b");
        assert_eq!(card.card_id, "b-b");
        assert!(m.card_at(Point::new(14, 15)).is_none());
    }
}
