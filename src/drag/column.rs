use std::collections::HashSet;

use tracing::debug;

use crate::geometry::{Axis, HeaderHit, HitMap, Point, Rect, insertion_index};

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveColumnDrag {
    pub column_id: String,
    pub grab_x: i32,
    /// Proxy rectangle; only `x` follows the pointer.
    pub proxy: Rect,
    /// Candidate column order with the dragged column at the placeholder.
    pub order: Vec<String>,
    pub placeholder_index: usize,
    pub pointer: Point,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ColumnDrag {
    #[default]
    Idle,
    Active(ActiveColumnDrag),
}

/// Horizontal reordering of columns. Goes active on the press itself; there
/// is no pending phase and no way to drop "outside".
#[derive(Debug, Clone, Default)]
pub struct ColumnDragEngine {
    state: ColumnDrag,
}

impl ColumnDragEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ColumnDrag {
        &self.state
    }

    pub fn current(&self) -> Option<&ActiveColumnDrag> {
        match &self.state {
            ColumnDrag::Active(a) => Some(a),
            ColumnDrag::Idle => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ColumnDrag::Active(_))
    }

    /// Pointer went down on a column header. Only the grip and the bare
    /// header background start a drag. Returns whether a drag started.
    pub fn press(
        &mut self,
        column_id: &str,
        column_rect: Rect,
        hit: HeaderHit,
        pointer: Point,
        map: &HitMap,
    ) -> bool {
        if self.is_active() || !hit.starts_column_drag() {
            return false;
        }
        let mut proxy = column_rect;
        proxy.y = map.viewport.y;
        debug!(column = %column_id, "column drag started");
        self.state = ColumnDrag::Active(ActiveColumnDrag {
            column_id: column_id.into(),
            grab_x: pointer.x - column_rect.x,
            proxy,
            order: map.columns.iter().map(|c| c.column_id.clone()).collect(),
            placeholder_index: 0,
            pointer,
        });
        self.track(pointer, map);
        true
    }

    pub fn pointer_move(&mut self, pointer: Point, map: &HitMap) {
        self.track(pointer, map);
    }

    pub fn refresh(&mut self, map: &HitMap) {
        if let ColumnDrag::Active(a) = &self.state {
            let pointer = a.pointer;
            self.track(pointer, map);
        }
    }

    /// Ends the drag and hands back the final column order to commit.
    pub fn release(&mut self, pointer: Point, map: &HitMap) -> Option<Vec<String>> {
        self.track(pointer, map);
        match std::mem::take(&mut self.state) {
            ColumnDrag::Idle => None,
            ColumnDrag::Active(a) => {
                let mut seen = HashSet::new();
                let order: Vec<String> = a
                    .order
                    .into_iter()
                    .filter(|id| seen.insert(id.clone()))
                    .collect();
                debug!(column = %a.column_id, ?order, "column dropped");
                Some(order)
            }
        }
    }

    fn track(&mut self, pointer: Point, map: &HitMap) {
        let ColumnDrag::Active(a) = &mut self.state else {
            return;
        };
        a.pointer = pointer;
        a.proxy.x = pointer.x - a.grab_x;

        let others: Vec<_> = map
            .columns
            .iter()
            .filter(|c| c.column_id != a.column_id)
            .collect();
        let index = insertion_index(others.iter().map(|c| c.rect), pointer, Axis::Horizontal);

        let mut order: Vec<String> = others.iter().map(|c| c.column_id.clone()).collect();
        order.insert(index, a.column_id.clone());
        a.order = order;
        a.placeholder_index = index;
    }
}
