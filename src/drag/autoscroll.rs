use tracing::debug;

use crate::geometry::{Point, Rect};

/// Edge auto-scroll shared by both drag kinds.
///
/// Engines `acquire` the loop when their drag goes active and `release` it
/// when the drag ends. The loop keeps running until the first tick that
/// finds no holder, then stops itself.
#[derive(Debug, Clone)]
pub struct AutoScroller {
    zone: i32,
    max_speed: i32,
    holders: u32,
    running: bool,
    pointer: Point,
}

impl AutoScroller {
    pub fn new(zone: i32, max_speed: i32) -> Self {
        Self {
            zone: zone.max(1),
            max_speed,
            holders: 0,
            running: false,
            pointer: Point::default(),
        }
    }

    pub fn acquire(&mut self) {
        self.holders += 1;
        if !self.running {
            self.running = true;
            debug!(holders = self.holders, "auto-scroll started");
        }
    }

    pub fn release(&mut self) {
        self.holders = self.holders.saturating_sub(1);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Record the latest pointer position, used by the next tick.
    pub fn track(&mut self, p: Point) {
        self.pointer = p;
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    /// One frame of the loop: the horizontal scroll delta to apply to a board
    /// shown in `viewport`. Zero when idle, stopped, or away from the edges.
    pub fn tick(&mut self, viewport: Rect) -> i32 {
        if !self.running {
            return 0;
        }
        if self.holders == 0 {
            self.running = false;
            debug!("auto-scroll stopped");
            return 0;
        }
        velocity(
            self.pointer.x - viewport.x,
            viewport.width,
            self.zone,
            self.max_speed,
        )
    }
}

/// Scroll speed for a pointer `x` units from the left edge of a `width`-wide
/// viewport. Grows linearly from 0 at the inner edge of the zone to
/// `max_speed` at the viewport edge; negative means scroll left.
pub fn velocity(x: i32, width: i32, zone: i32, max_speed: i32) -> i32 {
    let (x, width, zone, max) = (x as f64, width as f64, zone as f64, max_speed as f64);
    let v = if x < zone {
        -interp(x, 0.0, zone, max, 0.0)
    } else if x > width - zone {
        interp(x, width - zone, width, 0.0, max)
    } else {
        0.0
    };
    v.round() as i32
}

fn interp(v: f64, a: f64, b: f64, out_a: f64, out_b: f64) -> f64 {
    let t = ((v - a) / (b - a)).clamp(0.0, 1.0);
    out_a + (out_b - out_a) * t
}
