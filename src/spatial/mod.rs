//! Spatial model - flat square campus map

use serde::{Deserialize, Serialize};

/// Point on the campus map. `y` grows downwards, so "up" is negative `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Euclidean distance between two positions
pub fn distance(a: Position, b: Position) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Whether `target` lies within `radius` of `origin` (inclusive)
pub fn is_in_range(origin: Position, target: Position, radius: f64) -> bool {
    distance(origin, target) <= radius
}

/// Square map of side `size`, anchored at the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    size: f64,
}

impl MapBounds {
    pub fn new(size: f64) -> Self {
        Self { size }
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn contains(&self, pos: Position) -> bool {
        (0.0..=self.size).contains(&pos.x) && (0.0..=self.size).contains(&pos.y)
    }

    /// Clamp each axis independently to `[0, size]`
    pub fn clamp(&self, pos: Position) -> Position {
        Position {
            x: pos.x.clamp(0.0, self.size),
            y: pos.y.clamp(0.0, self.size),
        }
    }

    /// Inclusive range for one axis after trimming `margin` from both edges
    pub fn inset(&self, margin: f64) -> (f64, f64) {
        let low = margin.min(self.size / 2.0);
        (low, self.size - low)
    }
}
