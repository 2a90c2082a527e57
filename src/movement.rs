//! Keyboard-driven player movement

use serde::{Deserialize, Serialize};

use crate::spatial::{MapBounds, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Map a browser `KeyboardEvent.key` value (WASD or arrows, any case)
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "w" | "arrowup" => Some(Direction::Up),
            "s" | "arrowdown" => Some(Direction::Down),
            "a" | "arrowleft" => Some(Direction::Left),
            "d" | "arrowright" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Unit delta on screen axes
    pub fn delta(self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// Directions held during one input tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionSet {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

impl DirectionSet {
    pub fn single(direction: Direction) -> Self {
        let mut set = Self::default();
        set.insert(direction);
        set
    }

    pub fn insert(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.up = true,
            Direction::Down => self.down = true,
            Direction::Left => self.left = true,
            Direction::Right => self.right = true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }

    /// Summed unit delta. Opposite directions cancel; diagonals are not
    /// normalized, so a diagonal tick covers `sqrt(2)` steps.
    pub fn delta(&self) -> (f64, f64) {
        [
            (self.up, Direction::Up),
            (self.down, Direction::Down),
            (self.left, Direction::Left),
            (self.right, Direction::Right),
        ]
        .into_iter()
        .filter(|(held, _)| *held)
        .map(|(_, direction)| direction.delta())
        .fold((0.0, 0.0), |(x, y), (dx, dy)| (x + dx, y + dy))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = Self::default();
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}

/// One movement tick: shift by `speed` per held axis, then clamp to the map
pub fn step(
    position: Position,
    directions: &DirectionSet,
    speed: f64,
    bounds: &MapBounds,
) -> Position {
    let (dx, dy) = directions.delta();
    bounds.clamp(position.offset(dx * speed, dy * speed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::distance;

    const SPEED: f64 = 25.0;

    fn bounds() -> MapBounds {
        MapBounds::new(3000.0)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(Direction::from_key("w"), Some(Direction::Up));
        assert_eq!(Direction::from_key("W"), Some(Direction::Up));
        assert_eq!(Direction::from_key("ArrowUp"), Some(Direction::Up));
        assert_eq!(Direction::from_key("s"), Some(Direction::Down));
        assert_eq!(Direction::from_key("ArrowDown"), Some(Direction::Down));
        assert_eq!(Direction::from_key("a"), Some(Direction::Left));
        assert_eq!(Direction::from_key("ArrowLeft"), Some(Direction::Left));
        assert_eq!(Direction::from_key("D"), Some(Direction::Right));
        assert_eq!(Direction::from_key("ArrowRight"), Some(Direction::Right));
        assert_eq!(Direction::from_key("q"), None);
        assert_eq!(Direction::from_key("Enter"), None);
    }

    #[test]
    fn test_up_decreases_y() {
        let start = Position::new(1500.0, 2850.0);
        let moved = step(start, &DirectionSet::single(Direction::Up), SPEED, &bounds());

        assert_eq!(moved, Position::new(1500.0, 2825.0));
    }

    #[test]
    fn test_clamped_at_edges() {
        let corner = Position::new(10.0, 2990.0);
        let set: DirectionSet = [Direction::Left, Direction::Down].into_iter().collect();

        let moved = step(corner, &set, SPEED, &bounds());
        assert_eq!(moved, Position::new(0.0, 3000.0));

        let again = step(moved, &set, SPEED, &bounds());
        assert_eq!(again, moved);
    }

    #[test]
    fn test_opposites_cancel() {
        let start = Position::new(100.0, 100.0);
        let set: DirectionSet = [Direction::Left, Direction::Right].into_iter().collect();

        assert_eq!(step(start, &set, SPEED, &bounds()), start);
    }

    #[test]
    fn test_diagonal_is_not_normalized() {
        let start = Position::new(1000.0, 1000.0);
        let set: DirectionSet = [Direction::Up, Direction::Right].into_iter().collect();

        let moved = step(start, &set, SPEED, &bounds());
        assert_eq!(moved, Position::new(1025.0, 975.0));
        let covered = distance(start, moved);
        assert!((covered - SPEED * 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_set_stays_put() {
        let start = Position::new(1.0, 2.0);
        let set = DirectionSet::default();

        assert!(set.is_empty());
        assert_eq!(step(start, &set, SPEED, &bounds()), start);
    }

    #[test]
    fn test_long_walk_stays_in_bounds() {
        let bounds = bounds();
        let pattern = [
            DirectionSet::single(Direction::Up),
            [Direction::Up, Direction::Left].into_iter().collect(),
            DirectionSet::single(Direction::Left),
        ];
        let mut position = Position::new(1500.0, 2500.0);
        for tick in 0..400 {
            position = step(position, &pattern[tick % pattern.len()], SPEED, &bounds);
            assert!(bounds.contains(position), "escaped at tick {tick}: {position:?}");
        }
        assert_eq!(position, Position::new(0.0, 0.0));
    }
}
