//! Eight compass headings on the tile lattice, 45 degrees apart.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::units::TileCoord;

/// Direction of travel. Index 0 is +X and indices increase clockwise when
/// viewed with +Z pointing down (towards the south).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Heading {
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    North,
    NorthEast,
}

impl Heading {
    pub const ALL: [Heading; 8] = [
        Heading::East,
        Heading::SouthEast,
        Heading::South,
        Heading::SouthWest,
        Heading::West,
        Heading::NorthWest,
        Heading::North,
        Heading::NorthEast,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Heading {
        Self::ALL[index % 8]
    }

    /// Lattice step for one move in this direction.
    pub fn step(self) -> TileCoord {
        match self {
            Heading::East => TileCoord::new(1, 0),
            Heading::SouthEast => TileCoord::new(1, 1),
            Heading::South => TileCoord::new(0, 1),
            Heading::SouthWest => TileCoord::new(-1, 1),
            Heading::West => TileCoord::new(-1, 0),
            Heading::NorthWest => TileCoord::new(-1, -1),
            Heading::North => TileCoord::new(0, -1),
            Heading::NorthEast => TileCoord::new(1, -1),
        }
    }

    /// Unnormalized direction vector in tile units.
    pub fn vector(self) -> Vec3 {
        let s = self.step();
        Vec3::new(s.x as f32, 0.0, s.z as f32)
    }

    /// Turn by `steps` eighths of a full turn; positive is clockwise.
    pub fn turned(self, steps: i32) -> Heading {
        Self::from_index((self.index() as i32 + steps).rem_euclid(8) as usize)
    }

    pub fn opposite(self) -> Heading {
        self.turned(4)
    }

    pub fn is_diagonal(self) -> bool {
        self.index() % 2 == 1
    }

    /// Undirected axis shared with the opposite heading (0..4).
    pub fn axis(self) -> usize {
        self.index() % 4
    }

    /// Smallest number of 45-degree steps between two headings.
    pub fn steps_between(self, other: Heading) -> i32 {
        let d = (self.index() as i32 - other.index() as i32).rem_euclid(8);
        d.min(8 - d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for h in Heading::ALL {
            assert_eq!(h.opposite().opposite(), h);
            assert_eq!(h.opposite().axis(), h.axis());
            assert_eq!(h.step() + h.opposite().step(), TileCoord::default());
        }
    }

    #[test]
    fn test_turning_wraps() {
        assert_eq!(Heading::East.turned(-1), Heading::NorthEast);
        assert_eq!(Heading::NorthEast.turned(1), Heading::East);
        assert_eq!(Heading::South.turned(10), Heading::West);
    }

    #[test]
    fn test_steps_between() {
        assert_eq!(Heading::East.steps_between(Heading::West), 4);
        assert_eq!(Heading::East.steps_between(Heading::NorthEast), 1);
        assert_eq!(Heading::NorthWest.steps_between(Heading::SouthEast), 4);
        assert_eq!(Heading::North.steps_between(Heading::North), 0);
    }

    #[test]
    fn test_diagonals_alternate() {
        let diagonals = Heading::ALL.iter().filter(|h| h.is_diagonal()).count();
        assert_eq!(diagonals, 4);
        assert!(!Heading::East.is_diagonal());
        assert!(Heading::SouthEast.is_diagonal());
    }
}
