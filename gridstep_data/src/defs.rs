use serde::{Deserialize, Serialize};
use std::fmt;

/// Side length of every map.
pub const GRID_SIZE: usize = 12;
/// Number of wall tiles placed on a generated map.
pub const MIN_WALLS: usize = 20;
/// Number of water tiles placed on a generated map.
pub const MIN_WATER: usize = 10;

/// A single map cell.
///
/// The numeric codes (`Grass` = 0 .. `Goal` = 3) match the row-major integer
/// layout used by exported maps, see [`Tile::code`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Grass,
    Wall,
    Water,
    Goal,
}

impl Tile {
    pub const ALL: [Tile; 4] = [Tile::Grass, Tile::Wall, Tile::Water, Tile::Goal];

    /// Integer code of this tile in the exported map format.
    pub fn code(self) -> u8 {
        match self {
            Tile::Grass => 0,
            Tile::Wall => 1,
            Tile::Water => 2,
            Tile::Goal => 3,
        }
    }

    /// Inverse of [`Tile::code`].
    pub fn from_code(code: u8) -> Option<Tile> {
        match code {
            0 => Some(Tile::Grass),
            1 => Some(Tile::Wall),
            2 => Some(Tile::Water),
            3 => Some(Tile::Goal),
            _ => None,
        }
    }

    /// True for tiles that kill the agent on entry.
    pub fn is_hazard(self) -> bool {
        matches!(self, Tile::Wall | Tile::Water)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tile::Grass => "grass",
            Tile::Wall => "wall",
            Tile::Water => "water",
            Tile::Goal => "goal",
        };
        f.write_str(name)
    }
}

/// A cell coordinate. Signed so that a step off the edge of the map is representable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position shifted by the supplied delta.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Grid indices (column, row) if the position lies on the map.
    pub fn cell(self) -> Option<(usize, usize)> {
        let x = usize::try_from(self.x).ok()?;
        let y = usize::try_from(self.y).ok()?;
        (x < GRID_SIZE && y < GRID_SIZE).then_some((x, y))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
