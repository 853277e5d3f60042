use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GRID_SIZE, Position, Tile};

/// Problems found while building or validating a [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    WrongRowCount { found: usize },
    WrongRowLength { row: usize, found: usize },
    UnknownTileCode { row: usize, col: usize, code: u8 },
    GoalCount { found: usize },
    GoalAtOrigin,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::WrongRowCount { found } => {
                write!(f, "expected {GRID_SIZE} rows, found {found}")
            },
            GridError::WrongRowLength { row, found } => {
                write!(f, "row {row}: expected {GRID_SIZE} tiles, found {found}")
            },
            GridError::UnknownTileCode { row, col, code } => {
                write!(f, "unknown tile code {code} at row {row}, column {col}")
            },
            GridError::GoalCount { found } => {
                write!(f, "map must contain exactly one goal, found {found}")
            },
            GridError::GoalAtOrigin => write!(f, "goal may not be placed on the starting cell"),
        }
    }
}

impl std::error::Error for GridError {}

/// Square, row-major map of side [`GRID_SIZE`].
///
/// A `Grid` always has the right shape; whether it is *playable* (one goal,
/// not on the origin) is checked separately by [`Grid::validate`] so that
/// half-painted maps can still be held and edited.
///
/// ```
/// use gridstep_data::{Grid, Position, Tile};
///
/// let mut grid = Grid::filled(Tile::Grass);
/// grid.set(Position::new(4, 2), Tile::Goal);
/// assert!(grid.validate().is_ok());
/// assert_eq!(grid.goal_position(), Some(Position::new(4, 2)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Tile>>", into = "Vec<Vec<Tile>>")]
pub struct Grid {
    rows: Vec<Vec<Tile>>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::filled(Tile::Grass)
    }
}

impl Grid {
    /// A grid with every cell set to `tile`.
    pub fn filled(tile: Tile) -> Self {
        Self {
            rows: vec![vec![tile; GRID_SIZE]; GRID_SIZE],
        }
    }

    /// Build a grid from rows of tiles, checking the shape.
    ///
    /// # Errors
    /// - if there are not exactly `GRID_SIZE` rows of `GRID_SIZE` tiles
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, GridError> {
        if rows.len() != GRID_SIZE {
            return Err(GridError::WrongRowCount { found: rows.len() });
        }
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find_map(|(i, r)| (r.len() != GRID_SIZE).then_some((i, r.len())))
        {
            return Err(GridError::WrongRowLength { row, found });
        }
        Ok(Self { rows })
    }

    /// Build a grid from the integer tile codes of the exported map format.
    ///
    /// # Errors
    /// - on a bad shape or an unknown tile code
    pub fn from_codes(codes: &[Vec<u8>]) -> Result<Self, GridError> {
        let mut rows = Vec::with_capacity(codes.len());
        for (row, line) in codes.iter().enumerate() {
            let mut tiles = Vec::with_capacity(line.len());
            for (col, &code) in line.iter().enumerate() {
                tiles.push(Tile::from_code(code).ok_or(GridError::UnknownTileCode { row, col, code })?);
            }
            rows.push(tiles);
        }
        Self::from_rows(rows)
    }

    /// Export as integer tile codes, row-major.
    pub fn to_codes(&self) -> Vec<Vec<u8>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|t| t.code()).collect())
            .collect()
    }

    /// Tile at `pos`, or `None` when the position is off the map.
    pub fn get(&self, pos: Position) -> Option<Tile> {
        pos.cell().map(|(x, y)| self.rows[y][x])
    }

    /// Overwrite the tile at `pos`. Returns false (and does nothing) if `pos` is off the map.
    pub fn set(&mut self, pos: Position, tile: Tile) -> bool {
        match pos.cell() {
            Some((x, y)) => {
                self.rows[y][x] = tile;
                true
            },
            None => false,
        }
    }

    pub fn rows(&self) -> &[Vec<Tile>] {
        &self.rows
    }

    /// Every cell with its position, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (Position, Tile)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, &tile)| (position_of(x, y), tile))
        })
    }

    /// Number of cells holding `tile`.
    pub fn count(&self, tile: Tile) -> usize {
        self.cells().filter(|(_, t)| *t == tile).count()
    }

    /// Position of the first goal tile, if any.
    pub fn goal_position(&self) -> Option<Position> {
        self.cells().find(|(_, t)| *t == Tile::Goal).map(|(pos, _)| pos)
    }

    /// Check that the grid is playable: exactly one goal, and not on the origin.
    ///
    /// # Errors
    /// - `GridError::GoalCount` if there are zero or several goals
    /// - `GridError::GoalAtOrigin` if the goal sits on the starting cell
    pub fn validate(&self) -> Result<(), GridError> {
        let goals = self.count(Tile::Goal);
        if goals != 1 {
            return Err(GridError::GoalCount { found: goals });
        }
        if self.get(Position::ORIGIN) == Some(Tile::Goal) {
            return Err(GridError::GoalAtOrigin);
        }
        Ok(())
    }
}

impl TryFrom<Vec<Vec<Tile>>> for Grid {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<Tile>>) -> Result<Self, Self::Error> {
        Grid::from_rows(rows)
    }
}

impl From<Grid> for Vec<Vec<Tile>> {
    fn from(grid: Grid) -> Self {
        grid.rows
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn position_of(x: usize, y: usize) -> Position {
    // x, y < GRID_SIZE, always in i32 range
    Position::new(x as i32, y as i32)
}
