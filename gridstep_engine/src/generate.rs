//! Random map generation.

use gridstep_data::{GRID_SIZE, Grid, GridError, MIN_WALLS, MIN_WATER, Position, Tile};
use log::info;
use rand::Rng;
use thiserror::Error;

/// Errors raised while generating or accepting a map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("cannot place {walls} walls and {water} water tiles plus a goal on a {size}x{size} map", size = GRID_SIZE)]
    TooManyFeatures { walls: usize, water: usize },
    #[error("invalid map: {0}")]
    Invalid(#[from] GridError),
}

/// How many hazards a generated map carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapLayout {
    pub walls: usize,
    pub water: usize,
}

impl Default for MapLayout {
    fn default() -> Self {
        Self {
            walls: MIN_WALLS,
            water: MIN_WATER,
        }
    }
}

impl MapLayout {
    /// Check that the goal and every hazard fit on the map without touching the origin.
    ///
    /// # Errors
    /// - `MapError::TooManyFeatures` if they cannot all be placed
    pub fn check(self) -> Result<(), MapError> {
        // origin is never the goal, and must stay reachable as a start cell
        let free_cells = GRID_SIZE * GRID_SIZE - 1;
        if self.walls.saturating_add(self.water).saturating_add(1) > free_cells {
            return Err(MapError::TooManyFeatures {
                walls: self.walls,
                water: self.water,
            });
        }
        Ok(())
    }
}

/// Generate a map with the default layout using the thread-local RNG.
pub fn generate_map() -> Grid {
    let mut rng = rand::rng();
    // the default layout always fits
    generate_map_with(MapLayout::default(), &mut rng).unwrap_or_default()
}

/// Generate a map: one goal anywhere but the origin, then walls, then water, each on a
/// distinct cell that is still grass.
///
/// # Errors
/// - `MapError::TooManyFeatures` if `layout` cannot fit on the map
pub fn generate_map_with<R: Rng + ?Sized>(layout: MapLayout, rng: &mut R) -> Result<Grid, MapError> {
    layout.check()?;
    let mut grid = Grid::filled(Tile::Grass);

    let goal = loop {
        let pos = random_cell(rng);
        if pos != Position::ORIGIN {
            break pos;
        }
    };
    grid.set(goal, Tile::Goal);

    place_on_grass(&mut grid, Tile::Wall, layout.walls, rng);
    place_on_grass(&mut grid, Tile::Water, layout.water, rng);

    info!(
        "generated map: goal at {goal}, {} walls, {} water",
        layout.walls, layout.water
    );
    Ok(grid)
}

fn place_on_grass<R: Rng + ?Sized>(grid: &mut Grid, tile: Tile, count: usize, rng: &mut R) {
    for _ in 0..count {
        loop {
            let pos = random_cell(rng);
            if pos != Position::ORIGIN && grid.get(pos) == Some(Tile::Grass) {
                grid.set(pos, tile);
                break;
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn random_cell<R: Rng + ?Sized>(rng: &mut R) -> Position {
    let size = GRID_SIZE as i32;
    Position::new(rng.random_range(0..size), rng.random_range(0..size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generated_maps_hold_the_documented_features() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = generate_map_with(MapLayout::default(), &mut rng).unwrap();
            assert_eq!(grid.count(Tile::Goal), 1);
            assert_ne!(grid.goal_position(), Some(Position::ORIGIN));
            assert_eq!(grid.count(Tile::Wall), MIN_WALLS);
            assert_eq!(grid.count(Tile::Water), MIN_WATER);
            assert_eq!(grid.get(Position::ORIGIN), Some(Tile::Grass));
            assert!(grid.validate().is_ok());
        }
    }

    #[test]
    fn same_seed_gives_same_map() {
        let a = generate_map_with(MapLayout::default(), &mut StdRng::seed_from_u64(7)).unwrap();
        let b = generate_map_with(MapLayout::default(), &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn oversized_layout_is_rejected() {
        let layout = MapLayout {
            walls: GRID_SIZE * GRID_SIZE,
            water: 0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            generate_map_with(layout, &mut rng),
            Err(MapError::TooManyFeatures { .. })
        ));
    }

    #[test]
    fn densest_layout_still_terminates() {
        let layout = MapLayout {
            walls: GRID_SIZE * GRID_SIZE - 2,
            water: 0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let grid = generate_map_with(layout, &mut rng).unwrap();
        assert_eq!(grid.count(Tile::Grass), 1);
        assert_eq!(grid.get(Position::ORIGIN), Some(Tile::Grass));
    }

    #[test]
    fn thread_rng_generation_is_valid() {
        assert!(generate_map().validate().is_ok());
    }
}
