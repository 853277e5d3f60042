//! The grid world model.
//!
//! [`GridWorld`] owns the active map and the agent standing on it. It exposes
//! pure predicates for the interpreter's collision checks and plain setters;
//! callers validate a move before committing it.

use gridstep_data::{GRID_SIZE, Grid, Position, Tile};
use log::info;
use serde::{Deserialize, Serialize};

/// Where the agent is and whether it survived the last move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Position,
    /// Mirrors `position` outside of animations.
    pub target: Position,
    pub dead: bool,
}

impl AgentState {
    /// Agent standing alive on the origin.
    pub fn at_origin() -> Self {
        Self::default()
    }
}

/// Active map plus agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridWorld {
    grid: Grid,
    agent: AgentState,
}

impl GridWorld {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            agent: AgentState::at_origin(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn agent(&self) -> AgentState {
        self.agent
    }

    pub fn position(&self) -> Position {
        self.agent.position
    }

    pub fn is_dead(&self) -> bool {
        self.agent.dead
    }

    /// True if `pos` lies outside the map.
    pub fn is_out_of_bounds(pos: Position) -> bool {
        let size = i32::try_from(GRID_SIZE).unwrap_or(i32::MAX);
        pos.x < 0 || pos.x >= size || pos.y < 0 || pos.y >= size
    }

    /// True if the tile at `pos` is a wall or water. Off-map positions are not collisions;
    /// check [`GridWorld::is_out_of_bounds`] first.
    pub fn is_collision(&self, pos: Position) -> bool {
        self.grid.get(pos).is_some_and(Tile::is_hazard)
    }

    pub fn is_goal(&self, pos: Position) -> bool {
        self.grid.get(pos) == Some(Tile::Goal)
    }

    pub fn tile_at(&self, pos: Position) -> Option<Tile> {
        self.grid.get(pos)
    }

    /// Move the agent. The target follows so static redraws show the same cell.
    pub fn set_position(&mut self, pos: Position) {
        self.agent.position = pos;
        self.agent.target = pos;
    }

    pub fn set_target(&mut self, pos: Position) {
        self.agent.target = pos;
    }

    pub fn set_dead(&mut self, dead: bool) {
        self.agent.dead = dead;
    }

    /// Put the agent back on the origin, alive. The map is untouched.
    pub fn reset_agent(&mut self) {
        self.agent = AgentState::at_origin();
    }

    /// Replace the map wholesale. The agent is not moved.
    pub fn load_map(&mut self, grid: Grid) {
        info!(
            "loading map ({} walls, {} water, goal at {:?})",
            grid.count(Tile::Wall),
            grid.count(Tile::Water),
            grid.goal_position()
        );
        self.grid = grid;
    }
}
