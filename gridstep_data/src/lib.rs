//! Shared data model for gridstep maps.

pub mod defs;
pub mod grid;

pub use defs::*;
pub use grid::{Grid, GridError};
