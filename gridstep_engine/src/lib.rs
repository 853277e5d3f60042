#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const GRIDSTEP_VERSION: &str = env!("CARGO_PKG_VERSION");

// Interpreter core
pub mod control;
pub mod interpreter;
pub mod observer;
pub mod statement;
pub mod variables;
pub mod world;

// Maps
pub mod generate;
pub mod map_library;
pub mod slug;

// Terminal front end
pub mod command;
pub mod config;
pub mod repl;
pub mod style;
pub mod view;

// Re-exports for convenience
pub use control::{ExecutionState, RunControl};
pub use generate::{MapLayout, generate_map};
pub use gridstep_data::{GRID_SIZE, Grid, Position, Tile};
pub use interpreter::{DeathCause, RunOutcome, Session};
pub use observer::{EventLog, OutputKind, OutputLine, RunEvent, RunObserver};
pub use repl::{Repl, run_repl};
pub use statement::{Program, Statement};
pub use world::{AgentState, GridWorld};
