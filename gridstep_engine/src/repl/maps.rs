//! Map handlers
//!
//! Switching the active map and managing the profile's map library.

use anyhow::Result;
use colored::Colorize;
use log::info;

use crate::generate::generate_map_with;
use crate::map_library::{MapEntryStatus, first_or_generate, format_modified};
use crate::observer::NullObserver;
use crate::repl::Repl;
use crate::style::ConsoleStyle;
use crate::view::{legend, render_grid};

/// `show`: print the board and the agent's state.
pub fn show_handler(repl: &Repl) {
    let (board, agent) = {
        let world = repl.session.read_world();
        (render_grid(&world, true), world.agent())
    };
    print!("{board}");
    println!("{}", legend().dim_style());
    let status = if agent.dead { "dead" } else { "alive" };
    println!("agent at {} ({status})", agent.position);
}

/// `new`: full reset onto the library's first map, or a generated one.
///
/// # Errors
/// - if no map can be generated for the configured layout
pub fn new_map_handler(repl: &mut Repl) -> Result<()> {
    let grid = first_or_generate(Some(&repl.library), repl.config.layout(), &mut rand::rng())?;
    repl.session.full_reset(grid, &mut NullObserver);
    println!("{}", "New map.".info_style());
    show_handler(repl);
    Ok(())
}

/// `generate`: full reset onto a freshly generated map.
///
/// # Errors
/// - if the configured layout does not fit
pub fn generate_handler(repl: &mut Repl) -> Result<()> {
    let grid = generate_map_with(repl.config.layout(), &mut rand::rng())?;
    repl.session.full_reset(grid, &mut NullObserver);
    println!("{}", "Generated a new map.".info_style());
    show_handler(repl);
    Ok(())
}

/// `save <name>`: store the active map in the library.
///
/// # Errors
/// - if the map is not playable or cannot be written
pub fn save_handler(repl: &mut Repl, name: &str) -> Result<()> {
    let path = repl.library.save(name, &repl.session.grid())?;
    println!("{}", format!("Saved '{name}' to {}.", path.display()).info_style());
    Ok(())
}

/// `load <name>`: full reset onto a saved map.
///
/// # Errors
/// - if the map is missing or unplayable
pub fn load_handler(repl: &mut Repl, name: &str) -> Result<()> {
    let grid = repl.library.load(name)?;
    repl.session.full_reset(grid, &mut NullObserver);
    println!("{}", format!("Loaded '{name}'.").info_style());
    show_handler(repl);
    Ok(())
}

/// `delete <name>`: remove a saved map.
///
/// # Errors
/// - if the file exists but cannot be removed
pub fn delete_handler(repl: &mut Repl, name: &str) -> Result<()> {
    if repl.library.remove(name)? {
        println!("{}", format!("Deleted '{name}'.").info_style());
    } else {
        println!("{}", format!("No map named '{name}'.").error_style());
    }
    Ok(())
}

/// `maps`: list the profile's saved maps.
///
/// # Errors
/// - if the library directory cannot be read
pub fn maps_handler(repl: &Repl) -> Result<()> {
    let entries = repl.library.list()?;
    info!("{} map(s) in {}", entries.len(), repl.library.dir().display());
    println!("{}", format!("Maps in {}", repl.library.dir().display()).heading_style());
    if entries.is_empty() {
        println!("{}", "(none saved yet)".dim_style());
        return Ok(());
    }
    for entry in entries {
        let age = entry.modified.map_or_else(|| "unknown".to_string(), format_modified);
        let name = entry.name.unwrap_or_else(|| entry.slug.clone());
        match entry.status {
            MapEntryStatus::Ready => {
                println!("  {:<20} {} [{}]", entry.slug.bold(), name, age.dimmed());
            },
            MapEntryStatus::Invalid { message } | MapEntryStatus::Corrupted { message } => {
                println!(
                    "  {:<20} {} [{}]",
                    entry.slug.bold(),
                    message.as_str().error_style(),
                    age.dimmed()
                );
            },
        }
    }
    Ok(())
}
