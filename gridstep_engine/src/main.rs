#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** gridstep **
//! Steer an agent across a grid with a tiny movement language.

use gridstep_engine::config::{load_config, load_config_from};
use gridstep_engine::map_library::first_or_generate;
use gridstep_engine::repl::run_file_handler;
use gridstep_engine::{Repl, RunControl, Session, run_repl};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gridstep", version, about = "Steer an agent across a grid with a tiny movement language")]
struct Cli {
    /// Program file to run once instead of starting the prompt.
    program: Option<PathBuf>,
    /// Config file to use in place of the usual search.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seconds per tick.
    #[arg(long)]
    speed: Option<f64>,
    /// Profile whose map library is used.
    #[arg(long)]
    profile: Option<String>,
    /// Saved map to start on.
    #[arg(long)]
    map: Option<String>,
    /// Print output lines instead of redrawing the board.
    #[arg(long)]
    plain: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config(),
    };
    if let Some(profile) = cli.profile {
        config.profile = profile;
    }
    info!("profile '{}', maps in {}", config.profile, config.library().dir().display());

    let library = config.library();
    let grid = match &cli.map {
        Some(name) => library.load(name)?,
        None => first_or_generate(Some(&library), config.layout(), &mut rand::rng()).context("while preparing the first map")?,
    };

    let control = RunControl::new(config.game_speed);
    if let Some(speed) = cli.speed {
        control.set_game_speed(speed).context("--speed")?;
    }
    let session = Session::with_control(grid, control);
    let live = !cli.plain && io::stdout().is_terminal();
    let mut repl = Repl::new(session, config, live)?;

    if let Some(path) = cli.program {
        let outcome = run_file_handler(&mut repl, &path.to_string_lossy())?;
        info!("{} finished: {outcome:?}", path.display());
        return Ok(());
    }

    if live {
        // clear the screen
        print!("\x1B[2J\x1B[H");
        io::stdout().flush()?;
    }
    info!("starting the prompt");
    run_repl(&mut repl)
}
