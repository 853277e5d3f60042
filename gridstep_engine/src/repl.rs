//! REPL and command handling.
//!
//! The terminal front end is a read-eval-print loop over a [`Session`]. Handlers for
//! the commands live in the submodules: [`program`] runs movement programs, [`maps`]
//! switches and stores maps, [`system`] covers everything else.

mod input;
pub mod maps;
pub mod program;
pub mod system;

pub use maps::*;
pub use program::*;
pub use system::*;

use anyhow::{Context, Result};
use log::{error, info};
use tokio::runtime::Runtime;

use crate::command::{Command, parse_command};
use crate::config::Config;
use crate::interpreter::Session;
use crate::map_library::MapLibrary;
use crate::style::ConsoleStyle;

pub use input::{InputEvent, InputManager};

/// Control flow signal used by handlers to exit the REPL.
pub enum ReplControl {
    Continue,
    Quit,
}

/// Everything the command handlers work on.
pub struct Repl {
    pub session: Session,
    pub config: Config,
    pub library: MapLibrary,
    pub runtime: Runtime,
    /// Source of the most recent program, for `rerun`.
    pub last_program: Option<String>,
    /// Repaint full frames while a program runs.
    pub live: bool,
}

impl Repl {
    /// Build the REPL state and the single-threaded runtime programs are driven on.
    ///
    /// # Errors
    /// - if the tokio runtime cannot be started
    pub fn new(session: Session, config: Config, live: bool) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("starting the program runtime")?;
        let library = config.library();
        Ok(Self {
            session,
            config,
            library,
            runtime,
            last_program: None,
            live,
        })
    }
}

/// Run the read-eval-print loop until the user quits or input ends.
///
/// Handler failures (a missing program file, a bad map name) are reported and the loop
/// carries on.
///
/// # Errors
/// - if the prompt cannot be read at all
pub fn run_repl(repl: &mut Repl) -> Result<()> {
    let mut input = InputManager::new();
    println!("{}", format!("gridstep {}", crate::GRIDSTEP_VERSION).heading_style());
    println!("{}", "Type `help` for commands, or a statement such as move_right(3).".dim_style());
    show_handler(repl);

    loop {
        let prompt = "\ngridstep> ".prompt_style().to_string();
        let line = match input.read_line(&prompt)? {
            InputEvent::Line(line) => line,
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("{}", "(use `quit` to leave)".dim_style());
                continue;
            },
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = parse_command(&line);
        info!("command: {command:?}");
        match dispatch(repl, &mut input, command) {
            Ok(ReplControl::Continue) => {},
            Ok(ReplControl::Quit) => break,
            Err(err) => {
                error!("{err:#}");
                println!("{}", format!("error: {err:#}").error_style());
            },
        }
    }
    info!("leaving the REPL");
    Ok(())
}

fn dispatch(repl: &mut Repl, input: &mut InputManager, command: Command) -> Result<ReplControl> {
    #[allow(clippy::enum_glob_use)]
    use Command::*;
    match command {
        Begin => begin_handler(repl, input)?,
        Run(path) => {
            run_file_handler(repl, &path)?;
        },
        Rerun => rerun_handler(repl),
        Statement(line) => statement_handler(repl, &line),
        Speed(secs) => speed_handler(repl, secs.as_deref()),
        Reset => reset_handler(repl),
        NewMap => new_map_handler(repl)?,
        Generate => generate_handler(repl)?,
        Save(name) => save_handler(repl, &name)?,
        Load(name) => load_handler(repl, &name)?,
        Delete(name) => delete_handler(repl, &name)?,
        Maps => maps_handler(repl)?,
        Show => show_handler(repl),
        Vars => vars_handler(repl),
        Help => help_handler(),
        Quit => return Ok(quit_handler()),
        Unknown => unknown_handler(),
    }
    Ok(ReplControl::Continue)
}
