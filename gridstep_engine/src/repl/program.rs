//! Program handlers
//!
//! Typing, loading and running movement programs from the prompt.

use std::fs;
use std::io;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::interpreter::{RunOutcome, Session};
use crate::observer::RunObserver;
use crate::repl::input::{InputEvent, InputManager};
use crate::repl::{Repl, show_handler};
use crate::statement::Program;
use crate::style::ConsoleStyle;
use crate::view::ConsoleView;

/// Line that closes a program typed after `begin`.
pub const END_WORD: &str = "end";

/// Drive a run to completion, turning Ctrl-C into a stop request.
pub async fn drive(session: &Session, program: &Program, observer: &mut dyn RunObserver) -> RunOutcome {
    let run = session.run_program(program, observer);
    tokio::pin!(run);
    loop {
        tokio::select! {
            outcome = &mut run => return outcome,
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    if session.request_stop() {
                        info!("stop requested from the keyboard");
                    }
                },
                Err(err) => {
                    warn!("cannot listen for Ctrl-C: {err}");
                    return (&mut run).await;
                },
            },
        }
    }
}

/// Run `source` against the session, rendering to the terminal.
pub fn execute(repl: &mut Repl, source: &str) -> RunOutcome {
    let program = Program::parse(source);
    let mut view = ConsoleView::new(io::stdout(), repl.session.world(), repl.live);
    view.set_program(&program);
    let session = repl.session.clone();
    let outcome = repl.runtime.block_on(drive(&session, &program, &mut view));
    info!("run finished: {outcome:?}");
    match &outcome {
        RunOutcome::Empty => println!("{}", "Nothing to run.".dim_style()),
        RunOutcome::AlreadyRunning => println!("{}", "A program is already running.".error_style()),
        RunOutcome::Stopped => println!("{}", "Stopped.".dim_style()),
        RunOutcome::AgentDead => println!("{}", "The agent is dead. Type `reset` to try again.".dim_style()),
        _ => {},
    }
    if !repl.live && !outcome.is_empty() {
        show_handler(repl);
    }
    outcome
}

/// `begin`: read lines until `end`, then run them.
///
/// # Errors
/// - if the prompt cannot be read
pub fn begin_handler(repl: &mut Repl, input: &mut InputManager) -> Result<()> {
    println!("{}", format!("Enter statements, then `{END_WORD}` on its own line.").dim_style());
    let mut lines = Vec::new();
    loop {
        let prompt = "... ".prompt_style().to_string();
        match input.read_line(&prompt)? {
            InputEvent::Line(line) if line.trim() == END_WORD => break,
            InputEvent::Line(line) => lines.push(line),
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("{}", "Program discarded.".dim_style());
                return Ok(());
            },
        }
    }
    let source = lines.join("\n");
    repl.last_program = Some(source.clone());
    execute(repl, &source);
    Ok(())
}

/// `run <path>`: run a program file.
///
/// # Errors
/// - if the file cannot be read
pub fn run_file_handler(repl: &mut Repl, path: &str) -> Result<RunOutcome> {
    let source = fs::read_to_string(path).with_context(|| format!("reading program file {path}"))?;
    info!("running program file {path}");
    repl.last_program = Some(source.clone());
    Ok(execute(repl, &source))
}

/// `rerun`: run the last program again.
pub fn rerun_handler(repl: &mut Repl) {
    match repl.last_program.clone() {
        Some(source) => {
            execute(repl, &source);
        },
        None => println!("{}", "No program has been run yet.".dim_style()),
    }
}

/// A statement typed at the prompt runs as a one-line program.
pub fn statement_handler(repl: &mut Repl, line: &str) {
    execute(repl, line);
}
