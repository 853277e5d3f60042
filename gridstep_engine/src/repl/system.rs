//! System handlers
//!
//! Speed, reset, variables, help and quitting.

use colored::Colorize;
use log::info;

use crate::observer::NullObserver;
use crate::repl::{Repl, ReplControl, show_handler};
use crate::style::ConsoleStyle;

const HELP: &[(&str, &str)] = &[
    ("begin", "type a program, one statement per line, finished by `end`"),
    ("run <file>", "run a program file"),
    ("rerun", "run the last program again"),
    ("<statement>", "run a single statement, e.g. move_right(3)"),
    ("speed [secs]", "show or set the seconds per tick"),
    ("reset", "put the agent back at (0, 0) and clear variables"),
    ("new", "reset onto the first saved map, or a generated one"),
    ("generate", "reset onto a freshly generated map"),
    ("save <name>", "store the current map"),
    ("load <name>", "reset onto a stored map"),
    ("delete <name>", "remove a stored map"),
    ("maps", "list stored maps"),
    ("show", "draw the board"),
    ("vars", "list variables from the last run"),
    ("quit", "leave"),
];

const LANGUAGE_HELP: &str = "Programs are lines of `name = value`, `print('text')` or `print(name)`, and \
    `move_right(n)`, `move_left(n)`, `move_up(n)`, `move_down(n)`, where n is a number or a variable and \
    defaults to 1. Each line takes one tick and each step of a move takes another. Walls, water and the \
    map edge kill the agent; reaching the goal wins. Press Ctrl-C to stop a running program.";

/// `speed [secs]`: show or change the tick length.
pub fn speed_handler(repl: &mut Repl, secs: Option<&str>) {
    let Some(raw) = secs else {
        println!("{} seconds per tick", repl.session.control().game_speed());
        return;
    };
    let parsed = raw.parse::<f64>().map_err(|err| err.to_string());
    match parsed.and_then(|secs| repl.session.set_game_speed(secs).map_err(|err| err.to_string())) {
        Ok(()) => {
            info!("game speed set to {raw}");
            println!("{}", format!("Speed set to {raw} seconds per tick.").info_style());
        },
        Err(err) => println!("{}", format!("Cannot set speed to '{raw}': {err}").error_style()),
    }
}

/// `reset`: back to the origin, alive, with no variables.
pub fn reset_handler(repl: &mut Repl) {
    repl.session.reset_position(&mut NullObserver);
    println!("{}", "Position reset.".info_style());
    show_handler(repl);
}

/// `vars`: variables bound by the last run.
pub fn vars_handler(repl: &Repl) {
    let vars = repl.session.variables();
    if vars.is_empty() {
        println!("{}", "(no variables)".dim_style());
        return;
    }
    for (name, value) in vars.iter() {
        println!("  {} = {value}", name.bold());
    }
}

pub fn help_handler() {
    let width = textwrap::termwidth().min(100);
    println!("{}", "Commands".heading_style());
    for (usage, what) in HELP {
        println!("  {:<16}{}", usage.prompt_style(), what);
    }
    println!();
    println!("{}", "Language".heading_style());
    println!("{}", textwrap::fill(LANGUAGE_HELP, width));
}

pub fn quit_handler() -> ReplControl {
    println!("{}", "Bye.".dim_style());
    ReplControl::Quit
}

pub fn unknown_handler() {
    println!("{}", "Unknown command. Type `help` for a list.".error_style());
}
