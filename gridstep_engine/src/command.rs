//! Command module
//!
//! Describes what can be typed at the gridstep prompt. Anything that is not a front-end
//! command but reads as a movement-language statement is run as a one-line program.
use variantly::Variantly;

use crate::statement::Statement;

/// Commands available at the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum Command {
    /// Start typing a multi-line program, finished by a line reading `end`.
    Begin,
    Delete(String),
    Generate,
    Help,
    Load(String),
    Maps,
    NewMap,
    Quit,
    /// Run the last program again.
    Rerun,
    Reset,
    Run(String),
    Save(String),
    Show,
    /// Show (`None`) or change the seconds per tick.
    Speed(Option<String>),
    /// A single statement of the movement language.
    Statement(String),
    Unknown,
    Vars,
}

/// Words offered by tab completion.
pub const COMMAND_WORDS: &[&str] = &[
    "begin", "delete", "end", "generate", "help", "load", "maps", "move_down(", "move_left(", "move_right(",
    "move_up(", "new", "print(", "quit", "rerun", "reset", "run", "save", "show", "speed", "vars",
];

/// Parse a line typed at the prompt.
pub fn parse_command(input: &str) -> Command {
    let words: Vec<&str> = input.split_whitespace().collect();
    match words.as_slice() {
        ["begin" | "program"] => Command::Begin,
        ["run", path @ ..] if !path.is_empty() => Command::Run(path.join(" ")),
        ["rerun" | "again"] => Command::Rerun,
        ["speed"] => Command::Speed(None),
        ["speed", secs] => Command::Speed(Some((*secs).to_string())),
        ["reset" | "restart"] => Command::Reset,
        ["new"] | ["new", "map"] => Command::NewMap,
        ["generate" | "random"] => Command::Generate,
        ["save", name @ ..] if !name.is_empty() => Command::Save(name.join(" ")),
        ["load", name @ ..] if !name.is_empty() => Command::Load(name.join(" ")),
        ["delete" | "rm", name @ ..] if !name.is_empty() => Command::Delete(name.join(" ")),
        ["maps" | "library"] => Command::Maps,
        ["show" | "board" | "map"] => Command::Show,
        ["vars" | "variables"] => Command::Vars,
        ["help" | "?"] => Command::Help,
        ["quit" | "exit"] => Command::Quit,
        _ => statement_command(input),
    }
}

fn statement_command(input: &str) -> Command {
    let line = input.trim();
    match Statement::parse(line) {
        Ok(Statement::Noop) => Command::Unknown,
        // malformed statements still run so the interpreter reports the error
        Ok(_) | Err(_) => Command::Statement(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_end_commands() {
        assert_eq!(parse_command("run  demos/zigzag.gs"), Command::Run("demos/zigzag.gs".into()));
        assert_eq!(parse_command("save my   maze"), Command::Save("my maze".into()));
        assert_eq!(parse_command("speed"), Command::Speed(None));
        assert_eq!(parse_command("speed 0.1"), Command::Speed(Some("0.1".into())));
        assert_eq!(parse_command("new map"), Command::NewMap);
        assert!(parse_command("?").is_help());
        assert!(parse_command("exit").is_quit());
    }

    #[test]
    fn missing_arguments_are_unknown() {
        assert!(parse_command("run").is_unknown());
        assert!(parse_command("load").is_unknown());
    }

    #[test]
    fn statements_become_one_line_programs() {
        assert_eq!(parse_command(" move_up(2) "), Command::Statement("move_up(2)".into()));
        assert_eq!(parse_command("print('hi')"), Command::Statement("print('hi')".into()));
        assert_eq!(parse_command("print("), Command::Statement("print(".into()));
        assert!(parse_command("dance").is_unknown());
    }
}
