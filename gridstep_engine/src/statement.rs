//! Statement module
//!
//! Classifies each line of a movement program into a [`Statement`]. A program is parsed
//! once, up front; a malformed line keeps its error so the interpreter can report it when
//! execution actually reaches that line.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use variantly::Variantly;

lazy_static! {
    static ref PRINT_QUOTED: Regex = Regex::new(r#"print\(['"]([^'"]+)['"]\)"#).expect("valid print regex");
    static ref PRINT_IDENT: Regex = Regex::new(r"print\(([A-Za-z0-9_]+)\)").expect("valid print regex");
    static ref MOVE: Regex =
        Regex::new(r"^(move_right|move_left|move_down|move_up)\s*\(\s*([A-Za-z0-9_]+)?\s*\)$").expect("valid move regex");
}

/// Errors raised by a single malformed statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    #[error("Invalid value for {name}")]
    InvalidAssignment { name: String },
    #[error("Invalid print statement")]
    InvalidPrint,
}

/// The four movement commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Left,
    Up,
    Down,
}

impl Direction {
    /// Unit step `(dx, dy)`. `y` grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Right => "move_right",
            Direction::Left => "move_left",
            Direction::Up => "move_up",
            Direction::Down => "move_down",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Direction> {
        match word {
            "move_right" => Some(Direction::Right),
            "move_left" => Some(Direction::Left),
            "move_up" => Some(Direction::Up),
            "move_down" => Some(Direction::Down),
            _ => None,
        }
    }
}

/// Right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(i64),
    Variable(String),
}

/// Argument of a `print(...)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintArg {
    /// Quoted text, printed verbatim.
    Text(String),
    /// Bare identifier, printed as its value (or its own name when unbound).
    Identifier(String),
}

/// A classified program line.
#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum Statement {
    Assign { name: String, value: Operand },
    Print(PrintArg),
    /// `argument` is the raw parameter token; it is resolved against the variables at run time.
    Move { direction: Direction, argument: Option<String> },
    /// Unrecognized line; skipped.
    Noop,
}

impl Statement {
    /// Classify a single trimmed, non-blank line.
    ///
    /// Shapes are tried in order: assignment (`=` but not `==`), print, movement. Anything
    /// else is a `Noop`.
    ///
    /// # Errors
    /// - `StatementError::InvalidPrint` if a line starts with `print(` but has no valid argument
    ///
    /// ```
    /// use gridstep_engine::statement::{Direction, Statement};
    ///
    /// let stmt = Statement::parse("move_up(3)").unwrap();
    /// assert_eq!(
    ///     stmt,
    ///     Statement::Move { direction: Direction::Up, argument: Some("3".into()) }
    /// );
    /// assert!(Statement::parse("jump()").unwrap().is_noop());
    /// ```
    pub fn parse(line: &str) -> Result<Statement, StatementError> {
        let line = line.trim();
        if line.contains('=') && !line.contains("==") {
            return Ok(parse_assignment(line));
        }
        if line.starts_with("print(") {
            return parse_print(line);
        }
        if let Some(caps) = MOVE.captures(line) {
            let direction = Direction::from_keyword(&caps[1]).unwrap_or(Direction::Right);
            let argument = caps.get(2).map(|m| m.as_str().to_string());
            return Ok(Statement::Move { direction, argument });
        }
        Ok(Statement::Noop)
    }
}

fn parse_assignment(line: &str) -> Statement {
    let (lhs, rhs) = line.split_once('=').unwrap_or((line, ""));
    let name = lhs.trim().to_string();
    let rhs = rhs.trim();
    let value = if !rhs.is_empty() && rhs.bytes().all(|b| b.is_ascii_digit()) {
        // an overflowing literal can never be bound, so it fails at run time like any unknown name
        rhs.parse().map_or_else(|_| Operand::Variable(rhs.to_string()), Operand::Literal)
    } else {
        Operand::Variable(rhs.to_string())
    };
    Statement::Assign { name, value }
}

fn parse_print(line: &str) -> Result<Statement, StatementError> {
    if let Some(caps) = PRINT_QUOTED.captures(line) {
        return Ok(Statement::Print(PrintArg::Text(caps[1].to_string())));
    }
    if let Some(caps) = PRINT_IDENT.captures(line) {
        return Ok(Statement::Print(PrintArg::Identifier(caps[1].to_string())));
    }
    Err(StatementError::InvalidPrint)
}

/// One executable line of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLine {
    /// Zero-based line number in the original source text, blank lines included.
    pub source_line: usize,
    /// Trimmed text of the line.
    pub text: String,
    pub statement: Result<Statement, StatementError>,
}

/// A parsed program: the non-blank lines of the source, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    lines: Vec<ProgramLine>,
}

impl Program {
    pub fn parse(source: &str) -> Self {
        let lines = source
            .lines()
            .enumerate()
            .filter_map(|(source_line, raw)| {
                let text = raw.trim();
                (!text.is_empty()).then(|| ProgramLine {
                    source_line,
                    text: text.to_string(),
                    statement: Statement::parse(text),
                })
            })
            .collect();
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ProgramLine> {
        self.lines.get(index)
    }

    pub fn lines(&self) -> &[ProgramLine] {
        &self.lines
    }

    /// Map a statement index back to its line number in the source text.
    pub fn source_line(&self, index: usize) -> Option<usize> {
        self.lines.get(index).map(|l| l.source_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Statement {
        Statement::parse(line).unwrap()
    }

    #[test]
    fn assignment_takes_literal_or_name() {
        assert_eq!(
            parse("x = 5"),
            Statement::Assign {
                name: "x".into(),
                value: Operand::Literal(5)
            }
        );
        assert_eq!(
            parse("y=x"),
            Statement::Assign {
                name: "y".into(),
                value: Operand::Variable("x".into())
            }
        );
    }

    #[test]
    fn assignment_splits_once() {
        assert_eq!(
            parse("a = 1 = 2"),
            Statement::Assign {
                name: "a".into(),
                value: Operand::Variable("1 = 2".into())
            }
        );
    }

    #[test]
    fn overflowing_literal_becomes_unbound_name() {
        assert_eq!(
            parse("n = 99999999999999999999"),
            Statement::Assign {
                name: "n".into(),
                value: Operand::Variable("99999999999999999999".into())
            }
        );
    }

    #[test]
    fn double_equals_is_not_assignment() {
        assert_eq!(parse("x == 5"), Statement::Noop);
    }

    #[test]
    fn assignment_is_checked_before_print() {
        assert!(parse("print('a=b')").is_assign());
    }

    #[test]
    fn print_forms() {
        assert_eq!(parse("print('Hello')"), Statement::Print(PrintArg::Text("Hello".into())));
        assert_eq!(
            parse("print(\"two words\")"),
            Statement::Print(PrintArg::Text("two words".into()))
        );
        assert_eq!(parse("print(x)"), Statement::Print(PrintArg::Identifier("x".into())));
    }

    #[test]
    fn malformed_print_is_an_error() {
        assert_eq!(Statement::parse("print()"), Err(StatementError::InvalidPrint));
        assert_eq!(Statement::parse("print('')"), Err(StatementError::InvalidPrint));
        assert_eq!(Statement::parse("print(a b)"), Err(StatementError::InvalidPrint));
    }

    #[test]
    fn movement_forms() {
        assert_eq!(
            parse("move_right()"),
            Statement::Move {
                direction: Direction::Right,
                argument: None
            }
        );
        assert_eq!(
            parse("move_down( steps )"),
            Statement::Move {
                direction: Direction::Down,
                argument: Some("steps".into())
            }
        );
        assert_eq!(
            parse("move_left (2)"),
            Statement::Move {
                direction: Direction::Left,
                argument: Some("2".into())
            }
        );
    }

    #[test]
    fn movement_requires_parentheses() {
        assert_eq!(parse("move_up"), Statement::Noop);
        assert_eq!(parse("move_up(1) extra"), Statement::Noop);
        assert_eq!(parse("move_sideways(1)"), Statement::Noop);
    }

    #[test]
    fn program_skips_blank_lines_and_tracks_source_lines() {
        let program = Program::parse("\n  x = 2\n\n\tmove_right(x)  \n\n");
        assert_eq!(program.len(), 2);
        assert_eq!(program.get(0).unwrap().text, "x = 2");
        assert_eq!(program.get(1).unwrap().text, "move_right(x)");
        assert_eq!(program.source_line(0), Some(1));
        assert_eq!(program.source_line(1), Some(3));
        assert_eq!(program.source_line(2), None);
    }

    #[test]
    fn program_keeps_errors_in_place() {
        let program = Program::parse("print('ok')\nprint(\nmove_up()");
        assert!(program.get(0).unwrap().statement.is_ok());
        assert_eq!(program.get(1).unwrap().statement, Err(StatementError::InvalidPrint));
        assert!(program.get(2).unwrap().statement.is_ok());
    }

    #[test]
    fn direction_deltas() {
        assert_eq!(Direction::Right.delta(), (1, 0));
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Down.delta(), (0, 1));
        assert_eq!(Direction::from_keyword(Direction::Down.keyword()), Some(Direction::Down));
    }
}
