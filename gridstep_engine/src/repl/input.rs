//! Prompt input for the gridstep REPL.
//!
//! Uses rustyline (history, tab completion of commands and statement keywords) when
//! stdin is a terminal, and plain line reads otherwise.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use crate::command::COMMAND_WORDS;

/// What reading the prompt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

#[derive(Default)]
struct GridstepHelper;

impl Helper for GridstepHelper {}
impl Hinter for GridstepHelper {
    type Hint = String;
}
impl Highlighter for GridstepHelper {}
impl Validator for GridstepHelper {}

impl Completer for GridstepHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, prefix) = word_before(line, pos);
        Ok((start, completions(prefix)))
    }
}

/// Start offset and text of the word ending at `pos`.
fn word_before(line: &str, pos: usize) -> (usize, &str) {
    let head = &line[..pos];
    let start = head.rfind(char::is_whitespace).map_or(0, |i| i + 1);
    (start, &head[start..])
}

fn completions(prefix: &str) -> Vec<Pair> {
    if prefix.is_empty() {
        return Vec::new();
    }
    COMMAND_WORDS
        .iter()
        .filter(|word| word.starts_with(prefix))
        .map(|word| Pair {
            display: (*word).to_string(),
            replacement: (*word).to_string(),
        })
        .collect()
}

pub struct InputManager {
    editor: Option<Editor<GridstepHelper, DefaultHistory>>,
    history_path: Option<PathBuf>,
    buffer: String,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        let history_path = history_file_path();
        let editor = if io::stdin().is_terminal() {
            match Editor::<GridstepHelper, DefaultHistory>::new() {
                Ok(mut editor) => {
                    editor.set_helper(Some(GridstepHelper));
                    if let Some(path) = history_path.as_deref() {
                        load_history(&mut editor, path);
                    }
                    info!("using rustyline input");
                    Some(editor)
                },
                Err(err) => {
                    warn!("rustyline unavailable ({err}), using plain stdin");
                    None
                },
            }
        } else {
            info!("stdin is not a terminal; using plain input");
            None
        };
        Self {
            editor,
            history_path,
            buffer: String::new(),
        }
    }

    /// Read one line. A failing editor is dropped in favor of plain stdin for the rest of the session.
    ///
    /// # Errors
    /// - if stdin cannot be read
    pub fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        if let Some(editor) = self.editor.as_mut() {
            match editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                        if let Some(path) = self.history_path.as_deref()
                            && let Err(err) = editor.save_history(path)
                        {
                            warn!("failed to save history to {}: {err}", path.display());
                        }
                    }
                    return Ok(InputEvent::Line(line));
                },
                Err(ReadlineError::Interrupted) => return Ok(InputEvent::Interrupted),
                Err(ReadlineError::Eof) => return Ok(InputEvent::Eof),
                Err(err) => {
                    warn!("rustyline failed ({err}), switching to plain stdin");
                    self.editor = None;
                },
            }
        }
        self.read_plain(prompt)
    }

    fn read_plain(&mut self, prompt: &str) -> io::Result<InputEvent> {
        print!("{prompt}");
        io::stdout().flush()?;
        self.buffer.clear();
        if io::stdin().read_line(&mut self.buffer)? == 0 {
            return Ok(InputEvent::Eof);
        }
        let line = self.buffer.trim_end_matches(['\n', '\r']).to_string();
        Ok(InputEvent::Line(line))
    }
}

fn load_history(editor: &mut Editor<GridstepHelper, DefaultHistory>, path: &Path) {
    if let Some(dir) = path.parent()
        && let Err(err) = fs::create_dir_all(dir)
    {
        warn!("failed to create history directory {}: {err}", dir.display());
    }
    match editor.load_history(path) {
        Ok(()) => {},
        Err(ReadlineError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            info!("no history at {}, starting fresh", path.display());
        },
        Err(err) => warn!("failed to load history from {}: {err}", path.display()),
    }
}

fn history_file_path() -> Option<PathBuf> {
    dirs::data_dir()
        .or_else(dirs::data_local_dir)
        .map(|base| base.join("gridstep").join("history.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_before_finds_the_current_word() {
        assert_eq!(word_before("save my", 7), (5, "my"));
        assert_eq!(word_before("mov", 3), (0, "mov"));
        assert_eq!(word_before("run ", 4), (4, ""));
    }

    #[test]
    fn completions_match_by_prefix() {
        let found: Vec<_> = completions("move_").into_iter().map(|p| p.replacement).collect();
        assert_eq!(found, vec!["move_down(", "move_left(", "move_right(", "move_up("]);
        assert!(completions("").is_empty());
        assert!(completions("zzz").is_empty());
    }

    #[test]
    fn history_lives_under_gridstep() {
        if let Some(path) = history_file_path() {
            assert!(path.ends_with(Path::new("gridstep/history.txt")));
        }
    }
}
