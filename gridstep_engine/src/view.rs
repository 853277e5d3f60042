//! Terminal rendering.
//!
//! [`render_grid`] draws the board as text. [`ConsoleView`] is the terminal front end's
//! [`RunObserver`]: it keeps the console log and the highlighted line, and repaints a
//! full frame (board, current line, recent output) whenever the run reports a change.

use std::collections::VecDeque;
use std::io::Write;

use colored::Colorize;
use gridstep_data::{GRID_SIZE, Position, Tile};
use log::warn;

use crate::interpreter::SharedWorld;
use crate::observer::{OutputLine, RunObserver};
use crate::statement::Program;
use crate::style::ConsoleStyle;
use crate::world::GridWorld;

const CONSOLE_LINES: usize = 8;
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

pub fn tile_glyph(tile: Tile) -> &'static str {
    match tile {
        Tile::Grass => ".",
        Tile::Wall => "#",
        Tile::Water => "~",
        Tile::Goal => "*",
    }
}

/// Draw the board, one two-column cell per tile, with the agent on top.
pub fn render_grid(world: &GridWorld, styled: bool) -> String {
    let agent = world.agent();
    let mut out = String::new();
    for (y, row) in world.grid().rows().iter().enumerate() {
        for (x, &tile) in row.iter().enumerate() {
            let here = Position::new(
                i32::try_from(x).unwrap_or(i32::MAX),
                i32::try_from(y).unwrap_or(i32::MAX),
            ) == agent.position;
            let glyph = match (here, agent.dead) {
                (true, false) => "@",
                (true, true) => "x",
                (false, _) => tile_glyph(tile),
            };
            let cell = format!("{glyph} ");
            if !styled {
                out.push_str(&cell);
            } else if here && agent.dead {
                out.push_str(&cell.dead_agent_style().to_string());
            } else if here {
                out.push_str(&cell.agent_style().to_string());
            } else {
                out.push_str(&cell.tile_style(tile).to_string());
            }
        }
        out.push('\n');
    }
    out
}

/// One-line legend under the board.
pub fn legend() -> String {
    format!(
        "@ agent  {} grass  {} wall  {} water  {} goal  ({GRID_SIZE}x{GRID_SIZE})",
        tile_glyph(Tile::Grass),
        tile_glyph(Tile::Wall),
        tile_glyph(Tile::Water),
        tile_glyph(Tile::Goal)
    )
}

/// Terminal observer for a run.
pub struct ConsoleView<W: Write + Send> {
    out: W,
    world: SharedWorld,
    program_lines: Vec<String>,
    highlighted: Option<usize>,
    console: VecDeque<OutputLine>,
    /// Repaint whole frames; otherwise just stream output lines.
    live: bool,
}

impl<W: Write + Send> ConsoleView<W> {
    pub fn new(out: W, world: SharedWorld, live: bool) -> Self {
        Self {
            out,
            world,
            program_lines: Vec::new(),
            highlighted: None,
            console: VecDeque::with_capacity(CONSOLE_LINES),
            live,
        }
    }

    /// Remember the program's lines so the highlighted one can be shown.
    pub fn set_program(&mut self, program: &Program) {
        self.program_lines = program.lines().iter().map(|l| l.text.clone()).collect();
        self.highlighted = None;
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            warn!("console write failed: {err}");
        }
    }

    /// Board, highlighted line and console log.
    pub fn frame(&self) -> String {
        let board = {
            let world = self.world.read().unwrap_or_else(std::sync::PoisonError::into_inner);
            render_grid(&world, true)
        };
        let mut frame = String::new();
        frame.push_str(&board);
        frame.push_str(&legend().dim_style().to_string());
        frame.push_str("\n\n");
        if let Some(text) = self.highlighted.and_then(|i| self.program_lines.get(i).map(|t| (i, t))) {
            let (index, line) = text;
            frame.push_str(&format!("{:>3} {}\n", index + 1, line.highlight_style()));
        } else {
            frame.push('\n');
        }
        frame.push_str(&format!("{}\n", "console".heading_style()));
        for line in &self.console {
            frame.push_str(&format!("{}\n", line.text.output_style(line.kind)));
        }
        frame
    }

    fn repaint(&mut self) {
        if self.live {
            let frame = format!("{CLEAR_SCREEN}{}", self.frame());
            self.write(&frame);
        }
    }
}

impl<W: Write + Send> RunObserver for ConsoleView<W> {
    fn started(&mut self) {
        self.console.clear();
        self.repaint();
    }

    fn ended(&mut self) {
        self.repaint();
        self.write(&format!("{}\n", "program ended".dim_style()));
    }

    fn output(&mut self, line: OutputLine) {
        if !self.live {
            let text = format!("{}\n", line.text.output_style(line.kind));
            self.write(&text);
        }
        if self.console.len() == CONSOLE_LINES {
            self.console.pop_front();
        }
        self.console.push_back(line);
        self.repaint();
    }

    fn highlight(&mut self, index: usize) {
        self.highlighted = Some(index);
        self.repaint();
    }

    fn clear_highlight(&mut self) {
        self.highlighted = None;
    }

    fn redraw(&mut self) {
        self.repaint();
    }
}
