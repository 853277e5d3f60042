//! Styling helpers for terminal output.
//!
//! The [`ConsoleStyle`] trait applies ANSI colors via the `colored` crate. It is
//! implemented for `&str` and `String` so literals can be styled directly.

use colored::{ColoredString, Colorize};
use gridstep_data::Tile;

use crate::observer::OutputKind;

pub trait ConsoleStyle {
    fn print_style(&self) -> ColoredString;
    fn info_style(&self) -> ColoredString;
    fn error_style(&self) -> ColoredString;
    fn highlight_style(&self) -> ColoredString;
    fn prompt_style(&self) -> ColoredString;
    fn heading_style(&self) -> ColoredString;
    fn dim_style(&self) -> ColoredString;
    fn agent_style(&self) -> ColoredString;
    fn dead_agent_style(&self) -> ColoredString;
    fn tile_style(&self, tile: Tile) -> ColoredString;
    fn output_style(&self, kind: OutputKind) -> ColoredString {
        match kind {
            OutputKind::Normal => self.print_style(),
            OutputKind::Info => self.info_style(),
            OutputKind::Error => self.error_style(),
        }
    }
}

impl ConsoleStyle for &str {
    fn print_style(&self) -> ColoredString {
        self.truecolor(255, 255, 255)
    }
    fn info_style(&self) -> ColoredString {
        self.bold().truecolor(16, 185, 129)
    }
    fn error_style(&self) -> ColoredString {
        self.bold().truecolor(239, 68, 68)
    }
    fn highlight_style(&self) -> ColoredString {
        self.bold().black().on_truecolor(255, 235, 59)
    }
    fn prompt_style(&self) -> ColoredString {
        self.truecolor(102, 208, 250)
    }
    fn heading_style(&self) -> ColoredString {
        self.underline().truecolor(245, 158, 11)
    }
    fn dim_style(&self) -> ColoredString {
        self.dimmed()
    }
    fn agent_style(&self) -> ColoredString {
        self.bold().truecolor(255, 255, 255).on_truecolor(239, 68, 68)
    }
    fn dead_agent_style(&self) -> ColoredString {
        self.bold().black().on_truecolor(239, 68, 68)
    }
    fn tile_style(&self, tile: Tile) -> ColoredString {
        match tile {
            Tile::Grass => self.truecolor(6, 78, 59).on_truecolor(16, 185, 129),
            Tile::Wall => self.truecolor(229, 231, 235).on_truecolor(107, 114, 128),
            Tile::Water => self.truecolor(219, 234, 254).on_truecolor(59, 130, 246),
            Tile::Goal => self.bold().black().on_truecolor(245, 158, 11),
        }
    }
}

impl ConsoleStyle for String {
    fn print_style(&self) -> ColoredString {
        self.as_str().print_style()
    }
    fn info_style(&self) -> ColoredString {
        self.as_str().info_style()
    }
    fn error_style(&self) -> ColoredString {
        self.as_str().error_style()
    }
    fn highlight_style(&self) -> ColoredString {
        self.as_str().highlight_style()
    }
    fn prompt_style(&self) -> ColoredString {
        self.as_str().prompt_style()
    }
    fn heading_style(&self) -> ColoredString {
        self.as_str().heading_style()
    }
    fn dim_style(&self) -> ColoredString {
        self.as_str().dim_style()
    }
    fn agent_style(&self) -> ColoredString {
        self.as_str().agent_style()
    }
    fn dead_agent_style(&self) -> ColoredString {
        self.as_str().dead_agent_style()
    }
    fn tile_style(&self, tile: Tile) -> ColoredString {
        self.as_str().tile_style(tile)
    }
}
