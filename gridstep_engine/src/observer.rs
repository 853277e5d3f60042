//! Notifications emitted by a run.
//!
//! The interpreter never prints or draws anything itself. It reports through a
//! [`RunObserver`]: console output, the line being executed, redraw requests and the
//! start / end of a run. Front ends implement the trait directly, collect events with an
//! [`EventLog`], or forward them over a tokio channel as [`RunEvent`]s.

use tokio::sync::mpsc::UnboundedSender;
use variantly::Variantly;

/// How an output line should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Program output from `print`.
    Normal,
    /// Status and success messages.
    Info,
    /// Deaths and statement errors.
    Error,
}

/// One line for the console sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub kind: OutputKind,
    pub text: String,
}

impl OutputLine {
    pub fn normal(text: impl Into<String>) -> Self {
        Self {
            kind: OutputKind::Normal,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: OutputKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: OutputKind::Error,
            text: text.into(),
        }
    }
}

/// Receiver of run notifications. Every method defaults to doing nothing.
pub trait RunObserver: Send {
    fn started(&mut self) {}
    fn ended(&mut self) {}
    fn output(&mut self, _line: OutputLine) {}
    /// Statement `index` (into the program's non-blank lines) is about to execute.
    fn highlight(&mut self, _index: usize) {}
    fn clear_highlight(&mut self) {}
    /// World state changed; re-read it.
    fn redraw(&mut self) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl RunObserver for NullObserver {}

/// A run notification as a value.
#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum RunEvent {
    Started,
    Ended,
    Output(OutputLine),
    Highlight(usize),
    ClearHighlight,
    Redraw,
}

impl RunObserver for UnboundedSender<RunEvent> {
    fn started(&mut self) {
        let _ = self.send(RunEvent::Started);
    }
    fn ended(&mut self) {
        let _ = self.send(RunEvent::Ended);
    }
    fn output(&mut self, line: OutputLine) {
        let _ = self.send(RunEvent::Output(line));
    }
    fn highlight(&mut self, index: usize) {
        let _ = self.send(RunEvent::Highlight(index));
    }
    fn clear_highlight(&mut self) {
        let _ = self.send(RunEvent::ClearHighlight);
    }
    fn redraw(&mut self) {
        let _ = self.send(RunEvent::Redraw);
    }
}

/// Records every event in order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<RunEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All output lines, in order.
    pub fn output(&self) -> Vec<&OutputLine> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Output(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    /// Output text only, in order.
    pub fn output_text(&self) -> Vec<&str> {
        self.output().into_iter().map(|l| l.text.as_str()).collect()
    }

    pub fn count(&self, event: &RunEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

impl RunObserver for EventLog {
    fn started(&mut self) {
        self.events.push(RunEvent::Started);
    }
    fn ended(&mut self) {
        self.events.push(RunEvent::Ended);
    }
    fn output(&mut self, line: OutputLine) {
        self.events.push(RunEvent::Output(line));
    }
    fn highlight(&mut self, index: usize) {
        self.events.push(RunEvent::Highlight(index));
    }
    fn clear_highlight(&mut self) {
        self.events.push(RunEvent::ClearHighlight);
    }
    fn redraw(&mut self) {
        self.events.push(RunEvent::Redraw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_log_filters_output() {
        let mut log = EventLog::new();
        log.started();
        RunObserver::output(&mut log, OutputLine::normal("hi"));
        log.redraw();
        RunObserver::output(&mut log, OutputLine::error("oops"));
        log.ended();
        assert_eq!(log.output_text(), vec!["hi", "oops"]);
        assert_eq!(log.output()[1].kind, OutputKind::Error);
        assert_eq!(log.count(&RunEvent::Started), 1);
    }

    #[test]
    fn channel_observer_forwards_events() {
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.started();
        tx.highlight(2);
        tx.output(OutputLine::info("done"));
        assert_eq!(rx.try_recv().unwrap(), RunEvent::Started);
        assert_eq!(rx.try_recv().unwrap(), RunEvent::Highlight(2));
        assert!(rx.try_recv().unwrap().is_output());
    }
}
