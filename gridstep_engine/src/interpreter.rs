//! Statement interpreter and execution scheduler.
//!
//! A [`Session`] owns the shared world, the variable store and the run control. Calling
//! [`Session::run`] parses a program and executes it one statement per tick, pausing
//! between statements and between the single-cell steps of a movement so the front end
//! can animate each change. Only one run may be in flight per session; a second call
//! while one is running returns immediately.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use gridstep_data::{Grid, Tile};
use log::{debug, info, warn};
use variantly::Variantly;

use crate::control::{ControlError, ExecutionState, Interrupt, RunControl, RunTicket};
use crate::observer::{OutputLine, RunObserver};
use crate::statement::{Direction, PrintArg, Program, ProgramLine, Statement, StatementError};
use crate::variables::VariableStore;
use crate::world::{AgentState, GridWorld};

/// World handle shared with renderers. Writers never hold the lock across a pause.
pub type SharedWorld = Arc<RwLock<GridWorld>>;

/// What killed the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    OutOfBounds,
    Wall,
    Water,
}

impl DeathCause {
    pub fn message(self) -> &'static str {
        match self {
            DeathCause::OutOfBounds => "Out of bounds!",
            DeathCause::Wall => "Hit a wall!",
            DeathCause::Water => "Fell in water!",
        }
    }
}

/// How a call to [`Session::run`] ended.
#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum RunOutcome {
    /// The source had no non-blank lines; nothing ran.
    Empty,
    /// Another run was in flight; this call did nothing.
    AlreadyRunning,
    /// Every statement executed.
    Completed,
    /// The agent reached the goal.
    Victory,
    Died(DeathCause),
    /// A movement was attempted with an agent that was already dead.
    AgentDead,
    /// Stopped on operator request.
    Stopped,
    /// A statement failed.
    Failed(StatementError),
    /// A reset took over the session mid-run.
    Superseded,
}

impl From<Interrupt> for RunOutcome {
    fn from(interrupt: Interrupt) -> Self {
        match interrupt {
            Interrupt::Stopped => RunOutcome::Stopped,
            Interrupt::Superseded => RunOutcome::Superseded,
        }
    }
}

/// Result of dispatching one statement.
enum Flow {
    Next,
    Finish(RunOutcome),
}

/// Interpreter state for one map and one agent.
#[derive(Debug, Clone)]
pub struct Session {
    world: SharedWorld,
    variables: Arc<Mutex<VariableStore>>,
    control: RunControl,
}

impl Session {
    pub fn new(grid: Grid) -> Self {
        Self::with_control(grid, RunControl::default())
    }

    pub fn with_control(grid: Grid, control: RunControl) -> Self {
        Self {
            world: Arc::new(RwLock::new(GridWorld::new(grid))),
            variables: Arc::new(Mutex::new(VariableStore::new())),
            control,
        }
    }

    /// Shared handle to the world, for renderers.
    pub fn world(&self) -> SharedWorld {
        Arc::clone(&self.world)
    }

    pub fn read_world(&self) -> RwLockReadGuard<'_, GridWorld> {
        self.world.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_world(&self) -> RwLockWriteGuard<'_, GridWorld> {
        self.world.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn vars(&self) -> MutexGuard<'_, VariableStore> {
        self.variables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn agent(&self) -> AgentState {
        self.read_world().agent()
    }

    pub fn grid(&self) -> Grid {
        self.read_world().grid().clone()
    }

    /// Snapshot of the current variable bindings.
    pub fn variables(&self) -> VariableStore {
        self.vars().clone()
    }

    /// Handle for stopping the run or changing its speed from elsewhere.
    pub fn control(&self) -> &RunControl {
        &self.control
    }

    pub fn state(&self) -> ExecutionState {
        self.control.state()
    }

    pub fn request_stop(&self) -> bool {
        self.control.request_stop()
    }

    /// # Errors
    /// - `ControlError::InvalidSpeed` unless `seconds` is finite and positive
    pub fn set_game_speed(&self, seconds: f64) -> Result<(), ControlError> {
        self.control.set_game_speed(seconds)
    }

    /// Replace the active map. The agent, variables and run state are left alone.
    pub fn load_map(&self, grid: Grid, observer: &mut dyn RunObserver) {
        self.write_world().load_map(grid);
        observer.redraw();
    }

    /// Put the agent back on the origin alive, clear variables and stop flag, and force the
    /// session idle. The map is kept. A run still in flight is superseded.
    pub fn reset_position(&self, observer: &mut dyn RunObserver) {
        self.control.force_idle();
        self.vars().clear();
        self.write_world().reset_agent();
        info!("position reset");
        observer.clear_highlight();
        observer.redraw();
    }

    /// Position reset plus a new map.
    pub fn full_reset(&self, grid: Grid, observer: &mut dyn RunObserver) {
        self.control.force_idle();
        self.vars().clear();
        {
            let mut world = self.write_world();
            world.reset_agent();
            world.load_map(grid);
        }
        info!("full reset");
        observer.clear_highlight();
        observer.redraw();
    }

    /// Parse `source` and execute it, one statement per tick.
    ///
    /// Returns at once with [`RunOutcome::AlreadyRunning`] if another run holds the session,
    /// and with [`RunOutcome::Empty`] if there is nothing to execute; neither emits any
    /// notification. Otherwise `started` fires first and `ended` last, unless a reset
    /// supersedes the run, in which case it ends silently.
    pub async fn run(&self, source: &str, observer: &mut dyn RunObserver) -> RunOutcome {
        let program = Program::parse(source);
        self.run_program(&program, observer).await
    }

    /// Execute an already parsed program. See [`Session::run`].
    pub async fn run_program(&self, program: &Program, observer: &mut dyn RunObserver) -> RunOutcome {
        if program.is_empty() {
            return RunOutcome::Empty;
        }
        let Some(ticket) = self.control.try_begin() else {
            info!("run ignored: a program is already running");
            return RunOutcome::AlreadyRunning;
        };
        self.vars().clear();
        info!("run started ({} statements)", program.len());
        observer.started();

        let outcome = self.execute(program, ticket, observer).await;

        if outcome == RunOutcome::Superseded {
            info!("run superseded by reset");
        } else {
            observer.clear_highlight();
            self.control.finish(ticket);
            info!("run ended: {outcome:?}");
            observer.ended();
        }
        outcome
    }

    async fn execute(&self, program: &Program, ticket: RunTicket, observer: &mut dyn RunObserver) -> RunOutcome {
        let mut index = 0;
        loop {
            if let Some(interrupt) = self.control.interrupt(ticket) {
                return interrupt.into();
            }
            let Some(line) = program.get(index) else {
                return RunOutcome::Completed;
            };
            observer.highlight(index);
            debug!("line {index} (source line {}): {}", line.source_line, line.text);

            if let Flow::Finish(outcome) = self.dispatch(line, ticket, observer).await {
                return outcome;
            }
            index += 1;
            self.control.pause(ticket).await;
        }
    }

    async fn dispatch(&self, line: &ProgramLine, ticket: RunTicket, observer: &mut dyn RunObserver) -> Flow {
        let statement = match &line.statement {
            Ok(statement) => statement,
            Err(err) => return fail(err.clone(), observer),
        };
        match statement {
            Statement::Assign { name, value } => {
                let assigned = self.vars().assign(name, value);
                match assigned {
                    Ok(v) => debug!("{name} = {v}"),
                    Err(err) => return fail(err, observer),
                }
            },
            Statement::Print(arg) => {
                let text = match arg {
                    PrintArg::Text(text) => text.clone(),
                    PrintArg::Identifier(name) => self
                        .vars()
                        .get(name)
                        .map_or_else(|| name.clone(), |value| value.to_string()),
                };
                observer.output(OutputLine::normal(text));
            },
            Statement::Move { direction, argument } => {
                let steps = self.vars().resolve_steps(argument.as_deref());
                return self.walk(*direction, steps, ticket, observer).await;
            },
            Statement::Noop => debug!("skipping unrecognized line: {}", line.text),
        }
        Flow::Next
    }

    /// Move the agent `steps` cells, one per tick, stopping at the first terminal cell.
    async fn walk(&self, direction: Direction, steps: u64, ticket: RunTicket, observer: &mut dyn RunObserver) -> Flow {
        let (dx, dy) = direction.delta();
        for _ in 0..steps {
            let terminal = {
                let mut world = self.write_world();
                // checked under the world lock so a concurrent reset always wins
                if let Some(interrupt) = self.control.interrupt(ticket) {
                    return Flow::Finish(interrupt.into());
                }
                if world.is_dead() {
                    debug!("movement skipped: agent is dead");
                    return Flow::Finish(RunOutcome::AgentDead);
                }
                step_once(&mut world, dx, dy)
            };
            observer.redraw();
            match terminal {
                Some(RunOutcome::Died(cause)) => {
                    observer.output(OutputLine::error(format!("Status: {} Character died.", cause.message())));
                    return Flow::Finish(RunOutcome::Died(cause));
                },
                Some(outcome) => {
                    observer.output(OutputLine::info("Status: Reached the goal! Victory!"));
                    return Flow::Finish(outcome);
                },
                None => {},
            }
            self.control.pause(ticket).await;
        }
        if let Some(interrupt) = self.control.interrupt(ticket) {
            return Flow::Finish(interrupt.into());
        }
        if steps > 1 {
            observer.output(OutputLine::info(format!("Completed {steps} step movement.")));
        }
        Flow::Next
    }
}

/// Try a single-cell move. Returns the terminal outcome if the move ended the run.
fn step_once(world: &mut GridWorld, dx: i32, dy: i32) -> Option<RunOutcome> {
    let candidate = world.position().offset(dx, dy);
    if GridWorld::is_out_of_bounds(candidate) {
        world.set_dead(true);
        info!("agent left the map at {candidate}");
        return Some(RunOutcome::Died(DeathCause::OutOfBounds));
    }
    if world.is_collision(candidate) {
        let cause = if world.tile_at(candidate) == Some(Tile::Wall) {
            DeathCause::Wall
        } else {
            DeathCause::Water
        };
        world.set_dead(true);
        info!("agent died at {candidate}: {cause:?}");
        return Some(RunOutcome::Died(cause));
    }
    world.set_position(candidate);
    if world.is_goal(candidate) {
        info!("agent reached the goal at {candidate}");
        return Some(RunOutcome::Victory);
    }
    None
}

fn fail(err: StatementError, observer: &mut dyn RunObserver) -> Flow {
    warn!("statement failed: {err}");
    observer.output(OutputLine::error(format!("Error: {err}")));
    Flow::Finish(RunOutcome::Failed(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{EventLog, OutputKind, RunEvent};
    use gridstep_data::Position;
    use std::time::Duration;

    fn grid_with(tiles: &[(i32, i32, Tile)]) -> Grid {
        let mut grid = Grid::default();
        for &(x, y, tile) in tiles {
            grid.set(Position::new(x, y), tile);
        }
        grid
    }

    fn session(tiles: &[(i32, i32, Tile)]) -> Session {
        Session::new(grid_with(tiles))
    }

    #[tokio::test(start_paused = true)]
    async fn variable_drives_movement() {
        let session = session(&[(11, 11, Tile::Goal)]);
        let mut log = EventLog::new();
        let outcome = session.run("x = 5\nmove_right(x)", &mut log).await;
        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(session.agent().position, Position::new(5, 0));
        assert_eq!(log.output_text(), vec!["Completed 5 step movement."]);
        assert_eq!(log.count(&RunEvent::Redraw), 5);
        assert_eq!(session.variables().get("x"), Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn wall_stops_a_multi_step_move() {
        let session = session(&[(2, 0, Tile::Wall), (9, 9, Tile::Goal)]);
        let mut log = EventLog::new();
        let outcome = session.run("move_right(3)", &mut log).await;
        assert_eq!(outcome, RunOutcome::Died(DeathCause::Wall));
        let agent = session.agent();
        assert_eq!(agent.position, Position::new(1, 0));
        assert!(agent.dead);
        let out = log.output();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, OutputKind::Error);
        assert!(out[0].text.contains("Hit a wall!"));
    }

    #[tokio::test(start_paused = true)]
    async fn water_and_edge_deaths_are_distinguished() {
        let session = session(&[(0, 1, Tile::Water), (9, 9, Tile::Goal)]);
        let mut log = EventLog::new();
        assert_eq!(
            session.run("move_down()", &mut log).await,
            RunOutcome::Died(DeathCause::Water)
        );
        assert_eq!(log.output_text(), vec!["Status: Fell in water! Character died."]);

        session.reset_position(&mut log);
        let mut log = EventLog::new();
        assert_eq!(
            session.run("move_left(1)", &mut log).await,
            RunOutcome::Died(DeathCause::OutOfBounds)
        );
        assert_eq!(log.output_text(), vec!["Status: Out of bounds! Character died."]);
        assert_eq!(session.agent().position, Position::ORIGIN);
    }

    #[tokio::test(start_paused = true)]
    async fn goal_cancels_remaining_steps_and_statements() {
        let session = session(&[(0, 2, Tile::Goal)]);
        let mut log = EventLog::new();
        let outcome = session.run("move_down(5)\nprint('unreached')", &mut log).await;
        assert_eq!(outcome, RunOutcome::Victory);
        assert_eq!(session.agent().position, Position::new(0, 2));
        assert!(!session.agent().dead);
        let out = log.output();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, OutputKind::Info);
        assert_eq!(out[0].text, "Status: Reached the goal! Victory!");
    }

    #[tokio::test(start_paused = true)]
    async fn print_literal_variable_and_fallback() {
        let session = session(&[(9, 9, Tile::Goal)]);
        let mut log = EventLog::new();
        session.run("print('Hello')\nn = 3\nprint(n)\nprint(x)", &mut log).await;
        assert_eq!(log.output_text(), vec!["Hello", "3", "x"]);
        assert!(log.output().iter().all(|l| l.kind == OutputKind::Normal));
    }

    #[tokio::test(start_paused = true)]
    async fn statement_error_ends_the_run() {
        let session = session(&[(9, 9, Tile::Goal)]);
        let mut log = EventLog::new();
        let outcome = session.run("move_right()\ny = missing\nmove_right()", &mut log).await;
        assert_eq!(
            outcome,
            RunOutcome::Failed(StatementError::InvalidAssignment { name: "y".into() })
        );
        assert_eq!(log.output_text(), vec!["Error: Invalid value for y"]);
        // the first move stays committed
        assert_eq!(session.agent().position, Position::new(1, 0));
        assert!(session.control().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn unrecognized_lines_are_skipped() {
        let session = session(&[(9, 9, Tile::Goal)]);
        let mut log = EventLog::new();
        let outcome = session.run("jump(3)\nif x == 1\nmove_down(2)", &mut log).await;
        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(session.agent().position, Position::new(0, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_and_highlight_events_bracket_the_run() {
        let session = session(&[(9, 9, Tile::Goal)]);
        let mut log = EventLog::new();
        session.run("\nprint('a')\n\nprint('b')\n", &mut log).await;
        assert_eq!(
            log.events,
            vec![
                RunEvent::Started,
                RunEvent::Highlight(0),
                RunEvent::Output(OutputLine::normal("a")),
                RunEvent::Highlight(1),
                RunEvent::Output(OutputLine::normal("b")),
                RunEvent::ClearHighlight,
                RunEvent::Ended,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_program_emits_nothing() {
        let session = session(&[(9, 9, Tile::Goal)]);
        let mut log = EventLog::new();
        assert_eq!(session.run("\n   \n", &mut log).await, RunOutcome::Empty);
        assert!(log.events.is_empty());
        assert!(session.control().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn each_statement_takes_one_tick() {
        let session = session(&[(9, 9, Tile::Goal)]);
        session.set_game_speed(1.0).unwrap();
        let start = tokio::time::Instant::now();
        session.run("print('a')\nprint('b')\nprint('c')", &mut EventLog::new()).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn dead_agent_cannot_move() {
        let session = session(&[(9, 9, Tile::Goal)]);
        session.run("move_up()", &mut EventLog::new()).await;
        assert!(session.agent().dead);
        let mut log = EventLog::new();
        assert_eq!(session.run("move_right(2)", &mut log).await, RunOutcome::AgentDead);
        assert!(log.output().is_empty());
        assert_eq!(session.agent().position, Position::ORIGIN);
    }

    #[tokio::test(start_paused = true)]
    async fn variables_start_empty_each_run() {
        let session = session(&[(9, 9, Tile::Goal)]);
        session.run("a = 1", &mut EventLog::new()).await;
        let mut log = EventLog::new();
        session.run("b = a", &mut log).await;
        assert_eq!(log.output_text(), vec!["Error: Invalid value for b"]);
    }

    #[test]
    fn position_reset_is_idempotent() {
        let session = session(&[(9, 9, Tile::Goal)]);
        {
            let mut world = session.write_world();
            world.set_position(Position::new(3, 4));
            world.set_dead(true);
        }
        let mut log = EventLog::new();
        session.reset_position(&mut log);
        let once = (session.agent(), session.variables(), session.grid());
        session.reset_position(&mut log);
        let twice = (session.agent(), session.variables(), session.grid());
        assert_eq!(once, twice);
        assert_eq!(once.0, AgentState::at_origin());
        assert!(once.1.is_empty());
        assert_eq!(session.state(), ExecutionState::Idle);
    }

    #[test]
    fn full_reset_swaps_the_map() {
        let session = session(&[(9, 9, Tile::Goal)]);
        session.write_world().set_position(Position::new(2, 2));
        let next = grid_with(&[(4, 4, Tile::Goal), (1, 1, Tile::Wall)]);
        session.full_reset(next.clone(), &mut EventLog::new());
        assert_eq!(session.grid(), next);
        assert_eq!(session.agent(), AgentState::at_origin());
    }

    #[test]
    fn load_map_keeps_agent_and_redraws() {
        let session = session(&[(9, 9, Tile::Goal)]);
        session.write_world().set_position(Position::new(2, 2));
        let mut log = EventLog::new();
        session.load_map(grid_with(&[(5, 5, Tile::Goal)]), &mut log);
        assert_eq!(session.agent().position, Position::new(2, 2));
        assert_eq!(log.events, vec![RunEvent::Redraw]);
    }
}
