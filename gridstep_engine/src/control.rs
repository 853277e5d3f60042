//! Run control: execution state, stop requests and pacing.
//!
//! A [`RunControl`] is a cheap cloneable handle. The interpreter holds one for the run it
//! is executing; front ends keep clones to stop the run or change its speed from other
//! tasks while it is suspended between ticks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info};
use thiserror::Error;
use tokio::sync::Notify;

/// Seconds per tick when nothing else is configured.
pub const DEFAULT_GAME_SPEED: f64 = 0.5;

/// Lifecycle of the (single) run a session may have in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExecutionState {
    #[default]
    Idle,
    Running,
    /// A stop was requested and the run has not yet noticed.
    Stopping,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("game speed must be a positive number of seconds, got {0}")]
    InvalidSpeed(f64),
}

/// Why a run has to stop at a suspension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupt {
    /// Operator asked for a stop.
    Stopped,
    /// A reset took the session away from this run.
    Superseded,
}

/// Proof that the holder started the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunTicket {
    epoch: u64,
}

#[derive(Debug, Default)]
struct RunState {
    execution: ExecutionState,
    stop_requested: bool,
    /// Bumped by every forced reset; a run whose ticket is older has been superseded.
    epoch: u64,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<RunState>,
    speed_bits: AtomicU64,
    wake: Notify,
}

#[derive(Debug, Clone)]
pub struct RunControl {
    shared: Arc<Shared>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new(DEFAULT_GAME_SPEED)
    }
}

impl RunControl {
    /// New idle control. An unusable `game_speed` falls back to [`DEFAULT_GAME_SPEED`].
    pub fn new(game_speed: f64) -> Self {
        let speed = if valid_speed(game_speed) {
            game_speed
        } else {
            DEFAULT_GAME_SPEED
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(RunState::default()),
                speed_bits: AtomicU64::new(speed.to_bits()),
                wake: Notify::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ExecutionState {
        self.lock().execution
    }

    pub fn is_idle(&self) -> bool {
        self.state() == ExecutionState::Idle
    }

    /// Seconds per tick.
    pub fn game_speed(&self) -> f64 {
        f64::from_bits(self.shared.speed_bits.load(Ordering::Relaxed))
    }

    /// Change the pacing. Takes effect at the next tick; a wait already in progress keeps its length.
    ///
    /// # Errors
    /// - `ControlError::InvalidSpeed` unless `seconds` is finite and positive
    pub fn set_game_speed(&self, seconds: f64) -> Result<(), ControlError> {
        if !valid_speed(seconds) {
            return Err(ControlError::InvalidSpeed(seconds));
        }
        self.shared.speed_bits.store(seconds.to_bits(), Ordering::Relaxed);
        info!("game speed set to {seconds}s per tick");
        Ok(())
    }

    /// Length of one tick at the current speed.
    pub fn tick(&self) -> Duration {
        Duration::try_from_secs_f64(self.game_speed()).unwrap_or(Duration::from_millis(500))
    }

    /// Ask the running program to stop at its next suspension point.
    /// Returns false if nothing was running.
    pub fn request_stop(&self) -> bool {
        let mut state = self.lock();
        if state.execution != ExecutionState::Running {
            return false;
        }
        state.execution = ExecutionState::Stopping;
        state.stop_requested = true;
        drop(state);
        info!("stop requested");
        self.shared.wake.notify_waiters();
        true
    }

    /// Claim the control for a new run. `None` if a run is already in flight.
    pub(crate) fn try_begin(&self) -> Option<RunTicket> {
        let mut state = self.lock();
        if state.execution != ExecutionState::Idle {
            debug!("run rejected: state is {:?}", state.execution);
            return None;
        }
        state.execution = ExecutionState::Running;
        state.stop_requested = false;
        Some(RunTicket { epoch: state.epoch })
    }

    /// Whether the run holding `ticket` must stop now.
    pub(crate) fn interrupt(&self, ticket: RunTicket) -> Option<Interrupt> {
        let state = self.lock();
        if state.epoch != ticket.epoch {
            Some(Interrupt::Superseded)
        } else if state.stop_requested {
            Some(Interrupt::Stopped)
        } else {
            None
        }
    }

    /// Return to idle at the end of the run holding `ticket`.
    /// Returns false (and changes nothing) if the run was superseded.
    pub(crate) fn finish(&self, ticket: RunTicket) -> bool {
        let mut state = self.lock();
        if state.epoch != ticket.epoch {
            return false;
        }
        state.execution = ExecutionState::Idle;
        state.stop_requested = false;
        true
    }

    /// Force idle and clear the stop flag, superseding any run in flight.
    pub(crate) fn force_idle(&self) {
        let mut state = self.lock();
        if state.execution != ExecutionState::Idle {
            info!("superseding run in state {:?}", state.execution);
        }
        state.epoch = state.epoch.wrapping_add(1);
        state.execution = ExecutionState::Idle;
        state.stop_requested = false;
        drop(state);
        self.shared.wake.notify_waiters();
    }

    /// Wait one tick, returning early if the run is stopped or superseded meanwhile.
    pub(crate) async fn pause(&self, ticket: RunTicket) {
        let delay = self.tick();
        let notified = self.shared.wake.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.interrupt(ticket).is_some() {
            return;
        }
        tokio::select! {
            () = tokio::time::sleep(delay) => {},
            () = notified => {},
        }
    }
}

fn valid_speed(seconds: f64) -> bool {
    seconds.is_finite() && seconds > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_is_exclusive() {
        let control = RunControl::default();
        let ticket = control.try_begin().unwrap();
        assert_eq!(control.state(), ExecutionState::Running);
        assert!(control.try_begin().is_none());
        assert!(control.finish(ticket));
        assert!(control.is_idle());
        assert!(control.try_begin().is_some());
    }

    #[test]
    fn stop_moves_to_stopping_and_interrupts() {
        let control = RunControl::default();
        assert!(!control.request_stop());
        let ticket = control.try_begin().unwrap();
        assert!(control.request_stop());
        assert_eq!(control.state(), ExecutionState::Stopping);
        assert_eq!(control.interrupt(ticket), Some(Interrupt::Stopped));
        assert!(control.finish(ticket));
        assert!(control.is_idle());
        // a fresh run starts with the flag cleared
        let next = control.try_begin().unwrap();
        assert_eq!(control.interrupt(next), None);
    }

    #[test]
    fn force_idle_supersedes_the_running_ticket() {
        let control = RunControl::default();
        let ticket = control.try_begin().unwrap();
        control.force_idle();
        assert!(control.is_idle());
        assert_eq!(control.interrupt(ticket), Some(Interrupt::Superseded));
        let next = control.try_begin().unwrap();
        assert!(!control.finish(ticket));
        assert_eq!(control.state(), ExecutionState::Running);
        assert!(control.finish(next));
    }

    #[test]
    fn speed_validation() {
        let control = RunControl::new(-3.0);
        assert!((control.game_speed() - DEFAULT_GAME_SPEED).abs() < f64::EPSILON);
        assert!(control.set_game_speed(0.0).is_err());
        assert!(control.set_game_speed(f64::NAN).is_err());
        control.set_game_speed(0.25).unwrap();
        assert_eq!(control.tick(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_waits_one_tick() {
        let control = RunControl::new(2.0);
        let ticket = control.try_begin().unwrap();
        let start = tokio::time::Instant::now();
        control.pause(ticket).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cuts_a_pause_short() {
        let control = RunControl::new(10.0);
        let ticket = control.try_begin().unwrap();
        let stopper = control.clone();
        let start = tokio::time::Instant::now();
        tokio::join!(control.pause(ticket), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            stopper.request_stop();
        });
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(control.interrupt(ticket), Some(Interrupt::Stopped));
    }
}
