#![forbid(unsafe_code)]

//! Operator control surface.
//!
//! Each [`Command`] maps to exactly one parameter change, applied as a single
//! whole-record update on [`AnimationState`]. Out-of-range adjustments are
//! clamped silently; no command produces an error.
//!
//! Gamma is the only parameter the display needs to hear about: every gamma
//! command is forwarded to [`Display::set_gamma`](crate::display::Display)
//! after the state lock has been released.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use plasma_core::{Palette, PaletteSet};
use tracing::{debug, info, warn};

use crate::display::{self, SharedDisplay};
use crate::state::{AnimationParams, AnimationState, GAMMA_STEP, TIME_STEP_STEP};

/// How long [`ControlSurface::run`] waits for input before re-checking the
/// running flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A discrete operator request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Quit,
    PalettePrev,
    PaletteNext,
    GammaDecrease,
    GammaIncrease,
    TimeStepDecrease,
    TimeStepIncrease,
}

impl Command {
    pub const ALL: [Self; 7] = [
        Self::Quit,
        Self::PalettePrev,
        Self::PaletteNext,
        Self::GammaDecrease,
        Self::GammaIncrease,
        Self::TimeStepDecrease,
        Self::TimeStepIncrease,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::PalettePrev => "palette-prev",
            Self::PaletteNext => "palette-next",
            Self::GammaDecrease => "gamma-decrease",
            Self::GammaIncrease => "gamma-increase",
            Self::TimeStepDecrease => "timestep-decrease",
            Self::TimeStepIncrease => "timestep-increase",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command: {0:?}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// Outcome of [`ControlSurface::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A parameter moved.
    Changed,
    /// The parameter was already at its limit.
    Unchanged,
    /// The running flag was cleared.
    Quit,
}

// ---------------------------------------------------------------------------
// Input & status seams
// ---------------------------------------------------------------------------

/// Where operator commands come from.
pub trait CommandSource {
    /// Wait up to `timeout` for the next command.
    ///
    /// `Ok(None)` means nothing arrived in time. A source that has closed
    /// yields [`Command::Quit`].
    fn next_command(&mut self, timeout: Duration) -> io::Result<Option<Command>>;
}

/// A fixed list of commands, followed by `Quit`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCommands {
    queue: VecDeque<Command>,
}

impl ScriptedCommands {
    pub fn new(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            queue: commands.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl CommandSource for ScriptedCommands {
    fn next_command(&mut self, _timeout: Duration) -> io::Result<Option<Command>> {
        Ok(Some(self.queue.pop_front().unwrap_or(Command::Quit)))
    }
}

impl CommandSource for mpsc::Receiver<Command> {
    fn next_command(&mut self, timeout: Duration) -> io::Result<Option<Command>> {
        match self.recv_timeout(timeout) {
            Ok(command) => Ok(Some(command)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Ok(Some(Command::Quit)),
        }
    }
}

/// What the operator sees after every change.
#[derive(Debug, Clone, Copy)]
pub struct Status<'a> {
    pub params: AnimationParams,
    pub palette: &'a Palette,
    pub palette_count: usize,
}

/// Receives a [`Status`] at startup and after every effective command.
pub trait StatusObserver {
    fn status(&mut self, status: &Status<'_>) -> io::Result<()>;
}

impl<F> StatusObserver for F
where
    F: FnMut(&Status<'_>) -> io::Result<()>,
{
    fn status(&mut self, status: &Status<'_>) -> io::Result<()> {
        self(status)
    }
}

// ---------------------------------------------------------------------------
// Control surface
// ---------------------------------------------------------------------------

/// Applies operator commands to the shared animation state.
pub struct ControlSurface {
    state: Arc<AnimationState>,
    palettes: Arc<PaletteSet>,
    display: SharedDisplay,
    poll_interval: Duration,
}

impl fmt::Debug for ControlSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlSurface")
            .field("params", &self.state.snapshot())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl ControlSurface {
    #[must_use]
    pub fn new(
        state: Arc<AnimationState>,
        palettes: Arc<PaletteSet>,
        display: SharedDisplay,
    ) -> Self {
        Self {
            state,
            palettes,
            display,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Current parameters with the active palette resolved.
    ///
    /// Returns `None` only if the palette set is empty.
    #[must_use]
    pub fn status(&self) -> Option<Status<'_>> {
        let params = self.state.snapshot();
        self.palettes.get(params.palette_index).map(|palette| Status {
            params,
            palette,
            palette_count: self.palettes.len(),
        })
    }

    /// Apply one command.
    pub fn apply(&self, command: Command) -> Applied {
        let step = |f: fn(&mut AnimationParams)| {
            let mut before = None;
            let after = self.state.update(|p| {
                before = Some(*p);
                f(p);
            });
            (before.unwrap_or(after), after)
        };

        let (before, after) = match command {
            Command::Quit => {
                self.state.request_stop();
                info!("quit requested");
                return Applied::Quit;
            }
            Command::PalettePrev => step(|p| p.palette_index = p.palette_index.saturating_sub(1)),
            Command::PaletteNext => step(|p| p.palette_index = p.palette_index.saturating_add(1)),
            Command::GammaDecrease => step(|p| p.gamma -= GAMMA_STEP),
            Command::GammaIncrease => step(|p| p.gamma += GAMMA_STEP),
            Command::TimeStepDecrease => step(|p| p.time_step -= TIME_STEP_STEP),
            Command::TimeStepIncrease => step(|p| p.time_step += TIME_STEP_STEP),
        };

        if matches!(command, Command::GammaDecrease | Command::GammaIncrease) {
            self.forward_gamma(after.gamma);
        }

        debug!(
            command = command.as_str(),
            palette = after.palette_index,
            gamma = after.gamma,
            time_step = after.time_step,
            "parameters updated"
        );
        if before == after {
            Applied::Unchanged
        } else {
            Applied::Changed
        }
    }

    fn forward_gamma(&self, gamma: f64) {
        let mut device = display::lock(&self.display);
        if let Err(err) = device.set_gamma(gamma) {
            let name = device.name();
            warn!(error = %err, display = name, "gamma change not applied");
        }
    }

    /// Process commands until quit, an external stop, or a closed source.
    ///
    /// The observer sees the initial status and the status after every
    /// command that changed something.
    pub fn run<S, O>(&self, source: &mut S, observer: &mut O) -> io::Result<()>
    where
        S: CommandSource + ?Sized,
        O: StatusObserver + ?Sized,
    {
        self.notify(observer)?;
        while self.state.is_running() {
            let Some(command) = source.next_command(self.poll_interval)? else {
                continue;
            };
            match self.apply(command) {
                Applied::Quit => break,
                Applied::Changed => self.notify(observer)?,
                Applied::Unchanged => {}
            }
        }
        Ok(())
    }

    fn notify<O>(&self, observer: &mut O) -> io::Result<()>
    where
        O: StatusObserver + ?Sized,
    {
        match self.status() {
            Some(status) => observer.status(&status),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{RecordingDisplay, RecordingLog, shared};
    use crate::state::{MIN_GAMMA, MIN_TIME_STEP};
    use std::thread;

    fn surface(palettes: &str) -> (ControlSurface, Arc<AnimationState>, RecordingLog) {
        let set = Arc::new(PaletteSet::parse(palettes, false).expect("valid palettes"));
        let state = Arc::new(AnimationState::new(AnimationParams::default(), set.len()));
        let rec = RecordingDisplay::new(2, 2);
        let log = rec.log();
        let control = ControlSurface::new(Arc::clone(&state), set, shared(rec))
            .with_poll_interval(Duration::from_millis(5));
        (control, state, log)
    }

    const THREE: &str = "A = 0x0, 0xffffff\nB = 0x0, 0xff0000\nC = 0x0, 0x00ff00";

    #[test]
    fn command_names_round_trip() {
        for c in Command::ALL {
            assert_eq!(c.as_str().parse::<Command>(), Ok(c));
        }
        assert_eq!(
            "faster".parse::<Command>(),
            Err(UnknownCommand("faster".into()))
        );
    }

    #[test]
    fn rejected_gamma_forward_still_updates_state() {
        let set = Arc::new(PaletteSet::parse(THREE, false).expect("valid palettes"));
        let state = Arc::new(AnimationState::new(AnimationParams::default(), set.len()));
        let rec = RecordingDisplay::new(2, 2);
        let log = rec.log();
        let device = shared(rec);
        display::lock(&device).release().expect("release");
        let control = ControlSurface::new(Arc::clone(&state), set, device);

        assert_eq!(control.apply(Command::GammaIncrease), Applied::Changed);
        assert_eq!(state.snapshot().gamma, 1.1);
        assert_eq!(log.gammas(), vec![1.1]);
    }

    #[test]
    fn gamma_steps_and_floors() {
        let (control, state, log) = surface(THREE);
        assert_eq!(control.apply(Command::GammaIncrease), Applied::Changed);
        assert_eq!(state.snapshot().gamma, 1.1);
        assert_eq!(control.apply(Command::GammaDecrease), Applied::Changed);
        assert_eq!(control.apply(Command::GammaDecrease), Applied::Unchanged);
        assert_eq!(state.snapshot().gamma, MIN_GAMMA);
        // Every gamma command reaches the display, clamped or not.
        assert_eq!(log.gammas(), vec![1.1, 1.0, 1.0]);
    }

    #[test]
    fn time_step_never_reaches_zero() {
        let (control, state, log) = surface(THREE);
        for _ in 0..10 {
            control.apply(Command::TimeStepDecrease);
        }
        assert_eq!(state.snapshot().time_step, MIN_TIME_STEP);
        control.apply(Command::TimeStepIncrease);
        assert_eq!(state.snapshot().time_step, 0.02);
        assert!(log.gammas().is_empty());
    }

    #[test]
    fn palette_selection_clamps_without_wrapping() {
        let (control, state, _log) = surface(THREE);
        assert_eq!(control.apply(Command::PalettePrev), Applied::Unchanged);
        assert_eq!(state.snapshot().palette_index, 0);
        control.apply(Command::PaletteNext);
        control.apply(Command::PaletteNext);
        assert_eq!(control.apply(Command::PaletteNext), Applied::Unchanged);
        assert_eq!(state.snapshot().palette_index, 2);
        assert_eq!(control.status().map(|s| s.palette.name()), Some("C"));
    }

    #[test]
    fn quit_clears_running() {
        let (control, state, _log) = surface(THREE);
        assert_eq!(control.apply(Command::Quit), Applied::Quit);
        assert!(!state.is_running());
    }

    #[test]
    fn run_reports_initial_and_changed_status() {
        let (control, state, _log) = surface(THREE);
        let mut source = ScriptedCommands::new([
            Command::PaletteNext,
            Command::PalettePrev,
            Command::PalettePrev,
            Command::GammaIncrease,
        ]);
        let mut seen = Vec::new();
        let mut observer = |s: &Status<'_>| {
            seen.push((s.palette.name().to_string(), s.params.gamma));
            Ok(())
        };
        control.run(&mut source, &mut observer).expect("run");
        assert_eq!(
            seen,
            [
                ("A".to_string(), 1.0),
                ("B".to_string(), 1.0),
                ("A".to_string(), 1.0),
                ("A".to_string(), 1.1),
            ]
        );
        assert_eq!(source.remaining(), 0);
        assert!(!state.is_running());
    }

    #[test]
    fn run_returns_after_external_stop() {
        let (control, state, _log) = surface(THREE);
        let (_tx, mut rx) = mpsc::channel::<Command>();
        let stopper = Arc::clone(&state);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            stopper.request_stop();
        });
        let mut observer = |_: &Status<'_>| Ok(());
        control.run(&mut rx, &mut observer).expect("run");
        handle.join().expect("stopper");
        assert!(!state.is_running());
    }

    #[test]
    fn closed_channel_means_quit() {
        let (control, state, _log) = surface(THREE);
        let (tx, mut rx) = mpsc::channel();
        tx.send(Command::GammaIncrease).expect("send");
        drop(tx);
        let mut observer = |_: &Status<'_>| Ok(());
        control.run(&mut rx, &mut observer).expect("run");
        assert!(!state.is_running());
        assert_eq!(state.snapshot().gamma, 1.1);
    }

    #[test]
    fn observer_errors_are_returned() {
        let (control, _state, _log) = surface(THREE);
        let mut source = ScriptedCommands::default();
        let mut observer =
            |_: &Status<'_>| Err(io::Error::new(io::ErrorKind::Other, "screen gone"));
        let err = control.run(&mut source, &mut observer).unwrap_err();
        assert_eq!(err.to_string(), "screen gone");
    }
}
