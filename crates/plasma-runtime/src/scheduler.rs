#![forbid(unsafe_code)]

//! Animation scheduler (`plasma-anim` thread).
//!
//! The scheduler owns the tick loop: snapshot the parameters, render the
//! whole grid, push it to the display under one lock, advance simulated
//! time, then sleep until the next tick boundary.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──spawn──▶ Running ──stop / error / max_frames──▶ Stopping ──▶ Stopped
//! ```
//!
//! The phase is published through a condition-variable cell so the
//! shutdown path can block on `Stopped` instead of polling.
//!
//! # Timing
//!
//! Ticks are anchored to a deadline that advances by `tick_interval`. A tick
//! that overruns makes the next one fire immediately and re-anchors the
//! schedule to the current instant, so a slow display never causes a burst
//! of catch-up frames. The inter-tick sleep wakes as soon as a stop is
//! requested.
//!
//! # Errors
//!
//! A display failure is fatal: the loop clears the shared running flag (so
//! the control loop exits too) and returns a [`SchedulerFailure`] carrying
//! the error and the progress made before it.

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use plasma_core::field::render_into;
use plasma_core::{FieldGeometry, FrameBuffer, PaletteSet};
use tracing::{debug, debug_span, error, info, trace};

use crate::display::{self, DisplayError, SharedDisplay};
use crate::state::AnimationState;

/// Default interval between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(20);

/// Thread name of the animation loop.
pub const THREAD_NAME: &str = "plasma-anim";

// ---------------------------------------------------------------------------
// Configuration & results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Grid placement inside the field.
    pub geometry: FieldGeometry,
    /// Target interval between frames.
    pub tick_interval: Duration,
    /// Stop on its own after this many frames.
    pub max_frames: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            geometry: FieldGeometry::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_frames: None,
        }
    }
}

/// Lifecycle phase of the animation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SchedulerReport {
    /// Frames published to the display.
    pub frames: u64,
    /// Simulated time reached when the loop ended.
    pub simulated_time: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("display failed: {0}")]
    Display(#[from] DisplayError),
    #[error("no palette available at index {index}")]
    MissingPalette { index: usize },
    #[error("failed to spawn the animation thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("animation thread panicked")]
    Panicked,
}

/// A run that ended in an error.
#[derive(Debug, thiserror::Error)]
#[error("animation failed after {frames} frames: {error}", frames = .report.frames)]
pub struct SchedulerFailure {
    /// Progress up to the failing tick.
    pub report: SchedulerReport,
    #[source]
    pub error: SchedulerError,
}

impl SchedulerFailure {
    fn panicked() -> Self {
        Self {
            report: SchedulerReport::default(),
            error: SchedulerError::Panicked,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase cell
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct PhaseCell {
    phase: Mutex<SchedulerPhase>,
    changed: Condvar,
}

impl PhaseCell {
    fn new() -> Self {
        Self {
            phase: Mutex::new(SchedulerPhase::Idle),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self) -> SchedulerPhase {
        *self.lock()
    }

    fn set(&self, phase: SchedulerPhase) {
        *self.lock() = phase;
        self.changed.notify_all();
    }

    fn wait_for(&self, target: SchedulerPhase) {
        let guard = self.lock();
        let _guard = self
            .changed
            .wait_while(guard, |phase| *phase != target)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

/// Publishes `Stopped` when dropped, including on unwind.
struct StoppedOnDrop<'a>(&'a PhaseCell);

impl Drop for StoppedOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(SchedulerPhase::Stopped);
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// The tick loop, before it is started.
pub struct Scheduler {
    config: SchedulerConfig,
    palettes: Arc<PaletteSet>,
    state: Arc<AnimationState>,
    display: SharedDisplay,
    phase: Arc<PhaseCell>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("palettes", &self.palettes.len())
            .field("phase", &self.phase.get())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    #[must_use]
    pub fn new(
        config: SchedulerConfig,
        palettes: Arc<PaletteSet>,
        state: Arc<AnimationState>,
        display: SharedDisplay,
    ) -> Self {
        Self {
            config,
            palettes,
            state,
            display,
            phase: Arc::new(PhaseCell::new()),
        }
    }

    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        self.phase.get()
    }

    /// Start the loop on its own thread.
    pub fn spawn(self) -> Result<SchedulerHandle, SchedulerError> {
        let phase = Arc::clone(&self.phase);
        phase.set(SchedulerPhase::Running);
        let spawned = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || self.run());
        match spawned {
            Ok(handle) => Ok(SchedulerHandle {
                phase,
                handle: Some(handle),
            }),
            Err(err) => {
                phase.set(SchedulerPhase::Stopped);
                Err(SchedulerError::Spawn(err))
            }
        }
    }

    /// Run the loop on the calling thread until it stops.
    pub fn run(self) -> Result<SchedulerReport, SchedulerFailure> {
        let _stopped = StoppedOnDrop(&self.phase);
        self.phase.set(SchedulerPhase::Running);

        let geometry = self.config.geometry;
        info!(
            width = geometry.width,
            height = geometry.height,
            tick_ms = self.config.tick_interval.as_millis() as u64,
            "animation started"
        );

        let mut frame = FrameBuffer::new(geometry.width, geometry.height);
        let mut report = SchedulerReport::default();
        let outcome = self.tick_loop(&mut frame, &mut report);

        self.phase.set(SchedulerPhase::Stopping);
        match &outcome {
            Ok(()) => info!(
                frames = report.frames,
                simulated_time = report.simulated_time,
                "animation stopped"
            ),
            Err(err) => error!(error = %err, frames = report.frames, "animation failed"),
        }
        outcome
            .map(|()| report)
            .map_err(|error| SchedulerFailure { report, error })
    }

    fn tick_loop(
        &self,
        frame: &mut FrameBuffer,
        report: &mut SchedulerReport,
    ) -> Result<(), SchedulerError> {
        let interval = self.config.tick_interval;
        let mut deadline = Instant::now();

        while self.state.is_running() {
            let params = self.state.snapshot();
            let palette = self
                .palettes
                .get(params.palette_index)
                .ok_or(SchedulerError::MissingPalette {
                    index: params.palette_index,
                });
            let palette = match palette {
                Ok(p) => p,
                Err(err) => {
                    self.state.request_stop();
                    return Err(err);
                }
            };

            {
                let _span = debug_span!("tick", frame = report.frames).entered();
                render_into(&self.config.geometry, palette, report.simulated_time, frame);
                let shown = display::present(&mut *display::lock(&self.display), frame);
                if let Err(err) = shown {
                    self.state.request_stop();
                    return Err(err.into());
                }
                trace!(
                    t = report.simulated_time,
                    palette = palette.name(),
                    "frame shown"
                );
            }

            report.simulated_time += params.time_step;
            report.frames += 1;

            if self.config.max_frames.is_some_and(|max| report.frames >= max) {
                debug!(frames = report.frames, "frame limit reached");
                self.state.request_stop();
                break;
            }

            deadline += interval;
            let now = Instant::now();
            if deadline <= now {
                deadline = now;
            } else {
                self.state.sleep_while_running(deadline - now);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle onto a spawned scheduler thread.
#[derive(Debug)]
pub struct SchedulerHandle {
    phase: Arc<PhaseCell>,
    handle: Option<JoinHandle<Result<SchedulerReport, SchedulerFailure>>>,
}

impl SchedulerHandle {
    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        self.phase.get()
    }

    /// Block until the loop has reached `Stopped`.
    pub fn wait_stopped(&self) {
        self.phase.wait_for(SchedulerPhase::Stopped);
    }

    /// Join the thread and return its result.
    pub fn join(mut self) -> Result<SchedulerReport, SchedulerFailure> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(SchedulerFailure::panicked())),
            None => Err(SchedulerFailure::panicked()),
        }
    }
}
