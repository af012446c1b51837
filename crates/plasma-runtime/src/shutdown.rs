#![forbid(unsafe_code)]

//! Shutdown coordinator.
//!
//! Shutdown can be triggered from the control loop (operator quit) and from
//! the signal thread at the same time. [`ShutdownCoordinator::shutdown`]
//! runs the teardown exactly once; a caller that arrives while it is in
//! progress blocks until it finishes and receives the same report.
//!
//! Teardown order:
//!
//! 1. Clear the running flag (wakes the animation thread's sleep).
//! 2. Join the animation thread.
//! 3. Blank the display, then release it.
//!
//! The display is only touched after the join, so no frame can land after
//! `all_off` and nothing is written after `release`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::display::{self, DisplayError, SharedDisplay};
use crate::scheduler::{SchedulerError, SchedulerHandle};
use crate::state::AnimationState;

/// What happened during teardown.
#[derive(Debug, Clone, Default)]
pub struct ShutdownReport {
    /// Frames the animation thread published.
    pub frames: u64,
    /// Simulated time reached by the animation.
    pub simulated_time: f64,
    /// Why the animation thread stopped, if it failed.
    pub scheduler_error: Option<Arc<SchedulerError>>,
    /// Failures from `all_off` / `release`. Logged, not fatal.
    pub cleanup_errors: Vec<Arc<DisplayError>>,
}

impl ShutdownReport {
    /// True when the animation ended normally and cleanup succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.scheduler_error.is_none() && self.cleanup_errors.is_empty()
    }

    /// Process exit code: 1 when the animation failed, 0 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.scheduler_error.is_some())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs teardown once, however many threads ask for it.
pub struct ShutdownCoordinator {
    state: Arc<AnimationState>,
    display: SharedDisplay,
    scheduler: Mutex<Option<SchedulerHandle>>,
    outcome: Mutex<Option<ShutdownReport>>,
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("running", &self.state.is_running())
            .finish_non_exhaustive()
    }
}

impl ShutdownCoordinator {
    #[must_use]
    pub fn new(
        state: Arc<AnimationState>,
        display: SharedDisplay,
        scheduler: SchedulerHandle,
    ) -> Self {
        Self {
            state,
            display,
            scheduler: Mutex::new(Some(scheduler)),
            outcome: Mutex::new(None),
        }
    }

    /// A coordinator for a display with no animation thread attached.
    #[must_use]
    pub fn without_scheduler(state: Arc<AnimationState>, display: SharedDisplay) -> Self {
        Self {
            state,
            display,
            scheduler: Mutex::new(None),
            outcome: Mutex::new(None),
        }
    }

    /// The report, if teardown has completed.
    #[must_use]
    pub fn report(&self) -> Option<ShutdownReport> {
        lock(&self.outcome).clone()
    }

    /// Stop the animation, blank and release the display.
    pub fn shutdown(&self) -> ShutdownReport {
        let mut outcome = lock(&self.outcome);
        if let Some(report) = outcome.as_ref() {
            return report.clone();
        }

        info!("shutting down");
        self.state.request_stop();

        let mut report = ShutdownReport::default();
        let handle = lock(&self.scheduler).take();
        if let Some(handle) = handle {
            let run = match handle.join() {
                Ok(run) => run,
                Err(failure) => {
                    report.scheduler_error = Some(Arc::new(failure.error));
                    failure.report
                }
            };
            report.frames = run.frames;
            report.simulated_time = run.simulated_time;
        }

        {
            let mut device = display::lock(&self.display);
            let name = device.name();
            if let Err(err) = device.all_off() {
                warn!(error = %err, display = name, "failed to blank display");
                report.cleanup_errors.push(Arc::new(err));
            }
            if let Err(err) = device.release() {
                warn!(error = %err, display = name, "failed to release display");
                report.cleanup_errors.push(Arc::new(err));
            }
        }

        info!(
            frames = report.frames,
            clean = report.is_clean(),
            "shutdown complete"
        );
        *outcome = Some(report.clone());
        report
    }
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

#[cfg(unix)]
pub use signals::{SignalGuard, install_signal_handler};

#[cfg(unix)]
mod signals {
    use std::io;
    use std::sync::Arc;
    use std::thread::{self, JoinHandle};

    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::{Handle, Signals};
    use tracing::{debug, info};

    use super::ShutdownCoordinator;

    /// Thread name of the signal listener.
    pub const THREAD_NAME: &str = "plasma-signals";

    /// Keeps the signal listener alive. Dropping it unregisters the
    /// handlers and joins the listener thread.
    #[derive(Debug)]
    pub struct SignalGuard {
        handle: Handle,
        thread: Option<JoinHandle<()>>,
    }

    impl Drop for SignalGuard {
        fn drop(&mut self) {
            self.handle.close();
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        }
    }

    /// Route SIGINT, SIGTERM, and SIGHUP to
    /// [`ShutdownCoordinator::shutdown`].
    pub fn install_signal_handler(
        coordinator: Arc<ShutdownCoordinator>,
    ) -> io::Result<SignalGuard> {
        let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    info!(signal, "signal received");
                    coordinator.shutdown();
                }
                debug!("signal listener exiting");
            })?;
        Ok(SignalGuard {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayCall, RecordingDisplay, RecordingLog, shared};
    use crate::scheduler::{Scheduler, SchedulerConfig};
    use crate::state::AnimationParams;
    use plasma_core::{FieldGeometry, PaletteSet};
    use std::thread;
    use std::time::Duration;

    fn running(display: RecordingDisplay) -> (Arc<ShutdownCoordinator>, RecordingLog) {
        let log = display.log();
        let display = shared(display);
        let palettes =
            Arc::new(PaletteSet::parse("Gray = 0x000000, 0xffffff", false).expect("palette"));
        let state = Arc::new(AnimationState::new(AnimationParams::default(), 1));
        let config = SchedulerConfig {
            geometry: FieldGeometry::new(2, 2, 0.25),
            tick_interval: Duration::from_millis(1),
            max_frames: None,
        };
        let handle = Scheduler::new(config, palettes, Arc::clone(&state), Arc::clone(&display))
            .spawn()
            .expect("spawn");
        while log.show_count() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        (
            Arc::new(ShutdownCoordinator::new(state, display, handle)),
            log,
        )
    }

    #[test]
    fn blanks_then_releases_after_last_frame() {
        let (coordinator, log) = running(RecordingDisplay::new(2, 2));
        let report = coordinator.shutdown();
        assert!(report.is_clean());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.frames as usize, log.show_count());
        assert_eq!(log.all_off_count(), 1);
        assert_eq!(log.release_count(), 1);
        assert_eq!(
            log.calls_after(|c| *c == DisplayCall::AllOff),
            vec![DisplayCall::Release]
        );
    }

    #[test]
    fn second_call_returns_same_report() {
        let (coordinator, log) = running(RecordingDisplay::new(2, 2));
        let first = coordinator.shutdown();
        let second = coordinator.shutdown();
        assert_eq!(first.frames, second.frames);
        assert_eq!(log.release_count(), 1);
        assert!(coordinator.report().is_some());
    }

    #[test]
    fn concurrent_shutdown_runs_once() {
        let (coordinator, log) = running(RecordingDisplay::new(2, 2));
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&coordinator);
                thread::spawn(move || c.shutdown().frames)
            })
            .collect();
        let frames: Vec<u64> = threads
            .into_iter()
            .map(|t| t.join().expect("shutdown thread"))
            .collect();
        assert!(frames.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(log.all_off_count(), 1);
        assert_eq!(log.release_count(), 1);
    }

    #[test]
    fn scheduler_failure_still_cleans_up() {
        let (coordinator, log) = running(RecordingDisplay::new(2, 2).failing_on_show(2));
        // The second show is recorded before it fails, so the failure is
        // already decided once it appears.
        while log.show_count() < 2 {
            thread::sleep(Duration::from_millis(1));
        }
        let report = coordinator.shutdown();
        let err = report.scheduler_error.as_deref().expect("scheduler failed");
        assert!(matches!(err, SchedulerError::Display(_)));
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.frames, 1);
        assert_eq!(log.frames().len(), 1);
        assert_eq!(log.all_off_count(), 1);
        assert_eq!(log.release_count(), 1);
    }

    #[test]
    fn cleanup_failures_are_recorded_not_fatal() {
        let rec = RecordingDisplay::new(2, 2);
        let log = rec.log();
        let device = shared(rec);
        display::lock(&device).release().expect("release");
        let state = Arc::new(AnimationState::new(AnimationParams::default(), 1));
        let coordinator = ShutdownCoordinator::without_scheduler(state, device);
        let report = coordinator.shutdown();
        assert_eq!(report.cleanup_errors.len(), 1);
        assert!(matches!(*report.cleanup_errors[0], DisplayError::Released));
        assert_eq!(report.exit_code(), 0);
        assert!(!report.is_clean());
        assert_eq!(log.release_count(), 2);
    }

    #[test]
    fn without_scheduler_only_touches_display() {
        let rec = RecordingDisplay::new(2, 2);
        let log = rec.log();
        let state = Arc::new(AnimationState::new(AnimationParams::default(), 1));
        let coordinator = ShutdownCoordinator::without_scheduler(Arc::clone(&state), shared(rec));
        let report = coordinator.shutdown();
        assert!(report.is_clean());
        assert!(!state.is_running());
        assert_eq!(log.calls(), vec![DisplayCall::AllOff, DisplayCall::Release]);
    }
}
