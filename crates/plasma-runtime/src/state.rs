#![forbid(unsafe_code)]

//! Shared animation parameters.
//!
//! [`AnimationState`] is the only channel between the control loop (writer)
//! and the animation thread (reader). All parameters sit behind one lock and
//! are read as a whole [`AnimationParams`] snapshot, so a tick can never mix
//! a new palette index with a stale gamma or time step.
//!
//! The `running` flag lives under the same lock and is paired with a
//! condition variable: the animation thread sleeps between ticks on it and
//! wakes as soon as a stop is requested.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

/// Gamma at startup.
pub const DEFAULT_GAMMA: f64 = 1.0;
/// Lowest gamma the operator can select.
pub const MIN_GAMMA: f64 = 1.0;
/// Gamma change per command.
pub const GAMMA_STEP: f64 = 0.1;

/// Simulated-time increment per frame at startup.
pub const DEFAULT_TIME_STEP: f64 = 0.05;
/// Floor for the time step; it never reaches zero.
pub const MIN_TIME_STEP: f64 = 0.01;
/// Time step change per command.
pub const TIME_STEP_STEP: f64 = 0.01;

/// A consistent view of the live parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationParams {
    /// Index into the loaded palette set.
    pub palette_index: usize,
    /// Brightness-correction exponent forwarded to the display.
    pub gamma: f64,
    /// Simulated time added per frame.
    pub time_step: f64,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            palette_index: 0,
            gamma: DEFAULT_GAMMA,
            time_step: DEFAULT_TIME_STEP,
        }
    }
}

impl AnimationParams {
    /// Bring every field into its legal range.
    ///
    /// Floating-point values are snapped to a micro-unit grid so repeated
    /// `+0.1 / -0.1` steps return to the exact starting value.
    #[must_use]
    pub fn clamped(self, palette_count: usize) -> Self {
        let max_index = palette_count.saturating_sub(1);
        Self {
            palette_index: self.palette_index.min(max_index),
            gamma: snap(finite_or(self.gamma, DEFAULT_GAMMA)).max(MIN_GAMMA),
            time_step: snap(finite_or(self.time_step, DEFAULT_TIME_STEP)).max(MIN_TIME_STEP),
        }
    }
}

#[inline]
fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

#[inline]
fn snap(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

#[derive(Debug)]
struct Inner {
    running: bool,
    params: AnimationParams,
}

/// Synchronized parameter record shared by the animation and control loops.
#[derive(Debug)]
pub struct AnimationState {
    inner: Mutex<Inner>,
    wake: Condvar,
    palette_count: usize,
}

impl AnimationState {
    /// Create a running state. `params` are clamped against
    /// `palette_count`.
    #[must_use]
    pub fn new(params: AnimationParams, palette_count: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                running: true,
                params: params.clamped(palette_count),
            }),
            wake: Condvar::new(),
            palette_count,
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    #[must_use]
    pub const fn palette_count(&self) -> usize {
        self.palette_count
    }

    /// Copy of all parameters, taken under one lock acquisition.
    #[must_use]
    pub fn snapshot(&self) -> AnimationParams {
        self.lock().params
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Clear the running flag and wake any sleeper.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn request_stop(&self) -> bool {
        let was_running = {
            let mut inner = self.lock();
            std::mem::replace(&mut inner.running, false)
        };
        self.wake.notify_all();
        if was_running {
            debug!("stop requested");
        }
        was_running
    }

    /// Apply `f` to the parameters atomically and return the clamped
    /// result.
    pub fn update<F>(&self, f: F) -> AnimationParams
    where
        F: FnOnce(&mut AnimationParams),
    {
        let mut inner = self.lock();
        let mut params = inner.params;
        f(&mut params);
        inner.params = params.clamped(self.palette_count);
        inner.params
    }

    /// Replace all parameters at once (clamped).
    pub fn set(&self, params: AnimationParams) -> AnimationParams {
        self.update(|p| *p = params)
    }

    pub fn set_palette_index(&self, index: usize) -> AnimationParams {
        self.update(|p| p.palette_index = index)
    }

    pub fn set_gamma(&self, gamma: f64) -> AnimationParams {
        self.update(|p| p.gamma = gamma)
    }

    pub fn set_time_step(&self, time_step: f64) -> AnimationParams {
        self.update(|p| p.time_step = time_step)
    }

    /// Sleep for up to `timeout`, returning early once a stop is requested.
    ///
    /// Returns whether the animation is still running.
    pub fn sleep_while_running(&self, timeout: Duration) -> bool {
        let inner = self.lock();
        let (inner, _) = self
            .wake
            .wait_timeout_while(inner, timeout, |inner| inner.running)
            .unwrap_or_else(PoisonError::into_inner);
        inner.running
    }
}
