#![forbid(unsafe_code)]

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use plasma_core::{FrameBuffer, Rgb};

use super::{Display, DisplayError, check_bounds};

/// One call made against a [`RecordingDisplay`].
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    SetCell { x: u16, y: u16, color: Rgb },
    Show,
    SetGamma(f64),
    AllOff,
    Release,
}

#[derive(Debug, Default)]
struct LogInner {
    calls: Vec<DisplayCall>,
    frames: Vec<FrameBuffer>,
    shown_at: Vec<Instant>,
}

/// Handle onto the calls recorded by a [`RecordingDisplay`].
///
/// Cloneable and usable after the display itself has been moved into a
/// [`super::SharedDisplay`].
#[derive(Debug, Clone, Default)]
pub struct RecordingLog {
    inner: Arc<Mutex<LogInner>>,
}

impl RecordingLog {
    fn lock(&self) -> MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, call: DisplayCall) {
        self.lock().calls.push(call);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<DisplayCall> {
        self.lock().calls.clone()
    }

    /// Every frame published with `show`, in order.
    #[must_use]
    pub fn frames(&self) -> Vec<FrameBuffer> {
        self.lock().frames.clone()
    }

    /// When each published frame completed its `show`.
    #[must_use]
    pub fn shown_at(&self) -> Vec<Instant> {
        self.lock().shown_at.clone()
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<FrameBuffer> {
        self.lock().frames.last().cloned()
    }

    #[must_use]
    pub fn show_count(&self) -> usize {
        self.count(|c| *c == DisplayCall::Show)
    }

    #[must_use]
    pub fn all_off_count(&self) -> usize {
        self.count(|c| *c == DisplayCall::AllOff)
    }

    #[must_use]
    pub fn release_count(&self) -> usize {
        self.count(|c| *c == DisplayCall::Release)
    }

    /// Gamma values forwarded so far.
    #[must_use]
    pub fn gammas(&self) -> Vec<f64> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                DisplayCall::SetGamma(g) => Some(*g),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn count<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&DisplayCall) -> bool,
    {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Calls recorded after the first call matching `pred`.
    #[must_use]
    pub fn calls_after<F>(&self, mut pred: F) -> Vec<DisplayCall>
    where
        F: FnMut(&DisplayCall) -> bool,
    {
        let inner = self.lock();
        match inner.calls.iter().position(|c| pred(c)) {
            Some(idx) => inner.calls[idx + 1..].to_vec(),
            None => Vec::new(),
        }
    }
}

/// A display that records every call.
///
/// It behaves like a real device: writes after `release` fail. It can be
/// told to fail on a given `show` to exercise fatal display errors, or to
/// stall on one to exercise tick overruns.
#[derive(Debug)]
pub struct RecordingDisplay {
    staged: FrameBuffer,
    log: RecordingLog,
    released: bool,
    fail_on_show: Option<usize>,
    slow_show: Option<(usize, Duration)>,
    shows: usize,
}

impl RecordingDisplay {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            staged: FrameBuffer::new(width, height),
            log: RecordingLog::default(),
            released: false,
            fail_on_show: None,
            slow_show: None,
            shows: 0,
        }
    }

    /// Make the `n`-th `show` call (1-based) fail with an I/O error.
    #[must_use]
    pub fn failing_on_show(mut self, n: usize) -> Self {
        self.fail_on_show = Some(n);
        self
    }

    /// Make the `n`-th `show` call (1-based) take `delay` before it returns.
    #[must_use]
    pub fn slow_on_show(mut self, n: usize, delay: Duration) -> Self {
        self.slow_show = Some((n, delay));
        self
    }

    #[must_use]
    pub fn log(&self) -> RecordingLog {
        self.log.clone()
    }

    fn ensure_live(&self) -> Result<(), DisplayError> {
        if self.released {
            Err(DisplayError::Released)
        } else {
            Ok(())
        }
    }
}

impl Display for RecordingDisplay {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn size(&self) -> (u16, u16) {
        (self.staged.width(), self.staged.height())
    }

    fn set_cell(&mut self, x: u16, y: u16, color: Rgb) -> Result<(), DisplayError> {
        self.log.push(DisplayCall::SetCell { x, y, color });
        self.ensure_live()?;
        check_bounds(x, y, self.staged.width(), self.staged.height())?;
        self.staged.set(x, y, color);
        Ok(())
    }

    fn show(&mut self) -> Result<(), DisplayError> {
        self.log.push(DisplayCall::Show);
        self.ensure_live()?;
        self.shows += 1;
        if self.fail_on_show == Some(self.shows) {
            return Err(DisplayError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "injected display failure",
            )));
        }
        if let Some((n, delay)) = self.slow_show
            && n == self.shows
        {
            thread::sleep(delay);
        }
        let mut log = self.log.lock();
        log.frames.push(self.staged.clone());
        log.shown_at.push(Instant::now());
        Ok(())
    }

    fn set_gamma(&mut self, gamma: f64) -> Result<(), DisplayError> {
        self.log.push(DisplayCall::SetGamma(gamma));
        self.ensure_live()
    }

    fn all_off(&mut self) -> Result<(), DisplayError> {
        self.log.push(DisplayCall::AllOff);
        self.ensure_live()?;
        self.staged.fill(Rgb::BLACK);
        Ok(())
    }

    fn release(&mut self) -> Result<(), DisplayError> {
        self.log.push(DisplayCall::Release);
        self.released = true;
        Ok(())
    }
}
