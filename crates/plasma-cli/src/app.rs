#![forbid(unsafe_code)]

//! Wiring: palettes, display, animation thread, control loop, shutdown.

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, style::ResetColor};
use plasma_core::{PaletteError, PaletteSet};
use plasma_runtime::display::{self, FileDisplay, NullDisplay, SharedDisplay, TerminalDisplay};
use plasma_runtime::{
    AnimationParams, AnimationState, CommandSource, ControlSurface, DisplayError, Scheduler,
    SchedulerError, ShutdownCoordinator, ShutdownReport, StatusObserver,
};
use tracing::{info, warn};

use crate::cli::{DisplayKind, Opts};
use crate::keys::{KeySource, LineSource};
use crate::status::{self, GRID_COLUMN, StatusScreen};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error("unknown palette {name:?} (available: {available})")]
    UnknownPalette { name: String, available: String },
    #[error("cannot open display: {0}")]
    Display(#[from] DisplayError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Terminal session
// ---------------------------------------------------------------------------

/// Raw mode plus alternate screen, restored on drop.
#[derive(Debug)]
struct TerminalSession {
    out: Stdout,
}

impl TerminalSession {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        if let Err(err) = execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All)
        ) {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        Ok(Self { out })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(self.out, ResetColor, cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// A started animation: the scheduler is running and the coordinator owns
/// its teardown.
pub struct Runtime {
    control: ControlSurface,
    coordinator: Arc<ShutdownCoordinator>,
    status_rows: u16,
}

impl Runtime {
    /// Load palettes, open the display, and start the animation thread.
    pub fn start(opts: &Opts) -> Result<Self, AppError> {
        let palettes = Arc::new(PaletteSet::from_path(&opts.palette_file, opts.wrap)?);
        info!(
            path = %opts.palette_file.display(),
            count = palettes.len(),
            cyclic = opts.wrap,
            "palettes loaded"
        );

        let params = initial_params(opts, &palettes)?;
        let state = Arc::new(AnimationState::new(params, palettes.len()));
        let params = state.snapshot();

        let status_rows = status::status_rows(&palettes);
        let display = open_display(opts, params.gamma, status_rows)?;
        let handle = Scheduler::new(
            opts.scheduler_config(),
            Arc::clone(&palettes),
            Arc::clone(&state),
            Arc::clone(&display),
        )
        .spawn()?;

        let coordinator = Arc::new(ShutdownCoordinator::new(
            Arc::clone(&state),
            Arc::clone(&display),
            handle,
        ));
        let control = ControlSurface::new(state, palettes, display);
        Ok(Self {
            control,
            coordinator,
            status_rows,
        })
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<ShutdownCoordinator> {
        &self.coordinator
    }

    /// Rows above the terminal preview that belong to the status block.
    #[must_use]
    pub const fn status_rows(&self) -> u16 {
        self.status_rows
    }

    /// Run the control loop, then shut down whatever happened.
    pub fn drive<S, O>(self, source: &mut S, observer: &mut O) -> Result<ShutdownReport, AppError>
    where
        S: CommandSource + ?Sized,
        O: StatusObserver + ?Sized,
    {
        let control = self.control.run(source, observer);
        let report = self.coordinator.shutdown();
        if let Err(err) = &control {
            warn!(error = %err, "control loop failed");
        }
        control?;
        Ok(report)
    }
}

fn initial_params(opts: &Opts, palettes: &PaletteSet) -> Result<AnimationParams, AppError> {
    let palette_index = match &opts.palette {
        None => 0,
        Some(name) => palettes
            .find(name)
            .ok_or_else(|| AppError::UnknownPalette {
                name: name.clone(),
                available: palettes.names().collect::<Vec<_>>().join(", "),
            })?,
    };
    Ok(AnimationParams {
        palette_index,
        gamma: opts.gamma,
        time_step: opts.time_step,
    })
}

fn open_display(opts: &Opts, gamma: f64, status_rows: u16) -> Result<SharedDisplay, AppError> {
    let (width, height) = opts.grid;
    let display = match &opts.display {
        DisplayKind::Terminal => display::shared(TerminalDisplay::stdout(
            width,
            height,
            gamma,
            (GRID_COLUMN, status_rows),
        )),
        DisplayKind::Null => display::shared(NullDisplay::new(width, height, gamma)),
        DisplayKind::File(path) => {
            display::shared(FileDisplay::create(path, width, height, gamma)?)
        }
    };
    let name = display::lock(&display).name();
    info!(display = name, width, height, gamma, "display opened");
    Ok(display)
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// Run the animator until quit, signal, frame limit, or display failure.
pub fn run(opts: &Opts) -> Result<ShutdownReport, AppError> {
    let session = if opts.display.is_interactive() {
        Some(TerminalSession::enter()?)
    } else {
        None
    };

    let runtime = Runtime::start(opts)?;

    #[cfg(unix)]
    let signals = match plasma_runtime::install_signal_handler(Arc::clone(runtime.coordinator())) {
        Ok(guard) => Some(guard),
        Err(err) => {
            warn!(error = %err, "signal handling unavailable");
            None
        }
    };

    let report = if session.is_some() {
        let rows = runtime.status_rows();
        runtime.drive(&mut KeySource, &mut StatusScreen::stdout(rows))
    } else {
        let mut input = LineSource::spawn(io::BufReader::new(io::stdin()))?;
        let mut quiet = |_: &plasma_runtime::Status<'_>| Ok(());
        runtime.drive(&mut input, &mut quiet)
    };

    #[cfg(unix)]
    drop(signals);
    drop(session);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasma_runtime::{Command, ScriptedCommands, Status};
    use std::sync::mpsc;

    const SOURCE: &str = "Mono = 0x000000, 0xffffff,\nFire = 0x000000, 0xff0000, 0xffff00,\n";

    fn opts(dir: &tempfile::TempDir, display: DisplayKind) -> Opts {
        let palette_file = dir.path().join("palettes.txt");
        std::fs::write(&palette_file, SOURCE).expect("write palettes");
        Opts {
            palette_file,
            grid: (4, 3),
            tick_ms: 1,
            display,
            ..Opts::default()
        }
    }

    fn no_status(_: &Status<'_>) -> io::Result<()> {
        Ok(())
    }

    #[test]
    fn recording_run_writes_whole_frames_and_blank_tail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.raw");
        let mut opts = opts(&dir, DisplayKind::File(path.clone()));
        opts.frames = 5;
        let (_tx, mut rx) = mpsc::channel::<Command>();
        let report = Runtime::start(&opts)
            .expect("start")
            .drive(&mut rx, &mut no_status)
            .expect("drive");
        assert!(report.is_clean());
        assert_eq!(report.frames, 5);

        let bytes = std::fs::read(&path).expect("recording");
        let frame_len = 4 * 3 * 3;
        assert_eq!(bytes.len(), frame_len * 6);
        assert!(bytes[frame_len * 5..].iter().all(|b| *b == 0));
    }

    #[test]
    fn named_palette_selects_start_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut opts = opts(&dir, DisplayKind::Null);
        opts.palette = Some("Fire".into());
        let params = initial_params(
            &opts,
            &PaletteSet::from_path(&opts.palette_file, false).expect("palettes"),
        )
        .expect("known palette");
        assert_eq!(params.palette_index, 1);
    }

    #[test]
    fn unknown_palette_lists_available_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut opts = opts(&dir, DisplayKind::Null);
        opts.palette = Some("Ocean".into());
        let err = Runtime::start(&opts).err().expect("unknown palette");
        assert_eq!(
            err.to_string(),
            "unknown palette \"Ocean\" (available: Mono, Fire)"
        );
    }

    #[test]
    fn missing_palette_file_fails_before_animation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut opts = opts(&dir, DisplayKind::Null);
        opts.palette_file = dir.path().join("nope.txt");
        let err = Runtime::start(&opts).err().expect("missing file");
        assert!(matches!(err, AppError::Palette(PaletteError::Io { .. })));
    }

    #[test]
    fn scripted_quit_shuts_down_null_display() {
        let dir = tempfile::tempdir().expect("tempdir");
        let opts = opts(&dir, DisplayKind::Null);
        let runtime = Runtime::start(&opts).expect("start");
        let coordinator = Arc::clone(runtime.coordinator());
        let mut script = ScriptedCommands::new([Command::PaletteNext, Command::GammaIncrease]);
        let report = runtime
            .drive(&mut script, &mut no_status)
            .expect("drive");
        assert!(report.is_clean());
        assert_eq!(report.exit_code(), 0);
        assert!(coordinator.report().is_some());
    }
}
