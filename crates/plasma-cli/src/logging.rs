#![forbid(unsafe_code)]

//! Log subscriber setup.
//!
//! While the terminal preview owns the screen nothing may be written to the
//! terminal, so logs go to `--log-file` or nowhere. Headless runs log to
//! stderr unless a file is given.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::cli::Opts;

/// Filter directives variable, in `EnvFilter` syntax.
pub const LOG_ENV: &str = "PLASMA_LOG";
const DEFAULT_DIRECTIVES: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    #[must_use]
    pub fn for_opts(opts: &Opts) -> Self {
        match (&opts.log_file, opts.display.is_interactive()) {
            (Some(path), _) => Self::File(path.clone()),
            (None, true) => Self::Off,
            (None, false) => Self::Stderr,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot install log subscriber: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber described by `opts`.
pub fn init(opts: &Opts) -> Result<LogTarget, LoggingError> {
    let target = LogTarget::for_opts(opts);
    match &target {
        LogTarget::Off => {}
        LogTarget::Stderr => install(std::io::stderr, opts.log_json, true)?,
        LogTarget::File(path) => {
            let file = File::create(path).map_err(|source| LoggingError::Open {
                path: path.clone(),
                source,
            })?;
            install(Mutex::new(file), opts.log_json, false)?;
        }
    }
    Ok(target)
}

fn install<W>(make_writer: W, json: bool, ansi: bool) -> Result<(), LoggingError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(make_writer)
        .with_thread_names(true);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.with_ansi(ansi).try_init()
    };
    installed.map_err(LoggingError::Install)
}
