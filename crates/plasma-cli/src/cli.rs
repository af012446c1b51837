#![forbid(unsafe_code)]

//! Command-line argument parsing for `ledplasma`.
//!
//! Parses args manually to keep the binary lean. Every option can also be
//! set through a `PLASMA_*` environment variable; explicit flags win.

use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use plasma_core::FieldGeometry;
use plasma_core::field::{DEFAULT_FIELD_SIZE, DEFAULT_GRID_SIZE};
use plasma_runtime::SchedulerConfig;
use plasma_runtime::state::{DEFAULT_GAMMA, DEFAULT_TIME_STEP};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
ledplasma - animated plasma on an LED grid

USAGE:
    ledplasma [OPTIONS] PALETTE_FILE

OPTIONS:
    --grid=WxH           Grid size in cells (default: 10x10)
    --field-size=F       Extent of the sampled field window (default: 0.25)
    --tick-ms=N          Milliseconds between frames (default: 20)
    --gamma=F            Initial gamma, at least 1.0 (default: 1.0)
    --time-step=F        Simulated time per frame, at least 0.01 (default: 0.05)
    --palette=NAME       Start on the palette called NAME (default: first)
    --display=KIND       'terminal', 'null', or 'file:PATH' (default: terminal)
    --wrap               Close every gradient back onto its first color
    --frames=N           Stop after N frames, 0 = run until quit (default: 0)
    --log-file=PATH      Write logs to PATH
    --log-json           Emit logs as JSON lines
    --help, -h           Show this help message
    --version, -V        Show version

PALETTE FILE:
    Sunset = 0x492d61, 0x048091, 0x61c155, 0xf2d43f, 0xd1026c,
    Mono   = 0x000000, 0xffffff,

KEYBINDINGS:
    e / r                 Gamma down / up
    a / s                 Slower / faster
    q / w                 Previous / next palette
    x / Ctrl+C            Quit

HEADLESS INPUT:
    With --display=null or --display=file:PATH, commands are read from
    stdin, one per line: a key above or a command name such as
    'palette-next' or 'gamma-increase'.

ENVIRONMENT VARIABLES:
    PLASMA_PALETTE_FILE   Palette file when none is given on the command line
    PLASMA_GRID           Override --grid
    PLASMA_FIELD_SIZE     Override --field-size
    PLASMA_TICK_MS        Override --tick-ms
    PLASMA_GAMMA          Override --gamma
    PLASMA_TIME_STEP      Override --time-step
    PLASMA_PALETTE        Override --palette
    PLASMA_DISPLAY        Override --display
    PLASMA_WRAP           Enable --wrap (1/true)
    PLASMA_FRAMES         Override --frames
    PLASMA_LOG_FILE       Override --log-file
    PLASMA_LOG_JSON       Enable --log-json (1/true)
    PLASMA_LOG            Log filter directives (default: info)";

/// Where frames go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayKind {
    /// True-color preview in the terminal.
    #[default]
    Terminal,
    /// Drop every frame.
    Null,
    /// Raw LED-chain recording.
    File(PathBuf),
}

impl DisplayKind {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(path) = raw.strip_prefix("file:") {
            return (!path.is_empty()).then(|| Self::File(PathBuf::from(path)));
        }
        match raw.to_ascii_lowercase().as_str() {
            "terminal" => Some(Self::Terminal),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// Whether the terminal is taken over for the preview.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        matches!(self, Self::Terminal)
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Palette source file.
    pub palette_file: PathBuf,
    /// Grid size as `(width, height)`.
    pub grid: (u16, u16),
    /// Extent of the field window sampled by the grid.
    pub field_size: f64,
    /// Milliseconds between frames.
    pub tick_ms: u64,
    /// Initial gamma.
    pub gamma: f64,
    /// Initial simulated time per frame.
    pub time_step: f64,
    /// Palette to start on (None = first).
    pub palette: Option<String>,
    /// Display backend.
    pub display: DisplayKind,
    /// Build cyclic shade tables.
    pub wrap: bool,
    /// Stop after this many frames (0 = unlimited).
    pub frames: u64,
    /// Log file path.
    pub log_file: Option<PathBuf>,
    /// JSON log lines.
    pub log_json: bool,
}

/// Why option parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("help requested")]
    Help,
    #[error("version requested")]
    Version,
    #[error("invalid {flag} value: {value}")]
    InvalidValue { flag: &'static str, value: String },
    #[error("unknown argument: {0}")]
    UnknownArg(String),
    #[error("no palette file given")]
    MissingPaletteFile,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            palette_file: PathBuf::new(),
            grid: (DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE),
            field_size: DEFAULT_FIELD_SIZE,
            tick_ms: 20,
            gamma: DEFAULT_GAMMA,
            time_step: DEFAULT_TIME_STEP,
            palette: None,
            display: DisplayKind::Terminal,
            wrap: false,
            frames: 0,
            log_file: None,
            log_json: false,
        }
    }
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ConfigError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ConfigError::Version) => {
                println!("ledplasma {VERSION}");
                process::exit(0);
            }
            Err(err) => {
                eprintln!("ledplasma: {err}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Apply environment variable defaults first
        if let Some(val) = get_env("PLASMA_PALETTE_FILE")
            && !val.trim().is_empty()
        {
            opts.palette_file = PathBuf::from(val);
        }
        if let Some(val) = get_env("PLASMA_GRID")
            && let Some(grid) = parse_grid(&val)
        {
            opts.grid = grid;
        }
        if let Some(val) = get_env("PLASMA_FIELD_SIZE")
            && let Some(n) = parse_positive(&val)
        {
            opts.field_size = n;
        }
        if let Some(val) = get_env("PLASMA_TICK_MS")
            && let Ok(n) = val.parse::<u64>()
            && n > 0
        {
            opts.tick_ms = n;
        }
        if let Some(val) = get_env("PLASMA_GAMMA")
            && let Some(n) = parse_finite(&val)
        {
            opts.gamma = n;
        }
        if let Some(val) = get_env("PLASMA_TIME_STEP")
            && let Some(n) = parse_finite(&val)
        {
            opts.time_step = n;
        }
        if let Some(val) = get_env("PLASMA_PALETTE")
            && !val.trim().is_empty()
        {
            opts.palette = Some(val.trim().to_string());
        }
        if let Some(val) = get_env("PLASMA_DISPLAY")
            && let Some(kind) = DisplayKind::parse(&val)
        {
            opts.display = kind;
        }
        if let Some(val) = get_env("PLASMA_WRAP") {
            opts.wrap = is_enabled(&val);
        }
        if let Some(val) = get_env("PLASMA_FRAMES")
            && let Ok(n) = val.parse()
        {
            opts.frames = n;
        }
        if let Some(val) = get_env("PLASMA_LOG_FILE")
            && !val.trim().is_empty()
        {
            opts.log_file = Some(PathBuf::from(val));
        }
        if let Some(val) = get_env("PLASMA_LOG_JSON") {
            opts.log_json = is_enabled(&val);
        }

        // Parse command-line args (override env vars)
        let mut positional: Option<PathBuf> = None;
        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Err(ConfigError::Help),
                "--version" | "-V" => return Err(ConfigError::Version),
                "--wrap" => opts.wrap = true,
                "--log-json" => opts.log_json = true,
                other => {
                    if let Some(val) = other.strip_prefix("--grid=") {
                        opts.grid = parse_grid(val).ok_or_else(|| invalid("--grid", val))?;
                    } else if let Some(val) = other.strip_prefix("--field-size=") {
                        opts.field_size =
                            parse_positive(val).ok_or_else(|| invalid("--field-size", val))?;
                    } else if let Some(val) = other.strip_prefix("--tick-ms=") {
                        opts.tick_ms = val
                            .parse::<u64>()
                            .ok()
                            .filter(|n| *n > 0)
                            .ok_or_else(|| invalid("--tick-ms", val))?;
                    } else if let Some(val) = other.strip_prefix("--gamma=") {
                        opts.gamma = parse_finite(val).ok_or_else(|| invalid("--gamma", val))?;
                    } else if let Some(val) = other.strip_prefix("--time-step=") {
                        opts.time_step =
                            parse_finite(val).ok_or_else(|| invalid("--time-step", val))?;
                    } else if let Some(val) = other.strip_prefix("--palette=") {
                        if val.trim().is_empty() {
                            return Err(invalid("--palette", val));
                        }
                        opts.palette = Some(val.trim().to_string());
                    } else if let Some(val) = other.strip_prefix("--display=") {
                        opts.display =
                            DisplayKind::parse(val).ok_or_else(|| invalid("--display", val))?;
                    } else if let Some(val) = other.strip_prefix("--frames=") {
                        opts.frames = val.parse().map_err(|_| invalid("--frames", val))?;
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        if val.trim().is_empty() {
                            return Err(invalid("--log-file", val));
                        }
                        opts.log_file = Some(PathBuf::from(val));
                    } else if other.starts_with('-') && other != "-" {
                        return Err(ConfigError::UnknownArg(other.to_string()));
                    } else if positional.is_none() {
                        positional = Some(PathBuf::from(other));
                    } else {
                        return Err(ConfigError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        if let Some(path) = positional {
            opts.palette_file = path;
        }
        if opts.palette_file.as_os_str().is_empty() {
            return Err(ConfigError::MissingPaletteFile);
        }
        Ok(opts)
    }

    /// Scheduler settings derived from the options.
    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            geometry: FieldGeometry::new(self.grid.0, self.grid.1, self.field_size),
            tick_interval: Duration::from_millis(self.tick_ms),
            max_frames: (self.frames > 0).then_some(self.frames),
        }
    }
}

fn invalid(flag: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        flag,
        value: value.to_string(),
    }
}

fn is_enabled(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

fn parse_grid(raw: &str) -> Option<(u16, u16)> {
    let trimmed = raw.trim();
    let mut parts = trimmed.split(['x', 'X']);
    let cols: u16 = parts.next()?.parse().ok()?;
    let rows: u16 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || cols == 0 || rows == 0 {
        return None;
    }
    Some((cols, rows))
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_positive(raw: &str) -> Option<f64> {
    parse_finite(raw).filter(|v| *v > 0.0)
}
