#![forbid(unsafe_code)]

//! Runtime: the animation thread, live control, and shutdown.
//!
//! # Role in the workspace
//! `plasma-runtime` turns the pure computations of `plasma-core` into a
//! running animation. It owns every thread and every device handle.
//!
//! # Primary responsibilities
//! - **Shared state**: [`AnimationState`], the single synchronized record of
//!   palette index, gamma, and time step.
//! - **Scheduler**: the `plasma-anim` tick loop ([`Scheduler`]).
//! - **Control surface**: discrete operator [`Command`]s applied with clamping
//!   ([`ControlSurface`]).
//! - **Shutdown**: stop, join, blank, release, exactly once
//!   ([`ShutdownCoordinator`]).
//! - **Displays**: the [`display::Display`] trait and its backends.
//!
//! # Threads
//!
//! | thread           | owner                     | touches                     |
//! |------------------|---------------------------|-----------------------------|
//! | main             | control loop              | state (write), display gamma |
//! | `plasma-anim`    | [`Scheduler`]             | state (read), display frames |
//! | `plasma-signals` | signal listener (unix)    | [`ShutdownCoordinator`]      |

pub mod control;
pub mod display;
pub mod scheduler;
pub mod shutdown;
pub mod state;

pub use control::{
    Applied, Command, CommandSource, ControlSurface, ScriptedCommands, Status, StatusObserver,
};
pub use display::{Display, DisplayError, SharedDisplay};
pub use scheduler::{
    Scheduler, SchedulerConfig, SchedulerError, SchedulerFailure, SchedulerHandle, SchedulerPhase,
    SchedulerReport,
};
#[cfg(unix)]
pub use shutdown::{SignalGuard, install_signal_handler};
pub use shutdown::{ShutdownCoordinator, ShutdownReport};
pub use state::{AnimationParams, AnimationState};
