#![forbid(unsafe_code)]

//! Operator key bindings and the input sources built on them.

use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use plasma_runtime::{Command, CommandSource};
use tracing::{debug, warn};

/// Single-key bindings, in legend order.
pub const BINDINGS: [(char, Command); 7] = [
    ('e', Command::GammaDecrease),
    ('r', Command::GammaIncrease),
    ('a', Command::TimeStepDecrease),
    ('s', Command::TimeStepIncrease),
    ('q', Command::PalettePrev),
    ('w', Command::PaletteNext),
    ('x', Command::Quit),
];

#[must_use]
pub fn command_for_char(c: char) -> Option<Command> {
    let c = c.to_ascii_lowercase();
    BINDINGS
        .iter()
        .find_map(|(key, command)| (*key == c).then_some(*command))
}

/// Map a terminal key press to a command. Ctrl+C quits.
#[must_use]
pub fn command_for_key(key: &KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => command_for_char(c),
        KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

/// Map one line of headless input: a bound key or a command name.
#[must_use]
pub fn command_for_line(line: &str) -> Option<Command> {
    let line = line.trim();
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => command_for_char(c),
        _ => line.parse().ok(),
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Key presses from the terminal (raw mode).
#[derive(Debug, Default)]
pub struct KeySource;

impl CommandSource for KeySource {
    fn next_command(&mut self, timeout: Duration) -> io::Result<Option<Command>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(command_for_key(&key)),
            _ => Ok(None),
        }
    }
}

/// Spawn a `plasma-stdin` thread that forwards commands read line by line
/// into `tx`.
///
/// The thread is detached: a blocking read on stdin cannot be interrupted,
/// and process exit tears it down. The thread drops `tx` at end of input,
/// so the receiver disconnects once no other sender is alive.
pub fn spawn_line_reader<R>(input: R, tx: mpsc::Sender<Command>) -> io::Result<()>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("plasma-stdin".into())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(error = %err, "input read failed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match command_for_line(&line) {
                    Some(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    None => warn!(input = line.trim(), "unrecognized command"),
                }
            }
            debug!("input closed");
        })?;
    Ok(())
}

/// Commands read line by line from a headless input such as stdin.
///
/// End of input is not a quit. The source holds a sender of its own, so the
/// channel never disconnects and the run lasts until a quit command, a
/// signal, the frame limit, or a display failure.
#[derive(Debug)]
pub struct LineSource {
    rx: mpsc::Receiver<Command>,
    _sender: mpsc::Sender<Command>,
}

impl LineSource {
    pub fn spawn<R>(input: R) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        spawn_line_reader(input, tx.clone())?;
        Ok(Self { rx, _sender: tx })
    }
}

impl CommandSource for LineSource {
    fn next_command(&mut self, timeout: Duration) -> io::Result<Option<Command>> {
        self.rx.next_command(timeout)
    }
}
