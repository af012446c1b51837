//! Runs the `ledplasma` binary headless and checks its exit codes and
//! output files.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

const PALETTES: &str = "\
Sunset = 0x492d61, 0x048091, 0x61c155,
         0xf2d43f, 0xd1026c,
Mono   = 0x000000, 0xffffff,
";

fn ledplasma() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ledplasma"));
    cmd.env_remove("PLASMA_LOG")
        .env_remove("PLASMA_DISPLAY")
        .env_remove("PLASMA_PALETTE_FILE")
        .stdin(Stdio::null());
    cmd
}

#[test]
fn recording_run_exits_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let palettes = dir.path().join("palettes.txt");
    let out = dir.path().join("plasma.raw");
    let log = dir.path().join("plasma.log");
    fs::write(&palettes, PALETTES).expect("write palettes");

    let status = ledplasma()
        .arg(format!("--display=file:{}", out.display()))
        .arg("--grid=5x4")
        .arg("--tick-ms=1")
        .arg("--frames=8")
        .arg("--palette=Mono")
        .arg(format!("--log-file={}", log.display()))
        .arg("--log-json")
        .arg(&palettes)
        .status()
        .expect("run ledplasma");
    assert!(status.success(), "status: {status:?}");

    let bytes = fs::read(&out).expect("recording");
    let frame_len = 5 * 4 * 3;
    assert_eq!(bytes.len(), frame_len * 9);
    // Mono frames are gray: every LED has equal channels.
    for led in bytes.chunks(3) {
        assert!(led[0] == led[1] && led[1] == led[2], "led {led:?}");
    }

    let log = fs::read_to_string(&log).expect("log file");
    assert!(log.lines().all(|l| l.starts_with('{')), "log: {log}");
    assert!(log.contains("palettes loaded"));
    assert!(log.contains("shutdown complete"));
}

#[test]
fn commands_on_stdin_are_applied_until_quit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let palettes = dir.path().join("palettes.txt");
    fs::write(&palettes, PALETTES).expect("write palettes");

    let mut child = ledplasma()
        .arg("--display=null")
        .arg("--tick-ms=1")
        .arg(&palettes)
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .env("PLASMA_LOG", "debug")
        .spawn()
        .expect("spawn ledplasma");
    {
        let mut stdin = child.stdin.take().expect("piped stdin");
        writeln!(stdin, "w").expect("write");
        writeln!(stdin, "gamma-increase").expect("write");
        writeln!(stdin, "quit").expect("write");
    }
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success(), "status: {:?}", output.status);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("palette-next"), "stderr: {stderr}");
    assert!(stderr.contains("gamma-increase"), "stderr: {stderr}");
}

#[test]
fn closed_stdin_keeps_animating() {
    let dir = tempfile::tempdir().expect("tempdir");
    let palettes = dir.path().join("palettes.txt");
    fs::write(&palettes, PALETTES).expect("write palettes");

    let mut child = ledplasma()
        .arg("--display=null")
        .arg("--tick-ms=1")
        .arg(&palettes)
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn ledplasma");
    thread::sleep(Duration::from_millis(300));
    let exited = child.try_wait().expect("poll child");
    child.kill().expect("kill");
    let _ = child.wait();
    assert!(exited.is_none(), "exited early: {exited:?}");
}

#[test]
fn bad_palette_file_exits_with_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let palettes = dir.path().join("palettes.txt");
    fs::write(&palettes, "Lonely = 0x123456,").expect("write palettes");

    let output = ledplasma()
        .arg("--display=null")
        .arg(&palettes)
        .output()
        .expect("run ledplasma");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Lonely"), "stderr: {stderr}");
}

#[test]
fn unknown_flag_exits_with_usage_hint() {
    let output = ledplasma()
        .arg("--sparkle")
        .output()
        .expect("run ledplasma");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown argument: --sparkle"), "stderr: {stderr}");
    assert!(stderr.contains("--help"));
}

#[test]
fn help_exits_zero() {
    let output = ledplasma().arg("--help").output().expect("run ledplasma");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("USAGE:"));
}
