// Minimal integration test that drives the compiled binary through a PTY.
// This exercises the real event loop and crossterm input handling across
// the main boundaries without relying on internal modules.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Marked Unix-only and ignored by default to avoid CI/platform issues.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_session_starts_round_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("reflex");
    let log = tempfile::NamedTempFile::new()?;
    let cmd = format!(
        "{} --name tester --min-delay-ms 50 --max-delay-ms 60 --log-file {}",
        bin.display(),
        log.path().display()
    );

    // Spawn the TUI inside a pseudo terminal
    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    // Start a round, wait past the cue, react
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("z")?;
    std::thread::sleep(Duration::from_millis(200));

    // ESC quits from any state
    p.send("\x1b")?;
    p.expect(Eof)?;

    let logged = std::fs::read_to_string(log.path())?;
    assert!(logged.contains("score_recorded"));
    Ok(())
}
