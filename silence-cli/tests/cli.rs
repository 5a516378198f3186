use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn create_config_json_prints_defaults() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("play-silence"));
    cmd.args(["create", "config-json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""backend": "auto""#))
        .stdout(predicate::str::contains(r#""sample_rate": 44100"#))
        .stdout(predicate::str::contains(r#""command": "aplay""#))
        .stdout(predicate::str::contains(r#""stop_timeout_ms": 1000"#));
}

#[test]
fn unknown_backend_is_a_usage_error() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("play-silence"));
    cmd.args(["--backend", "pyaudio"]).assert().code(2);
}

#[test]
fn zero_sample_rate_fails_before_playing() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("play-silence"));
    cmd.args(["--sample-rate", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("sample_rate"));
}

#[test]
fn zero_stop_timeout_fails_before_playing() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("play-silence"));
    cmd.args([
        "--backend",
        "external-process",
        "--player-command",
        "sh",
        "--stop-timeout-ms",
        "0",
    ])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("stop_timeout_ms"));
}

#[test]
fn oversized_chunk_fails_before_playing() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("play-silence"));
    cmd.args(["--chunk-size", "1000000"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("chunk_size"));
}

#[test]
fn missing_explicit_player_exits_with_failure() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("play-silence"));
    cmd.args([
        "--backend",
        "external-process",
        "--player-command",
        "no-such-silence-player",
    ])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("external-process"));
}

#[cfg(unix)]
mod interrupt {
    use std::path::Path;
    use std::process::{Child, Command, ExitStatus, Stdio};
    use std::thread;
    use std::time::{Duration, Instant};

    fn spawn_with_hanging_player(staging: &Path) -> Child {
        Command::new(assert_cmd::cargo::cargo_bin!("play-silence"))
            .args(["--backend", "external-process", "--player-command", "sh"])
            .arg("--player-arg=-c")
            .arg("--player-arg=sleep 30")
            .arg("--temp-dir")
            .arg(staging)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn play-silence")
    }

    fn wait_with_deadline(child: &mut Child, limit: Duration) -> ExitStatus {
        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = child.try_wait().expect("try_wait") {
                return status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                panic!("play-silence did not exit within {:?}", limit);
            }
            thread::sleep(Duration::from_millis(20));
        }
    }

    fn interrupt_exits_cleanly(signum: libc::c_int) {
        let staging = tempfile::tempdir().expect("staging dir");
        let mut child = spawn_with_hanging_player(staging.path());
        thread::sleep(Duration::from_millis(700));

        unsafe {
            libc::kill(child.id() as libc::pid_t, signum);
        }
        let status = wait_with_deadline(&mut child, Duration::from_secs(5));

        assert_eq!(status.code(), Some(0));
        let leftovers = std::fs::read_dir(staging.path())
            .expect("read staging")
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn sigint_stops_playback_and_cleans_up() {
        interrupt_exits_cleanly(libc::SIGINT);
    }

    #[test]
    fn sigterm_stops_playback_and_cleans_up() {
        interrupt_exits_cleanly(libc::SIGTERM);
    }
}
