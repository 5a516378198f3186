//! Command-line player backend.
//!
//! Every iteration stages one second of silence as a WAV file, hands it to
//! the player command with a bounded wait, and removes the file again.

use std::env;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::{Availability, BackendError, BackendKind, BackendProvider, SilenceBackend};
use crate::audio::wav::stage_wav;
use crate::audio::{PcmFormat, SilenceBuffer};
use crate::settings::PlayerSettings;
use crate::tools::sleep_while;

const SOUND_SECONDS: f64 = 1.0;
const WAIT_POLL: Duration = Duration::from_millis(20);

/// The external player invocation: `command [args...] <file.wav>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPlayer {
    pub command: String,
    pub args: Vec<String>,
    /// Longest a single invocation may run before it is killed.
    pub timeout: Duration,
}

impl ExternalPlayer {
    pub fn from_settings(settings: &PlayerSettings) -> Self {
        Self {
            command: settings.command.clone(),
            args: settings.args.clone(),
            timeout: Duration::from_millis(settings.timeout_ms),
        }
    }

    /// Locate the command the way a shell would.
    pub fn resolve(&self) -> Option<PathBuf> {
        resolve_command(&self.command)
    }
}

fn resolve_command(command: &str) -> Option<PathBuf> {
    let path = Path::new(command);
    if path.is_absolute() || path.components().count() > 1 {
        return is_executable(path).then(|| path.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(command))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

/// How a single player invocation ended.
#[derive(Debug)]
enum PlayOutcome {
    Finished(ExitStatus),
    TimedOut,
    Cancelled,
}

/// Kills and reaps the child unless it already exited.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(err) = self.child.kill() {
            debug!("failed to kill player process: {}", err);
        }
        let _ = self.child.wait();
    }
}

/// Plays staged WAV files through an external command.
pub struct ExternalProcessBackend {
    player: ExternalPlayer,
    format: PcmFormat,
    temp_dir: Option<PathBuf>,
}

impl ExternalProcessBackend {
    /// # Arguments
    /// * `player` - Command invocation and bounded wait.
    /// * `sample_rate` - Rate declared in the staged WAV header.
    /// * `temp_dir` - Staging directory; the system temp dir when `None`.
    pub fn new(player: ExternalPlayer, sample_rate: u32, temp_dir: Option<PathBuf>) -> Self {
        Self {
            player,
            format: PcmFormat::stereo_16(sample_rate),
            temp_dir,
        }
    }

    fn play_file(
        &self,
        path: &Path,
        should_continue: &dyn Fn() -> bool,
    ) -> Result<PlayOutcome, BackendError> {
        let child = Command::new(&self.player.command)
            .args(&self.player.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => BackendError::Runtime(format!(
                    "`{}` command not found",
                    self.player.command
                )),
                _ => BackendError::Runtime(format!(
                    "failed to start `{}`: {}",
                    self.player.command, err
                )),
            })?;
        let mut guard = ChildGuard {
            child,
            reaped: false,
        };

        let deadline = Instant::now() + self.player.timeout;
        loop {
            if let Some(status) = guard.child.try_wait()? {
                guard.reaped = true;
                return Ok(PlayOutcome::Finished(status));
            }
            if !should_continue() {
                return Ok(PlayOutcome::Cancelled);
            }
            if Instant::now() >= deadline {
                return Ok(PlayOutcome::TimedOut);
            }
            thread::sleep(WAIT_POLL);
        }
    }
}

impl SilenceBackend for ExternalProcessBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ExternalProcess
    }

    fn run(&mut self, should_continue: &dyn Fn() -> bool) -> Result<(), BackendError> {
        let silence = SilenceBuffer::seconds(self.format, SOUND_SECONDS);
        info!(
            "Playing silence through `{}` at {}Hz",
            self.player.command, self.format.sample_rate
        );

        while should_continue() {
            let started = Instant::now();
            let staged = stage_wav(&silence, self.temp_dir.as_deref())?;
            let outcome = self.play_file(staged.path(), should_continue);
            if let Err(err) = staged.close() {
                warn!("failed to remove staged silence file: {}", err);
            }

            match outcome? {
                PlayOutcome::Finished(status) if status.success() => continue,
                PlayOutcome::Finished(status) => {
                    debug!("`{}` exited with {}", self.player.command, status);
                }
                PlayOutcome::TimedOut => {
                    debug!(
                        "`{}` still running after {:?}; moving on",
                        self.player.command, self.player.timeout
                    );
                }
                PlayOutcome::Cancelled => break,
            }

            // Failed or cut-short runs are kept to one attempt per second.
            let slot = Duration::from_secs_f64(SOUND_SECONDS);
            sleep_while(slot.saturating_sub(started.elapsed()), should_continue);
        }

        debug!("external player loop finished");
        Ok(())
    }
}

/// Provider for [`ExternalProcessBackend`].
pub struct ExternalProcessProvider {
    player: ExternalPlayer,
    sample_rate: u32,
    temp_dir: Option<PathBuf>,
}

impl ExternalProcessProvider {
    pub fn new(player: ExternalPlayer, sample_rate: u32, temp_dir: Option<PathBuf>) -> Self {
        Self {
            player,
            sample_rate,
            temp_dir,
        }
    }
}

impl BackendProvider for ExternalProcessProvider {
    fn kind(&self) -> BackendKind {
        BackendKind::ExternalProcess
    }

    fn probe(&self) -> Availability {
        match self.player.resolve() {
            Some(_) => Availability::Available,
            None => Availability::Missing(format!(
                "`{}` command not found; install it or pass --player-command",
                self.player.command
            )),
        }
    }

    fn construct(&self) -> Result<Box<dyn SilenceBackend>, BackendError> {
        if let Availability::Missing(reason) = self.probe() {
            return Err(BackendError::Unavailable(reason));
        }
        if let Some(dir) = &self.temp_dir {
            if !dir.is_dir() {
                return Err(BackendError::Io(std::io::Error::new(
                    ErrorKind::NotFound,
                    format!("staging directory {} does not exist", dir.display()),
                )));
            }
        }

        Ok(Box::new(ExternalProcessBackend::new(
            self.player.clone(),
            self.sample_rate,
            self.temp_dir.clone(),
        )))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    fn shell_player(script: &str, timeout: Duration) -> ExternalPlayer {
        ExternalPlayer {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            timeout,
        }
    }

    fn dir_is_empty(dir: &Path) -> bool {
        fs::read_dir(dir).expect("read dir").next().is_none()
    }

    /// Run `backend` on a thread, lower the flag after `run_for`, and return
    /// the backend result plus how long shutdown took.
    fn run_for(
        mut backend: ExternalProcessBackend,
        run_for: Duration,
    ) -> (Result<(), BackendError>, Duration) {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::spawn(move || backend.run(&move || flag.load(Ordering::SeqCst)));

        thread::sleep(run_for);
        let stop_requested = Instant::now();
        running.store(false, Ordering::SeqCst);
        let result = handle.join().expect("backend thread panicked");
        (result, stop_requested.elapsed())
    }

    #[test]
    fn stop_kills_a_hanging_player_and_removes_staged_file() {
        let staging = tempfile::tempdir().expect("staging dir");
        let backend = ExternalProcessBackend::new(
            shell_player("sleep 100", Duration::from_secs(2)),
            44_100,
            Some(staging.path().to_path_buf()),
        );

        let (result, shutdown) = run_for(backend, Duration::from_millis(300));

        assert!(result.is_ok());
        assert!(shutdown < Duration::from_secs(1));
        assert!(dir_is_empty(staging.path()));
    }

    #[test]
    fn timed_out_runs_are_benign_and_paced() {
        let staging = tempfile::tempdir().expect("staging dir");
        let scratch = tempfile::tempdir().expect("scratch dir");
        let counter = scratch.path().join("count");
        let script = format!("echo x >> '{}'; sleep 100", counter.display());
        let backend = ExternalProcessBackend::new(
            shell_player(&script, Duration::from_millis(100)),
            8_000,
            Some(staging.path().to_path_buf()),
        );

        let (result, _) = run_for(backend, Duration::from_millis(1_500));

        assert!(result.is_ok());
        let invocations = fs::read_to_string(&counter).expect("counter file");
        let count = invocations.lines().count();
        // 100 ms timeouts would allow over a dozen runs without pacing.
        assert!((2..=3).contains(&count), "{} invocations", count);
        assert!(dir_is_empty(staging.path()));
    }

    #[test]
    fn player_receives_a_one_second_stereo_wav() {
        let staging = tempfile::tempdir().expect("staging dir");
        let scratch = tempfile::tempdir().expect("scratch dir");
        let copy = scratch.path().join("copy.wav");
        let script = format!("cp \"$0\" '{}'", copy.display());
        let backend = ExternalProcessBackend::new(
            shell_player(&script, Duration::from_secs(2)),
            16_000,
            Some(staging.path().to_path_buf()),
        );

        let (result, _) = run_for(backend, Duration::from_millis(300));

        assert!(result.is_ok());
        let reader = hound::WavReader::open(&copy).expect("copied wav");
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.duration(), 16_000);
        assert!(dir_is_empty(staging.path()));
    }

    #[test]
    fn missing_command_is_fatal_for_the_backend() {
        let staging = tempfile::tempdir().expect("staging dir");
        let mut backend = ExternalProcessBackend::new(
            ExternalPlayer {
                command: "/nonexistent/play-silence-player".to_string(),
                args: Vec::new(),
                timeout: Duration::from_secs(2),
            },
            44_100,
            Some(staging.path().to_path_buf()),
        );

        let result = backend.run(&|| true);

        assert!(matches!(result, Err(BackendError::Runtime(_))));
        assert!(dir_is_empty(staging.path()));
    }

    #[test]
    fn provider_probes_the_command() {
        let present = ExternalProcessProvider::new(
            shell_player("true", Duration::from_secs(2)),
            44_100,
            None,
        );
        assert!(present.is_available());

        let absent = ExternalProcessProvider::new(
            ExternalPlayer {
                command: "play-silence-no-such-player".to_string(),
                args: Vec::new(),
                timeout: Duration::from_secs(2),
            },
            44_100,
            None,
        );
        assert!(matches!(absent.probe(), Availability::Missing(_)));
        assert!(matches!(
            absent.construct(),
            Err(BackendError::Unavailable(_))
        ));
    }

    #[test]
    fn provider_rejects_missing_staging_dir() {
        let provider = ExternalProcessProvider::new(
            shell_player("true", Duration::from_secs(2)),
            44_100,
            Some(PathBuf::from("/nonexistent/play-silence-staging")),
        );

        assert!(matches!(provider.construct(), Err(BackendError::Io(_))));
    }
}
