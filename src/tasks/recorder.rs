//! Capture-process supervision.
//!
//! The external capture program writes the PCM container; this module only
//! owns its lifecycle. [`CaptureSession`] is an explicit session type — the
//! supervisor is the sole holder of the process handle, and stopping consumes
//! it, so a stale handle cannot be signalled twice.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Instant;

use chrono::{DateTime, Local};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use crate::core::errors::{Result, WvdError};

/// Everything needed to start one capture run.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count, 1–128.
    pub channels: u16,
    /// Command template invoked via `sh -c` with `sample_rate=<rate>` in
    /// scope and the channel count appended.
    pub command: String,
    /// Working directory for the capture process.
    pub workdir: PathBuf,
    /// The file the capture program is expected to produce.
    pub target: PathBuf,
}

/// Recording file name derived from the wall clock and capture parameters,
/// e.g. `recording_20260807_153000_ch2_48kHz.wav`.
#[must_use]
pub fn recording_file_name(now: &DateTime<Local>, channels: u16, sample_rate: u32) -> String {
    format!(
        "recording_{}_ch{}_{}kHz.wav",
        now.format("%Y%m%d_%H%M%S"),
        channels,
        sample_rate / 1000
    )
}

/// Lifecycle of the external capture process.
#[derive(Debug)]
pub enum CaptureSession {
    /// No capture has run yet.
    NotStarted,
    /// Process spawned and assumed recording.
    Running {
        child: Child,
        target: PathBuf,
        started_at: Instant,
    },
    /// A previous capture was stopped.
    Stopped,
}

impl CaptureSession {
    /// Spawn the capture process. On failure no session exists — the caller's
    /// state stays wherever it was.
    pub fn spawn(req: &CaptureRequest) -> Result<Self> {
        let shell_line = format!(
            "sample_rate={} {} {}",
            req.sample_rate, req.command, req.channels
        );
        let child = Command::new("sh")
            .arg("-c")
            .arg(&shell_line)
            .current_dir(&req.workdir)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| WvdError::CaptureSpawn {
                details: format!("{shell_line}: {e}"),
            })?;

        Ok(Self::Running {
            child,
            target: req.target.clone(),
            started_at: Instant::now(),
        })
    }

    /// Whether a process is currently owned.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// The file the running capture writes, if any.
    #[must_use]
    pub fn target(&self) -> Option<&Path> {
        match self {
            Self::Running { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Request graceful termination and wait for the process to exit.
    ///
    /// Consumes the session. Blocks for as long as the capture program takes
    /// to flush and exit — callers run this off the render cadence. Errors
    /// are reported but non-fatal; the appliance returns to standby anyway.
    pub fn stop(self) -> Result<()> {
        let Self::Running { mut child, .. } = self else {
            return Ok(());
        };

        let pid = Pid::from_raw(child.id() as i32);
        if let Err(e) = kill(pid, Signal::SIGTERM) {
            // The process may already have exited; still reap it below.
            eprintln!("[WVD-CAPTURE] SIGTERM delivery failed: {e}");
        }

        match child.wait() {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(WvdError::CaptureStop {
                details: format!("capture exited with {status}"),
            }),
            Err(e) => Err(WvdError::CaptureStop {
                details: format!("wait failed: {e}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_encodes_timestamp_and_parameters() {
        let when = Local.with_ymd_and_hms(2026, 8, 7, 15, 30, 0).unwrap();
        assert_eq!(
            recording_file_name(&when, 2, 48_000),
            "recording_20260807_153000_ch2_48kHz.wav"
        );
        assert_eq!(
            recording_file_name(&when, 128, 192_000),
            "recording_20260807_153000_ch128_192kHz.wav"
        );
    }

    #[test]
    fn spawn_failure_yields_no_session() {
        let req = CaptureRequest {
            sample_rate: 48_000,
            channels: 2,
            command: "./save_to_file".to_string(),
            workdir: PathBuf::from("/definitely/not/a/workdir"),
            target: PathBuf::from("/rec/x.wav"),
        };
        let err = CaptureSession::spawn(&req).unwrap_err();
        assert_eq!(err.code(), "WVD-3101");
        assert!(!err.is_retryable());
    }

    #[test]
    fn stop_terminates_a_long_running_capture() {
        // The trailing '#' comments out the appended channel count.
        let req = CaptureRequest {
            sample_rate: 48_000,
            channels: 2,
            command: "exec sleep 30 #".to_string(),
            workdir: PathBuf::from("."),
            target: PathBuf::from("/tmp/wvd-test.wav"),
        };
        let session = CaptureSession::spawn(&req).expect("spawn sleep");
        assert!(session.is_running());
        assert_eq!(session.target(), Some(Path::new("/tmp/wvd-test.wav")));

        // SIGTERM makes sleep exit with a signal status, reported non-fatally.
        let outcome = session.stop();
        assert!(outcome.is_err());
        assert!(outcome.unwrap_err().is_retryable());
    }

    #[test]
    fn stop_on_an_idle_session_is_a_no_op() {
        assert!(CaptureSession::NotStarted.stop().is_ok());
        assert!(CaptureSession::Stopped.stop().is_ok());
    }

    #[test]
    fn stop_after_clean_exit_succeeds() {
        let req = CaptureRequest {
            sample_rate: 48_000,
            channels: 2,
            command: "exec true #".to_string(),
            workdir: PathBuf::from("."),
            target: PathBuf::from("/tmp/wvd-test.wav"),
        };
        let session = CaptureSession::spawn(&req).expect("spawn true");
        // Give the short-lived process a moment to exit cleanly.
        std::thread::sleep(std::time::Duration::from_millis(100));
        assert!(session.stop().is_ok());
    }
}
