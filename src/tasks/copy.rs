//! Cancellable copy worker.
//!
//! Copies the selected recordings one file at a time, publishing progress
//! after each file and polling the cancellation flag before each transfer.
//! A single file failure is logged and skipped; the run continues. An empty
//! selection ends immediately with progress untouched.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::app::model::{AppModel, AppState};
use crate::logger::jsonl::{ActivityLog, EventType, LogEntry, Severity};

/// Spawn the worker thread for the current selection.
pub fn spawn_copy_task(
    model: Arc<Mutex<AppModel>>,
    src_dir: PathBuf,
    dst_dir: PathBuf,
    log: Arc<ActivityLog>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("wvd-copy".to_string())
        .spawn(move || run_copy(&model, &src_dir, &dst_dir, &log))
        .expect("spawning the copy worker thread cannot fail")
}

/// The worker body. Runs to completion, early cancellation, or empty-selection
/// no-op; always releases the run and restores `Idle` unless the user already
/// navigated away.
pub fn run_copy(model: &Mutex<AppModel>, src_dir: &Path, dst_dir: &Path, log: &ActivityLog) {
    let selected = model.lock().files.selected_names();

    if selected.is_empty() {
        let mut m = model.lock();
        m.copy.active = false;
        if m.state == AppState::Copying {
            m.go_idle();
        }
        return;
    }

    let total = selected.len();
    let mut copied: u64 = 0;
    for (index, name) in selected.iter().enumerate() {
        if model.lock().copy.cancel_requested {
            break;
        }

        let src = src_dir.join(name);
        let dst = dst_dir.join(name);
        match fs::copy(&src, &dst) {
            Ok(bytes) => copied += bytes,
            Err(e) => {
                log.log(
                    &LogEntry::new(EventType::Error, Severity::Warning)
                        .with_path(src.display().to_string())
                        .with_detail(format!("copy failed, file skipped: {e}")),
                );
            }
        }

        let progress = ((index + 1) * 100 / total) as u8;
        model.lock().copy.progress = progress;
    }

    let cancelled;
    {
        let mut m = model.lock();
        cancelled = m.copy.cancel_requested;
        m.copy.active = false;
        // On cancellation the Hold handler has already restored Idle; avoid
        // clobbering whatever screen the user reached since.
        if m.state == AppState::Copying {
            m.go_idle();
        }
    }

    if cancelled {
        log.event(
            EventType::CopyCancelled,
            Severity::Info,
            Some(format!("{total} selected")),
        );
    } else {
        log.log(
            &LogEntry::new(EventType::CopyCompleted, Severity::Info)
                .with_size(copied)
                .with_detail(format!("{total} files")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;

    fn copy_fixture(names: &[&str]) -> (tempfile::TempDir, tempfile::TempDir, Mutex<AppModel>) {
        let src = tempfile::tempdir().expect("src dir");
        let dst = tempfile::tempdir().expect("dst dir");
        for name in names {
            fs::write(src.path().join(name), b"RIFFdata").expect("fixture file");
        }
        let mut m = AppModel::new(&Config::default());
        m.volume.mounted = true;
        m.enter_copy_menu(names.iter().map(|s| (*s).to_string()).collect());
        m.begin_copy();
        (src, dst, Mutex::new(m))
    }

    #[test]
    fn copies_selection_and_reaches_exactly_100() {
        let (src, dst, model) = copy_fixture(&["a.wav", "b.wav", "c.wav"]);
        run_copy(&model, src.path(), dst.path(), &ActivityLog::new(None));

        for name in ["a.wav", "b.wav", "c.wav"] {
            assert!(dst.path().join(name).exists());
        }
        let m = model.lock();
        assert_eq!(m.copy.progress, 100);
        assert!(!m.copy.active);
        assert_eq!(m.state, AppState::Idle);
    }

    #[test]
    fn deselected_files_are_not_copied() {
        let (src, dst, model) = copy_fixture(&["a.wav", "b.wav"]);
        model.lock().files.toggle(1);
        run_copy(&model, src.path(), dst.path(), &ActivityLog::new(None));

        assert!(dst.path().join("a.wav").exists());
        assert!(!dst.path().join("b.wav").exists());
        assert_eq!(model.lock().copy.progress, 100);
    }

    #[test]
    fn empty_selection_is_a_no_op_run() {
        let (src, dst, model) = copy_fixture(&["a.wav"]);
        model.lock().files.clear_all();
        run_copy(&model, src.path(), dst.path(), &ActivityLog::new(None));

        let m = model.lock();
        assert_eq!(m.copy.progress, 0, "progress must never start");
        assert!(!m.copy.active);
        assert_eq!(m.state, AppState::Idle);
        assert!(!dst.path().join("a.wav").exists());
    }

    #[test]
    fn cancellation_before_first_file_copies_nothing() {
        let (src, dst, model) = copy_fixture(&["a.wav", "b.wav"]);
        {
            // Hold during Copying: flag set, screen already back to Idle.
            let mut m = model.lock();
            m.copy.cancel_requested = true;
            m.go_idle();
        }
        run_copy(&model, src.path(), dst.path(), &ActivityLog::new(None));

        assert!(!dst.path().join("a.wav").exists());
        let m = model.lock();
        assert_eq!(m.copy.progress, 0);
        assert!(!m.copy.active);
        assert_eq!(m.state, AppState::Idle);
    }

    #[test]
    fn single_file_failure_is_skipped() {
        let (src, dst, model) = copy_fixture(&["a.wav", "missing.wav"]);
        fs::remove_file(src.path().join("missing.wav")).expect("remove fixture");
        run_copy(&model, src.path(), dst.path(), &ActivityLog::new(None));

        assert!(dst.path().join("a.wav").exists());
        let m = model.lock();
        assert_eq!(m.copy.progress, 100, "the run continues past a bad file");
        assert_eq!(m.state, AppState::Idle);
    }

    #[test]
    fn worker_does_not_clobber_a_screen_entered_after_cancel() {
        let (src, dst, model) = copy_fixture(&["a.wav"]);
        {
            let mut m = model.lock();
            m.copy.cancel_requested = true;
            m.go_idle();
            m.enter_settings();
        }
        run_copy(&model, src.path(), dst.path(), &ActivityLog::new(None));
        assert_eq!(model.lock().state, AppState::Settings);
    }
}
