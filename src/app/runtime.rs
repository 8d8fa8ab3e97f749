//! Runtime wiring: channels, worker threads, the dispatch loop.
//!
//! Architecture: one process with a fixed thread set —
//! - **Dispatch thread** (this module): drains the input-event channel,
//!   applies the state machine, executes commands, and composes/transmits
//!   frames on the render tick.
//! - **Input sampler**: polls the GPIO lines at ~1 ms and fires events into
//!   an unbounded channel (never blocks on dispatch).
//! - **Status poller**: volume presence, capacity, link state at ~1 s.
//! - **One-shot workers**: copy runs, recording stop, maintenance actions.
//!
//! All shared state is the single `AppModel` behind one lock. Event handling
//! and frame composition are discrete critical sections; panel I/O happens
//! after the lock is released.

use std::fs;
use std::mem;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use crossbeam_channel::{select, tick, unbounded};
use parking_lot::Mutex;

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::input::InputEvent;
use crate::input::sampler::{InputLines, spawn_sampler};
use crate::logger::jsonl::{ActivityLog, EventType, LogEntry, Severity};
use crate::render::framebuffer::FrameBuffer;
use crate::render::icons::BuiltinIcons;
use crate::render::panel::{Panel, PanelBus, SpiPanelBus};
use crate::render::text::MonoShaper;
use crate::tasks::copy::spawn_copy_task;
use crate::tasks::recorder::{CaptureRequest, CaptureSession, recording_file_name};
use crate::tasks::volume::spawn_status_poller;

use super::model::{AppModel, ConfirmKind};
use super::screens;
use super::signals::SignalHandler;
use super::update::{Command, update};

/// Consecutive panel failures between stderr reports.
const PANEL_REPORT_EVERY: u32 = 50;

/// Bring up the hardware, spawn the workers, and run the dispatch loop until
/// a shutdown signal arrives. Fatal initialization errors propagate; the
/// caller reports and aborts.
pub fn run(cfg: Config) -> Result<()> {
    let log = Arc::new(ActivityLog::new(cfg.paths.activity_log.clone()));
    log.event(EventType::DaemonStart, Severity::Info, None);

    let model = Arc::new(Mutex::new(AppModel::new(&cfg)));
    let shutdown = Arc::new(AtomicBool::new(false));
    let signals = SignalHandler::new();

    // Fatal acquisitions: no controls or no display means no appliance.
    let lines = InputLines::acquire(&cfg.input)?;
    let bus = SpiPanelBus::open(&cfg.panel, &cfg.input.gpio_chip)?;
    let mut panel = Panel::new(bus);
    panel.init()?;

    let (event_tx, event_rx) = unbounded::<InputEvent>();
    let sampler = spawn_sampler(lines, &cfg.timing, event_tx, Arc::clone(&shutdown));
    let poller = spawn_status_poller(
        Arc::clone(&model),
        cfg.paths.clone(),
        Duration::from_millis(cfg.timing.status_poll_ms),
        Arc::clone(&shutdown),
    );

    let render_interval = Duration::from_millis(cfg.timing.render_tick_ms);
    let mut controller = Controller::new(cfg, model, Arc::clone(&log));
    let ticks = tick(render_interval);

    loop {
        if signals.should_shutdown() {
            break;
        }
        select! {
            recv(event_rx) -> event => match event {
                Ok(event) => controller.dispatch(event),
                // Sampler gone: the appliance has lost its controls.
                Err(_) => break,
            },
            recv(ticks) -> _ => controller.render_tick(&mut panel),
            default(Duration::from_millis(200)) => {}
        }
    }

    eprintln!("[WVD-DAEMON] shutdown requested");
    shutdown.store(true, Ordering::Relaxed);

    // Stop an active capture on the way out so no orphan keeps recording.
    let session = mem::replace(&mut controller.session, CaptureSession::Stopped);
    if session.is_running()
        && let Err(e) = session.stop()
    {
        eprintln!("[WVD-DAEMON] capture stop during shutdown: {e}");
    }

    let _ = sampler.join();
    let _ = poller.join();
    log.event(EventType::DaemonStop, Severity::Info, None);
    Ok(())
}

/// Owns the capture session, the frame assets, and the command execution.
struct Controller {
    cfg: Config,
    model: Arc<Mutex<AppModel>>,
    log: Arc<ActivityLog>,
    session: CaptureSession,
    fb: FrameBuffer,
    shaper: MonoShaper,
    icons: BuiltinIcons,
    panel_failures: u32,
}

impl Controller {
    fn new(cfg: Config, model: Arc<Mutex<AppModel>>, log: Arc<ActivityLog>) -> Self {
        Self {
            cfg,
            model,
            log,
            session: CaptureSession::NotStarted,
            fb: FrameBuffer::new(),
            shaper: MonoShaper,
            icons: BuiltinIcons,
            panel_failures: 0,
        }
    }

    /// One event: mutate the model inside the critical section, execute the
    /// resulting command after the lock is released.
    fn dispatch(&mut self, event: InputEvent) {
        let command = {
            let mut m = self.model.lock();
            update(&mut m, event)
        };
        if let Some(command) = command {
            self.execute(command);
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::OpenCopyMenu => self.open_copy_menu(),
            Command::StartRecording => self.start_recording(),
            Command::StopRecording => self.stop_recording(),
            Command::StartCopy => {
                let _worker = spawn_copy_task(
                    Arc::clone(&self.model),
                    self.cfg.paths.record_dir.clone(),
                    self.cfg.paths.volume_mount.clone(),
                    Arc::clone(&self.log),
                );
            }
            Command::Maintenance(kind) => self.run_maintenance(kind),
        }
    }

    /// Compose under the lock, transmit outside it. A failed transaction is
    /// logged and the frame skipped; the next tick retries with fresh state.
    fn render_tick<B: PanelBus>(&mut self, panel: &mut Panel<B>) {
        {
            let mut m = self.model.lock();
            screens::compose(&mut self.fb, &mut self.shaper, &self.icons, &mut m, Instant::now());
        }
        match panel.present(&self.fb) {
            Ok(()) => self.panel_failures = 0,
            Err(e) => {
                if self.panel_failures == 0 {
                    self.log.event(
                        EventType::PanelSkipped,
                        Severity::Warning,
                        Some(e.to_string()),
                    );
                }
                if self.panel_failures % PANEL_REPORT_EVERY == 0 {
                    eprintln!("[WVD-PANEL] frame skipped: {e}");
                }
                self.panel_failures = self.panel_failures.saturating_add(1);
            }
        }
    }

    fn open_copy_menu(&self) {
        let names = list_recordings(&self.cfg.paths.record_dir);
        self.model.lock().enter_copy_menu(names);
    }

    fn start_recording(&mut self) {
        let (sample_rate, channels) = {
            let m = self.model.lock();
            (m.sample_rate(), m.params.channels)
        };
        let file_name = recording_file_name(&Local::now(), channels, sample_rate);
        let target = self.cfg.paths.record_dir.join(&file_name);

        if let Err(e) = fs::create_dir_all(&self.cfg.paths.record_dir) {
            self.log.log(
                &LogEntry::new(EventType::Error, Severity::Critical)
                    .with_path(self.cfg.paths.record_dir.display().to_string())
                    .with_detail(format!("record dir unavailable: {e}")),
            );
            return;
        }

        let request = CaptureRequest {
            sample_rate,
            channels,
            command: self.cfg.audio.capture_command.clone(),
            workdir: self.cfg.audio.capture_workdir.clone(),
            target: target.clone(),
        };
        match CaptureSession::spawn(&request) {
            Ok(session) => {
                self.session = session;
                self.model.lock().begin_recording(file_name, Instant::now());
                self.log.log(
                    &LogEntry::new(EventType::RecordingStarted, Severity::Info)
                        .with_path(target.display().to_string())
                        .with_detail(format!("{channels}ch {sample_rate}Hz")),
                );
            }
            Err(e) => {
                // No partial session: the state stays Idle.
                eprintln!("[WVD-CTRL] {e}");
                self.log.event(EventType::Error, Severity::Critical, Some(e.to_string()));
            }
        }
    }

    /// Stop consumes the session and runs as a one-shot worker: the state
    /// returns to Idle when the process has actually exited, and the render
    /// cadence never waits on it.
    fn stop_recording(&mut self) {
        let session = mem::replace(&mut self.session, CaptureSession::Stopped);
        if !session.is_running() {
            return;
        }
        let target = session.target().map(Path::to_path_buf);
        let model = Arc::clone(&self.model);
        let log = Arc::clone(&self.log);

        let spawned = thread::Builder::new()
            .name("wvd-capture-stop".to_string())
            .spawn(move || {
                if let Err(e) = session.stop() {
                    // Reported, non-fatal: the appliance returns to standby.
                    eprintln!("[WVD-CAPTURE] {e}");
                    log.event(EventType::Error, Severity::Warning, Some(e.to_string()));
                }
                model.lock().finish_recording();
                let mut entry = LogEntry::new(EventType::RecordingStopped, Severity::Info);
                if let Some(target) = target {
                    entry = entry.with_path(target.display().to_string());
                }
                log.log(&entry);
            });
        if let Err(e) = spawned {
            eprintln!("[WVD-CTRL] stop worker spawn failed: {e}");
            self.model.lock().finish_recording();
        }
    }

    fn run_maintenance(&self, kind: ConfirmKind) {
        let record_dir = self.cfg.paths.record_dir.clone();
        let mount = self.cfg.paths.volume_mount.clone();
        let device = self.cfg.paths.format_device.clone();
        let log = Arc::clone(&self.log);

        let spawned = thread::Builder::new()
            .name("wvd-maintenance".to_string())
            .spawn(move || {
                match kind {
                    ConfirmKind::DeleteAll => delete_all_recordings(&record_dir, &log),
                    ConfirmKind::FormatVolume => format_volume(&mount, &device, &log),
                    ConfirmKind::Shutdown => {
                        log.event(EventType::Maintenance, Severity::Info, Some("shutdown".into()));
                        run_system_command("sudo", &["shutdown", "-h", "now"]);
                    }
                    ConfirmKind::Restart => {
                        log.event(EventType::Maintenance, Severity::Info, Some("restart".into()));
                        run_system_command("sudo", &["reboot"]);
                    }
                }
            });
        if let Err(e) = spawned {
            eprintln!("[WVD-CTRL] maintenance worker spawn failed: {e}");
        }
    }
}

/// Sorted `.wav` basenames under the record directory. A missing or
/// unreadable directory is an empty list, not an error.
fn list_recordings(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name().into_string().ok()?;
            name.ends_with(".wav").then_some(name)
        })
        .collect();
    names.sort();
    names
}

fn delete_all_recordings(dir: &Path, log: &ActivityLog) {
    let names = list_recordings(dir);
    let total = names.len();
    for name in names {
        let path = dir.join(&name);
        if let Err(e) = fs::remove_file(&path) {
            log.log(
                &LogEntry::new(EventType::Error, Severity::Warning)
                    .with_path(path.display().to_string())
                    .with_detail(format!("delete failed: {e}")),
            );
        }
    }
    log.event(
        EventType::Maintenance,
        Severity::Info,
        Some(format!("delete-all: {total} recordings")),
    );
}

fn format_volume(mount: &Path, device: &Path, log: &ActivityLog) {
    log.event(
        EventType::Maintenance,
        Severity::Critical,
        Some(format!("format {}", device.display())),
    );
    run_system_command("sudo", &["umount", &mount.display().to_string()]);
    run_system_command(
        "sudo",
        &["mkfs.vfat", "-F", "32", &device.display().to_string()],
    );
    // Give the kernel a moment to settle before the poller re-probes.
    thread::sleep(Duration::from_secs(2));
}

fn run_system_command(program: &str, args: &[&str]) {
    match std::process::Command::new(program).args(args).status() {
        Ok(status) if !status.success() => {
            eprintln!("[WVD-MAINT] {program} {args:?} exited with {status}");
        }
        Ok(_) => {}
        Err(e) => eprintln!("[WVD-MAINT] {program} {args:?} failed to run: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::model::AppState;
    use crate::input::Transport;

    fn controller_with(cfg: Config) -> Controller {
        let model = Arc::new(Mutex::new(AppModel::new(&cfg)));
        Controller::new(cfg, model, Arc::new(ActivityLog::new(None)))
    }

    fn wait_for_state(model: &Mutex<AppModel>, wanted: AppState) -> bool {
        for _ in 0..100 {
            if model.lock().state == wanted {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn list_recordings_filters_and_sorts() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["b.wav", "a.wav", "notes.txt", "c.WAV"] {
            fs::write(dir.path().join(name), b"x").expect("fixture");
        }
        assert_eq!(list_recordings(dir.path()), vec!["a.wav", "b.wav"]);
        assert!(list_recordings(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn delete_all_removes_only_recordings() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["a.wav", "b.wav", "keep.txt"] {
            fs::write(dir.path().join(name), b"x").expect("fixture");
        }
        delete_all_recordings(dir.path(), &ActivityLog::new(None));
        assert!(!dir.path().join("a.wav").exists());
        assert!(!dir.path().join("b.wav").exists());
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn record_press_spawns_capture_and_enters_recording() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = Config::default();
        cfg.paths.record_dir = dir.path().to_path_buf();
        cfg.audio.capture_command = "exec sleep 30 #".to_string();
        cfg.audio.capture_workdir = dir.path().to_path_buf();

        let mut ctrl = controller_with(cfg);
        ctrl.dispatch(InputEvent::Button(Transport::Record));
        {
            let m = ctrl.model.lock();
            assert_eq!(m.state, AppState::Recording);
            assert!(m.recording.file_name.starts_with("recording_"));
            assert!(m.recording.file_name.ends_with("_ch2_48kHz.wav"));
        }
        assert!(ctrl.session.is_running());

        // A second Record press while recording is ignored by construction.
        ctrl.dispatch(InputEvent::Button(Transport::Record));
        assert_eq!(ctrl.model.lock().state, AppState::Recording);

        ctrl.dispatch(InputEvent::Button(Transport::Stop));
        assert!(
            wait_for_state(&ctrl.model, AppState::Idle),
            "stop worker must return the appliance to Idle"
        );
        assert!(!ctrl.session.is_running());
    }

    #[test]
    fn failed_spawn_leaves_idle_with_no_session() {
        let mut cfg = Config::default();
        cfg.paths.record_dir = tempfile::tempdir().expect("tempdir").keep();
        cfg.audio.capture_workdir = std::path::PathBuf::from("/definitely/not/a/workdir");

        let mut ctrl = controller_with(cfg.clone());
        ctrl.dispatch(InputEvent::Button(Transport::Record));
        assert_eq!(ctrl.model.lock().state, AppState::Idle);
        assert!(!ctrl.session.is_running());
        let _ = fs::remove_dir_all(&cfg.paths.record_dir);
    }

    #[test]
    fn open_copy_menu_scans_the_record_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.wav"), b"x").expect("fixture");
        let mut cfg = Config::default();
        cfg.paths.record_dir = dir.path().to_path_buf();

        let ctrl = controller_with(cfg);
        ctrl.model.lock().volume.mounted = true;
        ctrl.open_copy_menu();
        let m = ctrl.model.lock();
        assert_eq!(m.state, AppState::CopyFiles);
        assert_eq!(m.files.len(), 1);
        assert!(m.files.is_selected(0));
    }

    #[test]
    fn render_tick_skips_failed_frames_and_retries() {
        struct FlakyBus {
            fail: bool,
            frames: u32,
        }
        impl PanelBus for FlakyBus {
            fn reset(&mut self) -> Result<()> {
                Ok(())
            }
            fn command(&mut self, _bytes: &[u8]) -> Result<()> {
                Ok(())
            }
            fn data(&mut self, _bytes: &[u8]) -> Result<()> {
                if self.fail {
                    return Err(crate::core::errors::WvdError::PanelIo {
                        details: "injected".to_string(),
                    });
                }
                self.frames += 1;
                Ok(())
            }
        }

        let mut ctrl = controller_with(Config::default());
        let mut panel = Panel::new(FlakyBus {
            fail: true,
            frames: 0,
        });
        ctrl.render_tick(&mut panel);
        assert_eq!(ctrl.panel_failures, 1, "failed frame recorded, not fatal");

        // Deferred retry succeeds on the next tick.
        // (Direct field access stands in for the bus recovering.)
        ctrl_panel_recover(&mut panel);
        ctrl.render_tick(&mut panel);
        assert_eq!(ctrl.panel_failures, 0);

        fn ctrl_panel_recover(panel: &mut Panel<FlakyBus>) {
            // Mutably reach the test bus through a fresh transaction cycle.
            // Panel has no bus_mut accessor in production; rebuild instead.
            let frames = panel.bus().frames;
            *panel = Panel::new(FlakyBus {
                fail: false,
                frames,
            });
        }
    }
}
