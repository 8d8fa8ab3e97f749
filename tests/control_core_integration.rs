//! End-to-end exercises of the control core through the public API: a full
//! user journey over the state machine, a copy run against real directories,
//! and a composed frame pushed through the panel transaction builder.

use std::fs;
use std::time::Instant;

use parking_lot::Mutex;

use wavedeck::app::screens;
use wavedeck::logger::jsonl::ActivityLog;
use wavedeck::prelude::*;
use wavedeck::render::icons::BuiltinIcons;
use wavedeck::tasks::copy::run_copy;

/// A user walks the whole menu tree and backs out with Hold at each depth.
#[test]
fn menu_journey_ends_in_idle() {
    let mut m = AppModel::new(&Config::default());
    m.volume.mounted = true;
    m.volume.capacity_label = "16GB".to_string();

    // Idle → Settings.
    assert_eq!(update(&mut m, InputEvent::Click), None);
    assert_eq!(m.state, AppState::Settings);

    // Tune the capture parameters in place.
    update(&mut m, InputEvent::Rotate(1));
    assert_eq!(m.sample_rate(), 96_000);
    update(&mut m, InputEvent::Rotate(-1));
    assert_eq!(m.sample_rate(), 48_000);

    // Down to System Options, into a confirmation, decline it.
    m.cursor = 3;
    update(&mut m, InputEvent::Click);
    assert_eq!(m.state, AppState::SystemOptions);
    update(&mut m, InputEvent::Click);
    assert_eq!(m.state, AppState::Confirm);
    assert_eq!(m.confirm, ConfirmChoice::No);
    assert_eq!(update(&mut m, InputEvent::Click), None, "No must decline");
    assert_eq!(m.state, AppState::Idle);

    // Menu re-entry starts from a clean cursor.
    update(&mut m, InputEvent::Click);
    assert_eq!(m.cursor, 0);
    update(&mut m, InputEvent::Hold);
    assert_eq!(m.state, AppState::Idle);
}

/// Copy flow end to end: menu entry, per-file toggling, worker run.
#[test]
fn copy_flow_moves_selected_files() {
    let src = tempfile::tempdir().expect("src");
    let dst = tempfile::tempdir().expect("dst");
    for name in ["one.wav", "two.wav", "three.wav"] {
        fs::write(src.path().join(name), b"RIFF").expect("fixture");
    }

    let mut m = AppModel::new(&Config::default());
    m.volume.mounted = true;
    m.enter_copy_menu(vec![
        "one.wav".to_string(),
        "three.wav".to_string(),
        "two.wav".to_string(),
    ]);

    // Deselect the middle entry, then start.
    m.cursor = 4;
    update(&mut m, InputEvent::Click);
    m.cursor = 0;
    assert_eq!(update(&mut m, InputEvent::Click), Some(Command::StartCopy));
    assert_eq!(m.state, AppState::Copying);

    let model = Mutex::new(m);
    run_copy(&model, src.path(), dst.path(), &ActivityLog::new(None));

    assert!(dst.path().join("one.wav").exists());
    assert!(!dst.path().join("three.wav").exists());
    assert!(dst.path().join("two.wav").exists());
    let m = model.lock();
    assert_eq!(m.copy.progress, 100);
    assert_eq!(m.state, AppState::Idle);
}

/// A composed frame travels the full pipeline into one panel transaction.
#[test]
fn composed_frame_becomes_one_panel_transaction() {
    #[derive(Default)]
    struct CountingBus {
        commands: usize,
        data_bytes: usize,
    }
    impl PanelBus for CountingBus {
        fn reset(&mut self) -> Result<()> {
            Ok(())
        }
        fn command(&mut self, _bytes: &[u8]) -> Result<()> {
            self.commands += 1;
            Ok(())
        }
        fn data(&mut self, bytes: &[u8]) -> Result<()> {
            self.data_bytes += bytes.len();
            Ok(())
        }
    }

    let mut model = AppModel::new(&Config::default());
    model.volume.free_bytes = 8 << 30;

    let mut fb = FrameBuffer::new();
    let mut shaper = MonoShaper;
    screens::compose(&mut fb, &mut shaper, &BuiltinIcons, &mut model, Instant::now());

    let mut panel = Panel::new(CountingBus::default());
    panel.present(&fb).expect("present");
    // Addressing (columns, rows, write-RAM) then the packed payload.
    assert_eq!(panel.bus().commands, 3);
    assert_eq!(panel.bus().data_bytes, PANEL_WIDTH * PANEL_HEIGHT / 2);
}
