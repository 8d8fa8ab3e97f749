//! Pure update function: the application state machine.
//!
//! `update()` takes the model and one input event, mutates the model, and
//! returns the side-effect the runtime should execute. Every state transition
//! goes through this function — zero I/O happens here, which is what makes
//! the transition table deterministic and testable.

use crate::input::{InputEvent, Transport};

use super::model::{
    AppModel, AppState, COPY_ITEM_CLEAR_ALL, COPY_ITEM_SELECT_ALL, COPY_ITEM_START,
    COPY_FIXED_ITEMS, ConfirmChoice, ConfirmKind, MenuContext, SettingsItem, SystemItem,
};

/// Side effects requested by the state machine, executed by the runtime
/// outside the model's critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Scan the record directory and enter the copy menu over the result.
    OpenCopyMenu,
    /// Spawn the capture process; the model transitions only on success.
    StartRecording,
    /// Gracefully terminate the capture process, then return to Idle.
    StopRecording,
    /// Launch the copy worker for the current selection.
    StartCopy,
    /// Run a confirmed maintenance action.
    Maintenance(ConfirmKind),
}

/// Apply one event. Returns at most one command for the runtime.
pub fn update(model: &mut AppModel, event: InputEvent) -> Option<Command> {
    match event {
        InputEvent::Rotate(direction) => {
            handle_rotate(model, direction);
            None
        }
        InputEvent::Click => handle_click(model),
        InputEvent::Hold => {
            handle_hold(model);
            None
        }
        InputEvent::Button(button) => handle_button(model, button),
    }
}

fn handle_rotate(model: &mut AppModel, direction: i8) {
    match model.state {
        AppState::Settings => match SettingsItem::from_index(model.cursor) {
            Some(SettingsItem::SampleRate) => {
                let count = model.sample_rates.len();
                model.params.cycle_rate(direction, count);
            }
            Some(SettingsItem::Channels) => {
                let max = model.max_channels;
                model.params.adjust_channels(direction, max);
            }
            _ => model.navigate(direction),
        },
        AppState::CopyFiles | AppState::SystemOptions => model.navigate(direction),
        // Any rotation flips the option, direction sign is irrelevant.
        AppState::Confirm => model.confirm = model.confirm.toggled(),
        AppState::Idle
        | AppState::Recording
        | AppState::Copying
        | AppState::NetworkInfo => {}
    }
}

fn handle_click(model: &mut AppModel) -> Option<Command> {
    match model.state {
        AppState::Idle => {
            model.enter_settings();
            None
        }
        AppState::Settings => settings_click(model),
        AppState::CopyFiles => copy_files_click(model),
        AppState::SystemOptions => {
            system_options_click(model);
            None
        }
        AppState::Confirm => confirm_click(model),
        // Recording suppresses all menu entry; Copying and NetworkInfo only
        // react to Hold.
        AppState::Recording | AppState::Copying | AppState::NetworkInfo => None,
    }
}

fn settings_click(model: &mut AppModel) -> Option<Command> {
    match SettingsItem::from_index(model.cursor)? {
        // Rotation-edited fields are inert on click.
        SettingsItem::SampleRate | SettingsItem::Channels => None,
        SettingsItem::CopyFiles => {
            // Silent no-op without a target volume; the runtime scans the
            // record directory and completes the transition.
            model.volume.mounted.then_some(Command::OpenCopyMenu)
        }
        SettingsItem::SystemOptions => {
            model.enter_system_options();
            None
        }
        SettingsItem::NetworkInfo => {
            model.enter_network_info();
            None
        }
        SettingsItem::Exit => {
            model.go_idle();
            None
        }
    }
}

fn copy_files_click(model: &mut AppModel) -> Option<Command> {
    match model.cursor {
        COPY_ITEM_START => {
            if !model.volume.mounted {
                return None;
            }
            model.begin_copy();
            Some(Command::StartCopy)
        }
        COPY_ITEM_SELECT_ALL => {
            model.files.select_all();
            None
        }
        COPY_ITEM_CLEAR_ALL => {
            model.files.clear_all();
            None
        }
        index => {
            model.files.toggle(index - COPY_FIXED_ITEMS);
            None
        }
    }
}

fn system_options_click(model: &mut AppModel) {
    let Some(item) = SystemItem::from_index(model.cursor) else {
        return;
    };
    match item {
        SystemItem::DeleteAll => model.enter_confirm(ConfirmKind::DeleteAll),
        SystemItem::FormatVolume => {
            if model.volume.mounted {
                model.enter_confirm(ConfirmKind::FormatVolume);
            }
        }
        SystemItem::Shutdown => model.enter_confirm(ConfirmKind::Shutdown),
        SystemItem::Restart => model.enter_confirm(ConfirmKind::Restart),
        SystemItem::Exit => model.enter_settings(),
    }
}

fn confirm_click(model: &mut AppModel) -> Option<Command> {
    let MenuContext::Confirm(kind) = model.menu else {
        model.go_idle();
        return None;
    };
    let command =
        (model.confirm == ConfirmChoice::Yes).then_some(Command::Maintenance(kind));
    // Back to Idle whether confirmed or declined.
    model.go_idle();
    command
}

fn handle_hold(model: &mut AppModel) {
    match model.state {
        // Request cooperative cancellation; the worker observes the flag
        // before its next file.
        AppState::Copying => {
            model.copy.cancel_requested = true;
            model.go_idle();
        }
        // Hold never interrupts a recording and is meaningless in standby.
        AppState::Recording | AppState::Idle => {}
        AppState::Settings
        | AppState::CopyFiles
        | AppState::SystemOptions
        | AppState::NetworkInfo
        | AppState::Confirm => model.go_idle(),
    }
}

fn handle_button(model: &mut AppModel, button: Transport) -> Option<Command> {
    match button {
        // Honored only in standby: starting while recording is impossible
        // by construction.
        Transport::Record => (model.state == AppState::Idle).then_some(Command::StartRecording),
        Transport::Stop => (model.state == AppState::Recording).then_some(Command::StopRecording),
        Transport::Play => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use std::time::Instant;

    fn model() -> AppModel {
        AppModel::new(&Config::default())
    }

    fn model_with_volume() -> AppModel {
        let mut m = model();
        m.volume.mounted = true;
        m.volume.capacity_label = "16GB".to_string();
        m
    }

    // ──────────────────── hold semantics ────────────────────

    #[test]
    fn hold_returns_every_menu_state_to_idle() {
        for setup in [
            |m: &mut AppModel| m.enter_settings(),
            |m: &mut AppModel| m.enter_copy_menu(vec!["a.wav".into()]),
            |m: &mut AppModel| m.enter_system_options(),
            |m: &mut AppModel| m.enter_network_info(),
            |m: &mut AppModel| m.enter_confirm(ConfirmKind::DeleteAll),
        ] {
            let mut m = model();
            setup(&mut m);
            m.cursor = m.item_count().saturating_sub(1);
            m.scroll = 1;
            assert_eq!(update(&mut m, InputEvent::Hold), None);
            assert_eq!(m.state, AppState::Idle);
            assert_eq!(m.cursor, 0);
            assert_eq!(m.scroll, 0);
        }
    }

    #[test]
    fn hold_never_interrupts_a_recording() {
        let mut m = model();
        m.begin_recording("take.wav".into(), Instant::now());
        update(&mut m, InputEvent::Hold);
        assert_eq!(m.state, AppState::Recording);
    }

    #[test]
    fn hold_while_copying_requests_cancel_and_idles() {
        let mut m = model_with_volume();
        m.begin_copy();
        update(&mut m, InputEvent::Hold);
        assert!(m.copy.cancel_requested);
        assert_eq!(m.state, AppState::Idle);
    }

    // ──────────────────── recording gating ────────────────────

    #[test]
    fn record_button_is_honored_only_in_idle() {
        let mut m = model();
        assert_eq!(
            update(&mut m, InputEvent::Button(Transport::Record)),
            Some(Command::StartRecording)
        );

        m.begin_recording("take.wav".into(), Instant::now());
        assert_eq!(update(&mut m, InputEvent::Button(Transport::Record)), None);

        let mut m = model();
        m.enter_settings();
        assert_eq!(update(&mut m, InputEvent::Button(Transport::Record)), None);
    }

    #[test]
    fn stop_button_is_honored_only_while_recording() {
        let mut m = model();
        assert_eq!(update(&mut m, InputEvent::Button(Transport::Stop)), None);
        m.begin_recording("take.wav".into(), Instant::now());
        assert_eq!(
            update(&mut m, InputEvent::Button(Transport::Stop)),
            Some(Command::StopRecording)
        );
    }

    #[test]
    fn recording_suppresses_all_menu_entry() {
        let mut m = model();
        m.begin_recording("take.wav".into(), Instant::now());
        update(&mut m, InputEvent::Click);
        update(&mut m, InputEvent::Rotate(1));
        update(&mut m, InputEvent::Rotate(-1));
        update(&mut m, InputEvent::Hold);
        assert_eq!(m.state, AppState::Recording);
    }

    #[test]
    fn play_button_is_reserved() {
        let mut m = model();
        assert_eq!(update(&mut m, InputEvent::Button(Transport::Play)), None);
        assert_eq!(m.state, AppState::Idle);
    }

    // ──────────────────── settings screen ────────────────────

    #[test]
    fn click_in_idle_opens_settings() {
        let mut m = model();
        assert_eq!(update(&mut m, InputEvent::Click), None);
        assert_eq!(m.state, AppState::Settings);
        assert_eq!(m.cursor, 0);
    }

    #[test]
    fn rotation_on_rate_item_cycles_rates_in_place() {
        let mut m = model();
        m.enter_settings();
        assert_eq!(m.sample_rate(), 48_000);
        update(&mut m, InputEvent::Rotate(1));
        assert_eq!(m.sample_rate(), 96_000);
        assert_eq!(m.cursor, 0, "value edit must not move the cursor");
        update(&mut m, InputEvent::Rotate(-1));
        update(&mut m, InputEvent::Rotate(-1));
        assert_eq!(m.sample_rate(), 44_100);
    }

    #[test]
    fn rotation_on_channel_item_adjusts_in_place() {
        let mut m = model();
        m.enter_settings();
        m.cursor = 1;
        update(&mut m, InputEvent::Rotate(1));
        assert_eq!(m.params.channels, 3);
        update(&mut m, InputEvent::Rotate(-1));
        update(&mut m, InputEvent::Rotate(-1));
        assert_eq!(m.params.channels, 1);
        // Clamped at the floor.
        update(&mut m, InputEvent::Rotate(-1));
        assert_eq!(m.params.channels, 1);
    }

    #[test]
    fn rotation_on_other_items_navigates() {
        let mut m = model();
        m.enter_settings();
        m.cursor = 3;
        update(&mut m, InputEvent::Rotate(1));
        assert_eq!(m.cursor, 4);
        assert_eq!(m.params.channels, 2, "navigation must not edit values");
    }

    #[test]
    fn copy_files_item_is_gated_on_volume_presence() {
        let mut m = model();
        m.enter_settings();
        m.cursor = 2;
        assert_eq!(update(&mut m, InputEvent::Click), None);
        assert_eq!(m.state, AppState::Settings, "no volume: silent no-op");

        let mut m = model_with_volume();
        m.enter_settings();
        m.cursor = 2;
        assert_eq!(update(&mut m, InputEvent::Click), Some(Command::OpenCopyMenu));
    }

    #[test]
    fn settings_click_dispatch() {
        let mut m = model();
        m.enter_settings();
        // Rotation-edited rows are inert on click.
        for cursor in [0, 1] {
            m.cursor = cursor;
            assert_eq!(update(&mut m, InputEvent::Click), None);
            assert_eq!(m.state, AppState::Settings);
        }
        m.cursor = 3;
        update(&mut m, InputEvent::Click);
        assert_eq!(m.state, AppState::SystemOptions);
        assert_eq!(m.menu, MenuContext::SystemOptions);

        let mut m = model();
        m.enter_settings();
        m.cursor = 4;
        update(&mut m, InputEvent::Click);
        assert_eq!(m.state, AppState::NetworkInfo);

        let mut m = model();
        m.enter_settings();
        m.cursor = 5;
        update(&mut m, InputEvent::Click);
        assert_eq!(m.state, AppState::Idle);
    }

    // ──────────────────── copy menu ────────────────────

    fn copy_menu(files: &[&str]) -> AppModel {
        let mut m = model_with_volume();
        m.enter_copy_menu(files.iter().map(|s| (*s).to_string()).collect());
        m
    }

    #[test]
    fn start_copy_transitions_and_requests_worker() {
        let mut m = copy_menu(&["a.wav", "b.wav"]);
        assert_eq!(update(&mut m, InputEvent::Click), Some(Command::StartCopy));
        assert_eq!(m.state, AppState::Copying);
        assert_eq!(m.copy.progress, 0);
        assert!(m.copy.active);
        assert!(!m.copy.cancel_requested);
    }

    #[test]
    fn start_copy_without_volume_is_ignored() {
        let mut m = copy_menu(&["a.wav"]);
        // Volume vanished between menu entry and the click.
        m.volume.mounted = false;
        assert_eq!(update(&mut m, InputEvent::Click), None);
        assert_eq!(m.state, AppState::CopyFiles);
    }

    #[test]
    fn bulk_select_and_per_file_toggles() {
        let mut m = copy_menu(&["a.wav", "b.wav", "c.wav"]);
        m.cursor = COPY_ITEM_CLEAR_ALL;
        update(&mut m, InputEvent::Click);
        assert!(m.files.selected_names().is_empty());

        m.cursor = COPY_ITEM_SELECT_ALL;
        update(&mut m, InputEvent::Click);
        assert_eq!(m.files.selected_names().len(), 3);

        // Item 3 is the first file row.
        m.cursor = COPY_FIXED_ITEMS + 1;
        update(&mut m, InputEvent::Click);
        assert_eq!(m.files.selected_names(), vec!["a.wav", "c.wav"]);
        update(&mut m, InputEvent::Click);
        assert_eq!(m.files.selected_names().len(), 3);
    }

    #[test]
    fn copy_menu_cursor_wraps_over_files() {
        let mut m = copy_menu(&["a.wav", "b.wav"]);
        for _ in 0..m.item_count() {
            update(&mut m, InputEvent::Rotate(1));
        }
        assert_eq!(m.cursor, 0);
        update(&mut m, InputEvent::Rotate(-1));
        assert_eq!(m.cursor, m.item_count() - 1);
    }

    // ──────────────────── system options and confirm ────────────────────

    #[test]
    fn destructive_items_route_through_confirm_with_no_default() {
        let cases = [
            (0, ConfirmKind::DeleteAll),
            (2, ConfirmKind::Shutdown),
            (3, ConfirmKind::Restart),
        ];
        for (cursor, kind) in cases {
            let mut m = model();
            m.enter_system_options();
            m.cursor = cursor;
            m.confirm = ConfirmChoice::Yes; // stale value from a previous visit
            assert_eq!(update(&mut m, InputEvent::Click), None);
            assert_eq!(m.state, AppState::Confirm);
            assert_eq!(m.menu, MenuContext::Confirm(kind));
            assert_eq!(m.confirm, ConfirmChoice::No, "confirm must reset to No");
        }
    }

    #[test]
    fn format_requires_a_mounted_volume() {
        let mut m = model();
        m.enter_system_options();
        m.cursor = 1;
        update(&mut m, InputEvent::Click);
        assert_eq!(m.state, AppState::SystemOptions);

        let mut m = model_with_volume();
        m.enter_system_options();
        m.cursor = 1;
        update(&mut m, InputEvent::Click);
        assert_eq!(m.menu, MenuContext::Confirm(ConfirmKind::FormatVolume));
    }

    #[test]
    fn system_options_exit_returns_to_settings() {
        let mut m = model();
        m.enter_system_options();
        m.cursor = 4;
        update(&mut m, InputEvent::Click);
        assert_eq!(m.state, AppState::Settings);
    }

    #[test]
    fn confirm_rotation_toggles_regardless_of_direction() {
        let mut m = model();
        m.enter_confirm(ConfirmKind::Restart);
        update(&mut m, InputEvent::Rotate(1));
        assert_eq!(m.confirm, ConfirmChoice::Yes);
        update(&mut m, InputEvent::Rotate(1));
        assert_eq!(m.confirm, ConfirmChoice::No);
        update(&mut m, InputEvent::Rotate(-1));
        assert_eq!(m.confirm, ConfirmChoice::Yes);
    }

    #[test]
    fn confirm_click_executes_only_on_yes_then_always_idles() {
        let mut m = model();
        m.enter_confirm(ConfirmKind::DeleteAll);
        assert_eq!(update(&mut m, InputEvent::Click), None, "default No declines");
        assert_eq!(m.state, AppState::Idle);

        let mut m = model();
        m.enter_confirm(ConfirmKind::DeleteAll);
        update(&mut m, InputEvent::Rotate(1));
        assert_eq!(
            update(&mut m, InputEvent::Click),
            Some(Command::Maintenance(ConfirmKind::DeleteAll))
        );
        assert_eq!(m.state, AppState::Idle);
    }

    // ──────────────────── inert states ────────────────────

    #[test]
    fn idle_rotation_is_inert() {
        let mut m = model();
        update(&mut m, InputEvent::Rotate(1));
        update(&mut m, InputEvent::Rotate(-1));
        assert_eq!(m.state, AppState::Idle);
        assert_eq!(m.cursor, 0);
    }

    #[test]
    fn network_info_only_exits_via_hold() {
        let mut m = model();
        m.enter_network_info();
        update(&mut m, InputEvent::Click);
        update(&mut m, InputEvent::Rotate(1));
        assert_eq!(m.state, AppState::NetworkInfo);
        update(&mut m, InputEvent::Hold);
        assert_eq!(m.state, AppState::Idle);
    }

    #[test]
    fn copying_ignores_click_and_rotation() {
        let mut m = model_with_volume();
        m.begin_copy();
        update(&mut m, InputEvent::Click);
        update(&mut m, InputEvent::Rotate(1));
        assert_eq!(m.state, AppState::Copying);
        assert!(!m.copy.cancel_requested);
    }
}
