//! Property-based tests for state-machine invariants.
//!
//! Uses `proptest` to verify that arbitrary input-event sequences maintain
//! the critical invariants: cursor bounds, parameter clamps, confirm
//! fail-safe default, recording isolation, and the universality of Hold.

use proptest::prelude::*;

use crate::core::config::Config;
use crate::input::{InputEvent, Transport};

use super::model::{AppModel, AppState, ConfirmChoice, ConfirmKind};
use super::update::update;

// ──────────────────── strategies ────────────────────

fn arb_event() -> impl Strategy<Value = InputEvent> {
    prop_oneof![
        Just(InputEvent::Rotate(1)),
        Just(InputEvent::Rotate(-1)),
        Just(InputEvent::Click),
        Just(InputEvent::Hold),
        Just(InputEvent::Button(Transport::Record)),
        Just(InputEvent::Button(Transport::Stop)),
        Just(InputEvent::Button(Transport::Play)),
    ]
}

fn arb_file_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}\\.wav", 0..6)
}

/// Starting points covering states the pure layer cannot reach on its own
/// (the copy menu is entered by the runtime after a directory scan).
fn arb_model() -> impl Strategy<Value = AppModel> {
    (arb_file_names(), any::<bool>(), 0u8..4).prop_map(|(names, mounted, shape)| {
        let mut m = AppModel::new(&Config::default());
        m.volume.mounted = mounted;
        match shape {
            1 => m.enter_settings(),
            2 => m.enter_copy_menu(names),
            3 => m.enter_system_options(),
            _ => {}
        }
        m
    })
}

// prop_assert! early-returns a TestCaseError; the helper mirrors that.
use proptest::test_runner::TestCaseResult;

fn check_invariants(m: &AppModel) -> TestCaseResult {
    let count = m.item_count();
    if count > 0 {
        prop_assert!(m.cursor < count, "cursor {} out of {}", m.cursor, count);
    }
    prop_assert!(m.params.channels >= 1);
    prop_assert!(m.params.channels <= m.max_channels);
    prop_assert!(m.params.rate_index < m.sample_rates.len());
    prop_assert!(m.copy.progress <= 100);
    Ok(())
}

proptest! {
    /// The cursor stays inside `[0, item_count)` and the parameter fields
    /// stay clamped across any event sequence from any reachable start.
    #[test]
    fn invariants_hold_across_event_sequences(
        mut model in arb_model(),
        events in prop::collection::vec(arb_event(), 0..64),
    ) {
        for event in events {
            let _ = update(&mut model, event);
            check_invariants(&model)?;
        }
    }

    /// For every state except Recording, Hold lands in Idle with cursor and
    /// scroll reset.
    #[test]
    fn hold_is_a_universal_cancel(
        mut model in arb_model(),
        events in prop::collection::vec(arb_event(), 0..32),
    ) {
        for event in events {
            let _ = update(&mut model, event);
        }
        if model.state != AppState::Recording {
            let _ = update(&mut model, InputEvent::Hold);
            prop_assert_eq!(model.state, AppState::Idle);
            prop_assert_eq!(model.cursor, 0);
            prop_assert_eq!(model.scroll, 0);
        }
    }

    /// Entering Confirm always resets the option to No, whatever happened
    /// before and whichever context triggered it.
    #[test]
    fn confirm_entry_is_fail_safe(
        mut model in arb_model(),
        events in prop::collection::vec(arb_event(), 0..32),
    ) {
        let mut was_confirm = model.state == AppState::Confirm;
        for event in events {
            let _ = update(&mut model, event);
            let is_confirm = model.state == AppState::Confirm;
            if is_confirm && !was_confirm {
                prop_assert_eq!(model.confirm, ConfirmChoice::No);
            }
            was_confirm = is_confirm;
        }
    }

    /// The pure layer can never put the appliance into Recording — only a
    /// successful capture spawn (runtime) does — and once there, no event
    /// sequence leaves it without the runtime's help.
    #[test]
    fn recording_is_isolated_from_the_event_layer(
        events in prop::collection::vec(arb_event(), 0..48),
    ) {
        let mut model = AppModel::new(&Config::default());
        for event in &events {
            let _ = update(&mut model, *event);
            prop_assert_ne!(model.state, AppState::Recording);
        }

        let mut recording = AppModel::new(&Config::default());
        recording.begin_recording("take.wav".to_string(), std::time::Instant::now());
        for event in &events {
            let _ = update(&mut recording, *event);
            prop_assert_eq!(recording.state, AppState::Recording);
        }
    }

    /// Rotation in Confirm is an involution: two identical rotations restore
    /// the option.
    #[test]
    fn confirm_rotation_is_an_involution(direction in prop_oneof![Just(1i8), Just(-1i8)]) {
        let mut model = AppModel::new(&Config::default());
        model.enter_confirm(ConfirmKind::DeleteAll);
        let before = model.confirm;
        let _ = update(&mut model, InputEvent::Rotate(direction));
        prop_assert_ne!(model.confirm, before);
        let _ = update(&mut model, InputEvent::Rotate(direction));
        prop_assert_eq!(model.confirm, before);
    }
}
