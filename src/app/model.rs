//! Application state model.
//!
//! All mutable UI state lives in [`AppModel`], guarded by the controller's
//! single lock. The model is deterministic and does no I/O: input events
//! mutate it through `update()`, background tasks write their published
//! fields under the same lock, and the render step only reads.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::time::Instant;

use crate::core::config::Config;

// ──────────────────── states ────────────────────

/// Operating mode of the appliance. Exactly one is active at any instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AppState {
    /// Standby; entry point of every cancel path.
    #[default]
    Idle,
    /// Capture process running. Only a Stop press leaves this state.
    Recording,
    /// Top-level settings menu.
    Settings,
    /// File selection for the copy-to-volume operation.
    CopyFiles,
    /// Copy task running with progress display.
    Copying,
    /// Destructive/system actions menu.
    SystemOptions,
    /// Read-only network details.
    NetworkInfo,
    /// Binary Yes/No gate in front of a pending action.
    Confirm,
}

/// Which confirmation is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmKind {
    DeleteAll,
    FormatVolume,
    Shutdown,
    Restart,
}

/// Which menu flavor populated the current screen. Set on entry, read when
/// rendering and when resolving a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuContext {
    Settings,
    CopyFiles,
    SystemOptions,
    NetworkInfo,
    Confirm(ConfirmKind),
}

/// Binary confirmation option. Reset to `No` on every Confirm entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfirmChoice {
    #[default]
    No,
    Yes,
}

impl ConfirmChoice {
    /// Any rotation flips the option regardless of direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::No => Self::Yes,
            Self::Yes => Self::No,
        }
    }
}

// ──────────────────── menu items ────────────────────

/// Rows of the settings menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsItem {
    SampleRate,
    Channels,
    CopyFiles,
    SystemOptions,
    NetworkInfo,
    Exit,
}

impl SettingsItem {
    pub const COUNT: usize = 6;

    /// Resolve a cursor index to a row. `None` for out-of-range.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::SampleRate),
            1 => Some(Self::Channels),
            2 => Some(Self::CopyFiles),
            3 => Some(Self::SystemOptions),
            4 => Some(Self::NetworkInfo),
            5 => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Rows of the system options menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemItem {
    DeleteAll,
    FormatVolume,
    Shutdown,
    Restart,
    Exit,
}

impl SystemItem {
    pub const COUNT: usize = 5;

    /// Resolve a cursor index to a row. `None` for out-of-range.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::DeleteAll),
            1 => Some(Self::FormatVolume),
            2 => Some(Self::Shutdown),
            3 => Some(Self::Restart),
            4 => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Fixed rows at the top of the copy menu; file rows follow at
/// `COPY_FIXED_ITEMS + i`.
pub const COPY_ITEM_START: usize = 0;
pub const COPY_ITEM_SELECT_ALL: usize = 1;
pub const COPY_ITEM_CLEAR_ALL: usize = 2;
pub const COPY_FIXED_ITEMS: usize = 3;

// ──────────────────── value fields ────────────────────

/// Capture parameters, rotation-edited in place on the settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingParams {
    /// Index into the ordered sample-rate list.
    pub rate_index: usize,
    pub channels: u16,
}

impl RecordingParams {
    /// Cycle through the rate list, wrapping at both ends.
    pub fn cycle_rate(&mut self, direction: i8, rate_count: usize) {
        debug_assert!(rate_count > 0);
        if direction > 0 {
            self.rate_index = (self.rate_index + 1) % rate_count;
        } else {
            self.rate_index = self.rate_index.checked_sub(1).unwrap_or(rate_count - 1);
        }
    }

    /// Adjust the channel count, clamped to `[1, max]`.
    pub fn adjust_channels(&mut self, direction: i8, max: u16) {
        self.channels = if direction > 0 {
            self.channels.saturating_add(1).min(max)
        } else {
            self.channels.saturating_sub(1).max(1)
        };
    }
}

/// Recording-file names and their copy-selection flags. Rebuilt on every
/// copy-menu entry; never persisted.
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    names: Vec<String>,
    selected: HashMap<String, bool>,
}

impl FileSelection {
    /// Replace the set with `names`, every file selected.
    pub fn rebuild(&mut self, names: Vec<String>) {
        self.selected = names.iter().map(|n| (n.clone(), true)).collect();
        self.names = names;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.names
            .get(index)
            .is_some_and(|n| self.selected.get(n).copied().unwrap_or(false))
    }

    pub fn select_all(&mut self) {
        for flag in self.selected.values_mut() {
            *flag = true;
        }
    }

    pub fn clear_all(&mut self) {
        for flag in self.selected.values_mut() {
            *flag = false;
        }
    }

    /// Flip one file's flag; out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) {
        if let Some(name) = self.names.get(index)
            && let Some(flag) = self.selected.get_mut(name)
        {
            *flag = !*flag;
        }
    }

    /// Names currently marked for copy, in display order.
    #[must_use]
    pub fn selected_names(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| self.selected.get(*n).copied().unwrap_or(false))
            .cloned()
            .collect()
    }
}

/// Progress surface of the running copy task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyState {
    /// 0–100, non-decreasing within one run.
    pub progress: u8,
    /// Cooperative cancellation flag, polled between file transfers.
    pub cancel_requested: bool,
    /// A worker currently owns the run.
    pub active: bool,
}

/// Published by the status poller; read-only for the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeStatus {
    pub mounted: bool,
    /// Power-of-two rounded capacity, e.g. "16GB". Empty when unmounted.
    pub capacity_label: String,
    /// Free bytes at the active recording target.
    pub free_bytes: u64,
}

/// Published by the status poller alongside the volume state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkStatus {
    pub connected: bool,
    pub summary: String,
    pub details: Vec<String>,
}

/// Display-only view of the active recording session. The process handle
/// itself stays with the supervisor.
#[derive(Debug, Clone, Default)]
pub struct RecordingInfo {
    pub started_at: Option<Instant>,
    pub file_name: String,
}

// ──────────────────── the model ────────────────────

/// The single state aggregate behind the controller's lock.
#[derive(Debug, Clone)]
pub struct AppModel {
    pub state: AppState,
    pub menu: MenuContext,
    /// Selection cursor, always within `[0, item_count())` for menu states.
    pub cursor: usize,
    /// Scroll offset keeping the cursor inside the visible window.
    pub scroll: usize,
    pub confirm: ConfirmChoice,
    pub params: RecordingParams,
    pub sample_rates: Vec<u32>,
    pub max_channels: u16,
    pub files: FileSelection,
    pub copy: CopyState,
    pub volume: VolumeStatus,
    pub network: NetworkStatus,
    pub recording: RecordingInfo,
}

impl AppModel {
    /// Fresh model in `Idle`, seeded from configuration.
    #[must_use]
    pub fn new(cfg: &Config) -> Self {
        Self {
            state: AppState::Idle,
            menu: MenuContext::Settings,
            cursor: 0,
            scroll: 0,
            confirm: ConfirmChoice::No,
            params: RecordingParams {
                rate_index: cfg.audio.default_rate_index,
                channels: cfg.audio.default_channels,
            },
            sample_rates: cfg.audio.sample_rates.clone(),
            max_channels: cfg.audio.max_channels,
            files: FileSelection::default(),
            copy: CopyState::default(),
            volume: VolumeStatus::default(),
            network: NetworkStatus::default(),
            recording: RecordingInfo::default(),
        }
    }

    /// Currently selected sample rate in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rates[self.params.rate_index.min(self.sample_rates.len() - 1)]
    }

    /// Number of selectable rows in the active menu; 0 for non-menu states.
    #[must_use]
    pub fn item_count(&self) -> usize {
        match self.state {
            AppState::Settings => SettingsItem::COUNT,
            AppState::CopyFiles => COPY_FIXED_ITEMS + self.files.len(),
            AppState::SystemOptions => SystemItem::COUNT,
            _ => 0,
        }
    }

    /// Move the cursor by one row, wrapping past either end.
    pub fn navigate(&mut self, direction: i8) {
        let count = self.item_count();
        if count == 0 {
            return;
        }
        self.cursor = if direction > 0 {
            (self.cursor + 1) % count
        } else if self.cursor == 0 {
            count - 1
        } else {
            self.cursor - 1
        };
    }

    /// Return to `Idle` with cursor and scroll reset.
    pub fn go_idle(&mut self) {
        self.state = AppState::Idle;
        self.cursor = 0;
        self.scroll = 0;
    }

    pub fn enter_settings(&mut self) {
        self.state = AppState::Settings;
        self.menu = MenuContext::Settings;
        self.cursor = 0;
        self.scroll = 0;
    }

    /// Enter the copy menu over a freshly scanned file list.
    pub fn enter_copy_menu(&mut self, names: Vec<String>) {
        self.files.rebuild(names);
        self.state = AppState::CopyFiles;
        self.menu = MenuContext::CopyFiles;
        self.cursor = 0;
        self.scroll = 0;
    }

    pub fn enter_system_options(&mut self) {
        self.state = AppState::SystemOptions;
        self.menu = MenuContext::SystemOptions;
        self.cursor = 0;
        self.scroll = 0;
    }

    pub fn enter_network_info(&mut self) {
        self.state = AppState::NetworkInfo;
        self.menu = MenuContext::NetworkInfo;
        self.cursor = 0;
        self.scroll = 0;
    }

    /// Enter the confirmation gate. The option always starts at `No`.
    pub fn enter_confirm(&mut self, kind: ConfirmKind) {
        self.state = AppState::Confirm;
        self.menu = MenuContext::Confirm(kind);
        self.confirm = ConfirmChoice::No;
    }

    /// Mark the copy run started: progress zeroed, cancellation cleared.
    pub fn begin_copy(&mut self) {
        self.state = AppState::Copying;
        self.copy = CopyState {
            progress: 0,
            cancel_requested: false,
            active: true,
        };
    }

    /// Record a successful capture spawn.
    pub fn begin_recording(&mut self, file_name: String, now: Instant) {
        self.state = AppState::Recording;
        self.recording = RecordingInfo {
            started_at: Some(now),
            file_name,
        };
    }

    /// The capture process has exited; back to standby.
    pub fn finish_recording(&mut self) {
        self.recording = RecordingInfo::default();
        self.go_idle();
    }
}

/// Scroll-offset recomputation: keep `cursor` inside a `window`-row view,
/// clamped so the offset never runs past `total - window`.
#[must_use]
pub fn scroll_window(cursor: usize, current: usize, total: usize, window: usize) -> usize {
    let mut offset = current;
    if cursor < offset {
        offset = cursor;
    } else if cursor + 1 > offset + window {
        offset = cursor + 1 - window;
    }
    offset.min(total.saturating_sub(window))
}
