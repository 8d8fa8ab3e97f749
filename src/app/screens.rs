//! Frame composition: turns the model into pixels.
//!
//! Pure drawing against the in-memory framebuffer — the runtime transmits the
//! finished frame outside the model lock. Layout mirrors the panel: a 12-row
//! status strip on menu screens, full-bleed layouts for the recording,
//! copy-progress, and confirmation overlays.

use std::time::Instant;

use crate::render::framebuffer::FrameBuffer;
use crate::render::icons::{Icon, IconRasterizer, IconSize, icon_or_fallback};
use crate::render::text::{self, FontContext, TextShaper};

use super::model::{
    AppModel, AppState, COPY_FIXED_ITEMS, ConfirmChoice, ConfirmKind, MenuContext, scroll_window,
};

/// Capture bit depth shown in the status bar.
const BITS_PER_SAMPLE: u32 = 32;

/// Menu rows visible below a header.
const MENU_WINDOW: usize = 3;
/// File rows visible below the fixed copy-menu items.
const COPY_FILE_WINDOW: usize = 2;

/// Left margin for menu rows.
const MENU_X: i32 = 8;
/// Right margin for right-aligned value columns.
const VALUE_MARGIN: i32 = 16;
/// Column for the scroll indicators.
const ARROW_X: i32 = 240;

/// Seconds in an hour, for duration formatting.
const HOUR: u64 = 3600;

/// Compose one frame for the current state. Recomputes the scroll offset so
/// the cursor is always inside the visible window.
pub fn compose(
    fb: &mut FrameBuffer,
    shaper: &mut dyn TextShaper,
    icons: &dyn IconRasterizer,
    model: &mut AppModel,
    now: Instant,
) {
    fb.clear();
    match model.state {
        AppState::Idle => {
            status_bar(fb, shaper, icons, model);
            idle_screen(fb, shaper, model);
        }
        AppState::Settings => {
            status_bar(fb, shaper, icons, model);
            settings_menu(fb, shaper, model);
        }
        AppState::CopyFiles => {
            status_bar(fb, shaper, icons, model);
            copy_files_menu(fb, shaper, model);
        }
        AppState::SystemOptions => {
            status_bar(fb, shaper, icons, model);
            system_options_menu(fb, shaper, model);
        }
        AppState::NetworkInfo => {
            status_bar(fb, shaper, icons, model);
            network_info(fb, shaper, model);
        }
        // Full-bleed overlays without the status strip.
        AppState::Recording => recording_screen(fb, shaper, model, now),
        AppState::Copying => copy_progress(fb, shaper, model),
        AppState::Confirm => confirm_dialog(fb, shaper, model),
    }
}

/// `HH:MM:SS` from whole seconds.
#[must_use]
pub fn format_duration(secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        secs / HOUR,
        (secs % HOUR) / 60,
        secs % 60
    )
}

/// Recording time left at the current parameters: free bytes over the PCM
/// byte rate (4 bytes per sample per channel).
#[must_use]
pub fn remaining_secs(free_bytes: u64, sample_rate: u32, channels: u16) -> u64 {
    let bytes_per_sec = u64::from(sample_rate) * u64::from(channels) * u64::from(BITS_PER_SAMPLE / 8);
    if bytes_per_sec == 0 {
        return 0;
    }
    free_bytes / bytes_per_sec
}

// ──────────────────── status bar ────────────────────

fn status_bar(
    fb: &mut FrameBuffer,
    shaper: &mut dyn TextShaper,
    icons: &dyn IconRasterizer,
    model: &AppModel,
) {
    let format_info = format!(
        "WAV {}bit {}kHz {}ch",
        BITS_PER_SAMPLE,
        model.sample_rate() / 1000,
        model.params.channels
    );
    text::draw(fb, shaper, 2, 10, &format_info, FontContext::StatusBar);

    // Volume indicator, rightmost.
    let usb_x = 208;
    let usb = icon_or_fallback(icons, Icon::Usb, IconSize::S8);
    fb.blit(usb_x, 2, &usb);
    let usb_label = if model.volume.mounted { "USB" } else { "---" };
    text::draw(fb, shaper, usb_x + 10, 9, usb_label, FontContext::StatusBar);

    // Link indicator to its left.
    let net_x = 163;
    let net = icon_or_fallback(icons, Icon::Network, IconSize::S8);
    fb.blit(net_x, 2, &net);
    let net_label = if model.network.connected { "ETH" } else { "---" };
    text::draw(fb, shaper, net_x + 10, 9, net_label, FontContext::StatusBar);

    // Capacity label squeezed between the format info and the link icon.
    if model.volume.mounted && !model.volume.capacity_label.is_empty() {
        let label = &model.volume.capacity_label;
        let width = shaper.measure(label, FontContext::StatusBar) as i32;
        let x = net_x - 5 - width;
        if x > 2 + shaper.measure(&format_info, FontContext::StatusBar) as i32 {
            text::draw(fb, shaper, x, 10, label, FontContext::StatusBar);
        }
    }
}

// ──────────────────── screens ────────────────────

fn idle_screen(fb: &mut FrameBuffer, shaper: &mut dyn TextShaper, model: &AppModel) {
    text::draw_centered(fb, shaper, "~ Standby ~", FontContext::Idle, 32);

    let remaining = remaining_secs(
        model.volume.free_bytes,
        model.sample_rate(),
        model.params.channels,
    );
    let line = format!(
        "{} ({}) available",
        format_duration(remaining),
        crate::tasks::volume::storage_label(model.volume.free_bytes)
    );
    text::draw_centered(fb, shaper, &line, FontContext::Details, 48);
}

fn recording_screen(
    fb: &mut FrameBuffer,
    shaper: &mut dyn TextShaper,
    model: &AppModel,
    now: Instant,
) {
    let elapsed = model
        .recording
        .started_at
        .map_or(0, |t| now.duration_since(t).as_secs());
    let rec = format!("* REC {}", format_duration(elapsed));
    text::draw_centered(fb, shaper, &rec, FontContext::Recording, 24);

    let remaining = remaining_secs(
        model.volume.free_bytes,
        model.sample_rate(),
        model.params.channels,
    );
    let line = format!(
        "Time Remaining: {} ({})",
        format_duration(remaining),
        crate::tasks::volume::storage_label(model.volume.free_bytes)
    );
    text::draw_centered(fb, shaper, &line, FontContext::Details, 40);

    if !model.recording.file_name.is_empty() {
        let name = text::ellipsize(
            shaper,
            &model.recording.file_name,
            FontContext::Details,
            crate::render::framebuffer::PANEL_WIDTH - 32,
        );
        text::draw_centered(fb, shaper, &name, FontContext::Details, 56);
    }
}

fn settings_menu(fb: &mut FrameBuffer, shaper: &mut dyn TextShaper, model: &mut AppModel) {
    text::draw_centered(fb, shaper, "Settings", FontContext::Header, 20);

    let rate_value = format!("{}kHz", model.sample_rate() / 1000);
    let channel_value = model.params.channels.to_string();
    let items: [(&str, Option<&str>); 6] = [
        ("Sample Rate", Some(rate_value.as_str())),
        ("Channels", Some(channel_value.as_str())),
        ("Copy Files > USB", None),
        ("System Options", None),
        ("Network Info", None),
        ("< Exit", None),
    ];

    model.scroll = scroll_window(model.cursor, model.scroll, items.len(), MENU_WINDOW);
    draw_menu_rows(fb, shaper, &items, model.cursor, model.scroll, 32);
    draw_scroll_arrows(fb, shaper, model.scroll, MENU_WINDOW, items.len(), 32, 52);
}

fn copy_files_menu(fb: &mut FrameBuffer, shaper: &mut dyn TextShaper, model: &mut AppModel) {
    text::draw_centered(fb, shaper, "Copy -> USB", FontContext::Header, 20);

    let count_value = format!("({} files)", model.files.len());
    let fixed: [(&str, Option<&str>); COPY_FIXED_ITEMS] = [
        ("Start Copy", None),
        ("Select All", Some(count_value.as_str())),
        ("Clear All", None),
    ];

    let row_step = shaper.line_height(FontContext::Menu) as i32;
    let mut y = 28;
    for (index, (label, value)) in fixed.iter().enumerate() {
        draw_menu_row(fb, shaper, label, *value, model.cursor == index, y);
        y += row_step;
    }

    // Separate window over the file rows; the fixed rows are always visible.
    let file_count = model.files.len();
    let mut file_start = 0;
    if model.cursor >= COPY_FIXED_ITEMS {
        let file_offset = model.cursor - COPY_FIXED_ITEMS;
        if file_offset >= COPY_FILE_WINDOW {
            file_start = file_offset - COPY_FILE_WINDOW + 1;
        }
    }
    model.scroll = file_start.min(file_count.saturating_sub(COPY_FILE_WINDOW));

    let file_end = (file_start + COPY_FILE_WINDOW).min(file_count);
    for index in file_start..file_end {
        let selected = model.cursor == COPY_FIXED_ITEMS + index;
        let checkbox = if model.files.is_selected(index) {
            "[X]"
        } else {
            "[ ]"
        };
        let name = model.files.name(index).unwrap_or_default();
        let label = format!("{checkbox} {name}");
        let max_width = crate::render::framebuffer::PANEL_WIDTH - 32;
        let label = text::ellipsize(shaper, &label, FontContext::Menu, max_width);
        draw_menu_row(fb, shaper, &label, None, selected, y);
        y += row_step;
    }

    if file_count > COPY_FILE_WINDOW {
        if file_start > 0 {
            text::draw(fb, shaper, ARROW_X, 48, "^", FontContext::Details);
        }
        if file_end < file_count {
            text::draw(fb, shaper, ARROW_X, 58, "v", FontContext::Details);
        }
    }
}

fn copy_progress(fb: &mut FrameBuffer, shaper: &mut dyn TextShaper, model: &AppModel) {
    text::draw_centered(fb, shaper, "Copying to USB...", FontContext::Header, 20);

    let fraction = f32::from(model.copy.progress) / 100.0;
    fb.draw_progress_bar(0, 32, crate::render::framebuffer::PANEL_WIDTH as i32, 8, fraction);

    let percent = format!("{}%", model.copy.progress);
    text::draw_centered(fb, shaper, &percent, FontContext::Details, 50);
    text::draw_centered(
        fb,
        shaper,
        "Hold encoder 3s to cancel",
        FontContext::Details,
        60,
    );
}

fn system_options_menu(fb: &mut FrameBuffer, shaper: &mut dyn TextShaper, model: &mut AppModel) {
    text::draw_centered(fb, shaper, "System Options", FontContext::Header, 20);

    let items: [(&str, Option<&str>); 5] = [
        ("Delete All Recordings", None),
        ("Format USB Drive", None),
        ("Shutdown System", None),
        ("Restart System", None),
        ("< Exit", None),
    ];

    model.scroll = scroll_window(model.cursor, model.scroll, items.len(), MENU_WINDOW);
    draw_menu_rows(fb, shaper, &items, model.cursor, model.scroll, 32);
    draw_scroll_arrows(fb, shaper, model.scroll, MENU_WINDOW, items.len(), 32, 52);
}

fn network_info(fb: &mut FrameBuffer, shaper: &mut dyn TextShaper, model: &AppModel) {
    text::draw_centered(fb, shaper, "Network Information", FontContext::Header, 16);

    let mut y = 28;
    for (index, line) in model.network.details.iter().take(4).enumerate() {
        let ctx = if index == 0 {
            FontContext::Menu
        } else {
            FontContext::Details
        };
        text::draw_centered(fb, shaper, line, ctx, y);
        y += 10;
    }
    text::draw_centered(
        fb,
        shaper,
        "Hold encoder to return",
        FontContext::Details,
        58,
    );
}

fn confirm_dialog(fb: &mut FrameBuffer, shaper: &mut dyn TextShaper, model: &AppModel) {
    let MenuContext::Confirm(kind) = model.menu else {
        return;
    };
    let (title, message1, message2) = confirm_strings(kind);

    text::draw_centered(fb, shaper, title, FontContext::Alert, 16);
    text::draw_centered(fb, shaper, message1, FontContext::Menu, 32);
    if !message2.is_empty() {
        text::draw_centered(fb, shaper, message2, FontContext::Menu, 44);
    }

    match model.confirm {
        ConfirmChoice::Yes => {
            text::draw(fb, shaper, 96, 56, "> YES", FontContext::Selected);
            text::draw(fb, shaper, 160, 56, "NO", FontContext::Menu);
        }
        ConfirmChoice::No => {
            text::draw(fb, shaper, 96, 56, "YES", FontContext::Menu);
            text::draw(fb, shaper, 160, 56, "> NO", FontContext::Selected);
        }
    }
}

/// Title and messages per pending confirmation.
#[must_use]
pub const fn confirm_strings(kind: ConfirmKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        ConfirmKind::DeleteAll => (
            "CONFIRM DELETE",
            "Delete ALL recordings?",
            "This action cannot be undone!",
        ),
        ConfirmKind::FormatVolume => (
            "CONFIRM FORMAT",
            "Format USB drive?",
            "All data will be lost!",
        ),
        ConfirmKind::Shutdown => ("SHUTDOWN", "Power off the system?", ""),
        ConfirmKind::Restart => ("RESTART", "Restart the system?", ""),
    }
}

// ──────────────────── row helpers ────────────────────

fn draw_menu_rows(
    fb: &mut FrameBuffer,
    shaper: &mut dyn TextShaper,
    items: &[(&str, Option<&str>)],
    cursor: usize,
    scroll: usize,
    start_y: i32,
) {
    let row_step = shaper.line_height(FontContext::Menu) as i32;
    let end = (scroll + MENU_WINDOW).min(items.len());
    let mut y = start_y;
    for index in scroll..end {
        let (label, value) = items[index];
        draw_menu_row(fb, shaper, label, value, index == cursor, y);
        y += row_step;
    }
}

fn draw_menu_row(
    fb: &mut FrameBuffer,
    shaper: &mut dyn TextShaper,
    label: &str,
    value: Option<&str>,
    selected: bool,
    y: i32,
) {
    let ctx = if selected {
        FontContext::Selected
    } else {
        FontContext::Menu
    };
    let prefix = if selected { "> " } else { "  " };
    let row = format!("{prefix}{label}");
    text::draw(fb, shaper, MENU_X, y, &row, ctx);

    if let Some(value) = value {
        text::draw_right(fb, shaper, value, ctx, y, VALUE_MARGIN);
    }
}

fn draw_scroll_arrows(
    fb: &mut FrameBuffer,
    shaper: &mut dyn TextShaper,
    scroll: usize,
    window: usize,
    total: usize,
    up_y: i32,
    down_y: i32,
) {
    if total <= window {
        return;
    }
    if scroll > 0 {
        text::draw(fb, shaper, ARROW_X, up_y, "^", FontContext::Details);
    }
    if scroll + window < total {
        text::draw(fb, shaper, ARROW_X, down_y, "v", FontContext::Details);
    }
}
