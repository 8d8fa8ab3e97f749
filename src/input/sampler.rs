//! GPIO line acquisition and the fixed-cadence sampling thread.
//!
//! The sampling loop never blocks on the controller: events go out through an
//! unbounded channel send, and the loop keeps its cadence regardless of how
//! long dispatch takes on the other side. A line that cannot be acquired at
//! startup is fatal — the appliance cannot operate without its controls.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use linux_embedded_hal::gpio_cdev::{Chip, LineHandle, LineRequestFlags};

use crate::core::config::{InputConfig, TimingConfig};
use crate::core::errors::{Result, WvdError};
use crate::input::debounce::{EdgeDebouncer, PressOutcome, PressTracker};
use crate::input::quadrature::QuadratureDecoder;
use crate::input::{InputEvent, Transport};

/// Read-error budget before the sampler reports to stderr (once per budget).
const READ_ERROR_REPORT_EVERY: u64 = 1000;

/// Consumer label recorded against requested GPIO lines.
const CONSUMER: &str = "wavedeck-input";

/// The six acquired input lines. All are pulled up and read active-low.
pub struct InputLines {
    encoder_a: LineHandle,
    encoder_b: LineHandle,
    encoder_button: LineHandle,
    record: LineHandle,
    stop: LineHandle,
    play: LineHandle,
}

impl InputLines {
    /// Request every configured line from the GPIO character device.
    /// Any single failure aborts initialization.
    pub fn acquire(cfg: &InputConfig) -> Result<Self> {
        let mut chip = open_chip(&cfg.gpio_chip)?;
        Ok(Self {
            encoder_a: request_line(&mut chip, cfg.encoder_a)?,
            encoder_b: request_line(&mut chip, cfg.encoder_b)?,
            encoder_button: request_line(&mut chip, cfg.encoder_button)?,
            record: request_line(&mut chip, cfg.record_button)?,
            stop: request_line(&mut chip, cfg.stop_button)?,
            play: request_line(&mut chip, cfg.play_button)?,
        })
    }
}

fn open_chip(path: &Path) -> Result<Chip> {
    Chip::new(path).map_err(|e| WvdError::io(path, std::io::Error::other(e.to_string())))
}

fn request_line(chip: &mut Chip, offset: u32) -> Result<LineHandle> {
    chip.get_line(offset)
        .and_then(|line| line.request(LineRequestFlags::INPUT, 0, CONSUMER))
        .map_err(|e| WvdError::InputLine {
            line: offset,
            details: e.to_string(),
        })
}

/// One snapshot of every input line. `true` means electrically high.
#[derive(Debug, Clone, Copy)]
struct LineLevels {
    a: bool,
    b: bool,
    encoder_button: bool,
    record: bool,
    stop: bool,
    play: bool,
}

/// Spawn the sampling thread. Events are fire-and-forget sends into `events`;
/// the thread exits when `shutdown` is set or the receiver is dropped.
pub fn spawn_sampler(
    lines: InputLines,
    timing: &TimingConfig,
    events: Sender<InputEvent>,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    let interval = Duration::from_millis(timing.sample_interval_ms);
    let click_min = Duration::from_millis(timing.click_min_ms);
    let hold_min = Duration::from_millis(timing.hold_min_ms);

    thread::Builder::new()
        .name("wvd-input".to_string())
        .spawn(move || {
            sample_loop(&lines, interval, click_min, hold_min, &events, &shutdown);
        })
        .expect("spawning the input sampler thread cannot fail")
}

fn sample_loop(
    lines: &InputLines,
    interval: Duration,
    click_min: Duration,
    hold_min: Duration,
    events: &Sender<InputEvent>,
    shutdown: &AtomicBool,
) {
    let initial_a = read_high(&lines.encoder_a).unwrap_or(true);
    let mut decoder = QuadratureDecoder::new(initial_a);
    let mut encoder_press = PressTracker::new(click_min, hold_min);
    let mut transport = [
        (Transport::Record, EdgeDebouncer::new(click_min)),
        (Transport::Stop, EdgeDebouncer::new(click_min)),
        (Transport::Play, EdgeDebouncer::new(click_min)),
    ];
    let mut read_errors: u64 = 0;

    while !shutdown.load(Ordering::Relaxed) {
        let now = Instant::now();

        match read_levels(lines) {
            Some(levels) => {
                if let Some(direction) = decoder.sample(levels.a, levels.b)
                    && events.send(InputEvent::Rotate(direction)).is_err()
                {
                    return;
                }

                // Encoder button is active-low: pressed when the line is low.
                if let Some(outcome) = encoder_press.sample(!levels.encoder_button, now) {
                    let event = match outcome {
                        PressOutcome::Click => Some(InputEvent::Click),
                        PressOutcome::Hold => Some(InputEvent::Hold),
                        PressOutcome::Ignored => None,
                    };
                    if let Some(event) = event
                        && events.send(event).is_err()
                    {
                        return;
                    }
                }

                let pressed = [!levels.record, !levels.stop, !levels.play];
                for ((button, debouncer), active) in transport.iter_mut().zip(pressed) {
                    if debouncer.sample(active, now)
                        && events.send(InputEvent::Button(*button)).is_err()
                    {
                        return;
                    }
                }
            }
            None => {
                read_errors += 1;
                if read_errors % READ_ERROR_REPORT_EVERY == 1 {
                    eprintln!("[WVD-INPUT] gpio read failures: {read_errors} so far, sampling continues");
                }
            }
        }

        thread::sleep(interval);
    }
}

fn read_levels(lines: &InputLines) -> Option<LineLevels> {
    Some(LineLevels {
        a: read_high(&lines.encoder_a)?,
        b: read_high(&lines.encoder_b)?,
        encoder_button: read_high(&lines.encoder_button)?,
        record: read_high(&lines.record)?,
        stop: read_high(&lines.stop)?,
        play: read_high(&lines.play)?,
    })
}

fn read_high(handle: &LineHandle) -> Option<bool> {
    handle.get_value().ok().map(|v| v != 0)
}
