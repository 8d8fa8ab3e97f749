//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, WvdError};

/// Full wavedeck configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub input: InputConfig,
    pub panel: PanelConfig,
    pub audio: AudioConfig,
    pub paths: PathsConfig,
    pub timing: TimingConfig,
}

/// GPIO line assignments for the encoder and transport buttons.
///
/// Offsets are character-device line numbers on `gpio_chip`. All input lines
/// are pulled up externally and read active-low.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InputConfig {
    pub gpio_chip: PathBuf,
    pub encoder_a: u32,
    pub encoder_b: u32,
    pub encoder_button: u32,
    pub record_button: u32,
    pub stop_button: u32,
    pub play_button: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            gpio_chip: PathBuf::from("/dev/gpiochip0"),
            encoder_a: 17,
            encoder_b: 27,
            encoder_button: 22,
            record_button: 5,
            stop_button: 6,
            play_button: 13,
        }
    }
}

/// Panel bus wiring: spidev device plus the D/C and reset control lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PanelConfig {
    pub spi_device: PathBuf,
    pub spi_hz: u32,
    pub dc_line: u32,
    pub reset_line: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            spi_device: PathBuf::from("/dev/spidev0.0"),
            spi_hz: 10_000_000,
            dc_line: 25,
            reset_line: 24,
        }
    }
}

/// Capture parameters and the external capture command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AudioConfig {
    /// Supported rates in the order the settings menu cycles through them.
    pub sample_rates: Vec<u32>,
    /// Index into `sample_rates` selected at startup.
    pub default_rate_index: usize,
    pub default_channels: u16,
    pub max_channels: u16,
    /// Command invoked via `sh -c` with `sample_rate=<rate>` in scope and the
    /// channel count appended as its argument.
    pub capture_command: String,
    /// Working directory for the capture process.
    pub capture_workdir: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rates: vec![44_100, 48_000, 96_000, 192_000],
            default_rate_index: 1,
            default_channels: 2,
            max_channels: 128,
            capture_command: "./save_to_file".to_string(),
            capture_workdir: PathBuf::from("."),
        }
    }
}

/// Fixed directories the appliance records into and copies out of.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub record_dir: PathBuf,
    pub volume_mount: PathBuf,
    /// Block device formatted by the "Format USB Drive" maintenance action.
    pub format_device: PathBuf,
    /// Network interface shown in the status bar and the info screen.
    pub network_interface: String,
    /// Append-only activity log; `None` disables file logging.
    pub activity_log: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            record_dir: PathBuf::from("/rec"),
            volume_mount: PathBuf::from("/media/usb"),
            format_device: PathBuf::from("/dev/sda1"),
            network_interface: "eth0".to_string(),
            activity_log: Some(PathBuf::from("/var/log/wavedeck.jsonl")),
        }
    }
}

/// Cadences and debounce windows, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// Hardware sampling interval for encoder and button lines.
    pub sample_interval_ms: u64,
    /// Render cadence; frames are composed and transmitted at this rate.
    pub render_tick_ms: u64,
    /// Volume/network presence poll interval.
    pub status_poll_ms: u64,
    /// Presses shorter than this are bounce and ignored.
    pub click_min_ms: u64,
    /// Presses at least this long classify as Hold.
    pub hold_min_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1,
            render_tick_ms: 100,
            status_poll_ms: 1000,
            click_min_ms: 50,
            hold_min_ms: 3000,
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when no path
    /// is given and no file exists at the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| WvdError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(WvdError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Default configuration file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from("/etc/wavedeck/config.toml")
    }

    fn apply_env_overrides(&mut self) {
        if let Some(dir) = non_empty_env("WAVEDECK_RECORD_DIR") {
            self.paths.record_dir = PathBuf::from(dir);
        }
        if let Some(mount) = non_empty_env("WAVEDECK_VOLUME_MOUNT") {
            self.paths.volume_mount = PathBuf::from(mount);
        }
        if let Some(dev) = non_empty_env("WAVEDECK_SPI_DEVICE") {
            self.panel.spi_device = PathBuf::from(dev);
        }
        if let Some(chip) = non_empty_env("WAVEDECK_GPIO_CHIP") {
            self.input.gpio_chip = PathBuf::from(chip);
        }
    }

    /// Reject configurations the state machine cannot run on.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rates.is_empty() {
            return Err(WvdError::InvalidConfig {
                details: "audio.sample_rates must not be empty".to_string(),
            });
        }
        if self.audio.default_rate_index >= self.audio.sample_rates.len() {
            return Err(WvdError::InvalidConfig {
                details: format!(
                    "audio.default_rate_index {} out of range for {} rates",
                    self.audio.default_rate_index,
                    self.audio.sample_rates.len()
                ),
            });
        }
        if self.audio.max_channels == 0 || self.audio.default_channels == 0 {
            return Err(WvdError::InvalidConfig {
                details: "channel counts must be at least 1".to_string(),
            });
        }
        if self.audio.default_channels > self.audio.max_channels {
            return Err(WvdError::InvalidConfig {
                details: format!(
                    "audio.default_channels {} exceeds max_channels {}",
                    self.audio.default_channels, self.audio.max_channels
                ),
            });
        }
        if self.timing.sample_interval_ms == 0 || self.timing.render_tick_ms == 0 {
            return Err(WvdError::InvalidConfig {
                details: "timing intervals must be nonzero".to_string(),
            });
        }
        if self.timing.click_min_ms >= self.timing.hold_min_ms {
            return Err(WvdError::InvalidConfig {
                details: format!(
                    "timing.click_min_ms {} must be below hold_min_ms {}",
                    self.timing.click_min_ms, self.timing.hold_min_ms
                ),
            });
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}
