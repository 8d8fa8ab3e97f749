//! Panel protocol: command/data phase discipline and the full-frame update
//! transaction for the 256×64 grayscale OLED controller.
//!
//! [`PanelBus`] is the wire seam: a command-phase write and a data-phase
//! write distinguished by the D/C control line. [`Panel::present`] is the
//! only operation that performs bus I/O; a frame is transmitted as one
//! transaction (addressing, write-RAM, bulk data) and never interleaved
//! with another update.

use std::path::Path;
use std::thread;
use std::time::Duration;

use embedded_hal::spi::SpiDevice;
use linux_embedded_hal::SpidevDevice;
use linux_embedded_hal::gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};

use crate::core::config::PanelConfig;
use crate::core::errors::{Result, WvdError};
use crate::render::framebuffer::FrameBuffer;

/// Largest single spidev transfer; bulk frame data is chunked to this size.
const SPI_CHUNK: usize = 4096;

/// Consumer label recorded against the panel control lines.
const CONSUMER: &str = "wavedeck-panel";

/// Controller bring-up sequence, sent verbatim after the reset pulse.
#[rustfmt::skip]
const INIT_SEQUENCE: &[&[u8]] = &[
    &[0xFD, 0x12],             // unlock driver IC
    &[0xAE],                   // display off
    &[0xB3, 0x91],             // clock divide / oscillator
    &[0xCA, 0x3F],             // multiplex ratio
    &[0xA2, 0x00],             // display offset
    &[0xA1, 0x00],             // start line
    &[0xA0, 0x14, 0x11],       // remap and dual COM mode
    &[0xB5, 0x00],             // GPIO
    &[0xAB, 0x01],             // function selection
    &[0xB4, 0xA0, 0xB5, 0x55], // display enhancement A
    &[0xC1, 0x9F],             // contrast current
    &[0xC7, 0x0F],             // master contrast
    &[0xB1, 0xE2],             // phase length
    &[0xD1, 0x82, 0x20],       // display enhancement B
    &[0xBB, 0x1F],             // precharge voltage
    &[0xB6, 0x08],             // second precharge period
    &[0xBE, 0x07],             // VCOMH voltage
    &[0xA6],                   // normal display
    &[0xAF],                   // display on
];

/// Column window for the 256-pixel extent (controller RAM offset included).
const SET_COLUMNS: [u8; 3] = [0x15, 0x1C, 0x5B];
/// Row window for the 64-line extent.
const SET_ROWS: [u8; 3] = [0x75, 0x00, 0x3F];
/// Write-RAM command opening the data phase.
const WRITE_RAM: [u8; 1] = [0x5C];

/// Wire seam between the transaction builder and the physical bus.
pub trait PanelBus {
    /// Pulse the hardware reset line.
    fn reset(&mut self) -> Result<()>;
    /// Transmit `bytes` in the command phase (D/C low).
    fn command(&mut self, bytes: &[u8]) -> Result<()>;
    /// Transmit `bytes` in the data phase (D/C high).
    fn data(&mut self, bytes: &[u8]) -> Result<()>;
}

/// The panel: owns the bus and encodes frames into update transactions.
pub struct Panel<B: PanelBus> {
    bus: B,
}

impl<B: PanelBus> Panel<B> {
    /// Wrap an opened bus. Call [`Panel::init`] before the first frame.
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Reset the controller and run the bring-up sequence.
    pub fn init(&mut self) -> Result<()> {
        self.bus.reset()?;
        for cmd in INIT_SEQUENCE {
            self.bus.command(cmd)?;
        }
        Ok(())
    }

    /// Transmit one full frame: column window, row window, write-RAM, then
    /// the packed 4-bit pixel payload. Atomic from the caller's view — the
    /// panel is borrowed mutably for the whole transaction.
    pub fn present(&mut self, fb: &FrameBuffer) -> Result<()> {
        self.bus.command(&SET_COLUMNS)?;
        self.bus.command(&SET_ROWS)?;
        self.bus.command(&WRITE_RAM)?;
        self.bus.data(&fb.pack())
    }

    /// Access the underlying bus (tests inspect recorded transactions).
    pub fn bus(&self) -> &B {
        &self.bus
    }
}

/// Physical bus: spidev transfers with D/C and reset on GPIO lines.
pub struct SpiPanelBus {
    spi: SpidevDevice,
    dc: LineHandle,
    rst: LineHandle,
}

impl SpiPanelBus {
    /// Open the spidev device and request the control lines. Failure here is
    /// fatal — the appliance has no display to fall back to.
    pub fn open(cfg: &PanelConfig, gpio_chip: &Path) -> Result<Self> {
        let mut spi = SpidevDevice::open(&cfg.spi_device).map_err(|e| WvdError::PanelInit {
            details: format!("open {}: {e:?}", cfg.spi_device.display()),
        })?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(cfg.spi_hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.0.configure(&options).map_err(|e| WvdError::PanelInit {
            details: format!("configure spi: {e}"),
        })?;

        let mut chip = Chip::new(gpio_chip).map_err(|e| WvdError::PanelInit {
            details: format!("open {}: {e}", gpio_chip.display()),
        })?;
        let dc = request_output(&mut chip, cfg.dc_line, 0)?;
        let rst = request_output(&mut chip, cfg.reset_line, 1)?;

        Ok(Self { spi, dc, rst })
    }

    fn set_dc(&mut self, high: bool) -> Result<()> {
        self.dc
            .set_value(u8::from(high))
            .map_err(|e| WvdError::PanelIo {
                details: format!("dc line: {e}"),
            })
    }

    fn write_chunked(&mut self, bytes: &[u8]) -> Result<()> {
        for chunk in bytes.chunks(SPI_CHUNK) {
            self.spi.write(chunk).map_err(|e| WvdError::PanelIo {
                details: format!("spi write: {e:?}"),
            })?;
        }
        Ok(())
    }
}

impl PanelBus for SpiPanelBus {
    fn reset(&mut self) -> Result<()> {
        let pulse = |line: &LineHandle, v: u8| {
            line.set_value(v).map_err(|e| WvdError::PanelInit {
                details: format!("reset line: {e}"),
            })
        };
        pulse(&self.rst, 0)?;
        thread::sleep(Duration::from_millis(10));
        pulse(&self.rst, 1)?;
        thread::sleep(Duration::from_millis(50));
        Ok(())
    }

    fn command(&mut self, bytes: &[u8]) -> Result<()> {
        self.set_dc(false)?;
        self.write_chunked(bytes)
    }

    fn data(&mut self, bytes: &[u8]) -> Result<()> {
        self.set_dc(true)?;
        self.write_chunked(bytes)
    }
}

fn request_output(chip: &mut Chip, offset: u32, initial: u8) -> Result<LineHandle> {
    chip.get_line(offset)
        .and_then(|line| line.request(LineRequestFlags::OUTPUT, initial, CONSUMER))
        .map_err(|e| WvdError::PanelInit {
            details: format!("output line {offset}: {e}"),
        })
}
