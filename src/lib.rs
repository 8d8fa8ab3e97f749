#![forbid(unsafe_code)]

//! wavedeck — control core of a dedicated hardware audio-recorder appliance.
//!
//! The real-time triad:
//! 1. **Input subsystem** — quadrature decoding and click/hold debounce over
//!    GPIO lines, sampled at ~1 ms and delivered as discrete events
//! 2. **Application controller** — one state aggregate behind one lock, a
//!    pure transition function, and per-state frame composition
//! 3. **Render engine** — 4-bit grayscale framebuffer and the command/data
//!    panel update transaction over SPI
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use wavedeck::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use wavedeck::core::config::Config;
//! use wavedeck::render::framebuffer::FrameBuffer;
//! ```

pub mod prelude;

pub mod app;
pub mod core;
pub mod input;
pub mod logger;
pub mod platform;
pub mod render;
pub mod tasks;
