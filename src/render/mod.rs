//! Render engine: framebuffer model, panel protocol, text compositing, icons.
//!
//! Everything here draws into the in-memory [`framebuffer::FrameBuffer`];
//! only [`panel::Panel::present`] touches the physical bus.

pub mod framebuffer;
pub mod icons;
pub mod panel;
pub mod text;
