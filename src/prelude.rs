//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use wavedeck::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, WvdError};

// Input
pub use crate::input::{InputEvent, Transport};
pub use crate::input::debounce::{EdgeDebouncer, PressOutcome, PressTracker};
pub use crate::input::quadrature::QuadratureDecoder;

// Render
pub use crate::render::framebuffer::{FrameBuffer, PANEL_HEIGHT, PANEL_WIDTH};
pub use crate::render::icons::{Icon, IconBitmap, IconRasterizer, IconSize};
pub use crate::render::panel::{Panel, PanelBus};
pub use crate::render::text::{FontContext, MonoShaper, TextShaper};

// Application
pub use crate::app::model::{AppModel, AppState, ConfirmChoice, ConfirmKind, MenuContext};
pub use crate::app::update::{Command, update};

// Tasks
pub use crate::tasks::recorder::{CaptureRequest, CaptureSession};
pub use crate::tasks::volume::capacity_label;
