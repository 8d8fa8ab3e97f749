//! Background task runners: status poller, copy worker, capture supervisor.
//!
//! Every task writes only the model fields it publishes, under the same lock
//! the controller owns, and none of them ever runs on the render cadence.

pub mod copy;
pub mod recorder;
pub mod volume;
