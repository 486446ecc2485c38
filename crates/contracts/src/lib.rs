//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Frame timestamps are seconds (f64) since the owning sensor connected
//! - Record timestamps are seconds (f64) since the group's capture started;
//!   non-decreasing across a recording

mod blueprint;
mod error;
mod frame;
mod record;
mod sensor;
mod sensor_id;
mod sink;
mod widget;

pub use blueprint::*;
pub use error::*;
pub use frame::*;
pub use record::*;
pub use sensor::*;
pub use sensor_id::SensorId;
pub use sink::*;
pub use widget::*;
