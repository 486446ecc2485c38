//! # Sensor Factory
//!
//! Sensor variants and their construction.
//!
//! One variant per device family (Digit, GelSight Mini, Digit360) plus
//! the synthetic replay source, each independently satisfying the
//! `TouchSensor` capability contract. Vendor SDK bindings plug in
//! through the `DeviceLink` seam; the builtin `SyntheticLink` stands in
//! for them when no hardware is attached.

mod digit;
mod digit360;
mod gelsight_mini;
mod link;
mod registry;
mod replay;
mod synthetic;

pub use digit::DigitSensor;
pub use digit360::Digit360Sensor;
pub use gelsight_mini::GelsightMiniSensor;
pub use link::{DeviceLink, LinkError};
pub use registry::{SensorCtor, SensorRegistry};
pub use replay::ReplaySensor;
pub use synthetic::SyntheticLink;
