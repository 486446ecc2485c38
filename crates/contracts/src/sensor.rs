//! TouchSensor trait - sensor capability abstraction
//!
//! Defines the uniform capability set every device family (and the
//! synthetic replay source) satisfies. Variants live in `sensor_factory`;
//! the group engine only ever sees `Box<dyn TouchSensor>`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Frame, RigError, SensorId};

/// Connection lifecycle of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Streaming,
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Streaming => "streaming",
            ConnectionState::Failed => "failed",
        };
        write!(f, "{text}")
    }
}

/// Supported sensor families, plus the synthetic replay source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Digit,
    GelsightMini,
    Digit360,
    Replay,
}

impl SensorKind {
    /// Config-document tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            SensorKind::Digit => "digit",
            SensorKind::GelsightMini => "gelsight_mini",
            SensorKind::Digit360 => "digit360",
            SensorKind::Replay => "replay",
        }
    }

    /// Resolve a config-document tag; `None` for unknown tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "digit" => Some(SensorKind::Digit),
            "gelsight_mini" => Some(SensorKind::GelsightMini),
            "digit360" => Some(SensorKind::Digit360),
            "replay" => Some(SensorKind::Replay),
            _ => None,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Image resolution of the Digit camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Resolution {
    Vga,
    #[default]
    Qvga,
}

impl Resolution {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::Vga => (640, 480),
            Resolution::Qvga => (320, 240),
        }
    }
}

/// A single configuration option.
///
/// Which options a variant recognizes is part of that variant's contract;
/// an unsupported option is rejected, never silently ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorOption {
    /// Illumination intensity per RGB channel, 0-15 (Digit)
    Rgb([u8; 3]),
    /// Camera resolution (Digit)
    Resolution(Resolution),
    /// Camera frame rate, 30 or 60 (Digit)
    Fps(u32),
    /// Per-LED color for the eight ring LEDs, 0-255 (Digit360)
    LedValues(Box<[[u8; 3]; 8]>),
    /// Playback speed multiplier (Replay)
    PlaybackSpeed(f64),
}

impl SensorOption {
    /// Short name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            SensorOption::Rgb(_) => "rgb",
            SensorOption::Resolution(_) => "resolution",
            SensorOption::Fps(_) => "fps",
            SensorOption::LedValues(_) => "led_values",
            SensorOption::PlaybackSpeed(_) => "playback_speed",
        }
    }
}

/// Sensor capability contract.
///
/// # Contract
///
/// - `connect` is idempotent; failure means the device or its config is
///   unreachable.
/// - `configure` applies one option; options not recognized by the
///   variant are rejected.
/// - `acquire` blocks until the next raw frame at the device's native
///   cadence, or fails on hardware disconnect. It must return within
///   roughly one native sample period so acquisition loops can observe
///   stop signals promptly.
/// - `release` is scoped teardown, safe to call on every exit path and
///   more than once.
pub trait TouchSensor: Send {
    /// Sensor name, unique within its group.
    fn name(&self) -> &SensorId;

    /// Device family.
    fn kind(&self) -> SensorKind;

    /// Native polling rate (Hz).
    fn sampling_frequency(&self) -> f64;

    /// Persisted rate (Hz), always <= sampling frequency.
    fn recording_frequency(&self) -> f64;

    /// Current lifecycle state, human-readable via `Display`.
    fn connection_state(&self) -> ConnectionState;

    /// Establish the underlying channel.
    fn connect(&mut self) -> Result<(), RigError>;

    /// Apply one configuration option.
    fn configure(&mut self, option: &SensorOption) -> Result<(), RigError>;

    /// Block until the next raw frame is available.
    fn acquire(&mut self) -> Result<Frame, RigError>;

    /// Transition to `Failed` after exhausted acquisition retries.
    /// The state is sticky: `release` keeps it for display.
    fn mark_failed(&mut self);

    /// Release the underlying channel.
    fn release(&mut self);

    /// Capture a calibration baseline: skip `skip_frames`, then average
    /// `num_frames` acquired frames.
    fn calibrate(&mut self, num_frames: usize, skip_frames: usize) -> Result<Frame, RigError> {
        if num_frames == 0 {
            return Err(RigError::acquisition(
                self.name().as_str(),
                "calibration requires at least one frame",
            ));
        }
        for _ in 0..skip_frames {
            self.acquire()?;
        }
        let mut frames = Vec::with_capacity(num_frames);
        for _ in 0..num_frames {
            frames.push(self.acquire()?);
        }
        Frame::average(&frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tag_round_trip() {
        for kind in [
            SensorKind::Digit,
            SensorKind::GelsightMini,
            SensorKind::Digit360,
            SensorKind::Replay,
        ] {
            assert_eq!(SensorKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(SensorKind::from_tag("webcam"), None);
    }

    #[test]
    fn connection_state_display() {
        assert_eq!(ConnectionState::Streaming.to_string(), "streaming");
        assert_eq!(ConnectionState::Failed.to_string(), "failed");
    }

    #[test]
    fn resolution_dimensions() {
        assert_eq!(Resolution::Vga.dimensions(), (640, 480));
        assert_eq!(Resolution::Qvga.dimensions(), (320, 240));
    }
}
