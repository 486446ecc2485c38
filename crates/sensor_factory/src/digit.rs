//! Digit sensor variant
//!
//! Translates the Digit vendor channel into the common frame shape.
//! Recognized options: rgb (0-15 per channel), resolution (VGA/QVGA),
//! fps (30/60). The firmware couples fps and resolution: 30 fps streams
//! VGA, 60 fps streams QVGA.

use std::time::Instant;

use tracing::{debug, instrument};

use contracts::{
    ConnectionState, Frame, ImageFormat, Resolution, RigError, SensorId, SensorKind, SensorOption,
    SensorSpec, TouchSensor,
};

use crate::link::{DeviceLink, LinkError};
use crate::synthetic::SyntheticLink;

/// A Digit tactile sensor.
pub struct DigitSensor {
    name: SensorId,
    serial_id: String,
    sampling_frequency: f64,
    recording_frequency: f64,
    resolution: Resolution,
    fps: u32,
    rgb: [u8; 3],
    link: Box<dyn DeviceLink>,
    state: ConnectionState,
    connected_at: Option<Instant>,
}

impl DigitSensor {
    /// Build from a validated spec with the default (synthetic) link.
    pub fn from_spec(spec: &SensorSpec) -> Result<Self, RigError> {
        let resolution = spec.resolution.unwrap_or_default();
        let (width, height) = resolution.dimensions();
        let link = SyntheticLink::image(width, height, ImageFormat::Rgb8, spec.sampling_frequency);
        Self::with_link(spec, Box::new(link))
    }

    /// Build with an explicit device link (vendor binding or test double).
    pub fn with_link(spec: &SensorSpec, link: Box<dyn DeviceLink>) -> Result<Self, RigError> {
        let serial_id = spec.serial_id.clone().ok_or_else(|| {
            RigError::config_validation(
                format!("sensors[{}].serial_id", spec.name),
                "serial_id is mandatory for digit sensors",
            )
        })?;

        Ok(Self {
            name: spec.name.clone(),
            serial_id,
            sampling_frequency: spec.sampling_frequency,
            recording_frequency: spec.recording_frequency,
            resolution: spec.resolution.unwrap_or_default(),
            fps: spec.fps.unwrap_or(30),
            rgb: spec.rgb.unwrap_or([15, 15, 15]),
            link,
            state: ConnectionState::Disconnected,
            connected_at: None,
        })
    }

    pub fn serial_id(&self) -> &str {
        &self.serial_id
    }

    fn link_err(&self, err: LinkError) -> RigError {
        match err {
            LinkError::Unreachable(msg) => RigError::connection(self.name.as_str(), msg),
            LinkError::Dropped(msg) | LinkError::Rejected(msg) => {
                RigError::acquisition(self.name.as_str(), msg)
            }
        }
    }
}

impl TouchSensor for DigitSensor {
    fn name(&self) -> &SensorId {
        &self.name
    }

    fn kind(&self) -> SensorKind {
        SensorKind::Digit
    }

    fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    fn recording_frequency(&self) -> f64 {
        self.recording_frequency
    }

    fn connection_state(&self) -> ConnectionState {
        self.state
    }

    #[instrument(name = "digit_connect", skip(self), fields(sensor = %self.name, serial = %self.serial_id))]
    fn connect(&mut self) -> Result<(), RigError> {
        if matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Streaming
        ) {
            return Ok(());
        }

        self.link.open().map_err(|e| match e {
            LinkError::Unreachable(msg) => RigError::connection(
                self.name.as_str(),
                format!("digit '{}' unreachable: {msg}", self.serial_id),
            ),
            other => RigError::connection(self.name.as_str(), other.to_string()),
        })?;

        // Push the configured state down, like the vendor tooling does
        // right after opening the stream.
        self.link
            .apply(&SensorOption::Resolution(self.resolution))
            .map_err(|e| self.link_err(e))?;
        self.link
            .apply(&SensorOption::Rgb(self.rgb))
            .map_err(|e| self.link_err(e))?;

        self.state = ConnectionState::Connected;
        self.connected_at = Some(Instant::now());
        debug!(sensor = %self.name, "digit connected");
        Ok(())
    }

    fn configure(&mut self, option: &SensorOption) -> Result<(), RigError> {
        match option {
            SensorOption::Rgb(rgb) => {
                if rgb.iter().any(|v| *v > 15) {
                    return Err(RigError::config_validation(
                        format!("{}.rgb", self.name),
                        format!("rgb channels must be in 0-15, got {rgb:?}"),
                    ));
                }
                self.link.apply(option).map_err(|e| self.link_err(e))?;
                self.rgb = *rgb;
                Ok(())
            }
            SensorOption::Resolution(resolution) => {
                self.link.apply(option).map_err(|e| self.link_err(e))?;
                self.resolution = *resolution;
                Ok(())
            }
            SensorOption::Fps(fps) => {
                if *fps != 30 && *fps != 60 {
                    return Err(RigError::config_validation(
                        format!("{}.fps", self.name),
                        format!("fps must be 30 or 60, got {fps}"),
                    ));
                }
                // Firmware coupling: the stream format follows the rate.
                let resolution = if *fps == 30 {
                    Resolution::Vga
                } else {
                    Resolution::Qvga
                };
                self.link.apply(option).map_err(|e| self.link_err(e))?;
                self.link
                    .apply(&SensorOption::Resolution(resolution))
                    .map_err(|e| self.link_err(e))?;
                self.fps = *fps;
                self.resolution = resolution;
                Ok(())
            }
            unsupported => Err(RigError::config_validation(
                format!("{}.{}", self.name, unsupported.name()),
                "option not supported by digit sensors",
            )),
        }
    }

    fn acquire(&mut self) -> Result<Frame, RigError> {
        let connected_at = self.connected_at.ok_or_else(|| {
            RigError::acquisition(self.name.as_str(), "acquire before connect")
        })?;

        let payload = self.link.next_payload().map_err(|e| self.link_err(e))?;
        self.state = ConnectionState::Streaming;

        Ok(Frame {
            sensor: self.name.clone(),
            timestamp: connected_at.elapsed().as_secs_f64(),
            payload,
        })
    }

    fn mark_failed(&mut self) {
        self.state = ConnectionState::Failed;
    }

    fn release(&mut self) {
        self.link.close();
        self.connected_at = None;
        if self.state != ConnectionState::Failed {
            self.state = ConnectionState::Disconnected;
        }
        debug!(sensor = %self.name, state = %self.state, "digit released");
    }
}

impl Drop for DigitSensor {
    fn drop(&mut self) {
        self.link.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FramePayload;

    fn spec() -> SensorSpec {
        SensorSpec::new("thumb", SensorKind::Digit)
            .with_frequencies(30.0, 30.0)
            .with_serial("D20501")
    }

    fn unpaced(spec: &SensorSpec) -> DigitSensor {
        let (w, h) = spec.resolution.unwrap_or_default().dimensions();
        let link = SyntheticLink::image(w, h, ImageFormat::Rgb8, spec.sampling_frequency).unpaced();
        DigitSensor::with_link(spec, Box::new(link)).unwrap()
    }

    #[test]
    fn missing_serial_is_rejected() {
        let mut spec = spec();
        spec.serial_id = None;
        assert!(DigitSensor::from_spec(&spec).is_err());
    }

    #[test]
    fn connect_is_idempotent() {
        let mut sensor = unpaced(&spec());
        sensor.connect().unwrap();
        sensor.connect().unwrap();
        assert_eq!(sensor.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn unreachable_device_fails_connect() {
        let link = SyntheticLink::image(320, 240, ImageFormat::Rgb8, 30.0).unreachable();
        let mut sensor = DigitSensor::with_link(&spec(), Box::new(link)).unwrap();
        let err = sensor.connect().unwrap_err();
        assert!(matches!(err, RigError::Connection { .. }));
        assert_eq!(sensor.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn acquire_streams_frames() {
        let mut sensor = unpaced(&spec());
        sensor.connect().unwrap();
        let frame = sensor.acquire().unwrap();
        assert_eq!(frame.sensor, "thumb");
        assert!(matches!(frame.payload, FramePayload::Image(_)));
        assert_eq!(sensor.connection_state(), ConnectionState::Streaming);
    }

    #[test]
    fn fps_couples_resolution() {
        let mut sensor = unpaced(&spec());
        sensor.connect().unwrap();
        sensor.configure(&SensorOption::Fps(60)).unwrap();
        match sensor.acquire().unwrap().payload {
            FramePayload::Image(image) => assert_eq!((image.width, image.height), (320, 240)),
            _ => panic!("expected image"),
        }
        assert!(sensor.configure(&SensorOption::Fps(45)).is_err());
    }

    #[test]
    fn unsupported_option_rejected() {
        let mut sensor = unpaced(&spec());
        let err = sensor
            .configure(&SensorOption::PlaybackSpeed(2.0))
            .unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn rgb_range_enforced() {
        let mut sensor = unpaced(&spec());
        sensor.connect().unwrap();
        assert!(sensor.configure(&SensorOption::Rgb([15, 0, 7])).is_ok());
        assert!(sensor.configure(&SensorOption::Rgb([16, 0, 0])).is_err());
    }

    #[test]
    fn release_keeps_failed_state() {
        let mut sensor = unpaced(&spec());
        sensor.connect().unwrap();
        sensor.mark_failed();
        sensor.release();
        assert_eq!(sensor.connection_state(), ConnectionState::Failed);
    }

    #[test]
    fn calibrate_returns_baseline() {
        let mut sensor = unpaced(&spec());
        sensor.connect().unwrap();
        let baseline = sensor.calibrate(4, 2).unwrap();
        assert!(matches!(baseline.payload, FramePayload::Image(_)));
    }
}
