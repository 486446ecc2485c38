//! Digit360 sensor variant
//!
//! The device carries a camera, contact microphones, and a
//! pressure/IMU unit; `acquire` exposes the camera stream. Recognized
//! options: led_values (eight RGB triplets for the illumination ring).

use std::time::Instant;

use tracing::debug;

use contracts::{
    ConnectionState, Frame, ImageFormat, RigError, SensorId, SensorKind, SensorOption, SensorSpec,
    TouchSensor,
};

use crate::link::{DeviceLink, LinkError};
use crate::synthetic::SyntheticLink;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// A Digit360 tactile sensor.
pub struct Digit360Sensor {
    name: SensorId,
    serial_id: String,
    sampling_frequency: f64,
    recording_frequency: f64,
    led_values: [[u8; 3]; 8],
    link: Box<dyn DeviceLink>,
    state: ConnectionState,
    connected_at: Option<Instant>,
}

impl Digit360Sensor {
    pub fn from_spec(spec: &SensorSpec) -> Result<Self, RigError> {
        let link = SyntheticLink::image(WIDTH, HEIGHT, ImageFormat::Rgb8, spec.sampling_frequency);
        Self::with_link(spec, Box::new(link))
    }

    pub fn with_link(spec: &SensorSpec, link: Box<dyn DeviceLink>) -> Result<Self, RigError> {
        let serial_id = spec.serial_id.clone().ok_or_else(|| {
            RigError::config_validation(
                format!("sensors[{}].serial_id", spec.name),
                "serial_id is mandatory for digit360 sensors",
            )
        })?;

        Ok(Self {
            name: spec.name.clone(),
            serial_id,
            sampling_frequency: spec.sampling_frequency,
            recording_frequency: spec.recording_frequency,
            led_values: spec.led_values.unwrap_or([[0; 3]; 8]),
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

impl TouchSensor for Digit360Sensor {
    fn name(&self) -> &SensorId {
        &self.name
    }

    fn kind(&self) -> SensorKind {
        SensorKind::Digit360
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
                format!("digit360 '{}' unreachable: {msg}", self.serial_id),
            ),
            other => RigError::connection(self.name.as_str(), other.to_string()),
        })?;

        self.link
            .apply(&SensorOption::LedValues(Box::new(self.led_values)))
            .map_err(|e| self.link_err(e))?;

        self.state = ConnectionState::Connected;
        self.connected_at = Some(Instant::now());
        debug!(sensor = %self.name, serial = %self.serial_id, "digit360 connected");
        Ok(())
    }

    fn configure(&mut self, option: &SensorOption) -> Result<(), RigError> {
        match option {
            SensorOption::LedValues(values) => {
                self.link.apply(option).map_err(|e| self.link_err(e))?;
                self.led_values = **values;
                Ok(())
            }
            unsupported => Err(RigError::config_validation(
                format!("{}.{}", self.name, unsupported.name()),
                "option not supported by digit360 sensors",
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
        debug!(sensor = %self.name, state = %self.state, "digit360 released");
    }
}

impl Drop for Digit360Sensor {
    fn drop(&mut self) {
        self.link.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unpaced() -> Digit360Sensor {
        let spec = SensorSpec::new("palm", SensorKind::Digit360).with_serial("D360-07");
        let link =
            SyntheticLink::image(WIDTH, HEIGHT, ImageFormat::Rgb8, spec.sampling_frequency)
                .unpaced();
        Digit360Sensor::with_link(&spec, Box::new(link)).unwrap()
    }

    #[test]
    fn serial_is_mandatory() {
        let spec = SensorSpec::new("palm", SensorKind::Digit360);
        assert!(Digit360Sensor::from_spec(&spec).is_err());
    }

    #[test]
    fn led_option_accepted_others_rejected() {
        let mut sensor = unpaced();
        sensor.connect().unwrap();
        let leds = Box::new([[255, 0, 0]; 8]);
        assert!(sensor.configure(&SensorOption::LedValues(leds)).is_ok());
        assert!(sensor.configure(&SensorOption::Fps(30)).is_err());
    }

    #[test]
    fn streams_camera_frames() {
        let mut sensor = unpaced();
        sensor.connect().unwrap();
        let frame = sensor.acquire().unwrap();
        assert_eq!(frame.payload_kind(), "image");
    }
}
