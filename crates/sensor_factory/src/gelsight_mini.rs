//! GelSight Mini sensor variant
//!
//! The device exposes no configurable options; every `configure` call
//! is rejected.

use std::time::Instant;

use tracing::debug;

use contracts::{
    ConnectionState, Frame, ImageFormat, RigError, SensorId, SensorKind, SensorOption, SensorSpec,
    TouchSensor,
};

use crate::link::{DeviceLink, LinkError};
use crate::synthetic::SyntheticLink;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

/// A GelSight Mini tactile sensor.
pub struct GelsightMiniSensor {
    name: SensorId,
    sampling_frequency: f64,
    recording_frequency: f64,
    link: Box<dyn DeviceLink>,
    state: ConnectionState,
    connected_at: Option<Instant>,
}

impl GelsightMiniSensor {
    pub fn from_spec(spec: &SensorSpec) -> Result<Self, RigError> {
        let link = SyntheticLink::image(WIDTH, HEIGHT, ImageFormat::Rgb8, spec.sampling_frequency);
        Ok(Self::with_link(spec, Box::new(link)))
    }

    pub fn with_link(spec: &SensorSpec, link: Box<dyn DeviceLink>) -> Self {
        Self {
            name: spec.name.clone(),
            sampling_frequency: spec.sampling_frequency,
            recording_frequency: spec.recording_frequency,
            link,
            state: ConnectionState::Disconnected,
            connected_at: None,
        }
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

impl TouchSensor for GelsightMiniSensor {
    fn name(&self) -> &SensorId {
        &self.name
    }

    fn kind(&self) -> SensorKind {
        SensorKind::GelsightMini
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
        self.link.open().map_err(|e| self.link_err(e))?;
        self.state = ConnectionState::Connected;
        self.connected_at = Some(Instant::now());
        debug!(sensor = %self.name, "gelsight mini connected");
        Ok(())
    }

    fn configure(&mut self, option: &SensorOption) -> Result<(), RigError> {
        Err(RigError::config_validation(
            format!("{}.{}", self.name, option.name()),
            "gelsight_mini sensors have no configurable options",
        ))
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
        debug!(sensor = %self.name, state = %self.state, "gelsight mini released");
    }
}

impl Drop for GelsightMiniSensor {
    fn drop(&mut self) {
        self.link.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unpaced() -> GelsightMiniSensor {
        let spec = SensorSpec::new("index", SensorKind::GelsightMini);
        let link =
            SyntheticLink::image(WIDTH, HEIGHT, ImageFormat::Rgb8, spec.sampling_frequency)
                .unpaced();
        GelsightMiniSensor::with_link(&spec, Box::new(link))
    }

    #[test]
    fn no_options_supported() {
        let mut sensor = unpaced();
        assert!(sensor.configure(&SensorOption::Fps(30)).is_err());
        assert!(sensor.configure(&SensorOption::Rgb([1, 1, 1])).is_err());
    }

    #[test]
    fn acquire_before_connect_fails() {
        let mut sensor = unpaced();
        assert!(sensor.acquire().is_err());
    }

    #[test]
    fn connect_then_stream() {
        let mut sensor = unpaced();
        sensor.connect().unwrap();
        let frame = sensor.acquire().unwrap();
        assert_eq!(frame.sensor, "index");
        sensor.release();
        assert_eq!(sensor.connection_state(), ConnectionState::Disconnected);
    }
}
