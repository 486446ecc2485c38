//! Frame - the unit of sensor output
//!
//! One timestamped sample from one sensor, with a typed payload whose
//! interpretation is owned by the producing sensor variant.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{RigError, SensorId};

/// One sample emitted by a sensor.
///
/// Immutable once produced. `timestamp` is seconds since the sensor
/// connected (live variants) or the originating record timestamp
/// (replay variant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Name of the producing sensor
    pub sensor: SensorId,

    /// Seconds (f64)
    pub timestamp: f64,

    /// Data payload
    pub payload: FramePayload,
}

impl Frame {
    /// Discriminant name of the payload, for display and logging.
    pub fn payload_kind(&self) -> &'static str {
        match self.payload {
            FramePayload::Image(_) => "image",
            FramePayload::Audio(_) => "audio",
            FramePayload::Telemetry(_) => "telemetry",
        }
    }

    /// Element-wise average of a non-empty set of frames.
    ///
    /// Used as the calibration baseline: image frames average per byte,
    /// telemetry frames average per field. Audio frames cannot be
    /// averaged. All frames must share the payload shape of the first.
    pub fn average(frames: &[Frame]) -> Result<Frame, RigError> {
        let first = frames.first().ok_or_else(|| {
            RigError::acquisition("<calibration>", "cannot average an empty frame set")
        })?;

        let payload = match &first.payload {
            FramePayload::Image(image) => {
                let mut sums = vec![0u64; image.data.len()];
                for frame in frames {
                    let FramePayload::Image(other) = &frame.payload else {
                        return Err(RigError::acquisition(
                            first.sensor.as_str(),
                            "cannot average frames of mixed payload kinds",
                        ));
                    };
                    if other.data.len() != sums.len() {
                        return Err(RigError::acquisition(
                            first.sensor.as_str(),
                            "cannot average image frames of differing sizes",
                        ));
                    }
                    for (sum, byte) in sums.iter_mut().zip(other.data.iter()) {
                        *sum += u64::from(*byte);
                    }
                }
                let count = frames.len() as u64;
                let data: Vec<u8> = sums.iter().map(|s| (s / count) as u8).collect();
                FramePayload::Image(ImageData {
                    width: image.width,
                    height: image.height,
                    format: image.format,
                    data: Bytes::from(data),
                })
            }
            FramePayload::Telemetry(_) => {
                let mut acc = TelemetryData::default();
                for frame in frames {
                    let FramePayload::Telemetry(t) = &frame.payload else {
                        return Err(RigError::acquisition(
                            first.sensor.as_str(),
                            "cannot average frames of mixed payload kinds",
                        ));
                    };
                    acc.pressure_hpa += t.pressure_hpa;
                    acc.accelerometer.x += t.accelerometer.x;
                    acc.accelerometer.y += t.accelerometer.y;
                    acc.accelerometer.z += t.accelerometer.z;
                    acc.gyroscope.x += t.gyroscope.x;
                    acc.gyroscope.y += t.gyroscope.y;
                    acc.gyroscope.z += t.gyroscope.z;
                }
                let n = frames.len() as f64;
                acc.pressure_hpa /= n;
                acc.accelerometer.x /= n;
                acc.accelerometer.y /= n;
                acc.accelerometer.z /= n;
                acc.gyroscope.x /= n;
                acc.gyroscope.y /= n;
                acc.gyroscope.z /= n;
                FramePayload::Telemetry(acc)
            }
            FramePayload::Audio(_) => {
                return Err(RigError::acquisition(
                    first.sensor.as_str(),
                    "audio frames cannot be averaged",
                ));
            }
        };

        Ok(Frame {
            sensor: first.sensor.clone(),
            timestamp: first.timestamp,
            payload,
        })
    }
}

/// Frame data payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FramePayload {
    /// Tactile image (the primary stream of every supported device family)
    Image(ImageData),

    /// Contact microphone audio
    Audio(AudioData),

    /// Pressure + IMU telemetry
    Telemetry(TelemetryData),
}

/// Tactile image data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// Image width
    pub width: u32,

    /// Image height
    pub height: u32,

    /// Pixel format
    pub format: ImageFormat,

    /// Raw pixel data (zero-copy)
    pub data: Bytes,
}

/// Pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Rgb8,
    Bgr8,
    Gray8,
}

impl ImageFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ImageFormat::Rgb8 | ImageFormat::Bgr8 => 3,
            ImageFormat::Gray8 => 1,
        }
    }
}

/// Contact microphone audio data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioData {
    /// Sample rate (Hz)
    pub sample_rate_hz: u32,

    /// PCM samples (s16le)
    pub data: Bytes,
}

/// Pressure + IMU telemetry data
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TelemetryData {
    /// Barometric pressure (hPa)
    pub pressure_hpa: f64,

    /// Accelerometer (m/s²)
    pub accelerometer: Vector3,

    /// Gyroscope (rad/s)
    pub gyroscope: Vector3,
}

/// 3D vector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_frame(ts: f64, data: Vec<u8>) -> Frame {
        Frame {
            sensor: "s".into(),
            timestamp: ts,
            payload: FramePayload::Image(ImageData {
                width: 2,
                height: 1,
                format: ImageFormat::Gray8,
                data: Bytes::from(data),
            }),
        }
    }

    #[test]
    fn average_of_image_frames() {
        let frames = vec![image_frame(0.0, vec![0, 100]), image_frame(0.1, vec![50, 200])];
        let avg = Frame::average(&frames).unwrap();
        match avg.payload {
            FramePayload::Image(image) => assert_eq!(image.data.as_ref(), &[25, 150]),
            _ => panic!("expected image payload"),
        }
    }

    #[test]
    fn average_of_empty_set_fails() {
        assert!(Frame::average(&[]).is_err());
    }

    #[test]
    fn average_rejects_mismatched_sizes() {
        let frames = vec![image_frame(0.0, vec![0, 100]), image_frame(0.1, vec![50])];
        assert!(Frame::average(&frames).is_err());
    }

    #[test]
    fn payload_kind_names() {
        let frame = image_frame(0.0, vec![1]);
        assert_eq!(frame.payload_kind(), "image");
    }
}
