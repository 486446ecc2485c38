//! Synthetic device link
//!
//! Generates deterministic pattern frames at the native cadence. Used
//! as the default link when no vendor binding is attached, and by tests
//! (including failure injection).

use std::time::{Duration, Instant};

use bytes::Bytes;

use contracts::{FramePayload, ImageData, ImageFormat, SensorOption};

use crate::link::{DeviceLink, LinkError};

/// Pattern-generating stand-in for a vendor channel.
///
/// Emits the first frame immediately, then paces subsequent frames at
/// the configured interval. Pixel values roll with the frame counter so
/// consecutive frames differ.
pub struct SyntheticLink {
    width: u32,
    height: u32,
    format: ImageFormat,
    interval: Duration,
    open: bool,
    frame_counter: u64,
    next_deadline: Option<Instant>,
    unreachable: bool,
    fail_after: Option<u64>,
}

impl SyntheticLink {
    /// An image-emitting link at `sampling_hz`.
    pub fn image(width: u32, height: u32, format: ImageFormat, sampling_hz: f64) -> Self {
        let interval = if sampling_hz > 0.0 {
            Duration::from_secs_f64(1.0 / sampling_hz)
        } else {
            Duration::ZERO
        };
        Self {
            width,
            height,
            format,
            interval,
            open: false,
            frame_counter: 0,
            next_deadline: None,
            unreachable: false,
            fail_after: None,
        }
    }

    /// Disable pacing; frames are produced as fast as they are pulled.
    pub fn unpaced(mut self) -> Self {
        self.interval = Duration::ZERO;
        self
    }

    /// Make `open` fail, simulating an unplugged device.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Drop the channel after `n` successful payloads.
    pub fn fail_after(mut self, n: u64) -> Self {
        self.fail_after = Some(n);
        self
    }

    fn pace(&mut self) {
        if self.interval.is_zero() {
            return;
        }
        let now = Instant::now();
        match self.next_deadline {
            None => {
                // First frame is immediate.
                self.next_deadline = Some(now + self.interval);
            }
            Some(deadline) => {
                if deadline > now {
                    std::thread::sleep(deadline - now);
                }
                // Schedule from the deadline, not from wake-up time, so
                // sleep overshoot does not accumulate.
                self.next_deadline = Some(deadline + self.interval);
            }
        }
    }

    fn pattern(&self) -> Bytes {
        let bpp = self.format.bytes_per_pixel();
        let len = (self.width as usize) * (self.height as usize) * bpp;
        let roll = (self.frame_counter % 251) as usize;
        let data: Vec<u8> = (0..len).map(|i| ((i + roll) % 256) as u8).collect();
        Bytes::from(data)
    }
}

impl DeviceLink for SyntheticLink {
    fn open(&mut self) -> Result<(), LinkError> {
        if self.unreachable {
            return Err(LinkError::Unreachable("synthetic device marked unreachable".into()));
        }
        self.open = true;
        Ok(())
    }

    fn next_payload(&mut self) -> Result<FramePayload, LinkError> {
        if !self.open {
            return Err(LinkError::Dropped("link not open".into()));
        }
        if let Some(limit) = self.fail_after {
            if self.frame_counter >= limit {
                return Err(LinkError::Dropped("injected channel failure".into()));
            }
        }

        self.pace();

        let payload = FramePayload::Image(ImageData {
            width: self.width,
            height: self.height,
            format: self.format,
            data: self.pattern(),
        });
        self.frame_counter += 1;
        Ok(payload)
    }

    fn apply(&mut self, option: &SensorOption) -> Result<(), LinkError> {
        match option {
            SensorOption::Resolution(resolution) => {
                let (width, height) = resolution.dimensions();
                self.width = width;
                self.height = height;
                Ok(())
            }
            SensorOption::Fps(fps) => {
                if *fps == 0 {
                    return Err(LinkError::Rejected("fps must be > 0".into()));
                }
                if !self.interval.is_zero() {
                    self.interval = Duration::from_secs_f64(1.0 / f64::from(*fps));
                }
                Ok(())
            }
            // Illumination has no observable effect on a pattern
            // generator; the device accepts it.
            SensorOption::Rgb(_) | SensorOption::LedValues(_) => Ok(()),
            SensorOption::PlaybackSpeed(_) => {
                Err(LinkError::Rejected("playback_speed is not a device option".into()))
            }
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.next_deadline = None;
    }
}
