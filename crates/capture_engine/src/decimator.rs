//! Rate decimator
//!
//! Decouples a sensor's native sampling cadence from its persisted
//! recording cadence. Rational (Bresenham-style) accumulator: forward a
//! sample whenever the accumulated recording credit reaches one native
//! period. Long-run forwarded fraction converges to `fr/fs` with
//! bounded jitter and no cumulative drift, for any ratio including
//! non-integer ones.

use contracts::RigError;

/// Drift-free fs → fr sample gate.
#[derive(Debug, Clone)]
pub struct RateDecimator {
    fs: f64,
    fr: f64,
    acc: f64,
}

impl RateDecimator {
    /// `fs` is the native sampling frequency, `fr` the target recording
    /// frequency; `0 < fr <= fs` is required.
    pub fn new(fs: f64, fr: f64) -> Result<Self, RigError> {
        if fs <= 0.0 {
            return Err(RigError::config_validation(
                "sampling_frequency",
                format!("sampling_frequency must be > 0, got {fs}"),
            ));
        }
        if fr <= 0.0 {
            return Err(RigError::config_validation(
                "recording_frequency",
                format!("recording_frequency must be > 0, got {fr}"),
            ));
        }
        if fr > fs {
            return Err(RigError::config_validation(
                "recording_frequency",
                format!("recording_frequency ({fr}) must be <= sampling_frequency ({fs})"),
            ));
        }
        Ok(Self { fs, fr, acc: 0.0 })
    }

    /// Decide whether the next native sample is forwarded.
    pub fn admit(&mut self) -> bool {
        self.acc += self.fr;
        if self.acc >= self.fs {
            self.acc -= self.fs;
            true
        } else {
            false
        }
    }

    pub fn sampling_frequency(&self) -> f64 {
        self.fs
    }

    pub fn recording_frequency(&self) -> f64 {
        self.fr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forwarded(fs: f64, fr: f64, samples: usize) -> usize {
        let mut decimator = RateDecimator::new(fs, fr).unwrap();
        (0..samples).filter(|_| decimator.admit()).count()
    }

    #[test]
    fn equal_rates_forward_everything() {
        assert_eq!(forwarded(30.0, 30.0, 1000), 1000);
    }

    #[test]
    fn integer_ratio() {
        // 60 -> 30: every second sample
        assert_eq!(forwarded(60.0, 30.0, 1000), 500);
        // 90 -> 30: every third
        assert_eq!(forwarded(90.0, 30.0, 900), 300);
    }

    #[test]
    fn non_integer_ratio_converges() {
        // 30 -> 7: the forwarded count stays within one sample of the
        // ideal fraction at every prefix length.
        let mut decimator = RateDecimator::new(30.0, 7.0).unwrap();
        let mut count = 0usize;
        for n in 1..=100_000usize {
            if decimator.admit() {
                count += 1;
            }
            let ideal = n as f64 * 7.0 / 30.0;
            assert!(
                (count as f64 - ideal).abs() <= 1.0,
                "drift at n={n}: count={count}, ideal={ideal}"
            );
        }
    }

    #[test]
    fn no_unbounded_drift_over_long_runs() {
        for (fs, fr) in [(60.0, 30.0), (30.0, 29.0), (100.0, 1.0), (44.1, 12.7)] {
            let samples = 1_000_000usize;
            let count = forwarded(fs, fr, samples);
            let ideal = samples as f64 * fr / fs;
            assert!(
                (count as f64 - ideal).abs() <= 1.0,
                "fs={fs} fr={fr}: count={count}, ideal={ideal}"
            );
        }
    }

    #[test]
    fn invalid_configurations_rejected() {
        assert!(RateDecimator::new(30.0, 0.0).is_err());
        assert!(RateDecimator::new(0.0, 10.0).is_err());
        assert!(RateDecimator::new(30.0, 60.0).is_err());
        assert!(RateDecimator::new(30.0, -5.0).is_err());
    }

    #[test]
    fn jitter_bounded_by_one_native_period() {
        // Gaps between forwarded samples differ by at most one native
        // sample for a rational ratio.
        let mut decimator = RateDecimator::new(60.0, 25.0).unwrap();
        let mut gaps = Vec::new();
        let mut since_last = 0usize;
        for _ in 0..10_000 {
            since_last += 1;
            if decimator.admit() {
                gaps.push(since_last);
                since_last = 0;
            }
        }
        let min = *gaps.iter().min().unwrap();
        let max = *gaps.iter().max().unwrap();
        assert!(max - min <= 1, "gap spread {min}..{max}");
    }
}
