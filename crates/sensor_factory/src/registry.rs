//! Sensor registry - kind to constructor dispatch
//!
//! An explicit map resolved at group-assembly time; no runtime
//! reflection. Custom variants (e.g. a real vendor binding wrapping its
//! own `DeviceLink`) can be registered over the builtin constructors.

use std::collections::HashMap;

use contracts::{RigError, SensorKind, SensorSpec, TouchSensor};

use crate::digit::DigitSensor;
use crate::digit360::Digit360Sensor;
use crate::gelsight_mini::GelsightMiniSensor;
use crate::replay::ReplaySensor;

/// Constructor signature: validated spec in, boxed sensor out.
pub type SensorCtor = fn(&SensorSpec) -> Result<Box<dyn TouchSensor>, RigError>;

/// Explicit kind → constructor registry.
pub struct SensorRegistry {
    ctors: HashMap<SensorKind, SensorCtor>,
}

impl SensorRegistry {
    /// Registry with all builtin variants.
    pub fn builtin() -> Self {
        let mut registry = Self {
            ctors: HashMap::new(),
        };
        registry.register(SensorKind::Digit, |spec| {
            Ok(Box::new(DigitSensor::from_spec(spec)?))
        });
        registry.register(SensorKind::GelsightMini, |spec| {
            Ok(Box::new(GelsightMiniSensor::from_spec(spec)?))
        });
        registry.register(SensorKind::Digit360, |spec| {
            Ok(Box::new(Digit360Sensor::from_spec(spec)?))
        });
        registry.register(SensorKind::Replay, |spec| {
            Ok(Box::new(ReplaySensor::load(spec)?))
        });
        registry
    }

    /// Register (or override) a constructor for a kind.
    pub fn register(&mut self, kind: SensorKind, ctor: SensorCtor) {
        self.ctors.insert(kind, ctor);
    }

    /// Build one sensor from its spec.
    pub fn build(&self, spec: &SensorSpec) -> Result<Box<dyn TouchSensor>, RigError> {
        let ctor = self.ctors.get(&spec.kind).ok_or_else(|| {
            RigError::config_validation(
                format!("sensors[{}].sensor_type", spec.name),
                format!("no constructor registered for '{}'", spec.kind),
            )
        })?;
        ctor(spec)
    }
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_builds_every_live_kind() {
        let registry = SensorRegistry::builtin();

        let digit = SensorSpec::new("a", SensorKind::Digit).with_serial("D1");
        assert_eq!(registry.build(&digit).unwrap().kind(), SensorKind::Digit);

        let gelsight = SensorSpec::new("b", SensorKind::GelsightMini);
        assert_eq!(
            registry.build(&gelsight).unwrap().kind(),
            SensorKind::GelsightMini
        );

        let digit360 = SensorSpec::new("c", SensorKind::Digit360).with_serial("D360");
        assert_eq!(
            registry.build(&digit360).unwrap().kind(),
            SensorKind::Digit360
        );
    }

    #[test]
    fn spec_errors_propagate() {
        let registry = SensorRegistry::builtin();
        // digit without serial
        let spec = SensorSpec::new("a", SensorKind::Digit);
        assert!(registry.build(&spec).is_err());
    }

    #[test]
    fn custom_constructor_overrides_builtin() {
        let mut registry = SensorRegistry::builtin();
        registry.register(SensorKind::GelsightMini, |_spec| {
            Err(RigError::config_validation("test", "always fails"))
        });
        let spec = SensorSpec::new("b", SensorKind::GelsightMini);
        assert!(registry.build(&spec).is_err());
    }
}
