//! Config validation module
//!
//! Pure validation: a raw `GroupDoc` in, either a fully-typed
//! `GroupBlueprint` or the complete list of configuration errors out.
//! Nothing here touches hardware.
//!
//! Rules:
//! - sensor_name unique, widget label unique
//! - sensor_type resolves against the known kinds
//! - 0 < recording_frequency <= sampling_frequency (recording defaults
//!   to sampling when absent)
//! - per-kind mandatory fields present, unsupported fields unset
//! - widget declarations self-consistent (defaults within constraints)

use std::collections::HashSet;

use contracts::{
    GroupBlueprint, Resolution, RigError, SensorKind, SensorSpec, WidgetSpec, DEFAULT_SAMPLING_HZ,
};

use crate::doc::{GroupDoc, SensorDoc, WidgetDoc};

/// Validate a raw document, collecting every error found.
pub fn validate(doc: &GroupDoc) -> Result<GroupBlueprint, Vec<RigError>> {
    let mut errors = Vec::new();

    if doc.group_name.trim().is_empty() {
        errors.push(RigError::config_validation(
            "group_name",
            "group name cannot be empty",
        ));
    }

    if doc.sensors.is_empty() {
        errors.push(RigError::config_validation(
            "sensors",
            "a group needs at least one sensor",
        ));
    }

    if let Some(freq) = doc.group_frequency {
        if freq <= 0.0 {
            errors.push(RigError::config_validation(
                "group_frequency",
                format!("group_frequency must be > 0, got {freq}"),
            ));
        }
    }

    let mut seen_names = HashSet::new();
    for sensor in &doc.sensors {
        if !seen_names.insert(sensor.sensor_name.as_str()) {
            errors.push(RigError::config_validation(
                format!("sensors[name={}]", sensor.sensor_name),
                "duplicate sensor_name",
            ));
        }
    }

    let mut sensors = Vec::with_capacity(doc.sensors.len());
    for sensor in &doc.sensors {
        if let Some(spec) = validate_sensor(sensor, &mut errors) {
            sensors.push(spec);
        }
    }

    let mut seen_labels = HashSet::new();
    let mut payload = Vec::with_capacity(doc.payload.len());
    for (idx, widget) in doc.payload.iter().enumerate() {
        if let Some(spec) = validate_widget(idx, widget, &mut errors) {
            if !seen_labels.insert(spec.label().to_string()) {
                errors.push(RigError::config_validation(
                    format!("payload[{}]", spec.label()),
                    "duplicate widget label",
                ));
            }
            payload.push(spec);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(GroupBlueprint {
        group_name: doc.group_name.clone(),
        destination: doc.destination.clone(),
        group_frequency: doc.group_frequency,
        sensors,
        payload,
    })
}

fn validate_sensor(doc: &SensorDoc, errors: &mut Vec<RigError>) -> Option<SensorSpec> {
    let field = |suffix: &str| format!("sensors[{}].{}", doc.sensor_name, suffix);

    let Some(kind) = SensorKind::from_tag(&doc.sensor_type) else {
        errors.push(RigError::config_validation(
            field("sensor_type"),
            format!("unknown sensor_type '{}'", doc.sensor_type),
        ));
        return None;
    };

    let sampling = doc.sampling_frequency.unwrap_or(DEFAULT_SAMPLING_HZ);
    if sampling <= 0.0 {
        errors.push(RigError::config_validation(
            field("sampling_frequency"),
            format!("sampling_frequency must be > 0, got {sampling}"),
        ));
    }

    let recording = doc.recording_frequency.unwrap_or(sampling);
    if recording <= 0.0 {
        errors.push(RigError::config_validation(
            field("recording_frequency"),
            format!("recording_frequency must be > 0, got {recording}"),
        ));
    } else if recording > sampling {
        errors.push(RigError::config_validation(
            field("recording_frequency"),
            format!(
                "recording_frequency ({recording}) must be <= sampling_frequency ({sampling})"
            ),
        ));
    }

    let mut spec = SensorSpec::new(doc.sensor_name.as_str(), kind)
        .with_frequencies(sampling, recording);

    // Fields a kind does not support must be unset, not silently dropped.
    let forbid = |errors: &mut Vec<RigError>, set: bool, name: &str| {
        if set {
            errors.push(RigError::config_validation(
                field(name),
                format!("'{name}' is not supported by sensor_type '{}'", kind.tag()),
            ));
        }
    };

    match kind {
        SensorKind::Digit => {
            match &doc.serial_id {
                Some(serial) => spec.serial_id = Some(serial.clone()),
                None => errors.push(RigError::config_validation(
                    field("serial_id"),
                    "serial_id is mandatory for digit sensors",
                )),
            }
            if let Some(rgb) = &doc.rgb {
                match <[u8; 3]>::try_from(rgb.as_slice()) {
                    Ok(triplet) if triplet.iter().all(|v| *v <= 15) => spec.rgb = Some(triplet),
                    Ok(triplet) => errors.push(RigError::config_validation(
                        field("rgb"),
                        format!("rgb channels must be in 0-15, got {triplet:?}"),
                    )),
                    Err(_) => errors.push(RigError::config_validation(
                        field("rgb"),
                        format!("rgb must be exactly 3 channels, got {}", rgb.len()),
                    )),
                }
            }
            if let Some(resolution) = &doc.resolution {
                match resolution.as_str() {
                    "VGA" => spec.resolution = Some(Resolution::Vga),
                    "QVGA" => spec.resolution = Some(Resolution::Qvga),
                    other => errors.push(RigError::config_validation(
                        field("resolution"),
                        format!("resolution must be VGA or QVGA, got '{other}'"),
                    )),
                }
            }
            if let Some(fps) = doc.fps {
                if fps == 30 || fps == 60 {
                    spec.fps = Some(fps);
                } else {
                    errors.push(RigError::config_validation(
                        field("fps"),
                        format!("fps must be 30 or 60, got {fps}"),
                    ));
                }
            }
            forbid(errors, doc.led_values.is_some(), "led_values");
            forbid(errors, doc.source.is_some(), "source");
            forbid(errors, doc.speed.is_some(), "speed");
            forbid(errors, doc.fixed_cadence_hz.is_some(), "fixed_cadence_hz");
        }
        SensorKind::GelsightMini => {
            forbid(errors, doc.serial_id.is_some(), "serial_id");
            forbid(errors, doc.rgb.is_some(), "rgb");
            forbid(errors, doc.resolution.is_some(), "resolution");
            forbid(errors, doc.fps.is_some(), "fps");
            forbid(errors, doc.led_values.is_some(), "led_values");
            forbid(errors, doc.source.is_some(), "source");
            forbid(errors, doc.speed.is_some(), "speed");
            forbid(errors, doc.fixed_cadence_hz.is_some(), "fixed_cadence_hz");
        }
        SensorKind::Digit360 => {
            match &doc.serial_id {
                Some(serial) => spec.serial_id = Some(serial.clone()),
                None => errors.push(RigError::config_validation(
                    field("serial_id"),
                    "serial_id is mandatory for digit360 sensors",
                )),
            }
            if let Some(leds) = &doc.led_values {
                match leds_to_array(leds) {
                    Some(values) => spec.led_values = Some(values),
                    None => errors.push(RigError::config_validation(
                        field("led_values"),
                        "led_values must be eight RGB triplets",
                    )),
                }
            }
            forbid(errors, doc.rgb.is_some(), "rgb");
            forbid(errors, doc.resolution.is_some(), "resolution");
            forbid(errors, doc.fps.is_some(), "fps");
            forbid(errors, doc.source.is_some(), "source");
            forbid(errors, doc.speed.is_some(), "speed");
            forbid(errors, doc.fixed_cadence_hz.is_some(), "fixed_cadence_hz");
        }
        SensorKind::Replay => {
            match &doc.source {
                Some(source) => spec.source = Some(source.clone()),
                None => errors.push(RigError::config_validation(
                    field("source"),
                    "source is mandatory for replay sensors",
                )),
            }
            if let Some(speed) = doc.speed {
                if speed > 0.0 {
                    spec.speed = Some(speed);
                } else {
                    errors.push(RigError::config_validation(
                        field("speed"),
                        format!("speed must be > 0, got {speed}"),
                    ));
                }
            }
            if let Some(cadence) = doc.fixed_cadence_hz {
                if cadence > 0.0 {
                    spec.fixed_cadence_hz = Some(cadence);
                } else {
                    errors.push(RigError::config_validation(
                        field("fixed_cadence_hz"),
                        format!("fixed_cadence_hz must be > 0, got {cadence}"),
                    ));
                }
            }
            forbid(errors, doc.serial_id.is_some(), "serial_id");
            forbid(errors, doc.rgb.is_some(), "rgb");
            forbid(errors, doc.resolution.is_some(), "resolution");
            forbid(errors, doc.fps.is_some(), "fps");
            forbid(errors, doc.led_values.is_some(), "led_values");
        }
    }

    Some(spec)
}

fn leds_to_array(leds: &[Vec<u8>]) -> Option<[[u8; 3]; 8]> {
    if leds.len() != 8 {
        return None;
    }
    let mut values = [[0u8; 3]; 8];
    for (slot, led) in values.iter_mut().zip(leds) {
        *slot = <[u8; 3]>::try_from(led.as_slice()).ok()?;
    }
    Some(values)
}

fn validate_widget(
    idx: usize,
    doc: &WidgetDoc,
    errors: &mut Vec<RigError>,
) -> Option<WidgetSpec> {
    let Some(label) = doc.label.clone().filter(|l| !l.trim().is_empty()) else {
        errors.push(RigError::config_validation(
            format!("payload[{idx}].label"),
            "widget label is mandatory",
        ));
        return None;
    };

    let spec = match doc.widget_type.as_str() {
        "slider" => {
            let min_value = doc.min_value.unwrap_or(0.0);
            let max_value = doc.max_value.unwrap_or(10.0);
            let default = match &doc.default {
                None => min_value,
                Some(value) => match value.as_f64() {
                    Some(n) => n,
                    None => {
                        errors.push(RigError::config_validation(
                            format!("payload[{label}].default"),
                            "slider default must be a number",
                        ));
                        return None;
                    }
                },
            };
            WidgetSpec::Slider {
                label,
                min_value,
                max_value,
                step: doc.step.unwrap_or(1.0),
                default,
            }
        }
        "text_input" => {
            let default = match &doc.default {
                None => String::new(),
                Some(value) => match value.as_str() {
                    Some(s) => s.to_string(),
                    None => {
                        errors.push(RigError::config_validation(
                            format!("payload[{label}].default"),
                            "text_input default must be a string",
                        ));
                        return None;
                    }
                },
            };
            WidgetSpec::TextInput { label, default }
        }
        "checkbox" => {
            let default = match &doc.default {
                None => false,
                Some(value) => match value.as_bool() {
                    Some(b) => b,
                    None => {
                        errors.push(RigError::config_validation(
                            format!("payload[{label}].default"),
                            "checkbox default must be a boolean",
                        ));
                        return None;
                    }
                },
            };
            WidgetSpec::Checkbox { label, default }
        }
        "selectbox" => {
            let options = doc.options.clone().unwrap_or_default();
            let default = match &doc.default {
                None => match options.first() {
                    Some(first) => first.clone(),
                    None => String::new(),
                },
                Some(value) => match value.as_str() {
                    Some(s) => s.to_string(),
                    None => {
                        errors.push(RigError::config_validation(
                            format!("payload[{label}].default"),
                            "selectbox default must be a string",
                        ));
                        return None;
                    }
                },
            };
            WidgetSpec::Selectbox {
                label,
                options,
                default,
            }
        }
        "multiselect" => {
            let options = doc.options.clone().unwrap_or_default();
            let default = match &doc.default {
                None => Vec::new(),
                Some(value) => match string_list(value) {
                    Some(list) => list,
                    None => {
                        errors.push(RigError::config_validation(
                            format!("payload[{label}].default"),
                            "multiselect default must be a list of strings",
                        ));
                        return None;
                    }
                },
            };
            WidgetSpec::Multiselect {
                label,
                options,
                default,
            }
        }
        other => {
            errors.push(RigError::config_validation(
                format!("payload[{label}].type"),
                format!("unknown widget type '{other}'"),
            ));
            return None;
        }
    };

    if let Err(err) = spec.validate() {
        errors.push(err);
        return None;
    }

    Some(spec)
}

fn string_list(value: &serde_json::Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
