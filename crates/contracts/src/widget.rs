//! Annotation widget schema and values
//!
//! Widgets are declared once per group; their current values are mutated
//! externally between captures and snapshotted into every record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::RigError;

/// Widget declaration: label, kind, constraints, default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetSpec {
    /// Numeric range
    Slider {
        label: String,
        #[serde(default)]
        min_value: f64,
        #[serde(default = "default_slider_max")]
        max_value: f64,
        #[serde(default = "default_step")]
        step: f64,
        #[serde(default)]
        default: f64,
    },
    /// Free text
    TextInput {
        label: String,
        #[serde(default)]
        default: String,
    },
    /// Boolean toggle
    Checkbox {
        label: String,
        #[serde(default)]
        default: bool,
    },
    /// Single choice from enumerated options
    Selectbox {
        label: String,
        options: Vec<String>,
        default: String,
    },
    /// Multiple choice from enumerated options
    Multiselect {
        label: String,
        options: Vec<String>,
        #[serde(default)]
        default: Vec<String>,
    },
}

fn default_slider_max() -> f64 {
    10.0
}

fn default_step() -> f64 {
    1.0
}

impl WidgetSpec {
    pub fn label(&self) -> &str {
        match self {
            WidgetSpec::Slider { label, .. }
            | WidgetSpec::TextInput { label, .. }
            | WidgetSpec::Checkbox { label, .. }
            | WidgetSpec::Selectbox { label, .. }
            | WidgetSpec::Multiselect { label, .. } => label,
        }
    }

    /// Check the declaration itself (range sanity, default within
    /// constraints). Violations are configuration errors.
    pub fn validate(&self) -> Result<(), RigError> {
        match self {
            WidgetSpec::Slider {
                label,
                min_value,
                max_value,
                step,
                default,
            } => {
                if min_value > max_value {
                    return Err(RigError::config_validation(
                        format!("payload[{label}]"),
                        format!("min_value ({min_value}) must be <= max_value ({max_value})"),
                    ));
                }
                if *step <= 0.0 {
                    return Err(RigError::config_validation(
                        format!("payload[{label}].step"),
                        format!("step must be > 0, got {step}"),
                    ));
                }
                if default < min_value || default > max_value {
                    return Err(RigError::config_validation(
                        format!("payload[{label}].default"),
                        format!("default {default} outside [{min_value}, {max_value}]"),
                    ));
                }
            }
            WidgetSpec::TextInput { .. } | WidgetSpec::Checkbox { .. } => {}
            WidgetSpec::Selectbox {
                label,
                options,
                default,
            } => {
                if options.is_empty() {
                    return Err(RigError::config_validation(
                        format!("payload[{label}].options"),
                        "options must not be empty",
                    ));
                }
                if !options.contains(default) {
                    return Err(RigError::config_validation(
                        format!("payload[{label}].default"),
                        format!("default '{default}' is not one of the declared options"),
                    ));
                }
            }
            WidgetSpec::Multiselect {
                label,
                options,
                default,
            } => {
                for value in default {
                    if !options.contains(value) {
                        return Err(RigError::config_validation(
                            format!("payload[{label}].default"),
                            format!("default entry '{value}' is not one of the declared options"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Default value per the declaration.
    pub fn default_value(&self) -> PayloadValue {
        match self {
            WidgetSpec::Slider { default, .. } => PayloadValue::Number(*default),
            WidgetSpec::TextInput { default, .. } => PayloadValue::Text(default.clone()),
            WidgetSpec::Checkbox { default, .. } => PayloadValue::Flag(*default),
            WidgetSpec::Selectbox { default, .. } => PayloadValue::Choice(default.clone()),
            WidgetSpec::Multiselect { default, .. } => PayloadValue::Choices(default.clone()),
        }
    }

    /// Check a candidate value against this widget's kind and constraints.
    pub fn accepts(&self, value: &PayloadValue) -> Result<(), RigError> {
        let label = self.label();
        match (self, value) {
            (
                WidgetSpec::Slider {
                    min_value,
                    max_value,
                    ..
                },
                PayloadValue::Number(n),
            ) => {
                if n < min_value || n > max_value {
                    return Err(RigError::payload_validation(
                        label,
                        format!("value {n} outside [{min_value}, {max_value}]"),
                    ));
                }
                Ok(())
            }
            (WidgetSpec::TextInput { .. }, PayloadValue::Text(_)) => Ok(()),
            (WidgetSpec::Checkbox { .. }, PayloadValue::Flag(_)) => Ok(()),
            (WidgetSpec::Selectbox { options, .. }, PayloadValue::Choice(choice)) => {
                if !options.contains(choice) {
                    return Err(RigError::payload_validation(
                        label,
                        format!("'{choice}' is not one of the declared options"),
                    ));
                }
                Ok(())
            }
            (WidgetSpec::Multiselect { options, .. }, PayloadValue::Choices(choices)) => {
                for choice in choices {
                    if !options.contains(choice) {
                        return Err(RigError::payload_validation(
                            label,
                            format!("'{choice}' is not one of the declared options"),
                        ));
                    }
                }
                Ok(())
            }
            (_, other) => Err(RigError::payload_validation(
                label,
                format!("value kind '{}' does not match widget kind", other.kind()),
            )),
        }
    }
}

/// Current value of one widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadValue {
    Number(f64),
    Text(String),
    Flag(bool),
    Choice(String),
    Choices(Vec<String>),
}

impl PayloadValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PayloadValue::Number(_) => "number",
            PayloadValue::Text(_) => "text",
            PayloadValue::Flag(_) => "flag",
            PayloadValue::Choice(_) => "choice",
            PayloadValue::Choices(_) => "choices",
        }
    }
}

/// Point-in-time capture of every widget's value, keyed by label.
///
/// Reading a snapshot never fails; widgets never explicitly set carry
/// their declared default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayloadSnapshot(pub BTreeMap<String, PayloadValue>);

impl PayloadSnapshot {
    pub fn get(&self, label: &str) -> Option<&PayloadValue> {
        self.0.get(label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
