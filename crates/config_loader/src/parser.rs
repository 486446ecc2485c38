//! Config parsing module
//!
//! Supports TOML (primary) and JSON (optional) formats.

use contracts::RigError;

use crate::doc::GroupDoc;

/// Config document format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a TOML group document
pub fn parse_toml(content: &str) -> Result<GroupDoc, RigError> {
    toml::from_str(content).map_err(|e| RigError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse a JSON group document
pub fn parse_json(content: &str) -> Result<GroupDoc, RigError> {
    serde_json::from_str(content).map_err(|e| RigError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse a group document in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<GroupDoc, RigError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
group_name = "hand"
destination = "datasets/hand.trec"

[[sensors]]
sensor_type = "digit"
sensor_name = "thumb"
serial_id = "D20501"
sampling_frequency = 60.0
recording_frequency = 30.0

[[sensors]]
sensor_type = "gelsight_mini"
sensor_name = "index"

[[payload]]
type = "slider"
label = "force"
min_value = 0.0
max_value = 10.0
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let doc = result.unwrap();
        assert_eq!(doc.group_name, "hand");
        assert_eq!(doc.sensors.len(), 2);
        assert_eq!(doc.payload.len(), 1);
        assert_eq!(doc.sensors[0].serial_id.as_deref(), Some("D20501"));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "group_name": "hand",
            "sensors": [{
                "sensor_type": "digit",
                "sensor_name": "thumb",
                "serial_id": "D20501"
            }],
            "payload": [{
                "type": "checkbox",
                "label": "contact",
                "default": true
            }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let doc = result.unwrap();
        assert_eq!(doc.payload[0].default, Some(serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, RigError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
