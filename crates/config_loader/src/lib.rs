//! # Config Loader
//!
//! Group-document loading and validation.
//!
//! Responsibilities:
//! - Parse TOML/JSON group documents
//! - Validate document legality (pure, collects every error)
//! - Produce a typed `GroupBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("hand.toml")).unwrap();
//! println!("Group: {}", blueprint.group_name);
//! ```

mod doc;
mod parser;
mod validator;

pub use contracts::GroupBlueprint;
pub use doc::{GroupDoc, SensorDoc, WidgetDoc};
pub use parser::ConfigFormat;
pub use validator::validate;

use contracts::RigError;
use std::path::Path;

/// Group-document loader
///
/// Provides static methods to load a blueprint from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a blueprint from a file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure (the first error; use [`validate`] for the
    ///   full list)
    pub fn load_from_path(path: &Path) -> Result<GroupBlueprint, RigError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a blueprint from a string
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<GroupBlueprint, RigError> {
        let doc = parser::parse(content, format)?;
        validator::validate(&doc).map_err(|mut errors| errors.remove(0))
    }

    /// Parse without validating, exposing the raw document
    pub fn parse_doc(content: &str, format: ConfigFormat) -> Result<GroupDoc, RigError> {
        parser::parse(content, format)
    }

    /// Serialize a GroupBlueprint to a TOML string
    pub fn to_toml(blueprint: &GroupBlueprint) -> Result<String, RigError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| RigError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a GroupBlueprint to a JSON string
    pub fn to_json(blueprint: &GroupBlueprint) -> Result<String, RigError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| RigError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer document format from a file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, RigError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            RigError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| RigError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// Read document content
    fn read_file(path: &Path) -> Result<String, RigError> {
        Ok(std::fs::read_to_string(path)?)
    }
}
