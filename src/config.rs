use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::Path,
};

/// Knobs for a conversion run. Every field has a default, so a config file only needs to name
/// the values it changes.
///
/// ```toml
/// id_prefix = "note-"
/// output_extension = "xml"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Namespace marker placed in front of every note id.
    pub id_prefix: String,
    /// Extension (without the dot) of the note files to pick up.
    pub note_extension: String,
    /// Extension (without the dot) of the generated section files.
    pub output_extension: String,
    /// File name of the generated include manifest.
    pub manifest_name: String,
    /// Number of body characters kept in graph node descriptions.
    pub description_length: usize,
    /// Title written into the metadata of scanned graphs.
    pub graph_title: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            id_prefix: "sec-".to_string(),
            note_extension: "md".to_string(),
            output_extension: "ptx".to_string(),
            manifest_name: "_includes.ptx".to_string(),
            description_length: 100,
            graph_title: "Notes Graph".to_string(),
        }
    }
}

impl ConvertConfig {
    /// Read a TOML config file. A missing file is not an error and yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        tracing::debug!("Attempting to read config from: {:?}", path);
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(ConvertConfig::default());
        }
        let content = read_to_string(path)?;
        let config: ConvertConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConvertError> {
        let toml_string = toml::to_string(self)
            .map_err(|e| ConvertError::Config(format!("Toml serialization error: {e}")))?;
        write(path, toml_string)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.note_extension.is_empty() || self.output_extension.is_empty() {
            return Err(ConvertError::Config(
                "note_extension and output_extension must not be empty".to_string(),
            ));
        }
        if self.manifest_name.is_empty() {
            return Err(ConvertError::Config(
                "manifest_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// File name of the section written for a note id.
    pub fn output_file_name(&self, id: &str) -> String {
        format!("{id}.{}", self.output_extension)
    }
}
