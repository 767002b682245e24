use std::{io, path::StripPrefixError};

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use serde_yaml::Error as YamlError;
use thiserror::Error;
use walkdir::Error as WalkDirError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum ConvertError {
    #[error("Note codec error: {0}")]
    Codec(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl From<StripPrefixError> for ConvertError {
    fn from(src: StripPrefixError) -> ConvertError {
        ConvertError::NotFound(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for ConvertError {
    fn from(src: toml::de::Error) -> ConvertError {
        ConvertError::Config(format!("Toml deserialization error: {src}"))
    }
}

impl From<JsonError> for ConvertError {
    fn from(src: JsonError) -> ConvertError {
        ConvertError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<YamlError> for ConvertError {
    fn from(src: YamlError) -> ConvertError {
        ConvertError::Serialization(format!("YAML deserialization error: {src}"))
    }
}

impl From<WalkDirError> for ConvertError {
    fn from(src: WalkDirError) -> ConvertError {
        let path = src.path().map(|p| p.to_path_buf());
        match src.into_io_error() {
            Some(io_error) => ConvertError::from(io_error),
            None => ConvertError::Io(format!("Directory traversal failed at {path:?}")),
        }
    }
}

impl From<io::Error> for ConvertError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => ConvertError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied,
            io::ErrorKind::InvalidData => ConvertError::Codec(format!("Unreadable note text: {x}")),
            _ => ConvertError::Io(format!("IOError: {}", x.kind())),
        }
    }
}
