//! Serialization support for veles types.
//!
//! When the `serde` feature is enabled, every serde-capable type in the
//! crate picks up the [`Serializable`] helpers through a blanket
//! implementation.
//!
//! # Supported Formats
//!
//! - **Binary** - Fast binary serialization using bincode (default)
//! - **JSON** - Human-readable JSON format using serde_json
//!
//! # Example
//!
//! ```rust
//! use veles::connections::Connections;
//! use veles::serialization::{Serializable, SerializableFormat};
//!
//! let connections = Connections::new(128);
//!
//! let bytes = connections.to_bytes(SerializableFormat::Binary).unwrap();
//! let restored = Connections::from_bytes(&bytes, SerializableFormat::Binary).unwrap();
//! assert_eq!(connections, restored);
//! ```

use crate::error::{Result, VelesError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

/// Serialization format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SerializableFormat {
    /// Fast binary serialization (default).
    /// Platform-specific, most efficient for storage and speed.
    #[default]
    Binary,

    /// Human-readable JSON format.
    /// Useful for debugging and interoperability.
    Json,
}

impl std::fmt::Display for SerializableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializableFormat::Binary => write!(f, "BINARY"),
            SerializableFormat::Json => write!(f, "JSON"),
        }
    }
}

impl std::str::FromStr for SerializableFormat {
    type Err = VelesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "BINARY" | "BIN" => Ok(SerializableFormat::Binary),
            "JSON" => Ok(SerializableFormat::Json),
            _ => Err(VelesError::InvalidParameter {
                name: "format",
                message: format!("Unknown format '{}'. Expected: BINARY, JSON", s),
            }),
        }
    }
}

/// Trait for types that can be serialized and deserialized.
///
/// Provides a unified interface for saving and loading to various formats
/// and destinations. The stream methods are named `write_to`/`read_from`;
/// the connectivity store's snapshot contract keeps the bare `save`/`load`
/// names for its inherent methods.
pub trait Serializable: Serialize + DeserializeOwned + Sized {
    /// Serializes to a byte vector.
    fn to_bytes(&self, format: SerializableFormat) -> Result<Vec<u8>> {
        match format {
            SerializableFormat::Binary => {
                bincode::serialize(self).map_err(|e| VelesError::SerializationError {
                    message: format!("Binary serialization failed: {}", e),
                })
            }
            SerializableFormat::Json => {
                serde_json::to_vec_pretty(self).map_err(|e| VelesError::SerializationError {
                    message: format!("JSON serialization failed: {}", e),
                })
            }
        }
    }

    /// Deserializes from a byte slice.
    fn from_bytes(bytes: &[u8], format: SerializableFormat) -> Result<Self> {
        match format {
            SerializableFormat::Binary => {
                bincode::deserialize(bytes).map_err(|e| VelesError::SerializationError {
                    message: format!("Binary deserialization failed: {}", e),
                })
            }
            SerializableFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| VelesError::SerializationError {
                    message: format!("JSON deserialization failed: {}", e),
                })
            }
        }
    }

    /// Serializes to a JSON string.
    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| VelesError::SerializationError {
            message: format!("JSON serialization failed: {}", e),
        })
    }

    /// Deserializes from a JSON string.
    fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| VelesError::SerializationError {
            message: format!("JSON deserialization failed: {}", e),
        })
    }

    /// Serializes to a writer.
    fn write_to<W: Write>(&self, writer: W, format: SerializableFormat) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        match format {
            SerializableFormat::Binary => bincode::serialize_into(&mut writer, self).map_err(
                |e| VelesError::SerializationError {
                    message: format!("Binary serialization failed: {}", e),
                },
            )?,
            SerializableFormat::Json => serde_json::to_writer_pretty(&mut writer, self).map_err(
                |e| VelesError::SerializationError {
                    message: format!("JSON serialization failed: {}", e),
                },
            )?,
        }
        writer.flush().map_err(|e| VelesError::IoError {
            message: format!("Flush failed: {}", e),
        })
    }

    /// Deserializes from a reader.
    fn read_from<R: Read>(reader: R, format: SerializableFormat) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        match format {
            SerializableFormat::Binary => bincode::deserialize_from(&mut reader).map_err(|e| {
                VelesError::SerializationError {
                    message: format!("Binary deserialization failed: {}", e),
                }
            }),
            SerializableFormat::Json => serde_json::from_reader(&mut reader).map_err(|e| {
                VelesError::SerializationError {
                    message: format!("JSON deserialization failed: {}", e),
                }
            }),
        }
    }

    /// Saves to a file, inferring the format from the extension
    /// (`.json` -> JSON, anything else -> binary).
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let format = infer_format_from_path(path.as_ref());
        let file = File::create(path.as_ref()).map_err(|e| VelesError::IoError {
            message: format!("Failed to create file: {}", e),
        })?;
        self.write_to(file, format)
    }

    /// Loads from a file, inferring the format from the extension
    /// (`.json` -> JSON, anything else -> binary).
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = infer_format_from_path(path.as_ref());
        let file = File::open(path.as_ref()).map_err(|e| VelesError::IoError {
            message: format!("Failed to open file: {}", e),
        })?;
        Self::read_from(file, format)
    }
}

/// Blanket implementation for all types that implement Serialize + DeserializeOwned.
impl<T> Serializable for T where T: Serialize + DeserializeOwned + Sized {}

/// Infers serialization format from file extension.
fn infer_format_from_path(path: &Path) -> SerializableFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => SerializableFormat::Json,
        _ => SerializableFormat::Binary,
    }
}
