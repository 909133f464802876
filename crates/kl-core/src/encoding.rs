//! Text encodings accepted for migration scripts.

use crate::error::CoreError;
use std::fmt;
use std::str::FromStr;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Encoding used to decode script bytes before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptEncoding {
    /// UTF-8 (default). A leading byte-order mark is stripped.
    #[default]
    Utf8,
    /// ISO-8859-1; every byte maps to the code point of the same value.
    Latin1,
    /// 7-bit US-ASCII; any byte above 0x7F is rejected.
    Ascii,
}

impl ScriptEncoding {
    /// Canonical label, as used in configuration and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ScriptEncoding::Utf8 => "utf-8",
            ScriptEncoding::Latin1 => "iso-8859-1",
            ScriptEncoding::Ascii => "us-ascii",
        }
    }

    /// Decode raw bytes into a `String`.
    ///
    /// The error string describes the first offending byte.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, String> {
        match self {
            ScriptEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                String::from_utf8(bytes.to_vec()).map_err(|e| e.utf8_error().to_string())
            }
            ScriptEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            ScriptEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(format!("non-ASCII byte 0x{:02X} at offset {pos}", bytes[pos])),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
        }
    }
}

impl FromStr for ScriptEncoding {
    type Err = CoreError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(ScriptEncoding::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(ScriptEncoding::Latin1),
            "us-ascii" | "ascii" => Ok(ScriptEncoding::Ascii),
            _ => Err(CoreError::UnsupportedEncoding {
                label: label.to_string(),
            }),
        }
    }
}

impl fmt::Display for ScriptEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
