//! Operation names understood by the host.
//!
//! The envelope `type` field carries one of these names verbatim.
//!
//! | Operation | Payload |
//! |-----------|---------|
//! | `INIT_APP` | none |
//! | `GET_APP_INFO` | none |
//! | `LOAD_HTML` | content locator (string) |
//! | `READ_FILE` | `{ path }` |
//! | `WRITE_FILE` | `{ path, content }` |
//! | `LIST_DIRECTORY` | `{ path }` |
//! | `SPAWN_WINDOW` | `{ htmlPath, title, width, height }` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Operation
// ============================================================================

/// A named host operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Fetch application bootstrap data.
    InitApp,
    /// Fetch application metadata.
    GetAppInfo,
    /// Load an HTML resource bundled with the host.
    LoadHtml,
    /// Read a file from disk.
    ReadFile,
    /// Write a file to disk.
    WriteFile,
    /// List a directory.
    ListDirectory,
    /// Open a new native window.
    SpawnWindow,
}

impl Operation {
    /// Returns the wire name of the operation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InitApp => "INIT_APP",
            Self::GetAppInfo => "GET_APP_INFO",
            Self::LoadHtml => "LOAD_HTML",
            Self::ReadFile => "READ_FILE",
            Self::WriteFile => "WRITE_FILE",
            Self::ListDirectory => "LIST_DIRECTORY",
            Self::SpawnWindow => "SPAWN_WINDOW",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for op in [
            Operation::InitApp,
            Operation::GetAppInfo,
            Operation::LoadHtml,
            Operation::ReadFile,
            Operation::WriteFile,
            Operation::ListDirectory,
            Operation::SpawnWindow,
        ] {
            let json = serde_json::to_string(&op).expect("serialize");
            assert_eq!(json, format!("\"{}\"", op.as_str()));
        }
    }

    #[test]
    fn test_parse_from_wire() {
        let op: Operation = serde_json::from_str("\"LOAD_HTML\"").expect("parse");
        assert_eq!(op, Operation::LoadHtml);
    }
}
