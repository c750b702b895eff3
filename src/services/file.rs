//! File operations on the host.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::bridge::Bridge;
use crate::error::Result;
use crate::protocol::Operation;

use super::call;

// ============================================================================
// Payload Types
// ============================================================================

/// An HTML resource bundled with the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlResource {
    /// Document text.
    pub content: String,
    /// Locator the host resolved.
    pub path: String,
}

/// A file read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    /// File text.
    pub content: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Path as requested.
    pub path: String,
    /// Absolute path on the host, when reported.
    #[serde(default)]
    pub absolute_path: Option<String>,
}

/// Outcome of a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    /// Whether the host wrote the file.
    pub success: bool,
    /// Path written.
    pub path: String,
}

/// One directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name.
    pub name: String,
    /// Entry kind as reported by the host (`file`, `directory`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

// ============================================================================
// FileService
// ============================================================================

/// File access through the host.
#[derive(Debug, Clone)]
pub struct FileService {
    bridge: Bridge,
}

impl FileService {
    /// Creates a file service over `bridge`.
    #[inline]
    #[must_use]
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Loads an HTML resource by locator (`LOAD_HTML`).
    pub async fn load_html(&self, locator: &str) -> Result<HtmlResource> {
        debug!(locator, "Loading HTML via host");
        call(&self.bridge, Operation::LoadHtml, Value::String(locator.to_string())).await
    }

    /// Reads a file (`READ_FILE`).
    pub async fn read_file(&self, path: &str) -> Result<FileContent> {
        call(&self.bridge, Operation::ReadFile, json!({ "path": path })).await
    }

    /// Writes a file (`WRITE_FILE`).
    pub async fn write_file(&self, path: &str, content: &str) -> Result<WriteResult> {
        call(
            &self.bridge,
            Operation::WriteFile,
            json!({ "path": path, "content": content }),
        )
        .await
    }

    /// Lists a directory (`LIST_DIRECTORY`).
    pub async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        call(&self.bridge, Operation::ListDirectory, json!({ "path": path })).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_content_accepts_host_shape() {
        let payload = json!({
            "content": "hello",
            "size": 5,
            "path": "notes.txt",
            "absolutePath": "/home/u/notes.txt"
        });
        let file: FileContent = serde_json::from_value(payload).expect("decode");
        assert_eq!(file.size, 5);
        assert_eq!(file.absolute_path.as_deref(), Some("/home/u/notes.txt"));
    }

    #[test]
    fn test_dir_entry_kind() {
        let entry: DirEntry =
            serde_json::from_value(json!({ "name": "src", "type": "directory" })).expect("decode");
        assert_eq!(entry.kind, "directory");
        assert_eq!(entry.size, 0);
    }
}
