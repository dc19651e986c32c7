//! JSON export of the signed-in user's inventory.
//!
//! There is no import path; the document is meant for the user to keep.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Identity, Item};

/// Default export file name
pub const DEFAULT_EXPORT_FILE: &str = "digital-declutter-export.json";

/// Account details included in an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportUser {
    /// Sign-in email
    pub email: String,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

/// The exported document: `{user: {email, created_at}, items: [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDocument {
    /// Account details
    pub user: ExportUser,
    /// Every item, in cache order
    pub items: Vec<Item>,
}

impl ExportDocument {
    /// Build the document for `identity` and its items
    #[must_use]
    pub fn new(identity: &Identity, items: Vec<Item>) -> Self {
        Self {
            user: ExportUser {
                email: identity.email.clone(),
                created_at: identity.created_at,
            },
            items,
        }
    }

    /// Pretty-printed JSON text
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write `document` as pretty JSON to `output_dir/file_name`.
///
/// Creates `output_dir` if needed and overwrites an existing file.
///
/// # Errors
///
/// Returns an error if directory creation, file creation or writing fails.
pub fn write_export(output_dir: &Path, file_name: &str, document: &ExportDocument) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    let file_path = output_dir.join(file_name);

    let file = File::create(&file_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!(path = %file_path.display(), items = document.items.len(), "export written");
    Ok(file_path)
}
