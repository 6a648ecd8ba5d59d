use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Enhancement jobs are keyed by a random UUID allocated at creation.
pub type JobId = uuid::Uuid;

/// Opaque account identifier issued by the account collaborator.
pub type AccountId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Fallback MIME type when an upload does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// An image binary supplied by the user.
///
/// Shared behind an `Arc` so that duplicated jobs and planner slots refer to
/// the same bytes without copying them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Original file name as reported by the client.
    pub name: String,
    /// Declared MIME type, e.g. `image/png`.
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mime_type = mime_type.into();
        Self {
            name: name.into(),
            mime_type: if mime_type.trim().is_empty() {
                DEFAULT_MIME_TYPE.to_string()
            } else {
                mime_type
            },
            bytes,
        }
    }

    /// Wrap in an `Arc` for sharing between records.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Extension of the original file name, lowercased, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// A displayable URL carrying the file inline.
    pub fn to_data_url(&self) -> String {
        crate::data_url::encode(&self.mime_type, &self.bytes)
    }
}
