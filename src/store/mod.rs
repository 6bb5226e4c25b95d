//! Object Store
//!
//! The cloud file store the sorter reads from and files into. Items are
//! addressed by opaque ids; folders are items with [`FOLDER_MIME`].

pub mod credentials;
pub mod drive;
#[cfg(test)]
pub mod memory;

pub use credentials::{AccessTokenProvider, RefreshTokenProvider, StaticToken};
pub use drive::DriveStore;
#[cfg(test)]
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type that marks an item as a folder
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// How many ancestors [`folder_path`] walks before giving up
const MAX_PATH_DEPTH: usize = 5;

/// One item under inspection, as returned by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub created_time: Option<DateTime<Utc>>,
    pub parent_id: Option<String>,
}

impl FileRecord {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }
}

/// Listing filter. Trashed items are always excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub name_equals: Option<String>,
    pub name_contains: Option<String>,
    pub mime_type: Option<String>,
}

impl ListFilter {
    /// Every child of the parent
    pub fn children() -> Self {
        Self::default()
    }

    pub fn name_equals(name: &str) -> Self {
        Self {
            name_equals: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn name_contains(fragment: &str) -> Self {
        Self {
            name_contains: Some(fragment.to_string()),
            ..Self::default()
        }
    }

    pub fn folders(mut self) -> Self {
        self.mime_type = Some(FOLDER_MIME.to_string());
        self
    }

    pub fn matches(&self, record: &FileRecord) -> bool {
        self.name_equals.as_ref().map_or(true, |n| &record.name == n)
            && self
                .name_contains
                .as_ref()
                .map_or(true, |f| record.name.contains(f.as_str()))
            && self
                .mime_type
                .as_ref()
                .map_or(true, |m| &record.mime_type == m)
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<FileRecord>,
    pub next_page_token: Option<String>,
}

/// Metadata for a new item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub mime_type: String,
    pub parent_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("api request failed: {0}")]
    RequestFailed(String),
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("credentials: {0}")]
    Credentials(#[from] crate::ai::credentials::CredentialError),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// One page of non-trashed children of `parent_id` matching `filter`
    async fn list_page(
        &self,
        parent_id: &str,
        filter: &ListFilter,
        page_token: Option<&str>,
    ) -> Result<Page, StoreError>;

    /// Metadata for a single item
    async fn get(&self, file_id: &str) -> Result<FileRecord, StoreError>;

    /// Raw bytes of a stored file
    async fn get_content(&self, file_id: &str) -> Result<Vec<u8>, StoreError>;

    /// A native document rendered as `mime_type`
    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, StoreError>;

    /// Create an item and return its id
    async fn create(&self, item: &NewItem) -> Result<String, StoreError>;

    async fn update_name(&self, file_id: &str, new_name: &str) -> Result<(), StoreError>;

    async fn move_file(
        &self,
        file_id: &str,
        from_parent: &str,
        to_parent: &str,
    ) -> Result<(), StoreError>;

    /// Every matching child, following page tokens to the end
    async fn list(&self, parent_id: &str, filter: &ListFilter) -> Result<Vec<FileRecord>, StoreError> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.list_page(parent_id, filter, token.as_deref()).await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => return Ok(items),
            }
        }
    }
}

/// Human-readable path of a folder, e.g. `My Drive / Finance / Receipts`.
///
/// Walks at most five ancestors; lookup failures end the walk early.
pub async fn folder_path(store: &dyn ObjectStore, folder_id: Option<&str>) -> String {
    let Some(folder_id) = folder_id.filter(|id| !id.is_empty()) else {
        return "Unknown".to_string();
    };

    let mut parts = Vec::new();
    let mut current = Some(folder_id.to_string());
    for _ in 0..MAX_PATH_DEPTH {
        let Some(id) = current.take() else { break };
        match store.get(&id).await {
            Ok(record) => {
                parts.push(record.name);
                current = record.parent_id;
            }
            Err(e) => {
                tracing::debug!("Stopped folder path walk at {}: {}", id, e);
                break;
            }
        }
    }

    if parts.is_empty() {
        return "Unknown Folder".to_string();
    }
    parts.reverse();
    parts.join(" / ")
}
