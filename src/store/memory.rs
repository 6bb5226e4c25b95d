//! In-memory object store
//!
//! Behaves like the remote backend for listing, paging, export and mutation,
//! and journals every mutation so callers can assert on what was changed.
//! Items may have secondary parents, as legacy Drive items do.

use super::{FileRecord, ListFilter, NewItem, ObjectStore, Page, StoreError, FOLDER_MIME};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

const ROOT_NAME: &str = "My Drive";
const NATIVE_PREFIX: &str = "application/vnd.google-apps.";

/// A mutation applied through the [`ObjectStore`] interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Created { id: String, name: String, parent_id: String },
    Renamed { id: String, from: String, to: String },
    Moved { id: String, from: String, to: String },
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    records: Vec<FileRecord>,
    content: HashMap<String, Vec<u8>>,
    exports: HashMap<(String, String), Vec<u8>>,
    failing: HashSet<String>,
    extra_parents: HashMap<String, Vec<String>>,
    journal: Vec<Mutation>,
}

impl Inner {
    fn record(&self, id: &str) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn record_mut(&mut self, id: &str) -> Option<&mut FileRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    fn insert(&mut self, parent_id: &str, name: &str, mime_type: &str, created: Option<DateTime<Utc>>) -> String {
        self.next_id += 1;
        let id = format!("mem-{}", self.next_id);
        self.records.push(FileRecord {
            id: id.clone(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            created_time: created,
            parent_id: Some(parent_id.to_string()),
        });
        id
    }

    fn has_parent(&self, record: &FileRecord, parent_id: &str) -> bool {
        record.parent_id.as_deref() == Some(parent_id)
            || self
                .extra_parents
                .get(&record.id)
                .is_some_and(|parents| parents.iter().any(|p| p == parent_id))
    }

    fn check_failing(&self, id: &str) -> Result<(), StoreError> {
        if self.failing.contains(id) {
            return Err(StoreError::Api {
                status: 500,
                message: format!("injected failure for {}", id),
            });
        }
        Ok(())
    }
}

pub struct MemoryStore {
    root_id: String,
    page_size: usize,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Empty store whose root folder has id `root_id`
    pub fn new(root_id: &str) -> Self {
        let mut inner = Inner::default();
        inner.records.push(FileRecord {
            id: root_id.to_string(),
            name: ROOT_NAME.to_string(),
            mime_type: FOLDER_MIME.to_string(),
            created_time: None,
            parent_id: None,
        });
        Self {
            root_id: root_id.to_string(),
            page_size: 100,
            inner: Mutex::new(inner),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock only happens in a failing test
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn add_folder(&self, parent_id: &str, name: &str) -> String {
        self.lock().insert(parent_id, name, FOLDER_MIME, None)
    }

    pub fn add_file(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        created: Option<DateTime<Utc>>,
        content: &[u8],
    ) -> String {
        let mut inner = self.lock();
        let id = inner.insert(parent_id, name, mime_type, created);
        inner.content.insert(id.clone(), content.to_vec());
        id
    }

    /// Rendition returned when `file_id` is exported as `mime_type`
    pub fn add_export(&self, file_id: &str, mime_type: &str, content: &[u8]) {
        self.lock()
            .exports
            .insert((file_id.to_string(), mime_type.to_string()), content.to_vec());
    }

    /// Also list `file_id` under `parent_id`
    pub fn add_parent(&self, file_id: &str, parent_id: &str) {
        self.lock()
            .extra_parents
            .entry(file_id.to_string())
            .or_default()
            .push(parent_id.to_string());
    }

    /// Every parent of `file_id`, primary first
    pub fn parents(&self, file_id: &str) -> Vec<String> {
        let inner = self.lock();
        let primary = inner.record(file_id).and_then(|r| r.parent_id.clone());
        primary
            .into_iter()
            .chain(inner.extra_parents.get(file_id).cloned().unwrap_or_default())
            .collect()
    }

    /// Make every content read of `file_id` fail
    pub fn fail_reads(&self, file_id: &str) {
        self.lock().failing.insert(file_id.to_string());
    }

    /// Current state of an item
    pub fn snapshot(&self, file_id: &str) -> Option<FileRecord> {
        self.lock().record(file_id).cloned()
    }

    /// Every mutation so far, oldest first
    pub fn mutations(&self) -> Vec<Mutation> {
        self.lock().journal.clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(
        &self,
        parent_id: &str,
        filter: &ListFilter,
        page_token: Option<&str>,
    ) -> Result<Page, StoreError> {
        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StoreError::InvalidResponse(format!("bad page token {}", token)))?,
            None => 0,
        };

        let inner = self.lock();
        let matching: Vec<&FileRecord> = inner
            .records
            .iter()
            .filter(|r| inner.has_parent(r, parent_id) && filter.matches(r))
            .collect();

        let end = (offset + self.page_size).min(matching.len());
        let items = matching
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .map(|r| (*r).clone())
            .collect();
        let next_page_token = (end < matching.len()).then(|| end.to_string());

        Ok(Page {
            items,
            next_page_token,
        })
    }

    async fn get(&self, file_id: &str) -> Result<FileRecord, StoreError> {
        self.lock()
            .record(file_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))
    }

    async fn get_content(&self, file_id: &str) -> Result<Vec<u8>, StoreError> {
        let inner = self.lock();
        inner.check_failing(file_id)?;
        let record = inner
            .record(file_id)
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))?;
        if record.mime_type.starts_with(NATIVE_PREFIX) {
            return Err(StoreError::Api {
                status: 403,
                message: "Only files with binary content can be downloaded".to_string(),
            });
        }
        Ok(inner.content.get(file_id).cloned().unwrap_or_default())
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, StoreError> {
        let inner = self.lock();
        inner.check_failing(file_id)?;
        if inner.record(file_id).is_none() {
            return Err(StoreError::NotFound(file_id.to_string()));
        }
        inner
            .exports
            .get(&(file_id.to_string(), mime_type.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::Api {
                status: 400,
                message: format!("cannot export {} as {}", file_id, mime_type),
            })
    }

    async fn create(&self, item: &NewItem) -> Result<String, StoreError> {
        let mut inner = self.lock();
        if inner.record(&item.parent_id).is_none() {
            return Err(StoreError::NotFound(item.parent_id.clone()));
        }
        let id = inner.insert(&item.parent_id, &item.name, &item.mime_type, Some(Utc::now()));
        inner.journal.push(Mutation::Created {
            id: id.clone(),
            name: item.name.clone(),
            parent_id: item.parent_id.clone(),
        });
        Ok(id)
    }

    async fn update_name(&self, file_id: &str, new_name: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let record = inner
            .record_mut(file_id)
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))?;
        let from = std::mem::replace(&mut record.name, new_name.to_string());
        inner.journal.push(Mutation::Renamed {
            id: file_id.to_string(),
            from,
            to: new_name.to_string(),
        });
        Ok(())
    }

    async fn move_file(
        &self,
        file_id: &str,
        from_parent: &str,
        to_parent: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.record(to_parent).is_none() {
            return Err(StoreError::NotFound(to_parent.to_string()));
        }
        let is_primary = inner
            .record(file_id)
            .ok_or_else(|| StoreError::NotFound(file_id.to_string()))?
            .parent_id
            .as_deref()
            == Some(from_parent);
        if is_primary {
            if let Some(record) = inner.record_mut(file_id) {
                record.parent_id = Some(to_parent.to_string());
            }
        } else {
            let extras = inner.extra_parents.entry(file_id.to_string()).or_default();
            let Some(slot) = extras.iter_mut().find(|p| p.as_str() == from_parent) else {
                return Err(StoreError::Api {
                    status: 400,
                    message: format!("{} is not a child of {}", file_id, from_parent),
                });
            };
            *slot = to_parent.to_string();
        }
        inner.journal.push(Mutation::Moved {
            id: file_id.to_string(),
            from: from_parent.to_string(),
            to: to_parent.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rename_and_move_are_journaled() {
        let store = MemoryStore::new("root");
        let work = store.add_folder("root", "Work");
        let file = store.add_file("root", "scan.pdf", "application/pdf", None, b"%PDF");

        store.update_name(&file, "2024-01-01 - Acme - Work - Report.pdf").await.unwrap();
        store.move_file(&file, "root", &work).await.unwrap();

        let record = store.snapshot(&file).unwrap();
        assert_eq!(record.parent_id.as_deref(), Some(work.as_str()));
        assert_eq!(
            store.mutations(),
            vec![
                Mutation::Renamed {
                    id: file.clone(),
                    from: "scan.pdf".to_string(),
                    to: "2024-01-01 - Acme - Work - Report.pdf".to_string(),
                },
                Mutation::Moved {
                    id: file.clone(),
                    from: "root".to_string(),
                    to: work.clone(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_move_from_wrong_parent_fails() {
        let store = MemoryStore::new("root");
        let a = store.add_folder("root", "A");
        let file = store.add_file("root", "x.txt", "text/plain", None, b"x");
        assert!(store.move_file(&file, &a, "root").await.is_err());
        assert!(store.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_move_from_secondary_parent_keeps_primary() {
        let store = MemoryStore::new("root");
        let inbox = store.add_folder("root", "Inbox");
        let work = store.add_folder("root", "Work");
        let file = store.add_file("root", "x.txt", "text/plain", None, b"x");
        store.add_parent(&file, &inbox);

        assert_eq!(store.list(&inbox, &ListFilter::children()).await.unwrap().len(), 1);
        store.move_file(&file, &inbox, &work).await.unwrap();

        assert!(store.list(&inbox, &ListFilter::children()).await.unwrap().is_empty());
        assert_eq!(store.parents(&file), vec!["root".to_string(), work]);
    }

    #[tokio::test]
    async fn test_create_is_journaled() {
        let store = MemoryStore::new("root");
        let id = store
            .create(&NewItem {
                name: "Travel".to_string(),
                mime_type: FOLDER_MIME.to_string(),
                parent_id: "root".to_string(),
            })
            .await
            .unwrap();

        assert!(store.get(&id).await.unwrap().is_folder());
        assert_eq!(
            store.mutations(),
            vec![Mutation::Created {
                id,
                name: "Travel".to_string(),
                parent_id: "root".to_string(),
            }]
        );
        assert!(store.create(&NewItem {
            name: "x".to_string(),
            mime_type: FOLDER_MIME.to_string(),
            parent_id: "missing".to_string(),
        }).await.is_err());
    }

    #[tokio::test]
    async fn test_native_documents_need_export() {
        let store = MemoryStore::new("root");
        let doc = store.add_file("root", "Notes", "application/vnd.google-apps.document", None, b"");
        store.add_export(&doc, "text/plain", b"meeting notes");

        assert!(store.get_content(&doc).await.is_err());
        assert_eq!(store.export(&doc, "text/plain").await.unwrap(), b"meeting notes");
        assert!(store.export(&doc, "application/pdf").await.is_err());
    }

    #[tokio::test]
    async fn test_injected_read_failure() {
        let store = MemoryStore::new("root");
        let file = store.add_file("root", "x.txt", "text/plain", None, b"x");
        store.fail_reads(&file);
        assert!(matches!(
            store.get_content(&file).await,
            Err(StoreError::Api { status: 500, .. })
        ));
    }
}
