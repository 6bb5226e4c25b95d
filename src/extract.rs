//! Content Extractor
//!
//! Turns a stored item into bytes the classifier can read. Native documents
//! have no binary content and must be exported first.

use crate::store::{FileRecord, ObjectStore, StoreError};

const NATIVE_PREFIX: &str = "application/vnd.google-apps.";
const PLAIN_TEXT: &str = "text/plain";
const PDF: &str = "application/pdf";

/// Bytes plus the content type they are actually encoded as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ExtractedContent {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// How an item's bytes are retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieval {
    /// Download the stored bytes as-is
    Direct,
    /// Export a native document to the given type
    Export(&'static str),
}

/// Word-processor documents export to plain text, spreadsheets and every other
/// native type to PDF. Anything else is downloaded directly.
pub fn retrieval_for(content_type: &str) -> Retrieval {
    let Some(kind) = content_type.strip_prefix(NATIVE_PREFIX) else {
        return Retrieval::Direct;
    };
    if kind.contains("document") {
        Retrieval::Export(PLAIN_TEXT)
    } else {
        Retrieval::Export(PDF)
    }
}

pub struct ContentExtractor<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> ContentExtractor<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Retrieve the item's content. Zero-length content comes back as an
    /// empty value rather than an error so callers can skip it.
    pub async fn extract(&self, file: &FileRecord) -> Result<ExtractedContent, StoreError> {
        match retrieval_for(&file.mime_type) {
            Retrieval::Direct => {
                let bytes = self.store.get_content(&file.id).await?;
                Ok(ExtractedContent {
                    bytes,
                    content_type: file.mime_type.clone(),
                })
            }
            Retrieval::Export(target) => {
                tracing::debug!("Exporting {} ({}) as {}", file.name, file.mime_type, target);
                let bytes = self.store.export(&file.id, target).await?;
                Ok(ExtractedContent {
                    bytes,
                    content_type: target.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_retrieval_mapping() {
        assert_eq!(
            retrieval_for("application/vnd.google-apps.document"),
            Retrieval::Export("text/plain")
        );
        assert_eq!(
            retrieval_for("application/vnd.google-apps.spreadsheet"),
            Retrieval::Export("application/pdf")
        );
        assert_eq!(
            retrieval_for("application/vnd.google-apps.presentation"),
            Retrieval::Export("application/pdf")
        );
        assert_eq!(retrieval_for("application/pdf"), Retrieval::Direct);
        assert_eq!(
            retrieval_for("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            Retrieval::Direct
        );
    }

    #[tokio::test]
    async fn test_extract_exports_native_documents() {
        let store = MemoryStore::new("root");
        let doc = store.add_file("root", "Notes", "application/vnd.google-apps.document", None, b"");
        store.add_export(&doc, "text/plain", b"Committee meeting notes");
        let sheet = store.add_file("root", "Budget", "application/vnd.google-apps.spreadsheet", None, b"");
        store.add_export(&sheet, "application/pdf", b"%PDF-1.7");

        let extractor = ContentExtractor::new(&store);

        let record = store.snapshot(&doc).unwrap();
        let content = extractor.extract(&record).await.unwrap();
        assert_eq!(content.content_type, "text/plain");
        assert_eq!(content.bytes, b"Committee meeting notes");

        let record = store.snapshot(&sheet).unwrap();
        let content = extractor.extract(&record).await.unwrap();
        assert_eq!(content.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_empty_content_is_not_an_error() {
        let store = MemoryStore::new("root");
        let doc = store.add_file("root", "Blank", "application/vnd.google-apps.document", None, b"");
        store.add_export(&doc, "text/plain", b"");
        let file = store.add_file("root", "empty.txt", "text/plain", None, b"");

        let extractor = ContentExtractor::new(&store);
        assert!(extractor.extract(&store.snapshot(&doc).unwrap()).await.unwrap().is_empty());
        assert!(extractor.extract(&store.snapshot(&file).unwrap()).await.unwrap().is_empty());
    }
}
