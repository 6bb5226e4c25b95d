//! Google Drive v3 REST backend

use super::credentials::AccessTokenProvider;
use super::{FileRecord, ListFilter, NewItem, ObjectStore, Page, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const FILE_FIELDS: &str = "id,name,mimeType,createdTime,parents";
const PAGE_SIZE: u32 = 100;

pub struct DriveStore {
    client: Client,
    tokens: Arc<dyn AccessTokenProvider>,
    base_url: String,
}

impl DriveStore {
    pub fn new(client: Client, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            client,
            tokens,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.base_url)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/drive/v3/files/{}", self.base_url, file_id)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(message));
        }
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_bytes(&self, request: RequestBuilder) -> Result<Vec<u8>, StoreError> {
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }
}

/// Escape a value for use inside a single-quoted query literal
fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Listing query for the children of `parent_id`
pub(crate) fn build_query(parent_id: &str, filter: &ListFilter) -> String {
    let mut clauses = vec![
        format!("'{}' in parents", escape_literal(parent_id)),
        "trashed = false".to_string(),
    ];
    if let Some(name) = &filter.name_equals {
        clauses.push(format!("name = '{}'", escape_literal(name)));
    }
    if let Some(fragment) = &filter.name_contains {
        clauses.push(format!("name contains '{}'", escape_literal(fragment)));
    }
    if let Some(mime_type) = &filter.mime_type {
        clauses.push(format!("mimeType = '{}'", escape_literal(mime_type)));
    }
    clauses.join(" and ")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    parents: Vec<String>,
}

impl From<DriveFile> for FileRecord {
    fn from(file: DriveFile) -> Self {
        FileRecord {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            created_time: file.created_time,
            parent_id: file.parents.into_iter().next(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody<'a> {
    name: &'a str,
    mime_type: &'a str,
    parents: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl ObjectStore for DriveStore {
    async fn list_page(
        &self,
        parent_id: &str,
        filter: &ListFilter,
        page_token: Option<&str>,
    ) -> Result<Page, StoreError> {
        let query = build_query(parent_id, filter);
        let fields = format!("nextPageToken,files({})", FILE_FIELDS);
        let page_size = PAGE_SIZE.to_string();
        let mut params = vec![
            ("q", query.as_str()),
            ("fields", fields.as_str()),
            ("pageSize", page_size.as_str()),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let list: FileList = self
            .send_json(self.client.get(self.files_url()).query(&params))
            .await?;
        Ok(Page {
            items: list.files.into_iter().map(FileRecord::from).collect(),
            next_page_token: list.next_page_token,
        })
    }

    async fn get(&self, file_id: &str) -> Result<FileRecord, StoreError> {
        let file: DriveFile = self
            .send_json(
                self.client
                    .get(self.file_url(file_id))
                    .query(&[("fields", FILE_FIELDS), ("supportsAllDrives", "true")]),
            )
            .await?;
        Ok(file.into())
    }

    async fn get_content(&self, file_id: &str) -> Result<Vec<u8>, StoreError> {
        self.send_bytes(
            self.client
                .get(self.file_url(file_id))
                .query(&[("alt", "media"), ("supportsAllDrives", "true")]),
        )
        .await
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, StoreError> {
        self.send_bytes(
            self.client
                .get(format!("{}/export", self.file_url(file_id)))
                .query(&[("mimeType", mime_type)]),
        )
        .await
    }

    async fn create(&self, item: &NewItem) -> Result<String, StoreError> {
        let body = CreateBody {
            name: &item.name,
            mime_type: &item.mime_type,
            parents: [&item.parent_id],
        };
        let created: CreatedFile = self
            .send_json(
                self.client
                    .post(self.files_url())
                    .query(&[("fields", "id"), ("supportsAllDrives", "true")])
                    .json(&body),
            )
            .await?;
        Ok(created.id)
    }

    async fn update_name(&self, file_id: &str, new_name: &str) -> Result<(), StoreError> {
        self.send(
            self.client
                .patch(self.file_url(file_id))
                .query(&[("fields", "id"), ("supportsAllDrives", "true")])
                .json(&serde_json::json!({ "name": new_name })),
        )
        .await?;
        Ok(())
    }

    async fn move_file(
        &self,
        file_id: &str,
        from_parent: &str,
        to_parent: &str,
    ) -> Result<(), StoreError> {
        self.send(
            self.client
                .patch(self.file_url(file_id))
                .query(&[
                    ("addParents", to_parent),
                    ("removeParents", from_parent),
                    ("fields", "id,parents"),
                    ("supportsAllDrives", "true"),
                ])
                .json(&serde_json::json!({})),
        )
        .await?;
        Ok(())
    }
}
