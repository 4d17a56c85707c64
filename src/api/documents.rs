//! Document record endpoints
//!
//! Documents and folders share one record collection; folders are
//! records with `is_folder` set. Listing pages through the collection
//! until every record is fetched.

use serde::Deserialize;

use crate::api::ApiClient;
use crate::error::Result;
use crate::workspace::record::DocumentRecord;

/// Record collection path for documents
const COLLECTION_PATH: &str = "/api/collections/documents/records";

/// Page size used when listing the collection
const PAGE_SIZE: u32 = 200;

/// One page of a record listing
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPage {
    /// Current page number (1-based)
    pub page: u32,
    /// Records per page
    #[serde(rename = "perPage")]
    pub per_page: u32,
    /// Total number of pages
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    /// Total number of records
    #[serde(rename = "totalItems")]
    pub total_items: u64,
    /// Records on this page
    pub items: Vec<DocumentRecord>,
}

/// Client for the document record collection
#[derive(Debug, Clone)]
pub struct DocumentClient {
    api: ApiClient,
}

impl DocumentClient {
    /// Creates a document client
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetches every document and folder record, most recently updated
    /// first
    pub async fn list_all(&self) -> Result<Vec<DocumentRecord>> {
        let mut records = Vec::new();
        let mut page = 1u32;
        loop {
            let page_param = page.to_string();
            let per_page_param = PAGE_SIZE.to_string();
            let batch: RecordPage = self
                .api
                .get_json(
                    COLLECTION_PATH,
                    &[
                        ("page", page_param.as_str()),
                        ("perPage", per_page_param.as_str()),
                        ("sort", "-updated"),
                    ],
                )
                .await?;
            records.extend(batch.items);
            if batch.total_pages == 0 || page >= batch.total_pages {
                break;
            }
            page += 1;
        }
        Ok(records)
    }

    /// Fetches a single record by id
    pub async fn get(&self, id: &str) -> Result<DocumentRecord> {
        self.api
            .get_json(&format!("{}/{}", COLLECTION_PATH, id), &[])
            .await
    }

    /// Creates a document or folder
    ///
    /// # Arguments
    ///
    /// * `title` - Record title
    /// * `content` - Markdown body (empty for folders)
    /// * `parent` - Parent folder id, `None` for root
    /// * `is_folder` - Whether the record is a folder
    pub async fn create(
        &self,
        title: &str,
        content: &str,
        parent: Option<&str>,
        is_folder: bool,
    ) -> Result<DocumentRecord> {
        let body = serde_json::json!({
            "title": title,
            "content": content,
            "parent": parent.unwrap_or(""),
            "is_folder": is_folder,
        });
        self.api.post_json(COLLECTION_PATH, &body).await
    }

    /// Updates a record's title and/or content
    pub async fn update(
        &self,
        id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<DocumentRecord> {
        let mut body = serde_json::Map::new();
        if let Some(title) = title {
            body.insert("title".to_string(), serde_json::Value::from(title));
        }
        if let Some(content) = content {
            body.insert("content".to_string(), serde_json::Value::from(content));
        }
        self.api
            .patch_json(&format!("{}/{}", COLLECTION_PATH, id), &body)
            .await
    }

    /// Moves a record under a new parent (`None` moves it to the root)
    ///
    /// The caller is responsible for the cycle check; see
    /// [`crate::workspace::tree::can_move`].
    pub async fn move_to(&self, id: &str, parent: Option<&str>) -> Result<DocumentRecord> {
        let body = serde_json::json!({ "parent": parent.unwrap_or("") });
        self.api
            .patch_json(&format!("{}/{}", COLLECTION_PATH, id), &body)
            .await
    }

    /// Deletes a record
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.api
            .delete(&format!("{}/{}", COLLECTION_PATH, id))
            .await
    }
}
