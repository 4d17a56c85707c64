//! Document and folder records

use serde::{Deserialize, Serialize};

/// A record from the `documents` collection
///
/// Folders and documents share the same shape; folders carry
/// `is_folder: true` and an empty body. The backend encodes "no parent"
/// as an empty string, so [`DocumentRecord::parent_id`] is the
/// normalized accessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Record id
    pub id: String,
    /// Title shown in the tree
    #[serde(default)]
    pub title: String,
    /// Markdown body (empty for folders)
    #[serde(default)]
    pub content: String,
    /// Parent folder id, empty string for root
    #[serde(default)]
    pub parent: String,
    /// Whether this record is a folder
    #[serde(default)]
    pub is_folder: bool,
    /// Owning user id
    #[serde(default)]
    pub user: String,
    /// Creation timestamp (backend format)
    #[serde(default)]
    pub created: String,
    /// Update timestamp (backend format)
    #[serde(default)]
    pub updated: String,
}

impl DocumentRecord {
    /// Creates a folder record (handy for tests and local tree building)
    pub fn folder(id: impl Into<String>, title: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            parent: parent.unwrap_or_default().to_string(),
            is_folder: true,
            user: String::new(),
            created: String::new(),
            updated: String::new(),
        }
    }

    /// Creates a document record
    pub fn document(id: impl Into<String>, title: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            parent: parent.unwrap_or_default().to_string(),
            is_folder: false,
            user: String::new(),
            created: String::new(),
            updated: String::new(),
        }
    }

    /// Normalized parent id: `None` when the record sits at the root
    ///
    /// # Examples
    ///
    /// ```
    /// use textly::workspace::record::DocumentRecord;
    ///
    /// let root = DocumentRecord::document("d1", "Notes", None);
    /// assert_eq!(root.parent_id(), None);
    ///
    /// let nested = DocumentRecord::document("d2", "Draft", Some("f1"));
    /// assert_eq!(nested.parent_id(), Some("f1"));
    /// ```
    pub fn parent_id(&self) -> Option<&str> {
        if self.parent.is_empty() {
            None
        } else {
            Some(&self.parent)
        }
    }
}
