use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{CategoryId, NoteId, RecordId};

/// Card colour for notes without a category.
pub const UNCATEGORIZED_COLOR: &str = "#F9F4E8";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_color: Option<String>,
    #[serde(default)]
    pub audio_file: Option<String>,
    #[serde(default)]
    pub creator: Option<RecordId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn category_label(&self) -> &str {
        self.category_name.as_deref().unwrap_or("Uncategorized")
    }

    pub fn card_color(&self) -> &str {
        self.category_color.as_deref().unwrap_or(UNCATEGORIZED_COLOR)
    }
}

/// Body of a create call.
///
/// `attachment` never goes into the JSON body; when set the gateway switches
/// to a multipart request and uploads the file as `audio_file`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNote {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: Option<CategoryId>,
    #[serde(skip)]
    pub attachment: Option<PathBuf>,
}

impl NewNote {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            category: None,
            attachment: None,
        }
    }
}

/// Body of a partial update. Fields left as `None` are not sent;
/// `category: Some(None)` clears the category server-side.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<CategoryId>>,
    #[serde(skip)]
    pub attachment: Option<PathBuf>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.attachment.is_none()
    }
}
