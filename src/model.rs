// ABOUTME: Serde data models for Canvas API objects and update payloads
// ABOUTME: Tolerant parsing; optional payload fields are omitted, never sent as null

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseInfo {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: u64,
    pub filename: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub folder_id: Option<u64>,
    #[serde(default)]
    pub url: String,
}

impl RemoteFile {
    /// Host part of the download url, everything before `/files`.
    fn url_base(&self) -> &str {
        match self.url.find("/files") {
            Some(n) => &self.url[..n],
            None => self.url.trim_end_matches('/'),
        }
    }

    /// Url that embeds the file inline in a page body.
    pub fn preview_url(&self, course_id: u64) -> String {
        format!(
            "{}/courses/{}/files/{}/preview",
            self.url_base(),
            course_id,
            self.id
        )
    }

    pub fn api_endpoint_url(&self, course_id: u64) -> String {
        format!(
            "{}/api/v1/courses/{}/files/{}",
            self.url_base(),
            course_id,
            self.id
        )
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub parent_folder_id: Option<u64>,
}

impl Folder {
    pub const ROOT_FULL_NAME: &'static str = "course files";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page_id: u64,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRevision {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleItemType {
    Page,
    Assignment,
    File,
    ExternalUrl,
    Discussion,
    Quiz,
    SubHeader,
    ExternalTool,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleItem {
    pub id: u64,
    #[serde(rename = "type")]
    pub item_type: ModuleItemType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content_id: Option<u64>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub new_tab: Option<bool>,
}

/// Body of a create/edit module item call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewModuleItem {
    #[serde(rename = "type")]
    pub item_type: ModuleItemType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_tab: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssignmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_possible: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_tool_tag_attributes: Option<serde_json::Value>,
}

/// What the remote store does when an upload collides by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OnDuplicate {
    Overwrite,
    Rename,
}

/// Where an upload lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    /// Slash-separated path under the course root; the remote side creates missing folders.
    FolderPath(String),
    Folder(u64),
}

/// First leg of the three-step Canvas upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadTicket {
    pub upload_url: String,
    #[serde(default)]
    pub upload_params: serde_json::Map<String, serde_json::Value>,
}
