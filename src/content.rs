// ABOUTME: Local content model read from a folder's meta.json and source.md
// ABOUTME: Typed metadata per content kind plus the remote identity once published

use crate::model::{ModuleItem, ModuleItemType};
use crate::render::{self, Rendered};
use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const META_FILE: &str = "meta.json";
pub const SOURCE_FILE: &str = "source.md";
pub const RESULT_FILE: &str = "result.html";

/// Assignment-only settings. Absent keys stay `None` and are never sent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssignmentProps {
    #[serde(default)]
    pub allowed_extensions: Option<Vec<String>>,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub unlock_at: Option<String>,
    #[serde(default)]
    pub lock_at: Option<String>,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub submission_types: Option<Vec<String>>,
    #[serde(default)]
    pub external_tool_tag_attributes: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileProps {
    /// File name inside the content folder, also the remote file name.
    pub filename: String,
    /// Slash-separated folder path below the course root folder.
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkProps {
    pub external_url: String,
    #[serde(default)]
    pub new_tab: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentKind {
    Page,
    Assignment(AssignmentProps),
    File(FileProps),
    Link(LinkProps),
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Page => "Page",
            ContentKind::Assignment(_) => "Assignment",
            ContentKind::File(_) => "File",
            ContentKind::Link(_) => "Link",
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, ContentKind::Page | ContentKind::Assignment(_))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub style: Option<PathBuf>,
    #[serde(flatten)]
    pub kind: ContentKind,
}

impl Metadata {
    pub fn from_json(path: &Path, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Metadata {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Handle of a published item on the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteIdentity {
    Page { id: u64, url: String },
    Assignment { id: u64 },
    File { id: u64 },
    ExternalUrl { url: String },
}

impl RemoteIdentity {
    pub fn module_item_type(&self) -> ModuleItemType {
        match self {
            RemoteIdentity::Page { .. } => ModuleItemType::Page,
            RemoteIdentity::Assignment { .. } => ModuleItemType::Assignment,
            RemoteIdentity::File { .. } => ModuleItemType::File,
            RemoteIdentity::ExternalUrl { .. } => ModuleItemType::ExternalUrl,
        }
    }

    pub fn content_id(&self) -> Option<u64> {
        match self {
            RemoteIdentity::Page { id, .. }
            | RemoteIdentity::Assignment { id }
            | RemoteIdentity::File { id } => Some(*id),
            RemoteIdentity::ExternalUrl { .. } => None,
        }
    }

    /// Whether an existing module item already links this identity.
    pub fn matches(&self, item: &ModuleItem) -> bool {
        if item.item_type != self.module_item_type() {
            return false;
        }
        match self {
            RemoteIdentity::ExternalUrl { url } => item.external_url.as_deref() == Some(url),
            _ => item.content_id == self.content_id(),
        }
    }
}

/// One local unit of course material.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub folder: PathBuf,
    pub name: String,
    pub modules: Vec<String>,
    pub style: Option<PathBuf>,
    pub kind: ContentKind,
    /// Rendered body; only documents (pages, assignments) have one.
    pub rendered: Option<Rendered>,
    remote: Option<RemoteIdentity>,
}

impl ContentItem {
    /// Read `meta.json` and, for documents, render `source.md`.
    pub fn load(folder: &Path) -> Result<Self> {
        let meta_path = folder.join(META_FILE);
        let json = fs::read_to_string(&meta_path)?;
        let meta = Metadata::from_json(&meta_path, &json)?;

        let rendered = if meta.kind.is_document() {
            Some(render::render(&folder.join(SOURCE_FILE), meta.style.as_deref())?)
        } else {
            None
        };

        tracing::debug!(folder = %folder.display(), kind = meta.kind.label(), "loaded content item");

        Ok(ContentItem {
            folder: folder.to_path_buf(),
            name: meta.name,
            modules: meta.modules,
            style: meta.style,
            kind: meta.kind,
            rendered,
            remote: None,
        })
    }

    pub fn remote(&self) -> Option<&RemoteIdentity> {
        self.remote.as_ref()
    }

    /// Record the remote identity. Rebinding to a different object is refused.
    pub fn bind_remote(&mut self, identity: RemoteIdentity) -> Result<&RemoteIdentity> {
        if let Some(existing) = &self.remote {
            if *existing != identity {
                return Err(Error::AlreadyExists(format!(
                    "{} is bound to {:?}, refusing to rebind to {:?}",
                    self, existing, identity
                )));
            }
        }
        let bound: &RemoteIdentity = self.remote.get_or_insert(identity);
        Ok(bound)
    }

    pub fn result_path(&self) -> PathBuf {
        self.folder.join(RESULT_FILE)
    }
}

impl fmt::Display for ContentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.label(), self.folder.display())
    }
}
