// ABOUTME: Public library API for md2canvas course publishing
// ABOUTME: Re-exports core modules for external use

pub mod api;
pub mod assets;
pub mod auth;
pub mod cli;
pub mod content;
pub mod download;
pub mod error;
pub mod html;
pub mod logging;
pub mod lookup;
pub mod model;
pub mod modules;
pub mod publish;
pub mod remote;
pub mod render;
pub mod storage;
pub mod util;

pub use content::{ContentItem, ContentKind, RemoteIdentity};
pub use error::{Error, Result};
pub use publish::{publish, PublishResult};
pub use remote::{CanvasCourse, Course};
