// ABOUTME: Downloads course pages back into the local folder layout
// ABOUTME: Each page becomes <dest>/<slug>/source.md plus meta.json

use crate::content::{META_FILE, SOURCE_FILE};
use crate::model::Page;
use crate::remote::Course;
use crate::util::slugify;
use crate::{Error, Result};
use regex::Regex;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

fn ensure_destination(destination: &Path) -> Result<()> {
    if destination.exists() && !destination.is_dir() {
        return Err(Error::AlreadyExists(format!(
            "you want to save pages into {}, but it exists and is not a directory",
            destination.display()
        )));
    }
    Ok(())
}

/// Save the latest revision of `page` into a folder under `destination`.
pub fn download_page(
    course: &dyn Course,
    page: &Page,
    destination: &Path,
    even_if_exists: bool,
) -> Result<PathBuf> {
    ensure_destination(destination)?;

    let revision = course.latest_revision(&page.url)?;
    let title = revision.title.unwrap_or_else(|| page.title.clone());
    let body = revision.body.unwrap_or_default();

    let mut folder_name = slugify(&title);
    if folder_name.is_empty() {
        folder_name = page.url.clone();
    }
    let dest_dir = destination.join(folder_name);

    if !even_if_exists && dest_dir.exists() {
        return Err(Error::AlreadyExists(format!(
            "trying to save page {} to folder {}, but that already exists",
            title,
            dest_dir.display()
        )));
    }

    fs::create_dir_all(&dest_dir)?;
    tracing::info!(page = %title, folder = %dest_dir.display(), "downloading page");

    fs::write(dest_dir.join(SOURCE_FILE), body)?;
    let meta = json!({ "name": title, "type": "page" });
    fs::write(dest_dir.join(META_FILE), serde_json::to_string_pretty(&meta)?)?;

    Ok(dest_dir)
}

/// Download every page whose title matches `name_filter` (all when `None`).
pub fn download_pages(
    course: &dyn Course,
    destination: &Path,
    even_if_exists: bool,
    name_filter: Option<&Regex>,
) -> Result<Vec<PathBuf>> {
    ensure_destination(destination)?;
    tracing::info!(course = course.name(), destination = %destination.display(), "downloading pages");

    let mut saved = Vec::new();
    for page in course.pages()? {
        if name_filter.map_or(true, |re| re.is_match(&page.title)) {
            saved.push(download_page(course, &page, destination, even_if_exists)?);
        }
    }
    Ok(saved)
}
