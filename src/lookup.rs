// ABOUTME: Finds existing remote objects matching a local identity key
// ABOUTME: Read-only linear scans; "not found" is None, never an error

use crate::model::{Assignment, Folder, Module, ModuleItem, ModuleItemType, Page, RemoteFile};
use crate::remote::Course;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A course file with the same name and byte size as `local`.
pub fn find_file(course: &dyn Course, local: &Path) -> Result<Option<RemoteFile>> {
    let filename = match local.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return Ok(None),
    };
    let size = fs::metadata(local)?.len();

    let found = course
        .files()?
        .into_iter()
        .find(|f| f.filename == filename && f.size == size);
    tracing::debug!(filename, size, found = found.is_some(), "file lookup");
    Ok(found)
}

/// Full remote name of the folder a destination path points at.
pub fn destination_full_name(destination: &str) -> String {
    let segments: Vec<&str> = destination.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        Folder::ROOT_FULL_NAME.to_string()
    } else {
        format!("{}/{}", Folder::ROOT_FULL_NAME, segments.join("/"))
    }
}

/// A course file named `filename` sitting exactly in `destination`.
pub fn find_file_in_destination(
    course: &dyn Course,
    filename: &str,
    destination: &str,
) -> Result<Option<RemoteFile>> {
    let candidates: Vec<RemoteFile> = course
        .files()?
        .into_iter()
        .filter(|f| f.filename == filename)
        .collect();
    if candidates.is_empty() {
        return Ok(None);
    }

    let wanted = destination_full_name(destination);
    let folders: HashMap<u64, Folder> = course
        .folders()?
        .into_iter()
        .map(|f| (f.id, f))
        .collect();

    Ok(candidates.into_iter().find(|f| {
        f.folder_id
            .and_then(|id| folders.get(&id))
            .is_some_and(|folder| folder.full_name == wanted)
    }))
}

pub fn find_page(course: &dyn Course, name: &str) -> Result<Option<Page>> {
    Ok(course.pages()?.into_iter().find(|p| p.title == name))
}

pub fn find_assignment(course: &dyn Course, name: &str) -> Result<Option<Assignment>> {
    Ok(course.assignments()?.into_iter().find(|a| a.name == name))
}

pub fn find_module(course: &dyn Course, name: &str) -> Result<Option<Module>> {
    Ok(course.modules()?.into_iter().find(|m| m.name == name))
}

/// Like [`find_module`], but a missing module is a `DoesNotExist` error.
pub fn get_module(course: &dyn Course, name: &str) -> Result<Module> {
    find_module(course, name)?.ok_or_else(|| {
        Error::DoesNotExist(format!(
            "tried to get module {}, but it doesn't exist in the course",
            name
        ))
    })
}

/// The external-url item for `url` inside one module.
pub fn find_link_in_module(
    course: &dyn Course,
    module_id: u64,
    url: &str,
) -> Result<Option<ModuleItem>> {
    Ok(course.module_items(module_id)?.into_iter().find(|item| {
        item.item_type == ModuleItemType::ExternalUrl && item.external_url.as_deref() == Some(url)
    }))
}

/// The course's top-level "course files" folder.
pub fn root_folder(course: &dyn Course) -> Result<Folder> {
    course
        .folders()?
        .into_iter()
        .find(|f| f.full_name == Folder::ROOT_FULL_NAME)
        .ok_or_else(|| {
            Error::DoesNotExist(format!("course {} has no root files folder", course.id()))
        })
}

pub fn find_subfolder(course: &dyn Course, parent: &Folder, name: &str) -> Result<Option<Folder>> {
    Ok(course
        .subfolders(parent.id)?
        .into_iter()
        .find(|f| f.name == name))
}
