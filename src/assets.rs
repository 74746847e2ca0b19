// ABOUTME: Uploads local images and files to course storage
// ABOUTME: Idempotent under the overwrite policy; resolves destination folders segment by segment

use crate::lookup;
use crate::model::{Folder, OnDuplicate, RemoteFile, UploadTarget};
use crate::remote::Course;
use crate::{Error, Result};
use std::path::Path;

/// Remote folder that receives images embedded in pages and assignments.
pub const IMAGES_DESTINATION: &str = "images";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Always upload and replace same-named remote content.
    pub overwrite: bool,
    /// Without `overwrite`, fail instead of reusing an existing match.
    pub raise_if_already_uploaded: bool,
}

/// Publish one local asset under `destination`, returning its remote file.
pub fn publish_asset(
    course: &dyn Course,
    local: &Path,
    destination: &str,
    policy: UploadPolicy,
) -> Result<RemoteFile> {
    let target = UploadTarget::FolderPath(destination.to_string());

    if policy.overwrite {
        tracing::info!(file = %local.display(), destination, "uploading (overwrite)");
        return course.upload(local, &target, OnDuplicate::Overwrite);
    }

    match lookup::find_file(course, local)? {
        Some(_) if policy.raise_if_already_uploaded => Err(Error::AlreadyExists(format!(
            "{} already exists in course {}, but overwriting was not requested",
            local.display(),
            course.name()
        ))),
        Some(existing) => {
            tracing::debug!(file = %local.display(), id = existing.id, "reusing uploaded file");
            Ok(existing)
        }
        None => {
            tracing::info!(file = %local.display(), destination, "file not already uploaded, uploading");
            course.upload(local, &target, OnDuplicate::Rename)
        }
    }
}

/// Walk `destination` from the course root, creating missing segments.
pub fn ensure_folder_path(course: &dyn Course, destination: &str) -> Result<Folder> {
    let mut current = lookup::root_folder(course)?;

    for segment in destination.split('/').filter(|s| !s.is_empty()) {
        current = match lookup::find_subfolder(course, &current, segment)? {
            Some(folder) => folder,
            None => {
                tracing::info!(parent = %current.full_name, segment, "creating folder");
                course.create_folder(current.id, segment)?
            }
        };
    }

    Ok(current)
}

/// Upload `local` into the folder `destination` names, creating it as needed.
///
/// `OnDuplicate::Overwrite` replaces a same-named file in place, keeping its id.
pub fn upload_to_destination(
    course: &dyn Course,
    local: &Path,
    destination: &str,
    on_duplicate: OnDuplicate,
) -> Result<RemoteFile> {
    let folder = ensure_folder_path(course, destination)?;
    tracing::info!(file = %local.display(), folder = %folder.full_name, ?on_duplicate, "uploading file");
    course.upload(local, &UploadTarget::Folder(folder.id), on_duplicate)
}
