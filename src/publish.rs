// ABOUTME: Reconciling publisher: find-or-create, images, properties, module links
// ABOUTME: One pipeline for documents parameterized per kind, plus files and links

use crate::assets::{self, UploadPolicy, IMAGES_DESTINATION};
use crate::content::{AssignmentProps, ContentItem, ContentKind, FileProps, LinkProps, RemoteIdentity};
use crate::html::{self, is_remote_src};
use crate::lookup;
use crate::model::{AssignmentUpdate, OnDuplicate, PageUpdate};
use crate::modules;
use crate::remote::Course;
use crate::render::ImageRef;
use crate::storage::write_atomic;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Class Canvas uses for inline file links.
pub const INLINE_FILE_CLASS: &str = "instructure_file_link inline_disabled";

/// Outcome of publishing one content item.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    pub identity: RemoteIdentity,
    /// Whether the remote object was created by this call.
    pub created: bool,
    pub module_items_created: usize,
}

/// Publish `item` to `course`.
///
/// Without `overwrite`, an existing remote match aborts with
/// `AlreadyExists` before any remote mutation.
pub fn publish(item: &mut ContentItem, course: &dyn Course, overwrite: bool) -> Result<PublishResult> {
    tracing::info!(item = %item, name = %item.name, overwrite, "publishing");
    match item.kind.clone() {
        ContentKind::Page => publish_document(item, course, overwrite, &PAGE_OPS),
        ContentKind::Assignment(_) => publish_document(item, course, overwrite, &ASSIGNMENT_OPS),
        ContentKind::File(props) => publish_file(item, course, overwrite, &props),
        ContentKind::Link(props) => publish_link(item, course, overwrite, &props),
    }
}

/// Per-kind behavior of the document pipeline.
struct DocumentOps {
    kind: &'static str,
    find: fn(&dyn Course, &str) -> Result<Option<RemoteIdentity>>,
    create: fn(&dyn Course, &str) -> Result<RemoteIdentity>,
    sync: fn(&dyn Course, &RemoteIdentity, &ContentItem, &str) -> Result<()>,
}

const PAGE_OPS: DocumentOps = DocumentOps {
    kind: "page",
    find: find_page,
    create: create_page,
    sync: sync_page,
};

const ASSIGNMENT_OPS: DocumentOps = DocumentOps {
    kind: "assignment",
    find: find_assignment,
    create: create_assignment,
    sync: sync_assignment,
};

fn find_page(course: &dyn Course, name: &str) -> Result<Option<RemoteIdentity>> {
    Ok(lookup::find_page(course, name)?.map(|p| RemoteIdentity::Page {
        id: p.page_id,
        url: p.url,
    }))
}

fn create_page(course: &dyn Course, name: &str) -> Result<RemoteIdentity> {
    let page = course.create_page(&PageUpdate {
        title: Some(name.to_string()),
        body: Some("empty page".to_string()),
    })?;
    Ok(RemoteIdentity::Page {
        id: page.page_id,
        url: page.url,
    })
}

fn find_assignment(course: &dyn Course, name: &str) -> Result<Option<RemoteIdentity>> {
    Ok(lookup::find_assignment(course, name)?.map(|a| RemoteIdentity::Assignment { id: a.id }))
}

fn create_assignment(course: &dyn Course, name: &str) -> Result<RemoteIdentity> {
    let assignment = course.create_assignment(&AssignmentUpdate {
        name: Some(name.to_string()),
        ..Default::default()
    })?;
    Ok(RemoteIdentity::Assignment { id: assignment.id })
}

fn identity_mismatch(item: &ContentItem, identity: &RemoteIdentity) -> Error {
    Error::DoesNotExist(format!("{} has no matching remote object (bound to {:?})", item, identity))
}

fn sync_page(
    course: &dyn Course,
    identity: &RemoteIdentity,
    item: &ContentItem,
    html: &str,
) -> Result<()> {
    match identity {
        RemoteIdentity::Page { url, .. } => {
            course.edit_page(url, &page_props(item, html))?;
            Ok(())
        }
        other => Err(identity_mismatch(item, other)),
    }
}

fn sync_assignment(
    course: &dyn Course,
    identity: &RemoteIdentity,
    item: &ContentItem,
    html: &str,
) -> Result<()> {
    match (identity, &item.kind) {
        (RemoteIdentity::Assignment { id }, ContentKind::Assignment(props)) => {
            course.edit_assignment(*id, &assignment_props(&item.name, props, html))?;
            Ok(())
        }
        (other, _) => Err(identity_mismatch(item, other)),
    }
}

pub fn page_props(item: &ContentItem, html: &str) -> PageUpdate {
    PageUpdate {
        title: Some(item.name.clone()),
        body: Some(html.to_string()),
    }
}

/// Assignment edit payload; settings absent from metadata stay absent.
pub fn assignment_props(name: &str, props: &AssignmentProps, html: &str) -> AssignmentUpdate {
    AssignmentUpdate {
        name: Some(name.to_string()),
        description: Some(html.to_string()),
        allowed_extensions: props.allowed_extensions.clone(),
        points_possible: props.points_possible,
        unlock_at: props.unlock_at.clone(),
        lock_at: props.lock_at.clone(),
        due_at: props.due_at.clone(),
        published: props.published,
        submission_types: props.submission_types.clone(),
        external_tool_tag_attributes: props.external_tool_tag_attributes.clone(),
    }
}

fn publish_document(
    item: &mut ContentItem,
    course: &dyn Course,
    overwrite: bool,
    ops: &DocumentOps,
) -> Result<PublishResult> {
    let (identity, created) = match (ops.find)(course, &item.name)? {
        Some(_) if !overwrite => {
            return Err(Error::AlreadyExists(format!(
                "{} {} already exists",
                ops.kind, item.name
            )))
        }
        Some(existing) => (existing, false),
        None => {
            tracing::info!(kind = ops.kind, name = %item.name, "creating");
            ((ops.create)(course, &item.name)?, true)
        }
    };
    let identity = item.bind_remote(identity)?.clone();

    let html = publish_images_and_adjust_html(item, course)?;
    (ops.sync)(course, &identity, item, &html)?;
    let module_items_created = modules::ensure_linked(item, course)?;

    Ok(PublishResult {
        identity,
        created,
        module_items_created,
    })
}

/// Upload every local image of the rendered body, point the body at the
/// uploads, and write the result next to the source.
pub fn publish_images_and_adjust_html(item: &mut ContentItem, course: &dyn Course) -> Result<String> {
    let result_path = item.result_path();
    let label = item.to_string();
    let rendered = item
        .rendered
        .as_mut()
        .ok_or_else(|| Error::DoesNotExist(format!("{} has no rendered body", label)))?;

    for image in rendered.images.values_mut() {
        if image.remote.is_none() {
            let remote = assets::publish_asset(
                course,
                &image.local_path,
                IMAGES_DESTINATION,
                UploadPolicy::default(),
            )?;
            image.remote = Some(remote);
        }
    }

    rendered.html = adjust_html_for_images(&rendered.html, &rendered.images, course.id())?;
    write_atomic(&result_path, rendered.html.as_bytes())?;

    Ok(rendered.html.clone())
}

/// Replace local `<img>` sources with links to their published copies.
pub fn adjust_html_for_images(
    html: &str,
    images: &BTreeMap<String, ImageRef>,
    course_id: u64,
) -> Result<String> {
    html::rewrite_images(html, |tag| {
        let src = match tag.src() {
            Some(src) if !is_remote_src(src) => src.to_string(),
            _ => return Ok(false),
        };
        let remote = images
            .get(&src)
            .and_then(|image| image.remote.as_ref())
            .ok_or_else(|| Error::UnresolvedImage(src.clone()))?;

        tag.set("src", remote.preview_url(course_id));
        tag.set("class", INLINE_FILE_CLASS);
        tag.set("data-api-endpoint", remote.api_endpoint_url(course_id));
        tag.set("data-api-returntype", "File");
        Ok(true)
    })
}

fn publish_file(
    item: &mut ContentItem,
    course: &dyn Course,
    overwrite: bool,
    props: &FileProps,
) -> Result<PublishResult> {
    let existing = lookup::find_file_in_destination(course, &props.filename, &props.destination)?;
    let local = item.folder.join(&props.filename);

    let (identity, created) = match existing {
        Some(_) if !overwrite => {
            return Err(Error::AlreadyExists(format!(
                "trying to upload file {}, but it is already in {}",
                props.filename, props.destination
            )))
        }
        Some(previous) => {
            let file = assets::upload_to_destination(
                course,
                &local,
                &props.destination,
                OnDuplicate::Overwrite,
            )?;
            if file.id != previous.id {
                tracing::debug!(old = previous.id, new = file.id, "overwrite assigned a new file id");
            }
            (RemoteIdentity::File { id: file.id }, false)
        }
        None => {
            let file =
                assets::upload_to_destination(course, &local, &props.destination, OnDuplicate::Rename)?;
            (RemoteIdentity::File { id: file.id }, true)
        }
    };
    let identity = item.bind_remote(identity)?.clone();

    let module_items_created = modules::ensure_linked(item, course)?;
    Ok(PublishResult {
        identity,
        created,
        module_items_created,
    })
}

/// Whether the link is already an item of every module it declares.
pub fn is_link_uploaded(item: &ContentItem, props: &LinkProps, course: &dyn Course) -> Result<bool> {
    for module_name in &item.modules {
        let present = match lookup::find_module(course, module_name)? {
            Some(module) => lookup::find_link_in_module(course, module.id, &props.external_url)?.is_some(),
            None => false,
        };
        if !present {
            return Ok(false);
        }
    }
    Ok(true)
}

fn publish_link(
    item: &mut ContentItem,
    course: &dyn Course,
    overwrite: bool,
    props: &LinkProps,
) -> Result<PublishResult> {
    if item.modules.is_empty() {
        tracing::warn!(item = %item, "link declares no modules, nothing to publish");
    } else if !overwrite && is_link_uploaded(item, props, course)? {
        return Err(Error::AlreadyExists(format!(
            "link {} is already in every module it belongs to",
            props.external_url
        )));
    }

    let identity = item
        .bind_remote(RemoteIdentity::ExternalUrl {
            url: props.external_url.clone(),
        })?
        .clone();

    if overwrite {
        for module_name in &item.modules {
            let Some(module) = lookup::find_module(course, module_name)? else {
                continue;
            };
            if let Some(existing) = lookup::find_link_in_module(course, module.id, &props.external_url)? {
                tracing::info!(module = %module.name, url = %props.external_url, "updating link");
                course.edit_module_item(
                    module.id,
                    existing.id,
                    &modules::module_item_for(item, &identity),
                )?;
            }
        }
    }

    let module_items_created = modules::ensure_linked(item, course)?;
    Ok(PublishResult {
        identity,
        created: module_items_created > 0,
        module_items_created,
    })
}
