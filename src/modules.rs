// ABOUTME: Keeps published items linked into their named course modules
// ABOUTME: Module membership is a set: an item is added to a module at most once

use crate::content::{ContentItem, ContentKind, RemoteIdentity};
use crate::lookup;
use crate::model::{Module, NewModuleItem};
use crate::remote::Course;
use crate::{Error, Result};

pub fn find_or_create_module(course: &dyn Course, name: &str) -> Result<Module> {
    match lookup::find_module(course, name)? {
        Some(module) => Ok(module),
        None => {
            tracing::info!(module = name, "creating module");
            course.create_module(name)
        }
    }
}

/// Module item payload linking `identity` under the item's title.
pub fn module_item_for(item: &ContentItem, identity: &RemoteIdentity) -> NewModuleItem {
    let mut new_item = NewModuleItem {
        item_type: identity.module_item_type(),
        content_id: identity.content_id(),
        page_url: None,
        external_url: None,
        title: Some(item.name.clone()),
        new_tab: None,
    };

    match identity {
        RemoteIdentity::Page { url, .. } => new_item.page_url = Some(url.clone()),
        RemoteIdentity::ExternalUrl { url } => {
            new_item.external_url = Some(url.clone());
            if let ContentKind::Link(props) = &item.kind {
                new_item.new_tab = Some(props.new_tab);
            }
        }
        RemoteIdentity::Assignment { .. } | RemoteIdentity::File { .. } => {}
    }

    new_item
}

/// Link a published item into every module it declares.
///
/// Returns how many module items were created.
pub fn ensure_linked(item: &ContentItem, course: &dyn Course) -> Result<usize> {
    let identity = item.remote().ok_or_else(|| {
        Error::DoesNotExist(format!(
            "{} ({}) doesn't exist on canvas yet, publish it before linking it into modules",
            item, item.name
        ))
    })?;

    let mut created = 0;
    for module_name in &item.modules {
        let module = find_or_create_module(course, module_name)?;
        let present = course
            .module_items(module.id)?
            .iter()
            .any(|existing| identity.matches(existing));

        if present {
            tracing::debug!(module = %module.name, item = %item.name, "already linked");
            continue;
        }

        tracing::info!(module = %module.name, item = %item.name, "adding module item");
        course.create_module_item(module.id, &module_item_for(item, identity))?;
        created += 1;
    }

    Ok(created)
}

/// Whether `identity` is an item of the named module.
///
/// A missing module is a `DoesNotExist` error.
pub fn is_in_module(
    identity: &RemoteIdentity,
    module_name: &str,
    course: &dyn Course,
) -> Result<bool> {
    let module = lookup::get_module(course, module_name)?;
    Ok(course
        .module_items(module.id)?
        .iter()
        .any(|existing| identity.matches(existing)))
}

/// Delete the named module. Returns whether anything was deleted.
pub fn delete_module(course: &dyn Course, name: &str, missing_ok: bool) -> Result<bool> {
    let module = match lookup::find_module(course, name)? {
        Some(module) => module,
        None if missing_ok => return Ok(false),
        None => {
            return Err(Error::DoesNotExist(format!(
                "tried to delete module {}, but it doesn't exist in the course",
                name
            )))
        }
    };

    tracing::info!(module = name, id = module.id, "deleting module");
    course.delete_module(module.id)?;
    Ok(true)
}
