// ABOUTME: The remote course surface the publisher works against
// ABOUTME: Course trait plus the CanvasCourse implementation over ApiClient

use crate::api::ApiClient;
use crate::model::{
    Assignment, AssignmentUpdate, CourseInfo, Folder, Module, ModuleItem, NewModuleItem,
    OnDuplicate, Page, PageRevision, PageUpdate, RemoteFile, UploadTarget,
};
use crate::Result;
use serde_json::json;
use std::path::Path;

/// Everything the publisher needs from a remote course.
///
/// Collection getters return the full collection; lookups are linear scans
/// over them.
pub trait Course {
    fn id(&self) -> u64;
    fn name(&self) -> &str;

    fn files(&self) -> Result<Vec<RemoteFile>>;
    fn upload(
        &self,
        local: &Path,
        target: &UploadTarget,
        on_duplicate: OnDuplicate,
    ) -> Result<RemoteFile>;

    fn folders(&self) -> Result<Vec<Folder>>;
    fn subfolders(&self, folder_id: u64) -> Result<Vec<Folder>>;
    fn create_folder(&self, parent_id: u64, name: &str) -> Result<Folder>;

    fn pages(&self) -> Result<Vec<Page>>;
    fn create_page(&self, page: &PageUpdate) -> Result<Page>;
    fn edit_page(&self, url: &str, page: &PageUpdate) -> Result<Page>;
    fn latest_revision(&self, url: &str) -> Result<PageRevision>;

    fn assignments(&self) -> Result<Vec<Assignment>>;
    fn create_assignment(&self, assignment: &AssignmentUpdate) -> Result<Assignment>;
    fn edit_assignment(&self, id: u64, assignment: &AssignmentUpdate) -> Result<Assignment>;

    fn modules(&self) -> Result<Vec<Module>>;
    fn create_module(&self, name: &str) -> Result<Module>;
    fn delete_module(&self, id: u64) -> Result<()>;
    fn module_items(&self, module_id: u64) -> Result<Vec<ModuleItem>>;
    fn create_module_item(&self, module_id: u64, item: &NewModuleItem) -> Result<ModuleItem>;
    fn edit_module_item(
        &self,
        module_id: u64,
        item_id: u64,
        item: &NewModuleItem,
    ) -> Result<ModuleItem>;
}

/// A Canvas course reached over HTTP.
pub struct CanvasCourse {
    client: ApiClient,
    info: CourseInfo,
}

impl CanvasCourse {
    pub fn open(client: ApiClient, course_id: u64) -> Result<Self> {
        let info: CourseInfo = client.get(&format!("/courses/{}", course_id))?;
        tracing::debug!(course_id, name = %info.name, "opened course");
        Ok(CanvasCourse { client, info })
    }

    fn path(&self, rest: &str) -> String {
        format!("/courses/{}{}", self.info.id, rest)
    }
}

impl Course for CanvasCourse {
    fn id(&self) -> u64 {
        self.info.id
    }

    fn name(&self) -> &str {
        &self.info.name
    }

    fn files(&self) -> Result<Vec<RemoteFile>> {
        self.client.get_all(&self.path("/files"))
    }

    fn upload(
        &self,
        local: &Path,
        target: &UploadTarget,
        on_duplicate: OnDuplicate,
    ) -> Result<RemoteFile> {
        match target {
            UploadTarget::FolderPath(dest) => self.client.upload_file(
                &self.path("/files"),
                local,
                json!({ "parent_folder_path": dest, "on_duplicate": on_duplicate }),
            ),
            UploadTarget::Folder(id) => self.client.upload_file(
                &format!("/folders/{}/files", id),
                local,
                json!({ "on_duplicate": on_duplicate }),
            ),
        }
    }

    fn folders(&self) -> Result<Vec<Folder>> {
        self.client.get_all(&self.path("/folders"))
    }

    fn subfolders(&self, folder_id: u64) -> Result<Vec<Folder>> {
        self.client.get_all(&format!("/folders/{}/folders", folder_id))
    }

    fn create_folder(&self, parent_id: u64, name: &str) -> Result<Folder> {
        self.client
            .post(&format!("/folders/{}/folders", parent_id), json!({ "name": name }))
    }

    fn pages(&self) -> Result<Vec<Page>> {
        self.client.get_all(&self.path("/pages"))
    }

    fn create_page(&self, page: &PageUpdate) -> Result<Page> {
        self.client
            .post(&self.path("/pages"), json!({ "wiki_page": page }))
    }

    fn edit_page(&self, url: &str, page: &PageUpdate) -> Result<Page> {
        self.client.put(
            &self.path(&format!("/pages/{}", url)),
            json!({ "wiki_page": page }),
        )
    }

    fn latest_revision(&self, url: &str) -> Result<PageRevision> {
        self.client
            .get(&self.path(&format!("/pages/{}/revisions/latest", url)))
    }

    fn assignments(&self) -> Result<Vec<Assignment>> {
        self.client.get_all(&self.path("/assignments"))
    }

    fn create_assignment(&self, assignment: &AssignmentUpdate) -> Result<Assignment> {
        self.client
            .post(&self.path("/assignments"), json!({ "assignment": assignment }))
    }

    fn edit_assignment(&self, id: u64, assignment: &AssignmentUpdate) -> Result<Assignment> {
        self.client.put(
            &self.path(&format!("/assignments/{}", id)),
            json!({ "assignment": assignment }),
        )
    }

    fn modules(&self) -> Result<Vec<Module>> {
        self.client.get_all(&self.path("/modules"))
    }

    fn create_module(&self, name: &str) -> Result<Module> {
        self.client
            .post(&self.path("/modules"), json!({ "module": { "name": name } }))
    }

    fn delete_module(&self, id: u64) -> Result<()> {
        self.client.delete(&self.path(&format!("/modules/{}", id)))
    }

    fn module_items(&self, module_id: u64) -> Result<Vec<ModuleItem>> {
        self.client
            .get_all(&self.path(&format!("/modules/{}/items", module_id)))
    }

    fn create_module_item(&self, module_id: u64, item: &NewModuleItem) -> Result<ModuleItem> {
        self.client.post(
            &self.path(&format!("/modules/{}/items", module_id)),
            json!({ "module_item": item }),
        )
    }

    fn edit_module_item(
        &self,
        module_id: u64,
        item_id: u64,
        item: &NewModuleItem,
    ) -> Result<ModuleItem> {
        self.client.put(
            &self.path(&format!("/modules/{}/items/{}", module_id, item_id)),
            json!({ "module_item": item }),
        )
    }
}
