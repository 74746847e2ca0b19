// ABOUTME: In-memory Course used by integration tests
// ABOUTME: Mirrors Canvas semantics closely enough to count objects and mutations

#![allow(dead_code)]

use md2canvas::model::{
    Assignment, AssignmentUpdate, Folder, Module, ModuleItem, NewModuleItem, OnDuplicate, Page,
    PageRevision, PageUpdate, RemoteFile, UploadTarget,
};
use md2canvas::{Course, Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Default)]
pub struct State {
    pub files: Vec<RemoteFile>,
    pub folders: Vec<Folder>,
    pub pages: Vec<Page>,
    pub assignments: Vec<Assignment>,
    pub modules: Vec<Module>,
    pub items: HashMap<u64, Vec<ModuleItem>>,
    pub page_edits: Vec<(String, PageUpdate)>,
    pub assignment_edits: Vec<(u64, AssignmentUpdate)>,
    pub item_edits: Vec<(u64, NewModuleItem)>,
    pub mutations: Vec<String>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct FakeCourse {
    id: u64,
    name: String,
    pub state: RefCell<State>,
}

impl FakeCourse {
    pub fn new() -> Self {
        let mut state = State {
            next_id: 100,
            ..Default::default()
        };
        state.folders.push(Folder {
            id: 1,
            name: "course files".into(),
            full_name: Folder::ROOT_FULL_NAME.into(),
            parent_folder_id: None,
        });
        FakeCourse {
            id: 3099,
            name: "Test Course".into(),
            state: RefCell::new(state),
        }
    }

    pub fn mutation_count(&self) -> usize {
        self.state.borrow().mutations.len()
    }

    pub fn page_count(&self) -> usize {
        self.state.borrow().pages.len()
    }

    pub fn module_count(&self) -> usize {
        self.state.borrow().modules.len()
    }

    pub fn item_count(&self) -> usize {
        self.state.borrow().items.values().map(Vec::len).sum()
    }

    pub fn items_of(&self, module_name: &str) -> Vec<ModuleItem> {
        let state = self.state.borrow();
        state
            .modules
            .iter()
            .find(|m| m.name == module_name)
            .and_then(|m| state.items.get(&m.id).cloned())
            .unwrap_or_default()
    }

    pub fn folder_named(&self, full_name: &str) -> Option<Folder> {
        self.state
            .borrow()
            .folders
            .iter()
            .find(|f| f.full_name == full_name)
            .cloned()
    }

    /// Seed a module without counting it as a mutation.
    pub fn seed_module(&self, name: &str) -> Module {
        let mut state = self.state.borrow_mut();
        let module = Module {
            id: state.next_id(),
            name: name.into(),
            position: None,
        };
        state.modules.push(module.clone());
        state.items.insert(module.id, Vec::new());
        module
    }

    pub fn seed_page(&self, title: &str, body: &str) -> Page {
        let mut state = self.state.borrow_mut();
        let page = Page {
            page_id: state.next_id(),
            url: md2canvas::util::slugify(title),
            title: title.into(),
            body: Some(body.into()),
            published: Some(true),
        };
        state.pages.push(page.clone());
        page
    }

    pub fn seed_link(&self, module_id: u64, url: &str) {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.items.entry(module_id).or_default().push(ModuleItem {
            id,
            item_type: md2canvas::model::ModuleItemType::ExternalUrl,
            title: Some(url.into()),
            content_id: None,
            page_url: None,
            external_url: Some(url.into()),
            new_tab: Some(false),
        });
    }

    fn ensure_path(state: &mut State, destination: &str) -> u64 {
        let mut current = 1;
        let mut full_name = Folder::ROOT_FULL_NAME.to_string();
        for segment in destination.split('/').filter(|s| !s.is_empty()) {
            full_name = format!("{}/{}", full_name, segment);
            current = match state.folders.iter().find(|f| f.full_name == full_name) {
                Some(f) => f.id,
                None => {
                    let id = state.next_id();
                    state.folders.push(Folder {
                        id,
                        name: segment.into(),
                        full_name: full_name.clone(),
                        parent_folder_id: Some(current),
                    });
                    state.mutations.push(format!("create_folder {}", full_name));
                    id
                }
            };
        }
        current
    }
}

fn missing(what: &str) -> Error {
    Error::Api {
        endpoint: what.into(),
        status: 404,
        message: "not found".into(),
    }
}

impl Course for FakeCourse {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn files(&self) -> Result<Vec<RemoteFile>> {
        Ok(self.state.borrow().files.clone())
    }

    fn upload(
        &self,
        local: &Path,
        target: &UploadTarget,
        on_duplicate: OnDuplicate,
    ) -> Result<RemoteFile> {
        let size = fs::metadata(local)?.len();
        let filename = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut state = self.state.borrow_mut();
        let folder_id = match target {
            UploadTarget::FolderPath(dest) => Self::ensure_path(&mut state, dest),
            UploadTarget::Folder(id) => *id,
        };
        state.mutations.push(format!("upload {}", filename));

        let clash = state
            .files
            .iter()
            .position(|f| f.folder_id == Some(folder_id) && f.filename == filename);
        let (id, filename) = match (clash, on_duplicate) {
            (Some(i), OnDuplicate::Overwrite) => {
                let old = state.files.remove(i);
                (old.id, filename)
            }
            (Some(_), OnDuplicate::Rename) => (state.next_id(), format!("1-{}", filename)),
            (None, _) => (state.next_id(), filename),
        };

        let file = RemoteFile {
            id,
            filename,
            display_name: None,
            size,
            folder_id: Some(folder_id),
            url: format!("https://canvas.test/files/{}/download?download_frd=1", id),
        };
        state.files.push(file.clone());
        Ok(file)
    }

    fn folders(&self) -> Result<Vec<Folder>> {
        Ok(self.state.borrow().folders.clone())
    }

    fn subfolders(&self, folder_id: u64) -> Result<Vec<Folder>> {
        Ok(self
            .state
            .borrow()
            .folders
            .iter()
            .filter(|f| f.parent_folder_id == Some(folder_id))
            .cloned()
            .collect())
    }

    fn create_folder(&self, parent_id: u64, name: &str) -> Result<Folder> {
        let mut state = self.state.borrow_mut();
        let parent = state
            .folders
            .iter()
            .find(|f| f.id == parent_id)
            .cloned()
            .ok_or_else(|| missing("folder"))?;
        let folder = Folder {
            id: state.next_id(),
            name: name.into(),
            full_name: format!("{}/{}", parent.full_name, name),
            parent_folder_id: Some(parent_id),
        };
        state.mutations.push(format!("create_folder {}", folder.full_name));
        state.folders.push(folder.clone());
        Ok(folder)
    }

    fn pages(&self) -> Result<Vec<Page>> {
        Ok(self.state.borrow().pages.clone())
    }

    fn create_page(&self, page: &PageUpdate) -> Result<Page> {
        let mut state = self.state.borrow_mut();
        let title = page.title.clone().unwrap_or_default();
        let created = Page {
            page_id: state.next_id(),
            url: md2canvas::util::slugify(&title),
            title,
            body: page.body.clone(),
            published: Some(false),
        };
        state.mutations.push(format!("create_page {}", created.title));
        state.pages.push(created.clone());
        Ok(created)
    }

    fn edit_page(&self, url: &str, update: &PageUpdate) -> Result<Page> {
        let mut state = self.state.borrow_mut();
        state.mutations.push(format!("edit_page {}", url));
        state.page_edits.push((url.to_string(), update.clone()));
        let page = state
            .pages
            .iter_mut()
            .find(|p| p.url == url)
            .ok_or_else(|| missing("page"))?;
        if let Some(title) = &update.title {
            page.title = title.clone();
        }
        if let Some(body) = &update.body {
            page.body = Some(body.clone());
        }
        Ok(page.clone())
    }

    fn latest_revision(&self, url: &str) -> Result<PageRevision> {
        let state = self.state.borrow();
        let page = state
            .pages
            .iter()
            .find(|p| p.url == url)
            .ok_or_else(|| missing("page"))?;
        Ok(PageRevision {
            title: Some(page.title.clone()),
            body: page.body.clone(),
        })
    }

    fn assignments(&self) -> Result<Vec<Assignment>> {
        Ok(self.state.borrow().assignments.clone())
    }

    fn create_assignment(&self, assignment: &AssignmentUpdate) -> Result<Assignment> {
        let mut state = self.state.borrow_mut();
        let created = Assignment {
            id: state.next_id(),
            name: assignment.name.clone().unwrap_or_default(),
            description: None,
        };
        state.mutations.push(format!("create_assignment {}", created.name));
        state.assignments.push(created.clone());
        Ok(created)
    }

    fn edit_assignment(&self, id: u64, update: &AssignmentUpdate) -> Result<Assignment> {
        let mut state = self.state.borrow_mut();
        state.mutations.push(format!("edit_assignment {}", id));
        state.assignment_edits.push((id, update.clone()));
        let assignment = state
            .assignments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| missing("assignment"))?;
        if let Some(description) = &update.description {
            assignment.description = Some(description.clone());
        }
        Ok(assignment.clone())
    }

    fn modules(&self) -> Result<Vec<Module>> {
        Ok(self.state.borrow().modules.clone())
    }

    fn create_module(&self, name: &str) -> Result<Module> {
        let mut state = self.state.borrow_mut();
        let module = Module {
            id: state.next_id(),
            name: name.into(),
            position: None,
        };
        state.mutations.push(format!("create_module {}", name));
        state.modules.push(module.clone());
        state.items.insert(module.id, Vec::new());
        Ok(module)
    }

    fn delete_module(&self, id: u64) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.mutations.push(format!("delete_module {}", id));
        state.modules.retain(|m| m.id != id);
        state.items.remove(&id);
        Ok(())
    }

    fn module_items(&self, module_id: u64) -> Result<Vec<ModuleItem>> {
        self.state
            .borrow()
            .items
            .get(&module_id)
            .cloned()
            .ok_or_else(|| missing("module"))
    }

    fn create_module_item(&self, module_id: u64, item: &NewModuleItem) -> Result<ModuleItem> {
        let mut state = self.state.borrow_mut();
        let created = ModuleItem {
            id: state.next_id(),
            item_type: item.item_type,
            title: item.title.clone(),
            content_id: item.content_id,
            page_url: item.page_url.clone(),
            external_url: item.external_url.clone(),
            new_tab: item.new_tab,
        };
        state.mutations.push(format!("create_module_item {}", module_id));
        state
            .items
            .get_mut(&module_id)
            .ok_or_else(|| missing("module"))?
            .push(created.clone());
        Ok(created)
    }

    fn edit_module_item(
        &self,
        module_id: u64,
        item_id: u64,
        item: &NewModuleItem,
    ) -> Result<ModuleItem> {
        let mut state = self.state.borrow_mut();
        state.mutations.push(format!("edit_module_item {}", item_id));
        state.item_edits.push((item_id, item.clone()));
        let existing = state
            .items
            .get_mut(&module_id)
            .and_then(|items| items.iter_mut().find(|i| i.id == item_id))
            .ok_or_else(|| missing("module item"))?;
        existing.title = item.title.clone();
        existing.new_tab = item.new_tab;
        Ok(existing.clone())
    }
}
