//! The project lifecycle state machine: one mutable "current project"
//! pointer, with the registry and the directory tree kept consistent across
//! create/switch/copy/delete and the purge repair operation.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::ProjectError;
use crate::layout;
use crate::paths;
use crate::registry::{Attributes, ProjectRecord, Registry, RegistryLocation};
use crate::slug;

/// Registry file name under the base data directory.
pub const REGISTRY_FILENAME: &str = "projects.redb";

/// Lock file excluded from project tree copies.
pub const LOCK_FILENAME: &str = "write-lock";

const MAX_DISPLAY: usize = 25;

/// Lifecycle notifications delivered to [`ProjectManager::on_event`] hooks
/// after the corresponding operation has committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectEvent {
    Created,
    Activated,
    Deleted,
}

type EventCallback = Box<dyn Fn(ProjectEvent, &str) + Send>;

/// Manages named project workspaces under one base directory pair.
///
/// Construct one instance per base-directory configuration and pass it
/// around explicitly. Callers sharing an instance across threads must
/// serialize lifecycle calls themselves.
pub struct ProjectManager {
    base_data_dir: PathBuf,
    base_logs_dir: PathBuf,
    registry: Registry,
    current: Option<String>,
    read_only: bool,
    output_dir_preference: Option<PathBuf>,
    callbacks: Vec<EventCallback>,
}

impl ProjectManager {
    /// Resolve base directories (explicit `folder` > `$WORKBENCH_DIR` >
    /// platform default), create both roots, and open the registry file.
    /// Starts with no active project.
    pub fn new(folder: Option<&Path>) -> Result<Self, ProjectError> {
        let (base_data_dir, base_logs_dir) = paths::resolve_base_dirs(folder)?;
        std::fs::create_dir_all(&base_data_dir)?;
        std::fs::create_dir_all(&base_logs_dir)?;
        let registry = Registry::open(RegistryLocation::File(base_data_dir.join(REGISTRY_FILENAME)))?;
        tracing::debug!("project manager opened at {}", base_data_dir.display());
        Ok(Self {
            base_data_dir,
            base_logs_dir,
            registry,
            current: None,
            read_only: false,
            output_dir_preference: None,
            callbacks: Vec::new(),
        })
    }

    pub fn base_data_dir(&self) -> &Path {
        &self.base_data_dir
    }

    pub fn base_logs_dir(&self) -> &Path {
        &self.base_logs_dir
    }

    /// Name of the active project, if any.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Mark the active project read-only for this instance. Cleared on the
    /// next [`set_current`](Self::set_current).
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Register a hook called after create/activate/delete operations with
    /// the affected project name.
    pub fn on_event(&mut self, callback: impl Fn(ProjectEvent, &str) + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    fn emit(&self, event: ProjectEvent, name: &str) {
        for callback in &self.callbacks {
            callback(event, name);
        }
    }

    // ---- Registry access

    pub fn list(&self) -> Result<Vec<ProjectRecord>, ProjectError> {
        self.registry.list()
    }

    pub fn contains(&self, name: &str) -> Result<bool, ProjectError> {
        self.registry.contains(name)
    }

    pub fn count(&self) -> Result<usize, ProjectError> {
        self.registry.count()
    }

    pub fn get(&self, name: &str) -> Result<ProjectRecord, ProjectError> {
        self.registry.get(name)
    }

    /// Swap the registry for another backing store. The in-memory location
    /// is meant for ephemeral use; [`use_file_registry`](Self::use_file_registry)
    /// reattaches the regular file under the data root.
    pub fn attach_registry(&mut self, location: RegistryLocation) -> Result<(), ProjectError> {
        // redb holds an exclusive lock on its file, so drop the current
        // handle before opening a file-backed location.
        self.registry = Registry::open(RegistryLocation::Memory)?;
        self.registry = Registry::open(location)?;
        Ok(())
    }

    pub fn use_in_memory_registry(&mut self) -> Result<(), ProjectError> {
        self.attach_registry(RegistryLocation::Memory)
    }

    pub fn use_file_registry(&mut self) -> Result<(), ProjectError> {
        let path = self.base_data_dir.join(REGISTRY_FILENAME);
        self.attach_registry(RegistryLocation::File(path))
    }

    // ---- Path accessors (require an active project)

    /// Root directory of the active project.
    pub fn dir(&self) -> Result<PathBuf, ProjectError> {
        let current = self.current.as_deref().ok_or(ProjectError::NoActiveProject)?;
        Ok(self.base_data_dir.join(slug::sanitize(current)))
    }

    /// Logs directory of the active project.
    pub fn logs_dir(&self) -> Result<PathBuf, ProjectError> {
        let current = self.current.as_deref().ok_or(ProjectError::NoActiveProject)?;
        Ok(self.base_logs_dir.join(slug::sanitize(current)))
    }

    /// Directory for output files.
    ///
    /// Uses `$WORKBENCH_OUTPUT_DIR` when it names an existing path, then the
    /// configured preference, then `output/` in the active project.
    pub fn output_dir(&self) -> Result<PathBuf, ProjectError> {
        if self.current.is_none() {
            return Err(ProjectError::NoActiveProject);
        }
        if let Ok(val) = std::env::var(paths::OUTPUT_DIR_ENV) {
            let path = PathBuf::from(&val);
            if !val.is_empty() && path.exists() {
                return Ok(path);
            }
        }
        if let Some(path) = &self.output_dir_preference {
            if path.exists() {
                return Ok(path.clone());
            }
        }
        match self.request_directory("output")? {
            Some(path) => Ok(path),
            None => Err(ProjectError::DirectoryCreationFailed(self.dir()?.join("output"))),
        }
    }

    /// Set or clear the preferred output directory consulted by
    /// [`output_dir`](Self::output_dir).
    pub fn set_output_dir_preference(&mut self, path: Option<PathBuf>) {
        self.output_dir_preference = path;
    }

    /// Create and return the subdirectory `name` under the active project
    /// root. Returns `Ok(None)` when the directory cannot be provided, so
    /// callers can treat optional output locations as skippable.
    pub fn request_directory(&self, name: &str) -> Result<Option<PathBuf>, ProjectError> {
        let root = self.dir()?;
        layout::ensure_named_subdir(&root, name)
    }

    // ---- Lifecycle

    /// Ensure a registry record and directory tree exist for `name` (the
    /// active project when omitted). Idempotent: an existing record keeps
    /// its attributes. Does not change the active project.
    pub fn create_project(
        &mut self,
        name: Option<&str>,
        attributes: Option<Attributes>,
    ) -> Result<ProjectRecord, ProjectError> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self
                .current
                .clone()
                .ok_or(ProjectError::NoActiveProject)?,
        };
        let record = self
            .registry
            .get_or_create(&name, attributes.unwrap_or_default())?;
        let sanitized = slug::sanitize(&name);
        layout::ensure_project_tree(&self.base_data_dir.join(&sanitized))?;
        layout::ensure_logs_dir(&self.base_logs_dir.join(&sanitized))?;
        tracing::debug!("ensured project `{name}`");
        self.emit(ProjectEvent::Created, &name);
        Ok(record)
    }

    /// Activate `name`, creating it on disk and in the registry if needed.
    /// Clears the read-only flag.
    pub fn set_current(
        &mut self,
        name: &str,
        attributes: Option<Attributes>,
    ) -> Result<(), ProjectError> {
        self.current = Some(name.to_string());
        self.read_only = false;
        self.create_project(Some(name), attributes)?;
        tracing::info!("switched to project `{name}`");
        self.emit(ProjectEvent::Activated, name);
        Ok(())
    }

    /// Copy the active project to `new_name`: same attributes, a deep copy
    /// of the directory tree (minus the lock file), and a fresh logs
    /// directory. Optionally switches to the copy.
    ///
    /// The registry entry is written before the filesystem copy; a crash
    /// mid-copy leaves a partial directory that `purge_deleted_directories`
    /// will not touch but a re-run copy would reject, never a record with
    /// silently missing data.
    pub fn copy_project(&mut self, new_name: &str, switch: bool) -> Result<(), ProjectError> {
        let current = self
            .current
            .clone()
            .ok_or(ProjectError::NoActiveProject)?;
        if self.registry.contains(new_name)? {
            return Err(ProjectError::DuplicateName(new_name.to_string()));
        }
        let dst = self.base_data_dir.join(slug::sanitize(new_name));
        // A directory without a registry entry still blocks the copy; the
        // caller should purge or pick another name.
        if dst.exists() {
            return Err(ProjectError::DuplicateName(new_name.to_string()));
        }

        let record = self.registry.get(&current)?;
        self.registry.create(new_name, record.attributes)?;
        let src = self.base_data_dir.join(slug::sanitize(&current));
        layout::copy_tree(&src, &dst, &[LOCK_FILENAME])?;
        layout::ensure_logs_dir(&self.base_logs_dir.join(slug::sanitize(new_name)))?;
        tracing::info!("copied project `{current}` to `{new_name}`");

        if switch {
            self.set_current(new_name, None)?;
        }
        Ok(())
    }

    /// Delete project `name`, or the active project when omitted.
    ///
    /// The registry entry goes first; with `delete_dir` the directory tree
    /// follows (erroring with `NotADirectory` on corruption rather than
    /// swallowing it). When the deleted project was the active one, the
    /// first remaining registry entry becomes active, or none remain and the
    /// manager returns to the no-active-project state. Returns the resulting
    /// active project name.
    pub fn delete_project(
        &mut self,
        name: Option<&str>,
        delete_dir: bool,
    ) -> Result<Option<String>, ProjectError> {
        let victim = match name {
            Some(name) => name.to_string(),
            None => self
                .current
                .clone()
                .ok_or(ProjectError::NoActiveProject)?,
        };
        if !self.registry.contains(&victim)? {
            return Err(ProjectError::NotFound(victim));
        }

        self.registry.delete(&victim)?;
        if delete_dir {
            layout::remove_tree(&self.base_data_dir.join(slug::sanitize(&victim)))?;
        }
        tracing::info!("deleted project `{victim}` (delete_dir: {delete_dir})");

        if self.current.as_deref() == Some(victim.as_str()) {
            match self.registry.list()?.into_iter().next() {
                Some(record) => self.set_current(&record.name, None)?,
                None => self.current = None,
            }
        }
        self.emit(ProjectEvent::Deleted, &victim);
        Ok(self.current.clone())
    }

    /// Remove directories under the data root that belong to no registered
    /// project. Returns the number removed. This is the repair operation for
    /// trees orphaned by interrupted copies/deletes or external tampering.
    pub fn purge_deleted_directories(&self) -> Result<usize, ProjectError> {
        let registered: HashSet<String> = self
            .registry
            .list()?
            .iter()
            .map(|record| slug::sanitize(&record.name))
            .collect();
        let mut removed = 0;
        for name in layout::list_subdirectories(&self.base_data_dir)? {
            let path = self.base_data_dir.join(&name);
            // The logs root nests under the data root in explicit-folder
            // configurations and must survive a purge.
            if path == self.base_logs_dir {
                continue;
            }
            if !registered.contains(&name) {
                tracing::info!("purging orphaned directory {}", path.display());
                layout::remove_tree(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl fmt::Display for ProjectManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self
            .list()
            .map(|records| records.into_iter().map(|r| r.name).collect())
            .unwrap_or_default();
        names.sort_by_key(|name| name.to_lowercase());
        write!(f, "workbench manager with {} projects:", names.len())?;
        for name in names.iter().take(MAX_DISPLAY) {
            write!(f, "\n\t{name}")?;
        }
        if names.len() > MAX_DISPLAY {
            write!(f, "\n\t...")?;
        }
        Ok(())
    }
}
