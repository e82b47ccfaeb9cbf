//! Named project workspaces.
//!
//! Each project pairs a record in an embedded registry (name plus arbitrary
//! JSON attributes) with a directory tree on disk. A [`ProjectManager`]
//! keeps the two consistent across create/switch/copy/delete, points at a
//! single "current" project that gates all path accessors, and repairs
//! orphaned directories via
//! [`purge_deleted_directories`](ProjectManager::purge_deleted_directories).
//!
//! ```no_run
//! use workbench::ProjectManager;
//!
//! # fn main() -> Result<(), workbench::ProjectError> {
//! let mut manager = ProjectManager::new(None)?;
//! manager.set_current("my analysis", None)?;
//! let data = manager.dir()?;
//! manager.copy_project("my analysis v2", true)?;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod layout;
pub mod manager;
pub mod paths;
pub mod registry;
pub mod slug;

pub use errors::ProjectError;
pub use manager::{ProjectEvent, ProjectManager};
pub use registry::{Attributes, ProjectRecord, Registry, RegistryLocation};
