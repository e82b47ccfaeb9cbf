use std::path::{Path, PathBuf};

use crate::errors::ProjectError;

/// Application identity used for platform-conventional directories.
pub const APP_DIR_NAME: &str = "workbench";

/// Overrides the base directory for both data and logs (`{dir}/logs`).
pub const BASE_DIR_ENV: &str = "WORKBENCH_DIR";

/// Names an existing directory that takes precedence over the per-project
/// `output/` subdirectory.
pub const OUTPUT_DIR_ENV: &str = "WORKBENCH_OUTPUT_DIR";

/// Resolve the base data and logs directories.
///
/// Priority: explicit `folder` argument, then `$WORKBENCH_DIR`, then the
/// platform per-user defaults. The explicit and env cases place logs at
/// `{folder}/logs`; the platform case uses the OS state directory where one
/// exists. Nothing is created here.
pub fn resolve_base_dirs(folder: Option<&Path>) -> Result<(PathBuf, PathBuf), ProjectError> {
    if let Some(folder) = folder {
        return Ok((folder.to_path_buf(), folder.join("logs")));
    }
    if let Ok(val) = std::env::var(BASE_DIR_ENV) {
        if !val.is_empty() {
            let base = PathBuf::from(val);
            let logs = base.join("logs");
            return Ok((base, logs));
        }
    }
    platform_base_dirs()
}

fn platform_base_dirs() -> Result<(PathBuf, PathBuf), ProjectError> {
    let data = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local/share")))
        .ok_or(ProjectError::NoBaseDirectory)?
        .join(APP_DIR_NAME);
    let logs = match dirs::state_dir() {
        Some(state) => state.join(APP_DIR_NAME).join("logs"),
        None => data.join("logs"),
    };
    Ok((data, logs))
}
