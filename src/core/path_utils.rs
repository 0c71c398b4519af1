/*
 * Locates the per-user directory where the application keeps its preferences and
 * log file. Only the local (non-roaming) configuration directory is used, since
 * nothing stored there is worth syncing between machines.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

/*
 * Returns the platform-specific local configuration directory for `app_name`,
 * creating it on first use. No organization qualifier is used. Returns `None` if
 * the platform offers no home directory or the directory cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", app_name)?;
    let config_path = proj_dirs.config_local_dir();
    if config_path.exists() {
        return Some(config_path.to_path_buf());
    }
    match fs::create_dir_all(config_path) {
        Ok(()) => {
            log::debug!("PathUtils: Created app config directory {config_path:?}");
            Some(config_path.to_path_buf())
        }
        Err(e) => {
            log::error!("PathUtils: Failed to create app config directory {config_path:?}: {e}");
            None
        }
    }
}

/* Full path of a named file inside the app config directory. */
pub fn get_app_config_file_path(app_name: &str, file_name: &str) -> Option<PathBuf> {
    get_base_app_config_local_dir(app_name).map(|dir| dir.join(file_name))
}
