use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const APP_QUALIFIER: &str = "com";
pub const APP_ORG: &str = "valentine";
pub const APP_NAME: &str = "confessions";

/// Environment override for the data directory.
pub const DATA_DIR_ENV: &str = "VC_DATA_DIR";

pub fn data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(override_path) = std::env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(override_path));
    }
    let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("cannot determine data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Device-local key slot file (file key backend).
pub fn device_store_path(data_dir: &Path) -> PathBuf {
    data_dir.join("device.json")
}

pub fn directory_path(data_dir: &Path) -> PathBuf {
    data_dir.join("directory.json")
}

pub fn confessions_path(data_dir: &Path) -> PathBuf {
    data_dir.join("confessions.json")
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}
