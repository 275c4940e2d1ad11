use std::path::PathBuf;

/// Per-user data root of the desktop shell (logs live under it).
pub(crate) fn default_data_root() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".folio"))
}

pub(crate) fn log_dir() -> Option<PathBuf> {
    default_data_root().map(|root| root.join("logs"))
}
