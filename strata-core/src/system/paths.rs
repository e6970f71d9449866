use std::path::PathBuf;

/// Get the Strata home directory
/// Checks STRATA_HOME environment variable, falls back to ${HOME}/.strata
pub fn strata_home() -> PathBuf {
    if let Ok(path) = std::env::var("STRATA_HOME") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".strata")
}

/// Get the snapshot store directory
/// Checks STRATA_STORE_DIR environment variable, falls back to STRATA_HOME/snapshots
pub fn strata_store_dir() -> PathBuf {
    match std::env::var("STRATA_STORE_DIR") {
        Ok(path) => PathBuf::from(path),
        Err(_) => strata_home().join("snapshots"),
    }
}
