//! XDG directory helpers for config/data locations.

use std::path::PathBuf;

/// Base directory for persistent data (replicas, logs).
///
/// Uses `LUCKY_SHA_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/lucky-sha` or
/// `~/.local/share/lucky-sha`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LUCKY_SHA_DATA_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local")
                .join("share")
        })
        .join("lucky-sha")
}

/// Parent of per-run replica directories.
pub fn clones_dir() -> PathBuf {
    data_dir().join("clones")
}

pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Base directory for configuration files.
///
/// Uses `LUCKY_SHA_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/lucky-sha`
/// or `~/.config/lucky-sha`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LUCKY_SHA_CONFIG_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".config")
        })
        .join("lucky-sha")
}
