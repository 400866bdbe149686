// src/infra/paths.rs — Path management
//
// All paths respect the STUDYLAB_HOME environment variable for isolation.
// When STUDYLAB_HOME is set, config and data live under that directory.
// When unset, config uses ~/.studylab/ and data uses XDG_DATA_HOME/studylab.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the STUDYLAB_HOME override, if set.
fn studylab_home() -> Option<PathBuf> {
    std::env::var_os("STUDYLAB_HOME").map(PathBuf::from)
}

/// Home directory, falling back to the working directory on hosts without one.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $STUDYLAB_HOME/ or ~/.studylab/
pub fn config_dir() -> PathBuf {
    if let Some(home) = studylab_home() {
        return home;
    }
    dirs_home().join(".studylab")
}

/// Data directory: $STUDYLAB_HOME/data/ or ~/.local/share/studylab/
pub fn data_dir() -> PathBuf {
    if let Some(home) = studylab_home() {
        return home.join("data");
    }
    ProjectDirs::from("", "", "studylab")
        .map(|d| d.data_local_dir().to_path_buf())
        .unwrap_or_else(|| config_dir().join("data"))
}

/// Default root of all session output: <data>/output
pub fn default_output_dir() -> PathBuf {
    data_dir().join("output")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Ensure the config directory and the given output root exist.
pub fn ensure_dirs(output_root: &std::path::Path) -> std::io::Result<()> {
    for dir in [config_dir(), output_root.to_path_buf()] {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}
