//! On-disk layout of a node installation

use crate::artifacts::ServerType;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Resolved paths of a node installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFileSystem {
    /// Node home directory
    pub home: PathBuf,
    /// Configuration directory
    pub config_path: PathBuf,
    /// Plugin management binary
    pub plugin_binary: PathBuf,
    /// Folder for downloads and cached homes
    pub local_folder: PathBuf,
}

impl NodeFileSystem {
    /// Standard layout under `home`
    pub fn new(server_type: ServerType, home: impl Into<PathBuf>, local_folder: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            config_path: home.join("config"),
            plugin_binary: home.join("bin").join(server_type.plugin_binary_name()),
            home,
            local_folder: local_folder.into(),
        }
    }

    pub fn plugins_path(&self) -> PathBuf {
        self.home.join("plugins")
    }
}

/// Recursively copy `source` into `target`, leaving files that already exist untouched
pub fn copy_dir_all(source: &Path, target: &Path) -> io::Result<()> {
    copy_tree(source, target, false)
}

/// Recursively copy `source` into `target`, replacing files that already exist
pub fn overwrite_dir_all(source: &Path, target: &Path) -> io::Result<()> {
    copy_tree(source, target, true)
}

fn copy_tree(source: &Path, target: &Path, overwrite: bool) -> io::Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination)?;
        } else if overwrite || !destination.exists() {
            std::fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}
