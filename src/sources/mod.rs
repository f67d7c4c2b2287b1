use crate::error::{EditorError, Result};
use directories::BaseDirs;
use log::debug;
use std::fs::{self, DirBuilder};
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub mod desktop;

pub const ENTRY_EXTENSION: &str = ".desktop";

/// System lookup directories in priority order, plus the one directory
/// the editor writes to.
#[derive(Debug, Clone)]
pub struct SearchPaths {
    pub system_dirs: Vec<PathBuf>,
    pub override_dir: PathBuf,
}

impl SearchPaths {
    pub fn new(system_dirs: Vec<PathBuf>, override_dir: PathBuf) -> Self {
        Self {
            system_dirs,
            override_dir,
        }
    }

    /// Snap, Flatpak and distro locations. Not configurable.
    pub fn platform() -> Option<Self> {
        let base_dirs = BaseDirs::new()?;
        let data_dir = base_dirs.data_dir();
        Some(Self::new(
            vec![
                PathBuf::from("/usr/share/applications"),
                PathBuf::from("/usr/local/share/applications"),
                PathBuf::from("/var/lib/snapd/desktop/applications"),
                PathBuf::from("/var/lib/flatpak/exports/share/applications"),
                data_dir.join("flatpak/exports/share/applications"),
            ],
            data_dir.join("applications"),
        ))
    }

    pub fn override_path(&self, filename: &str) -> PathBuf {
        self.override_dir.join(filename)
    }

    pub fn is_in_override_dir(&self, path: &Path) -> bool {
        path.parent() == Some(self.override_dir.as_path())
    }
}

/// Creates the override directory owner-only if it is missing.
pub fn ensure_override_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    debug!("Creating override directory {:?}", dir);
    DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
        .map_err(|e| EditorError::Io {
            path: dir.to_path_buf(),
            source: e,
        })
}

/// Lists `(filename, path)` for every entry file directly inside `dir`,
/// sorted by filename.
///
/// An entry must resolve (following symlinks) to a file whose parent is
/// `dir` itself. Flatpak export directories are the one exception: every
/// launcher there is a link into the app's install tree.
pub fn list_entry_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let real_dir = fs::canonicalize(dir).map_err(|e| dir_error(dir, e))?;
    fs::read_dir(dir).map_err(|e| dir_error(dir, e))?;
    let links_may_leave = is_flatpak_export(dir);
    let mut found = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable item in {:?}: {}", dir, e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !name.ends_with(ENTRY_EXTENSION) {
            continue;
        }
        let path = dir.join(name);
        if !links_may_leave && !resolves_into(&real_dir, &path) {
            debug!("Ignoring {:?}: resolves outside {:?}", path, dir);
            continue;
        }
        found.push((name.to_string(), path));
    }

    Ok(found)
}

/// `.../flatpak/exports/share/applications`, system or per-user.
pub fn is_flatpak_export(dir: &Path) -> bool {
    dir.ends_with("exports/share/applications")
}

/// True if `path` canonicalizes to a file directly inside `real_dir`.
/// Dangling links never qualify.
fn resolves_into(real_dir: &Path, path: &Path) -> bool {
    fs::canonicalize(path)
        .map(|resolved| resolved.parent() == Some(real_dir))
        .unwrap_or(false)
}

fn dir_error(dir: &Path, source: io::Error) -> EditorError {
    if source.kind() == io::ErrorKind::PermissionDenied {
        EditorError::Permission {
            path: dir.to_path_buf(),
            source,
        }
    } else {
        EditorError::Io {
            path: dir.to_path_buf(),
            source,
        }
    }
}
