use crate::codec;
use crate::config::Config;
use crate::error::{EditorError, Result, SecurityError};
use crate::model::{DesktopEntryRecord, EntryFields};
use crate::sources::{ensure_override_dir, SearchPaths, ENTRY_EXTENSION};
use log::{debug, info, warn};
use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// rw-r--r--, never executable.
const ENTRY_MODE: u32 = 0o644;

/// Tells the desktop environment that the override directory changed.
pub trait DatabaseRefresher {
    fn refresh(&self, dir: &Path);
}

/// Runs an external tool such as `update-desktop-database DIR`.
pub struct CommandRefresher {
    command: String,
}

impl CommandRefresher {
    pub fn new(config: &Config) -> Self {
        Self {
            command: config.general.refresh_command.clone(),
        }
    }
}

impl DatabaseRefresher for CommandRefresher {
    fn refresh(&self, dir: &Path) {
        if self.command.trim().is_empty() {
            return;
        }
        let status = Command::new(&self.command)
            .arg(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) if status.success() => debug!("{} {:?} done", self.command, dir),
            Ok(status) => warn!("{} exited with {}", self.command, status),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("{} command not found", self.command)
            }
            Err(e) => warn!("Could not run {}: {}", self.command, e),
        }
    }
}

pub fn validate_filename(filename: &str) -> std::result::Result<(), SecurityError> {
    let bad = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\', '\0'])
        || !filename.ends_with(ENTRY_EXTENSION);
    if bad {
        return Err(SecurityError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// Writes `fields` as the user override for `filename`. System paths are
/// never written.
pub fn save(
    paths: &SearchPaths,
    filename: &str,
    fields: &EntryFields,
    refresher: &dyn DatabaseRefresher,
) -> Result<PathBuf> {
    validate_filename(filename)?;
    ensure_override_dir(&paths.override_dir)?;

    let target = paths.override_path(filename);
    if let Ok(meta) = fs::symlink_metadata(&target) {
        if meta.file_type().is_symlink() {
            return Err(SecurityError::SymlinkTarget(target).into());
        }
    }

    let mut fields = fields.clone();
    // A DBus-activated entry ignores Exec.
    if fields.extra_value("DBusActivatable").is_some() {
        fields.set_extra("DBusActivatable", "false");
    }

    write_atomic(&target, codec::serialize(&fields).as_bytes())?;
    info!("Saved override {:?}", target);

    refresher.refresh(&paths.override_dir);
    Ok(target)
}

/// Temp sibling, chmod, rename. The temp file is removed on every error path.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let save_err = |source: io::Error| EditorError::Save {
        path: target.to_path_buf(),
        source,
    };
    let dir = target
        .parent()
        .ok_or_else(|| SecurityError::OutsideOverrideDir(target.to_path_buf()))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".deskedit-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(save_err)?;
    tmp.write_all(bytes).map_err(save_err)?;
    tmp.as_file().sync_all().map_err(save_err)?;
    fs::set_permissions(tmp.path(), Permissions::from_mode(ENTRY_MODE)).map_err(save_err)?;

    tmp.persist(target).map_err(|e| {
        let tempfile::PersistError { error, file } = e;
        drop(file);
        save_err(error)
    })?;
    Ok(())
}

/// Removes a user override so the system copy (if any) shows again.
pub fn delete_override(
    paths: &SearchPaths,
    record: &DesktopEntryRecord,
    refresher: &dyn DatabaseRefresher,
) -> Result<PathBuf> {
    if !paths.is_in_override_dir(&record.source_path) {
        return Err(EditorError::NotAnOverride {
            path: record.source_path.clone(),
        });
    }

    fs::remove_file(&record.source_path).map_err(|e| EditorError::Delete {
        path: record.source_path.clone(),
        source: e,
    })?;
    info!("Deleted override {:?}", record.source_path);

    refresher.refresh(&paths.override_dir);
    Ok(record.source_path.clone())
}
