use crate::codec;
use crate::error::EditorError;
use crate::model::{DesktopEntryRecord, EntryFields};
use crate::sources::{ensure_override_dir, list_entry_files, SearchPaths};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Fewer entries than this in the primary system directory usually means a
/// sandboxed session that cannot see the host's launchers.
pub const RESTRICTED_THRESHOLD: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanWarning {
    RestrictedEnvironment { dir: PathBuf, count: usize },
    Unreadable { dir: PathBuf, reason: String },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanWarning::RestrictedEnvironment { dir, count } => write!(
                f,
                "only {} entries in {}; this looks like a sandboxed session (Snap/Flatpak), run from a host terminal to see every application",
                count,
                dir.display()
            ),
            ScanWarning::Unreadable { dir, reason } => {
                write!(f, "skipped {}: {}", dir.display(), reason)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanReport {
    /// Sorted by filename, one per filename.
    pub records: Vec<DesktopEntryRecord>,
    pub warnings: Vec<ScanWarning>,
}

/// Merges every system directory with the override directory.
///
/// Among system directories the earliest listed copy of a filename wins.
/// An override copy always replaces whatever the system directories gave.
pub fn scan(paths: &SearchPaths) -> ScanReport {
    let mut merged: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut warnings = Vec::new();

    for (i, dir) in paths.system_dirs.iter().enumerate() {
        if !dir.exists() {
            debug!("Directory not found: {:?}", dir);
            continue;
        }
        debug!("Scanning desktop files in {:?}", dir);
        let files = match list_entry_files(dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("Skipping {:?}: {}", dir, e);
                warnings.push(unreadable(dir.clone(), &e));
                continue;
            }
        };
        debug!("{:?}: {} entry files", dir, files.len());

        if i == 0 && files.len() < RESTRICTED_THRESHOLD {
            warn!("Suspiciously few entries ({}) in {:?}", files.len(), dir);
            warnings.push(ScanWarning::RestrictedEnvironment {
                dir: dir.clone(),
                count: files.len(),
            });
        }

        for (name, path) in files {
            merged.entry(name).or_insert(path);
        }
    }

    let override_dir = &paths.override_dir;
    match ensure_override_dir(override_dir).and_then(|_| list_entry_files(override_dir)) {
        Ok(files) => {
            debug!("{:?}: {} override files", override_dir, files.len());
            for (name, path) in files {
                merged.insert(name, path);
            }
        }
        Err(e) => {
            warn!("Skipping overrides in {:?}: {}", override_dir, e);
            warnings.push(unreadable(override_dir.clone(), &e));
        }
    }

    let records: Vec<DesktopEntryRecord> = merged
        .into_iter()
        .map(|(filename, path)| {
            let fields = codec::parse(&path).unwrap_or_else(|e| {
                debug!("Falling back to filename for {:?}: {}", path, e);
                EntryFields::default()
            });
            let is_override = paths.is_in_override_dir(&path);
            DesktopEntryRecord::new(filename, path, is_override, fields)
        })
        .collect();

    info!("DesktopSource: found {} entries", records.len());
    ScanReport { records, warnings }
}

fn unreadable(dir: PathBuf, err: &EditorError) -> ScanWarning {
    ScanWarning::Unreadable {
        dir,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct Layout {
        _root: TempDir,
        paths: SearchPaths,
    }

    fn layout(system_count: usize) -> Layout {
        let root = TempDir::new().unwrap();
        let system_dirs = (0..system_count)
            .map(|i| {
                let dir = root.path().join(format!("system{}", i));
                fs::create_dir_all(&dir).unwrap();
                dir
            })
            .collect();
        let override_dir = root.path().join("home/applications");
        Layout {
            paths: SearchPaths::new(system_dirs, override_dir),
            _root: root,
        }
    }

    fn write_entry(dir: &Path, filename: &str, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join(filename),
            format!("[Desktop Entry]\nName={}\nIcon={}-icon\nExec={}\n", name, name, name),
        )
        .unwrap();
    }

    fn find<'a>(report: &'a ScanReport, filename: &str) -> Vec<&'a DesktopEntryRecord> {
        report.records.iter().filter(|r| r.filename == filename).collect()
    }

    #[test]
    fn override_wins_over_system() {
        let l = layout(1);
        write_entry(&l.paths.system_dirs[0], "app.desktop", "System");
        write_entry(&l.paths.override_dir, "app.desktop", "Mine");

        let report = scan(&l.paths);
        let hits = find(&report, "app.desktop");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].is_user_override);
        assert_eq!(hits[0].source_path, l.paths.override_dir.join("app.desktop"));
        assert_eq!(hits[0].display_name, "Mine");
        assert_eq!(hits[0].icon.as_deref(), Some("Mine-icon"));
    }

    #[test]
    fn earlier_system_dir_wins_tie() {
        let l = layout(2);
        write_entry(&l.paths.system_dirs[0], "app.desktop", "First");
        write_entry(&l.paths.system_dirs[1], "app.desktop", "Second");

        let report = scan(&l.paths);
        let hits = find(&report, "app.desktop");
        assert_eq!(hits.len(), 1);
        assert!(!hits[0].is_user_override);
        assert_eq!(hits[0].display_name, "First");
        assert_eq!(hits[0].source_path, l.paths.system_dirs[0].join("app.desktop"));
    }

    #[test]
    fn records_sorted_by_filename() {
        let l = layout(2);
        write_entry(&l.paths.system_dirs[1], "zeta.desktop", "Zeta");
        write_entry(&l.paths.override_dir, "beta.desktop", "Beta");
        write_entry(&l.paths.system_dirs[0], "alpha.desktop", "Alpha");

        let report = scan(&l.paths);
        let names: Vec<_> = report.records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["alpha.desktop", "beta.desktop", "zeta.desktop"]);
    }

    #[test]
    fn broken_file_falls_back_to_filename() {
        let l = layout(1);
        fs::write(l.paths.system_dirs[0].join("broken.desktop"), "not an ini file\n").unwrap();

        let report = scan(&l.paths);
        let hits = find(&report, "broken.desktop");
        assert_eq!(hits[0].display_name, "broken.desktop");
        assert_eq!(hits[0].icon, None);
    }

    #[test]
    fn warns_on_sparse_primary_dir() {
        let l = layout(1);
        write_entry(&l.paths.system_dirs[0], "only.desktop", "Only");

        let report = scan(&l.paths);
        assert!(report.warnings.contains(&ScanWarning::RestrictedEnvironment {
            dir: l.paths.system_dirs[0].clone(),
            count: 1,
        }));
    }

    #[test]
    fn no_warning_for_full_primary_dir() {
        let l = layout(1);
        for i in 0..RESTRICTED_THRESHOLD {
            write_entry(&l.paths.system_dirs[0], &format!("app{}.desktop", i), "App");
        }
        assert!(scan(&l.paths).warnings.is_empty());
    }

    #[test]
    fn unreadable_dir_is_skipped_and_reported() {
        use std::os::unix::fs::PermissionsExt;

        let l = layout(2);
        let locked = l.paths.system_dirs[0].clone();
        write_entry(&l.paths.system_dirs[1], "later.desktop", "Later");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let readable = fs::read_dir(&locked).is_ok();

        let report = scan(&l.paths);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        assert_eq!(find(&report, "later.desktop").len(), 1);
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, ScanWarning::Unreadable { dir, .. } if *dir == locked)));
    }

    #[test]
    fn planted_override_link_is_ignored() {
        use std::os::unix::fs::symlink;

        let l = layout(1);
        write_entry(&l.paths.system_dirs[0], "app.desktop", "System");
        let outside = l.paths.override_dir.with_file_name("outside");
        write_entry(&outside, "secret.desktop", "Escaped");
        fs::create_dir_all(&l.paths.override_dir).unwrap();
        symlink(outside.join("secret.desktop"), l.paths.override_dir.join("app.desktop")).unwrap();

        let report = scan(&l.paths);
        let hits = find(&report, "app.desktop");
        assert_eq!(hits.len(), 1);
        assert!(!hits[0].is_user_override);
        assert_eq!(hits[0].display_name, "System");
    }

    #[test]
    fn creates_missing_override_dir() {
        let l = layout(1);
        assert!(!l.paths.override_dir.exists());
        scan(&l.paths);
        assert!(l.paths.override_dir.is_dir());
    }

    #[test]
    fn missing_system_dir_is_skipped() {
        let mut l = layout(1);
        let gone = l.paths.system_dirs[0].with_file_name("gone");
        l.paths.system_dirs.push(gone);
        write_entry(&l.paths.override_dir, "mine.desktop", "Mine");

        let report = scan(&l.paths);
        assert_eq!(report.records.len(), 1);
    }
}
