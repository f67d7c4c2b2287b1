use crate::codec;
use crate::config::Config;
use crate::error::{EditorError, Result};
use crate::executor::{LaunchPlan, Launcher};
use crate::matcher::FuzzyMatcher;
use crate::model::{DesktopEntryRecord, EntryFields};
use crate::persist::{self, DatabaseRefresher};
use crate::presets::{self, Detection, Preset};
use crate::sources::desktop::{self, ScanWarning};
use crate::sources::SearchPaths;
use std::path::PathBuf;

/// Editable copy of the selected record.
#[derive(Debug, Clone)]
pub struct EditForm {
    pub filename: String,
    pub source_path: PathBuf,
    pub is_user_override: bool,
    pub fields: EntryFields,
    pub detected: Option<Detection>,
}

pub struct AppState {
    pub paths: SearchPaths,
    pub entries: Vec<DesktopEntryRecord>,
    pub warnings: Vec<ScanWarning>,
    pub filtered_indices: Vec<usize>,
    pub query: String,
    pub matcher: FuzzyMatcher,
    pub form: Option<EditForm>,
    launcher: Launcher,
    refresher: Box<dyn DatabaseRefresher>,
}

impl AppState {
    pub fn new(config: Config, paths: SearchPaths, refresher: Box<dyn DatabaseRefresher>) -> Self {
        let launcher = Launcher::new(&config);
        Self {
            paths,
            entries: Vec::new(),
            warnings: Vec::new(),
            filtered_indices: Vec::new(),
            query: String::new(),
            matcher: FuzzyMatcher::new(),
            form: None,
            launcher,
            refresher,
        }
    }

    /// Rebuilds the merged list from disk.
    pub fn rescan(&mut self) {
        let report = desktop::scan(&self.paths);
        self.entries = report.records;
        self.warnings = report.warnings;
        self.update_filter();
    }

    pub fn update_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.update_filter();
    }

    pub fn update_filter(&mut self) {
        self.filtered_indices = self.matcher.filter(&self.query, &self.entries);
        log::info!("AppState: query='{}', filtered_count={}", self.query, self.filtered_indices.len());
    }

    pub fn visible(&self) -> impl Iterator<Item = &DesktopEntryRecord> {
        self.filtered_indices.iter().map(|&idx| &self.entries[idx])
    }

    pub fn find(&self, filename: &str) -> Option<&DesktopEntryRecord> {
        self.entries.iter().find(|r| r.filename == filename)
    }

    /// Loads `filename` into the edit form, re-reading it from disk.
    pub fn select(&mut self, filename: &str) -> Result<&EditForm> {
        let record = self
            .find(filename)
            .ok_or_else(|| EditorError::UnknownEntry(filename.to_string()))?;

        let fields = codec::parse(&record.source_path)?;
        let form = EditForm {
            filename: record.filename.clone(),
            source_path: record.source_path.clone(),
            is_user_override: record.is_user_override,
            detected: presets::detect_toolkit(&fields),
            fields,
        };

        Ok(self.form.insert(form))
    }

    pub fn form_mut(&mut self) -> Result<&mut EditForm> {
        self.form.as_mut().ok_or(EditorError::NoSelection)
    }

    pub fn apply_preset(&mut self, id: u8) -> Result<&str> {
        let preset = Preset::from_id(id).ok_or(EditorError::UnknownPreset(id))?;
        let form = self.form_mut()?;
        form.fields.exec = presets::apply_preset(preset, &form.fields.exec);
        Ok(&form.fields.exec)
    }

    /// Writes the form as a user override, rescans and re-selects it.
    pub fn save(&mut self) -> Result<PathBuf> {
        let form = self.form.as_ref().ok_or(EditorError::NoSelection)?;
        let filename = form.filename.clone();
        let target = persist::save(&self.paths, &filename, &form.fields, self.refresher.as_ref())?;
        self.rescan();
        self.select(&filename)?;
        Ok(target)
    }

    pub fn delete_override(&mut self) -> Result<PathBuf> {
        let form = self.form.as_ref().ok_or(EditorError::NoSelection)?;
        let record = self
            .find(&form.filename)
            .ok_or_else(|| EditorError::UnknownEntry(form.filename.clone()))?;
        let removed = persist::delete_override(&self.paths, record, self.refresher.as_ref())?;
        self.form = None;
        self.rescan();
        Ok(removed)
    }

    pub fn test_run(&self, exec: &str, in_terminal: bool) -> Result<LaunchPlan> {
        self.launcher.test_run(exec, in_terminal)
    }

    /// Test-runs the Exec currently in the form.
    pub fn test_run_form(&self) -> Result<LaunchPlan> {
        let form = self.form.as_ref().ok_or(EditorError::NoSelection)?;
        self.launcher.test_run(&form.fields.exec, form.fields.terminal)
    }
}
