use serde::Serialize;
use std::path::PathBuf;

/// A group other than `[Desktop Entry]`, kept as raw `Key=Value` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtraGroup {
    pub name: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryFields {
    pub name: String,
    pub comment: String,
    pub exec: String,
    pub icon: String,
    pub categories: String,
    pub mime_type: String,
    pub terminal: bool,
    pub no_display: bool,
    pub startup_notify: bool,
    /// Unknown `[Desktop Entry]` keys in file order.
    pub extra: Vec<(String, String)>,
    pub extra_groups: Vec<ExtraGroup>,
}

impl EntryFields {
    /// Sets a known key. Returns false if `key` is not one the editor owns.
    pub fn set_known(&mut self, key: &str, value: &str) -> bool {
        match key {
            "Name" => self.name = value.to_string(),
            "Comment" => self.comment = value.to_string(),
            "Exec" => self.exec = value.to_string(),
            "Icon" => self.icon = value.to_string(),
            "Categories" => self.categories = value.to_string(),
            "MimeType" => self.mime_type = value.to_string(),
            "Terminal" => self.terminal = parse_bool(value),
            "NoDisplay" => self.no_display = parse_bool(value),
            "StartupNotify" => self.startup_notify = parse_bool(value),
            _ => return false,
        }
        true
    }

    /// Known keys with their string form, in file order.
    pub fn known_pairs(&self) -> [(&'static str, String); 9] {
        [
            ("Name", self.name.clone()),
            ("Comment", self.comment.clone()),
            ("Exec", self.exec.clone()),
            ("Icon", self.icon.clone()),
            ("Categories", self.categories.clone()),
            ("MimeType", self.mime_type.clone()),
            ("Terminal", bool_str(self.terminal).to_string()),
            ("NoDisplay", bool_str(self.no_display).to_string()),
            ("StartupNotify", bool_str(self.startup_notify).to_string()),
        ]
    }

    pub fn extra_value(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_extra(&mut self, key: &str, value: &str) {
        match self.extra.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.extra.push((key.to_string(), value.to_string())),
        }
    }
}

pub fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

pub fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[derive(Debug, Clone, Serialize)]
pub struct DesktopEntryRecord {
    pub filename: String,           // Merge key, e.g. "firefox.desktop"
    pub source_path: PathBuf,       // File in effect for this filename
    pub is_user_override: bool,
    pub display_name: String,       // Name= or the filename when unreadable
    pub icon: Option<String>,       // Theme name or absolute path
    pub fields: EntryFields,
}

impl DesktopEntryRecord {
    pub fn new(filename: String, source_path: PathBuf, is_user_override: bool, fields: EntryFields) -> Self {
        let display_name = if fields.name.is_empty() {
            filename.clone()
        } else {
            fields.name.clone()
        };
        let icon = Some(fields.icon.clone()).filter(|i| !i.is_empty());
        Self {
            filename,
            source_path,
            is_user_override,
            display_name,
            icon,
            fields,
        }
    }

    /// Text the list filter matches against.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.display_name, self.filename)
    }
}
