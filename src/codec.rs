use crate::error::{EditorError, Result};
use crate::model::{EntryFields, ExtraGroup};
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

pub const MAIN_GROUP: &str = "Desktop Entry";

enum Group {
    None,
    Main,
    Extra(usize),
}

/// Reads an entry file. A missing file yields empty fields.
pub fn parse(path: &Path) -> Result<EntryFields> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{:?} does not exist, using empty fields", path);
            return Ok(EntryFields::default());
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Err(EditorError::Permission {
                path: path.to_path_buf(),
                source: e,
            });
        }
        Err(e) => {
            return Err(EditorError::Parse {
                path: path.to_path_buf(),
                line: 0,
                message: e.to_string(),
            });
        }
    };
    parse_str(&content, path)
}

/// Parses entry text. `origin` is only used in error reports.
pub fn parse_str(content: &str, origin: &Path) -> Result<EntryFields> {
    let mut fields = EntryFields::default();
    let mut group = Group::None;
    let mut seen_groups = HashSet::new();
    let mut seen_keys = HashSet::new();

    let fail = |line: usize, message: String| EditorError::Parse {
        path: origin.to_path_buf(),
        line,
        message,
    };

    for (idx, raw) in content.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            let name = line
                .strip_prefix('[')
                .and_then(|l| l.strip_suffix(']'))
                .ok_or_else(|| fail(lineno, format!("unterminated group header `{}`", line)))?;
            if !seen_groups.insert(name.to_string()) {
                return Err(fail(lineno, format!("duplicate group [{}]", name)));
            }
            group = if name == MAIN_GROUP {
                Group::Main
            } else {
                fields.extra_groups.push(ExtraGroup {
                    name: name.to_string(),
                    lines: Vec::new(),
                });
                Group::Extra(fields.extra_groups.len() - 1)
            };
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| fail(lineno, format!("expected Key=Value, found `{}`", line)))?;
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            return Err(fail(lineno, "empty key".to_string()));
        }

        match group {
            Group::None => {
                return Err(fail(lineno, format!("key `{}` outside of any group", key)));
            }
            Group::Main => {
                if !seen_keys.insert(key.to_string()) {
                    return Err(fail(lineno, format!("duplicate key `{}`", key)));
                }
                if !fields.set_known(key, value) {
                    fields.extra.push((key.to_string(), value.to_string()));
                }
            }
            Group::Extra(i) => {
                fields.extra_groups[i].lines.push(format!("{}={}", key, value));
            }
        }
    }

    Ok(fields)
}

/// Emits the `[Desktop Entry]` group (known keys first, always present),
/// then any preserved groups.
pub fn serialize(fields: &EntryFields) -> String {
    let mut out = format!("[{}]\n", MAIN_GROUP);

    for (key, value) in fields.known_pairs() {
        let value = if key == "Exec" {
            normalize_exec(&value)
        } else {
            single_line(&value)
        };
        out.push_str(&format!("{}={}\n", key, value));
    }
    for (key, value) in &fields.extra {
        out.push_str(&format!("{}={}\n", key, single_line(value)));
    }

    for group in &fields.extra_groups {
        out.push_str(&format!("\n[{}]\n", group.name));
        for line in &group.lines {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

/// A command must fit on one line.
pub fn normalize_exec(exec: &str) -> String {
    single_line(exec).trim().to_string()
}

fn single_line(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
