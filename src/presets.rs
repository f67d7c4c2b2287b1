use crate::model::EntryFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    None = 0,
    ElectronWayland = 1,
    GtkWayland = 2,
    QtWayland = 3,
    FirefoxWayland = 4,
    ForceX11 = 5,
}

enum Rewrite {
    /// Flag placed ahead of the first field code, or appended.
    Flag(&'static str),
    /// `env ...` prefix placed in front of the command.
    EnvPrefix(&'static str),
}

struct PresetRule {
    preset: Preset,
    label: &'static str,
    /// Present in the command once the preset has been applied.
    marker: &'static str,
    rewrite: Rewrite,
}

const PRESETS: &[PresetRule] = &[
    PresetRule {
        preset: Preset::ElectronWayland,
        label: "Force Wayland (Electron Apps) -> --ozone-platform=wayland",
        marker: "--ozone-platform=wayland",
        rewrite: Rewrite::Flag("--ozone-platform=wayland"),
    },
    PresetRule {
        preset: Preset::GtkWayland,
        label: "Force Wayland (GTK Apps) -> env GDK_BACKEND=wayland",
        marker: "GDK_BACKEND",
        rewrite: Rewrite::EnvPrefix("env GDK_BACKEND=wayland"),
    },
    PresetRule {
        preset: Preset::QtWayland,
        label: "Force Wayland (Qt Apps) -> env QT_QPA_PLATFORM=wayland",
        marker: "QT_QPA_PLATFORM",
        rewrite: Rewrite::EnvPrefix("env QT_QPA_PLATFORM=wayland"),
    },
    PresetRule {
        preset: Preset::FirefoxWayland,
        label: "Force Wayland (Firefox) -> env MOZ_ENABLE_WAYLAND=1",
        marker: "MOZ_ENABLE_WAYLAND",
        rewrite: Rewrite::EnvPrefix("env MOZ_ENABLE_WAYLAND=1"),
    },
    PresetRule {
        preset: Preset::ForceX11,
        label: "Force X11/Xorg (Generic) -> env GDK_BACKEND=x11 QT_QPA_PLATFORM=xcb",
        marker: "xcb",
        rewrite: Rewrite::EnvPrefix("env GDK_BACKEND=x11 QT_QPA_PLATFORM=xcb"),
    },
];

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::ElectronWayland,
        Preset::GtkWayland,
        Preset::QtWayland,
        Preset::FirefoxWayland,
        Preset::ForceX11,
    ];

    pub fn from_id(id: u8) -> Option<Preset> {
        match id {
            0 => Some(Preset::None),
            1 => Some(Preset::ElectronWayland),
            2 => Some(Preset::GtkWayland),
            3 => Some(Preset::QtWayland),
            4 => Some(Preset::FirefoxWayland),
            5 => Some(Preset::ForceX11),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        rule_for(self)
            .map(|r| r.label)
            .unwrap_or("Select a preset to apply...")
    }
}

fn rule_for(preset: Preset) -> Option<&'static PresetRule> {
    PRESETS.iter().find(|r| r.preset == preset)
}

/// Rewrites `exec` for `preset`. Leaves it untouched when the preset's
/// marker is already there.
pub fn apply_preset(preset: Preset, exec: &str) -> String {
    let Some(rule) = rule_for(preset) else {
        return exec.to_string();
    };
    if exec.contains(rule.marker) {
        return exec.to_string();
    }

    let exec = exec.trim();
    match rule.rewrite {
        Rewrite::Flag(flag) => match first_field_code(exec) {
            Some(at) => {
                let (head, tail) = exec.split_at(at);
                join(&join(head.trim_end(), flag), tail)
            }
            None => join(exec, flag),
        },
        Rewrite::EnvPrefix(prefix) => join(prefix, exec),
    }
}

/// Byte offset of the first whitespace-delimited token starting with `%`.
fn first_field_code(exec: &str) -> Option<usize> {
    let mut prev_ws = true;
    for (i, c) in exec.char_indices() {
        if prev_ws && c == '%' {
            return Some(i);
        }
        prev_ws = c.is_whitespace();
    }
    None
}

fn join(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub preset: Preset,
    pub toolkit: &'static str,
}

struct ToolkitRule {
    preset: Preset,
    toolkit: &'static str,
    /// Matched against the lower-cased Exec.
    exec_keywords: &'static [&'static str],
    /// Matched case-sensitively against Categories.
    category_markers: &'static [&'static str],
}

// First matching rule wins.
const TOOLKIT_RULES: &[ToolkitRule] = &[
    ToolkitRule {
        preset: Preset::ElectronWayland,
        toolkit: "Electron/Chromium",
        exec_keywords: &[
            "electron", "code", "discord", "slack", "obsidian", "vscodium", "vscode",
            "spotify", "typora", "mattermost", "signal", "whatsapp", "teams", "chromium",
            "brave", "google-chrome",
        ],
        category_markers: &[],
    },
    ToolkitRule {
        preset: Preset::FirefoxWayland,
        toolkit: "Firefox (Gecko)",
        exec_keywords: &["firefox", "librewolf", "waterfox", "thunderbird", "seamonkey", "floorp"],
        category_markers: &[],
    },
    ToolkitRule {
        preset: Preset::QtWayland,
        toolkit: "Qt/KDE",
        exec_keywords: &["dolphin", "kate", "kcalc", "okular", "kdenlive"],
        category_markers: &["Qt", "KDE"],
    },
    ToolkitRule {
        preset: Preset::GtkWayland,
        toolkit: "GTK/GNOME",
        exec_keywords: &["gnome-", "gedit", "nautilus", "totem", "evince"],
        category_markers: &["GTK", "GNOME"],
    },
];

/// Suggests a preset for the entry. Never changes anything.
pub fn detect_toolkit(fields: &EntryFields) -> Option<Detection> {
    let exec = fields.exec.to_lowercase();
    TOOLKIT_RULES
        .iter()
        .find(|rule| {
            rule.category_markers.iter().any(|m| fields.categories.contains(m))
                || rule.exec_keywords.iter().any(|k| exec.contains(k))
        })
        .map(|rule| Detection {
            preset: rule.preset,
            toolkit: rule.toolkit,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "foo",
        "code --new-window %F",
        "  spotify %U  ",
        "env GDK_BACKEND=x11 gimp %f",
        "sh -c \"echo 'hi %u'\"",
    ];

    #[test]
    fn ids_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(Preset::from_id(preset.id()), Some(preset));
        }
        assert_eq!(Preset::from_id(0), Some(Preset::None));
        assert_eq!(Preset::from_id(6), None);
    }

    #[test]
    fn none_is_noop() {
        for exec in SAMPLES {
            assert_eq!(apply_preset(Preset::None, exec), *exec);
        }
    }

    #[test]
    fn every_preset_is_idempotent() {
        for preset in Preset::ALL {
            for exec in SAMPLES {
                let once = apply_preset(preset, exec);
                assert_eq!(apply_preset(preset, &once), once, "{:?} on {:?}", preset, exec);
            }
        }
    }

    #[test]
    fn flag_goes_before_field_code() {
        assert_eq!(
            apply_preset(Preset::ElectronWayland, "code --new-window %F"),
            "code --new-window --ozone-platform=wayland %F"
        );
        assert_eq!(
            apply_preset(Preset::ElectronWayland, "discord %U --extra"),
            "discord --ozone-platform=wayland %U --extra"
        );
    }

    #[test]
    fn flag_appended_without_field_code() {
        assert_eq!(
            apply_preset(Preset::ElectronWayland, "obsidian"),
            "obsidian --ozone-platform=wayland"
        );
        assert_eq!(
            apply_preset(Preset::ElectronWayland, "app --url=%u"),
            "app --url=%u --ozone-platform=wayland"
        );
    }

    #[test]
    fn env_prefixes() {
        assert_eq!(apply_preset(Preset::GtkWayland, "gedit %U"), "env GDK_BACKEND=wayland gedit %U");
        assert_eq!(apply_preset(Preset::QtWayland, "kate"), "env QT_QPA_PLATFORM=wayland kate");
        assert_eq!(apply_preset(Preset::FirefoxWayland, "firefox %u"), "env MOZ_ENABLE_WAYLAND=1 firefox %u");
        assert_eq!(
            apply_preset(Preset::ForceX11, "app"),
            "env GDK_BACKEND=x11 QT_QPA_PLATFORM=xcb app"
        );
    }

    #[test]
    fn existing_variable_blocks_prefix() {
        let exec = "env GDK_BACKEND=x11 gimp";
        assert_eq!(apply_preset(Preset::GtkWayland, exec), exec);
        let exec = "env QT_QPA_PLATFORM=xcb app";
        assert_eq!(apply_preset(Preset::ForceX11, exec), exec);
    }

    fn entry(exec: &str, categories: &str) -> EntryFields {
        EntryFields {
            exec: exec.to_string(),
            categories: categories.to_string(),
            ..Default::default()
        }
    }

    fn suggested(fields: &EntryFields) -> u8 {
        detect_toolkit(fields).map(|d| d.preset.id()).unwrap_or(0)
    }

    #[test]
    fn detects_toolkits() {
        assert_eq!(suggested(&entry("/usr/bin/Discord", "")), 1);
        assert_eq!(suggested(&entry("firefox %u", "Network;")), 4);
        assert_eq!(suggested(&entry("okular %U", "")), 3);
        assert_eq!(suggested(&entry("myapp", "Qt;Utility;")), 3);
        assert_eq!(suggested(&entry("nautilus", "")), 2);
        assert_eq!(suggested(&entry("myapp", "GNOME;Utility;")), 2);
        assert_eq!(suggested(&entry("xterm", "System;")), 0);
    }

    #[test]
    fn electron_rule_outranks_category() {
        let d = detect_toolkit(&entry("code %F", "GNOME;")).unwrap();
        assert_eq!(d.preset, Preset::ElectronWayland);
        assert_eq!(d.toolkit, "Electron/Chromium");
    }

    #[test]
    fn detection_does_not_mutate() {
        let fields = entry("spotify", "");
        let before = fields.clone();
        detect_toolkit(&fields);
        assert_eq!(fields, before);
    }
}
