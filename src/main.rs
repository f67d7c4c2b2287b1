mod codec;
mod config;
mod error;
mod executor;
mod matcher;
mod model;
mod persist;
mod presets;
mod sources;
mod state;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crate::config::load_config;
use crate::persist::CommandRefresher;
use crate::presets::Preset;
use crate::sources::SearchPaths;
use crate::state::AppState;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Edit application launcher entries through per-user overrides", long_about = None)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List installed entries (* marks user overrides)
    List {
        /// Fuzzy filter on name and filename
        query: Option<String>,
        /// Only show user overrides
        #[arg(long)]
        overrides: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show the editable fields of an entry
    Show { filename: String },
    /// Change fields and save them as a user override
    Edit {
        filename: String,
        #[command(flatten)]
        changes: FieldChanges,
        /// Preset id to apply to Exec (see `presets`)
        #[arg(long)]
        preset: Option<u8>,
        /// Print the resulting file instead of saving it
        #[arg(long)]
        dry_run: bool,
    },
    /// List the available Exec presets
    Presets,
    /// Launch an entry's command without a shell
    Run {
        #[arg(required_unless_present = "command")]
        filename: Option<String>,
        /// Raw command string to run instead of an entry
        #[arg(long, conflicts_with = "filename")]
        command: Option<String>,
    },
    /// Delete a user override and fall back to the system entry
    Restore { filename: String },
}

#[derive(clap::Args, Debug, Default)]
struct FieldChanges {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    comment: Option<String>,
    #[arg(long)]
    exec: Option<String>,
    #[arg(long)]
    icon: Option<String>,
    #[arg(long)]
    categories: Option<String>,
    #[arg(long)]
    mime_type: Option<String>,
    #[arg(long)]
    terminal: Option<bool>,
    #[arg(long)]
    no_display: Option<bool>,
    #[arg(long)]
    startup_notify: Option<bool>,
}

impl FieldChanges {
    fn apply(self, fields: &mut model::EntryFields) {
        let FieldChanges { name, comment, exec, icon, categories, mime_type, terminal, no_display, startup_notify } = self;
        if let Some(v) = name { fields.name = v; }
        if let Some(v) = comment { fields.comment = v; }
        if let Some(v) = exec { fields.exec = v; }
        if let Some(v) = icon { fields.icon = v; }
        if let Some(v) = categories { fields.categories = v; }
        if let Some(v) = mime_type { fields.mime_type = v; }
        if let Some(v) = terminal { fields.terminal = v; }
        if let Some(v) = no_display { fields.no_display = v; }
        if let Some(v) = startup_notify { fields.startup_notify = v; }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // 1. Load Config
    let config = load_config(args.config.as_deref())?;

    // 2. Scan entries
    let paths = SearchPaths::platform().context("cannot determine the home directory")?;
    let refresher = Box::new(CommandRefresher::new(&config));
    let mut app = AppState::new(config, paths, refresher);

    if let Cmd::Presets = args.command {
        for preset in Preset::ALL {
            println!("{}  {}", preset.id(), preset.label());
        }
        return Ok(());
    }
    if let Cmd::Run { command: Some(command), .. } = &args.command {
        let plan = app.test_run(command, false)?;
        println!("Launched {} {:?}", plan.program.display(), plan.args);
        return Ok(());
    }

    app.rescan();
    for warning in &app.warnings {
        eprintln!("warning: {}", warning);
    }

    // 3. Dispatch
    match args.command {
        Cmd::List { query, overrides, json } => {
            app.update_query(query.as_deref().unwrap_or(""));
            let records: Vec<_> = app.visible().filter(|r| !overrides || r.is_user_override).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for r in records {
                    let marker = if r.is_user_override { "*" } else { " " };
                    println!("{} {:<48} {}", marker, r.filename, r.display_name);
                }
            }
        }
        Cmd::Show { filename } => {
            let form = app.select(&filename)?;
            print_form(form);
        }
        Cmd::Edit { filename, changes, preset, dry_run } => {
            app.select(&filename)?;
            changes.apply(&mut app.form_mut()?.fields);
            if let Some(id) = preset {
                app.apply_preset(id)?;
            }
            if dry_run {
                if let Some(form) = &app.form {
                    print!("{}", codec::serialize(&form.fields));
                }
            } else {
                let target = app.save()?;
                println!("Saved {}", target.display());
            }
        }
        Cmd::Run { filename: Some(filename), .. } => {
            app.select(&filename)?;
            let plan = app.test_run_form()?;
            println!("Launched {} {:?}", plan.program.display(), plan.args);
        }
        Cmd::Restore { filename } => {
            app.select(&filename)?;
            let removed = app.delete_override()?;
            println!("Removed {}", removed.display());
        }
        // Handled before the scan.
        Cmd::Presets | Cmd::Run { .. } => {}
    }

    Ok(())
}

fn print_form(form: &state::EditForm) {
    let origin = if form.is_user_override { "user override" } else { "system default" };
    println!("{} ({})", form.filename, origin);
    println!("  path: {}", form.source_path.display());
    let f = &form.fields;
    for (key, value) in f.known_pairs() {
        println!("  {}={}", key, value);
    }
    for (key, value) in &f.extra {
        println!("  {}={}", key, value);
    }
    for group in &f.extra_groups {
        println!("  [{}] ({} keys)", group.name, group.lines.len());
    }
    match form.detected {
        Some(d) => println!("Detected toolkit: {} (preset {}: {})", d.toolkit, d.preset.id(), d.preset.label()),
        None => println!("Toolkit not detected automatically."),
    }
}
