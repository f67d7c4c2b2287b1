use crate::config::Config;
use crate::error::{EditorError, Result};
use log::{debug, info};
use regex::Regex;
use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

static FIELD_CODES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("%[uUfFick]").expect("field code pattern is valid"));

/// A resolved command, ready to be spawned without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
}

pub struct Launcher {
    search_path: Option<OsString>,
    env: HashMap<String, String>,
    terminal: Option<String>,
}

impl Launcher {
    pub fn new(config: &Config) -> Self {
        Self {
            search_path: env::var_os("PATH"),
            env: config.launch.env.clone().unwrap_or_default(),
            terminal: config.general.terminal.clone(),
        }
    }

    #[cfg(test)]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Strips field codes, splits with shell quoting rules and resolves the
    /// program. Nothing is executed.
    pub fn prepare(&self, exec: &str, in_terminal: bool) -> Result<LaunchPlan> {
        let cleaned = strip_field_codes(exec);
        let mut tokens = tokenize(&cleaned)?;

        if in_terminal {
            if let Some(term) = self.terminal.as_deref().filter(|t| !t.trim().is_empty()) {
                let mut wrapped = tokenize(term)?;
                wrapped.append(&mut tokens);
                tokens = wrapped;
            }
        }

        if tokens.is_empty() {
            return Err(EditorError::EmptyCommand);
        }
        let program = self.resolve(&tokens[0])?;
        let args = tokens.split_off(1);
        Ok(LaunchPlan { program, args })
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        which::which_in(name, self.search_path.as_ref(), cwd).map_err(|e| {
            debug!("Could not resolve {:?}: {}", name, e);
            EditorError::ExecutableNotFound {
                program: name.to_string(),
            }
        })
    }

    /// Starts the process detached and does not wait for it.
    pub fn spawn(&self, plan: &LaunchPlan) -> Result<()> {
        let mut command = Command::new(&plan.program);
        command
            .args(&plan.args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0);

        info!("Launching {:?} {:?}", plan.program, plan.args);
        command.spawn().map_err(|e| EditorError::Launch {
            program: plan.program.clone(),
            source: e,
        })?;
        Ok(())
    }

    pub fn test_run(&self, exec: &str, in_terminal: bool) -> Result<LaunchPlan> {
        let plan = self.prepare(exec, in_terminal)?;
        self.spawn(&plan)?;
        Ok(plan)
    }
}

/// No file or URL is passed on a test run, so field codes are dropped.
pub fn strip_field_codes(exec: &str) -> String {
    FIELD_CODES.replace_all(exec, "").trim().to_string()
}

pub fn tokenize(command: &str) -> Result<Vec<String>> {
    shell_words::split(command).map_err(|e| EditorError::CommandParse {
        command: command.to_string(),
        source: e,
    })
}
