use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Refusals raised before any file is touched.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("invalid entry filename {0:?}")]
    InvalidFilename(String),
    #[error("refusing to write through symlink {0}")]
    SymlinkTarget(PathBuf),
    #[error("{0} is outside the override directory")]
    OutsideOverrideDir(PathBuf),
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("failed to parse {path}: line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("cannot split command `{command}`: {source}")]
    CommandParse {
        command: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error("permission denied reading {path}")]
    Permission {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error("executable `{program}` not found on search path")]
    ExecutableNotFound { program: String },

    #[error("command is empty")]
    EmptyCommand,

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a user override")]
    NotAnOverride { path: PathBuf },

    #[error("unknown preset id {0}")]
    UnknownPreset(u8),

    #[error("no entry named {0}")]
    UnknownEntry(String),

    #[error("no entry selected")]
    NoSelection,
}

pub type Result<T> = std::result::Result<T, EditorError>;
