//! Error types for the sheetcalc command-line front end

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur before any formula is evaluated
#[derive(Error, Debug)]
pub enum SheetcalcError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid cell assignment {0:?} (expected ADDRESS=VALUE, e.g. A1=10)")]
    CellAssignment(String),

    #[error(transparent)]
    Engine(#[from] sheetcalc_engine::engine::EvalError),
}

pub type Result<T> = std::result::Result<T, SheetcalcError>;
