//! Error taxonomy shared by every crate in the workspace.
//!
//! Only [`ValidationError`] and [`ScaffoldError`] end a run. Everything else is
//! caught at a phase boundary, counted and journaled.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::target::MachineType;

/// A single problem with operator input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("Machine name (-n/--name) is required in non-interactive mode")]
    MissingName,
    #[error("Machine IP (-i/--ip) is required in non-interactive mode")]
    MissingIp,
    #[error("Invalid IP address: {0}")]
    InvalidIp(String),
    #[error("Invalid LHOST IP address: {0}")]
    InvalidListenHost(String),
    #[error("Invalid machine name: {0}. Use only alphanumeric, dash, underscore")]
    InvalidName(String),
    #[error("--only-payloads requires --lhost to be specified")]
    OnlyPayloadsWithoutListenHost,
}

/// Every violation found in one pass over the input. Fatal, raised before any
/// phase runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} invalid argument(s)", .violations.len())]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

/// The working directory tree could not be created. Fatal.
#[derive(Debug, Error)]
#[error("cannot create working directory {}: {source}", .path.display())]
pub struct ScaffoldError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Failure of one external tool invocation (scanner, generator, git).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("`{tool}` was not found in PATH")]
    ToolMissing { tool: String },

    #[error("`{tool}` exited with status {code}")]
    NonZeroExit { tool: String, code: i32 },

    #[error("`{tool}` was terminated by a signal")]
    Terminated { tool: String },

    #[error("failed to launch `{tool}`")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write artifact {}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One repository that could not be cloned. Never blocks the others.
#[derive(Debug, Error)]
#[error("failed to clone {url}")]
pub struct CloneFailure {
    pub url: String,
    #[source]
    pub source: ToolError,
}

/// A policy table has no entry for a machine type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("no script selector configured for machine type {0}")]
    NoScriptSelector(MachineType),
    #[error("no payload template configured for machine type {0}")]
    NoPayloadTemplate(MachineType),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("could not serialize configuration")]
    Serialize(#[from] serde_yaml::Error),
}
