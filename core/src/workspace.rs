//! # Target Workspace
//!
//! Every target gets a directory under the configured base directory:
//!
//! ```text
//! <base_dir>/<name>/
//! ├── tools/      cloned tool repositories
//! ├── machines/
//! ├── nmap/       scan artifacts
//! ├── notes/      info.md
//! ├── loot/
//! ├── shells/
//! └── payloads/   generated payloads
//! ```
//!
//! Creating the tree is idempotent and never touches existing contents.

use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use chrono::Local;
use reconr_common::error::ScaffoldError;
use reconr_common::target::Target;

pub const SUBDIRECTORIES: &[&str] = &[
    "tools", "machines", "nmap", "notes", "loot", "shells", "payloads",
];

const INFO_NOTES: &str = "info.md";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Points at `<base_dir>/<name>` without creating anything.
    pub fn locate(base_dir: &Path, name: &str) -> Self {
        Self {
            root: base_dir.join(name),
        }
    }

    /// Creates `<base_dir>/<name>` and every fixed subdirectory.
    pub fn create(base_dir: &Path, name: &str) -> Result<Self, ScaffoldError> {
        let workspace = Self::locate(base_dir, name);

        for subdir in SUBDIRECTORIES {
            let path = workspace.root.join(subdir);
            fs::create_dir_all(&path).map_err(|source| ScaffoldError { path, source })?;
        }
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.root.join("tools")
    }

    pub fn nmap_dir(&self) -> PathBuf {
        self.root.join("nmap")
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.root.join("notes")
    }

    pub fn payloads_dir(&self) -> PathBuf {
        self.root.join("payloads")
    }
}

/// Whether [`write_info_notes`] wrote a new file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesOutcome {
    Written(PathBuf),
    AlreadyPresent(PathBuf),
}

/// Writes `notes/info.md` unless the operator already has one.
pub fn write_info_notes(
    workspace: &Workspace,
    handle: &str,
    target: &Target,
) -> io::Result<NotesOutcome> {
    let path = workspace.notes_dir().join(INFO_NOTES);
    if path.exists() {
        return Ok(NotesOutcome::AlreadyPresent(path));
    }

    fs::write(&path, info_notes(handle, target.name(), target.address()))?;
    Ok(NotesOutcome::Written(path))
}

fn info_notes(handle: &str, name: &str, address: Ipv4Addr) -> String {
    let now = Local::now();
    format!(
        "\
# ---------------------- #
#   MACHINE INFO         #
#                        #
# IP: {address}
# Name: {handle}
# Box: {name}
# Date: {date}
# Time: {time}
# ---------------------- #

# ------------------ #
# NMAP RESULT        #
# ------------------ #
",
        date = now.format("%Y-%m-%d"),
        time = now.format("%H:%M:%S"),
    )
}
