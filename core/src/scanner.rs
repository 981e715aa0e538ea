//! Network scanner invocation.
//!
//! Every scan is a [`ScanJob`]: a structured nmap command plus the artifact
//! path its textual output is captured to. [`ScanRunner`] executes a job
//! exactly once. Nothing here retries: a failing scan means a configuration
//! or connectivity problem the workflow cannot fix by itself.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reconr_common::error::ToolError;
use tokio::fs;
use tracing::{debug, warn};

use crate::process::{CommandSpec, ProcessRunner};

mod custom;

pub use custom::{CustomScan, valid_port_list};

pub const INITIAL_ARTIFACT: &str = "initial_scan.txt";
pub const ADVANCED_ARTIFACT: &str = "vulnscan.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// Service/version scan used for classification.
    Initial,
    /// Vulnerability scripts chosen from the classification.
    Advanced,
    /// Operator-selected scan from the fixed menu.
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanJob {
    pub kind: ScanKind,
    pub command: CommandSpec,
    pub artifact: PathBuf,
}

impl ScanJob {
    /// `nmap -sC -sV <ip>` into `nmap/initial_scan.txt`.
    pub fn initial(binary: &str, address: Ipv4Addr, nmap_dir: &Path) -> Self {
        Self {
            kind: ScanKind::Initial,
            command: CommandSpec::new(binary)
                .args(["-sC", "-sV"])
                .arg(address.to_string()),
            artifact: nmap_dir.join(INITIAL_ARTIFACT),
        }
    }

    /// `nmap --script <selector> <ip>` into `nmap/vulnscan.txt`.
    pub fn advanced(binary: &str, selector: &str, address: Ipv4Addr, nmap_dir: &Path) -> Self {
        Self {
            kind: ScanKind::Advanced,
            command: CommandSpec::new(binary)
                .arg("--script")
                .arg(selector)
                .arg(address.to_string()),
            artifact: nmap_dir.join(ADVANCED_ARTIFACT),
        }
    }

    pub fn custom(binary: &str, scan: &CustomScan, address: Ipv4Addr, nmap_dir: &Path) -> Self {
        Self {
            kind: ScanKind::Custom,
            command: CommandSpec::new(binary)
                .args(scan.arguments())
                .arg(address.to_string()),
            artifact: nmap_dir.join(format!("nmap-{}.txt", scan.slug())),
        }
    }
}

pub struct ScanRunner {
    runner: Arc<dyn ProcessRunner>,
}

impl ScanRunner {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Runs `job` and returns the path of the artifact it produced.
    ///
    /// The scanner binary is located before anything is launched. Output is
    /// captured even when the scanner exits abnormally, as long as it
    /// produced some.
    pub async fn execute(&self, job: &ScanJob) -> Result<PathBuf, ToolError> {
        let tool = job.command.program.clone();

        if self.runner.locate(&tool).is_none() {
            return Err(ToolError::ToolMissing { tool });
        }

        debug!("{:?} scan: {}", job.kind, job.command);
        let output = self
            .runner
            .run(&job.command)
            .await
            .map_err(|source| ToolError::Launch {
                tool: tool.clone(),
                source,
            })?;

        if output.success() {
            write_artifact(&job.artifact, &output.stdout).await?;
            return Ok(job.artifact.clone());
        }

        if !output.stdout.is_empty() {
            if let Err(e) = write_artifact(&job.artifact, &output.stdout).await {
                warn!("Partial scan output was lost: {e}");
            }
        }

        Err(match output.code {
            Some(code) => ToolError::NonZeroExit { tool, code },
            None => ToolError::Terminated { tool },
        })
    }
}

async fn write_artifact(path: &Path, contents: &[u8]) -> Result<(), ToolError> {
    let to_error = |source| ToolError::Artifact {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(to_error)?;
    }
    fs::write(path, contents).await.map_err(to_error)
}
