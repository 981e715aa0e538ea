//! Tool provisioning: clones the configured repositories into `tools/`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reconr_common::error::{CloneFailure, ToolError};
use tracing::{debug, info, warn};

use crate::process::{CommandSpec, ProcessRunner};

#[derive(Debug, Default)]
pub struct ProvisionReport {
    pub cloned: Vec<String>,
    /// Already checked out by an earlier run.
    pub present: Vec<String>,
    pub failed: Vec<CloneFailure>,
}

impl ProvisionReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Provisioner {
    runner: Arc<dyn ProcessRunner>,
    git: String,
}

impl Provisioner {
    pub fn new(runner: Arc<dyn ProcessRunner>, git: impl Into<String>) -> Self {
        Self {
            runner,
            git: git.into(),
        }
    }

    /// Clones every repository in `repos` into `tools_dir/<repo-name>`.
    ///
    /// A failing repository is recorded and the rest are still attempted.
    /// Only a missing `git` binary stops the whole step.
    pub async fn provision(
        &self,
        repos: &[String],
        tools_dir: &Path,
    ) -> Result<ProvisionReport, ToolError> {
        if self.runner.locate(&self.git).is_none() {
            return Err(ToolError::ToolMissing {
                tool: self.git.clone(),
            });
        }

        let mut report = ProvisionReport::default();

        for url in repos {
            let destination = tools_dir.join(repo_dir_name(url));
            if destination.exists() {
                debug!("{} already present", destination.display());
                report.present.push(url.clone());
                continue;
            }

            match self.clone_repo(url, &destination).await {
                Ok(()) => {
                    info!("Cloned {url}");
                    report.cloned.push(url.clone());
                }
                Err(source) => {
                    warn!("Could not clone {url}: {source}");
                    report.failed.push(CloneFailure {
                        url: url.clone(),
                        source,
                    });
                }
            }
        }

        Ok(report)
    }

    async fn clone_repo(&self, url: &str, destination: &Path) -> Result<(), ToolError> {
        let command = CommandSpec::new(&self.git)
            .arg("clone")
            .arg("--")
            .arg(url)
            .arg(destination.to_string_lossy());

        let output = self
            .runner
            .run(&command)
            .await
            .map_err(|source| ToolError::Launch {
                tool: self.git.clone(),
                source,
            })?;

        match output.code {
            Some(0) => Ok(()),
            Some(code) => Err(ToolError::NonZeroExit {
                tool: self.git.clone(),
                code,
            }),
            None => Err(ToolError::Terminated {
                tool: self.git.clone(),
            }),
        }
    }
}

/// Last path segment of the URL, without a trailing `.git`.
pub fn repo_dir_name(url: &str) -> PathBuf {
    let last = url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(url);
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() || name == "." || name == ".." {
        PathBuf::from("repository")
    } else {
        PathBuf::from(name)
    }
}
