//! Machine-type classification from scan output.

use anyhow::Context;
use reconr_common::target::MachineType;
use tokio::fs;
use tracing::{info, warn};

use crate::operator::Operator;
use crate::scanner::{ScanJob, ScanRunner};

/// Returns the family named on the first line that mentions one.
///
/// Lines are checked in order, so whichever of "Windows" or "Linux" appears
/// first in the text decides. Text mentioning neither is `Unknown`.
pub fn classify(text: &str) -> MachineType {
    text.lines()
        .find_map(|line| {
            if line.contains("Windows") {
                Some(MachineType::Windows)
            } else if line.contains("Linux") {
                Some(MachineType::Linux)
            } else {
                None
            }
        })
        .unwrap_or(MachineType::Unknown)
}

/// Runs the initial scan until it yields a verdict or the operator gives up.
pub struct TypeClassifier<'a> {
    scans: &'a ScanRunner,
    operator: &'a dyn Operator,
}

impl<'a> TypeClassifier<'a> {
    pub fn new(scans: &'a ScanRunner, operator: &'a dyn Operator) -> Self {
        Self { scans, operator }
    }

    /// Scans, classifies, and on `Unknown` asks whether to scan again.
    ///
    /// There is no retry bound other than the operator's answer. A scan
    /// failure ends the loop with an error.
    pub async fn resolve(&self, job: &ScanJob) -> anyhow::Result<MachineType> {
        let mut attempt: usize = 1;

        loop {
            let artifact = self
                .scans
                .execute(job)
                .await
                .context("initial scan failed")?;

            let raw = fs::read(&artifact)
                .await
                .with_context(|| format!("could not read {}", artifact.display()))?;
            let verdict = classify(&String::from_utf8_lossy(&raw));

            if verdict != MachineType::Unknown {
                info!("Machine type detected: {verdict}");
                return Ok(verdict);
            }

            warn!("Machine type could not be determined (attempt {attempt})");
            if !self.operator.confirm_rescan() {
                return Ok(MachineType::Unknown);
            }
            attempt += 1;
        }
    }
}
