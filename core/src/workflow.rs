//! # Workflow Orchestrator
//!
//! Sequences the phases of a run against one target:
//!
//! 1. **Scaffold**: create the target workspace (the only fatal phase).
//! 2. **Notes**: write `notes/info.md`.
//! 3. **Tools**: clone the configured tool repositories.
//! 4. **Classify**: initial scan plus machine-type classification, unless a
//!    type was declared.
//! 5. **Custom scan**: an operator-selected scan, if any.
//! 6. **Advanced scan**: vulnerability scripts picked from the machine type.
//! 7. **Payloads**: one generator job per planned payload.
//!
//! Every phase after scaffolding is fallible on its own. A failure is
//! logged, journaled and counted in the [`RunSummary`], and the run moves on
//! with whatever fallback data it has (an unresolved machine type falls back
//! to `Unknown`, which plans payloads for both families).

use std::net::Ipv4Addr;
use std::sync::Arc;

use anyhow::{Context, bail};
use reconr_common::config::Config;
use reconr_common::error::ScaffoldError;
use reconr_common::journal::RunLog;
use reconr_common::target::{MachineType, Target};
use tokio::fs;
use tracing::{Instrument, Span, error, info, info_span, warn};

use crate::classifier::TypeClassifier;
use crate::operator::Operator;
use crate::payload::{Msfvenom, PayloadGenerator, listener_hint};
use crate::policy::{PayloadPlanner, ScriptSelector};
use crate::process::ProcessRunner;
use crate::provision::Provisioner;
use crate::scanner::{CustomScan, ScanJob, ScanRunner};
use crate::workspace::{NotesOutcome, Workspace, write_info_notes};

mod summary;

pub use summary::{Phase, PhaseFailure, RunSummary, SkippedPhase};

/// Per-run switches, usually straight from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub skip_tools: bool,
    pub skip_scan: bool,
    pub skip_payloads: bool,
    /// Stop after the scan phases.
    pub only_scan: bool,
    /// Skip scaffolding, tools and scans; go straight to payloads.
    pub only_payloads: bool,
    pub listen_host: Option<Ipv4Addr>,
    pub listen_port: Option<u16>,
    pub handle: Option<String>,
}

impl RunOptions {
    fn scanning(&self) -> bool {
        !self.skip_scan && !self.only_payloads
    }

    fn scan_skip_reason(&self) -> &'static str {
        if self.only_payloads {
            "payload-only run"
        } else {
            "scanning disabled (--skip-scan)"
        }
    }
}

pub struct Workflow<'a> {
    config: &'a Config,
    scans: ScanRunner,
    provisioner: Provisioner,
    generator: Arc<dyn PayloadGenerator>,
    operator: Arc<dyn Operator>,
    scripts: ScriptSelector,
    planner: PayloadPlanner,
}

impl<'a> Workflow<'a> {
    /// Wires every collaborator to `runner`, with `msfvenom` as the generator.
    pub fn new(
        config: &'a Config,
        runner: Arc<dyn ProcessRunner>,
        operator: Arc<dyn Operator>,
    ) -> Self {
        let generator: Arc<dyn PayloadGenerator> =
            Arc::new(Msfvenom::new(runner.clone(), &config.payloads.generator));

        Self {
            config,
            scans: ScanRunner::new(runner.clone()),
            provisioner: Provisioner::new(runner, &config.tools.git),
            generator,
            operator,
            scripts: ScriptSelector::from_config(&config.nmap),
            planner: PayloadPlanner::from_config(&config.payloads),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn PayloadGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Runs every phase against `target` and reports what happened.
    ///
    /// Only a workspace that cannot be created aborts the run. Any other
    /// failure ends up in [`RunSummary::errors`].
    pub async fn run(
        &self,
        target: &Target,
        options: &RunOptions,
    ) -> Result<RunSummary, ScaffoldError> {
        let base_dir = &self.config.general.base_dir;

        let workspace = if options.only_payloads {
            Workspace::locate(base_dir, target.name())
        } else {
            Workspace::create(base_dir, target.name())?
        };

        let mut run = Run {
            summary: RunSummary::new(workspace.root().to_path_buf()),
            log: RunLog::in_dir(workspace.root(), &self.config.general),
        };
        run.log.info(&format!(
            "Run started for {} ({})",
            target.name(),
            target.address()
        ));

        if options.only_payloads {
            run.skip(Phase::Scaffold, "payload-only run");
            run.skip(Phase::Notes, "payload-only run");
        } else {
            info!("Working directory ready at {}", workspace.root().display());
            run.summary.complete(Phase::Scaffold);

            let handle = options
                .handle
                .as_deref()
                .unwrap_or(&self.config.general.handle);
            let notes = write_info_notes(&workspace, handle, target)
                .context("could not write info notes");
            if let Some(outcome) = run.settle(Phase::Notes, notes) {
                match outcome {
                    NotesOutcome::Written(path) => info!("Info file created at {}", path.display()),
                    NotesOutcome::AlreadyPresent(path) => {
                        info!("Keeping existing notes at {}", path.display())
                    }
                }
            }
        }

        if options.only_payloads {
            run.skip(Phase::Tools, "payload-only run");
        } else if options.skip_tools {
            run.skip(Phase::Tools, "tool installation disabled (--skip-tools)");
        } else {
            let result = self
                .provision_tools(&workspace)
                .instrument(phase_span(Phase::Tools))
                .await;
            run.settle(Phase::Tools, result);
        }

        let machine_type = match target.declared_type() {
            Some(declared) => {
                run.skip(Phase::Classify, format!("machine type declared as {declared}"));
                declared
            }
            None if !options.scanning() => {
                run.skip(Phase::Classify, options.scan_skip_reason());
                MachineType::Unknown
            }
            None => {
                let result = self
                    .classify(target, &workspace)
                    .instrument(phase_span(Phase::Classify))
                    .await;
                run.settle(Phase::Classify, result)
                    .unwrap_or(MachineType::Unknown)
            }
        };
        run.summary.machine_type = machine_type;

        if !options.scanning() {
            run.skip(Phase::CustomScan, options.scan_skip_reason());
            run.skip(Phase::AdvancedScan, options.scan_skip_reason());
        } else {
            match self.operator.custom_scan() {
                Some(scan) => {
                    let result = self
                        .custom_scan(&scan, target, &workspace)
                        .instrument(phase_span(Phase::CustomScan))
                        .await;
                    run.settle(Phase::CustomScan, result);
                }
                None => run.skip(Phase::CustomScan, "no custom scan selected"),
            }

            let result = self
                .advanced_scan(machine_type, target, &workspace)
                .instrument(phase_span(Phase::AdvancedScan))
                .await;
            run.settle(Phase::AdvancedScan, result);
        }

        if options.only_scan {
            run.skip(Phase::Payloads, "scan-only run");
        } else if options.skip_payloads {
            run.skip(Phase::Payloads, "payload generation disabled (--skip-payloads)");
        } else {
            match options.listen_host.or_else(|| self.operator.listen_host()) {
                None => run.skip(Phase::Payloads, "no listen host (LHOST) provided"),
                Some(listen_host) => {
                    let listen_port = options.listen_port.unwrap_or_else(|| {
                        self.operator
                            .listen_port(self.config.payloads.default_lport)
                    });
                    let result = self
                        .generate_payloads(machine_type, listen_host, listen_port, &workspace)
                        .instrument(phase_span(Phase::Payloads))
                        .await;
                    run.settle(Phase::Payloads, result);
                }
            }
        }

        run.log.info(&format!(
            "Run finished with {} error(s)",
            run.summary.error_count()
        ));
        Ok(run.summary)
    }

    async fn provision_tools(&self, workspace: &Workspace) -> anyhow::Result<()> {
        let repos = &self.config.tools.repos;
        let report = self
            .provisioner
            .provision(repos, &workspace.tools_dir())
            .await?;

        if !report.is_clean() {
            let failed: Vec<String> = report
                .failed
                .iter()
                .map(|failure| format!("{} ({})", failure.url, failure.source))
                .collect();
            bail!(
                "{} of {} repositories failed to clone: {}",
                failed.len(),
                repos.len(),
                failed.join(", ")
            );
        }

        info!(
            "Tools ready: {} cloned, {} already present",
            report.cloned.len(),
            report.present.len()
        );
        Ok(())
    }

    async fn classify(&self, target: &Target, workspace: &Workspace) -> anyhow::Result<MachineType> {
        let job = ScanJob::initial(&self.config.nmap.binary, target.address(), &workspace.nmap_dir());
        TypeClassifier::new(&self.scans, self.operator.as_ref())
            .resolve(&job)
            .await
    }

    async fn custom_scan(
        &self,
        scan: &CustomScan,
        target: &Target,
        workspace: &Workspace,
    ) -> anyhow::Result<()> {
        let job = ScanJob::custom(&self.config.nmap.binary, scan, target.address(), &workspace.nmap_dir());
        let artifact = self
            .scans
            .execute(&job)
            .await
            .with_context(|| format!("{scan} failed"))?;

        info!("{scan} saved to {}", artifact.display());
        Ok(())
    }

    async fn advanced_scan(
        &self,
        machine_type: MachineType,
        target: &Target,
        workspace: &Workspace,
    ) -> anyhow::Result<()> {
        let scripts_path = &self.config.nmap.scripts_path;
        if !fs::try_exists(scripts_path).await.unwrap_or(false) {
            bail!("nmap scripts directory {} not found", scripts_path.display());
        }

        let selector = self.scripts.select(machine_type)?;
        info!("Running '{selector}' scripts against a {machine_type} target");

        let job = ScanJob::advanced(
            &self.config.nmap.binary,
            selector,
            target.address(),
            &workspace.nmap_dir(),
        );
        let artifact = self
            .scans
            .execute(&job)
            .await
            .context("advanced scan failed")?;

        info!("Vulnerability scan saved to {}", artifact.display());
        Ok(())
    }

    async fn generate_payloads(
        &self,
        machine_type: MachineType,
        listen_host: Ipv4Addr,
        listen_port: u16,
        workspace: &Workspace,
    ) -> anyhow::Result<()> {
        let payloads_dir = workspace.payloads_dir();
        let jobs = self
            .planner
            .plan(machine_type, listen_host, listen_port, &payloads_dir)?;

        fs::create_dir_all(&payloads_dir)
            .await
            .with_context(|| format!("could not create {}", payloads_dir.display()))?;

        if machine_type == MachineType::Unknown {
            warn!("Machine type unknown, generating payloads for every family");
        }
        info!("Generating payloads with LHOST={listen_host} LPORT={listen_port}");

        let mut failed = Vec::new();
        for job in &jobs {
            match self.generator.generate(job).await {
                Ok(path) => {
                    info!("{} payload written to {}", job.format, path.display());
                    info!("Listener: {}", listener_hint(job));
                }
                Err(e) => failed.push(format!("{}: {e}", job.output.display())),
            }
        }

        if !failed.is_empty() {
            bail!(
                "{} of {} payloads failed: {}",
                failed.len(),
                jobs.len(),
                failed.join(", ")
            );
        }
        Ok(())
    }
}

/// Mutable state of one run. Owned by [`Workflow::run`] alone.
struct Run {
    summary: RunSummary,
    log: RunLog,
}

impl Run {
    fn skip(&mut self, phase: Phase, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Skipping {phase}: {reason}");
        self.log.info(&format!("Skipped {phase}: {reason}"));
        self.summary.skip(phase, reason);
    }

    /// Records the outcome of a phase and hands back its value on success.
    fn settle<T>(&mut self, phase: Phase, result: anyhow::Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                info!("Phase {phase} completed");
                self.log.info(&format!("Completed {phase}"));
                self.summary.complete(phase);
                Some(value)
            }
            Err(e) => {
                let message = format!("{e:#}");
                error!("Error during {phase}: {message}");
                self.log.error(phase.as_str(), &message);
                self.summary.fail(phase, message);
                None
            }
        }
    }
}

fn phase_span(phase: Phase) -> Span {
    info_span!("phase", step = %phase)
}
