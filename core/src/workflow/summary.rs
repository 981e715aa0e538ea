use std::fmt;
use std::path::PathBuf;

use reconr_common::target::MachineType;

/// One orchestrated step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Scaffold,
    Notes,
    Tools,
    Classify,
    CustomScan,
    AdvancedScan,
    Payloads,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Scaffold => "scaffold",
            Phase::Notes => "notes",
            Phase::Tools => "tools",
            Phase::Classify => "classify",
            Phase::CustomScan => "custom-scan",
            Phase::AdvancedScan => "advanced-scan",
            Phase::Payloads => "payloads",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseFailure {
    pub phase: Phase,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPhase {
    pub phase: Phase,
    pub reason: String,
}

/// Outcome of a run. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub completed_phases: Vec<Phase>,
    pub skipped_phases: Vec<SkippedPhase>,
    pub errors: Vec<PhaseFailure>,
    pub machine_type: MachineType,
    pub working_dir: PathBuf,
}

impl RunSummary {
    pub(crate) fn new(working_dir: PathBuf) -> Self {
        Self {
            completed_phases: Vec::new(),
            skipped_phases: Vec::new(),
            errors: Vec::new(),
            machine_type: MachineType::Unknown,
            working_dir,
        }
    }

    pub(crate) fn complete(&mut self, phase: Phase) {
        self.completed_phases.push(phase);
    }

    pub(crate) fn skip(&mut self, phase: Phase, reason: impl Into<String>) {
        self.skipped_phases.push(SkippedPhase {
            phase,
            reason: reason.into(),
        });
    }

    pub(crate) fn fail(&mut self, phase: Phase, message: String) {
        self.errors.push(PhaseFailure { phase, message });
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// `0` when every attempted phase succeeded, `1` otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }
}
