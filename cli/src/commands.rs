pub mod run;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use reconr_common::error::{ValidationError, Violation};
use reconr_common::target::{self, MachineType};
use reconr_core::workflow::RunOptions;

#[derive(Parser, Debug)]
#[command(name = "reconr", version)]
#[command(about = "Recon, scanning and payload workflow for a single lab machine.")]
#[command(after_help = "\
Examples:
  # Interactive mode (default)
  reconr

  # Non-interactive mode with all options
  reconr -n MyBox -i 10.10.10.150 -t Linux -l 10.10.14.5

  # Run only nmap scans
  reconr -n MyBox -i 10.10.10.150 --only-scan")]
pub struct CommandLine {
    /// Machine name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Target machine IP address
    #[arg(short, long)]
    pub ip: Option<String>,

    /// Machine type, skips auto-detection
    #[arg(short = 't', long = "type", value_enum, ignore_case = true)]
    pub machine_type: Option<DeclaredType>,

    /// Your IP address (LHOST) for payload generation
    #[arg(short, long)]
    pub lhost: Option<String>,

    /// Listening port for payloads [default: 4444, or payloads.default_lport]
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub lport: Option<u16>,

    /// Your handle, written into the notes
    #[arg(short = 'H', long)]
    pub handle: Option<String>,

    /// Skip tool installation
    #[arg(long)]
    pub skip_tools: bool,

    /// Skip nmap scanning
    #[arg(long)]
    pub skip_scan: bool,

    /// Skip payload generation
    #[arg(long)]
    pub skip_payloads: bool,

    /// Only run nmap scans (skip payload generation)
    #[arg(long)]
    pub only_scan: bool,

    /// Only generate payloads (requires --lhost)
    #[arg(long)]
    pub only_payloads: bool,

    /// Force interactive mode
    #[arg(short = 'I', long)]
    pub interactive: bool,

    /// Configuration file [default: first of ./reconr.yaml, ~/.reconr.yaml, ...]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    pub dump_config: bool,

    /// Show debug output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeclaredType {
    Windows,
    Linux,
}

impl From<DeclaredType> for MachineType {
    fn from(declared: DeclaredType) -> Self {
        match declared {
            DeclaredType::Windows => MachineType::Windows,
            DeclaredType::Linux => MachineType::Linux,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Interactive unless forced off by giving a name or an IP.
    pub fn is_interactive(&self) -> bool {
        self.interactive || (self.name.is_none() && self.ip.is_none())
    }

    /// Checks every argument and reports all violations at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let interactive = self.is_interactive();
        let mut violations = Vec::new();

        if !interactive {
            if self.name.is_none() {
                violations.push(Violation::MissingName);
            }
            if self.ip.is_none() {
                violations.push(Violation::MissingIp);
            }
        }

        if let Some(ip) = &self.ip {
            if !target::validate_ipv4(ip) {
                violations.push(Violation::InvalidIp(ip.clone()));
            }
        }

        if let Some(lhost) = &self.lhost {
            if !target::validate_ipv4(lhost) {
                violations.push(Violation::InvalidListenHost(lhost.clone()));
            }
        }

        if let Some(name) = &self.name {
            if !target::validate_machine_name(name) {
                violations.push(Violation::InvalidName(name.clone()));
            }
        }

        if !interactive && self.only_payloads && self.lhost.is_none() {
            violations.push(Violation::OnlyPayloadsWithoutListenHost);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// Only meaningful after [`CommandLine::validate`] succeeded.
    pub fn run_options(&self, handle: Option<String>) -> RunOptions {
        RunOptions {
            skip_tools: self.skip_tools,
            skip_scan: self.skip_scan,
            skip_payloads: self.skip_payloads,
            only_scan: self.only_scan,
            only_payloads: self.only_payloads,
            listen_host: self.lhost.as_deref().and_then(target::parse_ipv4),
            listen_port: self.lport,
            handle: handle.or_else(|| self.handle.clone()),
        }
    }
}
