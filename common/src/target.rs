//! # Target Model
//!
//! Defines the host a run is pointed at and the operating system families
//! the workflow can tell apart.
//!
//! Input coming from the command line or the console is validated here:
//! * Machine names may only contain ASCII letters, digits, `-` and `_`.
//! * Addresses must be dotted-quad IPv4 literals with every octet in `0..=255`.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, Violation};

/// Operating system family of the target, as declared by the operator or
/// inferred from scan output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineType {
    Windows,
    Linux,
    /// Classification was inconclusive. Not an error.
    Unknown,
}

impl MachineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineType::Windows => "Windows",
            MachineType::Linux => "Linux",
            MachineType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MachineType {
    type Err = String;

    /// Case-insensitive: "windows", "Linux", "UNKNOWN" all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows" => Ok(MachineType::Windows),
            "linux" => Ok(MachineType::Linux),
            "unknown" => Ok(MachineType::Unknown),
            other => Err(format!("invalid machine type: {other}")),
        }
    }
}

/// Output container produced by the payload generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    Exe,
    Elf,
}

impl PayloadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadFormat::Exe => "exe",
            PayloadFormat::Elf => "elf",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single host a run is pointed at. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    address: Ipv4Addr,
    declared_type: Option<MachineType>,
}

impl Target {
    /// Validates `name` and `address`, collecting every violation instead of
    /// stopping at the first one.
    pub fn new(
        name: &str,
        address: &str,
        declared_type: Option<MachineType>,
    ) -> Result<Self, ValidationError> {
        let mut violations = Vec::new();

        if !validate_machine_name(name) {
            violations.push(Violation::InvalidName(name.to_string()));
        }

        let parsed = parse_ipv4(address);
        if parsed.is_none() {
            violations.push(Violation::InvalidIp(address.to_string()));
        }

        match parsed {
            Some(address) if violations.is_empty() => Ok(Self {
                name: name.to_string(),
                address,
                declared_type,
            }),
            _ => Err(ValidationError::new(violations)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn declared_type(&self) -> Option<MachineType> {
        self.declared_type
    }
}

/// Returns `true` iff `s` is exactly four dot-separated decimal octets,
/// each in `0..=255`.
pub fn validate_ipv4(s: &str) -> bool {
    parse_ipv4(s).is_some()
}

/// Parses a dotted-quad IPv4 literal.
///
/// Leading zeros are accepted ("010" is octet 10); signs, blanks and
/// anything other than ASCII digits are not.
pub fn parse_ipv4(s: &str) -> Option<Ipv4Addr> {
    let octets: Vec<u8> = s
        .split('.')
        .map(parse_octet)
        .collect::<Option<Vec<u8>>>()?;

    let octets: [u8; 4] = octets.try_into().ok()?;
    Some(Ipv4Addr::from(octets))
}

fn parse_octet(octet_str: &str) -> Option<u8> {
    if octet_str.is_empty() || !octet_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    octet_str.parse::<u8>().ok()
}

/// Returns `true` iff `s` is non-empty and matches `^[A-Za-z0-9_-]+$`.
pub fn validate_machine_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
