//! # Runtime Configuration
//!
//! Built once in `main` and handed to the workflow by reference.
//!
//! Values come from the built-in defaults, overridden section by section by a
//! YAML file. Omitted keys keep their defaults, but a map that is present
//! replaces the default map entirely.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::target::{MachineType, PayloadFormat};

const FILE_NAMES: &[&str] = &["reconr.yaml", "reconr.yml"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub nmap: NmapConfig,
    pub payloads: PayloadConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Every target gets its own directory under this one.
    pub base_dir: PathBuf,
    pub log_file: String,
    pub info_log: String,
    /// Written into the notes when the operator doesn't give one.
    pub handle: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("htb"),
            log_file: "error_log.txt".to_string(),
            info_log: "reconr.log".to_string(),
            handle: "htb-user".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NmapConfig {
    pub binary: String,
    /// Must exist before the advanced scan is attempted.
    pub scripts_path: PathBuf,
    pub script_selectors: BTreeMap<MachineType, String>,
}

impl Default for NmapConfig {
    fn default() -> Self {
        let script_selectors = BTreeMap::from([
            (MachineType::Windows, "smb-vuln*".to_string()),
            (MachineType::Linux, "ssh-vuln*".to_string()),
            (MachineType::Unknown, "default".to_string()),
        ]);

        Self {
            binary: "nmap".to_string(),
            scripts_path: PathBuf::from("/usr/share/nmap/scripts"),
            script_selectors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    pub generator: String,
    pub default_lport: u16,
    /// Keyed by `windows` / `linux`. An `unknown` entry is never consulted.
    pub templates: BTreeMap<MachineType, PayloadTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadTemplate {
    /// Generator payload name, e.g. `windows/meterpreter/reverse_tcp`.
    pub payload: String,
    pub format: PayloadFormat,
    pub file_name: String,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        let templates = BTreeMap::from([
            (
                MachineType::Windows,
                PayloadTemplate {
                    payload: "windows/meterpreter/reverse_tcp".to_string(),
                    format: PayloadFormat::Exe,
                    file_name: "windows_meterpreter.exe".to_string(),
                },
            ),
            (
                MachineType::Linux,
                PayloadTemplate {
                    payload: "linux/x86/meterpreter/reverse_tcp".to_string(),
                    format: PayloadFormat::Elf,
                    file_name: "linux_meterpreter.elf".to_string(),
                },
            ),
        ]);

        Self {
            generator: "msfvenom".to_string(),
            default_lport: 4444,
            templates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub git: String,
    pub repos: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            repos: vec![
                "https://github.com/carlospolop/PEASS-ng".to_string(),
                "https://github.com/danielmiessler/SecLists".to_string(),
                "https://github.com/cywf/aliases".to_string(),
            ],
        }
    }
}

impl Config {
    /// Reads and parses a single YAML file on top of the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the first config file found in the usual places.
    ///
    /// Returns the defaults and `None` when no file exists.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for candidate in search_paths() {
            if candidate.is_file() {
                debug!("Loading configuration from {}", candidate.display());
                let config = Self::load_from(&candidate)?;
                return Ok((config, Some(candidate)));
            }
        }
        Ok((Self::default(), None))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn parse(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to an empty mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

/// `./reconr.yaml`, `./reconr.yml`, `~/.reconr.yaml`, `<config dir>/reconr/config.yaml`.
fn search_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = FILE_NAMES.iter().map(PathBuf::from).collect();

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".reconr.yaml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("reconr").join("config.yaml"));
    }
    paths
}
