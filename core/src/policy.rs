//! Policy tables: what to run for each machine type.
//!
//! Both tables are pure lookups built from configuration. A machine type
//! without an entry is a configuration error, never a silent default.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use reconr_common::config::{NmapConfig, PayloadConfig, PayloadTemplate};
use reconr_common::error::PolicyError;
use reconr_common::target::{MachineType, PayloadFormat};

/// Maps a machine type to an nmap `--script` selector expression.
#[derive(Debug, Clone)]
pub struct ScriptSelector {
    selectors: BTreeMap<MachineType, String>,
}

impl ScriptSelector {
    pub fn new(selectors: BTreeMap<MachineType, String>) -> Self {
        Self { selectors }
    }

    pub fn from_config(nmap: &NmapConfig) -> Self {
        Self::new(nmap.script_selectors.clone())
    }

    pub fn select(&self, machine_type: MachineType) -> Result<&str, PolicyError> {
        self.selectors
            .get(&machine_type)
            .map(String::as_str)
            .ok_or(PolicyError::NoScriptSelector(machine_type))
    }
}

/// One payload the generator should build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadJob {
    pub payload: String,
    pub format: PayloadFormat,
    pub listen_host: Ipv4Addr,
    pub listen_port: u16,
    /// Distinct per job, so jobs never share an output file.
    pub output: PathBuf,
}

/// Maps a machine type to the payload jobs to generate.
#[derive(Debug, Clone)]
pub struct PayloadPlanner {
    templates: BTreeMap<MachineType, PayloadTemplate>,
}

impl PayloadPlanner {
    pub fn new(templates: BTreeMap<MachineType, PayloadTemplate>) -> Self {
        Self { templates }
    }

    pub fn from_config(payloads: &PayloadConfig) -> Self {
        Self::new(payloads.templates.clone())
    }

    /// Windows gets one EXE job, Linux one ELF job. `Unknown` gets both, so a
    /// failed classification never produces zero payloads.
    pub fn plan(
        &self,
        machine_type: MachineType,
        listen_host: Ipv4Addr,
        listen_port: u16,
        payloads_dir: &Path,
    ) -> Result<Vec<PayloadJob>, PolicyError> {
        let families: &[MachineType] = match machine_type {
            MachineType::Windows => &[MachineType::Windows],
            MachineType::Linux => &[MachineType::Linux],
            MachineType::Unknown => &[MachineType::Windows, MachineType::Linux],
        };

        families
            .iter()
            .map(|family| {
                let template = self
                    .templates
                    .get(family)
                    .ok_or(PolicyError::NoPayloadTemplate(*family))?;

                Ok(PayloadJob {
                    payload: template.payload.clone(),
                    format: template.format,
                    listen_host,
                    listen_port,
                    output: payloads_dir.join(&template.file_name),
                })
            })
            .collect()
    }
}
