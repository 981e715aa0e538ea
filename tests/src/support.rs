#![cfg(test)]
//! Scripted stand-ins for the process runner and the operator.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use reconr_common::config::Config;
use reconr_core::operator::Operator;
use reconr_core::process::{CommandSpec, ProcessOutput, ProcessRunner};
use reconr_core::scanner::CustomScan;

pub fn output(code: i32, stdout: &str) -> ProcessOutput {
    ProcessOutput {
        code: Some(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Pretends to run programs. Every call is recorded. Each program answers from
/// its own queue of canned outputs and succeeds silently once the queue is
/// empty. Successful `git clone` and `msfvenom -o` calls leave their
/// destination behind, the way the real tools would.
#[derive(Default)]
pub struct FakeRunner {
    installed: HashSet<String>,
    outputs: Mutex<HashMap<String, VecDeque<ProcessOutput>>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl FakeRunner {
    /// `nmap`, `git` and `msfvenom` all installed.
    pub fn with_all_tools() -> Self {
        Self::default()
            .install("nmap")
            .install("git")
            .install("msfvenom")
    }

    pub fn install(mut self, program: &str) -> Self {
        self.installed.insert(program.to_string());
        self
    }

    pub fn script(self, program: &str, output: ProcessOutput) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .entry(program.to_string())
            .or_default()
            .push_back(output);
        self
    }

    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.program == program)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.installed
            .contains(program)
            .then(|| Path::new("/usr/bin").join(program))
    }

    async fn run(&self, command: &CommandSpec) -> io::Result<ProcessOutput> {
        self.calls.lock().unwrap().push(command.clone());

        let output = self
            .outputs
            .lock()
            .unwrap()
            .get_mut(&command.program)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| output(0, ""));

        if output.success() {
            leave_artifacts(command)?;
        }
        Ok(output)
    }
}

fn leave_artifacts(command: &CommandSpec) -> io::Result<()> {
    match command.program.as_str() {
        "git" if command.args.first().map(String::as_str) == Some("clone") => {
            if let Some(destination) = command.args.last() {
                fs::create_dir_all(destination)?;
            }
        }
        "msfvenom" => {
            let path = command
                .args
                .iter()
                .position(|arg| arg == "-o")
                .and_then(|idx| command.args.get(idx + 1));
            if let Some(path) = path {
                fs::write(path, b"payload")?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Answers the workflow's questions from a script.
#[derive(Default)]
pub struct ScriptedOperator {
    rescans: Mutex<VecDeque<bool>>,
    rescan_prompts: Mutex<usize>,
    custom: Option<CustomScan>,
    listen_host: Option<Ipv4Addr>,
    listen_port: Option<u16>,
}

impl ScriptedOperator {
    pub fn rescans(self, answers: &[bool]) -> Self {
        self.rescans.lock().unwrap().extend(answers);
        self
    }

    pub fn custom_scan(mut self, scan: CustomScan) -> Self {
        self.custom = Some(scan);
        self
    }

    pub fn listen_on(mut self, host: Ipv4Addr, port: u16) -> Self {
        self.listen_host = Some(host);
        self.listen_port = Some(port);
        self
    }

    pub fn rescan_prompts(&self) -> usize {
        *self.rescan_prompts.lock().unwrap()
    }
}

impl Operator for ScriptedOperator {
    fn confirm_rescan(&self) -> bool {
        *self.rescan_prompts.lock().unwrap() += 1;
        self.rescans.lock().unwrap().pop_front().unwrap_or(false)
    }

    fn custom_scan(&self) -> Option<CustomScan> {
        self.custom.clone()
    }

    fn listen_host(&self) -> Option<Ipv4Addr> {
        self.listen_host
    }

    fn listen_port(&self, default: u16) -> u16 {
        self.listen_port.unwrap_or(default)
    }
}

/// Defaults rooted in `dir`, with a single tool repository.
pub fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.general.base_dir = dir.join("htb");
    config.nmap.scripts_path = dir.to_path_buf();
    config.tools.repos = vec!["https://github.com/cywf/aliases".to_string()];
    config
}
