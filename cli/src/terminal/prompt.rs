//! Console prompts for interactive runs.
//!
//! Each prompt suspends the phase spinners while it waits for input. A closed
//! stdin counts as "no answer", which declines optional questions.

use std::io::{self, BufRead};
use std::net::Ipv4Addr;

use anyhow::bail;
use colored::*;
use console::Term;
use reconr_common::target::{self, MachineType, Target};
use reconr_core::operator::Operator;
use reconr_core::scanner::{CustomScan, valid_port_list};
use tokio::task;
use tracing::warn;
use tracing_indicatif::suspend_tracing_indicatif;

use crate::commands::CommandLine;
use crate::terminal::colors;

/// What interactive collection gathered before the run starts.
pub struct Collected {
    pub target: Target,
    pub handle: Option<String>,
}

/// Asks for whatever the command line didn't supply.
pub fn collect_target(commands: &CommandLine) -> anyhow::Result<Collected> {
    let handle = match &commands.handle {
        Some(handle) => Some(handle.clone()),
        None => ask("Enter your handle: ").filter(|h| !h.is_empty()),
    };

    let name = match &commands.name {
        Some(name) => name.clone(),
        None => ask_until_valid(
            "Enter the name of the machine you are pentesting: ",
            target::validate_machine_name,
            "Use only alphanumeric characters, dash and underscore",
        )?,
    };

    let ip = match &commands.ip {
        Some(ip) => ip.clone(),
        None => ask_until_valid(
            "Enter the IP of the machine you are pentesting: ",
            target::validate_ipv4,
            "Expected an IPv4 address such as 10.10.10.63",
        )?,
    };

    let declared = match commands.machine_type {
        Some(declared) => Some(MachineType::from(declared)),
        None => ask_machine_type(),
    };

    let target = Target::new(&name, &ip, declared)?;
    Ok(Collected { target, handle })
}

fn ask_machine_type() -> Option<MachineType> {
    loop {
        let answer = ask("Do you know the machine type (Windows/Linux)? If not, just press enter: ")?;
        if answer.is_empty() {
            return None;
        }
        match answer.parse::<MachineType>() {
            Ok(MachineType::Unknown) => return None,
            Ok(machine_type) => return Some(machine_type),
            Err(_) => warn!("Please answer Windows, Linux, or leave it blank"),
        }
    }
}

/// Drives the workflow's questions from the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleOperator;

impl Operator for ConsoleOperator {
    fn confirm_rescan(&self) -> bool {
        ask("Machine type could not be determined. Would you like to scan again? (y/n): ")
            .map(|answer| matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    }

    fn custom_scan(&self) -> Option<CustomScan> {
        let mut menu = String::from("\nChoose the type of Nmap scan you want to perform:\n");
        for (idx, label) in CustomScan::MENU.iter().enumerate() {
            menu.push_str(&format!("  {}. {label}\n", idx + 1));
        }
        say(&menu);

        loop {
            let answer = ask(&format!(
                "Enter your choice (1-{}), or press enter to skip: ",
                CustomScan::MENU.len()
            ))?;
            if answer.is_empty() {
                return None;
            }

            match answer.parse::<u8>().ok().and_then(|c| CustomScan::from_choice(c, None)) {
                Some(CustomScan::ServiceScripts { .. }) => {
                    return Some(CustomScan::ServiceScripts {
                        ports: ask_ports(),
                    });
                }
                Some(scan) => return Some(scan),
                None => warn!("Invalid choice. Please choose a valid option."),
            }
        }
    }

    fn listen_host(&self) -> Option<Ipv4Addr> {
        loop {
            let answer =
                ask("Enter your attacker IP (LHOST) for payload generation, or press enter to skip: ")?;
            if answer.is_empty() {
                return None;
            }
            match target::parse_ipv4(&answer) {
                Some(lhost) => return Some(lhost),
                None => warn!("Invalid LHOST IP address: {answer}"),
            }
        }
    }

    fn listen_port(&self, default: u16) -> u16 {
        loop {
            let Some(answer) = ask(&format!(
                "Enter the listening port for payloads (default: {default}): "
            )) else {
                return default;
            };
            if answer.is_empty() {
                return default;
            }
            match answer.parse::<u16>() {
                Ok(port) if port > 0 => return port,
                _ => warn!("Invalid port: {answer}"),
            }
        }
    }
}

fn ask_ports() -> Option<String> {
    loop {
        let answer =
            ask("Enter the list of TCP ports (comma-separated) or leave blank for all: ")?;
        if answer.is_empty() {
            return None;
        }
        if valid_port_list(&answer) {
            return Some(answer);
        }
        warn!("Invalid port list: {answer}");
    }
}

fn ask_until_valid(question: &str, valid: fn(&str) -> bool, hint: &str) -> anyhow::Result<String> {
    loop {
        let Some(answer) = ask(question) else {
            bail!("input closed before a value was given");
        };
        if valid(&answer) {
            return Ok(answer);
        }
        warn!("{hint}");
    }
}

/// Prints `question` and reads one trimmed line. `None` on EOF or I/O error.
///
/// Runs on a worker thread handed over to blocking, so the runtime keeps
/// its other workers while the operator types.
fn ask(question: &str) -> Option<String> {
    task::block_in_place(|| {
        suspend_tracing_indicatif(|| {
            Term::stderr()
                .write_str(&format!("{}", question.color(colors::ACCENT)))
                .ok()?;
            read_answer(&mut io::stdin().lock())
        })
    })
}

fn read_answer(input: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn say(text: &str) {
    suspend_tracing_indicatif(|| {
        let _ = Term::stderr().write_str(text);
    });
}
