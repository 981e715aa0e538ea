//! The fixed menu of operator-selectable scans.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomScan {
    Quick,
    RegularTcp,
    FullTcp,
    /// Service detection plus safe vulnerability scripts. `None` scans every port.
    ServiceScripts { ports: Option<String> },
    FullUdp,
}

impl CustomScan {
    /// Menu entries in display order, numbered from 1.
    pub const MENU: &'static [&'static str] = &[
        "Quick scan",
        "Regular TCP scan",
        "Full TCP ports scan",
        "TCP ports service scan and NSE scripts",
        "Full UDP scan",
    ];

    /// Maps a 1-based menu choice to a scan. Choice 4 carries the port list.
    pub fn from_choice(choice: u8, ports: Option<String>) -> Option<Self> {
        match choice {
            1 => Some(CustomScan::Quick),
            2 => Some(CustomScan::RegularTcp),
            3 => Some(CustomScan::FullTcp),
            4 => Some(CustomScan::ServiceScripts { ports }),
            5 => Some(CustomScan::FullUdp),
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            CustomScan::Quick => "fast-tcp",
            CustomScan::RegularTcp => "regular-tcp",
            CustomScan::FullTcp => "full-tcp",
            CustomScan::ServiceScripts { .. } => "version-tcp",
            CustomScan::FullUdp => "full-udp",
        }
    }

    /// Scanner arguments, without the target address.
    pub fn arguments(&self) -> Vec<String> {
        let args: Vec<&str> = match self {
            CustomScan::Quick => vec!["-Pn", "-n", "-vv", "--open", "-F", "-T4"],
            CustomScan::RegularTcp => vec!["-Pn", "-n", "-vv", "--open", "-T4"],
            CustomScan::FullTcp => vec!["-Pn", "-n", "-p-", "-vv", "--open", "-T4"],
            CustomScan::ServiceScripts { ports } => {
                let mut args = vec!["-Pn".to_string(), "-n".to_string()];
                match ports {
                    Some(ports) => args.extend(["-p".to_string(), ports.clone()]),
                    None => args.push("-p-".to_string()),
                }
                args.extend(
                    ["-vv", "--open", "-sV", "-sC", "--script", "vuln and safe", "-T4"]
                        .map(String::from),
                );
                return args;
            }
            CustomScan::FullUdp => vec![
                "-Pn",
                "-n",
                "-sU",
                "-p-",
                "-vv",
                "--open",
                "--max-retries",
                "1",
                "--min-rate",
                "1000",
                "-T4",
            ],
        };
        args.into_iter().map(String::from).collect()
    }
}

impl fmt::Display for CustomScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CustomScan::Quick => CustomScan::MENU[0],
            CustomScan::RegularTcp => CustomScan::MENU[1],
            CustomScan::FullTcp => CustomScan::MENU[2],
            CustomScan::ServiceScripts { .. } => CustomScan::MENU[3],
            CustomScan::FullUdp => CustomScan::MENU[4],
        };
        f.write_str(label)
    }
}

/// A port list is digits, commas and dashes, e.g. `22,80,8000-8100`.
pub fn valid_port_list(ports: &str) -> bool {
    !ports.is_empty()
        && ports
            .split(',')
            .all(|part| !part.is_empty() && part.split('-').all(|p| p.parse::<u16>().is_ok()))
}
