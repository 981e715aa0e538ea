//! The human in the loop.
//!
//! Every question the workflow may ask mid-run goes through [`Operator`], so
//! the same workflow can be driven by a live console or by a script.

use std::net::Ipv4Addr;

use crate::scanner::CustomScan;

pub trait Operator: Send + Sync {
    /// Asked after an inconclusive classification. `false` ends the retry loop.
    fn confirm_rescan(&self) -> bool;

    /// Offers the custom scan menu. `None` skips the custom scan.
    fn custom_scan(&self) -> Option<CustomScan>;

    /// Asked when no listen host was given up front. `None` skips payloads.
    fn listen_host(&self) -> Option<Ipv4Addr>;

    /// Asked when no listen port was given up front.
    fn listen_port(&self, default: u16) -> u16;
}

/// Operator for non-interactive runs: declines everything and takes defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unattended;

impl Operator for Unattended {
    fn confirm_rescan(&self) -> bool {
        false
    }

    fn custom_scan(&self) -> Option<CustomScan> {
        None
    }

    fn listen_host(&self) -> Option<Ipv4Addr> {
        None
    }

    fn listen_port(&self, default: u16) -> u16 {
        default
    }
}
