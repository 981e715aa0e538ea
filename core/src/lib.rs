//! # reconr engine
//!
//! Runs the recon workflow against a single host: workspace scaffolding,
//! tool provisioning, machine-type classification, vulnerability scanning
//! and payload generation.
//!
//! External programs are reached only through [`process::ProcessRunner`] and
//! operator questions only through [`operator::Operator`], so the whole
//! [`workflow::Workflow`] can run against scripted doubles.

pub mod classifier;
pub mod operator;
pub mod payload;
pub mod policy;
pub mod process;
pub mod provision;
pub mod scanner;
pub mod workflow;
pub mod workspace;
