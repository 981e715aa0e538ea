#![cfg(test)]
use std::fs;
use std::net::Ipv4Addr;
use std::sync::Arc;

use reconr_common::config::Config;
use reconr_common::target::{MachineType, Target};
use reconr_core::operator::Unattended;
use reconr_core::scanner::CustomScan;
use reconr_core::workflow::{Phase, RunOptions, RunSummary, Workflow};
use tempfile::TempDir;

use crate::support::{FakeRunner, ScriptedOperator, config_in, output};

const LHOST: Ipv4Addr = Ipv4Addr::new(10, 10, 14, 5);

fn jeeves(declared: Option<MachineType>) -> Target {
    Target::new("Jeeves", "10.10.10.63", declared).unwrap()
}

fn skipped(summary: &RunSummary) -> Vec<Phase> {
    summary.skipped_phases.iter().map(|s| s.phase).collect()
}

fn failed(summary: &RunSummary) -> Vec<Phase> {
    summary.errors.iter().map(|e| e.phase).collect()
}

async fn run(
    config: &Config,
    runner: Arc<FakeRunner>,
    operator: Arc<ScriptedOperator>,
    target: &Target,
    options: &RunOptions,
) -> RunSummary {
    Workflow::new(config, runner, operator)
        .run(target, options)
        .await
        .expect("workspace should be created")
}

/// Full run against a Windows box: classification picks the SMB scripts and
/// a single EXE payload is generated.
#[tokio::test]
async fn windows_target_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path());
    let runner = Arc::new(FakeRunner::with_all_tools().script(
        "nmap",
        output(0, "Host is up\nService Info: OS: Windows; CPE: cpe:/o:microsoft:windows\n"),
    ));
    let operator = Arc::new(ScriptedOperator::default());
    let options = RunOptions {
        listen_host: Some(LHOST),
        ..RunOptions::default()
    };

    let summary = run(&config, runner.clone(), operator, &jeeves(None), &options).await;

    assert!(summary.is_success(), "unexpected errors: {:?}", summary.errors);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.machine_type, MachineType::Windows);
    assert_eq!(
        summary.completed_phases,
        vec![
            Phase::Scaffold,
            Phase::Notes,
            Phase::Tools,
            Phase::Classify,
            Phase::AdvancedScan,
            Phase::Payloads,
        ]
    );
    assert_eq!(skipped(&summary), vec![Phase::CustomScan]);

    let nmap = runner.calls_to("nmap");
    assert_eq!(nmap.len(), 2);
    assert_eq!(nmap[0].args, ["-sC", "-sV", "10.10.10.63"]);
    assert_eq!(nmap[1].args, ["--script", "smb-vuln*", "10.10.10.63"]);

    let msfvenom = runner.calls_to("msfvenom");
    assert_eq!(msfvenom.len(), 1);
    assert!(msfvenom[0].args.contains(&"windows/meterpreter/reverse_tcp".to_string()));
    assert!(msfvenom[0].args.contains(&"LHOST=10.10.14.5".to_string()));
    assert!(msfvenom[0].args.contains(&"LPORT=4444".to_string()));

    let root = tmp.path().join("htb").join("Jeeves");
    assert_eq!(summary.working_dir, root);
    for dir in ["tools", "machines", "nmap", "notes", "loot", "shells", "payloads"] {
        assert!(root.join(dir).is_dir(), "{dir} missing");
    }
    assert!(root.join("tools/aliases").is_dir());
    assert!(root.join("payloads/windows_meterpreter.exe").is_file());
    assert!(!root.join("payloads/linux_meterpreter.elf").exists());
    assert!(!root.join("error_log.txt").exists());

    let notes = fs::read_to_string(root.join("notes/info.md")).unwrap();
    assert!(notes.contains("# IP: 10.10.10.63"));
    assert!(notes.contains("# Box: Jeeves"));

    let initial = fs::read_to_string(root.join("nmap/initial_scan.txt")).unwrap();
    assert!(initial.contains("Windows"));
    assert!(root.join("nmap/vulnscan.txt").is_file());

    let info_log = fs::read_to_string(root.join("reconr.log")).unwrap();
    assert!(info_log.contains("INFO - Run started for Jeeves (10.10.10.63)"));
}

/// Inconclusive output is rescanned while the operator agrees, then the run
/// carries on as `Unknown` with payloads for both families.
#[tokio::test]
async fn unknown_type_rescans_until_declined() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path());
    let runner = Arc::new(
        FakeRunner::with_all_tools()
            .script("nmap", output(0, "Host is up\n80/tcp open http\n"))
            .script("nmap", output(0, "Host is up\n443/tcp open https\n")),
    );
    let operator = Arc::new(
        ScriptedOperator::default()
            .rescans(&[true, false])
            .listen_on(LHOST, 9001),
    );

    let summary = run(
        &config,
        runner.clone(),
        operator.clone(),
        &jeeves(None),
        &RunOptions::default(),
    )
    .await;

    assert!(summary.is_success(), "unexpected errors: {:?}", summary.errors);
    assert_eq!(summary.machine_type, MachineType::Unknown);
    assert_eq!(operator.rescan_prompts(), 2);

    let nmap = runner.calls_to("nmap");
    assert_eq!(nmap.len(), 3);
    assert_eq!(nmap[0].args, nmap[1].args);
    assert_eq!(nmap[2].args, ["--script", "default", "10.10.10.63"]);

    let msfvenom = runner.calls_to("msfvenom");
    assert_eq!(msfvenom.len(), 2);
    assert!(msfvenom.iter().all(|c| c.args.contains(&"LPORT=9001".to_string())));

    let payloads = summary.working_dir.join("payloads");
    assert!(payloads.join("windows_meterpreter.exe").is_file());
    assert!(payloads.join("linux_meterpreter.elf").is_file());
}

/// A rescan that finds a family ends the loop without asking again.
#[tokio::test]
async fn rescan_stops_once_the_type_resolves() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path());
    let runner = Arc::new(
        FakeRunner::with_all_tools()
            .script("nmap", output(0, "Host is up\n80/tcp open http\n"))
            .script(
                "nmap",
                output(0, "Host is up\nOS: Linux 5.4\nService Info: OS: Windows\n"),
            ),
    );
    let operator = Arc::new(ScriptedOperator::default().rescans(&[true, true, true]));
    let options = RunOptions {
        skip_tools: true,
        skip_payloads: true,
        ..RunOptions::default()
    };

    let summary = run(&config, runner.clone(), operator.clone(), &jeeves(None), &options).await;

    assert!(summary.is_success(), "unexpected errors: {:?}", summary.errors);
    assert_eq!(summary.machine_type, MachineType::Linux);
    assert_eq!(operator.rescan_prompts(), 1);

    let nmap = runner.calls_to("nmap");
    assert_eq!(nmap.len(), 3);
    assert_eq!(nmap[2].args, ["--script", "ssh-vuln*", "10.10.10.63"]);
}

/// A failing phase is counted and journaled while later phases still run.
#[tokio::test]
async fn failures_are_counted_and_the_run_continues() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path());
    let runner = Arc::new(
        FakeRunner::with_all_tools()
            .script("git", output(128, ""))
            .script("nmap", output(1, "partial output\n")),
    );
    let operator = Arc::new(ScriptedOperator::default());
    let options = RunOptions {
        listen_host: Some(LHOST),
        ..RunOptions::default()
    };

    let summary = run(
        &config,
        runner.clone(),
        operator,
        &jeeves(Some(MachineType::Linux)),
        &options,
    )
    .await;

    assert_eq!(summary.error_count(), 2);
    assert_eq!(summary.exit_code(), 1);
    assert_eq!(failed(&summary), vec![Phase::Tools, Phase::AdvancedScan]);
    assert!(summary.completed_phases.contains(&Phase::Payloads));
    assert_eq!(skipped(&summary), vec![Phase::Classify, Phase::CustomScan]);

    assert_eq!(runner.calls_to("nmap")[0].args, ["--script", "ssh-vuln*", "10.10.10.63"]);
    assert!(summary.working_dir.join("payloads/linux_meterpreter.elf").is_file());

    let partial = fs::read_to_string(summary.working_dir.join("nmap/vulnscan.txt")).unwrap();
    assert_eq!(partial, "partial output\n");

    let error_log = fs::read_to_string(summary.working_dir.join("error_log.txt")).unwrap();
    assert_eq!(error_log.lines().count(), 2);
    assert!(error_log.contains("Error during tools:"));
    assert!(error_log.contains("Error during advanced-scan:"));
    assert!(error_log.contains("`nmap` exited with status 1"));
}

/// Missing scanner binaries fail the scan phases without stopping the run.
#[tokio::test]
async fn missing_scanner_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path());
    let runner = Arc::new(FakeRunner::default().install("git"));

    let summary = Workflow::new(&config, runner.clone(), Arc::new(Unattended))
        .run(&jeeves(None), &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(failed(&summary), vec![Phase::Classify, Phase::AdvancedScan]);
    assert!(summary.errors[0].message.contains("`nmap` was not found in PATH"));
    assert_eq!(summary.machine_type, MachineType::Unknown);
    assert!(runner.calls_to("nmap").is_empty());
    assert_eq!(
        skipped(&summary),
        vec![Phase::CustomScan, Phase::Payloads],
        "unattended runs without LHOST skip payloads"
    );
}

/// With scanning disabled the machine type stays `Unknown`.
#[tokio::test]
async fn skip_scan_generates_payloads_for_both_families() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path());
    let runner = Arc::new(FakeRunner::with_all_tools());
    let options = RunOptions {
        skip_scan: true,
        skip_tools: true,
        listen_host: Some(LHOST),
        listen_port: Some(5555),
        ..RunOptions::default()
    };

    let summary = run(
        &config,
        runner.clone(),
        Arc::new(ScriptedOperator::default()),
        &jeeves(None),
        &options,
    )
    .await;

    assert!(summary.is_success());
    assert_eq!(summary.machine_type, MachineType::Unknown);
    assert!(runner.calls_to("nmap").is_empty());
    assert!(runner.calls_to("git").is_empty());
    assert_eq!(
        skipped(&summary),
        vec![Phase::Tools, Phase::Classify, Phase::CustomScan, Phase::AdvancedScan]
    );

    let msfvenom = runner.calls_to("msfvenom");
    assert_eq!(msfvenom.len(), 2);
    assert!(msfvenom.iter().all(|c| c.args.contains(&"LPORT=5555".to_string())));
}

/// Payload-only runs skip everything else and create `payloads/` on demand.
#[tokio::test]
async fn only_payloads_skips_scaffolding() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path());
    let runner = Arc::new(FakeRunner::with_all_tools());
    let options = RunOptions {
        only_payloads: true,
        listen_host: Some(LHOST),
        ..RunOptions::default()
    };

    let summary = run(
        &config,
        runner.clone(),
        Arc::new(ScriptedOperator::default()),
        &jeeves(Some(MachineType::Windows)),
        &options,
    )
    .await;

    assert!(summary.is_success());
    assert_eq!(summary.completed_phases, vec![Phase::Payloads]);
    assert_eq!(
        skipped(&summary),
        vec![
            Phase::Scaffold,
            Phase::Notes,
            Phase::Tools,
            Phase::Classify,
            Phase::CustomScan,
            Phase::AdvancedScan,
        ]
    );
    assert!(runner.calls_to("nmap").is_empty());
    assert!(runner.calls_to("git").is_empty());

    let root = &summary.working_dir;
    assert!(root.join("payloads/windows_meterpreter.exe").is_file());
    assert!(!root.join("notes").exists());
    assert!(!root.join("nmap").exists());
}

/// Scan-only runs never reach the generator, even with a listen host.
#[tokio::test]
async fn only_scan_skips_payloads() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path());
    let runner = Arc::new(FakeRunner::with_all_tools());
    let options = RunOptions {
        only_scan: true,
        skip_tools: true,
        listen_host: Some(LHOST),
        ..RunOptions::default()
    };

    let summary = run(
        &config,
        runner.clone(),
        Arc::new(ScriptedOperator::default()),
        &jeeves(Some(MachineType::Linux)),
        &options,
    )
    .await;

    assert!(summary.is_success());
    assert!(runner.calls_to("msfvenom").is_empty());
    assert_eq!(runner.calls_to("nmap").len(), 1);
    assert_eq!(skipped(&summary).last(), Some(&Phase::Payloads));
}

/// The operator's custom scan runs between classification and the advanced scan.
#[tokio::test]
async fn custom_scan_is_captured() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path());
    let runner = Arc::new(FakeRunner::with_all_tools().script("nmap", output(0, "53/udp open\n")));
    let operator = Arc::new(ScriptedOperator::default().custom_scan(CustomScan::FullUdp));
    let options = RunOptions {
        skip_tools: true,
        skip_payloads: true,
        ..RunOptions::default()
    };

    let summary = run(
        &config,
        runner.clone(),
        operator,
        &jeeves(Some(MachineType::Windows)),
        &options,
    )
    .await;

    assert!(summary.is_success());
    assert!(summary.completed_phases.contains(&Phase::CustomScan));

    let nmap = runner.calls_to("nmap");
    assert_eq!(nmap.len(), 2);
    assert!(nmap[0].args.contains(&"-sU".to_string()));
    assert_eq!(nmap[0].args.last().map(String::as_str), Some("10.10.10.63"));

    let artifact = fs::read_to_string(summary.working_dir.join("nmap/nmap-full-udp.txt")).unwrap();
    assert_eq!(artifact, "53/udp open\n");
}

/// A workspace that cannot be created aborts the run.
#[tokio::test]
async fn scaffold_failure_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_in(tmp.path());
    let blocker = tmp.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    config.general.base_dir = blocker;

    let runner = Arc::new(FakeRunner::with_all_tools());
    let result = Workflow::new(&config, runner.clone(), Arc::new(Unattended))
        .run(&jeeves(None), &RunOptions::default())
        .await;

    assert!(result.is_err());
    assert!(runner.calls_to("nmap").is_empty());
    assert!(runner.calls_to("git").is_empty());
}

/// A second run keeps existing notes and skips tools already cloned.
#[tokio::test]
async fn rerun_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(tmp.path());
    let runner = Arc::new(FakeRunner::with_all_tools());
    let target = jeeves(Some(MachineType::Linux));
    let options = RunOptions {
        skip_scan: true,
        skip_payloads: true,
        ..RunOptions::default()
    };

    let first = run(
        &config,
        runner.clone(),
        Arc::new(ScriptedOperator::default()),
        &target,
        &options,
    )
    .await;
    let notes = first.working_dir.join("notes/info.md");
    fs::write(&notes, "my own notes\n").unwrap();

    let second = run(
        &config,
        runner.clone(),
        Arc::new(ScriptedOperator::default()),
        &target,
        &options,
    )
    .await;

    assert!(second.is_success());
    assert_eq!(first.working_dir, second.working_dir);
    assert_eq!(fs::read_to_string(&notes).unwrap(), "my own notes\n");
    assert_eq!(runner.calls_to("git").len(), 1);
}
