use std::process::ExitCode;
use std::sync::Arc;

use colored::*;
use reconr_common::config::Config;
use reconr_common::target::Target;
use reconr_core::operator::Operator;
use reconr_core::process::SystemRunner;
use reconr_core::workflow::{RunOptions, RunSummary, Workflow};
use tracing::error;

use crate::rprint;
use crate::terminal::{colors, print};

pub async fn run(
    config: &Config,
    target: &Target,
    options: &RunOptions,
    operator: Arc<dyn Operator>,
) -> ExitCode {
    print::header("target");
    print::field("Name", target.name());
    print::field("Address", target.address().to_string().color(colors::IPV4_ADDR));
    print::field(
        "Type",
        target
            .declared_type()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "auto-detect".to_string()),
    );
    rprint!();

    let workflow = Workflow::new(config, Arc::new(SystemRunner), operator);
    match workflow.run(target, options).await {
        Ok(summary) => {
            print_summary(&summary, config);
            ExitCode::from(summary.exit_code())
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(summary: &RunSummary, config: &Config) {
    rprint!();
    print::header("run summary");
    print::field("Machine type", summary.machine_type);
    print::field("Workspace", summary.working_dir.display());

    let completed: Vec<&str> = summary.completed_phases.iter().map(|p| p.as_str()).collect();
    print::field(
        "Completed",
        if completed.is_empty() {
            "none".to_string()
        } else {
            completed.join(", ")
        },
    );

    for skipped in &summary.skipped_phases {
        print::field("Skipped", format!("{} ({})", skipped.phase, skipped.reason));
    }

    if !summary.errors.is_empty() {
        rprint!();
        for (idx, failure) in summary.errors.iter().enumerate() {
            print::failure(idx, failure.phase.as_str(), &failure.message);
        }
    }

    print::rule();
    let outcome: ColoredString = if summary.is_success() {
        "Run complete with no errors".green().bold()
    } else {
        let log_path = summary.working_dir.join(&config.general.log_file);
        format!(
            "Run complete with {} error(s), see {}",
            summary.error_count(),
            log_path.display()
        )
        .red()
        .bold()
    };
    print::centered(&outcome.to_string());
}
