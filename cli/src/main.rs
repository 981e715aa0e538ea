mod commands;
mod terminal;

use std::process::ExitCode;
use std::sync::Arc;

use commands::{CommandLine, run};
use reconr_common::config::Config;
use reconr_common::target::{MachineType, Target};
use reconr_core::operator::{Operator, Unattended};
use tracing::{error, info, warn};

use crate::terminal::{logging, print, prompt};

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);

    let config = match load_config(&commands) {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    if commands.dump_config {
        return match config.to_yaml() {
            Ok(yaml) => {
                println!("{}", yaml.trim_end());
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    print::banner();

    if let Err(e) = commands.validate() {
        error!("Error(s):");
        for violation in e.violations() {
            error!("  {violation}");
        }
        return ExitCode::FAILURE;
    }

    let interactive = commands.is_interactive();
    let (target, handle) = if interactive {
        match prompt::collect_target(&commands) {
            Ok(collected) => (collected.target, collected.handle),
            Err(e) => {
                error!("{e:#}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        let (Some(name), Some(ip)) = (&commands.name, &commands.ip) else {
            return ExitCode::FAILURE;
        };
        let declared = commands.machine_type.map(MachineType::from);
        match Target::new(name, ip, declared) {
            Ok(target) => (target, None),
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        }
    };

    let operator: Arc<dyn Operator> = if interactive {
        Arc::new(prompt::ConsoleOperator)
    } else {
        Arc::new(Unattended)
    };

    let options = commands.run_options(handle);
    run::run(&config, &target, &options, operator).await
}

/// An explicit `--config` must load. A discovered file that fails to parse
/// only costs a warning.
fn load_config(commands: &CommandLine) -> anyhow::Result<Config> {
    if let Some(path) = &commands.config {
        let config = Config::load_from(path)?;
        info!("Loaded configuration from {}", path.display());
        return Ok(config);
    }

    match Config::load() {
        Ok((config, Some(path))) => {
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Ok((config, None)) => Ok(config),
        Err(e) => {
            warn!("{e}, using built-in defaults");
            Ok(Config::default())
        }
    }
}
