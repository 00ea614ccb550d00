//! DockLaunch - Entry Point
//!
//! Deploys a GitHub repository as a container, shows the running deployment
//! and stops it on request.

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;

use colored::Colorize;
use tokio::io::BufReader;
use tracing::{error, info, warn};

use docklaunch::app::options::{AppOptions, Command};
use docklaunch::app::run::{run, Outcome};
use docklaunch::logs::{init_logging, LogOptions};
use docklaunch::storage::layout::StorageLayout;
use docklaunch::storage::settings::Settings;
use docklaunch::utils::version_info;

const USAGE: &str = "\
Usage:
  docklaunch --deploy=<github repository url>
  docklaunch --status=<container id>
  docklaunch --stop=<container id> [--yes]
  docklaunch --stop-repo=<github repository url> [--yes]
  docklaunch --init | --version

Options:
  --backend=<url>     Deployment API base URL
  --base-dir=<path>   Directory holding settings.json";

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Failed to render version info: {e}"),
        }
        return ExitCode::SUCCESS;
    }

    let layout = match cli_args.get("base-dir") {
        Some(dir) => StorageLayout::new(dir),
        None => StorageLayout::default(),
    };
    let settings_file = layout.settings_file();

    // Write default settings and exit
    if cli_args.contains_key("init") {
        let settings = Settings {
            log_dir: Some(layout.logs_dir()),
            ..Default::default()
        };
        return match settings_file.write_json(&settings).await {
            Ok(()) => {
                println!("Wrote {}", settings_file.path().display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{} {}", "Unable to write settings file:".red(), e);
                ExitCode::FAILURE
            }
        };
    }

    let Some(command) = parse_command(&cli_args) else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };

    // Retrieve the settings file
    let mut settings_warning = None;
    let settings = if settings_file.exists().await {
        match settings_file.read_json::<Settings>().await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{} {}", "Unable to read settings file:".red(), e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        settings_warning = Some(format!(
            "No settings at {}, using defaults",
            settings_file.path().display()
        ));
        Settings::default()
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.log_json,
        log_dir: settings.log_dir.clone(),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };
    if let Some(warning) = settings_warning {
        warn!("{}", warning);
    }

    let mut options = AppOptions::from_settings(&settings);
    if let Some(backend) = cli_args.get("backend") {
        options.backend_base_url = backend.clone();
    }
    options.assume_yes = cli_args.contains_key("yes") || cli_args.contains_key("y");

    info!("Running {:?}", command);
    let mut stdin = BufReader::new(tokio::io::stdin());
    match run(command, options, &mut stdin).await {
        Ok(Outcome::Succeeded) | Ok(Outcome::Cancelled) => ExitCode::SUCCESS,
        Ok(Outcome::Failed) => ExitCode::FAILURE,
        Err(e) => {
            error!("Command failed: {e}");
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn parse_command(cli_args: &HashMap<String, String>) -> Option<Command> {
    if let Some(repository) = cli_args.get("deploy") {
        return Some(Command::Deploy {
            repository: repository.clone(),
        });
    }
    if let Some(container_id) = cli_args.get("status") {
        return Some(Command::Status {
            container_id: container_id.clone(),
        });
    }
    if let Some(container_id) = cli_args.get("stop") {
        return Some(Command::Stop {
            container_id: container_id.clone(),
        });
    }
    if let Some(repository) = cli_args.get("stop-repo") {
        return Some(Command::StopRepository {
            repository: repository.clone(),
        });
    }
    None
}
