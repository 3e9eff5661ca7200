//! Updater config validation CLI tool
//!
//! Checks that an `UpdaterConfig.json` parses and reports what the
//! orchestrator would make of it.

use handoff_config::{ConfigError, UPDATER_CONFIG_FILE};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1).map(String::as_str) {
        Some("-h" | "--help") => {
            eprintln!("Usage: validate-updater-config [config-file]");
            eprintln!();
            eprintln!("Validates an updater config file.");
            eprintln!();
            eprintln!("If no path is provided, uses ./{UPDATER_CONFIG_FILE}");
            return ExitCode::from(2);
        }
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(UPDATER_CONFIG_FILE),
    };

    if !config_path.exists() {
        eprintln!("Error: Updater config not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match handoff_config::load_updater_config(&config_path) {
        Ok(config) => {
            println!("✓ Updater config parses");
            println!();
            println!("Summary:");
            match config.valid_server() {
                Some(server) => println!("  Server: {server}"),
                None => println!("  Server: (none, updates disabled)"),
            }
            match config.pinned_version() {
                Some(version) => println!("  Version: pinned to {version}"),
                None => println!("  Version: latest from server"),
            }

            if config.has_valid_server() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("✗ Updater config validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {io_err}");
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("JSON parse error:");
                    eprintln!("  {parse_err}");
                }
                other => eprintln!("{other}"),
            }
            ExitCode::from(1)
        }
    }
}
