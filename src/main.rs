//! sheetcalc - Evaluate spreadsheet formulas from the command line

mod config;
mod error;

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use sheetcalc_engine::builtins::BUILTINS;
use sheetcalc_engine::engine::{Computed, ERROR_SENTINEL, FormulaEngine, Snapshot};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::error::SheetcalcError;

fn print_usage() {
    eprintln!("Usage: sheetcalc [OPTIONS] -c <FORMULA>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula and print the result");
    eprintln!("  --cell <ADDR=VALUE>       Set a cell before evaluating (can be repeated)");
    eprintln!("  --config <FILE>           Load engine limits from a TOML file");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  --explain                 Print the error kind instead of {}", ERROR_SENTINEL);
    eprintln!("  --list-functions          Print the built-in functions and exit");
    eprintln!("  -h, --help                Print help");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Split `A1=10` into address and raw content. The content keeps any
/// further `=`, so `A2==A1*2` stores the formula `=A1*2`.
fn parse_cell_assignment(arg: &str) -> Result<(String, String), SheetcalcError> {
    match arg.split_once('=') {
        Some((address, value)) if !address.trim().is_empty() => {
            Ok((address.trim().to_string(), value.to_string()))
        }
        _ => Err(SheetcalcError::CellAssignment(arg.to_string())),
    }
}

fn print_functions() {
    for builtin in BUILTINS {
        println!(
            "{:<12} {:<12} {}",
            builtin.name,
            format!("{:?}", builtin.category),
            builtin.description
        );
    }
}

struct Options {
    cells: Vec<String>,
    config_file: Option<PathBuf>,
    no_config: bool,
    explain: bool,
}

/// Evaluate `command`; `Ok(false)` when the formula itself failed.
fn run(command: &str, options: &Options) -> anyhow::Result<bool> {
    let config = if options.no_config {
        AppConfig::default()
    } else {
        AppConfig::resolve(options.config_file.as_deref())?
    };

    let mut pairs = Vec::with_capacity(options.cells.len());
    for cell in &options.cells {
        pairs.push(parse_cell_assignment(cell)?);
    }
    let snapshot = Snapshot::from_pairs(pairs.iter().map(|(a, v)| (a.as_str(), v.as_str())))
        .map_err(SheetcalcError::from)
        .context("building the sheet from --cell arguments")?;

    let mut engine = FormulaEngine::with_config(config.engine);
    engine.set_snapshot_from(snapshot);

    // Command mode always evaluates as a formula.
    let formula = if command.starts_with('=') {
        command.to_string()
    } else {
        format!("={}", command)
    };

    if options.explain {
        return match engine.try_evaluate(&formula) {
            Ok(value) => {
                println!("{}", Computed::from(value));
                Ok(true)
            }
            Err(err) => {
                println!("{}", err);
                Ok(false)
            }
        };
    }

    let result = engine.evaluate(&formula);
    println!("{}", result);
    Ok(!result.is_error())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut command: Option<String> = None;
    let mut options = Options {
        cells: Vec::new(),
        config_file: None,
        no_config: false,
        explain: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--list-functions" => {
                print_functions();
                return;
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires a formula");
                    std::process::exit(1);
                }
                command = Some(args[i].to_string());
            }
            "--cell" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --cell requires ADDRESS=VALUE");
                    std::process::exit(1);
                }
                options.cells.push(args[i].to_string());
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
                options.config_file = Some(PathBuf::from(&args[i]));
            }
            "--no-config" => options.no_config = true,
            "--explain" => options.explain = true,
            arg => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(command) = command else {
        print_usage();
        std::process::exit(1);
    };

    init_logging();

    match run(&command, &options) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_assignment() {
        assert_eq!(
            parse_cell_assignment("A1=10").unwrap(),
            ("A1".to_string(), "10".to_string())
        );
        assert_eq!(
            parse_cell_assignment("B2==A1*2").unwrap(),
            ("B2".to_string(), "=A1*2".to_string())
        );
        assert_eq!(
            parse_cell_assignment("C3=").unwrap(),
            ("C3".to_string(), String::new())
        );
        assert!(parse_cell_assignment("A1").is_err());
        assert!(parse_cell_assignment("=5").is_err());
    }
}
