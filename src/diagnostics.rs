//! External tool checks for `phonetrack check`.

use crate::aligner::{CommandExecutor, tool_available};
use crate::config::Config;
use owo_colors::OwoColorize;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Tool is installed and answered a version query
    Ok(String),
    /// Tool is not found on PATH
    NotFound,
    /// Tool is found but the version query failed
    Warning(String),
}

/// One checked tool.
#[derive(Debug, PartialEq)]
pub struct ToolCheck {
    pub name: String,
    pub purpose: &'static str,
    pub result: CheckResult,
    pub install_hint: &'static str,
}

fn check_tool<E: CommandExecutor>(executor: &E, command: &str, version_args: &[&str]) -> CheckResult {
    if !tool_available(command) {
        return CheckResult::NotFound;
    }
    match executor.execute(command, version_args) {
        Ok(out) => CheckResult::Ok(out.lines().next().unwrap_or_default().trim().to_string()),
        Err(e) => CheckResult::Warning(e.to_string()),
    }
}

/// Check the aligner and the audio converter named in `config`.
pub fn check_tools<E: CommandExecutor>(config: &Config, executor: &E) -> Vec<ToolCheck> {
    vec![
        ToolCheck {
            name: config.aligner.command.clone(),
            purpose: "forced alignment",
            result: check_tool(executor, &config.aligner.command, &["version"]),
            install_hint: "conda install -c conda-forge montreal-forced-aligner",
        },
        ToolCheck {
            name: config.aligner.converter.clone(),
            purpose: "MP3 to WAV conversion",
            result: check_tool(executor, &config.aligner.converter, &["-version"]),
            install_hint: "sudo apt install ffmpeg  (Debian/Ubuntu)",
        },
    ]
}

/// Print checks; returns whether every tool is usable.
pub fn print_checks(checks: &[ToolCheck]) -> bool {
    println!("Checking external tools...\n");
    let mut all_ok = true;
    for check in checks {
        print!("{} ({}): ", check.name, check.purpose);
        match &check.result {
            CheckResult::Ok(version) if version.is_empty() => println!("{}", "✓ OK".green()),
            CheckResult::Ok(version) => println!("{} {}", "✓ OK".green(), version.dimmed()),
            CheckResult::NotFound => {
                all_ok = false;
                println!("{}", "✗ NOT FOUND".red());
                println!("  Install: {}", check.install_hint);
            }
            CheckResult::Warning(msg) => {
                all_ok = false;
                println!("{} {}", "⚠ WARNING:".yellow(), msg);
            }
        }
    }
    all_ok
}
