//! Runs every `fixtures/*.json` case through the built-in host and compares
//! the diagnostics with the expected `LINE: MESSAGE` lines.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;
use resolver_typeck::ast::Module;
use resolver_typeck::config::CheckerConfig;
use resolver_typeck::host::program::Program;
use resolver_typeck::host::scheduler::Scheduler;
use resolver_typeck::plugin::ResolverCheckPlugin;
use serde::Deserialize;

static EXPECTED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+): (.+)$").unwrap());

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    config: Option<CheckerConfig>,
    modules: Vec<Module>,
    #[serde(default)]
    expected: Vec<String>,
}

fn load_fixture(path: &Path) -> Result<Fixture, String> {
    let source = std::fs::read_to_string(path).map_err(|error| error.to_string())?;
    let de = &mut serde_json::Deserializer::from_str(&source);
    serde_path_to_error::deserialize(de).map_err(|error| format!("at {} → {}", error.path(), error.inner()))
}

/// `(line, message)` pairs, sorted.
fn expected_pairs(fixture: &Fixture) -> Result<Vec<(u32, String)>, String> {
    let mut pairs = Vec::new();
    for line in &fixture.expected {
        let captures = EXPECTED_LINE
            .captures(line)
            .ok_or_else(|| format!("malformed expectation: {line:?}"))?;
        let number = captures[1].parse::<u32>().map_err(|error| error.to_string())?;
        pairs.push((number, captures[2].to_string()));
    }
    pairs.sort();
    Ok(pairs)
}

fn run_fixture(path: &Path) -> Result<(), String> {
    let fixture = load_fixture(path)?;
    let expected = expected_pairs(&fixture)?;
    let config = fixture.config.clone().unwrap_or_default();

    let mut program = Program::new(&fixture.modules, true).map_err(|error| error.to_string())?;
    let mut plugin = ResolverCheckPlugin::new(config.clone());
    let diagnostics = Scheduler::new(config.max_iterations).run(&mut program, &mut plugin);

    let mut actual: Vec<(u32, String)> = diagnostics
        .iter()
        .map(|diagnostic| (diagnostic.location.line, diagnostic.message.clone()))
        .collect();
    actual.sort();

    if actual == expected {
        return Ok(());
    }
    let mut report = String::new();
    for missing in expected.iter().filter(|pair| !actual.contains(pair)) {
        report.push_str(&format!("\n    missing:    {}: {}", missing.0, missing.1));
    }
    for unexpected in actual.iter().filter(|pair| !expected.contains(pair)) {
        report.push_str(&format!("\n    unexpected: {}: {}", unexpected.0, unexpected.1));
    }
    if report.is_empty() {
        report.push_str("\n    diagnostics differ in multiplicity");
    }
    Err(report)
}

fn fixture_paths() -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .collect()
        })
        .unwrap_or_default();
    paths.sort();
    paths
}

fn main() -> ExitCode {
    let filter = std::env::args().nth(1);
    let mut failed = 0;
    let mut ran = 0;
    for path in fixture_paths() {
        let name = path.file_stem().map(|stem| stem.to_string_lossy().to_string()).unwrap_or_default();
        if filter.as_deref().is_some_and(|filter| !name.contains(filter)) {
            continue;
        }
        ran += 1;
        match run_fixture(&path) {
            Ok(()) => println!("{} {name}", "✅ pass".green()),
            Err(report) => {
                failed += 1;
                println!("{} {name}{report}", "❌ fail".red().bold());
            }
        }
    }
    println!("{} fixtures, {} failed", ran, failed);
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
