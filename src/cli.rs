//! Command line: check | models
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;

use crate::ast::Module;
use crate::config::CheckerConfig;
use crate::diagnostics::{self, Diagnostic};
use crate::error::{Error, Result};
use crate::host::program::Program;
use crate::host::scheduler::Scheduler;
use crate::plugin::ResolverCheckPlugin;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// cross-check GraphQL resolvers against their field declarations, reading
/// typed-AST module dumps (JSON)
#[derive(Parser, Debug)]
#[command(name = "resolver-typeck", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,

    /// debug logging (shorthand for --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// log level: error, warn, info, debug or trace (RUST_LOG also works)
    #[arg(long, global = true)]
    pub log_level: Option<log::Level>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run the checks and print diagnostics; exits with 1 when errors were found
    Check(CheckOut),
    /// collect and print the object/interface models as JSON
    Models(ModelsOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON), one dump per line
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select the dump inside each document (e.g. /result/modules)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is one dump
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns.
    /// A dump is a module object or an array of them.
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// do not load the builtin and graphene stubs
    #[arg(long, default_value_t = false)]
    no_prelude: bool,
}

#[derive(Args, Debug, Clone)]
struct CheckerSettings {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// resolver method prefix (default `resolve_`)
    #[arg(long)]
    resolver_prefix: Option<String>,

    /// bound on semantic passes before giving up on deferred classes
    #[arg(long)]
    max_iterations: Option<usize>,

    /// only verify classes whose fully-qualified name matches this regex
    #[arg(long)]
    select: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    checker_settings: CheckerSettings,

    /// diagnostics format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ModelsOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    checker_settings: CheckerSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Modules of every input file, in argument order. Files are read and
    /// decoded in parallel.
    fn load_modules(&self) -> Result<Vec<Module>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let per_file: Vec<Result<Vec<Module>>> = source_paths.par_iter().map(|path| self.load_file(path)).collect();
        let mut modules = Vec::new();
        for file in per_file {
            modules.extend(file?);
        }
        log::debug!("loaded {} modules from {} files", modules.len(), source_paths.len());
        Ok(modules)
    }

    fn load_file(&self, source_path: &Path) -> Result<Vec<Module>> {
        let origin = source_path.display().to_string();
        let source = std::fs::read_to_string(source_path).map_err(|source| Error::Io {
            path: source_path.to_path_buf(),
            source,
        })?;
        let documents: Vec<Value> = if self.ndjson {
            source
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| parse_document(line, &origin))
                .collect::<Result<_>>()?
        } else {
            vec![parse_document(&source, &origin)?]
        };

        let mut modules = Vec::new();
        for document in documents {
            let document = self.select_pointer(document, &origin)?;
            let documents = match self.jq_expr.as_ref() {
                None => vec![document],
                Some(jq_expr) => crate::jq_exec::run_jaq(jq_expr, &document).map_err(|error| Error::Jq {
                    origin: origin.clone(),
                    message: format!("{error:#}"),
                })?,
            };
            for document in documents {
                modules.extend(decode_dump(document, &origin)?);
            }
        }
        log::debug!("{origin}: {} modules", modules.len());
        Ok(modules)
    }

    fn select_pointer(&self, document: Value, origin: &str) -> Result<Value> {
        let Some(pointer) = self.json_pointer.as_deref() else {
            return Ok(document);
        };
        let mut document = document;
        document.pointer_mut(pointer).map(Value::take).ok_or_else(|| Error::Pointer {
            pointer: pointer.to_string(),
            origin: origin.to_string(),
        })
    }
}

impl CheckerSettings {
    fn resolve(&self) -> Result<(CheckerConfig, Option<Regex>)> {
        let mut config = match self.config.as_deref() {
            Some(path) => CheckerConfig::load(path)?,
            None => CheckerConfig::default(),
        };
        if let Some(prefix) = self.resolver_prefix.as_ref() {
            config.resolver_prefix = prefix.clone();
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        let select = self.select.as_deref().map(Regex::new).transpose()?;
        Ok((config, select))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// `-v` wins over `--log-level`; the default is warnings only.
    pub fn log_filter(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else if let Some(level) = self.log_level {
            level.to_level_filter()
        } else {
            log::LevelFilter::Warn
        }
    }

    pub fn run(&self) -> anyhow::Result<ExitCode> {
        match &self.cmd {
            Command::Check(target) => {
                let modules = target.input_settings.load_modules().context("failed to load module dumps")?;
                let (config, select) = target.checker_settings.resolve()?;
                let mut program = Program::new(&modules, !target.input_settings.no_prelude)?;
                let scheduler = Scheduler::new(config.max_iterations).with_select(select);
                let mut plugin = ResolverCheckPlugin::new(config);
                let diagnostics = scheduler.run(&mut program, &mut plugin);

                let colored = target.out.is_none() && std::io::stdout().is_terminal();
                let output = match target.format {
                    OutputFormat::Text => render_text(&diagnostics, colored),
                    OutputFormat::Json => serde_json::to_string_pretty(&diagnostics)?,
                };
                write_output(target.out.as_deref(), &output)?;

                if diagnostics.iter().any(Diagnostic::is_error) {
                    Ok(ExitCode::FAILURE)
                } else {
                    Ok(ExitCode::SUCCESS)
                }
            }
            Command::Models(target) => {
                let modules = target.input_settings.load_modules().context("failed to load module dumps")?;
                let (config, _) = target.checker_settings.resolve()?;
                let mut program = Program::new(&modules, !target.input_settings.no_prelude)?;
                let scheduler = Scheduler::new(config.max_iterations);
                let mut plugin = ResolverCheckPlugin::new(config);
                let mut diagnostics = Vec::new();
                let report = scheduler.semantic_passes(&mut program, &mut plugin, &mut diagnostics);
                log::debug!("{} semantic passes, {} models", report.passes, plugin.models().len());
                for diagnostic in &diagnostics {
                    eprintln!("{}", diagnostic.render());
                }

                let models_src = serde_json::to_string_pretty(plugin.models())?;
                write_output(target.out.as_deref(), &models_src)?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn parse_document(source: &str, origin: &str) -> Result<Value> {
    crate::path_de::from_str_with_path(source).map_err(|source| Error::Decode {
        origin: origin.to_string(),
        source,
    })
}

/// A dump is one module or an array of modules.
fn decode_dump(document: Value, origin: &str) -> Result<Vec<Module>> {
    let decoded = if document.is_array() {
        crate::path_de::from_value_with_path(document)
    } else {
        crate::path_de::from_value_with_path(document).map(|module| vec![module])
    };
    decoded.map_err(|source| Error::Decode {
        origin: origin.to_string(),
        source,
    })
}

fn render_text(diagnostics: &[Diagnostic], colored: bool) -> String {
    let mut lines: Vec<String> = diagnostics
        .iter()
        .map(|diagnostic| if colored { diagnostic.render() } else { diagnostic.to_string() })
        .collect();
    lines.push(diagnostics::summary(diagnostics));
    lines.join("\n")
}

fn write_output(out: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    if let Some(out) = out {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))?;
    } else {
        println!("{contents}");
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // An explicit glob that matches nothing is a mistake.
                return Err(Error::NoMatches(pattern.to_string()));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
