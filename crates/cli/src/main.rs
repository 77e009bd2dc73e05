//! nodegate CLI - placement gate for job selection scripts
//!
//! Exit code 0: the node is eligible. 1: it is not. 2: the command itself
//! could not run (bad arguments, unreadable condition file).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nodegate_core::application::{normalize, ConditionEvaluator, PlatformProbes};
use nodegate_core::config::ProbeConfig;
use nodegate_core::domain::{Condition, Operator, ScriptValue};
use nodegate_infra_props::PropertiesFactStore;
use nodegate_infra_system::SystemHostInfo;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_FACTS_FILE: &str = "node.properties";
// matches every nodegate_* crate by target prefix
const DEFAULT_LOG_FILTER: &str = "nodegate=warn";

#[derive(Parser)]
#[command(name = "nodegate")]
#[command(about = "Decide whether this node satisfies a job's placement conditions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Report through the exit code only
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a condition list (.json or .toml) against a fact store
    Check {
        /// Fact store (properties file)
        #[arg(short, long, env = "NODEGATE_FACTS")]
        facts: Option<String>,

        /// Condition list file
        #[arg(short, long)]
        conditions: PathBuf,

        /// Show every condition's result instead of stopping at the first failure
        #[arg(long)]
        explain: bool,
    },

    /// Check one condition against a fact store
    Property {
        /// Fact store (properties file)
        #[arg(short, long, env = "NODEGATE_FACTS")]
        facts: Option<String>,

        /// Fact name
        name: String,

        /// Operator: code (1-4), name (LESS_THAN, ...) or symbol (<, >, =, ~)
        operator: String,

        /// Expected value
        value: String,
    },

    /// Run one platform probe
    Probe {
        #[command(subcommand)]
        probe: ProbeCommand,
    },
}

#[derive(Subcommand)]
enum ProbeCommand {
    /// OS name contains a match of PATTERN (case-insensitive regex)
    OsName { pattern: String },
    /// OS architecture equals ARCH (case-insensitive)
    OsArch { arch: String },
    /// OS version equals VERSION
    OsVersion { version: String },
    /// Runtime property NAME contains a match of PATTERN
    Property { name: String, pattern: String },
    /// CUDA diagnostic reports a device (Windows only)
    Gpu,
    /// Total memory is at least BYTES
    Memory { bytes: u64 },
    /// FILE is present in a directory of PATH
    Exec { file: String },
    /// A wireless network interface exists
    Wifi,
    /// At least BYTES are free on the filesystem of --path (default: temp dir)
    DiskSpace {
        bytes: u64,
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "#")]
    index: usize,
    name: String,
    operator: String,
    value: String,
    result: String,
    reason: String,
}

fn init_logging() {
    let log_format = std::env::var("NODEGATE_LOG_FORMAT").unwrap_or_default();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match log_format.as_str() {
        "json" => {
            // Machine-readable structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Explicit path, else `<config dir>/nodegate/node.properties`; `~` is expanded
fn resolve_facts_path(facts: Option<String>) -> Result<PathBuf> {
    match facts {
        Some(raw) => Ok(PathBuf::from(shellexpand::tilde(&raw).into_owned())),
        None => directories::ProjectDirs::from("", "", "nodegate")
            .map(|dirs| dirs.config_dir().join(DEFAULT_FACTS_FILE))
            .context("No --facts given and no config directory for this user"),
    }
}

/// Read a condition list file into the matching script representation
///
/// A document whose top level is a table uses its `conditions` entry.
fn load_condition_list(path: &Path) -> Result<ScriptValue> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read condition list {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let value: serde_json::Value =
                serde_json::from_str(&text).context("Invalid JSON condition list")?;
            Ok(match value {
                serde_json::Value::Object(mut doc) if doc.contains_key("conditions") => {
                    ScriptValue::Json(doc.remove("conditions").unwrap_or_default())
                }
                other => ScriptValue::Json(other),
            })
        }
        Some("toml") => {
            let mut doc: toml::Table = toml::from_str(&text).context("Invalid TOML condition list")?;
            Ok(match doc.remove("conditions") {
                Some(conditions) => ScriptValue::Toml(conditions),
                None => ScriptValue::Toml(toml::Value::Table(doc)),
            })
        }
        _ => bail!(
            "Unsupported condition list {}: expected a .json or .toml file",
            path.display()
        ),
    }
}

fn print_outcome(quiet: bool, subject: &str, eligible: bool) {
    if quiet {
        return;
    }
    if eligible {
        println!("{} {}", "✓".green().bold(), subject);
    } else {
        println!("{} {}", "✗".red().bold(), subject);
    }
}

fn explain(evaluator: &ConditionEvaluator, facts: &Path, conditions: &[Condition], quiet: bool) -> bool {
    let outcomes = match evaluator.explain(facts, conditions) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            warn!(error = %e, "Fact store load failed");
            return false;
        }
    };

    if !quiet {
        let rows: Vec<OutcomeRow> = outcomes
            .iter()
            .enumerate()
            .map(|(i, outcome)| OutcomeRow {
                index: i + 1,
                name: outcome.condition.name().to_string(),
                operator: outcome.condition.operator().to_string(),
                value: outcome.condition.value().to_string(),
                result: if outcome.satisfied { "pass" } else { "fail" }.to_string(),
                reason: outcome.reason.clone().unwrap_or_default(),
            })
            .collect();
        println!("{}", Table::new(rows));
    }

    outcomes.iter().all(|outcome| outcome.satisfied)
}

async fn run(cli: Cli) -> Result<bool> {
    let quiet = cli.quiet;
    let evaluator = ConditionEvaluator::new(Arc::new(PropertiesFactStore::new()));

    let eligible = match cli.command {
        Commands::Check {
            facts,
            conditions,
            explain: show_all,
        } => {
            let facts = resolve_facts_path(facts)?;
            let params = load_condition_list(&conditions)?;
            info!(facts = %facts.display(), representation = params.kind(), "Checking conditions");

            let eligible = if show_all {
                match normalize(&params) {
                    Ok(list) => explain(&evaluator, &facts, &list, quiet),
                    Err(_) => false,
                }
            } else {
                evaluator.check_properties(&facts, &params)
            };
            print_outcome(quiet, &format!("conditions in {}", conditions.display()), eligible);
            eligible
        }

        Commands::Property {
            facts,
            name,
            operator,
            value,
        } => {
            let facts = resolve_facts_path(facts)?;
            match operator.parse::<Operator>() {
                Ok(operator) => {
                    let condition = Condition::new(name, operator, value);
                    let eligible = evaluator.evaluate_one(&facts, &condition);
                    print_outcome(quiet, &condition.to_string(), eligible);
                    eligible
                }
                Err(e) => {
                    warn!(error = %e, "Condition rejected");
                    print_outcome(quiet, &e.to_string(), false);
                    false
                }
            }
        }

        Commands::Probe { probe } => {
            let probes = PlatformProbes::new(Arc::new(SystemHostInfo::new()), ProbeConfig::from_env());
            let (subject, eligible) = match probe {
                ProbeCommand::OsName { pattern } => {
                    let ok = probes.check_os_name(Some(&pattern));
                    (format!("os name ~ {}", pattern), ok)
                }
                ProbeCommand::OsArch { arch } => {
                    let ok = probes.check_os_arch(Some(&arch));
                    (format!("os arch = {}", arch), ok)
                }
                ProbeCommand::OsVersion { version } => {
                    let ok = probes.check_os_version(Some(&version));
                    (format!("os version = {}", version), ok)
                }
                ProbeCommand::Property { name, pattern } => {
                    let ok = probes.check_runtime_property(Some(&name), Some(&pattern));
                    (format!("{} ~ {}", name, pattern), ok)
                }
                ProbeCommand::Gpu => ("cuda".to_string(), probes.check_cuda().await),
                ProbeCommand::Memory { bytes } => {
                    let ok = probes.check_total_memory(bytes);
                    (format!("total memory >= {} bytes", bytes), ok)
                }
                ProbeCommand::Exec { file } => {
                    let ok = probes.check_exec(&file);
                    (format!("{} on PATH", file), ok)
                }
                ProbeCommand::Wifi => ("wireless interface".to_string(), probes.check_wifi()),
                ProbeCommand::DiskSpace { bytes, path } => {
                    let ok = match &path {
                        Some(path) => probes.check_free_disk_space(bytes, path),
                        None => probes.check_free_disk_space_tmp(bytes),
                    };
                    (format!("free disk space >= {} bytes", bytes), ok)
                }
            };
            print_outcome(quiet, &subject, eligible);
            eligible
        }
    };

    Ok(eligible)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    info!("nodegate v{}", VERSION);

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}
