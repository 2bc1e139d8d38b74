//! Rule base → Intervals → Checkers → Findings CLI
//!
//! Usage:
//!   rulecheck check data/requirements.json
//!   rulecheck check data/requirements.json --config config/rulecheck.toml --format json
//!   rulecheck check data/requirements.json --only cross-rule-conflicts --only redundant-rules
//!   rulecheck check data/requirements.json --concurrent --fail-on-findings
//!   rulecheck variables data/requirements.json

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use rulecheck::config::Config;
use rulecheck::rules::{
    ingest::load_rule_base,
    detector::{run_checks, run_checks_concurrent, Check},
    outputs::{render, write_report, ReportFormat},
};

#[derive(Parser)]
#[command(name = "rulecheck")]
#[command(about = "Detect contradictions, conflicts and redundancy in a rule base")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the checkers over a rule base
    Check {
        /// Rule base JSON file
        path: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// text, json or jsonl (overrides the config file)
        #[arg(long)]
        format: Option<String>,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Run only these checks (repeatable)
        #[arg(long)]
        only: Vec<String>,
        /// Fan checkers out on the blocking pool
        #[arg(long)]
        concurrent: bool,
        /// Exit with status 1 when anything is found
        #[arg(long)]
        fail_on_findings: bool,
    },
    /// Print declared variables, or the inferred table when none are declared
    Variables {
        path: PathBuf,
    },
}

fn parse_only(only: &[String]) -> Result<Vec<Check>> {
    only.iter()
        .map(|s| {
            Check::parse(s).with_context(|| {
                let known: Vec<_> = Check::ALL.iter().map(|c| c.name()).collect();
                format!("Unknown check '{}', expected one of: {}", s, known.join(", "))
            })
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
async fn run_check_command(
    path: PathBuf,
    config_path: Option<PathBuf>,
    format: Option<String>,
    output: Option<PathBuf>,
    only: Vec<String>,
    concurrent: bool,
    fail_on_findings: bool,
) -> Result<bool> {
    let config = Config::load_or_default(config_path.as_ref())?;

    let mut detector_config = config.detector_config();
    if !only.is_empty() {
        detector_config.checks = parse_only(&only)?;
    }

    let format = match format {
        Some(f) => ReportFormat::parse(&f)
            .with_context(|| format!("Unknown format '{}', expected text, json or jsonl", f))?,
        None => config.report.format,
    };

    tracing::info!("Checking rules from {:?}", path);
    let rule_base = load_rule_base(&path)
        .with_context(|| format!("Failed to load rule base from {:?}", path))?;

    if rule_base.is_empty() {
        tracing::warn!("Rule base {:?} contains no rules", path);
    }

    let report = if concurrent {
        run_checks_concurrent(Arc::new(rule_base), &detector_config).await?
    } else {
        run_checks(&rule_base, &detector_config)
    };

    let source = path.display().to_string();
    match output {
        Some(out) => write_report(&out, format, &source, &report)?,
        None => print!("{}", render(format, &source, &report)?),
    }

    Ok(fail_on_findings && !report.is_clean())
}

fn run_variables_command(path: PathBuf) -> Result<()> {
    let rule_base = load_rule_base(&path)
        .with_context(|| format!("Failed to load rule base from {:?}", path))?;

    let declared = !rule_base.variables.is_empty();
    let variables = rule_base.variables_or_inferred();

    println!(
        "{} variables ({})",
        variables.len(),
        if declared { "declared" } else { "inferred" }
    );
    for v in &variables {
        println!(
            "{:<32} {:<16} {}",
            v.name,
            serde_json::to_value(v.var_type)?.as_str().unwrap_or_default(),
            serde_json::to_value(v.role)?.as_str().unwrap_or_default()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { path, config, format, output, only, concurrent, fail_on_findings } => {
            let failed = run_check_command(
                path,
                config,
                format,
                output,
                only,
                concurrent,
                fail_on_findings,
            )
            .await?;
            if failed {
                std::process::exit(1);
            }
        }
        Commands::Variables { path } => {
            run_variables_command(path)?;
        }
    }

    Ok(())
}
