//! Argument parsing, request dispatch, and report rendering.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use gristmill_config::EngineConfig;
use gristmill_engine::{Action, Directive, GenerationReport, ProductDescriptor, ProductService};
use tracing::debug;

use crate::logging;

#[derive(Parser)]
#[command(name = "gristmill", about = "On-demand product generation service")]
struct Cli {
    /// Product descriptor, e.g. `201708121500_radar.comp_SIZE=800,800.png`.
    #[arg(short = 'p', long = "product", value_name = "DESCRIPTOR")]
    product: String,
    /// Configuration file (KEY=value lines).
    #[arg(short = 'c', long = "conf", value_name = "FILE", env = "GRISTMILL_CONF")]
    conf: Option<PathBuf>,
    /// Make the product; the default when no action is selected.
    #[arg(short = 'm', long)]
    make: bool,
    /// Delete the cached product file.
    #[arg(short = 'd', long)]
    delete: bool,
    /// List the product's inputs.
    #[arg(short = 'i', long)]
    inputs: bool,
    /// Comma-separated action list: MAKE, DELETE, INPUTS.
    #[arg(short = 'r', long, value_name = "LIST", default_value = "")]
    request: String,
    /// Comma-separated directives: LINK, LATEST, LOG.
    #[arg(short = 'D', long, value_name = "LIST", default_value = "")]
    directives: String,
    /// Log filter when RUST_LOG is not set.
    #[arg(long, value_name = "LEVEL", default_value = "info", env = "GRISTMILL_LOG")]
    log_level: String,
    /// Output format for the outcome report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug)]
enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

type CliResult<T> = Result<T, CliError>;

impl CliError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

/// Parse arguments, execute the request, render the report. Returns the
/// process exit code: 0 for success-class outcomes, 1 for failure-class
/// outcomes, 2 for validation problems, 3 for runtime failures.
pub(crate) fn run() -> i32 {
    let cli = Cli::parse();
    if let Err(err) = logging::init(&cli.log_level) {
        eprintln!("error: {err:#}");
    }
    match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn dispatch(cli: Cli) -> CliResult<i32> {
    let config = resolve_config(cli.conf.as_deref())?;
    let actions = parse_actions(&cli)?;
    let directives = parse_directives(&cli.directives)?;
    let descriptor: ProductDescriptor = cli
        .product
        .parse()
        .map_err(|err| CliError::validation(format!("could not parse product '{}': {err}", cli.product)))?;
    debug!(product = %descriptor, ?actions, ?directives, "dispatching request");

    let service = ProductService::new(config);
    let report = service
        .make_request(&descriptor, &actions, &directives)
        .map_err(CliError::failure)?;

    render_report(&report, cli.output)?;
    Ok(i32::from(!report.status.is_success()))
}

fn resolve_config(conf: Option<&Path>) -> CliResult<EngineConfig> {
    match conf {
        Some(path) => gristmill_config::load(path).map_err(CliError::failure),
        None => Ok(EngineConfig::default()),
    }
}

fn parse_actions(cli: &Cli) -> CliResult<BTreeSet<Action>> {
    let mut actions = BTreeSet::new();
    if cli.make {
        actions.insert(Action::Make);
    }
    if cli.delete {
        actions.insert(Action::Delete);
    }
    if cli.inputs {
        actions.insert(Action::ListInputs);
    }
    for token in split_list(&cli.request) {
        actions.insert(token.parse().map_err(CliError::validation)?);
    }
    if actions.is_empty() {
        actions.insert(Action::Make);
    }
    Ok(actions)
}

fn parse_directives(list: &str) -> CliResult<BTreeSet<Directive>> {
    let mut directives = BTreeSet::new();
    for token in split_list(list) {
        directives.insert(token.parse().map_err(CliError::validation)?);
    }
    Ok(directives)
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|token| !token.is_empty())
}

fn render_report(report: &GenerationReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(report)
                .map_err(|err| CliError::failure(anyhow::anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!("product: {}", report.product);
            println!("status: {}", report.status);
            if let Some(artifact) = &report.artifact {
                println!("artifact: {}", artifact.display());
            }
            if let Some(exit_code) = report.exit_code {
                println!("exit code: {exit_code}");
            }
            if !report.inputs.is_empty() {
                println!("inputs:");
                for (name, value) in &report.inputs {
                    println!("  {name}={value}");
                }
            }
            if let Some(diagnostic) = &report.diagnostic {
                println!("diagnostic: {diagnostic}");
            }
        }
    }
    Ok(())
}
