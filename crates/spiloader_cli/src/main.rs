//! `spiloader` command line entry point.
//!
//! # Responsibility
//! - Assemble search roots (hand-written manifest directories first, then
//!   one generated root per registering module) and run discovery.
//! - `list` prints every provider with a running count and always exits 0.
//! - `verify` checks expected counts and exits non-zero on any mismatch.

mod demo;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::warn;
use serde::Serialize;
use spiloader_core::manifest::{generated_manifests, write_manifest};
use spiloader_core::{
    default_log_level, generated_roots, init_logging, init_stderr_logging,
    load_config, search_path_roots, verify_all, DirectoryRoot, DiscoveryConfig, DiscoveryEngine,
    DuplicatePolicy, ErrorPolicy, ProviderRegistry, SearchRoot, VerifyError,
};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

const CLI_LOG_LEVEL: &str = "warn";

#[derive(Debug, Parser)]
#[command(name = "spiloader", version, about = "Discover contract providers from manifests")]
struct Cli {
    /// Search root directory; repeat to add more, visited in the given order.
    #[arg(long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Platform search path string (`a:b:c`) appended after `--root` entries.
    #[arg(long, global = true)]
    search_path: Option<OsString>,

    /// JSON config file with `roots` and `policy`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    on_malformed: Option<ErrorPolicy>,

    #[arg(long, global = true)]
    on_instantiation_error: Option<ErrorPolicy>,

    #[arg(long, global = true)]
    duplicates: Option<DuplicatePolicy>,

    /// Log level (trace|debug|info|warn|error|off).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rotating log files; logs go to stderr otherwise.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every provider found per contract with a running count.
    List {
        /// Contract id; defaults to the two demo contracts.
        #[arg(long = "contract")]
        contracts: Vec<String>,
    },
    /// Check provider counts; exits 1 on any mismatch.
    Verify {
        /// Contract id, paired in order with `--expect`.
        #[arg(long = "contract")]
        contracts: Vec<String>,
        #[arg(long = "expect")]
        expected: Vec<usize>,
    },
    /// Print the search roots in visiting order.
    Roots,
    /// Write generated manifests, one directory per registering module.
    Generate {
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    if run_cli(Cli::parse()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Runs one invocation; returns whether the process exits successfully.
///
/// `list` succeeds even when discovery or engine assembly fails.
fn run_cli(cli: Cli) -> bool {
    let always_succeed = matches!(cli.command, None | Some(Command::List { .. }));
    match run(&cli) {
        Ok(success) => success || always_succeed,
        Err(err) => {
            eprintln!("error: {err:#}");
            always_succeed
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    init_cli_logging(cli);

    let default_command = Command::List {
        contracts: Vec::new(),
    };
    match cli.command.as_ref().unwrap_or(&default_command) {
        Command::List { contracts } => {
            let engine = build_engine(cli)?;
            list(&engine, &contract_list(contracts), cli.format)?;
            Ok(true)
        }
        Command::Verify {
            contracts,
            expected,
        } => {
            let engine = build_engine(cli)?;
            verify(&engine, &expectations(contracts, expected)?, cli.format)
        }
        Command::Roots => {
            let engine = build_engine(cli)?;
            print_roots(&engine, cli.format)?;
            Ok(true)
        }
        Command::Generate { out } => {
            let registry = ProviderRegistry::collected()?;
            generate(&registry, out)?;
            Ok(true)
        }
    }
}

fn init_cli_logging(cli: &Cli) {
    let outcome = match &cli.log_dir {
        Some(dir) => init_logging(
            cli.log_level.as_deref().unwrap_or(default_log_level()),
            dir,
        ),
        None => init_stderr_logging(cli.log_level.as_deref().unwrap_or(CLI_LOG_LEVEL)),
    };
    if let Err(err) = outcome {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn build_engine(cli: &Cli) -> Result<DiscoveryEngine> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DiscoveryConfig::default(),
    };

    let mut registry = ProviderRegistry::collected()?;
    demo::register_manual(&mut registry)?;

    let mut directories = config.directory_roots();
    directories.extend(cli.roots.iter().cloned().map(DirectoryRoot::new));
    if let Some(search_path) = &cli.search_path {
        directories.extend(search_path_roots(search_path));
    }
    if directories.is_empty() {
        directories.push(DirectoryRoot::new(demo::default_manual_root()));
    }

    let mut roots: Vec<Box<dyn SearchRoot>> = directories
        .into_iter()
        .map(|root| Box::new(root) as Box<dyn SearchRoot>)
        .collect();
    roots.extend(
        generated_roots(&registry)
            .into_iter()
            .map(|root| Box::new(root) as Box<dyn SearchRoot>),
    );

    let mut policy = config.policy;
    if let Some(value) = cli.on_malformed {
        policy.on_malformed = value;
    }
    if let Some(value) = cli.on_instantiation_error {
        policy.on_instantiation_error = value;
    }
    if let Some(value) = cli.duplicates {
        policy.duplicates = value;
    }

    Ok(DiscoveryEngine::new(registry, roots).with_policy(policy))
}

fn contract_list(contracts: &[String]) -> Vec<String> {
    if contracts.is_empty() {
        return vec![
            demo::MANUAL_CONTRACT.to_string(),
            demo::AUTO_CONTRACT.to_string(),
        ];
    }
    contracts.to_vec()
}

fn expectations(contracts: &[String], expected: &[usize]) -> Result<Vec<(String, usize)>> {
    if contracts.len() != expected.len() {
        bail!(
            "--contract and --expect must be given the same number of times ({} vs {})",
            contracts.len(),
            expected.len()
        );
    }
    if contracts.is_empty() {
        return Ok(demo::DEFAULT_EXPECTATIONS
            .iter()
            .map(|(contract, count)| (contract.to_string(), *count))
            .collect());
    }
    Ok(contracts.iter().cloned().zip(expected.iter().copied()).collect())
}

#[derive(Debug, Serialize)]
struct ListedContract {
    contract: String,
    providers: Vec<String>,
    count: usize,
    error: Option<String>,
}

fn list(engine: &DiscoveryEngine, contracts: &[String], format: OutputFormat) -> Result<()> {
    let mut listed = Vec::new();
    for contract in contracts {
        let mut entry = ListedContract {
            contract: contract.clone(),
            providers: Vec::new(),
            count: 0,
            error: None,
        };
        if format == OutputFormat::Text {
            println!("Providers of {contract}:");
        }
        match engine.discover(contract) {
            Ok(discovery) => {
                for outcome in discovery {
                    match outcome {
                        Ok(instance) => {
                            let id = instance.provider().to_string();
                            let root = instance.root().to_string();
                            entry.count += 1;
                            if format == OutputFormat::Text {
                                match demo::describe(instance) {
                                    Some(description) => println!(
                                        "\t> Found implementation: {id} from {root}: {description} [{}]",
                                        entry.count
                                    ),
                                    None => println!(
                                        "\t> Found implementation: {id} from {root} [{}]",
                                        entry.count
                                    ),
                                }
                            }
                            entry.providers.push(id);
                        }
                        Err(err) => {
                            warn!("event=cli_list module=cli status=error error={err}");
                            entry.error = Some(err.to_string());
                        }
                    }
                }
            }
            Err(err) => entry.error = Some(err.to_string()),
        }
        if format == OutputFormat::Text {
            if let Some(error) = &entry.error {
                println!("\t! {error}");
            }
            println!("Total providers of {contract}: {}", entry.count);
        }
        listed.push(entry);
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct VerifyOutcome {
    contract: String,
    ok: bool,
    count: Option<usize>,
    providers: Vec<String>,
    error: Option<String>,
}

impl VerifyOutcome {
    fn failed(err: &VerifyError) -> Self {
        let (count, providers) = match err {
            VerifyError::CountMismatch {
                actual, providers, ..
            } => (Some(*actual), providers.clone()),
            VerifyError::Discovery(_) => (None, Vec::new()),
        };
        Self {
            contract: err.contract().to_string(),
            ok: false,
            count,
            providers,
            error: Some(err.to_string()),
        }
    }
}

fn verify(
    engine: &DiscoveryEngine,
    expectations: &[(String, usize)],
    format: OutputFormat,
) -> Result<bool> {
    let table: Vec<(&str, usize)> = expectations
        .iter()
        .map(|(contract, count)| (contract.as_str(), *count))
        .collect();

    let outcomes: Vec<VerifyOutcome> = verify_all(engine, &table)
        .into_iter()
        .map(|outcome| match outcome {
            Ok(report) => VerifyOutcome {
                contract: report.contract,
                ok: true,
                count: Some(report.count),
                providers: report.providers,
                error: None,
            },
            Err(err) => VerifyOutcome::failed(&err),
        })
        .collect();

    match format {
        OutputFormat::Text => {
            for outcome in &outcomes {
                match &outcome.error {
                    None => println!(
                        "ok   {}: {} provider(s)",
                        outcome.contract,
                        outcome.count.unwrap_or_default()
                    ),
                    Some(error) => println!("FAIL {error}"),
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcomes)?),
    }

    Ok(outcomes.iter().all(|outcome| outcome.ok))
}

fn print_roots(engine: &DiscoveryEngine, format: OutputFormat) -> Result<()> {
    let roots = engine.root_names();
    match format {
        OutputFormat::Text => {
            println!("SEARCH ROOTS");
            for root in roots {
                println!("\t{root}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&roots)?),
    }
    Ok(())
}

fn generate(registry: &ProviderRegistry, out: &std::path::Path) -> Result<()> {
    for (origin, manifests) in generated_manifests(registry) {
        let module_dir = out.join(origin.replace("::", "."));
        for (contract, providers) in manifests {
            let path = write_manifest(&module_dir, &contract, &providers)
                .with_context(|| format!("failed to write manifest for {contract}"))?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
