use clap::{Parser, Subcommand};
use sail::prelude::*;
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Validates and compiles strategy documents into atomic call lists
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run schema and graph validation and print every issue found
    Validate {
        /// Path to the strategy JSON file
        strategy_path: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compile a strategy into an ordered call list
    Compile {
        /// Path to the strategy JSON file
        strategy_path: String,
        /// Pool states: {"pools": {...}, "unavailable": [...]}
        #[arg(long)]
        pools: Option<String>,
        /// Address book: {"mainnet": {...}, "testnet": {...}}
        #[arg(long)]
        addresses: Option<String>,
        /// Compiler options as JSON
        #[arg(long)]
        config: Option<String>,
        /// Allow best-effort estimates for pools that cannot be read
        #[arg(long)]
        best_effort: bool,
        /// Write the compiled transaction to this file (bincode)
        #[arg(short, long)]
        output: Option<String>,
        /// Print the compiled transaction as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate {
            strategy_path,
            json,
        } => run_validate(&strategy_path, json),
        Command::Compile {
            strategy_path,
            pools,
            addresses,
            config,
            best_effort,
            output,
            json,
        } => {
            let mut options = config
                .map(|path| {
                    serde_json::from_str::<CompilerOptions>(&read_file(&path)).unwrap_or_else(|e| {
                        exit_with_error(&format!("Failed to parse config '{}': {}", path, e))
                    })
                })
                .unwrap_or_default();
            if best_effort {
                options.estimate_mode = EstimateMode::BestEffort;
            }
            run_compile(&strategy_path, pools, addresses, options, output, json);
        }
    }
}

fn run_validate(strategy_path: &str, json: bool) {
    let document = load_document(strategy_path);
    let report = validate_document(&document);

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to render report: {}", e)));
        println!("{}", rendered);
    } else {
        for issue in &report.schema_errors {
            println!("{}", issue);
        }
        for issue in report.graph_errors.iter().chain(&report.warnings) {
            println!("{}", issue);
        }
        println!(
            "\n{} error(s), {} warning(s)",
            report.error_count(),
            report.warnings.len()
        );
    }
    if !report.is_valid() {
        std::process::exit(2);
    }
}

fn run_compile(
    strategy_path: &str,
    pools_path: Option<String>,
    addresses_path: Option<String>,
    options: CompilerOptions,
    output: Option<String>,
    json: bool,
) {
    let total_start = Instant::now();
    let document = load_document(strategy_path);

    let pools = match pools_path {
        Some(path) => StaticPoolReader::from_json_str(&read_file(&path)).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to parse pools '{}': {}", path, e))
        }),
        None => StaticPoolReader::new(),
    };
    let addresses = match addresses_path {
        Some(path) => StaticAddressBook::from_json_str(&read_file(&path), options.network)
            .unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to parse addresses '{}': {}", path, e))
            }),
        None => StaticAddressBook::new(),
    };
    info!(network = %options.network, pools = pools.len(), "loaded collaborators");

    let compiler =
        CompilerBuilder::with_defaults(Arc::new(pools), Arc::new(addresses), options).build();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to start runtime: {}", e)));
    let compiled = runtime
        .block_on(compiler.compile(&document))
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));

    if json {
        let rendered = serde_json::to_string_pretty(&compiled)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to render output: {}", e)));
        println!("{}", rendered);
    } else {
        println!("{}", compiled);
    }

    if let Some(path) = output {
        compiled
            .save(&path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save '{}': {}", path, e)));
        info!(path = %path, "compiled transaction saved");
    }
    if !compiled.is_production_ready() {
        eprintln!(
            "Warning: {} node(s) were compiled from best-effort estimates: {}",
            compiled.best_effort_nodes.len(),
            compiled.best_effort_nodes.join(", ")
        );
    }
    info!(elapsed = ?total_start.elapsed(), "done");
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read '{}': {}", path, e)))
}

fn load_document(path: &str) -> serde_json::Value {
    serde_json::from_str(&read_file(path))
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse JSON '{}': {}", path, e)))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
