pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "gpuwatch",
    about = "gpuwatch operator CLI",
    long_about = "Inspect the GPU price board, dump product history, synthesize demo feed files, and run readiness checks.",
    after_help = "Examples:\n  gpuwatch advise --search rtx\n  gpuwatch history \"NVIDIA RTX 4090\" --json\n  gpuwatch generate --out data --seed 7\n  gpuwatch doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Load the price board and print per-product buying advice")]
    Advise {
        #[arg(long, help = "Case-insensitive substring filter on product name")]
        search: Option<String>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Fetch and print the price history series for one product")]
    History {
        product: String,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Synthesize a deterministic demo feed (prices and week-long histories)")]
    Generate {
        #[arg(long, default_value = "data", help = "Output directory for the feed files")]
        out: PathBuf,
        #[arg(long, help = "Seed for reproducible output; omit for a fresh random week")]
        seed: Option<u64>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, feed reachability, and fallback dataset integrity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Advise { search, json } => commands::advise::run(search.as_deref(), json),
        Command::History { product, json } => commands::history::run(&product, json),
        Command::Generate { out, seed } => commands::generate::run(&out, seed),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
