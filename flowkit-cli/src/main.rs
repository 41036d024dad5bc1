// Flowkit CLI
// Lists, runs, serializes and executes the registered flowkit entities

mod commands;
mod demos;
mod output;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use commands::{execute, list, run, serialize};

#[derive(Parser, Debug)]
#[command(
    name = "flowkit",
    version,
    about = "Run, serialize and expand flowkit tasks and workflows"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered entities
    List(list::ListArgs),
    /// Run an entity locally
    Run(run::RunArgs),
    /// Print the registrable form of an entity
    Serialize(serialize::SerializeArgs),
    /// Task container entrypoint: dispatch an entity and write its outputs
    Execute(execute::ExecuteArgs),
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let registry = demos::registry()?;

    match cli.command {
        Command::List(args) => list::execute(&registry, args),
        Command::Run(args) => run::execute(&registry, args),
        Command::Serialize(args) => serialize::execute(&registry, args),
        Command::Execute(args) => execute::execute(&registry, args),
    }
}
