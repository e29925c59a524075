//! Fixture-driven entry points for the three programmatic boundaries of
//! §6: `run_transaction`/`assemble_block` (the `transition` subcommand)
//! and `call_view` (the `call` subcommand). No networking, no RPC, no key
//! management -- those stay out of scope per §1; this binary exists only
//! so the engine has a runnable surface to exercise.

use clap::Parser;

#[cfg(feature = "dev")]
use tracing_subscriber::EnvFilter;

mod commands;
mod fixture;

#[derive(Parser)]
#[command(name = "evmcore", version, about = "Fixture-driven state-transition runner")]
struct Cli {
    #[command(subcommand)]
    commands: commands::Commands,
}

fn main() -> anyhow::Result<()> {
    #[cfg(feature = "dev")]
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    cli.commands.run()
}
