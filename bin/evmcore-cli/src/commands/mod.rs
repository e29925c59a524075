mod call;
mod transition;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a transaction list to a genesis allocation and print the
    /// post-state/receipts roots and gas used.
    Transition(transition::TransitionCmd),
    /// Execute a read-only call against a genesis allocation without
    /// mutating any persisted state.
    Call(call::CallCmd),
}

impl Commands {
    pub fn run(self) -> anyhow::Result<()> {
        match self {
            Commands::Transition(cmd) => cmd.run(),
            Commands::Call(cmd) => cmd.run(),
        }
    }
}
