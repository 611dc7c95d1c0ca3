use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "statemate")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Declarative state for config files, macOS defaults and git config",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bring every state in a spec in sync, rolling back on failure
    Apply(ApplyArgs),

    /// Show which states are out of sync and what would be written
    Diff(DiffArgs),

    /// Cast a string the way a state's `type` option does
    Cast {
        /// Type name: string, integer, float or boolean (str, int, bool)
        type_name: String,

        /// Value to cast
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// List available adapters
    Adapters,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Spec file, JSON or TOML (default: spec.toml or spec.json in the config dir)
    pub spec: Option<String>,

    /// Dry run - show what would change without writing
    #[arg(short, long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// On failure, roll back to the values read before writing instead of
    /// re-writing the declared values
    #[arg(long)]
    pub restore_previous: bool,
}

#[derive(Parser)]
pub struct DiffArgs {
    /// Spec file, JSON or TOML (default: spec.toml or spec.json in the config dir)
    pub spec: Option<String>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}
