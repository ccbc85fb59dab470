use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hdl",
    about = "Build and reconcile handle records from a profile",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON profile replacing the built-in one
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    /// Also write the resulting record to this file
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Override a profile parameter; an empty value unsets it
    #[arg(long = "param", global = true, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the record of a new object
    Create(CreateArgs),
    /// Reconcile a record with the profile, e.g. after a move
    Update(UpdateArgs),
    /// Add or overwrite ad hoc entries
    Set(SetArgs),
    /// Remove entries by type
    Unset(UnsetArgs),
    /// List the entry indices of a record
    Indices(DocArgs),
    /// Print the value of one entry
    Value(ValueArgs),
    /// Show the effective profile
    Profile(ProfileArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Path of the object in the store
    pub object: String,
    #[arg(value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub pairs: Vec<(String, String)>,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub doc: PathBuf,
    /// Current path of the object
    pub object: String,
}

#[derive(Args)]
pub struct SetArgs {
    pub doc: PathBuf,
    #[arg(required = true, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub pairs: Vec<(String, String)>,
}

#[derive(Args)]
pub struct UnsetArgs {
    pub doc: PathBuf,
    #[arg(required = true)]
    pub keys: Vec<String>,
}

#[derive(Args)]
pub struct DocArgs {
    pub doc: PathBuf,
}

#[derive(Args)]
pub struct ValueArgs {
    pub doc: PathBuf,
    pub entry_type: String,
}

#[derive(Args)]
pub struct ProfileArgs {}

pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{s}`")),
    }
}
