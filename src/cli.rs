//! CLI argument parsing for the relink resolver.
//!
//! The CLI is a thin preview/report surface over the engine: it loads a
//! mapping pack and an asset list, runs resolution, and exports the report.
//! Real host integrations implement the engine's sink trait instead.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "relinker",
    version,
    about = "Resolve media asset names to replacement targets via mapping rules",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a mapping pack and report every schema violation
    CheckPack(CheckPackArgs),
    /// Resolve an asset list against a mapping pack and export the report
    Resolve(ResolveArgs),
}

#[derive(Parser, Debug)]
pub struct CheckPackArgs {
    /// Path to the mapping pack JSON
    #[arg(long, value_name = "FILE")]
    pub pack: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Path to the mapping pack JSON
    #[arg(long, value_name = "FILE")]
    pub pack: PathBuf,

    /// Path to the asset list JSON (array of {name, resolution?, transform_flags?})
    #[arg(long, value_name = "FILE")]
    pub assets: PathBuf,

    /// Record actions as committed instead of dry-run
    #[arg(long)]
    pub apply: bool,

    /// Output path for the structured JSON report
    #[arg(long, value_name = "PATH")]
    pub out_json: Option<PathBuf>,

    /// Output path for the flat CSV report
    #[arg(long, value_name = "PATH")]
    pub out_csv: Option<PathBuf>,

    /// Output path for the rendered HTML report
    #[arg(long, value_name = "PATH")]
    pub out_html: Option<PathBuf>,

    /// Output path for the recorded transaction action log
    #[arg(long, value_name = "PATH")]
    pub out_actions: Option<PathBuf>,
}
