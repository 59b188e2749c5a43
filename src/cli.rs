//! CLI argument parsing for the dashboard enhancer.
//!
//! The CLI is intentionally thin: it routes to the apply/plan routines
//! without embedding policy, so the same core logic is reusable from tests.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "dashen",
    version,
    about = "Batch enhancer for Grafana dashboard definitions",
    after_help = "Commands:\n  apply --dashboards-dir <DIR>   Inject variables, links, annotations, and query filters\n  plan --dashboards-dir <DIR>    Report which dashboards would change, write nothing\n  config                         Print the builtin enhancement table as JSON\n\nExamples:\n  dashen apply --dashboards-dir grafana/dashboards\n  dashen apply --dashboards-dir grafana/dashboards --only database.json\n  dashen plan --dashboards-dir grafana/dashboards\n  dashen config > enhancements.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Apply(ApplyArgs),
    Plan(PlanArgs),
    /// Print the builtin enhancement table as JSON
    Config,
}

/// Apply command inputs.
#[derive(Parser, Debug)]
#[command(about = "Enhance dashboard files in place")]
pub struct ApplyArgs {
    /// Directory containing the dashboard JSON files
    #[arg(long, value_name = "DIR")]
    pub dashboards_dir: PathBuf,

    /// Enhancement table override (JSON, same shape as `dashen config`)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Restrict the run to the named dashboard files
    #[arg(long, value_name = "FILE")]
    pub only: Vec<String>,

    /// Emit a verbose transcript of the run
    #[arg(long)]
    pub verbose: bool,
}

/// Plan command inputs: same selection as apply, nothing written.
#[derive(Parser, Debug)]
#[command(about = "Report which dashboards would change without writing")]
pub struct PlanArgs {
    /// Directory containing the dashboard JSON files
    #[arg(long, value_name = "DIR")]
    pub dashboards_dir: PathBuf,

    /// Enhancement table override (JSON, same shape as `dashen config`)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Restrict the run to the named dashboard files
    #[arg(long, value_name = "FILE")]
    pub only: Vec<String>,

    /// Emit a verbose transcript of the run
    #[arg(long)]
    pub verbose: bool,
}
