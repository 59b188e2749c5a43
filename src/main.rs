use anyhow::Result;
use clap::Parser;
use dash_enhance::apply::{run_apply, run_plan};
use dash_enhance::cli::{Command, RootArgs};
use dash_enhance::config;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(verbose_for(&args.command));

    match args.command {
        Command::Apply(args) => run_apply(&args),
        Command::Plan(args) => run_plan(&args),
        Command::Config => {
            println!("{}", config::table_stub());
            Ok(())
        }
    }
}

fn verbose_for(command: &Command) -> bool {
    match command {
        Command::Apply(args) => args.verbose,
        Command::Plan(args) => args.verbose,
        Command::Config => false,
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
