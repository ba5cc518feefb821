// setup-devkit: provisions a C/C++ toolchain, a Python runtime, a JDK and an
// editor into a private install root and puts them on PATH.

mod cli;
mod commands;
mod installers;
mod libs;
mod logger;
mod schemas;

use clap::Parser;
use cli::cmd_enums::{Cli, Commands};
use commands::{install, list};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.debug);

    match cli.command {
        Commands::Install {
            select,
            strategy,
            config,
            dry_run,
        } => install::run(select, strategy, config, dry_run),
        Commands::List { config } => list::run(config),
    }
}
