use clap::{Parser, Subcommand};

use crate::schemas::settings::Strategy;

/// Defines the command-line interface (CLI) for 'setup-devkit'.
#[derive(Parser)]
#[command(name = "setup-devkit")]
#[command(version, about = "Provision a C/C++, Python, Java and editor toolchain in one run", long_about = None)]
pub struct Cli {
    /// Enables detailed debug output for troubleshooting.
    #[arg(short, long, global = true)]
    pub(crate) debug: bool,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Installs the selected tools and updates PATH (and JAVA_HOME).
    Install {
        /// Selection such as "1,3", "jdk,code" or "all". Prompts when omitted.
        #[arg(long, short)]
        select: Option<String>,
        /// How the selected tools are scheduled. Overrides the config file.
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
        /// Optional path to a custom config.yaml.
        #[arg(long, env = "SETUP_DEVKIT_CONFIG")]
        config: Option<String>,
        /// Keep environment changes in memory instead of writing the profile.
        #[arg(long)]
        dry_run: bool,
    },
    /// Lists the installable tools and where they are downloaded from.
    List {
        /// Optional path to a custom config.yaml.
        #[arg(long, env = "SETUP_DEVKIT_CONFIG")]
        config: Option<String>,
    },
}
