// Register application subcommands.
// Each module corresponds to a specific `setup-devkit` command-line action.

// Resolves the selection and runs the orchestrator.
pub mod install;
// Prints the tool table with the effective download URLs.
pub mod list;
