// Data structures (schemas) for configuration, install recipes and progress.

// Tool identifiers, install recipes and install outcomes.
pub mod tools;
// Per-tool progress and the aggregate concurrent view.
pub mod progress;
// `config.yaml` layout and defaults.
pub mod settings;
