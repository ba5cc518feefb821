// This file contains the logic for the `setup-devkit install` command.
// It loads the configuration, resolves the tool selection (prompting for it
// when `--select` is absent), wires the real collaborators into an
// `InstallContext` and hands everything to the orchestrator.

use anyhow::Context;
use colored::Colorize;
use dialoguer::Input;
use std::sync::Arc;

use crate::installers::jdk::JAVA_HOME;
use crate::installers::{InstallContext, default_registry};
use crate::libs::config_loading::load_settings;
use crate::libs::environment::{
    EnvMutator, EnvironmentStore, MemoryEnvStore, PATH_VAR, ProfileEnvStore, UserEnvStore,
};
use crate::libs::fetch::HttpFetcher;
use crate::libs::orchestrator::Orchestrator;
use crate::libs::process::SystemRunner;
use crate::libs::progress::ConsoleReporter;
use crate::libs::selection;
use crate::libs::utilities::misc_utils::expand_tilde;
use crate::schemas::settings::{Settings, Strategy};
use crate::schemas::tools::ToolId;
use crate::{log_debug, log_info, log_warn};

/// Main entry point for the `install` command.
///
/// Only configuration and prompt problems are returned as errors. Once the
/// orchestrator runs, every tool failure is part of the printed summary.
pub fn run(
    select: Option<String>,
    strategy: Option<Strategy>,
    config: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    log_debug!("[Devkit::Install] Entered install::run()");
    let settings = load_settings(config.as_deref())?;
    let strategy = strategy.unwrap_or(settings.strategy);

    let raw = match select {
        Some(raw) => raw,
        None => prompt_for_selection()?,
    };
    let selection = selection::resolve(&raw);
    if selection.is_empty() {
        log_warn!(
            "[Devkit::Install] '{}' did not match any tool. Nothing to install.",
            raw.yellow()
        );
    }

    if dry_run {
        log_info!(
            "[Devkit::Install] {} PATH and {} changes stay in memory.",
            "Dry run:".bold(),
            JAVA_HOME
        );
    }
    let (store, hint) = environment_store(&settings, dry_run);
    let context = Arc::new(build_context(&settings, store));

    let orchestrator = Orchestrator::new(
        default_registry(&settings.tools),
        Arc::clone(&context),
        strategy,
        settings.poll_interval(),
    );
    let report = orchestrator.run(&selection, &mut ConsoleReporter::new());
    report.print_summary();

    if report.succeeded() > 0 {
        match hint {
            Some(hint) => println!("\n{}", hint),
            None => print_pending_environment(&context.env),
        }
    }
    Ok(())
}

/// Picks where PATH and JAVA_HOME end up, together with the line telling the
/// user how to pick them up. `None` means the changes are not persisted.
pub fn environment_store(settings: &Settings, dry_run: bool) -> (Arc<dyn EnvironmentStore>, Option<String>) {
    if dry_run {
        (Arc::new(MemoryEnvStore::default()), None)
    } else if cfg!(windows) {
        let hint = "Open a new terminal to pick up the new tools.".to_string();
        (Arc::new(UserEnvStore::new()), Some(hint))
    } else {
        let profile = ProfileEnvStore::new(expand_tilde(&settings.env_file));
        let hint = format!(
            "Open a new shell or run `{}` to pick up the new tools.",
            format!("source {}", profile.path().display()).cyan()
        );
        (Arc::new(profile), Some(hint))
    }
}

/// Wires the production fetcher and process runner to `store`.
pub fn build_context(settings: &Settings, store: Arc<dyn EnvironmentStore>) -> InstallContext {
    InstallContext::new(
        expand_tilde(&settings.install_root),
        expand_tilde(&settings.work_dir),
        Arc::new(HttpFetcher::new(
            settings.fetch_timeout(),
            settings.fetch_retries,
            settings.retry_backoff(),
        )),
        Arc::new(SystemRunner),
        EnvMutator::new(store),
    )
}

/// The numbered selection menu, one line per entry.
pub fn menu_lines() -> Vec<String> {
    let mut lines: Vec<String> = ToolId::ALL
        .iter()
        .map(|tool| format!("  {}. {}", tool.menu_number(), tool.display_name()))
        .collect();
    lines.push(format!("  {}. All of the above", ToolId::ALL.len() + 1));
    lines
}

fn prompt_for_selection() -> anyhow::Result<String> {
    println!("{}", "Which tools should be installed?".bold());
    for line in menu_lines() {
        println!("{}", line);
    }
    let answer: String = Input::new()
        .with_prompt("Selection (e.g. 1,3 or all)")
        .interact_text()
        .context("reading the tool selection")?;
    Ok(answer)
}

fn print_pending_environment(env: &EnvMutator) {
    println!("\n{}", "Environment changes (not written):".bold());
    for name in [PATH_VAR, JAVA_HOME] {
        if let Ok(Some(value)) = env.read(name) {
            println!("  {}={}", name, value);
        }
    }
}
