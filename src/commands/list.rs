// `setup-devkit list`: shows what can be installed and where each artifact
// would come from once the configuration overrides are applied.

use colored::Colorize;

use crate::installers::{InstallerRegistry, default_registry};
use crate::libs::config_loading::load_settings;
use crate::libs::utilities::misc_utils::expand_tilde;
use crate::schemas::tools::{InstallMethod, ToolId};

pub fn run(config: Option<String>) -> anyhow::Result<()> {
    let settings = load_settings(config.as_deref())?;
    let registry = default_registry(&settings.tools);

    println!("{}", "Installable tools".bold());
    for line in tool_lines(&registry) {
        println!("{}", line);
    }
    println!(
        "\nInstall root: {}",
        expand_tilde(&settings.install_root).display().to_string().cyan()
    );
    Ok(())
}

/// One block of text per tool: `number. name [id]` followed by its source.
fn tool_lines(registry: &InstallerRegistry) -> Vec<String> {
    let mut lines = Vec::new();
    for tool in ToolId::ALL {
        lines.push(format!("  {}. {} [{}]", tool.menu_number(), tool.display_name(), tool));
        match registry.get(&tool) {
            Some(installer) => {
                let spec = installer.spec();
                let method = match &spec.method {
                    InstallMethod::Archive => "archive",
                    InstallMethod::Installer { .. } => "silent installer",
                    InstallMethod::ExternalExtract { .. } => "external extractor",
                };
                lines.push(format!("       {} ({})", spec.url, method));
                if let Some(prerequisite) = &spec.prerequisite {
                    lines.push(format!("       requires {} from {}", prerequisite.name, prerequisite.url));
                }
            }
            None => lines.push("       (no installer registered)".to_string()),
        }
    }
    lines
}
