// Turns the free-form menu answer ("1,3", "jdk, code", "all") into the set of
// tools to install.

use std::collections::BTreeSet;

use crate::log_debug;
use crate::schemas::tools::ToolId;

/// The resolved set of tools. Ordered by `ToolId`, which is also menu order.
pub type Selection = BTreeSet<ToolId>;

/// Tokens that select every tool regardless of what else was typed.
const ALL_TOKENS: [&str; 2] = ["5", "all"];

/// Fixed lookup table: accepted token -> tool.
const TOKEN_TABLE: [(&str, ToolId); 14] = [
    ("1", ToolId::Toolchain),
    ("toolchain", ToolId::Toolchain),
    ("gcc", ToolId::Toolchain),
    ("mingw", ToolId::Toolchain),
    ("2", ToolId::Runtime),
    ("runtime", ToolId::Runtime),
    ("python", ToolId::Runtime),
    ("3", ToolId::Jdk),
    ("jdk", ToolId::Jdk),
    ("java", ToolId::Jdk),
    ("4", ToolId::Editor),
    ("editor", ToolId::Editor),
    ("vscode", ToolId::Editor),
    ("code", ToolId::Editor),
];

/// Resolves raw selection text into a `Selection`.
///
/// Tokens are comma separated, trimmed and matched case-insensitively.
/// Unknown tokens are dropped; an empty result is valid and simply means
/// nothing gets installed.
pub fn resolve(raw: &str) -> Selection {
    let tokens: Vec<String> = raw
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.iter().any(|t| ALL_TOKENS.contains(&t.as_str())) {
        return ToolId::ALL.into_iter().collect();
    }

    tokens
        .iter()
        .filter_map(|token| {
            let found = lookup(token);
            if found.is_none() {
                log_debug!("[Devkit::Selection] Ignoring unrecognized token '{}'", token);
            }
            found
        })
        .collect()
}

fn lookup(token: &str) -> Option<ToolId> {
    TOKEN_TABLE
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, tool)| *tool)
}
