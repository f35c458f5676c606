//! Well-known agent catalog and `PATH` auto-detection.

use crate::config::AgentConfig;

/// A compile-time catalog entry for an ACP-compatible agent.
struct WellKnownAgent {
    name: &'static str,
    display_name: &'static str,
    command: &'static str,
    args: &'static [&'static str],
    description: &'static str,
}

/// The canonical list of known ACP agents.
const WELL_KNOWN_AGENTS: &[WellKnownAgent] = &[
    WellKnownAgent {
        name: "opencode",
        display_name: "OpenCode",
        command: "opencode",
        args: &["acp"],
        description: "OpenCode ACP agent",
    },
    WellKnownAgent {
        name: "codex-acp",
        display_name: "Codex CLI",
        command: "codex-acp",
        args: &[],
        description: "OpenAI Codex CLI with ACP support",
    },
    WellKnownAgent {
        name: "gemini",
        display_name: "Gemini CLI",
        command: "gemini",
        args: &["--acp"],
        description: "Google Gemini CLI with ACP support",
    },
    WellKnownAgent {
        name: "claude-code-acp",
        display_name: "Claude Code",
        command: "claude-code-acp",
        args: &[],
        description: "Anthropic Claude Code with ACP support",
    },
    WellKnownAgent {
        name: "goose",
        display_name: "Goose",
        command: "goose",
        args: &["--acp"],
        description: "Block Goose with ACP support",
    },
    WellKnownAgent {
        name: "kiro",
        display_name: "Kiro",
        command: "kiro",
        args: &["--acp"],
        description: "Kiro with ACP support",
    },
    WellKnownAgent {
        name: "augment",
        display_name: "Augment",
        command: "augment",
        args: &["acp"],
        description: "Augment with ACP support",
    },
];

impl WellKnownAgent {
    fn to_config(&self) -> AgentConfig {
        AgentConfig {
            name: self.name.to_owned(),
            display_name: self.display_name.to_owned(),
            command: self.command.to_owned(),
            args: self.args.iter().map(|&a| a.to_owned()).collect(),
            env: std::collections::HashMap::new(),
            description: self.description.to_owned(),
            auto_detect: true,
        }
    }
}

/// Config entries for every known ACP agent, installed or not.
#[must_use]
pub fn well_known_agents() -> Vec<AgentConfig> {
    WELL_KNOWN_AGENTS.iter().map(WellKnownAgent::to_config).collect()
}

/// Whether `command` resolves to a binary in `PATH`.
#[must_use]
pub fn is_installed(command: &str) -> bool {
    which::which(command).is_ok()
}

/// Config entries for every well-known agent whose binary is in `PATH`.
#[must_use]
pub fn detect_installed() -> Vec<AgentConfig> {
    WELL_KNOWN_AGENTS
        .iter()
        .filter(|wk| is_installed(wk.command))
        .map(WellKnownAgent::to_config)
        .collect()
}
