//! Built-in tool catalog and installed-state checks.

#![allow(missing_docs)]

use std::collections::{BTreeMap, HashSet};

use crate::core::errors::{DevkitError, Result};
use crate::platform::pkg::{ManagerKind, Package};

/// An installable developer tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tool {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Package names per manager. A manager missing here cannot install the tool.
    pub packages: &'static [(ManagerKind, &'static [&'static str])],
}

impl Tool {
    /// Packages that install this tool with `manager`.
    #[must_use]
    pub fn packages_for(&self, manager: ManagerKind) -> Option<&'static [&'static str]> {
        self.packages
            .iter()
            .find(|(kind, _)| *kind == manager)
            .map(|(_, pkgs)| *pkgs)
    }

    /// Installed when every package for `manager` appears in `installed`.
    #[must_use]
    pub fn is_installed(&self, manager: ManagerKind, installed: &HashSet<String>) -> bool {
        self.packages_for(manager)
            .is_some_and(|pkgs| !pkgs.is_empty() && pkgs.iter().all(|p| installed.contains(*p)))
    }
}

use ManagerKind::{Apt, Brew, Dnf, Pacman};

const TOOLS: &[Tool] = &[
    Tool {
        id: "git",
        name: "Git",
        description: "Distributed version control",
        packages: &[(Apt, &["git"]), (Dnf, &["git"]), (Pacman, &["git"]), (Brew, &["git"])],
    },
    Tool {
        id: "zsh",
        name: "Zsh",
        description: "Interactive shell with rich completion",
        packages: &[(Apt, &["zsh"]), (Dnf, &["zsh"]), (Pacman, &["zsh"]), (Brew, &["zsh"])],
    },
    Tool {
        id: "neovim",
        name: "Neovim",
        description: "Extensible modal text editor",
        packages: &[
            (Apt, &["neovim"]),
            (Dnf, &["neovim"]),
            (Pacman, &["neovim"]),
            (Brew, &["neovim"]),
        ],
    },
    Tool {
        id: "tmux",
        name: "tmux",
        description: "Terminal multiplexer",
        packages: &[(Apt, &["tmux"]), (Dnf, &["tmux"]), (Pacman, &["tmux"]), (Brew, &["tmux"])],
    },
    Tool {
        id: "ripgrep",
        name: "ripgrep",
        description: "Recursive regex search",
        packages: &[
            (Apt, &["ripgrep"]),
            (Dnf, &["ripgrep"]),
            (Pacman, &["ripgrep"]),
            (Brew, &["ripgrep"]),
        ],
    },
    Tool {
        id: "fd",
        name: "fd",
        description: "Fast, friendly alternative to find",
        packages: &[(Apt, &["fd-find"]), (Dnf, &["fd-find"]), (Pacman, &["fd"]), (Brew, &["fd"])],
    },
    Tool {
        id: "fzf",
        name: "fzf",
        description: "Command-line fuzzy finder",
        packages: &[(Apt, &["fzf"]), (Dnf, &["fzf"]), (Pacman, &["fzf"]), (Brew, &["fzf"])],
    },
    Tool {
        id: "bat",
        name: "bat",
        description: "cat with syntax highlighting",
        packages: &[(Apt, &["bat"]), (Dnf, &["bat"]), (Pacman, &["bat"]), (Brew, &["bat"])],
    },
    Tool {
        id: "jq",
        name: "jq",
        description: "JSON processor",
        packages: &[(Apt, &["jq"]), (Dnf, &["jq"]), (Pacman, &["jq"]), (Brew, &["jq"])],
    },
    Tool {
        id: "btop",
        name: "btop",
        description: "Resource monitor",
        packages: &[(Apt, &["btop"]), (Dnf, &["btop"]), (Pacman, &["btop"]), (Brew, &["btop"])],
    },
    Tool {
        id: "starship",
        name: "Starship",
        description: "Cross-shell prompt",
        packages: &[(Dnf, &["starship"]), (Pacman, &["starship"]), (Brew, &["starship"])],
    },
    Tool {
        id: "lazygit",
        name: "lazygit",
        description: "Terminal UI for git",
        packages: &[(Pacman, &["lazygit"]), (Brew, &["lazygit"])],
    },
    Tool {
        id: "gh",
        name: "GitHub CLI",
        description: "GitHub from the command line",
        packages: &[(Apt, &["gh"]), (Dnf, &["gh"]), (Pacman, &["github-cli"]), (Brew, &["gh"])],
    },
];

/// Catalog of installable tools.
#[derive(Debug, Clone, Copy)]
pub struct ToolRegistry {
    tools: &'static [Tool],
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ToolRegistry {
    #[must_use]
    pub const fn builtin() -> Self {
        Self { tools: TOOLS }
    }

    #[must_use]
    pub const fn all(&self) -> &'static [Tool] {
        self.tools
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, id: &str) -> Result<&'static Tool> {
        self.tools
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| DevkitError::UnknownTool { id: id.to_string() })
    }

    /// Map a batch package listing onto tool ids.
    #[must_use]
    pub fn installed_map(&self, manager: ManagerKind, packages: &[Package]) -> BTreeMap<String, bool> {
        let names: HashSet<String> = packages.iter().map(|p| p.name.clone()).collect();
        self.tools
            .iter()
            .map(|tool| (tool.id.to_string(), tool.is_installed(manager, &names)))
            .collect()
    }
}
