//! Configuration targets and their editable fields.

#![allow(missing_docs)]

use std::fmt;

/// A tool whose settings the console can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigTarget {
    Git,
    Shell,
    Editor,
    Tmux,
    Prompt,
    Terminal,
    Fonts,
    Ssh,
}

impl ConfigTarget {
    pub const ALL: [Self; 8] = [
        Self::Git,
        Self::Shell,
        Self::Editor,
        Self::Tmux,
        Self::Prompt,
        Self::Terminal,
        Self::Fonts,
        Self::Ssh,
    ];

    /// Key used in the `[tools]` config table.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Shell => "shell",
            Self::Editor => "editor",
            Self::Tmux => "tmux",
            Self::Prompt => "prompt",
            Self::Terminal => "terminal",
            Self::Fonts => "fonts",
            Self::Ssh => "ssh",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Git => "Git",
            Self::Shell => "Shell",
            Self::Editor => "Editor",
            Self::Tmux => "tmux",
            Self::Prompt => "Prompt",
            Self::Terminal => "Terminal",
            Self::Fonts => "Fonts",
            Self::Ssh => "SSH",
        }
    }

    #[must_use]
    pub const fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Git => GIT_FIELDS,
            Self::Shell => SHELL_FIELDS,
            Self::Editor => EDITOR_FIELDS,
            Self::Tmux => TMUX_FIELDS,
            Self::Prompt => PROMPT_FIELDS,
            Self::Terminal => TERMINAL_FIELDS,
            Self::Fonts => FONT_FIELDS,
            Self::Ssh => SSH_FIELDS,
        }
    }
}

impl fmt::Display for ConfigTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// How a field's value is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, edited inline.
    Text,
    Number { min: i64, max: i64, step: i64 },
    Choice(&'static [&'static str]),
    Toggle,
}

impl FieldKind {
    /// Step the value by `direction` (negative = decrement). `None` for text fields.
    ///
    /// Numbers clamp to their range, choices wrap, toggles flip.
    #[must_use]
    pub fn step(self, current: &str, direction: i64) -> Option<String> {
        match self {
            Self::Text => None,
            Self::Number { min, max, step } => {
                let value = current.trim().parse::<i64>().unwrap_or(min);
                let next = value.saturating_add(direction.signum().saturating_mul(step));
                Some(next.clamp(min, max).to_string())
            }
            Self::Choice(options) => {
                if options.is_empty() {
                    return None;
                }
                let len = options.len();
                let idx = options.iter().position(|o| *o == current).unwrap_or(0);
                let next = if direction < 0 {
                    (idx + len - 1) % len
                } else {
                    (idx + 1) % len
                };
                Some(options[next].to_string())
            }
            Self::Toggle => Some(if current == "true" { "false" } else { "true" }.to_string()),
        }
    }

    #[must_use]
    pub const fn is_steppable(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// One editable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default: &'static str,
}

const fn text(key: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Text,
        default,
    }
}

const fn toggle(key: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Toggle,
        default,
    }
}

const fn choice(
    key: &'static str,
    label: &'static str,
    options: &'static [&'static str],
    default: &'static str,
) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Choice(options),
        default,
    }
}

const fn number(
    key: &'static str,
    label: &'static str,
    (min, max, step): (i64, i64, i64),
    default: &'static str,
) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Number { min, max, step },
        default,
    }
}

const GIT_FIELDS: &[FieldSpec] = &[
    text("user.name", "User name", ""),
    text("user.email", "User email", ""),
    choice("init.defaultBranch", "Default branch", &["main", "master", "trunk"], "main"),
    toggle("pull.rebase", "Rebase on pull", "true"),
    text("core.editor", "Editor", "nvim"),
];

const SHELL_FIELDS: &[FieldSpec] = &[
    choice("default", "Default shell", &["zsh", "bash", "fish"], "zsh"),
    number("history_size", "History size", (1000, 100_000, 1000), "10000"),
    toggle("aliases", "Install aliases", "true"),
];

const EDITOR_FIELDS: &[FieldSpec] = &[
    number("tab_width", "Tab width", (2, 8, 1), "4"),
    choice("line_numbers", "Line numbers", &["relative", "absolute", "off"], "relative"),
    text("colorscheme", "Color scheme", "habamax"),
    toggle("format_on_save", "Format on save", "true"),
];

const TMUX_FIELDS: &[FieldSpec] = &[
    choice("prefix", "Prefix key", &["C-a", "C-b", "C-Space"], "C-a"),
    toggle("mouse", "Mouse support", "true"),
    number("history_limit", "Scrollback lines", (1000, 100_000, 5000), "50000"),
    choice("status_position", "Status bar", &["bottom", "top"], "bottom"),
];

const PROMPT_FIELDS: &[FieldSpec] = &[
    choice("style", "Style", &["minimal", "full", "powerline"], "minimal"),
    toggle("git_status", "Show git status", "true"),
    toggle("time", "Show time", "false"),
];

const TERMINAL_FIELDS: &[FieldSpec] = &[
    number("font_size", "Font size", (8, 24, 1), "13"),
    number("opacity", "Opacity %", (50, 100, 5), "100"),
    choice("cursor", "Cursor shape", &["block", "beam", "underline"], "block"),
];

const FONT_FIELDS: &[FieldSpec] = &[
    choice(
        "family",
        "Nerd font",
        &["JetBrainsMono", "FiraCode", "Hack", "Meslo"],
        "JetBrainsMono",
    ),
    toggle("ligatures", "Ligatures", "true"),
];

const SSH_FIELDS: &[FieldSpec] = &[
    choice("key_type", "Key type", &["ed25519", "rsa"], "ed25519"),
    text("comment", "Key comment", ""),
    toggle("agent", "Add to agent", "true"),
];
