//! Global key routing and per-screen key hints.
//!
//! Screen handlers see a key first; [`resolve_key_event`] supplies the global
//! fallback for keys a screen leaves unconsumed. `Ctrl-C` is the one key that
//! always resolves before the screen.

#![allow(missing_docs)]

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::model::Screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputContext {
    pub screen: Screen,
    pub editing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// `Ctrl-C`: quit, pre-empting the screen.
    ForceQuit,
    Quit,
    Back,
    Navigate(Screen),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputResolution {
    pub action: Option<InputAction>,
    /// Whether the global layer claims the key before the screen sees it.
    pub preempts: bool,
}

impl InputResolution {
    const fn preempt(action: InputAction) -> Self {
        Self {
            action: Some(action),
            preempts: true,
        }
    }

    const fn fallback(action: InputAction) -> Self {
        Self {
            action: Some(action),
            preempts: false,
        }
    }

    const fn passthrough() -> Self {
        Self {
            action: None,
            preempts: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

const fn bind(keys: &'static str, description: &'static str) -> HelpBinding {
    HelpBinding { keys, description }
}

/// Footer hints while the inline editor is active.
pub const EDITING_HINTS: &[HelpBinding] = &[bind("enter", "save"), bind("esc", "cancel")];

/// Key releases and repeats from enhanced keyboards are not commands.
#[must_use]
pub fn is_press(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press
}

/// Resolve a key against the global bindings.
#[must_use]
pub fn resolve_key_event(key: &KeyEvent, context: InputContext) -> InputResolution {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return InputResolution::preempt(InputAction::ForceQuit);
    }
    if context.editing {
        return InputResolution::passthrough();
    }
    match key.code {
        KeyCode::Char('q') => InputResolution::fallback(InputAction::Quit),
        KeyCode::Esc => InputResolution::fallback(InputAction::Back),
        KeyCode::Char('?') if context.screen != Screen::Help => {
            InputResolution::fallback(InputAction::Navigate(Screen::Help))
        }
        KeyCode::Char('L') if context.screen != Screen::Logs => {
            InputResolution::fallback(InputAction::Navigate(Screen::Logs))
        }
        _ => InputResolution::passthrough(),
    }
}

const INTRO_HINTS: &[HelpBinding] = &[bind("any key", "skip")];
const WELCOME_HINTS: &[HelpBinding] = &[bind("enter", "start setup"), bind("m", "main menu"), bind("q", "quit")];
const PLATFORM_HINTS: &[HelpBinding] = &[bind("enter", "continue"), bind("esc", "back")];
const TOOL_SELECT_HINTS: &[HelpBinding] = &[
    bind("space", "toggle"),
    bind("a", "select missing"),
    bind("enter", "review"),
    bind("esc", "back"),
];
const CONFIRM_HINTS: &[HelpBinding] = &[bind("y/enter", "install"), bind("n/esc", "cancel")];
const PROGRESS_HINTS: &[HelpBinding] = &[bind("↑↓/pgup/pgdn", "scroll log"), bind("end", "newest")];
const SUMMARY_HINTS: &[HelpBinding] = &[bind("enter", "main menu"), bind("L", "log")];
const ERROR_HINTS: &[HelpBinding] = &[bind("r", "retry"), bind("s", "skip"), bind("q", "quit")];
const MENU_HINTS: &[HelpBinding] = &[bind("↑↓", "move"), bind("enter", "open"), bind("?", "help"), bind("q", "quit")];
const STATUS_HINTS: &[HelpBinding] = &[bind("r", "refresh"), bind("esc", "back")];
const UPDATES_HINTS: &[HelpBinding] = &[
    bind("space", "toggle"),
    bind("u", "update selected"),
    bind("A", "update all"),
    bind("r", "recheck"),
];
const BACKUPS_HINTS: &[HelpBinding] = &[
    bind("c", "create"),
    bind("enter", "restore"),
    bind("d", "delete"),
    bind("esc", "back"),
];
const PROFILES_HINTS: &[HelpBinding] = &[
    bind("tab", "switch pane"),
    bind("enter", "edit"),
    bind("n", "new"),
    bind("a", "activate"),
    bind("d", "delete"),
];
const SETTINGS_HINTS: &[HelpBinding] = &[bind("←→", "change"), bind("esc", "back")];
const LOGS_HINTS: &[HelpBinding] = &[bind("↑↓/pgup/pgdn", "scroll"), bind("end", "newest"), bind("c", "clear")];
const BACK_HINTS: &[HelpBinding] = &[bind("esc", "back")];
const CONFIGURE_HINTS: &[HelpBinding] = &[
    bind("tab", "switch pane"),
    bind("←→", "change"),
    bind("enter", "edit"),
    bind("esc", "back"),
];

const GLOBAL_BINDINGS: &[HelpBinding] = &[
    bind("q / ctrl-c", "quit (blocked while a privileged operation runs)"),
    bind("esc", "go back"),
    bind("?", "help"),
    bind("L", "operation log"),
    bind("mouse", "click to select, wheel to scroll"),
];

/// Footer hints for a screen.
#[must_use]
pub const fn screen_hints(screen: Screen) -> &'static [HelpBinding] {
    match screen {
        Screen::Intro => INTRO_HINTS,
        Screen::Welcome => WELCOME_HINTS,
        Screen::PlatformCheck => PLATFORM_HINTS,
        Screen::ToolSelect => TOOL_SELECT_HINTS,
        Screen::ConfirmInstall => CONFIRM_HINTS,
        Screen::Installing | Screen::UpdateProgress => PROGRESS_HINTS,
        Screen::InstallSummary => SUMMARY_HINTS,
        Screen::InstallError => ERROR_HINTS,
        Screen::MainMenu => MENU_HINTS,
        Screen::Status => STATUS_HINTS,
        Screen::Updates => UPDATES_HINTS,
        Screen::Backups => BACKUPS_HINTS,
        Screen::Profiles => PROFILES_HINTS,
        Screen::Settings => SETTINGS_HINTS,
        Screen::Logs => LOGS_HINTS,
        Screen::Help | Screen::About => BACK_HINTS,
        Screen::Configure(_) => CONFIGURE_HINTS,
    }
}

/// Global bindings listed on the help screen.
#[must_use]
pub const fn global_bindings() -> &'static [HelpBinding] {
    GLOBAL_BINDINGS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctx(screen: Screen, editing: bool) -> InputContext {
        InputContext { screen, editing }
    }

    #[test]
    fn ctrl_c_preempts_everything() {
        let k = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let res = resolve_key_event(&k, ctx(Screen::Profiles, true));
        assert_eq!(res.action, Some(InputAction::ForceQuit));
        assert!(res.preempts);
    }

    #[test]
    fn editing_passes_plain_keys_through() {
        let res = resolve_key_event(&key(KeyCode::Char('q')), ctx(Screen::Profiles, true));
        assert_eq!(res.action, None);
    }

    #[test]
    fn globals_are_fallbacks() {
        let res = resolve_key_event(&key(KeyCode::Char('q')), ctx(Screen::MainMenu, false));
        assert_eq!(res.action, Some(InputAction::Quit));
        assert!(!res.preempts);
        let res = resolve_key_event(&key(KeyCode::Char('?')), ctx(Screen::Help, false));
        assert_eq!(res.action, None);
    }

    #[test]
    fn every_screen_has_hints() {
        for screen in [
            Screen::Intro,
            Screen::Welcome,
            Screen::MainMenu,
            Screen::Updates,
            Screen::Logs,
            Screen::InstallError,
            Screen::Configure(crate::tools::targets::ConfigTarget::ALL[0]),
        ] {
            assert!(!screen_hints(screen).is_empty());
        }
        assert_eq!(global_bindings().len(), 5);
        assert_eq!(screen_hints(Screen::Help), screen_hints(Screen::About));
    }
}
