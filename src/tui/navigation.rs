//! Current screen plus back-navigation history.

#![allow(missing_docs)]

use super::model::Screen;

/// Where `navigate_back` lands when the history is empty.
pub const DEFAULT_SCREEN: Screen = Screen::MainMenu;

/// Screen stack. The current screen is never stored in `history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    current: Screen,
    history: Vec<Screen>,
}

impl Navigation {
    #[must_use]
    pub const fn new(initial: Screen) -> Self {
        Self {
            current: initial,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub const fn current(&self) -> Screen {
        self.current
    }

    #[must_use]
    pub fn history(&self) -> &[Screen] {
        &self.history
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Replace the current screen without recording it. Returns whether it changed.
    pub fn navigate(&mut self, screen: Screen) -> bool {
        if screen == self.current {
            return false;
        }
        self.current = screen;
        self.history.retain(|s| *s != screen);
        true
    }

    /// Push the current screen, then switch. Pushing the current screen is a no-op.
    pub fn navigate_with_push(&mut self, screen: Screen) -> bool {
        if screen == self.current {
            return false;
        }
        self.history.retain(|s| *s != screen);
        self.history.push(self.current);
        self.current = screen;
        true
    }

    /// Pop back to the previous screen, or [`DEFAULT_SCREEN`] when empty.
    pub fn navigate_back(&mut self) -> Screen {
        let mut target = DEFAULT_SCREEN;
        while let Some(prev) = self.history.pop() {
            if prev != self.current {
                target = prev;
                break;
            }
        }
        self.current = target;
        self.history.retain(|s| *s != target);
        target
    }

    /// Drop all history (e.g. when the wizard hands over to the main menu).
    pub fn reset(&mut self, screen: Screen) {
        self.current = screen;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::targets::ConfigTarget;

    #[test]
    fn push_then_back_restores_screen_and_depth() {
        let mut nav = Navigation::new(Screen::MainMenu);
        nav.navigate_with_push(Screen::Status);
        let depth = nav.depth();
        nav.navigate_with_push(Screen::Backups);
        assert_eq!(nav.navigate_back(), Screen::Status);
        assert_eq!(nav.depth(), depth);
    }

    #[test]
    fn back_on_empty_history_goes_to_main_menu() {
        let mut nav = Navigation::new(Screen::Welcome);
        assert_eq!(nav.navigate_back(), Screen::MainMenu);
        assert_eq!(nav.current(), Screen::MainMenu);
    }

    #[test]
    fn history_never_contains_current() {
        let mut nav = Navigation::new(Screen::MainMenu);
        nav.navigate_with_push(Screen::Settings);
        nav.navigate_with_push(Screen::Configure(ConfigTarget::Git));
        nav.navigate(Screen::MainMenu);
        assert!(!nav.history().contains(&nav.current()));
        assert!(!nav.navigate_with_push(Screen::MainMenu));
        assert_eq!(nav.navigate_back(), Screen::Settings);
    }

    #[test]
    fn replace_does_not_grow_history() {
        let mut nav = Navigation::new(Screen::Welcome);
        nav.navigate(Screen::PlatformCheck);
        nav.navigate(Screen::ToolSelect);
        assert_eq!(nav.depth(), 0);
    }
}
