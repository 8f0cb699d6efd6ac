//! Semantic palette and the render context threaded through every draw call.
//!
//! The palette is an immutable value chosen when the theme changes; render
//! functions only ever see it through [`RenderContext`].

#![allow(missing_docs)]

use std::env;

use ratatui::style::{Color, Modifier, Style};

use crate::core::config::ThemeName;

/// Semantic token category independent of concrete color codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticToken {
    Accent,
    Success,
    Warning,
    Danger,
    Muted,
    Neutral,
    Selection,
}

/// Concrete colors for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub token: SemanticToken,
    pub fg: Color,
    pub bg: Color,
}

impl PaletteEntry {
    const fn fg(token: SemanticToken, fg: Color) -> Self {
        Self {
            token,
            fg,
            bg: Color::Reset,
        }
    }

    /// Cell style for this entry. A selection without a background falls
    /// back to reverse video.
    #[must_use]
    pub fn style(self) -> Style {
        let style = Style::default().fg(self.fg).bg(self.bg);
        if self.token == SemanticToken::Selection && self.bg == Color::Reset {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        }
    }
}

/// Shared semantic palette for all screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePalette {
    pub name: ThemeName,
    pub accent: PaletteEntry,
    pub success: PaletteEntry,
    pub warning: PaletteEntry,
    pub danger: PaletteEntry,
    pub muted: PaletteEntry,
    pub neutral: PaletteEntry,
    pub selection: PaletteEntry,
}

impl ThemePalette {
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            name: ThemeName::Default,
            accent: PaletteEntry::fg(SemanticToken::Accent, Color::Cyan),
            success: PaletteEntry::fg(SemanticToken::Success, Color::Green),
            warning: PaletteEntry::fg(SemanticToken::Warning, Color::Yellow),
            danger: PaletteEntry::fg(SemanticToken::Danger, Color::Red),
            muted: PaletteEntry::fg(SemanticToken::Muted, Color::DarkGray),
            neutral: PaletteEntry::fg(SemanticToken::Neutral, Color::Reset),
            selection: PaletteEntry {
                token: SemanticToken::Selection,
                fg: Color::Black,
                bg: Color::Cyan,
            },
        }
    }

    #[must_use]
    pub const fn high_contrast() -> Self {
        Self {
            name: ThemeName::HighContrast,
            accent: PaletteEntry::fg(SemanticToken::Accent, Color::White),
            success: PaletteEntry::fg(SemanticToken::Success, Color::Green),
            warning: PaletteEntry::fg(SemanticToken::Warning, Color::Yellow),
            danger: PaletteEntry::fg(SemanticToken::Danger, Color::Red),
            muted: PaletteEntry::fg(SemanticToken::Muted, Color::Gray),
            neutral: PaletteEntry::fg(SemanticToken::Neutral, Color::White),
            selection: PaletteEntry {
                token: SemanticToken::Selection,
                fg: Color::Black,
                bg: Color::Yellow,
            },
        }
    }

    /// No colors at all; selection is conveyed by reverse video.
    #[must_use]
    pub const fn mono() -> Self {
        Self {
            name: ThemeName::Mono,
            accent: PaletteEntry::fg(SemanticToken::Accent, Color::Reset),
            success: PaletteEntry::fg(SemanticToken::Success, Color::Reset),
            warning: PaletteEntry::fg(SemanticToken::Warning, Color::Reset),
            danger: PaletteEntry::fg(SemanticToken::Danger, Color::Reset),
            muted: PaletteEntry::fg(SemanticToken::Muted, Color::Reset),
            neutral: PaletteEntry::fg(SemanticToken::Neutral, Color::Reset),
            selection: PaletteEntry::fg(SemanticToken::Selection, Color::Reset),
        }
    }

    #[must_use]
    pub const fn for_theme(name: ThemeName) -> Self {
        match name {
            ThemeName::Default => Self::standard(),
            ThemeName::HighContrast => Self::high_contrast(),
            ThemeName::Mono => Self::mono(),
        }
    }

    /// Palette for `name`, forced to mono when `NO_COLOR` is set.
    #[must_use]
    pub fn from_environment(name: ThemeName) -> Self {
        if env::var_os("NO_COLOR").is_some() {
            Self::mono()
        } else {
            Self::for_theme(name)
        }
    }

    #[must_use]
    pub const fn entry(&self, token: SemanticToken) -> PaletteEntry {
        match token {
            SemanticToken::Accent => self.accent,
            SemanticToken::Success => self.success,
            SemanticToken::Warning => self.warning,
            SemanticToken::Danger => self.danger,
            SemanticToken::Muted => self.muted,
            SemanticToken::Neutral => self.neutral,
            SemanticToken::Selection => self.selection,
        }
    }
}

impl Default for ThemePalette {
    fn default() -> Self {
        Self::standard()
    }
}

/// Immutable inputs shared by every render function for one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub palette: &'a ThemePalette,
    pub tick: u64,
}

impl<'a> RenderContext<'a> {
    #[must_use]
    pub const fn new(palette: &'a ThemePalette, tick: u64) -> Self {
        Self { palette, tick }
    }

    /// Braille spinner frame for busy indicators.
    #[must_use]
    pub fn spinner(&self) -> char {
        const FRAMES: [char; 8] = ['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];
        FRAMES[usize::try_from(self.tick % 8).unwrap_or(0)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_names_map_to_palettes() {
        for name in ThemeName::ALL {
            assert_eq!(ThemePalette::for_theme(name).name, name);
        }
    }

    #[test]
    fn mono_has_no_colors() {
        let p = ThemePalette::mono();
        assert_eq!(p.accent.fg, Color::Reset);
        assert_eq!(p.selection.bg, Color::Reset);
    }

    #[test]
    fn mono_selection_uses_reverse_video() {
        let style = ThemePalette::mono().selection.style();
        assert!(style.add_modifier.contains(Modifier::REVERSED));
        let style = ThemePalette::standard().selection.style();
        assert_eq!(style.bg, Some(Color::Cyan));
        assert!(!style.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn spinner_cycles() {
        let palette = ThemePalette::standard();
        let a = RenderContext::new(&palette, 0).spinner();
        let b = RenderContext::new(&palette, 8).spinner();
        assert_eq!(a, b);
    }
}
