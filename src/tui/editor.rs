//! Single-line inline text editor.
//!
//! An [`EditSession`] exists only between `begin` and `commit`/`cancel`. The
//! cursor is measured in code points, never bytes.

#![allow(missing_docs)]

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::model::Screen;
use crate::core::config::{Config, UserProfile};
use crate::tools::targets::ConfigTarget;

/// Editable profile attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Email,
    Editor,
    Shell,
}

impl ProfileField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Email, Self::Editor, Self::Shell];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Editor => "Editor",
            Self::Shell => "Shell",
        }
    }

    fn get(self, profile: &UserProfile) -> &str {
        match self {
            Self::Name => &profile.name,
            Self::Email => &profile.email,
            Self::Editor => &profile.editor,
            Self::Shell => &profile.shell,
        }
    }

    fn slot(self, profile: &mut UserProfile) -> &mut String {
        match self {
            Self::Name => &mut profile.name,
            Self::Email => &mut profile.email,
            Self::Editor => &mut profile.editor,
            Self::Shell => &mut profile.shell,
        }
    }
}

/// The field an edit session writes back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Tool {
        target: ConfigTarget,
        key: &'static str,
    },
    Profile {
        index: usize,
        field: ProfileField,
    },
}

/// Read/write access to editable fields.
pub trait FieldStore {
    fn read_field(&self, target: &EditTarget) -> String;
    fn write_field(&mut self, target: &EditTarget, value: String);
}

impl FieldStore for Config {
    fn read_field(&self, target: &EditTarget) -> String {
        match *target {
            EditTarget::Tool { target, key } => self
                .tool_setting(target.key(), key)
                .map(str::to_string)
                .or_else(|| {
                    target
                        .fields()
                        .iter()
                        .find(|f| f.key == key)
                        .map(|f| f.default.to_string())
                })
                .unwrap_or_default(),
            EditTarget::Profile { index, field } => self
                .profiles
                .get(index)
                .map(|p| field.get(p).to_string())
                .unwrap_or_default(),
        }
    }

    fn write_field(&mut self, target: &EditTarget, value: String) {
        match *target {
            EditTarget::Tool { target, key } => self.set_tool_setting(target.key(), key, value),
            EditTarget::Profile { index, field } => {
                let Some(profile) = self.profiles.get_mut(index) else {
                    return;
                };
                if field == ProfileField::Name
                    && self.active_profile.as_deref() == Some(profile.name.as_str())
                {
                    self.active_profile = Some(value.clone());
                }
                *field.slot(profile) = value;
            }
        }
    }
}

/// Live editing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub target: EditTarget,
    pub owner: Screen,
    text: Vec<char>,
    cursor: usize,
}

impl EditSession {
    #[must_use]
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Result of feeding a key to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKeyOutcome {
    /// Key changed the working text or cursor (or was swallowed).
    Edited,
    Commit,
    Cancel,
    /// No session is active.
    Inactive,
}

/// Inline editor: inactive, or editing one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextEditor {
    session: Option<EditSession>,
}

impl TextEditor {
    #[must_use]
    pub const fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Start editing `target`, replacing any previous session.
    pub fn begin(&mut self, target: EditTarget, owner: Screen, store: &dyn FieldStore) {
        let text: Vec<char> = store.read_field(&target).chars().collect();
        let cursor = text.len();
        self.session = Some(EditSession {
            target,
            owner,
            text,
            cursor,
        });
    }

    pub fn left(&mut self) {
        if let Some(s) = self.session.as_mut() {
            s.cursor = s.cursor.saturating_sub(1);
        }
    }

    pub fn right(&mut self) {
        if let Some(s) = self.session.as_mut() {
            s.cursor = (s.cursor + 1).min(s.text.len());
        }
    }

    pub fn home(&mut self) {
        if let Some(s) = self.session.as_mut() {
            s.cursor = 0;
        }
    }

    pub fn end(&mut self) {
        if let Some(s) = self.session.as_mut() {
            s.cursor = s.text.len();
        }
    }

    /// Splice `input` at the cursor. Input containing a line break is rejected whole.
    pub fn insert(&mut self, input: &str) -> bool {
        let Some(s) = self.session.as_mut() else {
            return false;
        };
        if input.contains(['\n', '\r']) {
            return false;
        }
        let chars: Vec<char> = input.chars().collect();
        let n = chars.len();
        s.text.splice(s.cursor..s.cursor, chars);
        s.cursor += n;
        true
    }

    pub fn backspace(&mut self) {
        if let Some(s) = self.session.as_mut()
            && s.cursor > 0
        {
            s.cursor -= 1;
            s.text.remove(s.cursor);
        }
    }

    pub fn delete(&mut self) {
        if let Some(s) = self.session.as_mut()
            && s.cursor < s.text.len()
        {
            s.text.remove(s.cursor);
        }
    }

    /// Write the working text back and end the session.
    pub fn commit(&mut self, store: &mut dyn FieldStore) -> Option<EditTarget> {
        let session = self.session.take()?;
        store.write_field(&session.target, session.text());
        Some(session.target)
    }

    /// Discard the working text and end the session.
    pub fn cancel(&mut self) -> Option<EditTarget> {
        self.session.take().map(|s| s.target)
    }

    /// Cancel the session unless `current` is its owning screen.
    pub fn retain_for(&mut self, current: Screen) {
        if self.session.as_ref().is_some_and(|s| s.owner != current) {
            self.session = None;
        }
    }

    /// Map a key press onto editor operations.
    pub fn apply_key(&mut self, key: &KeyEvent) -> EditKeyOutcome {
        if self.session.is_none() {
            return EditKeyOutcome::Inactive;
        }
        match key.code {
            KeyCode::Enter => return EditKeyOutcome::Commit,
            KeyCode::Esc => return EditKeyOutcome::Cancel,
            KeyCode::Left => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Home => self.home(),
            KeyCode::End => self.end(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => self.home(),
            KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => self.end(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let mut buf = [0u8; 4];
                self.insert(c.encode_utf8(&mut buf));
            }
            _ => {}
        }
        EditKeyOutcome::Edited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_name() -> EditTarget {
        EditTarget::Tool {
            target: ConfigTarget::Git,
            key: "user.name",
        }
    }

    fn config_with_name(name: &str) -> Config {
        let mut cfg = Config::default();
        cfg.set_tool_setting("git", "user.name", name.to_string());
        cfg
    }

    #[test]
    fn begin_places_cursor_at_end_in_code_points() {
        let cfg = config_with_name("Zo\u{eb} \u{1f980}");
        let mut ed = TextEditor::default();
        ed.begin(git_name(), Screen::Configure(ConfigTarget::Git), &cfg);
        let s = ed.session().unwrap();
        assert_eq!(s.cursor(), 5);
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn cancel_leaves_field_untouched() {
        let mut cfg = config_with_name("dev");
        let before = cfg.clone();
        let mut ed = TextEditor::default();
        ed.begin(git_name(), Screen::Configure(ConfigTarget::Git), &cfg);
        ed.insert("xyz");
        ed.backspace();
        assert_eq!(ed.cancel(), Some(git_name()));
        assert!(!ed.is_active());
        assert_eq!(cfg, before);
        // A commit after cancel is a no-op.
        assert_eq!(ed.commit(&mut cfg), None);
        assert_eq!(cfg, before);
    }

    #[test]
    fn commit_writes_working_text() {
        let mut cfg = config_with_name("ac");
        let mut ed = TextEditor::default();
        ed.begin(git_name(), Screen::Configure(ConfigTarget::Git), &cfg);
        ed.left();
        ed.insert("b");
        ed.end();
        ed.insert("!");
        ed.home();
        ed.delete();
        ed.commit(&mut cfg);
        assert_eq!(cfg.tool_setting("git", "user.name"), Some("bc!"));
    }

    #[test]
    fn boundaries_are_noops() {
        let cfg = config_with_name("");
        let mut ed = TextEditor::default();
        ed.begin(git_name(), Screen::Configure(ConfigTarget::Git), &cfg);
        ed.backspace();
        ed.delete();
        ed.left();
        ed.right();
        let s = ed.session().unwrap();
        assert_eq!((s.cursor(), s.len()), (0, 0));
    }

    #[test]
    fn newlines_are_rejected() {
        let cfg = config_with_name("a");
        let mut ed = TextEditor::default();
        ed.begin(git_name(), Screen::Configure(ConfigTarget::Git), &cfg);
        assert!(!ed.insert("b\nc"));
        assert_eq!(ed.session().unwrap().text(), "a");
    }

    #[test]
    fn missing_value_reads_default() {
        let cfg = Config::default();
        let target = EditTarget::Tool {
            target: ConfigTarget::Git,
            key: "core.editor",
        };
        assert_eq!(cfg.read_field(&target), "nvim");
    }

    #[test]
    fn renaming_active_profile_follows() {
        let mut cfg = Config::default();
        cfg.profiles.push(UserProfile {
            name: "work".into(),
            ..UserProfile::default()
        });
        cfg.active_profile = Some("work".into());
        let target = EditTarget::Profile {
            index: 0,
            field: ProfileField::Name,
        };
        cfg.write_field(&target, "office".into());
        assert_eq!(cfg.active_profile.as_deref(), Some("office"));
    }

    #[test]
    fn session_is_dropped_when_owner_leaves() {
        let cfg = config_with_name("x");
        let mut ed = TextEditor::default();
        ed.begin(git_name(), Screen::Configure(ConfigTarget::Git), &cfg);
        ed.retain_for(Screen::Configure(ConfigTarget::Git));
        assert!(ed.is_active());
        ed.retain_for(Screen::MainMenu);
        assert!(!ed.is_active());
    }
}
