//! Registered screen handlers.
//!
//! Screens migrate out of the legacy switch one at a time: a screen with a
//! registered [`ScreenHandler`] is dispatched here, every other screen falls
//! through to [`super::legacy`]. Completion messages never reach handlers;
//! they are applied centrally by [`super::update::update`].

#![allow(missing_docs)]

pub mod backups;
pub mod configure;
pub mod logs;
pub mod profiles;

use std::collections::HashMap;
use std::sync::OnceLock;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;

use super::model::{AppModel, Cmd, Screen};
use super::theme::RenderContext;
use super::viewport::ListState;
use crate::tools::targets::ConfigTarget;

/// Lines moved per mouse-wheel notch.
pub const WHEEL_STEP: isize = 3;

/// Input delivered to the current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenEvent<'a> {
    Key(&'a KeyEvent),
    /// Primary-button press at an absolute cell.
    Click { col: u16, row: u16 },
    /// Wheel at an absolute cell; negative `delta` scrolls up.
    Wheel { col: u16, row: u16, delta: isize },
}

/// Whether the screen consumed an event.
#[derive(Debug)]
pub enum EventResult {
    Consumed(Cmd),
    /// Not handled; the dispatcher applies global bindings.
    Ignored,
}

impl EventResult {
    #[must_use]
    pub const fn consumed() -> Self {
        Self::Consumed(Cmd::None)
    }
}

/// A screen implemented outside the legacy switch.
pub trait ScreenHandler: Send + Sync {
    /// Screen this handler owns.
    fn identify(&self) -> Screen;

    /// Called each time the screen becomes current.
    fn initialize(&self, model: &mut AppModel) -> Cmd;

    fn update(&self, model: &mut AppModel, event: &ScreenEvent<'_>) -> EventResult;

    fn render(&self, model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>);
}

/// Screen → handler lookup.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Screen, Box<dyn ScreenHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, returning any handler it replaced.
    pub fn register(&mut self, handler: Box<dyn ScreenHandler>) -> Option<Box<dyn ScreenHandler>> {
        self.handlers.insert(handler.identify(), handler)
    }

    #[must_use]
    pub fn get(&self, screen: Screen) -> Option<&dyn ScreenHandler> {
        self.handlers.get(&screen).map(Box::as_ref)
    }

    #[must_use]
    pub fn contains(&self, screen: Screen) -> bool {
        self.handlers.contains_key(&screen)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The migrated screens: backups, profiles, logs and one handler per
    /// configuration target.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(backups::BackupsHandler));
        registry.register(Box::new(profiles::ProfilesHandler));
        registry.register(Box::new(logs::LogsHandler));
        for target in ConfigTarget::ALL {
            registry.register(Box::new(configure::ConfigureHandler::new(target)));
        }
        registry
    }
}

/// Process-wide registry used by the dispatcher and the renderer.
pub fn registry() -> &'static HandlerRegistry {
    static REGISTRY: OnceLock<HandlerRegistry> = OnceLock::new();
    REGISTRY.get_or_init(HandlerRegistry::standard)
}

/// Cursor keys shared by every list: arrows, vi keys, home/end and paging.
/// Returns whether the key moved the cursor.
pub fn list_nav_key(state: &mut ListState, key: &KeyEvent, count: usize, visible: usize) -> bool {
    let page = isize::try_from(visible.max(1)).unwrap_or(1);
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => state.move_by(-1, count, visible),
        KeyCode::Down | KeyCode::Char('j') => state.move_by(1, count, visible),
        KeyCode::PageUp => state.move_by(-page, count, visible),
        KeyCode::PageDown => state.move_by(page, count, visible),
        KeyCode::Home => state.first(count, visible),
        KeyCode::End => state.last(count, visible),
        _ => return false,
    }
    true
}
