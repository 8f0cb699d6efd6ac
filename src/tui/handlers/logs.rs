//! Full-screen view of the operation log.

use crossterm::event::KeyCode;
use ratatui::Frame;

use super::{EventResult, ScreenEvent, ScreenHandler};
use crate::tui::model::{AppModel, Cmd, NotificationLevel, Screen};
use crate::tui::theme::{RenderContext, SemanticToken};
use crate::tui::widgets;

pub struct LogsHandler;

fn page(model: &AppModel) -> isize {
    let rows = widgets::log_viewport(Screen::Logs, model.layout().body).height;
    isize::try_from(rows.max(1)).unwrap_or(1)
}

impl ScreenHandler for LogsHandler {
    fn identify(&self) -> Screen {
        Screen::Logs
    }

    fn initialize(&self, _model: &mut AppModel) -> Cmd {
        Cmd::None
    }

    fn update(&self, model: &mut AppModel, event: &ScreenEvent<'_>) -> EventResult {
        match *event {
            ScreenEvent::Key(key) => {
                match key.code {
                    KeyCode::Up | KeyCode::Char('k') => model.log.scroll(1),
                    KeyCode::Down | KeyCode::Char('j') => model.log.scroll(-1),
                    KeyCode::PageUp => model.log.scroll(page(model)),
                    KeyCode::PageDown => model.log.scroll(-page(model)),
                    KeyCode::Home => model.log.scroll_to_top(),
                    KeyCode::End => model.log.scroll_to_bottom(),
                    KeyCode::Char('c') => {
                        if model.ops.is_busy() {
                            model.notify(NotificationLevel::Warning, "cannot clear the log while an operation runs");
                        } else {
                            model.log.clear();
                        }
                    }
                    _ => return EventResult::Ignored,
                }
                EventResult::consumed()
            }
            // Wheel up (negative) reveals older lines.
            ScreenEvent::Wheel { delta, .. } => {
                model.log.scroll(-delta);
                EventResult::consumed()
            }
            ScreenEvent::Click { .. } => EventResult::consumed(),
        }
    }

    fn render(&self, model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
        let body = model.layout().body;
        let title = format!(
            "Operation log  {}/{} lines{}",
            model.log.len(),
            model.log.capacity(),
            if model.log.auto_scroll() { "" } else { "  (paused)" }
        );
        if model.log.is_empty() {
            let empty = [("(no output yet)".to_string(), SemanticToken::Muted)];
            widgets::draw_panel(frame, body, &title, &empty, ctx);
            return;
        }
        widgets::draw_panel(frame, body, &title, &[], ctx);
        widgets::draw_log(frame, widgets::log_viewport(Screen::Logs, body), &model.log, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crossterm::event::{KeyEvent, KeyModifiers};

    #[test]
    fn wheel_up_scrolls_toward_older_lines() {
        let mut model = AppModel::new(Config::default(), (100, 30));
        model.log.set_visible(5);
        for i in 0..20 {
            model.log.append(format!("L{i}"));
        }
        let handler = LogsHandler;
        handler.update(&mut model, &ScreenEvent::Wheel { col: 1, row: 8, delta: -3 });
        assert_eq!(model.log.scroll_offset(), 3);
        assert!(!model.log.auto_scroll());
        let end = KeyEvent::new(KeyCode::End, KeyModifiers::NONE);
        handler.update(&mut model, &ScreenEvent::Key(&end));
        assert_eq!(model.log.scroll_offset(), 0);
    }

    #[test]
    fn detached_log_shows_newer_marker() {
        let mut model = AppModel::new(Config::default(), (100, 30));
        model.nav.navigate(Screen::Logs);
        let rect = widgets::log_viewport(Screen::Logs, model.layout().body);
        model.log.set_visible(usize::from(rect.height));
        for i in 0..60 {
            model.log.append(format!("line-{i:02}"));
        }
        model.log.scroll(4);
        let rows = crate::tui::render::draw_rows(100, 30, |frame| {
            crate::tui::render::render(&model, frame);
        });
        let bottom = usize::from(rect.bottom() - 1);
        assert!(rows[bottom].contains("\u{2191} 4 newer"), "row was {:?}", rows[bottom]);
        assert!(!rows.iter().any(|row| row.contains("line-59")));
    }

    #[test]
    fn empty_log_says_so() {
        let mut model = AppModel::new(Config::default(), (100, 30));
        model.nav.navigate(Screen::Logs);
        let rows = crate::tui::render::draw_rows(100, 30, |frame| {
            crate::tui::render::render(&model, frame);
        });
        assert!(rows.iter().any(|row| row.contains("(no output yet)")));
    }
}
