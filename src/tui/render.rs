//! Top-level screen composition on a ratatui [`Frame`].
//!
//! Rendering is pure: [`render`] paints an [`AppModel`] into the frame the
//! runtime's `Terminal` hands out, and ratatui flushes only the cells that
//! changed since the previous draw.

#![allow(missing_docs)]

use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::handlers;
use super::input::{EDITING_HINTS, screen_hints};
use super::layout::{MIN_USABLE_COLS, MIN_USABLE_ROWS, is_terminal_too_small, rect};
use super::legacy;
use super::model::{AppModel, NotificationLevel, Screen};
use super::theme::{RenderContext, SemanticToken};
use super::widgets::style;

/// Paint the whole console for the current model.
pub fn render(model: &AppModel, frame: &mut Frame) {
    let ctx = RenderContext::new(&model.palette, model.tick);
    let area = frame.area();
    if is_terminal_too_small(area.width, area.height) {
        render_too_small(frame, &ctx);
        return;
    }
    render_header(model, frame, &ctx);
    match handlers::registry().get(model.screen()) {
        Some(handler) => handler.render(model, frame, &ctx),
        None => legacy::render(model, frame, &ctx),
    }
    render_footer(model, frame, &ctx);
}

fn render_too_small(frame: &mut Frame, ctx: &RenderContext<'_>) {
    let area = frame.area();
    let warn = style(ctx, SemanticToken::Warning).add_modifier(Modifier::BOLD);
    let muted = style(ctx, SemanticToken::Muted);
    let need = format!("need {MIN_USABLE_COLS}x{MIN_USABLE_ROWS}, have {}x{}", area.width, area.height);
    let text = vec![Line::styled("Terminal too small", warn), Line::styled(need, muted)];
    let top = (area.height / 2).saturating_sub(1);
    frame.render_widget(Paragraph::new(text), rect(0, top, area.width, area.height - top));
}

fn render_header(model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
    let width = frame.area().width;
    let accent = style(ctx, SemanticToken::Accent).add_modifier(Modifier::BOLD);
    let muted = style(ctx, SemanticToken::Muted);
    let warn = style(ctx, SemanticToken::Warning);
    let screen = model.screen();

    let title = match screen {
        Screen::Configure(target) => format!(" devkit \u{25b8} Configure {}", target.title()),
        other => format!(" devkit \u{25b8} {}", other.title()),
    };
    frame.render_widget(Paragraph::new(Line::styled(title, accent)), rect(0, 0, width, 1));

    let busy = if let Some(running) = model.ops.running() {
        Some(format!("{} {} ", ctx.spinner(), running.kind.label()))
    } else if model.ops.pending().is_some_and(|p| p.awaiting_privilege) {
        Some("awaiting sudo ".to_string())
    } else {
        None
    };
    if let Some(busy) = busy {
        let indicator = Paragraph::new(Line::styled(busy, warn)).alignment(Alignment::Right);
        frame.render_widget(indicator, rect(0, 0, width, 1));
    }

    let manager = model
        .platform
        .info
        .as_ref()
        .and_then(|p| p.manager)
        .or(model.status.manager)
        .map_or_else(|| "no package manager".to_string(), |m| m.label().to_string());
    let profile = model.config.active_profile.as_deref().unwrap_or("no profile");
    let context = Line::styled(format!(" {manager} \u{00b7} {profile}"), muted);
    let rule = Line::styled("\u{2500}".repeat(usize::from(width)), muted);
    frame.render_widget(Paragraph::new(vec![context, rule]), rect(0, 1, width, 2));
}

fn render_footer(model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
    let footer = model.layout().footer;
    if footer.height == 0 {
        return;
    }
    let muted = style(ctx, SemanticToken::Muted);
    let keys = style(ctx, SemanticToken::Accent);

    let hints = if model.editor.is_active() {
        EDITING_HINTS
    } else {
        screen_hints(model.screen())
    };
    let spans: Vec<Span<'_>> = hints
        .iter()
        .flat_map(|hint| {
            [
                Span::styled(hint.keys, keys),
                Span::styled(format!(" {}  ", hint.description), muted),
            ]
        })
        .collect();
    let mut lines = vec![Line::from(spans)];

    if let Some(note) = model.notifications.back() {
        let token = match note.level {
            NotificationLevel::Info => SemanticToken::Success,
            NotificationLevel::Warning => SemanticToken::Warning,
            NotificationLevel::Error => SemanticToken::Danger,
        };
        lines.push(Line::styled(note.message.as_str(), style(ctx, token)));
    }
    let area = rect(footer.x + 1, footer.y, footer.width.saturating_sub(1), footer.height);
    frame.render_widget(Paragraph::new(lines), area);
}

/// Cell symbols of a buffer, one string per row.
#[cfg(test)]
pub(crate) fn buffer_rows(buffer: &ratatui::buffer::Buffer) -> Vec<String> {
    buffer
        .content()
        .chunks(usize::from(buffer.area.width.max(1)))
        .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect())
        .collect()
}

/// Draw once on a `cols`x`rows` test backend and return the rows.
#[cfg(test)]
pub(crate) fn draw_rows(cols: u16, rows: u16, paint: impl FnOnce(&mut Frame)) -> Vec<String> {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    let mut terminal = Terminal::new(TestBackend::new(cols, rows)).expect("test terminal");
    terminal.draw(paint).expect("draw");
    buffer_rows(terminal.backend().buffer())
}
