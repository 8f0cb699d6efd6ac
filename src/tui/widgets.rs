//! Reusable ratatui compositions shared by the registered handlers and the
//! legacy screens.
//!
//! Every primitive takes its geometry from [`DualPaneLayout`] or a layout
//! [`Rect`] so that mouse hit-testing and drawing never disagree.

#![allow(missing_docs)]

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use super::editor::EditSession;
use super::layout::{
    DETAIL_TITLE_LINES, DualPaneLayout, LIST_TITLE_LINES, PaneFocus, inset, rect, title_band,
};
use super::log_buffer::LogBuffer;
use super::model::Screen;
use super::theme::{RenderContext, SemanticToken};
use super::viewport::ListState;

const SELECTED_MARKER: &str = "\u{25b8} ";
const UNSELECTED_MARKER: &str = "  ";
const MARKER_WIDTH: usize = 2;

/// Style for a semantic token in the active palette.
#[must_use]
pub fn style(ctx: &RenderContext<'_>, token: SemanticToken) -> Style {
    ctx.palette.entry(token).style()
}

fn bordered(border: Style) -> Block<'static> {
    Block::default().borders(Borders::ALL).border_style(border)
}

fn rule(width: u16) -> String {
    "\u{254c}".repeat(usize::from(width))
}

/// `text` cut or padded to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
    let cut: String = text.chars().take(width).collect();
    format!("{cut:<width$}")
}

/// Titles drawn inside the fixed title lines of each pane.
#[derive(Debug, Clone, Copy)]
pub struct PaneTitles<'a> {
    pub list: &'a str,
    pub list_subtitle: &'a str,
    pub detail: &'a str,
}

/// Borders and title lines of both panes. The focused pane gets the accent border.
pub fn draw_dual_pane(
    frame: &mut Frame,
    layout: &DualPaneLayout,
    titles: PaneTitles<'_>,
    focus: PaneFocus,
    ctx: &RenderContext<'_>,
) {
    let accent = style(ctx, SemanticToken::Accent);
    let muted = style(ctx, SemanticToken::Muted);
    let (list_border, detail_border) = match focus {
        PaneFocus::List => (accent, muted),
        PaneFocus::Detail => (muted, accent),
    };
    frame.render_widget(bordered(list_border), layout.list);
    frame.render_widget(bordered(detail_border), layout.detail);

    let heading = accent.add_modifier(Modifier::BOLD);
    let band = title_band(layout.list, LIST_TITLE_LINES);
    let list_titles = Paragraph::new(vec![
        Line::styled(format!(" {}", titles.list), heading),
        Line::styled(format!(" {}", titles.list_subtitle), muted),
        Line::styled(rule(band.width), muted),
    ]);
    frame.render_widget(list_titles, band);

    let band = title_band(layout.detail, DETAIL_TITLE_LINES);
    let detail_titles = Paragraph::new(vec![
        Line::styled(format!(" {}", titles.detail), heading),
        Line::styled(rule(band.width), muted),
    ]);
    frame.render_widget(detail_titles, band);
}

/// One list-pane entry with an optional right-hand badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub label: String,
    pub badge: Option<(String, SemanticToken)>,
}

impl ListRow {
    #[must_use]
    pub fn plain(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            badge: None,
        }
    }

    #[must_use]
    pub fn badged(label: impl Into<String>, badge: impl Into<String>, token: SemanticToken) -> Self {
        Self {
            label: label.into(),
            badge: Some((badge.into(), token)),
        }
    }
}

/// The visible window of `rows` as a ratatui [`List`] over the list content
/// rect, so item `i` lands on `layout.list_row_for(i, scroll)`.
pub fn draw_list(
    frame: &mut Frame,
    layout: &DualPaneLayout,
    rows: &[ListRow],
    state: &ListState,
    focused: bool,
    ctx: &RenderContext<'_>,
) {
    let content = layout.list_content;
    if rows.is_empty() {
        let muted = style(ctx, SemanticToken::Muted);
        frame.render_widget(Paragraph::new(Line::styled(" (empty)", muted)), content);
        return;
    }
    let neutral = style(ctx, SemanticToken::Neutral);
    let selection = style(ctx, SemanticToken::Selection);
    let label_room = usize::from(content.width).saturating_sub(MARKER_WIDTH);

    let items: Vec<ListItem<'_>> = rows
        .iter()
        .enumerate()
        .skip(state.scroll)
        .take(layout.list_visible_rows())
        .map(|(index, item)| {
            let selected = index == state.selected;
            let base = if selected && focused {
                selection
            } else if selected {
                neutral.add_modifier(Modifier::REVERSED)
            } else {
                neutral
            };
            let marker = if selected { SELECTED_MARKER } else { UNSELECTED_MARKER };
            let mut spans = vec![Span::raw(marker)];
            match &item.badge {
                Some((badge, token)) if badge.chars().count() < label_room => {
                    let badge_width = badge.chars().count() + 1;
                    spans.push(Span::raw(fit(&item.label, label_room - badge_width)));
                    let badge_style = if selected { base } else { style(ctx, *token) };
                    spans.push(Span::styled(format!("{badge} "), badge_style));
                }
                _ => spans.push(Span::raw(item.label.as_str())),
            }
            ListItem::new(Line::from(spans)).style(base)
        })
        .collect();
    frame.render_widget(List::new(items), content);
}

/// One editable detail-pane field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRow {
    pub label: String,
    pub value: String,
    pub steppable: bool,
}

/// Working text of `session` with its cursor cell in reverse video, scrolled
/// so the cursor stays inside `width`.
fn editing_line(session: &EditSession, width: usize, base: Style) -> Line<'static> {
    let chars: Vec<char> = session.text().chars().collect();
    let cursor = session.cursor().min(chars.len());
    let start = (cursor + 1).saturating_sub(width).min(cursor);
    let before: String = chars[start..cursor].iter().collect();
    let under = chars.get(cursor).map_or_else(|| " ".to_string(), char::to_string);
    let after: String = chars.iter().skip(cursor + 1).collect();
    Line::from(vec![
        Span::styled(before, base),
        Span::styled(under, base.add_modifier(Modifier::REVERSED)),
        Span::styled(after, base),
    ])
}

/// Fields split across the two halves of the detail content: label on the
/// left, value on the right. The row under edit shows the working text and
/// its cursor instead of the stored value.
pub fn draw_fields(
    frame: &mut Frame,
    layout: &DualPaneLayout,
    rows: &[FieldRow],
    state: &ListState,
    focused: bool,
    editing: Option<&EditSession>,
    ctx: &RenderContext<'_>,
) {
    let content = layout.detail_content;
    let half = content.width / 2;
    let value_width = content.width - half;
    let neutral = style(ctx, SemanticToken::Neutral);
    let muted = style(ctx, SemanticToken::Muted);
    let selection = style(ctx, SemanticToken::Selection);
    for (index, field) in rows.iter().enumerate().skip(state.scroll) {
        let Some(row) = layout.detail_row_for(index, state.scroll) else {
            break;
        };
        let selected = index == state.selected;
        let label_style = if selected && focused { selection } else { muted };
        let label = Paragraph::new(format!(" {}", field.label)).style(label_style);
        frame.render_widget(label, rect(content.x, row, half, 1));

        let value = match editing.filter(|_| selected) {
            Some(session) => editing_line(session, usize::from(value_width), neutral),
            None if field.steppable => Line::styled(format!("\u{25c2} {} \u{25b8}", field.value), neutral),
            None => Line::styled(field.value.clone(), neutral),
        };
        frame.render_widget(Paragraph::new(value), rect(content.x + half, row, value_width, 1));
    }
}

/// Plain lines in the detail pane.
pub fn draw_detail_text(
    frame: &mut Frame,
    layout: &DualPaneLayout,
    lines: &[(String, SemanticToken)],
    scroll: usize,
    ctx: &RenderContext<'_>,
) {
    let content = layout.detail_content;
    let text: Vec<Line<'_>> = lines
        .iter()
        .skip(scroll)
        .take(layout.detail_visible_rows())
        .map(|(text, token)| Line::styled(text.as_str(), style(ctx, *token)))
        .collect();
    let area = rect(content.x + 1, content.y, content.width.saturating_sub(1), content.height);
    frame.render_widget(Paragraph::new(text), area);
}

/// Boxed single-pane body with a title line and text lines below it.
pub fn draw_panel(
    frame: &mut Frame,
    body: Rect,
    title: &str,
    lines: &[(String, SemanticToken)],
    ctx: &RenderContext<'_>,
) {
    let heading = style(ctx, SemanticToken::Accent).add_modifier(Modifier::BOLD);
    frame.render_widget(bordered(style(ctx, SemanticToken::Muted)), body);
    let inner = inset(body, 0);
    let mut text = vec![Line::styled(title, heading), Line::default()];
    text.extend(
        lines
            .iter()
            .map(|(line, token)| Line::styled(line.as_str(), style(ctx, *token))),
    );
    let area = rect(inner.x + 1, inner.y, inner.width.saturating_sub(2), inner.height);
    frame.render_widget(Paragraph::new(text), area);
}

/// Number of header lines above the log window on screens that embed one.
const fn log_header_lines(screen: Screen) -> u16 {
    match screen {
        Screen::Installing | Screen::UpdateProgress => 3,
        _ => 1,
    }
}

/// Rectangle the operation log is drawn into on `screen`.
#[must_use]
pub fn log_viewport(screen: Screen, body: Rect) -> Rect {
    inset(body, log_header_lines(screen))
}

/// The visible window of the log buffer, plus a scroll marker when detached
/// from the newest line.
pub fn draw_log(frame: &mut Frame, area: Rect, log: &LogBuffer, ctx: &RenderContext<'_>) {
    if area.height == 0 {
        return;
    }
    let neutral = style(ctx, SemanticToken::Neutral);
    let lines: Vec<Line<'_>> = log
        .visible_lines()
        .take(usize::from(area.height))
        .map(|line| Line::styled(line, neutral))
        .collect();
    let text_area = rect(area.x + 1, area.y, area.width.saturating_sub(2), area.height);
    frame.render_widget(Paragraph::new(lines), text_area);

    if log.scroll_offset() > 0 {
        let marker = format!("\u{2191} {} newer", log.scroll_offset());
        let marker_area = rect(area.x, area.bottom() - 1, area.width.saturating_sub(1), 1);
        let marker = Paragraph::new(Line::styled(marker, style(ctx, SemanticToken::Warning)))
            .alignment(Alignment::Right);
        frame.render_widget(marker, marker_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::draw_rows;
    use crate::tui::theme::ThemePalette;

    fn row_of(rows: &[String], needle: &str) -> Option<usize> {
        rows.iter().position(|row| row.contains(needle))
    }

    #[test]
    fn list_rows_land_where_hit_test_expects() {
        let layout = DualPaneLayout::compute(100, 30);
        let palette = ThemePalette::mono();
        let ctx = RenderContext::new(&palette, 0);
        let items: Vec<ListRow> = (0..20).map(|i| ListRow::plain(format!("item-{i:02}"))).collect();
        let state = ListState {
            selected: 2,
            scroll: 2,
        };
        let rows = draw_rows(100, 30, |frame| {
            draw_list(frame, &layout, &items, &state, true, &ctx);
        });
        assert_eq!(row_of(&rows, "item-05"), Some(10));
        assert_eq!(row_of(&rows, "item-01"), None);
        assert!(rows[usize::from(layout.list_content.y)].contains("\u{25b8} item-02"));
    }

    #[test]
    fn badges_are_right_aligned_in_the_list_pane() {
        let layout = DualPaneLayout::compute(100, 30);
        let palette = ThemePalette::mono();
        let ctx = RenderContext::new(&palette, 0);
        let items = vec![ListRow::badged("git", "ok", SemanticToken::Success)];
        let rows = draw_rows(100, 30, |frame| {
            draw_list(frame, &layout, &items, &ListState::default(), true, &ctx);
        });
        let line = &rows[usize::from(layout.list_content.y)];
        let pane: String = line.chars().take(usize::from(layout.list_content.right())).collect();
        assert!(pane.ends_with("ok "), "row was {pane:?}");
    }

    #[test]
    fn empty_list_says_so() {
        let layout = DualPaneLayout::compute(100, 30);
        let palette = ThemePalette::mono();
        let ctx = RenderContext::new(&palette, 0);
        let rows = draw_rows(100, 30, |frame| {
            draw_list(frame, &layout, &[], &ListState::default(), true, &ctx);
        });
        assert_eq!(row_of(&rows, "(empty)"), Some(usize::from(layout.list_content.y)));
    }

    #[test]
    fn log_viewport_reserves_progress_lines() {
        let layout = DualPaneLayout::compute(100, 30);
        let logs = log_viewport(Screen::Logs, layout.body);
        let installing = log_viewport(Screen::Installing, layout.body);
        assert_eq!(logs.height, installing.height + 2);
    }

    #[test]
    fn panel_border_wraps_the_body() {
        let palette = ThemePalette::mono();
        let ctx = RenderContext::new(&palette, 0);
        let rows = draw_rows(6, 4, |frame| {
            draw_panel(frame, rect(0, 0, 6, 4), "T", &[], &ctx);
        });
        assert_eq!(rows[0], "┌────┐");
        assert_eq!(rows[1], "│ T  │");
        assert_eq!(rows[3], "└────┘");
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 3), "abc");
    }
}
