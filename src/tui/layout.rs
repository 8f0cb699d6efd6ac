//! Dual-pane screen geometry and pointer hit-testing.
//!
//! Rendering and mouse handling both derive their coordinates from the same
//! [`DualPaneLayout`] of ratatui [`Rect`]s, so a row drawn at `y` is the row a
//! click at `y` selects.

#![allow(missing_docs)]

use ratatui::layout::{Position, Rect};

pub const HEADER_HEIGHT: u16 = 3;
pub const FOOTER_HEIGHT: u16 = 2;
pub const BORDER: u16 = 1;
pub const LIST_TITLE_LINES: u16 = 3;
pub const DETAIL_TITLE_LINES: u16 = 2;

pub const LIST_PREFERRED_WIDTH: u16 = 30;
pub const LIST_MIN_WIDTH: u16 = 20;
/// The list pane never shrinks below this, even to protect the detail pane.
pub const LIST_FLOOR_WIDTH: u16 = 10;
pub const DETAIL_MIN_WIDTH: u16 = 30;

/// Minimum terminal width below which the console shows a "too small" message.
pub const MIN_USABLE_COLS: u16 = LIST_FLOOR_WIDTH + DETAIL_MIN_WIDTH;
/// Minimum terminal height below which the console shows a "too small" message.
pub const MIN_USABLE_ROWS: u16 =
    HEADER_HEIGHT + FOOTER_HEIGHT + 2 * BORDER + LIST_TITLE_LINES + 2;

/// Returns `true` if the terminal is below the minimum usable size.
#[must_use]
pub const fn is_terminal_too_small(cols: u16, rows: u16) -> bool {
    cols < MIN_USABLE_COLS || rows < MIN_USABLE_ROWS
}

/// Rectangle from raw cell coordinates, without the area clamp of `Rect::new`.
#[must_use]
pub const fn rect(x: u16, y: u16, width: u16, height: u16) -> Rect {
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Shrink `rect` by `top` title lines plus the border on every side.
#[must_use]
pub fn inset(rect: Rect, top: u16) -> Rect {
    Rect {
        x: rect.x.saturating_add(BORDER),
        y: rect.y.saturating_add(BORDER + top),
        width: rect.width.saturating_sub(2 * BORDER),
        height: rect.height.saturating_sub(2 * BORDER + top),
    }
}

/// The `lines` rows between a pane's top border and its content.
#[must_use]
pub fn title_band(pane: Rect, lines: u16) -> Rect {
    let inner = inset(pane, 0);
    Rect {
        height: lines.min(inner.height),
        ..inner
    }
}

fn contains(rect: Rect, col: u16, row: u16) -> bool {
    rect.contains(Position::new(col, row))
}

/// Which half of the detail content a click landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    Left,
    Right,
}

impl Half {
    /// Step direction for numeric and choice fields.
    #[must_use]
    pub const fn direction(self) -> i64 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }
}

/// Logical target of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    ListRow(usize),
    DetailField { index: usize, half: Half },
}

/// Scroll offsets and item counts needed to resolve a hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaneScroll {
    pub list_scroll: usize,
    pub list_count: usize,
    pub detail_scroll: usize,
    pub detail_count: usize,
}

/// Regions of a dual-pane screen for one terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualPaneLayout {
    pub cols: u16,
    pub rows: u16,
    pub header: Rect,
    pub footer: Rect,
    pub body: Rect,
    pub list: Rect,
    pub detail: Rect,
    pub list_content: Rect,
    pub detail_content: Rect,
}

/// List pane width for a terminal `cols` wide.
#[must_use]
pub fn list_pane_width(cols: u16) -> u16 {
    let third = cols / 3;
    let mut width = if third < LIST_MIN_WIDTH {
        LIST_MIN_WIDTH
    } else {
        LIST_PREFERRED_WIDTH.clamp(LIST_MIN_WIDTH, third)
    };
    if cols.saturating_sub(width) < DETAIL_MIN_WIDTH {
        width = cols.saturating_sub(DETAIL_MIN_WIDTH).max(LIST_FLOOR_WIDTH);
    }
    width.min(cols)
}

impl DualPaneLayout {
    #[must_use]
    pub fn compute(cols: u16, rows: u16) -> Self {
        let header = rect(0, 0, cols, HEADER_HEIGHT.min(rows));
        let footer_height = FOOTER_HEIGHT.min(rows.saturating_sub(header.height));
        let footer = rect(0, rows.saturating_sub(footer_height), cols, footer_height);
        let body_height = rows.saturating_sub(header.height + footer.height);
        let body = rect(0, header.height, cols, body_height);

        let list_width = list_pane_width(cols);
        let list = rect(0, body.y, list_width, body_height);
        let detail = rect(list_width, body.y, cols.saturating_sub(list_width), body_height);

        Self {
            cols,
            rows,
            header,
            footer,
            body,
            list,
            detail,
            list_content: inset(list, LIST_TITLE_LINES),
            detail_content: inset(detail, DETAIL_TITLE_LINES),
        }
    }

    #[must_use]
    pub fn list_visible_rows(&self) -> usize {
        usize::from(self.list_content.height)
    }

    #[must_use]
    pub fn detail_visible_rows(&self) -> usize {
        usize::from(self.detail_content.height)
    }

    /// Absolute row where list item `index` is drawn, if visible.
    #[must_use]
    pub fn list_row_for(&self, index: usize, scroll: usize) -> Option<u16> {
        let rel = index.checked_sub(scroll)?;
        if rel >= self.list_visible_rows() {
            return None;
        }
        u16::try_from(rel).ok().map(|r| self.list_content.y + r)
    }

    /// Absolute row where detail field `index` is drawn, if visible.
    #[must_use]
    pub fn detail_row_for(&self, index: usize, scroll: usize) -> Option<u16> {
        let rel = index.checked_sub(scroll)?;
        if rel >= self.detail_visible_rows() {
            return None;
        }
        u16::try_from(rel).ok().map(|r| self.detail_content.y + r)
    }

    /// Resolve a pointer position to a list row or detail field.
    ///
    /// Indices are clamped to the last item; empty panes and clicks on borders
    /// or title lines resolve to `None`.
    #[must_use]
    pub fn hit_test(&self, col: u16, row: u16, scroll: PaneScroll) -> Option<Hit> {
        if contains(self.list, col, row) {
            if scroll.list_count == 0 || !contains(self.list_content, col, row) {
                return None;
            }
            let index = scroll.list_scroll + usize::from(row - self.list_content.y);
            return Some(Hit::ListRow(index.min(scroll.list_count - 1)));
        }
        if contains(self.detail, col, row) {
            if scroll.detail_count == 0 || !contains(self.detail_content, col, row) {
                return None;
            }
            let index = scroll.detail_scroll + usize::from(row - self.detail_content.y);
            let mid = self.detail_content.x + self.detail_content.width / 2;
            let half = if col < mid { Half::Left } else { Half::Right };
            return Some(Hit::DetailField {
                index: index.min(scroll.detail_count - 1),
                half,
            });
        }
        None
    }

    /// Which pane a wheel event at (col,row) should scroll.
    #[must_use]
    pub fn pane_at(&self, col: u16, row: u16) -> Option<PaneFocus> {
        if contains(self.list, col, row) {
            Some(PaneFocus::List)
        } else if contains(self.detail, col, row) {
            Some(PaneFocus::Detail)
        } else {
            None
        }
    }
}

/// Pane that owns keyboard focus on dual-pane screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaneFocus {
    #[default]
    List,
    Detail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_terminal_geometry() {
        let layout = DualPaneLayout::compute(100, 30);
        assert_eq!(layout.list.width, 30);
        assert_eq!(layout.detail.width, 70);
        assert_eq!(layout.list_content.y, 7);
        assert_eq!(layout.detail_content.y, 6);
        assert_eq!(layout.body.height, 25);
        assert_eq!(layout.list_visible_rows(), 25 - 2 - 3);
    }

    #[test]
    fn click_scenario_selects_scrolled_index() {
        let layout = DualPaneLayout::compute(100, 30);
        let scroll = PaneScroll {
            list_scroll: 2,
            list_count: 40,
            ..PaneScroll::default()
        };
        assert_eq!(layout.hit_test(10, 10, scroll), Some(Hit::ListRow(5)));
    }

    #[test]
    fn list_width_clamps() {
        assert_eq!(list_pane_width(100), 30);
        assert_eq!(list_pane_width(75), 25);
        assert_eq!(list_pane_width(54), 20);
        // 20 would leave less than 30 for the detail pane; list shrinks first.
        assert_eq!(list_pane_width(45), 15);
        assert_eq!(list_pane_width(38), 10);
        assert_eq!(list_pane_width(200), 30);
    }

    #[test]
    fn hit_clamps_to_last_item_and_ignores_titles() {
        let layout = DualPaneLayout::compute(100, 30);
        let scroll = PaneScroll {
            list_count: 3,
            detail_count: 4,
            ..PaneScroll::default()
        };
        assert_eq!(layout.hit_test(5, 20, scroll), Some(Hit::ListRow(2)));
        assert_eq!(layout.hit_test(5, 5, scroll), None);
        assert_eq!(layout.hit_test(5, 1, scroll), None);
    }

    #[test]
    fn detail_hits_report_half() {
        let layout = DualPaneLayout::compute(100, 30);
        let scroll = PaneScroll {
            list_count: 1,
            detail_count: 5,
            ..PaneScroll::default()
        };
        let left = layout.hit_test(35, 7, scroll);
        let right = layout.hit_test(95, 7, scroll);
        assert_eq!(
            left,
            Some(Hit::DetailField {
                index: 1,
                half: Half::Left
            })
        );
        assert_eq!(
            right,
            Some(Hit::DetailField {
                index: 1,
                half: Half::Right
            })
        );
    }

    #[test]
    fn title_band_sits_between_border_and_content() {
        let layout = DualPaneLayout::compute(100, 30);
        let band = title_band(layout.list, LIST_TITLE_LINES);
        assert_eq!(band.y, layout.list.y + BORDER);
        assert_eq!(band.bottom(), layout.list_content.y);
        assert_eq!(band.x, layout.list_content.x);
        assert_eq!(band.width, layout.list_content.width);
    }

    #[test]
    fn too_small_guard() {
        assert!(is_terminal_too_small(30, 40));
        assert!(is_terminal_too_small(100, 5));
        assert!(!is_terminal_too_small(100, 30));
    }
}
