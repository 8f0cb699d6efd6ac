//! Selection and scroll clamping shared by every scrollable pane.

#![allow(missing_docs)]

/// Largest valid scroll offset for `total` items in a `visible`-row window.
#[must_use]
pub const fn max_scroll(total: usize, visible: usize) -> usize {
    total.saturating_sub(visible)
}

#[must_use]
pub fn clamp_scroll(offset: usize, total: usize, visible: usize) -> usize {
    offset.min(max_scroll(total, visible))
}

/// Apply a signed delta to `offset`, clamped to `[0, max_scroll]`.
#[must_use]
pub fn scroll_by(offset: usize, delta: isize, total: usize, visible: usize) -> usize {
    clamp_scroll(offset.saturating_add_signed(delta), total, visible)
}

/// Adjust `scroll` so that `selected` lies within `[scroll, scroll + visible)`.
#[must_use]
pub fn ensure_visible(selected: usize, scroll: usize, visible: usize) -> usize {
    if visible == 0 {
        return selected;
    }
    if selected < scroll {
        selected
    } else if selected >= scroll + visible {
        selected + 1 - visible
    } else {
        scroll
    }
}

/// Cursor and scroll position over a list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListState {
    pub selected: usize,
    pub scroll: usize,
}

impl ListState {
    /// Programmatic selection: clamps to the list and keeps the row on screen.
    pub fn select(&mut self, index: usize, count: usize, visible: usize) {
        self.selected = if count == 0 { 0 } else { index.min(count - 1) };
        self.scroll = clamp_scroll(ensure_visible(self.selected, self.scroll, visible), count, visible);
    }

    pub fn move_by(&mut self, delta: isize, count: usize, visible: usize) {
        self.select(self.selected.saturating_add_signed(delta), count, visible);
    }

    pub fn first(&mut self, count: usize, visible: usize) {
        self.select(0, count, visible);
    }

    pub fn last(&mut self, count: usize, visible: usize) {
        self.select(count.saturating_sub(1), count, visible);
    }

    /// Wheel scroll: moves the window without touching the selection.
    pub fn scroll_by(&mut self, delta: isize, count: usize, visible: usize) {
        self.scroll = scroll_by(self.scroll, delta, count, visible);
    }

    /// Re-clamp after the item count or window height changed.
    pub fn clamp(&mut self, count: usize, visible: usize) {
        self.selected = if count == 0 { 0 } else { self.selected.min(count - 1) };
        self.scroll = clamp_scroll(self.scroll, count, visible);
    }
}
