//! Bounded operation transcript with bottom-anchored scrolling.
//!
//! The scroll offset counts lines up from the newest line: 0 shows the tail.

#![allow(missing_docs)]

use std::collections::VecDeque;

use super::viewport;

pub const DEFAULT_CAPACITY: usize = 500;
const DEFAULT_VISIBLE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
    scroll: usize,
    visible: usize,
    auto_scroll: bool,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LogBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            scroll: 0,
            visible: DEFAULT_VISIBLE,
            auto_scroll: true,
        }
    }

    /// Append one line, evicting the oldest when over capacity.
    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
        if self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
        if self.auto_scroll {
            self.scroll = 0;
        } else {
            self.scroll = viewport::clamp_scroll(self.scroll + 1, self.lines.len(), self.visible);
        }
    }

    /// Manual scroll; positive moves toward older lines. Disables auto-scroll.
    pub fn scroll(&mut self, delta: isize) {
        self.auto_scroll = false;
        self.scroll = viewport::scroll_by(self.scroll, delta, self.lines.len(), self.visible);
    }

    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll = self.max_scroll();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.auto_scroll = false;
        self.scroll = 0;
    }

    /// Empty the buffer and re-arm auto-scroll (a new operation is starting).
    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll = 0;
        self.auto_scroll = true;
    }

    /// Height of the window the buffer is rendered into.
    pub fn set_visible(&mut self, rows: usize) {
        self.visible = rows;
        self.scroll = viewport::clamp_scroll(self.scroll, self.lines.len(), self.visible);
    }

    /// Lines currently in view, oldest first.
    pub fn visible_lines(&self) -> impl Iterator<Item = &str> {
        let end = self.lines.len() - self.scroll.min(self.lines.len());
        let start = end.saturating_sub(self.visible);
        self.lines.range(start..end).map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Last `n` lines, oldest first.
    #[must_use]
    pub fn tail(&self, n: usize) -> Vec<String> {
        let start = self.lines.len().saturating_sub(n);
        self.lines.range(start..).cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn scroll_offset(&self) -> usize {
        self.scroll
    }

    #[must_use]
    pub fn max_scroll(&self) -> usize {
        viewport::max_scroll(self.lines.len(), self.visible)
    }

    #[must_use]
    pub const fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }
}
