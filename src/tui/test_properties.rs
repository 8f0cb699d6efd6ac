//! Property-based tests for console state invariants.
//!
//! Uses `proptest` to check that arbitrary sequences of input keep the
//! bounded log, list cursors, navigation history and mouse geometry
//! consistent.

use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use proptest::prelude::*;

use super::layout::{DualPaneLayout, Hit, PaneScroll};
use super::log_buffer::LogBuffer;
use super::model::{AppModel, Msg, Screen};
use super::navigation::Navigation;
use super::update::update;
use super::viewport::{ListState, max_scroll};
use crate::core::config::Config;
use crate::tools::targets::ConfigTarget;

// ──────────────────── strategies ────────────────────

fn arb_screen() -> impl Strategy<Value = Screen> {
    prop_oneof![
        Just(Screen::Welcome),
        Just(Screen::MainMenu),
        Just(Screen::ToolSelect),
        Just(Screen::Status),
        Just(Screen::Updates),
        Just(Screen::Backups),
        Just(Screen::Profiles),
        Just(Screen::Settings),
        Just(Screen::Logs),
        Just(Screen::Help),
        (0..ConfigTarget::ALL.len()).prop_map(|i| Screen::Configure(ConfigTarget::ALL[i])),
    ]
}

fn arb_key_code() -> impl Strategy<Value = KeyCode> {
    prop_oneof![
        Just(KeyCode::Up),
        Just(KeyCode::Down),
        Just(KeyCode::Left),
        Just(KeyCode::Right),
        Just(KeyCode::PageUp),
        Just(KeyCode::PageDown),
        Just(KeyCode::Home),
        Just(KeyCode::End),
        Just(KeyCode::Tab),
        Just(KeyCode::Enter),
        Just(KeyCode::Esc),
        Just(KeyCode::Backspace),
        Just(KeyCode::Char(' ')),
        Just(KeyCode::Char('j')),
        Just(KeyCode::Char('k')),
        Just(KeyCode::Char('n')),
        Just(KeyCode::Char('d')),
        Just(KeyCode::Char('x')),
        Just(KeyCode::Char('?')),
        Just(KeyCode::Char('L')),
    ]
}

#[derive(Debug, Clone)]
enum ListOp {
    Select(usize),
    Move(isize),
    First,
    Last,
    Wheel(isize),
    Resize(usize, usize),
}

fn arb_list_op() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        (0usize..80).prop_map(ListOp::Select),
        (-30isize..30).prop_map(ListOp::Move),
        Just(ListOp::First),
        Just(ListOp::Last),
        (-10isize..10).prop_map(ListOp::Wheel),
        (0usize..60, 1usize..25).prop_map(|(c, v)| ListOp::Resize(c, v)),
    ]
}

fn console() -> AppModel {
    let mut cfg = Config::default();
    cfg.console.intro = false;
    cfg.console.mouse = true;
    AppModel::new(cfg, (100, 30))
}

// ──────────────────── properties ────────────────────

proptest! {
    #[test]
    fn log_keeps_only_the_newest_lines(capacity in 1usize..64, count in 0usize..200) {
        let mut log = LogBuffer::new(capacity);
        for i in 0..count {
            log.append(format!("L{i}"));
        }
        prop_assert_eq!(log.len(), count.min(capacity));
        let first = count.saturating_sub(capacity);
        let expected: Vec<String> = (first..count).map(|i| format!("L{i}")).collect();
        let actual: Vec<String> = log.lines().map(str::to_string).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn log_scroll_stays_in_range(
        visible in 1usize..20,
        count in 0usize..100,
        deltas in prop::collection::vec(-50isize..50, 0..20),
    ) {
        let mut log = LogBuffer::new(50);
        log.set_visible(visible);
        for i in 0..count {
            log.append(format!("L{i}"));
        }
        for delta in deltas {
            log.scroll(delta);
            prop_assert!(log.scroll_offset() <= log.max_scroll());
            prop_assert!(log.visible_lines().count() <= visible);
        }
    }

    #[test]
    fn list_cursor_stays_inside_the_list(
        ops in prop::collection::vec(arb_list_op(), 1..40),
    ) {
        let mut state = ListState::default();
        let (mut count, mut visible) = (20usize, 8usize);
        for op in ops {
            match op {
                ListOp::Select(i) => state.select(i, count, visible),
                ListOp::Move(d) => state.move_by(d, count, visible),
                ListOp::First => state.first(count, visible),
                ListOp::Last => state.last(count, visible),
                ListOp::Wheel(d) => state.scroll_by(d, count, visible),
                ListOp::Resize(c, v) => {
                    count = c;
                    visible = v;
                    state.clamp(count, visible);
                }
            }
            prop_assert!(count == 0 || state.selected < count);
            prop_assert!(state.scroll <= max_scroll(count, visible));
        }
    }

    #[test]
    fn navigation_never_records_the_current_screen(
        steps in prop::collection::vec((arb_screen(), 0u8..3), 1..40),
    ) {
        let mut nav = Navigation::new(Screen::Welcome);
        for (screen, action) in steps {
            match action {
                0 => { nav.navigate(screen); }
                1 => { nav.navigate_with_push(screen); }
                _ => { nav.navigate_back(); }
            }
            prop_assert!(!nav.history().contains(&nav.current()));
            let distinct: HashSet<Screen> = nav.history().iter().copied().collect();
            prop_assert_eq!(distinct.len(), nav.depth());
        }
    }

    #[test]
    fn drawn_rows_hit_back_to_their_index(
        cols in 60u16..200,
        rows in 16u16..60,
        count in 1usize..120,
        scroll_seed in 0usize..120,
    ) {
        let layout = DualPaneLayout::compute(cols, rows);
        let visible = layout.list_visible_rows();
        let scroll = scroll_seed.min(max_scroll(count, visible));
        let scroll_state = PaneScroll { list_scroll: scroll, list_count: count, ..PaneScroll::default() };
        for index in scroll..count {
            let Some(row) = layout.list_row_for(index, scroll) else { break };
            let hit = layout.hit_test(layout.list_content.x + 1, row, scroll_state);
            prop_assert_eq!(hit, Some(Hit::ListRow(index)));
        }
    }

    #[test]
    fn arbitrary_keys_preserve_console_invariants(
        start in arb_screen(),
        keys in prop::collection::vec(arb_key_code(), 1..60),
    ) {
        let mut model = console();
        model.nav.navigate(start);
        for code in keys {
            let _ = update(&mut model, Msg::Key(KeyEvent::new(code, KeyModifiers::NONE)));
            prop_assert!(!model.nav.history().contains(&model.screen()));
            prop_assert!(model.log.len() <= model.log.capacity());
            prop_assert!(model.config.profiles.len() <= 60);
            let editing_elsewhere = model
                .editor
                .session()
                .is_some_and(|s| s.owner != model.screen());
            prop_assert!(!editing_elsewhere);
        }
    }
}
