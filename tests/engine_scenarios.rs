//! End-to-end console scenarios: the engine driven through its message
//! queue with fake package-manager and privilege collaborators.

mod common;

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use common::{FakeEscalator, FakePackageManager, NullTerminal, engine_with, upgradable};
use devkit_console::platform::pkg::ManagerKind;
use devkit_console::tui::Engine;
use devkit_console::tui::model::{Msg, NotificationLevel, OpRequest, Screen};

const SETTLE: Duration = Duration::from_secs(5);

fn key(code: KeyCode) -> Msg {
    Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn click(col: u16, row: u16) -> Msg {
    Msg::Mouse(MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: col,
        row,
        modifiers: KeyModifiers::NONE,
    })
}

/// Park the console on the install confirmation with `tools` selected.
fn confirm_install(engine: &mut Engine, tools: &[&str]) {
    let model = engine.model_mut();
    model.nav.navigate(Screen::ConfirmInstall);
    model.install.selected = tools.iter().map(|t| (*t).to_string()).collect();
}

#[test]
fn long_install_transcript_keeps_the_newest_lines() {
    let mut pm = FakePackageManager::new(ManagerKind::Apt);
    pm.lines = (0..600).map(|i| format!("L{i}")).collect();
    let pm = Arc::new(pm);
    let mut engine = engine_with(Arc::clone(&pm), Arc::new(FakeEscalator::new(true)), (100, 30));
    let mut term = NullTerminal::default();

    confirm_install(&mut engine, &["git"]);
    engine.dispatch(key(KeyCode::Char('y')), &mut term);
    assert_eq!(engine.model().screen(), Screen::Installing);
    assert!(engine.settle(SETTLE, &mut term), "operation did not settle");

    let model = engine.model();
    assert_eq!(model.screen(), Screen::InstallSummary);
    assert_eq!(model.log.len(), 500);
    let lines: Vec<&str> = model.log.lines().collect();
    assert_eq!(lines.first().copied(), Some("L100"));
    assert_eq!(lines.last().copied(), Some("L599"));
    let report = model.install.report.as_ref().expect("install report");
    assert_eq!(report.succeeded, vec!["git".to_string()]);
    assert!(!model.ops.is_busy());
}

#[test]
fn cancelled_privilege_prompt_never_runs_the_install() {
    let mut pm = FakePackageManager::new(ManagerKind::Apt);
    pm.needs_sudo = true;
    let pm = Arc::new(pm);
    let escalator = Arc::new(FakeEscalator::new(false));
    let mut engine = engine_with(Arc::clone(&pm), Arc::clone(&escalator), (100, 30));
    let mut term = NullTerminal::default();

    confirm_install(&mut engine, &["git", "tmux"]);
    engine.dispatch(key(KeyCode::Char('y')), &mut term);
    assert!(engine.settle(SETTLE, &mut term));

    assert_eq!(escalator.prompts(), 1);
    assert_eq!(term.foreground_runs, 1);
    assert_eq!(pm.call_count(), 0);
    let model = engine.model();
    assert_eq!(model.screen(), Screen::InstallError);
    let error = model.install.error.as_ref().expect("privilege error");
    assert_eq!(error.code, "DVK-2002");
    assert!(!model.ops.is_busy());
}

#[test]
fn granted_privilege_relaunches_once() {
    let mut pm = FakePackageManager::new(ManagerKind::Apt);
    pm.needs_sudo = true;
    let pm = Arc::new(pm);
    let escalator = Arc::new(FakeEscalator::new(true));
    let mut engine = engine_with(Arc::clone(&pm), Arc::clone(&escalator), (100, 30));
    let mut term = NullTerminal::default();

    confirm_install(&mut engine, &["git"]);
    engine.take_full_redraw();
    engine.dispatch(key(KeyCode::Char('y')), &mut term);
    assert!(engine.settle(SETTLE, &mut term));

    assert_eq!(escalator.prompts(), 1);
    assert_eq!(pm.call_count(), 1);
    assert_eq!(engine.model().screen(), Screen::InstallSummary);
    // The terminal came back from the prompt; the next frame is a full repaint.
    assert!(engine.take_full_redraw());
}

#[test]
fn click_on_scrolled_update_list_selects_the_drawn_row() {
    let pm = Arc::new(FakePackageManager::new(ManagerKind::Apt));
    let mut engine = engine_with(pm, Arc::new(FakeEscalator::new(true)), (100, 30));
    let mut term = NullTerminal::default();

    engine.model_mut().nav.navigate(Screen::Updates);
    engine.dispatch(Msg::UpdatesChecked(Ok(upgradable(30))), &mut term);
    {
        let list = &mut engine.model_mut().update.list;
        list.scroll = 2;
        list.selected = 2;
    }

    engine.dispatch(click(10, 10), &mut term);
    assert_eq!(engine.model().update.list.selected, 5);
    assert!(engine.model().update.selected.is_empty());

    // A second click on the selected row toggles it.
    engine.dispatch(click(10, 10), &mut term);
    assert!(engine.model().update.selected.contains("pkg05"));
}

#[test]
fn second_operation_is_refused_while_one_holds_the_slot() {
    let pm = Arc::new(FakePackageManager::new(ManagerKind::Apt));
    let mut engine = engine_with(Arc::clone(&pm), Arc::new(FakeEscalator::new(true)), (100, 30));
    let mut term = NullTerminal::default();

    let held = engine.model_mut().ops.reserve(OpRequest::CreateBackup);
    assert!(held.is_some());
    engine.model_mut().log.append("earlier output");

    confirm_install(&mut engine, &["git"]);
    engine.dispatch(key(KeyCode::Char('y')), &mut term);
    assert!(engine.settle(SETTLE, &mut term));

    let model = engine.model();
    assert_eq!(model.screen(), Screen::ConfirmInstall);
    assert_eq!(pm.call_count(), 0);
    assert_eq!(model.log.lines().last(), Some("earlier output"));
    assert!(
        model
            .notifications
            .iter()
            .any(|n| n.level == NotificationLevel::Warning)
    );
}

#[test]
fn menu_push_then_escape_returns_to_menu() {
    let mut pm = FakePackageManager::new(ManagerKind::Apt);
    pm.upgradable = upgradable(3);
    let mut engine = engine_with(Arc::new(pm), Arc::new(FakeEscalator::new(true)), (100, 30));
    let mut term = NullTerminal::default();

    engine.model_mut().nav.reset(Screen::MainMenu);
    engine.dispatch(key(KeyCode::Down), &mut term);
    engine.dispatch(key(KeyCode::Down), &mut term);
    engine.dispatch(key(KeyCode::Enter), &mut term);
    assert_eq!(engine.model().screen(), Screen::Updates);
    assert_eq!(engine.model().nav.history(), &[Screen::MainMenu]);

    assert!(engine.settle(SETTLE, &mut term));
    assert_eq!(engine.model().update.packages.len(), 3);

    engine.dispatch(key(KeyCode::Esc), &mut term);
    assert_eq!(engine.model().screen(), Screen::MainMenu);
    assert_eq!(engine.model().nav.depth(), 0);
}

#[test]
fn quit_key_ends_the_session() {
    let pm = Arc::new(FakePackageManager::new(ManagerKind::Brew));
    let mut engine = engine_with(pm, Arc::new(FakeEscalator::new(true)), (100, 30));
    let mut term = NullTerminal::default();

    engine.sender().send(key(KeyCode::Char('q'))).expect("queue open");
    assert_eq!(engine.pump(Duration::from_millis(200), &mut term), 1);
    assert!(engine.model().quit);
}
