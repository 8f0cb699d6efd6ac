//! Backup snapshots: list, create, restore and delete.

use crossterm::event::KeyCode;
use ratatui::Frame;

use super::{EventResult, ScreenEvent, ScreenHandler, list_nav_key};
use crate::tui::layout::{Hit, PaneFocus, PaneScroll};
use crate::tui::model::{AppModel, BackupConfirm, Cmd, OpKind, OpRequest, Screen};
use crate::tui::theme::{RenderContext, SemanticToken};
use crate::tui::update::start_operation;
use crate::tui::widgets::{self, ListRow, PaneTitles};

pub struct BackupsHandler;

fn selected_id(model: &AppModel) -> Option<String> {
    model
        .backups
        .snapshots
        .get(model.backups.list.selected)
        .map(|s| s.id.clone())
}

fn confirm_request(kind: BackupConfirm, id: String) -> OpRequest {
    match kind {
        BackupConfirm::Restore => OpRequest::RestoreBackup { id },
        BackupConfirm::Delete => OpRequest::DeleteBackup { id },
    }
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

impl ScreenHandler for BackupsHandler {
    fn identify(&self) -> Screen {
        Screen::Backups
    }

    fn initialize(&self, model: &mut AppModel) -> Cmd {
        model.backups.confirm = None;
        model.backups.loading = true;
        Cmd::ListBackups
    }

    fn update(&self, model: &mut AppModel, event: &ScreenEvent<'_>) -> EventResult {
        let layout = model.layout();
        let count = model.backups.snapshots.len();
        let visible = layout.list_visible_rows();
        match *event {
            ScreenEvent::Key(key) => {
                if let Some((kind, id)) = model.backups.confirm.clone() {
                    return match key.code {
                        KeyCode::Char('y') | KeyCode::Enter => {
                            model.backups.confirm = None;
                            let cmd = start_operation(model, confirm_request(kind, id)).unwrap_or(Cmd::None);
                            EventResult::Consumed(cmd)
                        }
                        KeyCode::Char('n') | KeyCode::Esc => {
                            model.backups.confirm = None;
                            EventResult::consumed()
                        }
                        _ => EventResult::consumed(),
                    };
                }
                if list_nav_key(&mut model.backups.list, key, count, visible) {
                    return EventResult::consumed();
                }
                match key.code {
                    KeyCode::Char('c') => {
                        let cmd = start_operation(model, OpRequest::CreateBackup).unwrap_or(Cmd::None);
                        EventResult::Consumed(cmd)
                    }
                    KeyCode::Enter | KeyCode::Char('r') => {
                        if let Some(id) = selected_id(model) {
                            model.backups.confirm = Some((BackupConfirm::Restore, id));
                        }
                        EventResult::consumed()
                    }
                    KeyCode::Char('d') | KeyCode::Delete => {
                        if let Some(id) = selected_id(model) {
                            model.backups.confirm = Some((BackupConfirm::Delete, id));
                        }
                        EventResult::consumed()
                    }
                    _ => EventResult::Ignored,
                }
            }
            ScreenEvent::Click { col, row } => {
                let scroll = PaneScroll {
                    list_scroll: model.backups.list.scroll,
                    list_count: count,
                    ..PaneScroll::default()
                };
                if let Some(Hit::ListRow(index)) = layout.hit_test(col, row, scroll) {
                    model.backups.confirm = None;
                    model.backups.list.select(index, count, visible);
                }
                EventResult::consumed()
            }
            ScreenEvent::Wheel { col, row, delta } => {
                if layout.pane_at(col, row) == Some(PaneFocus::List) {
                    model.backups.list.scroll_by(delta, count, visible);
                }
                EventResult::consumed()
            }
        }
    }

    fn render(&self, model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
        let layout = model.layout();
        let state = &model.backups;
        let subtitle = if state.loading {
            format!("{} loading", ctx.spinner())
        } else {
            format!("{} snapshots", state.snapshots.len())
        };
        let titles = PaneTitles {
            list: "Snapshots",
            list_subtitle: &subtitle,
            detail: "Snapshot",
        };
        widgets::draw_dual_pane(frame, &layout, titles, PaneFocus::List, ctx);

        let rows: Vec<ListRow> = state
            .snapshots
            .iter()
            .map(|s| ListRow::badged(&s.id, s.file_count.to_string(), SemanticToken::Muted))
            .collect();
        widgets::draw_list(frame, &layout, &rows, &state.list, true, ctx);

        let mut lines = Vec::new();
        if let Some(snapshot) = state.snapshots.get(state.list.selected) {
            lines.push((format!("id       {}", snapshot.id), SemanticToken::Neutral));
            lines.push((format!("created  {}", snapshot.created_at), SemanticToken::Neutral));
            lines.push((format!("files    {}", snapshot.file_count), SemanticToken::Neutral));
            lines.push((format!("size     {}", human_bytes(snapshot.total_bytes)), SemanticToken::Neutral));
            lines.push((format!("path     {}", snapshot.path.display()), SemanticToken::Muted));
        } else if !state.loading {
            lines.push(("No snapshots yet. Press c to create one.".to_string(), SemanticToken::Muted));
        }
        if model.ops.is_running(OpKind::Backup) {
            lines.push((String::new(), SemanticToken::Neutral));
            lines.push((format!("{} working", ctx.spinner()), SemanticToken::Warning));
        }
        if let Some((kind, id)) = &state.confirm {
            let verb = match kind {
                BackupConfirm::Restore => "Restore",
                BackupConfirm::Delete => "Delete",
            };
            lines.push((String::new(), SemanticToken::Neutral));
            lines.push((format!("{verb} snapshot {id}? [y/n]"), SemanticToken::Warning));
        }
        if let Some(message) = &state.last_message {
            lines.push((String::new(), SemanticToken::Neutral));
            lines.push((message.clone(), SemanticToken::Muted));
        }
        widgets::draw_detail_text(frame, &layout, &lines, 0, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::store::BackupSnapshot;
    use crate::core::config::Config;
    use crossterm::event::{KeyEvent, KeyModifiers};
    use std::path::PathBuf;

    fn model_with_snapshots(n: usize) -> AppModel {
        let mut model = AppModel::new(Config::default(), (100, 30));
        model.backups.snapshots = (0..n)
            .map(|i| BackupSnapshot {
                id: format!("20260101-00000{i}"),
                created_at: "2026-01-01T00:00:00Z".into(),
                timestamp_ms: 0,
                file_count: 2,
                total_bytes: 2048,
                path: PathBuf::from("/tmp"),
            })
            .collect();
        model
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut model = model_with_snapshots(2);
        let handler = BackupsHandler;
        let key = press(KeyCode::Char('d'));
        handler.update(&mut model, &ScreenEvent::Key(&key));
        assert!(matches!(model.backups.confirm, Some((BackupConfirm::Delete, _))));
        assert!(!model.ops.is_busy());

        let yes = press(KeyCode::Char('y'));
        let result = handler.update(&mut model, &ScreenEvent::Key(&yes));
        assert!(matches!(result, EventResult::Consumed(Cmd::Batch(_))));
        assert!(model.ops.is_busy());
        assert!(model.backups.confirm.is_none());
    }

    #[test]
    fn declining_confirmation_launches_nothing() {
        let mut model = model_with_snapshots(1);
        let handler = BackupsHandler;
        handler.update(&mut model, &ScreenEvent::Key(&press(KeyCode::Enter)));
        handler.update(&mut model, &ScreenEvent::Key(&press(KeyCode::Char('n'))));
        assert!(model.backups.confirm.is_none());
        assert!(!model.ops.is_busy());
    }

    #[test]
    fn click_selects_snapshot_row() {
        let mut model = model_with_snapshots(4);
        let handler = BackupsHandler;
        handler.update(&mut model, &ScreenEvent::Click { col: 5, row: 9 });
        assert_eq!(model.backups.list.selected, 2);
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.0 KiB");
    }
}
