//! Per-target tool configuration. One handler instance per [`ConfigTarget`].

use crossterm::event::KeyCode;
use ratatui::Frame;

use super::{EventResult, ScreenEvent, ScreenHandler, list_nav_key};
use crate::tools::targets::{ConfigTarget, FieldKind, FieldSpec};
use crate::tui::editor::{EditTarget, FieldStore};
use crate::tui::layout::{Hit, PaneFocus, PaneScroll};
use crate::tui::model::{AppModel, Cmd, Screen};
use crate::tui::theme::{RenderContext, SemanticToken};
use crate::tui::update::{Nav, go, persist_config};
use crate::tui::widgets::{self, FieldRow, ListRow, PaneTitles};

pub struct ConfigureHandler {
    target: ConfigTarget,
}

impl ConfigureHandler {
    #[must_use]
    pub const fn new(target: ConfigTarget) -> Self {
        Self { target }
    }

    fn field_target(&self, spec: &FieldSpec) -> EditTarget {
        EditTarget::Tool {
            target: self.target,
            key: spec.key,
        }
    }

    /// Step a numeric, choice or toggle field and persist the result.
    fn step_field(&self, model: &mut AppModel, index: usize, direction: i64) -> Cmd {
        let Some(spec) = self.target.fields().get(index) else {
            return Cmd::None;
        };
        let target = self.field_target(spec);
        let current = model.config.read_field(&target);
        match spec.kind.step(&current, direction) {
            Some(next) if next != current => {
                model.config.write_field(&target, next);
                persist_config(model)
            }
            _ => Cmd::None,
        }
    }

    /// Enter on a field: text opens the editor, toggles flip, others step forward.
    fn activate_field(&self, model: &mut AppModel, index: usize) -> Cmd {
        let Some(spec) = self.target.fields().get(index) else {
            return Cmd::None;
        };
        if spec.kind == FieldKind::Text {
            let target = self.field_target(spec);
            model.editor.begin(target, self.identify(), &model.config);
            return Cmd::None;
        }
        self.step_field(model, index, 1)
    }

    fn switch_target(model: &mut AppModel, index: usize) -> Cmd {
        match ConfigTarget::ALL.get(index) {
            Some(&target) => go(model, Nav::Replace(Screen::Configure(target))),
            None => Cmd::None,
        }
    }
}

impl ScreenHandler for ConfigureHandler {
    fn identify(&self) -> Screen {
        Screen::Configure(self.target)
    }

    fn initialize(&self, model: &mut AppModel) -> Cmd {
        let layout = model.layout();
        let index = ConfigTarget::ALL
            .iter()
            .position(|t| *t == self.target)
            .unwrap_or(0);
        model
            .configure
            .targets
            .select(index, ConfigTarget::ALL.len(), layout.list_visible_rows());
        model
            .configure
            .fields
            .clamp(self.target.fields().len(), layout.detail_visible_rows());
        Cmd::None
    }

    fn update(&self, model: &mut AppModel, event: &ScreenEvent<'_>) -> EventResult {
        let layout = model.layout();
        let target_count = ConfigTarget::ALL.len();
        let field_count = self.target.fields().len();
        let list_visible = layout.list_visible_rows();
        let detail_visible = layout.detail_visible_rows();
        match *event {
            ScreenEvent::Key(key) => {
                if key.code == KeyCode::Tab {
                    model.configure.focus = match model.configure.focus {
                        PaneFocus::List => PaneFocus::Detail,
                        PaneFocus::Detail => PaneFocus::List,
                    };
                    return EventResult::consumed();
                }
                match model.configure.focus {
                    PaneFocus::List => {
                        let before = model.configure.targets.selected;
                        if list_nav_key(&mut model.configure.targets, key, target_count, list_visible) {
                            let after = model.configure.targets.selected;
                            let cmd = if after == before {
                                Cmd::None
                            } else {
                                model.configure.fields.first(0, detail_visible);
                                Self::switch_target(model, after)
                            };
                            return EventResult::Consumed(cmd);
                        }
                        match key.code {
                            KeyCode::Enter | KeyCode::Right => {
                                model.configure.focus = PaneFocus::Detail;
                                EventResult::consumed()
                            }
                            _ => EventResult::Ignored,
                        }
                    }
                    PaneFocus::Detail => {
                        if list_nav_key(&mut model.configure.fields, key, field_count, detail_visible) {
                            return EventResult::consumed();
                        }
                        let index = model.configure.fields.selected;
                        match key.code {
                            KeyCode::Left | KeyCode::Char('h') => {
                                EventResult::Consumed(self.step_field(model, index, -1))
                            }
                            KeyCode::Right | KeyCode::Char('l') => {
                                EventResult::Consumed(self.step_field(model, index, 1))
                            }
                            KeyCode::Enter | KeyCode::Char(' ') => {
                                EventResult::Consumed(self.activate_field(model, index))
                            }
                            _ => EventResult::Ignored,
                        }
                    }
                }
            }
            ScreenEvent::Click { col, row } => {
                let scroll = PaneScroll {
                    list_scroll: model.configure.targets.scroll,
                    list_count: target_count,
                    detail_scroll: model.configure.fields.scroll,
                    detail_count: field_count,
                };
                let cmd = match layout.hit_test(col, row, scroll) {
                    Some(Hit::ListRow(index)) => {
                        model.configure.focus = PaneFocus::List;
                        if index == model.configure.targets.selected {
                            Cmd::None
                        } else {
                            model.configure.fields.first(0, detail_visible);
                            Self::switch_target(model, index)
                        }
                    }
                    Some(Hit::DetailField { index, half }) => {
                        model.configure.focus = PaneFocus::Detail;
                        model.configure.fields.select(index, field_count, detail_visible);
                        let steppable = self
                            .target
                            .fields()
                            .get(index)
                            .is_some_and(|f| f.kind.is_steppable());
                        if steppable {
                            self.step_field(model, index, half.direction())
                        } else {
                            Cmd::None
                        }
                    }
                    None => Cmd::None,
                };
                EventResult::Consumed(cmd)
            }
            ScreenEvent::Wheel { col, row, delta } => {
                match layout.pane_at(col, row) {
                    Some(PaneFocus::List) => {
                        model.configure.targets.scroll_by(delta, target_count, list_visible);
                    }
                    Some(PaneFocus::Detail) => {
                        model.configure.fields.scroll_by(delta, field_count, detail_visible);
                    }
                    None => {}
                }
                EventResult::consumed()
            }
        }
    }

    fn render(&self, model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
        let layout = model.layout();
        let state = &model.configure;
        let subtitle = format!("{} targets", ConfigTarget::ALL.len());
        let titles = PaneTitles {
            list: "Configure",
            list_subtitle: &subtitle,
            detail: self.target.title(),
        };
        widgets::draw_dual_pane(frame, &layout, titles, state.focus, ctx);

        let rows: Vec<ListRow> = ConfigTarget::ALL
            .iter()
            .map(|t| {
                let customized = model.config.tools.get(t.key()).is_some_and(|m| !m.is_empty());
                if customized {
                    ListRow::badged(t.title(), "\u{25cf}", SemanticToken::Success)
                } else {
                    ListRow::plain(t.title())
                }
            })
            .collect();
        widgets::draw_list(frame, &layout, &rows, &state.targets, state.focus == PaneFocus::List, ctx);

        let fields: Vec<FieldRow> = self
            .target
            .fields()
            .iter()
            .map(|spec| FieldRow {
                label: spec.label.to_string(),
                value: model.config.read_field(&self.field_target(spec)),
                steppable: spec.kind.is_steppable(),
            })
            .collect();
        let editing = model.editor.session().filter(|s| s.owner == self.identify());
        widgets::draw_fields(
            frame,
            &layout,
            &fields,
            &state.fields,
            state.focus == PaneFocus::Detail,
            editing,
            ctx,
        );
    }
}
