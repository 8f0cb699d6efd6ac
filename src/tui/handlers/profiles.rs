//! User profiles: create, delete, activate and edit inline.

use crossterm::event::KeyCode;
use ratatui::Frame;

use super::{EventResult, ScreenEvent, ScreenHandler, list_nav_key};
use crate::core::config::UserProfile;
use crate::tui::editor::{EditTarget, FieldStore, ProfileField};
use crate::tui::layout::{Hit, PaneFocus, PaneScroll};
use crate::tui::model::{AppModel, Cmd, Screen};
use crate::tui::theme::{RenderContext, SemanticToken};
use crate::tui::update::persist_config;
use crate::tui::widgets::{self, FieldRow, ListRow, PaneTitles};

pub struct ProfilesHandler;

fn unique_name(model: &AppModel) -> String {
    (1..)
        .map(|n| format!("profile-{n}"))
        .find(|name| model.config.profiles.iter().all(|p| &p.name != name))
        .unwrap_or_default()
}

fn begin_edit(model: &mut AppModel) {
    let index = model.profiles.list.selected;
    let Some(field) = ProfileField::ALL.get(model.profiles.fields.selected).copied() else {
        return;
    };
    if index >= model.config.profiles.len() {
        return;
    }
    let target = EditTarget::Profile { index, field };
    model.editor.begin(target, Screen::Profiles, &model.config);
}

fn create(model: &mut AppModel) -> Cmd {
    let name = unique_name(model);
    model.config.profiles.push(UserProfile {
        name,
        ..UserProfile::default()
    });
    let count = model.config.profiles.len();
    let visible = model.layout().list_visible_rows();
    model.profiles.list.last(count, visible);
    persist_config(model)
}

fn delete(model: &mut AppModel) -> Cmd {
    let index = model.profiles.list.selected;
    if index >= model.config.profiles.len() {
        return Cmd::None;
    }
    let removed = model.config.profiles.remove(index);
    if model.config.active_profile.as_deref() == Some(removed.name.as_str()) {
        model.config.active_profile = None;
    }
    let visible = model.layout().list_visible_rows();
    model.profiles.list.clamp(model.config.profiles.len(), visible);
    persist_config(model)
}

fn activate(model: &mut AppModel) -> Cmd {
    let Some(profile) = model.config.profiles.get(model.profiles.list.selected) else {
        return Cmd::None;
    };
    model.config.active_profile = Some(profile.name.clone());
    persist_config(model)
}

impl ScreenHandler for ProfilesHandler {
    fn identify(&self) -> Screen {
        Screen::Profiles
    }

    fn initialize(&self, model: &mut AppModel) -> Cmd {
        let layout = model.layout();
        model.profiles.focus = PaneFocus::List;
        model
            .profiles
            .list
            .clamp(model.config.profiles.len(), layout.list_visible_rows());
        model
            .profiles
            .fields
            .clamp(ProfileField::ALL.len(), layout.detail_visible_rows());
        Cmd::None
    }

    fn update(&self, model: &mut AppModel, event: &ScreenEvent<'_>) -> EventResult {
        let layout = model.layout();
        let count = model.config.profiles.len();
        let field_count = ProfileField::ALL.len();
        let list_visible = layout.list_visible_rows();
        let detail_visible = layout.detail_visible_rows();
        match *event {
            ScreenEvent::Key(key) => {
                if key.code == KeyCode::Tab {
                    model.profiles.focus = match model.profiles.focus {
                        PaneFocus::List => PaneFocus::Detail,
                        PaneFocus::Detail => PaneFocus::List,
                    };
                    return EventResult::consumed();
                }
                match model.profiles.focus {
                    PaneFocus::List => {
                        if list_nav_key(&mut model.profiles.list, key, count, list_visible) {
                            return EventResult::consumed();
                        }
                        match key.code {
                            KeyCode::Char('n') => EventResult::Consumed(create(model)),
                            KeyCode::Char('d') | KeyCode::Delete => EventResult::Consumed(delete(model)),
                            KeyCode::Char('a') => EventResult::Consumed(activate(model)),
                            KeyCode::Enter | KeyCode::Right if count > 0 => {
                                model.profiles.focus = PaneFocus::Detail;
                                EventResult::consumed()
                            }
                            _ => EventResult::Ignored,
                        }
                    }
                    PaneFocus::Detail => {
                        if list_nav_key(&mut model.profiles.fields, key, field_count, detail_visible) {
                            return EventResult::consumed();
                        }
                        match key.code {
                            KeyCode::Enter => {
                                begin_edit(model);
                                EventResult::consumed()
                            }
                            KeyCode::Left => {
                                model.profiles.focus = PaneFocus::List;
                                EventResult::consumed()
                            }
                            _ => EventResult::Ignored,
                        }
                    }
                }
            }
            ScreenEvent::Click { col, row } => {
                let scroll = PaneScroll {
                    list_scroll: model.profiles.list.scroll,
                    list_count: count,
                    detail_scroll: model.profiles.fields.scroll,
                    detail_count: if count == 0 { 0 } else { field_count },
                };
                match layout.hit_test(col, row, scroll) {
                    Some(Hit::ListRow(index)) => {
                        model.profiles.focus = PaneFocus::List;
                        model.profiles.list.select(index, count, list_visible);
                    }
                    Some(Hit::DetailField { index, .. }) => {
                        let already = model.profiles.focus == PaneFocus::Detail
                            && model.profiles.fields.selected == index;
                        model.profiles.focus = PaneFocus::Detail;
                        model.profiles.fields.select(index, field_count, detail_visible);
                        if already {
                            begin_edit(model);
                        }
                    }
                    None => {}
                }
                EventResult::consumed()
            }
            ScreenEvent::Wheel { col, row, delta } => {
                match layout.pane_at(col, row) {
                    Some(PaneFocus::List) => model.profiles.list.scroll_by(delta, count, list_visible),
                    Some(PaneFocus::Detail) => {
                        model.profiles.fields.scroll_by(delta, field_count, detail_visible);
                    }
                    None => {}
                }
                EventResult::consumed()
            }
        }
    }

    fn render(&self, model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
        let layout = model.layout();
        let state = &model.profiles;
        let active = model.config.active_profile.as_deref();
        let subtitle = format!("{} profiles", model.config.profiles.len());
        let detail_title = model
            .config
            .profiles
            .get(state.list.selected)
            .map_or_else(|| "No profile".to_string(), |p| format!("Profile {}", p.name));
        let titles = PaneTitles {
            list: "Profiles",
            list_subtitle: &subtitle,
            detail: &detail_title,
        };
        widgets::draw_dual_pane(frame, &layout, titles, state.focus, ctx);

        let rows: Vec<ListRow> = model
            .config
            .profiles
            .iter()
            .map(|p| {
                if Some(p.name.as_str()) == active {
                    ListRow::badged(&p.name, "active", SemanticToken::Success)
                } else {
                    ListRow::plain(&p.name)
                }
            })
            .collect();
        widgets::draw_list(frame, &layout, &rows, &state.list, state.focus == PaneFocus::List, ctx);

        if state.list.selected >= model.config.profiles.len() {
            let hint = [("Press n to create a profile.".to_string(), SemanticToken::Muted)];
            widgets::draw_detail_text(frame, &layout, &hint, 0, ctx);
            return;
        }
        let fields: Vec<FieldRow> = ProfileField::ALL
            .iter()
            .map(|&field| FieldRow {
                label: field.label().to_string(),
                value: model.config.read_field(&EditTarget::Profile {
                    index: state.list.selected,
                    field,
                }),
                steppable: false,
            })
            .collect();
        let editing = model.editor.session().filter(|s| s.owner == Screen::Profiles);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn create_activate_delete_cycle() {
        let mut model = AppModel::new(Config::default(), (100, 30));
        let handler = ProfilesHandler;
        let r = handler.update(&mut model, &ScreenEvent::Key(&press(KeyCode::Char('n'))));
        assert!(matches!(r, EventResult::Consumed(Cmd::SaveConfig(_))));
        handler.update(&mut model, &ScreenEvent::Key(&press(KeyCode::Char('n'))));
        assert_eq!(model.config.profiles.len(), 2);
        assert_eq!(model.config.profiles[1].name, "profile-2");
        assert_eq!(model.profiles.list.selected, 1);

        handler.update(&mut model, &ScreenEvent::Key(&press(KeyCode::Char('a'))));
        assert_eq!(model.config.active_profile.as_deref(), Some("profile-2"));
        handler.update(&mut model, &ScreenEvent::Key(&press(KeyCode::Char('d'))));
        assert_eq!(model.config.profiles.len(), 1);
        assert_eq!(model.config.active_profile, None);
        assert_eq!(model.profiles.list.selected, 0);
    }

    #[test]
    fn enter_on_field_opens_editor() {
        let mut model = AppModel::new(Config::default(), (100, 30));
        model.nav.navigate(Screen::Profiles);
        let handler = ProfilesHandler;
        handler.update(&mut model, &ScreenEvent::Key(&press(KeyCode::Char('n'))));
        handler.update(&mut model, &ScreenEvent::Key(&press(KeyCode::Tab)));
        handler.update(&mut model, &ScreenEvent::Key(&press(KeyCode::Down)));
        handler.update(&mut model, &ScreenEvent::Key(&press(KeyCode::Enter)));
        let session = model.editor.session().unwrap();
        assert_eq!(
            session.target,
            EditTarget::Profile {
                index: 0,
                field: ProfileField::Email
            }
        );
    }

    #[test]
    fn empty_list_ignores_enter() {
        let mut model = AppModel::new(Config::default(), (100, 30));
        let handler = ProfilesHandler;
        let r = handler.update(&mut model, &ScreenEvent::Key(&press(KeyCode::Enter)));
        assert!(matches!(r, EventResult::Ignored));
        assert_eq!(model.profiles.focus, PaneFocus::List);
    }
}
