//! Screens still served by the original switch: the install wizard, the
//! main menu, status, updates, settings and the static help/about pages.
//!
//! Each arm mirrors the [`ScreenHandler`](super::handlers::ScreenHandler)
//! contract (enter, handle, render) so a screen can move to the registry
//! without touching the dispatcher.

#![allow(missing_docs)]

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use super::handlers::{EventResult, ScreenEvent, list_nav_key};
use super::input::global_bindings;
use super::layout::{Hit, PaneFocus, PaneScroll, rect};
use super::model::{AppModel, Cmd, NotificationLevel, OpKind, OpRequest, Screen};
use super::theme::{RenderContext, SemanticToken};
use super::update::{Nav, go, persist_config, request_quit, start_operation};
use super::viewport::ListState;
use super::widgets::{self, ListRow, PaneTitles};
use crate::core::config::{MAX_LOG_CAPACITY, ThemeName};
use crate::tools::targets::ConfigTarget;

// ──────────────────── static tables ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Open(Screen),
    Quit,
}

struct MenuEntry {
    label: &'static str,
    description: &'static str,
    action: MenuAction,
}

const MENU: &[MenuEntry] = &[
    MenuEntry {
        label: "Install tools",
        description: "Pick developer tools and install the ones that are missing.",
        action: MenuAction::Open(Screen::ToolSelect),
    },
    MenuEntry {
        label: "Tool status",
        description: "See which registered tools are installed on this machine.",
        action: MenuAction::Open(Screen::Status),
    },
    MenuEntry {
        label: "Updates",
        description: "Check for upgradable packages and update them.",
        action: MenuAction::Open(Screen::Updates),
    },
    MenuEntry {
        label: "Configure tools",
        description: "Edit git, shell, editor, tmux, prompt, terminal, font and ssh settings.",
        action: MenuAction::Open(Screen::Configure(ConfigTarget::Git)),
    },
    MenuEntry {
        label: "Profiles",
        description: "Manage user profiles (name, email, editor, shell).",
        action: MenuAction::Open(Screen::Profiles),
    },
    MenuEntry {
        label: "Backups",
        description: "Snapshot, restore and delete tracked dotfiles.",
        action: MenuAction::Open(Screen::Backups),
    },
    MenuEntry {
        label: "Operation log",
        description: "Scroll through the output of the last install or update.",
        action: MenuAction::Open(Screen::Logs),
    },
    MenuEntry {
        label: "Settings",
        description: "Theme, intro, mouse support and log capacity.",
        action: MenuAction::Open(Screen::Settings),
    },
    MenuEntry {
        label: "Help",
        description: "Key bindings.",
        action: MenuAction::Open(Screen::Help),
    },
    MenuEntry {
        label: "About",
        description: "Version and file locations.",
        action: MenuAction::Open(Screen::About),
    },
    MenuEntry {
        label: "Quit",
        description: "Leave devkit.",
        action: MenuAction::Quit,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingItem {
    Theme,
    Intro,
    Mouse,
    LogCapacity,
}

const SETTINGS: [SettingItem; 4] = [
    SettingItem::Theme,
    SettingItem::Intro,
    SettingItem::Mouse,
    SettingItem::LogCapacity,
];

const LOG_CAPACITY_STEP: usize = 100;

impl SettingItem {
    const fn label(self) -> &'static str {
        match self {
            Self::Theme => "Theme",
            Self::Intro => "Intro animation",
            Self::Mouse => "Mouse support",
            Self::LogCapacity => "Log capacity",
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::Theme => "Color palette. NO_COLOR forces the mono palette.",
            Self::Intro => "Show the intro before the welcome screen on start.",
            Self::Mouse => "Click to select and scroll with the wheel.",
            Self::LogCapacity => "Lines kept in the operation log. Applies to the next operation.",
        }
    }

    fn value(self, model: &AppModel) -> String {
        let console = &model.config.console;
        let on_off = |b: bool| if b { "on" } else { "off" }.to_string();
        match self {
            Self::Theme => console.theme.label().to_string(),
            Self::Intro => on_off(console.intro),
            Self::Mouse => on_off(console.mouse),
            Self::LogCapacity => console.log_capacity.to_string(),
        }
    }

    fn step(self, model: &mut AppModel, direction: i64) {
        match self {
            Self::Theme => {
                let all = ThemeName::ALL;
                let idx = all
                    .iter()
                    .position(|t| *t == model.config.console.theme)
                    .unwrap_or(0);
                let next = if direction < 0 {
                    (idx + all.len() - 1) % all.len()
                } else {
                    (idx + 1) % all.len()
                };
                model.set_theme(all[next]);
            }
            Self::Intro => model.config.console.intro = !model.config.console.intro,
            Self::Mouse => model.config.console.mouse = !model.config.console.mouse,
            Self::LogCapacity => {
                let current = model.config.console.log_capacity;
                let next = if direction < 0 {
                    current.saturating_sub(LOG_CAPACITY_STEP)
                } else {
                    current.saturating_add(LOG_CAPACITY_STEP)
                };
                model.config.console.log_capacity = next.clamp(LOG_CAPACITY_STEP, MAX_LOG_CAPACITY);
            }
        }
    }
}

// ──────────────────── enter ────────────────────

/// Entry side effects for legacy screens.
pub fn on_enter(model: &mut AppModel) -> Cmd {
    let layout = model.layout();
    let visible = layout.list_visible_rows();
    match model.screen() {
        Screen::PlatformCheck => {
            if model.platform.info.is_some() || model.platform.checking {
                return Cmd::None;
            }
            model.platform.checking = true;
            Cmd::DetectPlatform
        }
        Screen::ToolSelect | Screen::Status => {
            let count = model.registry.len();
            model.install.list.clamp(count, visible);
            model.status_view.clamp(count, visible);
            if model.status.begin_scan() {
                Cmd::LoadStatus
            } else {
                Cmd::None
            }
        }
        Screen::Updates => {
            if model.ops.is_running(OpKind::Update) || model.update.loading {
                return Cmd::None;
            }
            model.update.loading = true;
            model.update.error = None;
            Cmd::CheckUpdates
        }
        Screen::MainMenu => {
            model.menu.clamp(MENU.len(), visible);
            Cmd::None
        }
        Screen::Settings => {
            model.settings.clamp(SETTINGS.len(), visible);
            Cmd::None
        }
        _ => Cmd::None,
    }
}

// ──────────────────── input ────────────────────

/// Input for legacy screens.
pub fn handle(model: &mut AppModel, event: &ScreenEvent<'_>) -> EventResult {
    match *event {
        ScreenEvent::Key(key) => handle_key(model, key),
        ScreenEvent::Click { col, row } => handle_click(model, col, row),
        ScreenEvent::Wheel { col, row, delta } => handle_wheel(model, col, row, delta),
    }
}

fn handle_key(model: &mut AppModel, key: &KeyEvent) -> EventResult {
    match model.screen() {
        Screen::Welcome => match key.code {
            KeyCode::Enter => EventResult::Consumed(go(model, Nav::Replace(Screen::PlatformCheck))),
            KeyCode::Char('m') => EventResult::Consumed(go(model, Nav::Reset(Screen::MainMenu))),
            _ => EventResult::Ignored,
        },
        Screen::PlatformCheck => match key.code {
            KeyCode::Enter => {
                if model.platform.checking {
                    return EventResult::consumed();
                }
                if model.platform.info.as_ref().and_then(|p| p.manager).is_none() {
                    model.notify(
                        NotificationLevel::Error,
                        "no supported package manager found (apt, dnf, pacman, brew)",
                    );
                    return EventResult::consumed();
                }
                EventResult::Consumed(go(model, Nav::Replace(Screen::ToolSelect)))
            }
            KeyCode::Char('m') => EventResult::Consumed(go(model, Nav::Reset(Screen::MainMenu))),
            _ => EventResult::Ignored,
        },
        Screen::ToolSelect => tool_select_key(model, key),
        Screen::ConfirmInstall => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let tools: Vec<String> = model.install.selected.iter().cloned().collect();
                EventResult::Consumed(launch_install(model, tools))
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                EventResult::Consumed(go(model, Nav::Replace(Screen::ToolSelect)))
            }
            _ => EventResult::Ignored,
        },
        Screen::Installing => progress_key(model, key, OpKind::Install),
        Screen::UpdateProgress => progress_key(model, key, OpKind::Update),
        Screen::InstallSummary => match key.code {
            KeyCode::Enter => EventResult::Consumed(go(model, Nav::Reset(Screen::MainMenu))),
            KeyCode::Char('r') => {
                let failed: Vec<String> = model
                    .install
                    .report
                    .as_ref()
                    .map(|r| r.failed.iter().map(|f| f.item.clone()).collect())
                    .unwrap_or_default();
                if failed.is_empty() {
                    return EventResult::Ignored;
                }
                EventResult::Consumed(launch_install(model, failed))
            }
            _ => EventResult::Ignored,
        },
        Screen::InstallError => match key.code {
            KeyCode::Char('r') => {
                let tools = model.install.last_request.clone();
                EventResult::Consumed(launch_install(model, tools))
            }
            KeyCode::Char('s') => EventResult::Consumed(go(model, Nav::Replace(Screen::InstallSummary))),
            _ => EventResult::Ignored,
        },
        Screen::MainMenu => {
            let visible = model.layout().list_visible_rows();
            if list_nav_key(&mut model.menu, key, MENU.len(), visible) {
                return EventResult::consumed();
            }
            match key.code {
                KeyCode::Enter | KeyCode::Right => {
                    let index = model.menu.selected;
                    EventResult::Consumed(open_menu_entry(model, index))
                }
                _ => EventResult::Ignored,
            }
        }
        Screen::Status => {
            let visible = model.layout().list_visible_rows();
            let count = model.registry.len();
            if list_nav_key(&mut model.status_view, key, count, visible) {
                return EventResult::consumed();
            }
            match key.code {
                KeyCode::Char('r') => {
                    model.status.invalidate();
                    let cmd = if model.status.begin_scan() {
                        Cmd::LoadStatus
                    } else {
                        Cmd::None
                    };
                    EventResult::Consumed(cmd)
                }
                _ => EventResult::Ignored,
            }
        }
        Screen::Updates => updates_key(model, key),
        Screen::Settings => {
            let visible = model.layout().list_visible_rows();
            if list_nav_key(&mut model.settings, key, SETTINGS.len(), visible) {
                return EventResult::consumed();
            }
            let direction = match key.code {
                KeyCode::Left | KeyCode::Char('h') => -1,
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Char(' ') => 1,
                _ => return EventResult::Ignored,
            };
            let index = model.settings.selected;
            EventResult::Consumed(step_setting(model, index, direction))
        }
        _ => EventResult::Ignored,
    }
}

fn tool_select_key(model: &mut AppModel, key: &KeyEvent) -> EventResult {
    let visible = model.layout().list_visible_rows();
    let count = model.registry.len();
    if list_nav_key(&mut model.install.list, key, count, visible) {
        return EventResult::consumed();
    }
    match key.code {
        KeyCode::Char(' ') => {
            let index = model.install.list.selected;
            toggle_tool(model, index);
            EventResult::consumed()
        }
        KeyCode::Char('a') => {
            if !model.status.ready {
                model.notify(NotificationLevel::Warning, "install status is still loading");
                return EventResult::consumed();
            }
            let missing: Vec<String> = model
                .tool_ids()
                .into_iter()
                .filter(|id| model.status.is_installed(id) == Some(false))
                .map(str::to_string)
                .collect();
            model.install.selected.extend(missing);
            EventResult::consumed()
        }
        KeyCode::Enter => {
            if model.install.selected.is_empty() {
                model.notify(NotificationLevel::Warning, "select at least one tool (space)");
                return EventResult::consumed();
            }
            EventResult::Consumed(go(model, Nav::Replace(Screen::ConfirmInstall)))
        }
        _ => EventResult::Ignored,
    }
}

fn updates_key(model: &mut AppModel, key: &KeyEvent) -> EventResult {
    let visible = model.layout().list_visible_rows();
    let count = model.update.packages.len();
    if list_nav_key(&mut model.update.list, key, count, visible) {
        return EventResult::consumed();
    }
    match key.code {
        KeyCode::Char(' ') => {
            let index = model.update.list.selected;
            toggle_package(model, index);
            EventResult::consumed()
        }
        KeyCode::Char('u') => {
            let packages: Vec<String> = model.update.selected.iter().cloned().collect();
            if packages.is_empty() {
                model.notify(NotificationLevel::Warning, "select packages with space, or press A");
                return EventResult::consumed();
            }
            EventResult::Consumed(launch_update(model, OpRequest::UpdateSelected { packages }))
        }
        KeyCode::Char('A') => EventResult::Consumed(launch_update(model, OpRequest::UpdateAll)),
        KeyCode::Char('r') => {
            if model.update.loading || model.ops.is_running(OpKind::Update) {
                return EventResult::consumed();
            }
            model.update.loading = true;
            model.update.error = None;
            EventResult::Consumed(Cmd::CheckUpdates)
        }
        _ => EventResult::Ignored,
    }
}

fn progress_key(model: &mut AppModel, key: &KeyEvent, kind: OpKind) -> EventResult {
    let page = isize::try_from(model.log.len().clamp(1, 20)).unwrap_or(1);
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => model.log.scroll(1),
        KeyCode::Down | KeyCode::Char('j') => model.log.scroll(-1),
        KeyCode::PageUp => model.log.scroll(page),
        KeyCode::PageDown => model.log.scroll(-page),
        KeyCode::Home => model.log.scroll_to_top(),
        KeyCode::End => model.log.scroll_to_bottom(),
        KeyCode::Enter => {
            if model.ops.is_busy() {
                return EventResult::consumed();
            }
            let cmd = match kind {
                OpKind::Install if model.install.error.is_some() => {
                    go(model, Nav::Replace(Screen::InstallError))
                }
                OpKind::Install if model.install.report.is_some() => {
                    go(model, Nav::Replace(Screen::InstallSummary))
                }
                OpKind::Update => go(model, Nav::Back),
                _ => Cmd::None,
            };
            return EventResult::Consumed(cmd);
        }
        _ => return EventResult::Ignored,
    }
    EventResult::consumed()
}

fn handle_click(model: &mut AppModel, col: u16, row: u16) -> EventResult {
    let screen = model.screen();
    let Some(count) = list_count(model, screen) else {
        return EventResult::Ignored;
    };
    let layout = model.layout();
    let visible = layout.list_visible_rows();
    let Some(state) = list_state(model, screen) else {
        return EventResult::Ignored;
    };
    let scroll = PaneScroll {
        list_scroll: state.scroll,
        list_count: count,
        ..PaneScroll::default()
    };
    let Some(Hit::ListRow(index)) = layout.hit_test(col, row, scroll) else {
        return EventResult::consumed();
    };
    let already = state.selected == index;
    state.select(index, count, visible);
    let cmd = match screen {
        Screen::MainMenu if already => open_menu_entry(model, index),
        Screen::ToolSelect if already => {
            toggle_tool(model, index);
            Cmd::None
        }
        Screen::Updates if already => {
            toggle_package(model, index);
            Cmd::None
        }
        Screen::Settings if already => step_setting(model, index, 1),
        _ => Cmd::None,
    };
    EventResult::Consumed(cmd)
}

fn handle_wheel(model: &mut AppModel, col: u16, row: u16, delta: isize) -> EventResult {
    let screen = model.screen();
    if matches!(screen, Screen::Installing | Screen::UpdateProgress) {
        model.log.scroll(-delta);
        return EventResult::consumed();
    }
    let Some(count) = list_count(model, screen) else {
        return EventResult::Ignored;
    };
    let layout = model.layout();
    if layout.pane_at(col, row) != Some(PaneFocus::List) {
        return EventResult::consumed();
    }
    if let Some(state) = list_state(model, screen) {
        state.scroll_by(delta, count, layout.list_visible_rows());
    }
    EventResult::consumed()
}

fn list_count(model: &AppModel, screen: Screen) -> Option<usize> {
    match screen {
        Screen::MainMenu => Some(MENU.len()),
        Screen::ToolSelect | Screen::Status => Some(model.registry.len()),
        Screen::Updates => Some(model.update.packages.len()),
        Screen::Settings => Some(SETTINGS.len()),
        _ => None,
    }
}

fn list_state(model: &mut AppModel, screen: Screen) -> Option<&mut ListState> {
    match screen {
        Screen::MainMenu => Some(&mut model.menu),
        Screen::ToolSelect => Some(&mut model.install.list),
        Screen::Status => Some(&mut model.status_view),
        Screen::Updates => Some(&mut model.update.list),
        Screen::Settings => Some(&mut model.settings),
        _ => None,
    }
}

// ──────────────────── actions ────────────────────

fn open_menu_entry(model: &mut AppModel, index: usize) -> Cmd {
    match MENU.get(index).map(|e| e.action) {
        Some(MenuAction::Open(screen)) => go(model, Nav::Push(screen)),
        Some(MenuAction::Quit) => request_quit(model),
        None => Cmd::None,
    }
}

fn toggle_tool(model: &mut AppModel, index: usize) {
    let Some(id) = model.tool_ids().get(index).copied() else {
        return;
    };
    if !model.install.selected.remove(id) {
        model.install.selected.insert(id.to_string());
    }
}

fn toggle_package(model: &mut AppModel, index: usize) {
    let Some(name) = model.update.packages.get(index).map(|p| p.name.clone()) else {
        return;
    };
    if !model.update.selected.remove(&name) {
        model.update.selected.insert(name);
    }
}

fn step_setting(model: &mut AppModel, index: usize, direction: i64) -> Cmd {
    let Some(item) = SETTINGS.get(index).copied() else {
        return Cmd::None;
    };
    item.step(model, direction);
    persist_config(model)
}

fn launch_install(model: &mut AppModel, tools: Vec<String>) -> Cmd {
    if tools.is_empty() {
        return Cmd::None;
    }
    let Some(cmd) = start_operation(model, OpRequest::Install {
        tools: tools.clone(),
    }) else {
        return Cmd::None;
    };
    model.install.last_request = tools;
    model.install.report = None;
    model.install.error = None;
    model.install.progress = None;
    Cmd::batch([cmd, go(model, Nav::Replace(Screen::Installing))])
}

fn launch_update(model: &mut AppModel, request: OpRequest) -> Cmd {
    let Some(cmd) = start_operation(model, request) else {
        return Cmd::None;
    };
    model.update.report = None;
    model.update.progress = None;
    Cmd::batch([cmd, go(model, Nav::Push(Screen::UpdateProgress))])
}

// ──────────────────── render ────────────────────

type StyledRow = (String, SemanticToken);

fn line(text: impl Into<String>, token: SemanticToken) -> StyledRow {
    (text.into(), token)
}

/// Paint a legacy screen body.
pub fn render(model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
    let layout = model.layout();
    let body = layout.body;
    let screen = model.screen();
    match screen {
        Screen::Intro => render_intro(model, frame, ctx),
        Screen::Welcome => widgets::draw_panel(frame, body, "Welcome to devkit", &welcome_lines(), ctx),
        Screen::PlatformCheck => {
            widgets::draw_panel(frame, body, "Platform check", &platform_lines(model, ctx), ctx);
        }
        Screen::ToolSelect | Screen::Status => render_tools(model, frame, ctx),
        Screen::ConfirmInstall => {
            widgets::draw_panel(frame, body, "Confirm install", &confirm_lines(model), ctx);
        }
        Screen::Installing | Screen::UpdateProgress => render_progress(model, frame, ctx),
        Screen::InstallSummary => {
            widgets::draw_panel(frame, body, "Install summary", &summary_lines(model), ctx);
        }
        Screen::InstallError => {
            widgets::draw_panel(frame, body, "Install failed", &error_lines(model), ctx);
        }
        Screen::MainMenu => render_menu(model, frame, ctx),
        Screen::Updates => render_updates(model, frame, ctx),
        Screen::Settings => render_settings(model, frame, ctx),
        Screen::Help => widgets::draw_panel(frame, body, "Help", &help_lines(), ctx),
        Screen::About => widgets::draw_panel(frame, body, "About devkit", &about_lines(model), ctx),
        Screen::Backups | Screen::Profiles | Screen::Logs | Screen::Configure(_) => {
            widgets::draw_panel(frame, body, screen.title(), &[], ctx);
        }
    }
}

const BANNER: [&str; 5] = [
    "     _            _    _ _   ",
    "  __| | _____   _| | _(_) |_ ",
    " / _` |/ _ \\ \\ / / |/ / | __|",
    "| (_| |  __/\\ V /|   <| | |_ ",
    " \\__,_|\\___| \\_/ |_|\\_\\_|\\__|",
];

fn render_intro(model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
    let body = model.layout().body;
    let accent = widgets::style(ctx, SemanticToken::Accent).add_modifier(Modifier::BOLD);
    let muted = widgets::style(ctx, SemanticToken::Muted);
    let banner_width = BANNER[0].chars().count();
    let total = model.config.console.intro_frames.max(1);
    let done = total.saturating_sub(model.intro_ticks_left);
    let filled = usize::try_from(u64::from(done) * u64::try_from(banner_width).unwrap_or(0) / u64::from(total)).unwrap_or(0);
    let bar = "\u{2588}".repeat(filled) + &"\u{2591}".repeat(banner_width.saturating_sub(filled));

    let mut text: Vec<Line<'_>> = BANNER.iter().map(|row| Line::styled(*row, accent)).collect();
    text.push(Line::default());
    text.push(Line::styled(bar, muted));
    text.push(Line::styled(format!("{:<banner_width$}", "press any key"), muted));

    let top = body.y + body.height.saturating_sub(8) / 2;
    let area = rect(body.x, top, body.width, body.bottom().saturating_sub(top));
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

fn welcome_lines() -> Vec<StyledRow> {
    vec![
        line("devkit sets up a developer workstation in a few steps:", SemanticToken::Neutral),
        line(String::new(), SemanticToken::Neutral),
        line("  1. detect your platform and package manager", SemanticToken::Neutral),
        line("  2. choose the tools you want", SemanticToken::Neutral),
        line("  3. install them, streaming the package manager's output", SemanticToken::Neutral),
        line(String::new(), SemanticToken::Neutral),
        line("Press enter to start, or m for the main menu.", SemanticToken::Accent),
    ]
}

fn platform_lines(model: &AppModel, ctx: &RenderContext<'_>) -> Vec<StyledRow> {
    let Some(info) = &model.platform.info else {
        return vec![line(format!("{} detecting platform", ctx.spinner()), SemanticToken::Warning)];
    };
    let mut lines = vec![
        line(format!("OS            {}", info.os), SemanticToken::Neutral),
        line(
            format!("Distribution  {}", info.distro.as_deref().unwrap_or("unknown")),
            SemanticToken::Neutral,
        ),
        line(format!("Architecture  {}", info.arch), SemanticToken::Neutral),
    ];
    match info.manager {
        Some(manager) => {
            lines.push(line(format!("Package mgr   {}", manager.label()), SemanticToken::Success));
            lines.push(line(String::new(), SemanticToken::Neutral));
            lines.push(line("Press enter to choose tools.", SemanticToken::Accent));
        }
        None => {
            lines.push(line("Package mgr   none found", SemanticToken::Danger));
            lines.push(line(String::new(), SemanticToken::Neutral));
            lines.push(line(
                "Installing needs apt, dnf, pacman or brew. Press m for the main menu.",
                SemanticToken::Warning,
            ));
        }
    }
    lines
}

fn render_tools(model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
    let layout = model.layout();
    let selecting = model.screen() == Screen::ToolSelect;
    let state = if selecting {
        &model.install.list
    } else {
        &model.status_view
    };
    let subtitle = if model.status.loading {
        format!("{} scanning", ctx.spinner())
    } else if selecting {
        format!("{} selected", model.install.selected.len())
    } else {
        let installed = model.status.installed.values().filter(|v| **v).count();
        format!("{installed}/{} installed", model.registry.len())
    };
    let titles = PaneTitles {
        list: if selecting { "Tools" } else { "Status" },
        list_subtitle: &subtitle,
        detail: "Details",
    };
    widgets::draw_dual_pane(frame, &layout, titles, PaneFocus::List, ctx);

    let rows: Vec<ListRow> = model
        .registry
        .all()
        .iter()
        .map(|tool| {
            let label = if selecting {
                let mark = if model.install.selected.contains(tool.id) { "[x]" } else { "[ ]" };
                format!("{mark} {}", tool.name)
            } else {
                tool.name.to_string()
            };
            match model.status.is_installed(tool.id) {
                Some(true) => ListRow::badged(label, "\u{2713}", SemanticToken::Success),
                Some(false) => ListRow::badged(label, "\u{2717}", SemanticToken::Danger),
                None => ListRow::badged(label, "?", SemanticToken::Muted),
            }
        })
        .collect();
    widgets::draw_list(frame, &layout, &rows, state, true, ctx);

    let mut lines = Vec::new();
    if let Some(tool) = model.registry.all().get(state.selected) {
        lines.push(line(tool.name, SemanticToken::Accent));
        lines.push(line(tool.description, SemanticToken::Neutral));
        lines.push(line(String::new(), SemanticToken::Neutral));
        let manager = model.status.manager.or_else(|| model.platform.info.as_ref().and_then(|p| p.manager));
        match manager.map(|m| (m, tool.packages_for(m))) {
            Some((m, Some(packages))) => {
                lines.push(line(format!("{} packages: {}", m.label(), packages.join(", ")), SemanticToken::Muted));
            }
            Some((m, None)) => {
                lines.push(line(format!("not packaged for {}", m.label()), SemanticToken::Warning));
            }
            None => {}
        }
        let status = match model.status.is_installed(tool.id) {
            Some(true) => line("installed", SemanticToken::Success),
            Some(false) => line("not installed", SemanticToken::Danger),
            None if model.status.loading => line(format!("{} checking", ctx.spinner()), SemanticToken::Muted),
            None => line("status unknown", SemanticToken::Muted),
        };
        lines.push(status);
    }
    if let Some(err) = &model.status.error {
        lines.push(line(String::new(), SemanticToken::Neutral));
        lines.push(line(format!("[{}] {}", err.code, err.message), SemanticToken::Danger));
    }
    widgets::draw_detail_text(frame, &layout, &lines, 0, ctx);
}

fn confirm_lines(model: &AppModel) -> Vec<StyledRow> {
    let manager = model.platform.info.as_ref().and_then(|p| p.manager).or(model.status.manager);
    let mut lines = vec![line(
        format!("Install {} tool(s):", model.install.selected.len()),
        SemanticToken::Neutral,
    )];
    for id in &model.install.selected {
        let detail = match (model.registry.get(id), manager) {
            (Ok(tool), Some(m)) => tool
                .packages_for(m)
                .map_or_else(|| "skipped: not packaged".to_string(), |p| p.join(" ")),
            (Ok(_), None) => String::new(),
            (Err(_), _) => "unknown tool".to_string(),
        };
        lines.push(line(format!("  \u{2022} {id:<10} {detail}"), SemanticToken::Neutral));
    }
    lines.push(line(String::new(), SemanticToken::Neutral));
    if manager.is_some_and(|m| m.mutates_as_root()) {
        lines.push(line("sudo may ask for your password before the install starts.", SemanticToken::Warning));
    }
    lines.push(line("Proceed? [y/n]", SemanticToken::Accent));
    lines
}

fn render_progress(model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
    let layout = model.layout();
    let installing = model.screen() == Screen::Installing;
    let kind = if installing { OpKind::Install } else { OpKind::Update };
    let progress = if installing {
        &model.install.progress
    } else {
        &model.update.progress
    };
    let report = if installing {
        model.install.report.as_ref()
    } else {
        model.update.report.as_ref()
    };

    let status = if model.ops.pending().is_some_and(|p| p.awaiting_privilege) {
        line("waiting for sudo authentication", SemanticToken::Warning)
    } else if model.ops.is_running(kind) || model.ops.pending().is_some() {
        match progress {
            Some((p, item)) => line(
                format!("{} [{}/{}] {item}", ctx.spinner(), p.index + 1, p.total),
                SemanticToken::Accent,
            ),
            None => line(format!("{} starting", ctx.spinner()), SemanticToken::Accent),
        }
    } else if let Some(report) = report {
        let token = if report.is_clean() {
            SemanticToken::Success
        } else {
            SemanticToken::Danger
        };
        line(
            format!(
                "done: {} ok, {} failed, {} skipped \u{00b7} enter to continue",
                report.succeeded.len(),
                report.failed.len(),
                report.skipped.len()
            ),
            token,
        )
    } else {
        line("idle", SemanticToken::Muted)
    };
    let title = if installing { "Installing" } else { "Updating" };
    widgets::draw_panel(frame, layout.body, title, &[status], ctx);
    widgets::draw_log(frame, widgets::log_viewport(model.screen(), layout.body), &model.log, ctx);
}

fn summary_lines(model: &AppModel) -> Vec<StyledRow> {
    let Some(report) = &model.install.report else {
        return vec![line("Nothing has been installed yet.", SemanticToken::Muted)];
    };
    let mut lines = vec![line(
        format!(
            "{} installed \u{00b7} {} failed \u{00b7} {} skipped \u{00b7} {:.1}s",
            report.succeeded.len(),
            report.failed.len(),
            report.skipped.len(),
            Duration::from_millis(report.duration_ms).as_secs_f64()
        ),
        if report.is_clean() {
            SemanticToken::Success
        } else {
            SemanticToken::Warning
        },
    )];
    lines.push(line(String::new(), SemanticToken::Neutral));
    for id in &report.succeeded {
        lines.push(line(format!("  \u{2713} {id}"), SemanticToken::Success));
    }
    for failure in &report.failed {
        lines.push(line(
            format!("  \u{2717} {}  [{}] {}", failure.item, failure.error.code, failure.error.message),
            SemanticToken::Danger,
        ));
    }
    for id in &report.skipped {
        lines.push(line(format!("  - {id} (skipped)"), SemanticToken::Muted));
    }
    lines.push(line(String::new(), SemanticToken::Neutral));
    let hint = if report.failed.is_empty() {
        "Press enter for the main menu."
    } else {
        "Press r to retry the failed tools, enter for the main menu."
    };
    lines.push(line(hint, SemanticToken::Accent));
    lines
}

fn error_lines(model: &AppModel) -> Vec<StyledRow> {
    let mut lines = Vec::new();
    match &model.install.error {
        Some(err) => {
            lines.push(line(format!("[{}] {}", err.code, err.message), SemanticToken::Danger));
            if !err.last_lines.is_empty() {
                lines.push(line(String::new(), SemanticToken::Neutral));
                lines.push(line("Last output:", SemanticToken::Muted));
                for out in &err.last_lines {
                    lines.push(line(format!("  {out}"), SemanticToken::Muted));
                }
            }
        }
        None => lines.push(line("The install did not complete.", SemanticToken::Danger)),
    }
    lines.push(line(String::new(), SemanticToken::Neutral));
    lines.push(line("r retry \u{00b7} s skip to summary \u{00b7} q quit", SemanticToken::Accent));
    lines
}

fn render_menu(model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
    let layout = model.layout();
    let subtitle = format!("v{}", env!("CARGO_PKG_VERSION"));
    let titles = PaneTitles {
        list: "devkit",
        list_subtitle: &subtitle,
        detail: MENU.get(model.menu.selected).map_or("", |e| e.label),
    };
    widgets::draw_dual_pane(frame, &layout, titles, PaneFocus::List, ctx);
    let rows: Vec<ListRow> = MENU
        .iter()
        .map(|entry| match entry.action {
            MenuAction::Open(Screen::Backups) if model.ops.is_running(OpKind::Backup) => {
                ListRow::badged(entry.label, ctx.spinner().to_string(), SemanticToken::Warning)
            }
            MenuAction::Open(Screen::Updates) if model.ops.is_running(OpKind::Update) => {
                ListRow::badged(entry.label, ctx.spinner().to_string(), SemanticToken::Warning)
            }
            MenuAction::Open(Screen::Updates) if !model.update.packages.is_empty() => ListRow::badged(
                entry.label,
                model.update.packages.len().to_string(),
                SemanticToken::Accent,
            ),
            _ => ListRow::plain(entry.label),
        })
        .collect();
    widgets::draw_list(frame, &layout, &rows, &model.menu, true, ctx);
    let lines: Vec<StyledRow> = MENU
        .get(model.menu.selected)
        .map(|e| vec![line(e.description, SemanticToken::Neutral)])
        .unwrap_or_default();
    widgets::draw_detail_text(frame, &layout, &lines, 0, ctx);
}

fn render_updates(model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
    let layout = model.layout();
    let state = &model.update;
    let subtitle = if state.loading {
        format!("{} checking", ctx.spinner())
    } else {
        format!("{} available \u{00b7} {} selected", state.packages.len(), state.selected.len())
    };
    let titles = PaneTitles {
        list: "Upgradable",
        list_subtitle: &subtitle,
        detail: "Package",
    };
    widgets::draw_dual_pane(frame, &layout, titles, PaneFocus::List, ctx);
    let rows: Vec<ListRow> = state
        .packages
        .iter()
        .map(|p| {
            let mark = if state.selected.contains(&p.name) { "[x]" } else { "[ ]" };
            ListRow::plain(format!("{mark} {}", p.name))
        })
        .collect();
    widgets::draw_list(frame, &layout, &rows, &state.list, true, ctx);

    let mut lines = Vec::new();
    if let Some(err) = &state.error {
        lines.push(line(format!("[{}] {}", err.code, err.message), SemanticToken::Danger));
    } else if let Some(p) = state.packages.get(state.list.selected) {
        lines.push(line(p.name.clone(), SemanticToken::Accent));
        lines.push(line(format!("installed  {}", p.current), SemanticToken::Neutral));
        lines.push(line(format!("available  {}", p.available), SemanticToken::Success));
    } else if !state.loading {
        lines.push(line("Everything is up to date.", SemanticToken::Success));
    }
    if let Some(report) = &state.report {
        lines.push(line(String::new(), SemanticToken::Neutral));
        lines.push(line(
            format!("last run: {} updated, {} failed", report.succeeded.len(), report.failed.len()),
            SemanticToken::Muted,
        ));
    }
    widgets::draw_detail_text(frame, &layout, &lines, 0, ctx);
}

fn render_settings(model: &AppModel, frame: &mut Frame, ctx: &RenderContext<'_>) {
    let layout = model.layout();
    let titles = PaneTitles {
        list: "Settings",
        list_subtitle: "\u{2190}\u{2192} to change",
        detail: SETTINGS.get(model.settings.selected).map_or("", |s| s.label()),
    };
    widgets::draw_dual_pane(frame, &layout, titles, PaneFocus::List, ctx);
    let rows: Vec<ListRow> = SETTINGS
        .iter()
        .map(|s| ListRow::badged(s.label(), s.value(model), SemanticToken::Accent))
        .collect();
    widgets::draw_list(frame, &layout, &rows, &model.settings, true, ctx);
    let lines: Vec<StyledRow> = SETTINGS
        .get(model.settings.selected)
        .map(|s| {
            vec![
                line(s.description(), SemanticToken::Neutral),
                line(String::new(), SemanticToken::Neutral),
                line(format!("current: {}", s.value(model)), SemanticToken::Accent),
            ]
        })
        .unwrap_or_default();
    widgets::draw_detail_text(frame, &layout, &lines, 0, ctx);
}

fn help_lines() -> Vec<StyledRow> {
    let mut lines: Vec<StyledRow> = global_bindings()
        .iter()
        .map(|b| line(format!("{:<12} {}", b.keys, b.description), SemanticToken::Neutral))
        .collect();
    lines.push(line(String::new(), SemanticToken::Neutral));
    lines.push(line(
        "Lists: \u{2191}\u{2193}/j k move, pgup/pgdn page, home/end jump.",
        SemanticToken::Muted,
    ));
    lines.push(line(
        "Two-pane screens: tab switches pane, \u{2190}\u{2192} change a value, enter edits text.",
        SemanticToken::Muted,
    ));
    lines.push(line(
        "Clicking the left or right half of a value decrements or increments it.",
        SemanticToken::Muted,
    ));
    lines
}

fn about_lines(model: &AppModel) -> Vec<StyledRow> {
    let paths = &model.config.paths;
    vec![
        line(format!("devkit {}", env!("CARGO_PKG_VERSION")), SemanticToken::Accent),
        line(String::new(), SemanticToken::Neutral),
        line(format!("config        {}", paths.config_file.display()), SemanticToken::Neutral),
        line(format!("backups       {}", paths.backup_dir.display()), SemanticToken::Neutral),
        line(format!("activity log  {}", paths.activity_log.display()), SemanticToken::Neutral),
        line(format!("tools         {}", model.registry.len()), SemanticToken::Neutral),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::platform::pkg::{ManagerKind, PlatformInfo};
    use crossterm::event::KeyModifiers;

    fn model_at(screen: Screen) -> AppModel {
        let mut cfg = Config::default();
        cfg.console.intro = false;
        let mut model = AppModel::new(cfg, (100, 30));
        model.nav.navigate(screen);
        model
    }

    fn press(model: &mut AppModel, code: KeyCode) -> EventResult {
        let key = KeyEvent::new(code, KeyModifiers::NONE);
        handle(model, &ScreenEvent::Key(&key))
    }

    #[test]
    fn entering_tool_select_scans_once() {
        let mut model = model_at(Screen::ToolSelect);
        assert!(matches!(on_enter(&mut model), Cmd::LoadStatus));
        assert!(on_enter(&mut model).is_none());
    }

    #[test]
    fn confirm_launches_install_and_shows_progress() {
        let mut model = model_at(Screen::ToolSelect);
        press(&mut model, KeyCode::Char(' '));
        assert_eq!(model.install.selected.len(), 1);
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.screen(), Screen::ConfirmInstall);
        press(&mut model, KeyCode::Char('y'));
        assert_eq!(model.screen(), Screen::Installing);
        assert!(model.ops.is_busy());
        assert_eq!(model.install.last_request.len(), 1);
    }

    #[test]
    fn platform_without_manager_blocks_tool_select() {
        let mut model = model_at(Screen::PlatformCheck);
        model.platform.info = Some(PlatformInfo {
            os: "linux".into(),
            distro: None,
            arch: "x86_64".into(),
            manager: None,
        });
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.screen(), Screen::PlatformCheck);
        assert_eq!(model.notifications.len(), 1);

        model.platform.info.as_mut().unwrap().manager = Some(ManagerKind::Apt);
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.screen(), Screen::ToolSelect);
    }

    #[test]
    fn settings_cycle_theme_and_persist() {
        let mut model = model_at(Screen::Settings);
        let result = press(&mut model, KeyCode::Right);
        assert!(matches!(result, EventResult::Consumed(Cmd::SaveConfig(_))));
        assert_eq!(model.config.console.theme, ThemeName::HighContrast);
    }

    #[test]
    fn menu_click_selects_then_opens() {
        let mut model = model_at(Screen::MainMenu);
        let layout = model.layout();
        let row = layout.list_row_for(2, 0).unwrap();
        handle(&mut model, &ScreenEvent::Click { col: 3, row });
        assert_eq!(model.menu.selected, 2);
        assert_eq!(model.screen(), Screen::MainMenu);
        handle(&mut model, &ScreenEvent::Click { col: 3, row });
        assert_eq!(model.screen(), Screen::Updates);
        assert_eq!(model.nav.history(), &[Screen::MainMenu]);
    }

    #[test]
    fn menu_entries_are_drawn_on_their_click_rows() {
        let model = model_at(Screen::MainMenu);
        let layout = model.layout();
        let rows = crate::tui::render::draw_rows(100, 30, |frame| {
            crate::tui::render::render(&model, frame);
        });
        for (index, entry) in MENU.iter().enumerate() {
            let row = layout.list_row_for(index, 0).unwrap();
            assert!(rows[usize::from(row)].contains(entry.label), "{} not on row {row}", entry.label);
        }
    }

    #[test]
    fn install_error_skip_goes_to_summary() {
        let mut model = model_at(Screen::InstallError);
        press(&mut model, KeyCode::Char('s'));
        assert_eq!(model.screen(), Screen::InstallSummary);
    }
}
