use std::error::Error;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;
use tracing::trace;

use wsbar_core::{
    AccountMenuEntry, AccountMenuView, ActionBarView, ActionId, DialogView, FieldKey, LogLevel,
    MenuAnchor, SessionState, ShellState, UiTheme, UserAction,
};
use wsbar_exec::ShellDriver;

use crate::host::StatusNavigator;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const ITEM_SEPARATOR: &str = "│";
const DIAGNOSTIC_LINES: usize = 8;

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

pub fn run(mut driver: ShellDriver, navigator: Arc<StatusNavigator>) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
    let _guard = TuiGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    driver.mount();
    let result = run_app(&mut terminal, &mut driver, &navigator);
    driver.unmount();
    result.map_err(|e| e.into())
}

/// Cursor over the visible controls. UI-local; the shell never sees it.
#[derive(Debug, Default)]
struct BarCursor {
    selected: usize,
}

impl BarCursor {
    fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn left(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn right(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    driver: &mut ShellDriver,
    navigator: &StatusNavigator,
) -> io::Result<()> {
    let mut cursor = BarCursor::default();
    loop {
        driver.pump();
        let view = driver.render();
        cursor.clamp(view.items.len());
        let last_nav = navigator.last();

        terminal.draw(|f| ui(f, driver.state(), &view, &cursor, last_nav.as_deref()))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match handle_key_event(key, driver, &view, &mut cursor) {
            KeyHandlerResult::Continue => {}
            KeyHandlerResult::Exit => return Ok(()),
        }
    }
}

enum KeyHandlerResult {
    Continue,
    Exit,
}

fn handle_key_event(
    key: KeyEvent,
    driver: &mut ShellDriver,
    view: &ActionBarView,
    cursor: &mut BarCursor,
) -> KeyHandlerResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyHandlerResult::Exit;
    }
    if let Some(dialog) = &view.dialog {
        return handle_dialog_keys(key, driver, dialog);
    }
    if view.account_menu.is_some() {
        return handle_account_menu_keys(key, driver);
    }
    handle_bar_keys(key, driver, view, cursor)
}

fn handle_dialog_keys(
    key: KeyEvent,
    driver: &mut ShellDriver,
    dialog: &DialogView,
) -> KeyHandlerResult {
    match key.code {
        KeyCode::Enter => {
            let outcome = driver.handle(UserAction::NameFieldKeyDown(FieldKey::Enter));
            if outcome.prevent_default {
                trace!("enter consumed by name field");
            }
        }
        KeyCode::Esc => {
            driver.handle(UserAction::NameFieldKeyDown(FieldKey::Escape));
        }
        KeyCode::Backspace => {
            let mut value = dialog.name_input.clone();
            value.pop();
            driver.handle(UserAction::EditWorksheetName(value));
        }
        KeyCode::Char(c) => {
            let mut value = dialog.name_input.clone();
            value.push(c);
            driver.handle(UserAction::EditWorksheetName(value));
        }
        _ => {
            driver.handle(UserAction::NameFieldKeyDown(FieldKey::Other));
        }
    }
    KeyHandlerResult::Continue
}

fn handle_account_menu_keys(key: KeyEvent, driver: &mut ShellDriver) -> KeyHandlerResult {
    let action = match key.code {
        KeyCode::Char('p') => UserAction::OpenAccountProfile,
        KeyCode::Char('s') => UserAction::SignOut,
        KeyCode::Esc | KeyCode::Char('a') => UserAction::CloseAccountMenu,
        KeyCode::Char('q') => return KeyHandlerResult::Exit,
        _ => return KeyHandlerResult::Continue,
    };
    driver.handle(action);
    KeyHandlerResult::Continue
}

fn handle_bar_keys(
    key: KeyEvent,
    driver: &mut ShellDriver,
    view: &ActionBarView,
    cursor: &mut BarCursor,
) -> KeyHandlerResult {
    match key.code {
        KeyCode::Char('q') => return KeyHandlerResult::Exit,
        KeyCode::Left | KeyCode::Char('h') => cursor.left(),
        KeyCode::Right | KeyCode::Char('l') => cursor.right(view.items.len()),
        KeyCode::Enter | KeyCode::Char(' ') => activate_item(driver, view, cursor.selected),
        KeyCode::Char('n') => {
            driver.handle(UserAction::Activate(ActionId::NewWorksheet));
        }
        KeyCode::Char('a') => {
            if let Some(index) = view.items.iter().position(|item| item.id == ActionId::AccountMenu)
            {
                cursor.selected = index;
                activate_item(driver, view, index);
            }
        }
        KeyCode::Char(c @ '1'..='9') => {
            let index = (c as usize) - ('1' as usize);
            if index < view.items.len() {
                cursor.selected = index;
                activate_item(driver, view, index);
            }
        }
        _ => {}
    }
    KeyHandlerResult::Continue
}

fn activate_item(driver: &mut ShellDriver, view: &ActionBarView, index: usize) {
    let Some(item) = view.items.get(index) else {
        return;
    };
    let action = if item.id == ActionId::AccountMenu {
        UserAction::ToggleAccountMenu {
            anchor: item_anchor(view, index),
        }
    } else {
        UserAction::Activate(item.id)
    };
    driver.handle(action);
}

/// Terminal cell just under the item's left edge, relative to the screen.
fn item_anchor(view: &ActionBarView, index: usize) -> Option<MenuAnchor> {
    let column = item_columns(view).get(index).copied()?;
    // Bar block: outer margin 1, border 1, one text row.
    Some(MenuAnchor { column, row: 3 })
}

/// Left column of each rendered item, matching the spans `render_action_bar`
/// emits (margin + border, then ` label ` items split by a separator).
fn item_columns(view: &ActionBarView) -> Vec<u16> {
    let mut column: u16 = 2;
    let mut columns = Vec::with_capacity(view.items.len());
    for item in &view.items {
        columns.push(column);
        column = column
            .saturating_add(cell_width(&item.label).saturating_add(2))
            .saturating_add(cell_width(ITEM_SEPARATOR));
    }
    columns
}

fn cell_width(text: &str) -> u16 {
    u16::try_from(text.chars().count()).unwrap_or(u16::MAX)
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    border: Color,
    panel_bg: Color,
    selected_bg: Color,
}

fn palette_for(theme: UiTheme) -> UiPalette {
    match theme {
        UiTheme::Classic => UiPalette {
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::DarkGray,
            border: Color::Gray,
            panel_bg: Color::Black,
            selected_bg: Color::DarkGray,
        },
        UiTheme::Cyberpunk => UiPalette {
            accent: Color::Magenta,
            success: Color::LightGreen,
            warning: Color::LightYellow,
            danger: Color::LightRed,
            muted: Color::Gray,
            border: Color::Magenta,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(58, 0, 58),
        },
        UiTheme::NeonNoir => UiPalette {
            accent: Color::LightBlue,
            success: Color::LightGreen,
            warning: Color::Yellow,
            danger: Color::LightRed,
            muted: Color::Gray,
            border: Color::LightBlue,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(18, 28, 42),
        },
        UiTheme::SolarFlare => UiPalette {
            accent: Color::LightYellow,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::Gray,
            border: Color::LightRed,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(60, 30, 0),
        },
        UiTheme::ForestZen => UiPalette {
            accent: Color::LightGreen,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::Gray,
            border: Color::Green,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(14, 40, 20),
        },
    }
}

fn ui(
    f: &mut ratatui::Frame,
    state: &ShellState,
    view: &ActionBarView,
    cursor: &BarCursor,
    last_nav: Option<&str>,
) {
    let palette = palette_for(view.theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Action bar
            Constraint::Min(0),    // Session + diagnostics
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_action_bar(f, chunks[0], view, cursor, palette);
    render_body(f, chunks[1], state, palette);
    render_footer(f, chunks[2], view, last_nav, palette);

    if let Some(dialog) = &view.dialog {
        render_dialog(f, dialog, palette);
    } else if let Some(menu) = &view.account_menu {
        render_account_menu(f, menu, palette);
    }
}

fn render_action_bar(
    f: &mut ratatui::Frame,
    area: Rect,
    view: &ActionBarView,
    cursor: &BarCursor,
    palette: UiPalette,
) {
    let mut spans = Vec::with_capacity(view.items.len() * 2);
    for (index, item) in view.items.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(
                ITEM_SEPARATOR,
                Style::default().fg(palette.muted),
            ));
        }
        let mut style = if item.href.is_some() {
            Style::default().fg(palette.accent)
        } else {
            Style::default().fg(palette.success)
        };
        if index == cursor.selected {
            style = style.bg(palette.selected_bg).add_modifier(Modifier::BOLD);
        }
        spans.push(Span::styled(format!(" {} ", item.label), style));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(Style::default().bg(palette.panel_bg))
        .title("Worksheets");
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_body(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let session_line = match state.session() {
        // A request from a signed-out session may still be outstanding.
        _ if !state.is_authenticated() => {
            Line::styled("Not signed in", Style::default().fg(palette.muted))
        }
        SessionState::Loaded(profile) => Line::from(vec![
            Span::styled("Signed in as ", Style::default().fg(palette.muted)),
            Span::styled(
                profile.user_name.clone(),
                Style::default().fg(palette.accent),
            ),
        ]),
        SessionState::Loading { .. } => Line::styled(
            "Loading profile...",
            Style::default().fg(palette.muted),
        ),
        SessionState::FetchFailed => Line::styled(
            "Profile unavailable",
            Style::default().fg(palette.warning),
        ),
        SessionState::NotLoaded => Line::styled("", Style::default()),
    };

    let mut lines = vec![session_line, Line::from("")];
    let skip = state.diagnostics.len().saturating_sub(DIAGNOSTIC_LINES);
    for entry in state.diagnostics.iter().skip(skip) {
        let color = match entry.level {
            LogLevel::Error => palette.danger,
            LogLevel::Warn => palette.warning,
            LogLevel::Info => palette.success,
            LogLevel::Debug | LogLevel::Trace => palette.muted,
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] ", entry.source.label()),
                Style::default().fg(color),
            ),
            Span::raw(entry.message.clone()),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(Style::default().bg(palette.panel_bg))
        .title("Session");
    let p = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn render_footer(
    f: &mut ratatui::Frame,
    area: Rect,
    view: &ActionBarView,
    last_nav: Option<&str>,
    palette: UiPalette,
) {
    let mut spans = vec![
        Span::styled("←/→", Style::default().fg(palette.accent)),
        Span::styled(" select ", Style::default().fg(palette.muted)),
        Span::styled("Enter", Style::default().fg(palette.accent)),
        Span::styled(" open ", Style::default().fg(palette.muted)),
        Span::styled("q", Style::default().fg(palette.warning)),
        Span::styled(" quit", Style::default().fg(palette.muted)),
        Span::styled(
            format!("  theme {}", view.theme.label()),
            Style::default().fg(palette.muted),
        ),
    ];
    if let Some(path) = last_nav {
        spans.push(Span::styled("  → ", Style::default().fg(palette.muted)));
        spans.push(Span::styled(path.to_string(), Style::default().fg(palette.accent)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_dialog(f: &mut ratatui::Frame, dialog: &DialogView, palette: UiPalette) {
    let area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, area);

    let input = if dialog.name_input.is_empty() {
        Span::styled(dialog.placeholder, Style::default().fg(palette.muted))
    } else {
        Span::styled(
            dialog.name_input.clone(),
            Style::default().fg(palette.accent),
        )
    };
    let lines = vec![
        Line::from(vec![Span::raw("Name: "), input]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(palette.accent)),
            Span::styled(" create  ", Style::default().fg(palette.muted)),
            Span::styled("Esc", Style::default().fg(palette.warning)),
            Span::styled(" cancel", Style::default().fg(palette.muted)),
        ]),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .style(Style::default().bg(palette.panel_bg))
        .title(dialog.title);
    let p = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn render_account_menu(f: &mut ratatui::Frame, menu: &AccountMenuView, palette: UiPalette) {
    let screen = f.area();
    let area = menu_rect(menu.anchor, screen, 24, menu.entries.len() as u16 + 2);
    f.render_widget(Clear, area);

    let lines: Vec<Line> = menu
        .entries
        .iter()
        .map(|entry| {
            let key = match entry {
                AccountMenuEntry::Profile => "p",
                AccountMenuEntry::SignOut => "s",
            };
            Line::from(vec![
                Span::styled(format!("{key} "), Style::default().fg(palette.accent)),
                Span::raw(entry.label()),
            ])
        })
        .collect();

    let title = menu.user_name.clone().unwrap_or_else(|| "Account".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(Style::default().bg(palette.panel_bg))
        .title(title);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Places the menu at its anchor, shifted left/up to stay on screen. Without
/// an anchor it opens at the right end of the bar.
fn menu_rect(anchor: Option<MenuAnchor>, screen: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(screen.width);
    let height = height.min(screen.height);
    let (column, row) = match anchor {
        Some(anchor) => (anchor.column, anchor.row),
        None => (screen.width.saturating_sub(width + 1), 3),
    };
    let max_x = screen.x + screen.width - width;
    let max_y = screen.y + screen.height - height;
    Rect {
        x: (screen.x + column).min(max_x),
        y: (screen.y + row).min(max_y),
        width,
        height,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
