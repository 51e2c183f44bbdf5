use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use orderdesk_core::auth::{Route, View};

use crate::app::{App, AppState, LoginFocus};

use super::screens;
use super::styles::{palette, Palette};

pub fn render(frame: &mut Frame, app: &App) {
    let p = palette(app.config.theme);

    match app.view() {
        View::Loading => render_resolving(frame, p),
        View::Render(Route::Login) => render_login(frame, app, p),
        View::Render(route) => render_shell(frame, app, route, p),
    }

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame, p);
    }
    if matches!(app.state, AppState::ConfirmingQuit) {
        render_confirm_overlay(frame, p, "Are you sure you want to quit?", "quit");
    }
    if matches!(app.state, AppState::ConfirmingLogout) {
        render_confirm_overlay(frame, p, "Log out of this session?", "log out");
    }
    if matches!(app.state, AppState::Prompting) {
        render_prompt_overlay(frame, app, p);
    }
}

/// Shown while the stored session is being checked
fn render_resolving(frame: &mut Frame, p: &Palette) {
    let area = centered_rect_fixed(30, 3, frame.area());
    let paragraph = Paragraph::new(Line::from(Span::styled("Loading...", p.muted())))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(p.border(false)));
    frame.render_widget(paragraph, area);
}

fn render_shell(frame: &mut Frame, app: &App, route: Route, p: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Length(2), // Tabs
            Constraint::Min(8),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, route, chunks[0], p);
    render_tabs(frame, route, chunks[1], p);
    screens::render(frame, app, route, chunks[2], p);
    render_status_bar(frame, app, chunks[3], p);
}

fn render_title_bar(frame: &mut Frame, app: &App, route: Route, area: Rect, p: &Palette) {
    let title = format!("  Orderdesk - {}", route.title());
    let user = app
        .session
        .current_user()
        .map(|u| format!("{} [?] Help", u.display_name()))
        .unwrap_or_else(|| "[?] Help".to_string());

    let padding = (area.width as usize).saturating_sub(title.chars().count() + user.chars().count() + 2);
    let line = Line::from(vec![
        Span::styled(title, p.title()),
        Span::raw(" ".repeat(padding)),
        Span::styled(user, p.muted()),
    ]);

    let block = Block::default().borders(Borders::BOTTOM).border_style(p.muted());
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_tabs(frame: &mut Frame, route: Route, area: Rect, p: &Palette) {
    let section = route.section();

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Route::NAVIGATION.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", p.muted()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        spans.push(Span::styled(label, p.tab(*tab == section)));
    }

    let block = Block::default().borders(Borders::BOTTOM).border_style(p.muted());
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let left = if app.loading {
        " Loading... ".to_string()
    } else if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else {
        String::new()
    };

    let right = if matches!(app.state, AppState::Searching) {
        format!(" Search: {}▌ ", app.search_query)
    } else if !app.search_query.is_empty() {
        format!(" Filter: {} | [r]eload [q]uit ", app.search_query)
    } else {
        " [r]eload [t]heme [L]ogout [q]uit ".to_string()
    };

    let padding = (area.width as usize)
        .saturating_sub(left.chars().count())
        .saturating_sub(right.chars().count());
    let line = Line::from(vec![
        Span::styled(left, p.muted()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, p.muted()),
    ]);
    frame.render_widget(Paragraph::new(line).style(p.status_bar()), area);
}

fn render_login(frame: &mut Frame, app: &App, p: &Palette) {
    let height = if app.login_error.is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(46, height, frame.area());

    let mut lines = vec![
        Line::from(Span::styled("Orderdesk", p.title())).alignment(Alignment::Center),
        Line::from(Span::styled("Sign in to continue", p.muted())).alignment(Alignment::Center),
        Line::from(""),
    ];

    let username_focused = app.login_focus == LoginFocus::Username;
    let cursor = if username_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Username: [", p.muted()),
        Span::styled(
            format!("{:<16}{}", app.login_username, cursor),
            field_style(p, username_focused),
        ),
        Span::styled("]", p.muted()),
    ]));

    let password_focused = app.login_focus == LoginFocus::Password;
    let cursor = if password_focused { "▌" } else { "" };
    let masked = "*".repeat(app.login_password.chars().count().min(16));
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Password: [", p.muted()),
        Span::styled(format!("{:<16}{}", masked, cursor), field_style(p, password_focused)),
        Span::styled("]", p.muted()),
    ]));

    lines.push(Line::from(""));
    let button_focused = app.login_focus == LoginFocus::Button;
    let button = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(button, field_style(p, button_focused)),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), p.error())));
    }

    let block = Block::default().borders(Borders::ALL).border_style(p.border(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_style(p: &Palette, focused: bool) -> Style {
    if focused {
        p.selected()
    } else {
        p.item()
    }
}

fn help_line<'a>(p: &Palette, key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), p.help_key()),
        Span::styled(desc, p.help_desc()),
    ])
}

fn render_help_overlay(frame: &mut Frame, p: &Palette) {
    let area = centered_rect_fixed(56, 31, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let lines = vec![
        Line::from(Span::styled("Orderdesk", p.title())).alignment(Alignment::Center),
        Line::from(Span::styled(format!("version {}", version), p.muted())).alignment(Alignment::Center),
        Line::from(""),
        Line::from(Span::styled(" Navigation", p.highlight())),
        help_line(p, "1-8", "Switch section"),
        help_line(p, "←/→", "Previous/next section"),
        help_line(p, "↑/↓ j/k", "Move selection"),
        help_line(p, "Enter", "Open selected row"),
        help_line(p, "Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" Actions", p.highlight())),
        help_line(p, "/", "Search the current list"),
        help_line(p, "r", "Reload"),
        help_line(p, "t", "Toggle light/dark theme"),
        help_line(p, "L", "Log out"),
        help_line(p, "q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Screens", p.highlight())),
        help_line(p, "n", "New order/customer/product/user/movement"),
        help_line(p, "f", "Orders: cycle filter"),
        help_line(p, "d/c", "Order: deliver/cancel"),
        help_line(p, "p/a", "Order: payment/note"),
        help_line(p, "s/a", "Customer: status/note"),
        help_line(p, "a", "Products, users: toggle active"),
        help_line(p, "e", "Profile: edit full name"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", p.muted()),
            Span::styled("?", p.help_key()),
            Span::styled(" or ", p.muted()),
            Span::styled("Esc", p.help_key()),
            Span::styled(" to close", p.muted()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(p.border(true))
        .style(p.item());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_confirm_overlay(frame: &mut Frame, p: &Palette, question: &str, action: &str) {
    let area = centered_rect_fixed(46, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(question.to_string(), p.highlight())).alignment(Alignment::Center),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", p.muted()),
            Span::styled("[Y]", p.help_key()),
            Span::styled(format!(" to {}, ", action), p.muted()),
            Span::styled("[N]", p.help_key()),
            Span::styled(" to cancel", p.muted()),
        ])
        .alignment(Alignment::Center),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(p.border(true))
        .style(p.item());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_prompt_overlay(frame: &mut Frame, app: &App, p: &Palette) {
    let Some(ref prompt) = app.prompt else {
        return;
    };
    let height = if prompt.error.is_some() { 8 } else { 6 };
    let area = centered_rect_fixed(64, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(format!(" {}", prompt.kind.hint()), p.muted())),
        Line::from(""),
        Line::from(vec![
            Span::styled(" > ", p.help_key()),
            Span::styled(format!("{}▌", prompt.input), p.item()),
        ]),
    ];
    if let Some(ref error) = prompt.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), p.error())));
    }

    let block = Block::default()
        .title(Span::styled(format!(" {} ", prompt.kind.title()), p.title()))
        .borders(Borders::ALL)
        .border_style(p.border(true))
        .style(p.item());
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
