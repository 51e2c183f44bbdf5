use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Cell, Row, Table},
    Frame,
};

use orderdesk_core::utils::format_date;

use super::{block, empty_message, render_placeholder, table_state};
use crate::app::App;
use crate::ui::styles::Palette;

pub fn render(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let users = app.visible_users();
    let title = format!("Users ({}) - [n]ew [a]ctive toggle", users.len());

    if users.is_empty() {
        render_placeholder(frame, area, p, &title, &empty_message(app, "users"));
        return;
    }

    let me = app.session.current_user().map(|u| u.id);
    let header = Row::new(["Username", "Full name", "Status", "Created"].map(Cell::from))
        .style(p.title())
        .height(1);

    let rows: Vec<Row> = users
        .iter()
        .map(|u| {
            let style = if u.is_active { p.item() } else { p.muted() };
            let username = if Some(u.id) == me {
                format!("{} (you)", u.username)
            } else {
                u.username.clone()
            };
            Row::new(vec![
                Cell::from(username),
                Cell::from(u.full_name.clone()),
                Cell::from(u.status_label()),
                Cell::from(format_date(&u.created_at)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Fill(2),
        Constraint::Length(9),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(title, p, true))
        .row_highlight_style(p.selected());

    frame.render_stateful_widget(table, area, &mut table_state(app));
}
