use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use orderdesk_core::utils::format_datetime;

use super::{block, field, render_placeholder};
use crate::app::App;
use crate::ui::styles::Palette;

pub fn render(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let Some(ref user) = app.data.profile else {
        render_placeholder(frame, area, p, "Profile", "Loading...");
        return;
    };

    let lines = vec![
        field(p, "Username", user.username.clone()),
        field(p, "Full name", user.full_name.clone()),
        field(p, "Status", user.status_label()),
        field(p, "Created", format_datetime(&user.created_at)),
        field(p, "Updated", format_datetime(&user.updated_at)),
        Line::from(""),
        field(p, "Server", app.session.api().base_url().to_string()),
        field(p, "Theme", format!("{:?}", app.config.theme).to_lowercase()),
        Line::from(""),
        Line::from(Span::styled("[e]dit full name  [t]oggle theme  [L]ogout", p.muted())),
    ];

    frame.render_widget(Paragraph::new(lines).block(block("Profile", p, true)), area);
}
