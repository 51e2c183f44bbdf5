//! Content area rendering, one module per section of the shell.

pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod profile;
pub mod revenue;
pub mod stock;
pub mod users;

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, TableState},
    Frame,
};

use orderdesk_core::auth::Route;

use crate::app::App;
use crate::ui::styles::Palette;

pub fn render(frame: &mut Frame, app: &App, route: Route, area: Rect, p: &Palette) {
    match route {
        Route::Root | Route::Dashboard => dashboard::render(frame, app, area, p),
        Route::Orders => orders::render_list(frame, app, area, p),
        Route::CreateOrder => orders::render_create(frame, app, area, p),
        Route::OrderDetail(id) => orders::render_detail(frame, app, id, area, p),
        Route::Customers => customers::render_list(frame, app, area, p),
        Route::CustomerDetail(id) => customers::render_detail(frame, app, id, area, p),
        Route::Products => products::render(frame, app, area, p),
        Route::StockMovements => stock::render(frame, app, area, p),
        Route::CustomerRevenue => revenue::render(frame, app, area, p),
        Route::Users => users::render(frame, app, area, p),
        Route::Profile => profile::render(frame, app, area, p),
        Route::Login => {}
    }
}

/// Bordered block with a title, shared by every screen
fn block<'a>(title: impl Into<String>, p: &Palette, focused: bool) -> Block<'a> {
    Block::default()
        .title(format!(" {} ", title.into()))
        .title_style(p.title())
        .borders(Borders::ALL)
        .border_style(p.border(focused))
}

/// Centered muted message inside a titled block
fn render_placeholder(frame: &mut Frame, area: Rect, p: &Palette, title: &str, message: &str) {
    let paragraph = Paragraph::new(Line::from(Span::styled(message.to_string(), p.muted())))
        .alignment(Alignment::Center)
        .block(block(title, p, true));
    frame.render_widget(paragraph, area);
}

/// Message for a list that has no rows yet
fn empty_message(app: &App, what: &str) -> String {
    if app.loading {
        "Loading...".to_string()
    } else if app.search_query.is_empty() {
        format!("No {}", what)
    } else {
        format!("No {} match '{}'", what, app.search_query)
    }
}

fn table_state(app: &App) -> TableState {
    let mut state = TableState::default();
    state.select(Some(app.selection));
    state
}

/// Label/value line used by the detail panes
fn field<'a>(p: &Palette, label: &'a str, value: impl Into<String>) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<14}", label), p.highlight()),
        Span::styled(value.into(), p.item()),
    ])
}
