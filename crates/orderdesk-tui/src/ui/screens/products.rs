use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Cell, Row, Table},
    Frame,
};

use orderdesk_core::utils::{format_date, truncate_string};

use super::{block, empty_message, render_placeholder, table_state};
use crate::app::App;
use crate::ui::styles::Palette;

pub fn render(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let products = app.visible_products();
    let active = products.iter().filter(|prod| prod.is_active).count();
    let title = format!(
        "Products ({} active of {}) - [n]ew [a]ctive toggle",
        active,
        products.len()
    );

    if products.is_empty() {
        render_placeholder(frame, area, p, &title, &empty_message(app, "products"));
        return;
    }

    let header = Row::new(["#", "Name", "Category", "Cost notes", "State", "Added"].map(Cell::from))
        .style(p.title())
        .height(1);

    let rows: Vec<Row> = products
        .iter()
        .map(|prod| {
            let style = if prod.is_active { p.item() } else { p.muted() };
            Row::new(vec![
                Cell::from(format!("{:>4}", prod.id)),
                Cell::from(truncate_string(&prod.name, 32)),
                Cell::from(prod.category.clone()),
                Cell::from(prod.cost_metadata.clone().unwrap_or_default()),
                Cell::from(if prod.is_active { "Active" } else { "Inactive" }),
                Cell::from(format_date(&prod.created_at)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(8),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(title, p, true))
        .row_highlight_style(p.selected());

    frame.render_stateful_widget(table, area, &mut table_state(app));
}
