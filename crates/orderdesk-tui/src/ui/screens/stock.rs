use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Cell, Row, Table},
    Frame,
};

use orderdesk_core::utils::{format_datetime, format_money, truncate_string};

use super::{block, empty_message, render_placeholder, table_state};
use crate::app::App;
use crate::ui::styles::Palette;

pub fn render(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let movements = app.visible_movements();
    let title = format!("Stock movements ({}) - [n]ew", movements.len());

    if movements.is_empty() {
        render_placeholder(frame, area, p, &title, &empty_message(app, "stock movements"));
        return;
    }

    let names = app.product_names();
    let header = Row::new(["When", "Product", "Type", "Qty", "Cost", "Description"].map(Cell::from))
        .style(p.title())
        .height(1);

    let rows: Vec<Row> = movements
        .iter()
        .map(|m| {
            let product = names
                .get(&m.product_id)
                .map(|n| truncate_string(n, 28))
                .unwrap_or_else(|| format!("Product #{}", m.product_id));
            let style = if m.quantity < 0 { p.highlight() } else { p.item() };
            Row::new(vec![
                Cell::from(format_datetime(&m.created_at)),
                Cell::from(product),
                Cell::from(m.movement_type.to_string()),
                Cell::from(format!("{:>+6}", m.quantity)),
                Cell::from(m.total_cost.map(format_money).unwrap_or_default()),
                Cell::from(m.description.clone().unwrap_or_default()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(18),
        Constraint::Fill(2),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Length(11),
        Constraint::Fill(2),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(title, p, true))
        .row_highlight_style(p.selected());

    frame.render_stateful_widget(table, area, &mut table_state(app));
}
