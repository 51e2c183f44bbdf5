use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Cell, Row, Table},
    Frame,
};

use orderdesk_core::utils::{format_money, truncate_string};

use super::{block, empty_message, render_placeholder, table_state};
use crate::app::App;
use crate::ui::styles::Palette;

pub fn render(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let rows_data = app.visible_revenue();
    let total: f64 = rows_data.iter().map(|r| r.total_revenue).sum();
    let title = format!("Revenue by customer - {} total", format_money(total));

    if rows_data.is_empty() {
        render_placeholder(frame, area, p, &title, &empty_message(app, "customers"));
        return;
    }

    let header = Row::new(["Rank", "Customer", "Revenue", "Share"].map(Cell::from))
        .style(p.title())
        .height(1);

    let rows: Vec<Row> = rows_data
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let share = if total > 0.0 { r.total_revenue / total * 100.0 } else { 0.0 };
            Row::new(vec![
                Cell::from(format!("{:>4}", i + 1)),
                Cell::from(truncate_string(&r.customer_name, 40)),
                Cell::from(format!("{:>13}", format_money(r.total_revenue))),
                Cell::from(format!("{:>5.1}%", share)),
            ])
            .style(p.item())
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Fill(1),
        Constraint::Length(13),
        Constraint::Length(7),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(title, p, true))
        .row_highlight_style(p.selected());

    frame.render_stateful_widget(table, area, &mut table_state(app));
}
