use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use orderdesk_core::utils::{format_money, truncate_string};

use super::{block, render_placeholder};
use crate::app::App;
use crate::ui::styles::Palette;

/// Products at or below this many available units are flagged
const LOW_STOCK_THRESHOLD: i64 = 5;

pub fn render(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let Some(ref report) = app.data.dashboard else {
        render_placeholder(frame, area, p, "Dashboard", "Loading...");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(5)])
        .split(area);

    let greeting = app
        .session
        .current_user()
        .map(|u| format!("Welcome back, {}", u.display_name()))
        .unwrap_or_default();

    let pending_style = |count: i64| if count > 0 { p.highlight() } else { p.success() };
    let lines = vec![
        Line::from(Span::styled(greeting, p.title())),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{:<22}", "Pending deliveries"), p.muted()),
            Span::styled(
                report.pending_deliveries_count.to_string(),
                pending_style(report.pending_deliveries_count),
            ),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<22}", "Awaiting payment"), p.muted()),
            Span::styled(
                report.pending_payments_count.to_string(),
                pending_style(report.pending_payments_count),
            ),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<22}", "Total revenue"), p.muted()),
            Span::styled(format_money(report.total_revenue), p.success()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(block("Overview", p, false)), chunks[0]);

    render_stock_levels(frame, app, chunks[1], p);
}

fn render_stock_levels(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let mut levels: Vec<_> = app.data.stock_levels.iter().collect();
    levels.sort_by_key(|s| s.available_stock);

    let header = Row::new(["Product", "Total", "Reserved", "Available"].map(Cell::from))
        .style(p.title())
        .height(1);

    let rows: Vec<Row> = levels
        .iter()
        .map(|s| {
            let style = if s.available_stock <= LOW_STOCK_THRESHOLD {
                p.error()
            } else {
                p.item()
            };
            Row::new(vec![
                Cell::from(truncate_string(&s.product_name, 40)),
                Cell::from(format!("{:>7}", s.total_stock)),
                Cell::from(format!("{:>8}", s.reserved_stock)),
                Cell::from(format!("{:>9}", s.available_stock)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(7),
        Constraint::Length(8),
        Constraint::Length(9),
    ];

    let title = format!("Stock levels ({})", levels.len());
    let table = Table::new(rows, widths).header(header).block(block(title, p, true));
    frame.render_widget(table, area);
}
