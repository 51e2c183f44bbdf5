use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use orderdesk_core::models::Customer;
use orderdesk_core::utils::{format_date, format_money, truncate_string};

use super::{block, empty_message, field, render_placeholder, table_state};
use crate::app::App;
use crate::ui::styles::Palette;

pub fn render_list(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let customers = app.visible_customers();
    let title = format!("Customers ({}) - [n]ew", customers.len());

    if customers.is_empty() {
        render_placeholder(frame, area, p, &title, &empty_message(app, "customers"));
        return;
    }

    let header = Row::new(["Name", "Phone", "Status", "Since"].map(Cell::from))
        .style(p.title())
        .height(1);

    let rows: Vec<Row> = customers
        .iter()
        .map(|c| {
            Row::new(vec![
                Cell::from(truncate_string(&c.name, 36)),
                Cell::from(c.primary_phone.clone()),
                Cell::from(c.status_label().to_string()),
                Cell::from(format_date(&c.created_at)),
            ])
            .style(p.item())
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Length(16),
        Constraint::Fill(1),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(title, p, true))
        .row_highlight_style(p.selected());

    frame.render_stateful_widget(table, area, &mut table_state(app));
}

pub fn render_detail(frame: &mut Frame, app: &App, id: i64, area: Rect, p: &Palette) {
    let Some(customer) = app.data.customer.as_ref().filter(|c| c.id == id) else {
        render_placeholder(frame, area, p, &format!("Customer #{}", id), "Loading...");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_profile(frame, customer, chunks[0], p);
    render_orders(frame, app, chunks[1], p);
}

fn render_profile(frame: &mut Frame, customer: &Customer, area: Rect, p: &Palette) {
    let mut lines = vec![
        field(p, "Phone", customer.primary_phone.clone()),
        field(
            p,
            "Other phones",
            customer.additional_phones.clone().unwrap_or_else(|| "-".to_string()),
        ),
        field(p, "Status", customer.status_label().to_string()),
        field(p, "Since", format_date(&customer.created_at)),
        Line::from(""),
        Line::from(Span::styled("Status history", p.title())),
    ];

    let mut statuses: Vec<_> = customer.statuses.iter().collect();
    statuses.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
    if statuses.is_empty() {
        lines.push(Line::from(Span::styled("  None", p.muted())));
    }
    for status in statuses {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}  ", format_date(&status.assigned_at)), p.muted()),
            Span::styled(status.status.clone(), p.item()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Notes", p.title())));
    let notes = customer.notes_newest_first();
    if notes.is_empty() {
        lines.push(Line::from(Span::styled("  None", p.muted())));
    }
    for note in notes {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}  ", format_date(&note.created_at)), p.muted()),
            Span::styled(note.note.clone(), p.item()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("[s]tatus  [a]dd note", p.muted())));

    let paragraph = Paragraph::new(lines)
        .block(block(customer.name.clone(), p, false))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_orders(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let orders = app.customer_orders();
    let outstanding: f64 = orders
        .iter()
        .filter(|o| !o.is_cancelled)
        .map(|o| o.remaining_amount)
        .sum();
    let title = format!("Orders ({}) - {} outstanding", orders.len(), format_money(outstanding));

    let header = Row::new(["#", "Date", "Total", "Status"].map(Cell::from))
        .style(p.title())
        .height(1);

    let rows: Vec<Row> = orders
        .iter()
        .map(|o| {
            Row::new(vec![
                Cell::from(format!("{:>5}", o.id)),
                Cell::from(format_date(&o.created_at)),
                Cell::from(format!("{:>11}", format_money(o.total_amount))),
                Cell::from(o.status().label()),
            ])
            .style(p.item())
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Length(12),
        Constraint::Length(11),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(title, p, true))
        .row_highlight_style(p.selected());

    frame.render_stateful_widget(table, area, &mut table_state(app));
}
