use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use orderdesk_core::models::{Order, OrderStatus};
use orderdesk_core::utils::{format_date, format_datetime, format_money, truncate_string};

use super::{block, empty_message, field, render_placeholder, table_state};
use crate::app::App;
use crate::ui::styles::Palette;

fn status_style(p: &Palette, order: &Order) -> Style {
    match order.status() {
        OrderStatus::Cancelled => p.muted(),
        OrderStatus::Completed => p.success(),
        OrderStatus::Delivered | OrderStatus::Paid => p.highlight(),
        OrderStatus::Pending => p.item(),
    }
}

pub fn render_list(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let orders = app.visible_orders();
    let title = format!(
        "Orders: {} ({}) - [f]ilter [n]ew",
        app.order_filter.label(),
        orders.len()
    );

    if orders.is_empty() {
        render_placeholder(frame, area, p, &title, &empty_message(app, "orders"));
        return;
    }

    let header = Row::new(["#", "Customer", "Date", "Items", "Total", "Due", "Status"].map(Cell::from))
        .style(p.title())
        .height(1);

    let rows: Vec<Row> = orders
        .iter()
        .map(|o| {
            Row::new(vec![
                Cell::from(format!("{:>5}", o.id)),
                Cell::from(truncate_string(&app.customer_name(o.customer_id), 28)),
                Cell::from(format_date(&o.created_at)),
                Cell::from(format!("{:>5}", o.item_count())),
                Cell::from(format!("{:>11}", format_money(o.total_amount))),
                Cell::from(format!("{:>11}", format_money(o.remaining_amount))),
                Cell::from(Span::styled(o.status().label(), status_style(p, o))),
            ])
            .style(p.item())
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Fill(2),
        Constraint::Length(12),
        Constraint::Length(5),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(title, p, true))
        .row_highlight_style(p.selected());

    frame.render_stateful_widget(table, area, &mut table_state(app));
}

pub fn render_detail(frame: &mut Frame, app: &App, id: i64, area: Rect, p: &Palette) {
    let title = format!("Order #{}", id);
    let Some(order) = app.data.order.as_ref().filter(|o| o.id == id) else {
        render_placeholder(frame, area, p, &title, "Loading...");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_order_items(frame, order, chunks[0], p);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(4)])
        .split(chunks[1]);

    render_order_summary(frame, app, order, side[0], p);
    render_order_activity(frame, order, side[1], p);
}

fn render_order_items(frame: &mut Frame, order: &Order, area: Rect, p: &Palette) {
    let header = Row::new(["Product", "Qty", "Price", "Total"].map(Cell::from))
        .style(p.title())
        .height(1);

    let rows: Vec<Row> = order
        .items
        .iter()
        .map(|item| {
            Row::new(vec![
                Cell::from(truncate_string(&item.product_name_snapshot, 32)),
                Cell::from(format!("{:>4}", item.quantity)),
                Cell::from(format!("{:>10}", format_money(item.unit_price))),
                Cell::from(format!("{:>11}", format_money(item.total_price))),
            ])
            .style(p.item())
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(4),
        Constraint::Length(10),
        Constraint::Length(11),
    ];

    let title = format!("Items ({})", order.item_count());
    let table = Table::new(rows, widths).header(header).block(block(title, p, true));
    frame.render_widget(table, area);
}

fn render_order_summary(frame: &mut Frame, app: &App, order: &Order, area: Rect, p: &Palette) {
    let customer = app
        .data
        .customer
        .as_ref()
        .filter(|c| c.id == order.customer_id)
        .map(|c| format!("{} ({})", c.name, c.primary_phone))
        .unwrap_or_else(|| app.customer_name(order.customer_id));

    let mut lines = vec![
        field(p, "Customer", customer),
        field(p, "Placed", format_datetime(&order.created_at)),
        Line::from(vec![
            Span::styled(format!("{:<14}", "Status"), p.highlight()),
            Span::styled(order.status().label(), status_style(p, order)),
        ]),
        field(p, "Total", format_money(order.total_amount)),
        field(p, "Paid", format_money(order.paid_amount)),
        field(p, "Remaining", format_money(order.remaining_amount)),
    ];
    if let Some(delivered) = order.delivered_at {
        lines.push(field(p, "Delivered", format_datetime(&delivered)));
    }
    if let Some(ref reason) = order.cancellation_reason {
        lines.push(field(p, "Cancelled", reason.clone()));
    }

    let mut actions = Vec::new();
    if order.can_deliver() {
        actions.push("[d]eliver");
    }
    if order.can_cancel() {
        actions.push("[c]ancel");
    }
    if order.can_pay() {
        actions.push("[p]ayment");
    }
    actions.push("[a]dd note");
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(actions.join("  "), p.muted())));

    let paragraph = Paragraph::new(lines).block(block("Summary", p, false));
    frame.render_widget(paragraph, area);
}

fn render_order_activity(frame: &mut Frame, order: &Order, area: Rect, p: &Palette) {
    let mut lines = vec![Line::from(Span::styled("Payments", p.title()))];
    if order.payments.is_empty() {
        lines.push(Line::from(Span::styled("  None yet", p.muted())));
    }
    for payment in &order.payments {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}  ", format_date(&payment.created_at)), p.muted()),
            Span::styled(format!("{:>11}", format_money(payment.amount)), p.success()),
            Span::styled(format!("  {}", payment.payment_type), p.item()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Notes", p.title())));
    if order.notes.is_empty() {
        lines.push(Line::from(Span::styled("  None", p.muted())));
    }
    let mut notes: Vec<_> = order.notes.iter().collect();
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    for note in notes {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}  ", format_date(&note.created_at)), p.muted()),
            Span::styled(note.note.clone(), p.item()),
        ]));
    }

    let paragraph = Paragraph::new(lines)
        .block(block("Activity", p, false))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Reference lists shown behind the new-order prompt
pub fn render_create(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut customers: Vec<_> = app.data.customers.iter().collect();
    customers.sort_by_key(|c| c.id);
    let customer_lines: Vec<Line> = customers
        .iter()
        .map(|c| {
            Line::from(vec![
                Span::styled(format!("{:>5}  ", c.id), p.highlight()),
                Span::styled(truncate_string(&c.name, 30), p.item()),
            ])
        })
        .collect();

    let mut products: Vec<_> = app.data.products.iter().filter(|prod| prod.is_active).collect();
    products.sort_by_key(|prod| prod.id);
    let product_lines: Vec<Line> = products
        .iter()
        .map(|prod| {
            Line::from(vec![
                Span::styled(format!("{:>5}  ", prod.id), p.highlight()),
                Span::styled(truncate_string(&prod.name, 30), p.item()),
                Span::styled(format!("  {}", prod.category), p.muted()),
            ])
        })
        .collect();

    frame.render_widget(
        Paragraph::new(customer_lines).block(block("Customers - Enter to start the order", p, true)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(product_lines).block(block("Active products", p, false)),
        chunks[1],
    );
}
