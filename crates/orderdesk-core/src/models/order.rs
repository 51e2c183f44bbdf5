use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cash,
    Transfer,
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentType::Cash => write!(f, "Cash"),
            PaymentType::Transfer => write!(f, "Transfer"),
        }
    }
}

impl FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentType::Cash),
            "transfer" => Ok(PaymentType::Transfer),
            other => Err(format!("Unknown payment type '{}' (expected cash or transfer)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub product_id: i64,
    pub product_name_snapshot: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderNote {
    pub id: i64,
    pub note: String,
    pub created_by: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub amount: f64,
    pub payment_type: PaymentType,
    pub received_by: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// An order as returned by the backend.
///
/// `total_amount`, `paid_amount`, `remaining_amount` and the `is_*` flags are
/// computed server-side and only displayed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub created_by: i64,
    pub updated_by: Option<i64>,
    pub cancelled_by: Option<i64>,
    pub cancellation_reason: Option<String>,
    #[serde(with = "timestamp::option", default)]
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivered_by: Option<i64>,
    pub is_cancelled: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub notes: Vec<OrderNote>,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub remaining_amount: f64,
    pub is_fully_paid: bool,
    pub is_delivered: bool,
    pub is_fully_completed: bool,
}

/// Summary status shown in order lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Cancelled,
    Completed,
    Delivered,
    Paid,
    Pending,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Completed => "Completed",
            OrderStatus::Delivered => "Delivered, unpaid",
            OrderStatus::Paid => "Paid, undelivered",
            OrderStatus::Pending => "Pending",
        }
    }
}

impl Order {
    pub fn status(&self) -> OrderStatus {
        if self.is_cancelled {
            OrderStatus::Cancelled
        } else if self.is_fully_completed {
            OrderStatus::Completed
        } else if self.is_delivered {
            OrderStatus::Delivered
        } else if self.is_fully_paid {
            OrderStatus::Paid
        } else {
            OrderStatus::Pending
        }
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Delivery and payment are only accepted on live orders
    pub fn can_deliver(&self) -> bool {
        !self.is_cancelled && !self.is_delivered
    }

    pub fn can_cancel(&self) -> bool {
        !self.is_cancelled && !self.is_delivered
    }

    pub fn can_pay(&self) -> bool {
        !self.is_cancelled && !self.is_fully_paid
    }
}

/// List filter on the orders screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderFilter {
    /// Every order that is not cancelled
    #[default]
    Active,
    /// Not yet delivered and not cancelled
    Pending,
    Delivered,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            OrderFilter::Active => !order.is_cancelled,
            OrderFilter::Pending => !order.is_delivered && !order.is_cancelled,
            OrderFilter::Delivered => order.is_delivered,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            OrderFilter::Active => OrderFilter::Pending,
            OrderFilter::Pending => OrderFilter::Delivered,
            OrderFilter::Delivered => OrderFilter::Active,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderFilter::Active => "All",
            OrderFilter::Pending => "Pending",
            OrderFilter::Delivered => "Delivered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemCreate {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderCreate {
    pub customer_id: i64,
    pub items: Vec<OrderItemCreate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentCreate {
    pub amount: f64,
    pub payment_type: PaymentType,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelRequest {
    pub cancellation_reason: String,
}

/// Body for the order and customer note endpoints
#[derive(Debug, Clone, Serialize)]
pub struct NoteCreate {
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_json(cancelled: bool, delivered: bool, paid: bool) -> String {
        format!(
            r#"{{"id": 12, "customer_id": 7, "created_by": 1, "updated_by": null,
            "cancelled_by": null, "cancellation_reason": null,
            "delivered_at": {delivered_at}, "delivered_by": null,
            "is_cancelled": {cancelled}, "created_at": "2024-02-01T09:00:00",
            "updated_at": "2024-02-01T09:00:00",
            "items": [{{"id": 1, "product_id": 4, "product_name_snapshot": "Rye loaf",
                "quantity": 3, "unit_price": 4.5, "total_price": 13.5}}],
            "payments": [{{"id": 1, "amount": 5.0, "payment_type": "transfer",
                "received_by": 1, "created_at": "2024-02-01T10:00:00"}}],
            "notes": [],
            "total_amount": 13.5, "paid_amount": 5.0, "remaining_amount": 8.5,
            "is_fully_paid": {paid}, "is_delivered": {delivered},
            "is_fully_completed": {completed}}}"#,
            delivered_at = if delivered { "\"2024-02-02T09:00:00\"" } else { "null" },
            cancelled = cancelled,
            delivered = delivered,
            paid = paid,
            completed = delivered && paid,
        )
    }

    fn order(cancelled: bool, delivered: bool, paid: bool) -> Order {
        serde_json::from_str(&order_json(cancelled, delivered, paid)).expect("parse order")
    }

    #[test]
    fn test_parse_order() {
        let o = order(false, true, false);
        assert_eq!(o.items.len(), 1);
        assert_eq!(o.item_count(), 3);
        assert_eq!(o.payments[0].payment_type, PaymentType::Transfer);
        assert!(o.delivered_at.is_some());
        assert_eq!(o.remaining_amount, 8.5);
    }

    #[test]
    fn test_status_precedence() {
        assert_eq!(order(true, false, false).status(), OrderStatus::Cancelled);
        assert_eq!(order(false, true, true).status(), OrderStatus::Completed);
        assert_eq!(order(false, true, false).status(), OrderStatus::Delivered);
        assert_eq!(order(false, false, true).status(), OrderStatus::Paid);
        assert_eq!(order(false, false, false).status(), OrderStatus::Pending);
    }

    #[test]
    fn test_allowed_actions() {
        let pending = order(false, false, false);
        assert!(pending.can_deliver() && pending.can_cancel() && pending.can_pay());

        let done = order(false, true, true);
        assert!(!done.can_deliver() && !done.can_cancel() && !done.can_pay());

        let cancelled = order(true, false, false);
        assert!(!cancelled.can_deliver() && !cancelled.can_pay());
    }

    #[test]
    fn test_filter() {
        let cancelled = order(true, false, false);
        let delivered = order(false, true, false);
        let pending = order(false, false, false);

        assert!(!OrderFilter::Active.matches(&cancelled));
        assert!(OrderFilter::Active.matches(&delivered));
        assert!(OrderFilter::Pending.matches(&pending));
        assert!(!OrderFilter::Pending.matches(&delivered));
        assert!(OrderFilter::Delivered.matches(&delivered));
        assert_eq!(OrderFilter::Delivered.next(), OrderFilter::Active);
    }

    #[test]
    fn test_payment_type_from_str() {
        assert_eq!("Cash".parse::<PaymentType>(), Ok(PaymentType::Cash));
        assert_eq!(" transfer ".parse::<PaymentType>(), Ok(PaymentType::Transfer));
        assert!("card".parse::<PaymentType>().is_err());
    }

    #[test]
    fn test_payment_create_wire_format() {
        let body = PaymentCreate { amount: 10.0, payment_type: PaymentType::Cash };
        let json = serde_json::to_value(&body).expect("serialize payment");
        assert_eq!(json, serde_json::json!({"amount": 10.0, "payment_type": "cash"}));
    }
}
