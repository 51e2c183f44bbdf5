use serde::{Deserialize, Serialize};

/// Headline numbers for the dashboard, aggregated server-side
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardReport {
    pub pending_deliveries_count: i64,
    pub pending_payments_count: i64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRevenueReport {
    pub customer_id: i64,
    pub customer_name: String,
    pub total_revenue: f64,
}

/// Stock level per product; `available_stock` is total minus reserved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReport {
    pub product_id: i64,
    pub product_name: String,
    pub total_stock: i64,
    pub reserved_stock: i64,
    pub available_stock: i64,
}
