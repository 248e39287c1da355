use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::order::{Order, OrderLineRow};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub order_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub customer_name: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub customer_name: String,
    pub order_date: DateTime<Utc>,
    pub status: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_name: order.customer_name,
            order_date: order.order_date,
            status: order.status,
        }
    }
}

/// Order list entry with its financials; `null` totals mean they overflowed.
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: i64,
    pub customer_name: String,
    pub order_date: DateTime<Utc>,
    pub status: String,
    pub line_count: usize,
    pub total_cost: Option<Decimal>,
    pub total_revenue: Option<Decimal>,
    pub profit: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct SetOrderLineRequest {
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct OrderLineResponse {
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: Option<String>,
    pub quantity: i32,
}

impl OrderLineResponse {
    pub fn from_row(order_id: i64, row: OrderLineRow) -> Self {
        Self {
            order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
        }
    }
}
