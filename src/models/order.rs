use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: i64,
    pub customer_name: String,
    pub order_date: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OrderLine {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

/// An order line joined with its product; the product columns are NULL for stale lines.
#[derive(Debug, FromRow)]
pub struct OrderLineRow {
    pub product_id: i64,
    pub quantity: i32,
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                format!("Invalid status '{s}', expected one of: {}", allowed.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!(" pending ".parse::<OrderStatus>(), Ok(OrderStatus::Pending));
    }

    #[test]
    fn unknown_status_lists_allowed_values() {
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert!(err.contains("pending, processing, shipped, delivered, cancelled"));
    }
}
