use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub sell_price: Decimal,
    pub buy_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One unit of `initial_product_id` requires `rate` units of `final_product_id`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ComponentEdge {
    pub initial_product_id: i64,
    pub final_product_id: i64,
    pub rate: Decimal,
}

/// A direct component of a product, joined with the component's name.
#[derive(Debug, FromRow)]
pub struct ComponentRow {
    pub final_product_id: i64,
    pub name: String,
    pub rate: Decimal,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}
