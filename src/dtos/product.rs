// src/dtos/product.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::product::{ComponentRow, Product};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub sell_price: Decimal,
    pub buy_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub sell_price: Option<Decimal>,
    pub buy_price: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub sell_price: Decimal,
    pub buy_price: Decimal,
    pub created_at: DateTime<Utc>,
}

// Convert from Model to Response DTO
impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            quantity: product.quantity,
            sell_price: product.sell_price,
            buy_price: product.buy_price,
            created_at: product.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetComponentRequest {
    pub rate: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ComponentResponse {
    pub component_id: i64,
    pub name: String,
    pub rate: Decimal,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}

impl From<ComponentRow> for ComponentResponse {
    fn from(row: ComponentRow) -> Self {
        Self {
            component_id: row.final_product_id,
            name: row.name,
            rate: row.rate,
            buy_price: row.buy_price,
            sell_price: row.sell_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SetComponentResponse {
    pub initial_product_id: i64,
    pub final_product_id: i64,
    pub rate: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    pub quantity: Option<Decimal>,
}
