use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BomError {
    #[error("Product {0} not found")]
    ProductNotFound(i64),

    #[error("Component cycle detected: {}", format_path(.path))]
    CycleDetected { path: Vec<i64> },

    #[error("Invalid component {initial_product_id} -> {final_product_id}: {reason}")]
    MalformedEdge {
        initial_product_id: i64,
        final_product_id: i64,
        reason: String,
    },

    #[error("Quantity must be greater than zero, got {0}")]
    InvalidQuantity(Decimal),

    #[error("Component tree of product {product_id} exceeds the maximum depth of {max_depth}")]
    DepthExceeded { product_id: i64, max_depth: usize },

    #[error("Arithmetic overflow while costing product {0}")]
    Overflow(i64),

    #[error("Totals of order {0} exceed the representable range")]
    TotalsOverflow(i64),
}

fn format_path(path: &[i64]) -> String {
    path.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
