use sqlx::{PgConnection, PgPool};

use super::ComponentGraph;
use crate::models::order::OrderLine;
use crate::models::product::{ComponentEdge, Product};

/// Loads every product and edge in two queries.
///
/// Takes a plain connection so edge writes can pass their transaction and
/// validate against the same snapshot they commit into.
pub async fn load_component_graph(conn: &mut PgConnection) -> Result<ComponentGraph, sqlx::Error> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, name, description, quantity, sell_price, buy_price, created_at
         FROM products",
    )
    .fetch_all(&mut *conn)
    .await?;

    let edges = sqlx::query_as::<_, ComponentEdge>(
        "SELECT initial_product_id, final_product_id, rate
         FROM product_components
         ORDER BY initial_product_id, final_product_id",
    )
    .fetch_all(&mut *conn)
    .await?;

    tracing::debug!(products = products.len(), edges = edges.len(), "Loaded component graph");
    Ok(ComponentGraph::new(products, edges))
}

pub async fn order_lines(pool: &PgPool, order_id: i64) -> Result<Vec<OrderLine>, sqlx::Error> {
    sqlx::query_as::<_, OrderLine>(
        "SELECT order_id, product_id, quantity
         FROM product_orders
         WHERE order_id = $1
         ORDER BY product_id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
}

/// Lines of every order, ordered by order then product.
pub async fn all_order_lines(pool: &PgPool) -> Result<Vec<OrderLine>, sqlx::Error> {
    sqlx::query_as::<_, OrderLine>(
        "SELECT order_id, product_id, quantity
         FROM product_orders
         ORDER BY order_id, product_id",
    )
    .fetch_all(pool)
    .await
}
