use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::bom::{
    self,
    store::{all_order_lines, load_component_graph, order_lines},
    CostBreakdownRow, OrderValuation,
};
use crate::dtos::order::{
    CreateOrderRequest, OrderLineResponse, OrderResponse, OrderSummary, SetOrderLineRequest,
    UpdateOrderRequest,
};
use crate::error::{map_foreign_key_violation, AppError};
use crate::models::order::{Order, OrderLine, OrderLineRow, OrderStatus};
use crate::state::AppState;

fn parse_status(raw: Option<&str>) -> Result<Option<OrderStatus>, AppError> {
    raw.map(|s| s.parse::<OrderStatus>().map_err(AppError::validation))
        .transpose()
}

async fn fetch_order(state: &AppState, id: i64) -> Result<Order, AppError> {
    sqlx::query_as::<_, Order>(
        "SELECT id, customer_name, order_date, status FROM orders WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Order not found"))
}

async fn valuate(state: &AppState, order_id: i64) -> Result<OrderValuation, AppError> {
    fetch_order(state, order_id).await?;

    let lines = order_lines(&state.db_pool, order_id).await?;
    let graph = load_component_graph(&mut *state.db_pool.acquire().await?).await?;

    Ok(bom::value_order_lines(&graph, order_id, &lines, state.config.bom_max_depth)?)
}

// GET /orders - All orders, newest first, with financials
#[instrument(skip(state))]
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<OrderSummary>>, AppError> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT id, customer_name, order_date, status FROM orders ORDER BY order_date DESC, id DESC",
    )
    .fetch_all(&state.db_pool)
    .await?;

    let mut lines_by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    for line in all_order_lines(&state.db_pool).await? {
        lines_by_order.entry(line.order_id).or_default().push(line);
    }

    // One graph snapshot serves every order in the listing.
    let graph = load_component_graph(&mut *state.db_pool.acquire().await?).await?;

    let summaries = orders
        .into_iter()
        .map(|order| {
            let lines = lines_by_order.remove(&order.id).unwrap_or_default();
            // An order whose totals cannot be computed is listed without them.
            let valuation = bom::value_order_lines(&graph, order.id, &lines, state.config.bom_max_depth)
                .inspect_err(|e| warn!(order_id = order.id, error = %e, "Order listed without totals"))
                .ok();
            OrderSummary {
                id: order.id,
                customer_name: order.customer_name,
                order_date: order.order_date,
                status: order.status,
                line_count: lines.len(),
                total_cost: valuation.as_ref().map(|v| v.total_cost),
                total_revenue: valuation.as_ref().map(|v| v.total_revenue),
                profit: valuation.as_ref().map(|v| v.profit),
            }
        })
        .collect();

    Ok(Json(summaries))
}

// GET /orders/{id}
#[instrument(skip(state))]
pub async fn get_order(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<OrderResponse>, AppError> {
    fetch_order(&state, id).await.map(OrderResponse::from).map(Json)
}

// POST /orders
#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    if payload.customer_name.trim().is_empty() {
        return Err(AppError::validation("Customer name is required"));
    }
    let status = parse_status(payload.status.as_deref())?.unwrap_or(OrderStatus::Pending);
    let order_date = payload.order_date.unwrap_or_else(Utc::now);

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (customer_name, order_date, status)
         VALUES ($1, $2, $3)
         RETURNING id, customer_name, order_date, status",
    )
    .bind(payload.customer_name.trim())
    .bind(order_date)
    .bind(status.as_str())
    .fetch_one(&state.db_pool)
    .await?;

    info!(order_id = order.id, "Order created");
    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

// PUT /orders/{id}
#[instrument(skip(state, payload))]
pub async fn update_order(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    if payload.customer_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::validation("Customer name cannot be empty"));
    }
    let status = parse_status(payload.status.as_deref())?;

    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET
         customer_name = COALESCE($1, customer_name),
         order_date = COALESCE($2, order_date),
         status = COALESCE($3, status)
         WHERE id = $4
         RETURNING id, customer_name, order_date, status",
    )
    .bind(payload.customer_name.as_deref().map(str::trim))
    .bind(payload.order_date)
    .bind(status.map(OrderStatus::as_str))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Order not found"))?;

    Ok(Json(OrderResponse::from(order)))
}

// DELETE /orders/{id}
#[instrument(skip(state))]
pub async fn delete_order(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Order not found"));
    }

    info!(order_id = id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

// GET /orders/{id}/products - Order lines
#[instrument(skip(state))]
pub async fn get_order_lines(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderLineResponse>>, AppError> {
    fetch_order(&state, id).await?;

    let rows = sqlx::query_as::<_, OrderLineRow>(
        "SELECT po.product_id, po.quantity, p.name AS product_name
         FROM product_orders po
         LEFT JOIN products p ON p.id = po.product_id
         WHERE po.order_id = $1
         ORDER BY po.product_id",
    )
    .bind(id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(rows.into_iter().map(|r| OrderLineResponse::from_row(id, r)).collect()))
}

// PUT /orders/{id}/products/{product_id} - Set (upsert) an order line
#[instrument(skip(state, payload))]
pub async fn set_order_line(
    Path((id, product_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
    Json(payload): Json<SetOrderLineRequest>,
) -> Result<Json<OrderLineResponse>, AppError> {
    let quantity = payload.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(AppError::validation("Quantity must be greater than 0"));
    }

    let product_name: Option<String> = sqlx::query_scalar("SELECT name FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.db_pool)
        .await?;
    let product_name = product_name.ok_or_else(|| AppError::not_found("Product not found"))?;

    sqlx::query(
        "INSERT INTO product_orders (order_id, product_id, quantity)
         VALUES ($1, $2, $3)
         ON CONFLICT (order_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
    )
    .bind(id)
    .bind(product_id)
    .bind(quantity)
    .execute(&state.db_pool)
    .await
    .map_err(|e| map_foreign_key_violation(e, "Order not found"))?;

    Ok(Json(OrderLineResponse {
        order_id: id,
        product_id,
        product_name: Some(product_name),
        quantity,
    }))
}

// DELETE /orders/{id}/products/{product_id} - Remove an order line
#[instrument(skip(state))]
pub async fn unset_order_line(
    Path((id, product_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM product_orders WHERE order_id = $1 AND product_id = $2")
        .bind(id)
        .bind(product_id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Order line not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// GET /orders/{id}/valuation
#[instrument(skip(state))]
pub async fn get_order_valuation(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<OrderValuation>, AppError> {
    valuate(&state, id).await.map(Json)
}

// GET /orders/{id}/cost-breakdown
#[instrument(skip(state))]
pub async fn get_cost_breakdown(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<CostBreakdownRow>>, AppError> {
    let valuation = valuate(&state, id).await?;
    Ok(Json(bom::flatten_cost_breakdown(&valuation)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_status_is_none() {
        assert_eq!(parse_status(None).unwrap(), None);
    }

    #[test]
    fn known_status_parses() {
        assert_eq!(parse_status(Some("delivered")).unwrap(), Some(OrderStatus::Delivered));
    }

    #[test]
    fn unknown_status_is_validation_error() {
        assert!(matches!(parse_status(Some("teleported")), Err(AppError::ValidationError(_))));
    }
}
