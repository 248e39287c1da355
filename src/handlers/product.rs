// src/handlers/product.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use tracing::{error, info, instrument};

use crate::bom::{self, store::load_component_graph, ResolvedComponentNode};
use crate::dtos::product::{
    ComponentResponse, CreateProductRequest, ProductResponse, SetComponentRequest,
    SetComponentResponse, TreeQuery, UpdateProductRequest,
};
use crate::error::AppError;
use crate::models::product::{ComponentRow, Product};
use crate::state::AppState;

const PRODUCT_COLUMNS: &str = "id, name, description, quantity, sell_price, buy_price, created_at";

fn validate_amounts(
    quantity: Option<i32>,
    sell_price: Option<Decimal>,
    buy_price: Option<Decimal>,
) -> Result<(), AppError> {
    if quantity.is_some_and(|q| q < 0) {
        return Err(AppError::validation("Quantity cannot be negative"));
    }
    if sell_price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(AppError::validation("Sell price cannot be negative"));
    }
    if buy_price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(AppError::validation("Buy price cannot be negative"));
    }
    Ok(())
}

/// Root quantity for a tree request; defaults to one unit and must be positive.
fn tree_quantity(query: &TreeQuery) -> Result<Decimal, AppError> {
    let quantity = query.quantity.unwrap_or(Decimal::ONE);
    if quantity <= Decimal::ZERO {
        return Err(bom::BomError::InvalidQuantity(quantity).into());
    }
    Ok(quantity)
}

/// Maps an incoming description to (should write, new value); blank clears it.
fn description_change(raw: Option<&str>) -> (bool, Option<&str>) {
    match raw.map(str::trim) {
        None => (false, None),
        Some("") => (true, None),
        Some(text) => (true, Some(text)),
    }
}

// GET /products - List all products, newest first
#[instrument(skip(state))]
pub async fn get_products(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>, AppError> {
    match sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
    ))
        .fetch_all(&state.db_pool)
        .await {
        Ok(products) => {
            let response = products.into_iter().map(ProductResponse::from).collect();
            Ok(Json(response))
        }
        Err(e) => {
            error!(?e, "Failed to fetch products");
            Err(e.into())
        }
    }
}

// GET /products/{id} - Get single product
#[instrument(skip(state))]
pub async fn get_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(product)))
}

// POST /products - Create new product
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Product name is required"));
    }
    validate_amounts(payload.quantity, Some(payload.sell_price), Some(payload.buy_price))?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products (name, description, quantity, sell_price, buy_price)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(payload.name.trim())
    .bind(description_change(payload.description.as_deref()).1)
    .bind(payload.quantity.unwrap_or(0))
    .bind(payload.sell_price)
    .bind(payload.buy_price)
    .fetch_one(&state.db_pool)
    .await?;

    info!(product_id = product.id, "Product created");
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

// PUT /products/{id} - Update product; a blank description clears it
#[instrument(skip(state, payload))]
pub async fn update_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::validation("Product name cannot be empty"));
    }
    validate_amounts(payload.quantity, payload.sell_price, payload.buy_price)?;
    let (set_description, description) = description_change(payload.description.as_deref());

    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET
         name = COALESCE($1, name),
         description = CASE WHEN $2 THEN $3 ELSE description END,
         quantity = COALESCE($4, quantity),
         sell_price = COALESCE($5, sell_price),
         buy_price = COALESCE($6, buy_price)
         WHERE id = $7
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(payload.name.as_deref().map(str::trim))
    .bind(set_description)
    .bind(description)
    .bind(payload.quantity)
    .bind(payload.sell_price)
    .bind(payload.buy_price)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(product)))
}

// DELETE /products/{id} - Delete product; its edges go with it, order lines become stale
#[instrument(skip(state))]
pub async fn delete_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }

    info!(product_id = id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// GET /products/{id}/components - Direct components
#[instrument(skip(state))]
pub async fn get_components(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ComponentResponse>>, AppError> {
    ensure_product_exists(&state, id).await?;

    let rows = sqlx::query_as::<_, ComponentRow>(
        "SELECT pc.final_product_id, p.name, pc.rate, p.buy_price, p.sell_price
         FROM product_components pc
         JOIN products p ON p.id = pc.final_product_id
         WHERE pc.initial_product_id = $1
         ORDER BY p.name",
    )
    .bind(id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(rows.into_iter().map(ComponentResponse::from).collect()))
}

// PUT /products/{id}/components/{component_id} - Set (upsert) a component edge
#[instrument(skip(state, payload))]
pub async fn set_component(
    Path((id, component_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
    Json(payload): Json<SetComponentRequest>,
) -> Result<Json<SetComponentResponse>, AppError> {
    let mut tx = state.db_pool.begin().await?;

    // Serialize edge writers so two concurrent inserts cannot close a cycle together.
    sqlx::query("LOCK TABLE product_components IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let graph = load_component_graph(&mut *tx).await?;
    graph.validate_new_edge(id, component_id, payload.rate)?;

    sqlx::query(
        "INSERT INTO product_components (initial_product_id, final_product_id, rate)
         VALUES ($1, $2, $3)
         ON CONFLICT (initial_product_id, final_product_id) DO UPDATE SET rate = EXCLUDED.rate",
    )
    .bind(id)
    .bind(component_id)
    .bind(payload.rate)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(product_id = id, component_id, rate = %payload.rate, "Component set");
    Ok(Json(SetComponentResponse {
        initial_product_id: id,
        final_product_id: component_id,
        rate: payload.rate,
    }))
}

// DELETE /products/{id}/components/{component_id} - Unset a component edge
#[instrument(skip(state))]
pub async fn unset_component(
    Path((id, component_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query(
        "DELETE FROM product_components WHERE initial_product_id = $1 AND final_product_id = $2",
    )
    .bind(id)
    .bind(component_id)
    .execute(&state.db_pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Component not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// GET /products/{id}/tree?quantity=Q - Resolved and costed component tree
#[instrument(skip(state))]
pub async fn get_product_tree(
    Path(id): Path<i64>,
    Query(query): Query<TreeQuery>,
    State(state): State<AppState>,
) -> Result<Json<ResolvedComponentNode>, AppError> {
    let quantity = tree_quantity(&query)?;

    let graph = load_component_graph(&mut *state.db_pool.acquire().await?).await?;
    let tree = bom::cost_tree(&graph, id, quantity, state.config.bom_max_depth)?;

    Ok(Json(tree))
}

async fn ensure_product_exists(state: &AppState, id: i64) -> Result<(), AppError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?;

    found.map(|_| ()).ok_or_else(|| AppError::not_found("Product not found"))
}
