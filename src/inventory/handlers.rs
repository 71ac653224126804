use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::extractors::CurrentUser;
use crate::error::{is_foreign_key_violation, is_unique_violation, ApiError};
use crate::inventory::dto::{
    CreateInventoryRequest, InventoryFilter, InventoryResponse, ProductSummary,
    UpdateInventoryRequest,
};
use crate::inventory::repo;
use crate::json::Json;
use crate::pagination::{Page, Pagination};
use crate::products::repo as products_repo;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_inventory).post(create_inventory))
        .route("/inventory/get/:id", get(get_inventory))
        .route("/inventory/update/:id", put(update_inventory))
        .route("/inventory/delete/:id", delete(delete_inventory))
}

fn validate_quantity(quantity: i32) -> Result<(), ApiError> {
    if quantity < 0 {
        return Err(ApiError::validation("quantity must not be negative"));
    }
    Ok(())
}

fn validate_restock_value(restock_value: i32) -> Result<(), ApiError> {
    if restock_value < 1 {
        return Err(ApiError::validation("restockValue must be at least 1"));
    }
    Ok(())
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_inventory(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<InventoryFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Page<InventoryResponse>>, ApiError> {
    let page = page.clamped();
    let rows = repo::list(&state.db, user.id, &filter, page.limit, page.offset).await?;
    let total = repo::count(&state.db, user.id, &filter).await?;
    Ok(Json(Page {
        items: rows.into_iter().map(InventoryResponse::from).collect(),
        total,
        limit: page.limit,
        offset: page.offset,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_inventory(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InventoryResponse>, ApiError> {
    let row = repo::get(&state.db, id, user.id)
        .await?
        .ok_or(ApiError::NotFound("Inventory"))?;
    Ok(Json(row.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_inventory(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateInventoryRequest>,
) -> Result<(StatusCode, Json<InventoryResponse>), ApiError> {
    validate_quantity(payload.quantity)?;
    validate_restock_value(payload.restock_value)?;

    // The referenced product must exist and belong to the requester; a
    // foreign product is reported the same way as a missing one.
    let product = products_repo::get(&state.db, &payload.product_id)
        .await?
        .filter(|p| p.seller_id == user.id)
        .ok_or_else(|| ApiError::validation("Invalid productId"))?;

    let inventory = repo::create(
        &state.db,
        &payload.product_id,
        payload.quantity,
        payload.restock_value,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            warn!(product_id = %payload.product_id, "inventory already exists for product");
            ApiError::validation("Inventory already exists for this product")
        } else if is_foreign_key_violation(&e) {
            // Product deleted between the ownership check and the insert.
            warn!(product_id = %payload.product_id, "product vanished before inventory insert");
            ApiError::validation("Invalid productId")
        } else {
            ApiError::Unexpected(e.into())
        }
    })?;

    info!(inventory_id = %inventory.id, product_id = %inventory.product_id, "inventory created");
    Ok((
        StatusCode::CREATED,
        Json(InventoryResponse {
            id: inventory.id,
            product: ProductSummary {
                id: product.id,
                name: product.name,
                category: product.category,
                price: product.price,
            },
            quantity: inventory.quantity,
            restock_value: inventory.restock_value,
            created_at: inventory.created_at,
            updated_at: inventory.updated_at,
        }),
    ))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_inventory(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInventoryRequest>,
) -> Result<Json<InventoryResponse>, ApiError> {
    if let Some(quantity) = payload.quantity {
        validate_quantity(quantity)?;
    }
    if let Some(restock_value) = payload.restock_value {
        validate_restock_value(restock_value)?;
    }

    let row = repo::update(&state.db, id, user.id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Inventory"))?;
    info!(inventory_id = %id, "inventory updated");
    Ok(Json(row.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_inventory(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !repo::delete(&state.db, id, user.id).await? {
        return Err(ApiError::NotFound("Inventory"));
    }
    info!(inventory_id = %id, "inventory deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_quantity_is_rejected() {
        let err = validate_quantity(-1).expect_err("negative should fail");
        assert!(matches!(err, ApiError::Validation(_)));
        validate_quantity(0).expect("zero is allowed");
    }

    #[test]
    fn restock_value_must_be_positive() {
        let err = validate_restock_value(0).expect_err("zero should fail");
        assert!(matches!(err, ApiError::Validation(_)));
        validate_restock_value(1).expect("one is allowed");
    }
}
