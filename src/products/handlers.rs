use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Router,
};
use sqlx::types::Decimal;
use tracing::{info, instrument};

use crate::auth::extractors::CurrentUser;
use crate::error::ApiError;
use crate::json::Json;
use crate::pagination::{Page, Pagination};
use crate::products::dto::{
    CreateProductRequest, ProductFilter, ProductResponse, UpdateProductRequest,
};
use crate::products::repo;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/mine", get(my_products))
        .route("/products/get/:id", get(get_product))
        .route("/products/update/:id", put(update_product))
        .route("/products/delete/:id", delete(delete_product))
}

/// Lower bound on product price, matching the DB check constraint.
fn min_price() -> Decimal {
    Decimal::new(10_000, 2)
}

fn validate_price(price: Decimal) -> Result<(), ApiError> {
    if price < min_price() {
        return Err(ApiError::validation(format!(
            "price must be at least {}",
            min_price()
        )));
    }
    Ok(())
}

#[instrument(skip(state, _user))]
pub async fn list_products(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(filter): Query<ProductFilter>,
    Query(page): Query<Pagination>,
) -> Result<Json<Page<ProductResponse>>, ApiError> {
    let page = page.clamped();
    let seller = filter.seller.as_deref();
    let rows = repo::list(&state.db, seller, page.limit, page.offset).await?;
    let total = repo::count(&state.db, seller).await?;
    Ok(Json(Page {
        items: rows.into_iter().map(ProductResponse::from).collect(),
        total,
        limit: page.limit,
        offset: page.offset,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_products(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Page<ProductResponse>>, ApiError> {
    let page = page.clamped();
    let rows = repo::list_by_seller(&state.db, user.id, page.limit, page.offset).await?;
    let total = repo::count_by_seller(&state.db, user.id).await?;
    Ok(Json(Page {
        items: rows.into_iter().map(ProductResponse::from).collect(),
        total,
        limit: page.limit,
        offset: page.offset,
    }))
}

#[instrument(skip(state, _user))]
pub async fn get_product(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = repo::get(&state.db, &id)
        .await?
        .ok_or(ApiError::NotFound("Product"))?;
    Ok(Json(product.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    if payload.description.trim().is_empty() {
        return Err(ApiError::validation("description is required"));
    }
    validate_price(payload.price)?;

    // Seller comes from the gate identity, never from the payload.
    let product = repo::create(&state.db, user.id, &user.username, &payload).await?;
    info!(product_id = %product.id, "product created");
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::owned(product, &user)),
    ))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("name must not be empty"));
        }
    }
    if let Some(description) = &payload.description {
        if description.trim().is_empty() {
            return Err(ApiError::validation("description must not be empty"));
        }
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
    }

    let product = repo::update(&state.db, &id, user.id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Product"))?;
    info!(product_id = %product.id, "product updated");
    Ok(Json(ProductResponse::owned(product, &user)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !repo::delete(&state.db, &id, user.id).await? {
        return Err(ApiError::NotFound("Product"));
    }
    info!(product_id = %id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_below_minimum_is_rejected() {
        let err = validate_price(Decimal::new(9_999, 2)).expect_err("99.99 should fail");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn price_at_and_above_minimum_passes() {
        validate_price(Decimal::new(10_000, 2)).expect("100.00 should pass");
        validate_price(Decimal::new(1_999_99, 2)).expect("1999.99 should pass");
    }
}
