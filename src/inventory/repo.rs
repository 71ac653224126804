use sqlx::types::Decimal;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::inventory::dto::{InventoryFilter, UpdateInventoryRequest};
use crate::products::dto::Category;

#[derive(Debug, Clone, FromRow)]
pub struct Inventory {
    pub id: Uuid,
    pub product_id: String,
    pub quantity: i32,
    pub restock_value: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Stock record joined with a summary of its product. Every query in this
/// module goes through the products join so seller scoping is never
/// optional.
#[derive(Debug, Clone, FromRow)]
pub struct InventoryWithProduct {
    pub id: Uuid,
    pub quantity: i32,
    pub restock_value: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub product_id: String,
    pub product_name: String,
    pub product_category: Category,
    pub product_price: Decimal,
}

pub async fn list(
    db: &PgPool,
    seller_id: Uuid,
    filter: &InventoryFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<InventoryWithProduct>> {
    let rows = sqlx::query_as::<_, InventoryWithProduct>(
        r#"
        SELECT i.id, i.quantity, i.restock_value, i.created_at, i.updated_at,
               p.id AS product_id, p.name AS product_name,
               p.category AS product_category, p.price AS product_price
        FROM inventories i
        JOIN products p ON p.id = i.product_id
        WHERE p.seller = $1
          AND ($2::int IS NULL OR i.quantity >= $2)
          AND ($3::int IS NULL OR i.quantity <= $3)
          AND ($4::int IS NULL OR i.restock_value >= $4)
          AND ($5::int IS NULL OR i.restock_value <= $5)
        ORDER BY i.created_at DESC
        LIMIT $6 OFFSET $7
        "#,
    )
    .bind(seller_id)
    .bind(filter.quantity_min)
    .bind(filter.quantity_max)
    .bind(filter.restock_min)
    .bind(filter.restock_max)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count(
    db: &PgPool,
    seller_id: Uuid,
    filter: &InventoryFilter,
) -> anyhow::Result<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM inventories i
        JOIN products p ON p.id = i.product_id
        WHERE p.seller = $1
          AND ($2::int IS NULL OR i.quantity >= $2)
          AND ($3::int IS NULL OR i.quantity <= $3)
          AND ($4::int IS NULL OR i.restock_value >= $4)
          AND ($5::int IS NULL OR i.restock_value <= $5)
        "#,
    )
    .bind(seller_id)
    .bind(filter.quantity_min)
    .bind(filter.quantity_max)
    .bind(filter.restock_min)
    .bind(filter.restock_max)
    .fetch_one(db)
    .await?;
    Ok(total)
}

pub async fn get(
    db: &PgPool,
    inventory_id: Uuid,
    seller_id: Uuid,
) -> anyhow::Result<Option<InventoryWithProduct>> {
    let row = sqlx::query_as::<_, InventoryWithProduct>(
        r#"
        SELECT i.id, i.quantity, i.restock_value, i.created_at, i.updated_at,
               p.id AS product_id, p.name AS product_name,
               p.category AS product_category, p.price AS product_price
        FROM inventories i
        JOIN products p ON p.id = i.product_id
        WHERE i.id = $1 AND p.seller = $2
        "#,
    )
    .bind(inventory_id)
    .bind(seller_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Insert a stock record. The one-record-per-product invariant is the
/// unique constraint on `product_id`; the raw error comes back so the
/// caller can classify the duplicate case.
pub async fn create(
    db: &PgPool,
    product_id: &str,
    quantity: i32,
    restock_value: i32,
) -> Result<Inventory, sqlx::Error> {
    sqlx::query_as::<_, Inventory>(
        r#"
        INSERT INTO inventories (product_id, quantity, restock_value)
        VALUES ($1, $2, $3)
        RETURNING id, product_id, quantity, restock_value, created_at, updated_at
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(restock_value)
    .fetch_one(db)
    .await
}

/// Partial update, scoped through the product join to the owning seller.
pub async fn update(
    db: &PgPool,
    inventory_id: Uuid,
    seller_id: Uuid,
    req: &UpdateInventoryRequest,
) -> anyhow::Result<Option<InventoryWithProduct>> {
    let row = sqlx::query_as::<_, InventoryWithProduct>(
        r#"
        UPDATE inventories i
        SET quantity      = COALESCE($3, i.quantity),
            restock_value = COALESCE($4, i.restock_value),
            updated_at    = now()
        FROM products p
        WHERE i.id = $1 AND p.id = i.product_id AND p.seller = $2
        RETURNING i.id, i.quantity, i.restock_value, i.created_at, i.updated_at,
                  p.id AS product_id, p.name AS product_name,
                  p.category AS product_category, p.price AS product_price
        "#,
    )
    .bind(inventory_id)
    .bind(seller_id)
    .bind(req.quantity)
    .bind(req.restock_value)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, inventory_id: Uuid, seller_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM inventories i
        USING products p
        WHERE i.id = $1 AND p.id = i.product_id AND p.seller = $2
        "#,
    )
    .bind(inventory_id)
    .bind(seller_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
