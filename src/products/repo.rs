use anyhow::bail;
use sqlx::types::Decimal;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::error::is_unique_violation;
use crate::products::dto::{Category, CreateProductRequest, UpdateProductRequest};
use crate::products::id;

/// Bounded retries for the random id suffix. One collision in 4 random
/// bytes is already unlikely; two in a row points at a broken RNG.
const ID_INSERT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: Decimal,
    pub seller: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Product joined with the public columns of its seller.
#[derive(Debug, Clone, FromRow)]
pub struct ProductWithSeller {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: Decimal,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub seller_id: Uuid,
    pub seller_first_name: String,
    pub seller_last_name: String,
    pub seller_username: String,
    pub seller_email: String,
}

const SELECT_WITH_SELLER: &str = r#"
    SELECT p.id, p.name, p.description, p.category, p.price,
           p.created_at, p.updated_at,
           u.id AS seller_id, u.first_name AS seller_first_name,
           u.last_name AS seller_last_name, u.username AS seller_username,
           u.email AS seller_email
    FROM products p
    JOIN users u ON u.id = p.seller
"#;

/// Open catalog listing. `seller` matches the seller id or username,
/// partially or exactly.
pub async fn list(
    db: &PgPool,
    seller: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ProductWithSeller>> {
    let sql = format!(
        r#"{SELECT_WITH_SELLER}
        WHERE $1::text IS NULL
           OR p.seller::text ILIKE '%' || $1 || '%'
           OR u.username ILIKE '%' || $1 || '%'
        ORDER BY p.created_at DESC
        LIMIT $2 OFFSET $3
        "#
    );
    let rows = sqlx::query_as::<_, ProductWithSeller>(&sql)
        .bind(seller)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn count(db: &PgPool, seller: Option<&str>) -> anyhow::Result<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM products p
        JOIN users u ON u.id = p.seller
        WHERE $1::text IS NULL
           OR p.seller::text ILIKE '%' || $1 || '%'
           OR u.username ILIKE '%' || $1 || '%'
        "#,
    )
    .bind(seller)
    .fetch_one(db)
    .await?;
    Ok(total)
}

/// Listing scoped to one seller; the isolation boundary for "my products".
pub async fn list_by_seller(
    db: &PgPool,
    seller_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ProductWithSeller>> {
    let sql = format!(
        r#"{SELECT_WITH_SELLER}
        WHERE p.seller = $1
        ORDER BY p.created_at DESC
        LIMIT $2 OFFSET $3
        "#
    );
    let rows = sqlx::query_as::<_, ProductWithSeller>(&sql)
        .bind(seller_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn count_by_seller(db: &PgPool, seller_id: Uuid) -> anyhow::Result<i64> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE seller = $1")
        .bind(seller_id)
        .fetch_one(db)
        .await?;
    Ok(total)
}

pub async fn get(db: &PgPool, product_id: &str) -> anyhow::Result<Option<ProductWithSeller>> {
    let sql = format!("{SELECT_WITH_SELLER} WHERE p.id = $1");
    let row = sqlx::query_as::<_, ProductWithSeller>(&sql)
        .bind(product_id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Insert a product for `seller_id`. The id is derived from date, category
/// and the seller's username plus a random suffix; an id collision gets a
/// fresh suffix and another attempt.
pub async fn create(
    db: &PgPool,
    seller_id: Uuid,
    seller_username: &str,
    req: &CreateProductRequest,
) -> anyhow::Result<Product> {
    for attempt in 1..=ID_INSERT_ATTEMPTS {
        let product_id = id::generate(req.category, seller_username);
        let res = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, name, description, category, price, seller)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, category, price, seller, created_at, updated_at
            "#,
        )
        .bind(&product_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.category)
        .bind(req.price)
        .bind(seller_id)
        .fetch_one(db)
        .await;

        match res {
            Ok(product) => return Ok(product),
            Err(e) if is_unique_violation(&e) => {
                warn!(%product_id, attempt, "product id collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
    bail!("product id collided {} times in a row", ID_INSERT_ATTEMPTS)
}

/// Partial update, scoped to the owning seller. `None` means the record is
/// either absent or not owned by `seller_id`; the two are indistinguishable
/// on purpose.
pub async fn update(
    db: &PgPool,
    product_id: &str,
    seller_id: Uuid,
    req: &UpdateProductRequest,
) -> anyhow::Result<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name        = COALESCE($3, name),
            description = COALESCE($4, description),
            category    = COALESCE($5, category),
            price       = COALESCE($6, price),
            updated_at  = now()
        WHERE id = $1 AND seller = $2
        RETURNING id, name, description, category, price, seller, created_at, updated_at
        "#,
    )
    .bind(product_id)
    .bind(seller_id)
    .bind(req.name.as_deref())
    .bind(req.description.as_deref())
    .bind(req.category)
    .bind(req.price)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Delete, scoped to the owning seller. Cascades to the inventory record.
pub async fn delete(db: &PgPool, product_id: &str, seller_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND seller = $2")
        .bind(product_id)
        .bind(seller_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

// Run with a live Postgres: DATABASE_URL=... cargo test -- --include-ignored
#[cfg(test)]
mod db_tests {
    use super::*;
    use crate::auth::repo::User;

    async fn seed_user(db: &PgPool, username: &str) -> User {
        User::create(
            db,
            "Jane",
            "Doe",
            username,
            &format!("{}@x.com", username),
            "$argon2id$test-hash",
        )
        .await
        .expect("seed user")
    }

    fn widget(name: &str) -> CreateProductRequest {
        CreateProductRequest {
            name: name.into(),
            description: "a widget".into(),
            category: Category::Books,
            price: Decimal::new(10_000, 2),
        }
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn seller_listing_never_leaks_other_tenants(pool: PgPool) {
        let a = seed_user(&pool, "seller_a").await;
        let b = seed_user(&pool, "seller_b").await;
        create(&pool, a.id, &a.username, &widget("a-widget"))
            .await
            .expect("create for a");
        create(&pool, b.id, &b.username, &widget("b-widget"))
            .await
            .expect("create for b");

        let mine = list_by_seller(&pool, a.id, 10, 0).await.expect("list");
        assert_eq!(mine.len(), 1);
        assert!(mine.iter().all(|p| p.seller_id == a.id));
        assert_eq!(count_by_seller(&pool, a.id).await.expect("count"), 1);
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn update_and_delete_are_scoped_to_the_owner(pool: PgPool) {
        let owner = seed_user(&pool, "owner").await;
        let intruder = seed_user(&pool, "intruder").await;
        let product = create(&pool, owner.id, &owner.username, &widget("gadget"))
            .await
            .expect("create");

        let changes = UpdateProductRequest {
            name: Some("hijacked".into()),
            description: None,
            category: None,
            price: None,
        };
        assert!(update(&pool, &product.id, intruder.id, &changes)
            .await
            .expect("update")
            .is_none());
        assert!(!delete(&pool, &product.id, intruder.id)
            .await
            .expect("delete"));

        let fetched = get(&pool, &product.id)
            .await
            .expect("get")
            .expect("still present");
        assert_eq!(fetched.name, "gadget");
        assert_eq!(fetched.seller_id, owner.id);
    }
}
