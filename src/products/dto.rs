use serde::{Deserialize, Serialize};
use sqlx::types::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

/// Fixed product category set, mirrored by the `product_category` enum type
/// in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_category")]
pub enum Category {
    Electronics,
    Books,
    Clothing,
    Home,
    Sports,
}

impl Category {
    /// Lowercase form used inside derived product ids.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Books => "books",
            Category::Clothing => "clothing",
            Category::Home => "home",
            Category::Sports => "sports",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: Decimal,
}

/// Partial update; absent fields keep their stored value. The seller can
/// never be changed through this payload.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub price: Option<Decimal>,
}

/// Optional `?seller=` filter for the open catalog listing. Matches the
/// seller id or username, exact or partial.
#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    pub seller: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerDetails {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: Decimal,
    pub seller: SellerDetails,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<crate::products::repo::ProductWithSeller> for ProductResponse {
    fn from(row: crate::products::repo::ProductWithSeller) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            price: row.price,
            seller: SellerDetails {
                id: row.seller_id,
                first_name: row.seller_first_name,
                last_name: row.seller_last_name,
                username: row.seller_username,
                email: row.seller_email,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl ProductResponse {
    /// Compose a response for a product the requester owns, reusing the
    /// already-resolved gate profile instead of re-joining users.
    pub fn owned(
        product: crate::products::repo::Product,
        owner: &crate::auth::dto::PublicUser,
    ) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            category: product.category,
            price: product.price,
            seller: SellerDetails {
                id: owner.id,
                first_name: owner.first_name.clone(),
                last_name: owner.last_name.clone(),
                username: owner.username.clone(),
                email: owner.email.clone(),
            },
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}
