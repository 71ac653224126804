use serde::{Deserialize, Serialize};
use sqlx::types::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::products::dto::Category;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryRequest {
    pub product_id: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default = "default_restock_value")]
    pub restock_value: i32,
}

fn default_restock_value() -> i32 {
    10
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryRequest {
    pub quantity: Option<i32>,
    pub restock_value: Option<i32>,
}

/// Optional numeric range filters for the stock listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilter {
    pub quantity_min: Option<i32>,
    pub quantity_max: Option<i32>,
    pub restock_min: Option<i32>,
    pub restock_max: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    pub id: Uuid,
    pub product: ProductSummary,
    pub quantity: i32,
    pub restock_value: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<crate::inventory::repo::InventoryWithProduct> for InventoryResponse {
    fn from(row: crate::inventory::repo::InventoryWithProduct) -> Self {
        Self {
            id: row.id,
            product: ProductSummary {
                id: row.product_id,
                name: row.product_name,
                category: row.product_category,
                price: row.product_price,
            },
            quantity: row.quantity,
            restock_value: row.restock_value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults() {
        let req: CreateInventoryRequest =
            serde_json::from_str(r#"{"productId": "30082026-books-jdoe-deadbeef"}"#)
                .expect("deserialize");
        assert_eq!(req.quantity, 0);
        assert_eq!(req.restock_value, 10);
    }

    #[test]
    fn create_request_uses_camel_case_keys() {
        let req: CreateInventoryRequest = serde_json::from_str(
            r#"{"productId": "30082026-books-jdoe-deadbeef", "quantity": 5, "restockValue": 3}"#,
        )
        .expect("deserialize");
        assert_eq!(req.quantity, 5);
        assert_eq!(req.restock_value, 3);

        // The old snake_case spelling is not part of the wire format.
        assert!(serde_json::from_str::<CreateInventoryRequest>(
            r#"{"product_id": "30082026-books-jdoe-deadbeef"}"#
        )
        .is_err());
    }

    #[test]
    fn filter_uses_camel_case_keys() {
        let filter: InventoryFilter =
            serde_json::from_str(r#"{"quantityMin": 1, "restockMax": 20}"#).expect("deserialize");
        assert_eq!(filter.quantity_min, Some(1));
        assert_eq!(filter.restock_max, Some(20));
        assert_eq!(filter.quantity_max, None);
    }
}
