/// DynamoDBで追跡商品カタログを管理するリポジトリ
///
/// テーブル構成:
/// - パーティションキー: `product_id`（S、`shopee_<itemid>`）
/// - 属性: `status`（`active` | `inactive`）ほか商品情報
use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::types::AttributeValue;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::observation_repository::RepositoryError;
use crate::domain::price_observation::{format_timestamp, parse_timestamp};
use crate::domain::tracked_product::{ProductStatus, TrackedProduct};
use crate::domain::tracker_request::TrackerKind;

/// 商品カタログの永続化トレイト
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 追跡中（`status = active`）の商品を全件取得する
    async fn list_active(&self) -> Result<Vec<TrackedProduct>, RepositoryError>;

    /// 商品を保存する（同じproduct_idは上書き）
    async fn save(&self, product: &TrackedProduct) -> Result<(), RepositoryError>;
}

/// ProductRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoProductRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoProductRepository {
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    fn to_item(product: &TrackedProduct) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        let mut put_s = |key: &str, value: &str| {
            item.insert(key.to_string(), AttributeValue::S(value.to_string()));
        };

        put_s("product_id", &product.product_id);
        put_s("tracker_type", product.tracker_type.as_str());
        put_s("shopee_product_id", &product.shopee_product_id);
        put_s("shop_id", &product.shop_id);
        put_s("product_name", &product.product_name);
        put_s("product_url", &product.product_url);
        put_s("base_url", &product.base_url);
        put_s("status", product.status.as_str());
        put_s("created_at", &format_timestamp(&product.created_at));
        put_s("updated_at", &format_timestamp(&product.updated_at));

        item.insert(
            "notification_threshold".to_string(),
            AttributeValue::N(product.notification_threshold.to_string()),
        );

        item
    }

    fn from_item(item: &HashMap<String, AttributeValue>) -> Result<TrackedProduct, RepositoryError> {
        let get_s = |field: &str| -> Result<String, RepositoryError> {
            item.get(field)
                .and_then(|v| v.as_s().ok())
                .cloned()
                .ok_or_else(|| RepositoryError::SerializationError(format!("Missing {} field", field)))
        };
        let invalid = |field: &str, reason: String| {
            RepositoryError::SerializationError(format!("Invalid {}: {}", field, reason))
        };

        let tracker_type = TrackerKind::from_str(&get_s("tracker_type")?)
            .map_err(|e| invalid("tracker_type", e.to_string()))?;
        let status = ProductStatus::from_str(&get_s("status")?)
            .map_err(|e| invalid("status", e.to_string()))?;

        let notification_threshold = item
            .get("notification_threshold")
            .and_then(|v| v.as_n().ok())
            .ok_or_else(|| {
                RepositoryError::SerializationError("Missing notification_threshold field".to_string())
            })?;
        let notification_threshold = Decimal::from_str(notification_threshold)
            .map_err(|e| invalid("notification_threshold", e.to_string()))?;

        let created_at = parse_timestamp(&get_s("created_at")?)
            .map_err(|e| invalid("created_at", e.to_string()))?;
        let updated_at = parse_timestamp(&get_s("updated_at")?)
            .map_err(|e| invalid("updated_at", e.to_string()))?;

        Ok(TrackedProduct {
            product_id: get_s("product_id")?,
            tracker_type,
            shopee_product_id: get_s("shopee_product_id")?,
            shop_id: get_s("shop_id")?,
            product_name: get_s("product_name")?,
            product_url: get_s("product_url").unwrap_or_default(),
            base_url: get_s("base_url")?,
            notification_threshold,
            status,
            created_at,
            updated_at,
        })
    }
}

#[async_trait]
impl ProductRepository for DynamoProductRepository {
    async fn list_active(&self) -> Result<Vec<TrackedProduct>, RepositoryError> {
        let mut products = Vec::new();
        let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;

        // ページネーションで全件取得
        loop {
            let result = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression("#status = :active")
                .expression_attribute_names("#status", "status")
                .expression_attribute_values(
                    ":active",
                    AttributeValue::S(ProductStatus::Active.as_str().to_string()),
                )
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(|e| RepositoryError::ReadError(e.to_string()))?;

            for item in result.items() {
                products.push(Self::from_item(item)?);
            }

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        debug!(count = products.len(), "追跡中の商品を取得");
        Ok(products)
    }

    async fn save(&self, product: &TrackedProduct) -> Result<(), RepositoryError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(Self::to_item(product)))
            .send()
            .await
            .map_err(|e| RepositoryError::WriteError(e.to_string()))?;

        info!(product_id = %product.product_id, "商品を保存");
        Ok(())
    }
}
