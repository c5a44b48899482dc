/// 商品カタログのエントリ
///
/// 定期追跡するShopee商品の登録情報。商品テーブルに1商品1アイテムで保存される。
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use thiserror::Error;

use super::tracker_request::{DEFAULT_SHOPEE_BASE_URL, TrackerKind};

/// カタログ登録商品の通知閾値デフォルト（5%）
pub const DEFAULT_CATALOG_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// 商品登録のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProductValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// 追跡状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ProductValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            other => Err(ProductValidationError::InvalidField {
                field: "status",
                reason: format!("unknown status {}", other),
            }),
        }
    }
}

/// 新規登録リクエスト
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProduct {
    pub shopee_product_id: String,
    pub shop_id: String,
    pub product_name: String,
    pub product_url: Option<String>,
    pub base_url: Option<String>,
    pub notification_threshold: Option<Decimal>,
}

/// カタログに登録された追跡商品
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedProduct {
    /// カタログ上の商品ID（`shopee_<itemid>`）
    pub product_id: String,
    pub tracker_type: TrackerKind,
    pub shopee_product_id: String,
    pub shop_id: String,
    pub product_name: String,
    pub product_url: String,
    pub base_url: String,
    pub notification_threshold: Decimal,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackedProduct {
    /// 登録リクエストを検証し、デフォルト値を補完してカタログエントリを作る
    pub fn register(new: NewProduct, now: DateTime<Utc>) -> Result<Self, ProductValidationError> {
        let shopee_product_id = required("shopee_product_id", &new.shopee_product_id)?;
        let shop_id = required("shop_id", &new.shop_id)?;
        let product_name = required("product_name", &new.product_name)?;

        let notification_threshold = new
            .notification_threshold
            .unwrap_or(DEFAULT_CATALOG_THRESHOLD);
        if notification_threshold.is_sign_negative() {
            return Err(ProductValidationError::InvalidField {
                field: "notification_threshold",
                reason: "must not be negative".to_string(),
            });
        }

        Ok(Self {
            product_id: format!("shopee_{}", shopee_product_id),
            tracker_type: TrackerKind::Shopee,
            shopee_product_id,
            shop_id,
            product_name,
            product_url: new.product_url.unwrap_or_default(),
            base_url: new
                .base_url
                .unwrap_or_else(|| DEFAULT_SHOPEE_BASE_URL.to_string()),
            notification_threshold,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// ディスパッチャーに渡す呼び出しペイロードに変換する
    pub fn to_tracker_payload(&self) -> Value {
        json!({
            "tracker_type": self.tracker_type.as_str(),
            "product_id": self.shopee_product_id,
            "config": {
                "shop_id": self.shop_id,
                "base_url": self.base_url,
                "product_name": self.product_name,
                "notification_threshold": self.notification_threshold,
            }
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ProductValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProductValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tracker_request::TrackerRequest;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn new_product() -> NewProduct {
        NewProduct {
            shopee_product_id: "40004315413".to_string(),
            shop_id: "807476339".to_string(),
            product_name: "TerraMaster D5-310".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_catalog_threshold() {
        assert_eq!(DEFAULT_CATALOG_THRESHOLD, dec!(0.05));
    }

    #[test]
    fn test_register_fills_defaults() {
        let product = TrackedProduct::register(new_product(), now()).unwrap();

        assert_eq!(product.product_id, "shopee_40004315413");
        assert_eq!(product.tracker_type, TrackerKind::Shopee);
        assert_eq!(product.base_url, DEFAULT_SHOPEE_BASE_URL);
        assert_eq!(product.product_url, "");
        assert_eq!(product.notification_threshold, DEFAULT_CATALOG_THRESHOLD);
        assert!(product.is_active());
        assert_eq!(product.created_at, now());
        assert_eq!(product.updated_at, now());
    }

    #[test]
    fn test_register_requires_fields() {
        let mut missing_shop = new_product();
        missing_shop.shop_id = " ".to_string();
        assert_eq!(
            TrackedProduct::register(missing_shop, now()),
            Err(ProductValidationError::MissingField("shop_id"))
        );

        let mut missing_name = new_product();
        missing_name.product_name = String::new();
        assert_eq!(
            TrackedProduct::register(missing_name, now()),
            Err(ProductValidationError::MissingField("product_name"))
        );
    }

    #[test]
    fn test_register_rejects_negative_threshold() {
        let mut product = new_product();
        product.notification_threshold = Some(dec!(-0.01));
        assert!(matches!(
            TrackedProduct::register(product, now()),
            Err(ProductValidationError::InvalidField { field: "notification_threshold", .. })
        ));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("active".parse::<ProductStatus>().unwrap(), ProductStatus::Active);
        assert_eq!("inactive".parse::<ProductStatus>().unwrap(), ProductStatus::Inactive);
        assert!("paused".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn test_tracker_payload_is_dispatchable() {
        let mut new = new_product();
        new.notification_threshold = Some(dec!(0.1));
        let product = TrackedProduct::register(new, now()).unwrap();

        let request = TrackerRequest::parse(&product.to_tracker_payload()).unwrap();
        match request {
            TrackerRequest::Shopee(shopee) => {
                assert_eq!(shopee.subject_id(), product.product_id);
                assert_eq!(shopee.config.shop_id, "807476339");
                assert_eq!(shopee.product_name(), "TerraMaster D5-310");
                assert_eq!(shopee.notification_threshold(), dec!(0.1));
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }
}
