/// トラッカー実装
///
/// 価格ソースごとの差分（対象ID、表示名、閾値、取得方法、メタデータ）を
/// `PriceTracker`トレイトに閉じ込める。取得→比較→保存→通知の流れは
/// `PriceTrackingService`が共通で担う。
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;

use crate::domain::tracker_request::{GOLD_SUBJECT_ID, GoldRequest, ShopeeRequest, TrackerKind};
use crate::domain::SourceMetadata;
use crate::infrastructure::{FetchError, GoldPriceClient, ShopeeClient};

/// 金価格の表示名
pub const GOLD_DISPLAY_NAME: &str = "DOJI Gold Price (VND)";

/// 価格ソースごとのトラッカー
#[async_trait]
pub trait PriceTracker: Send + Sync {
    fn kind(&self) -> TrackerKind;

    /// 価格履歴上の追跡対象ID
    fn subject_id(&self) -> String;

    /// 通知に使う名前
    fn display_name(&self) -> String;

    fn notification_threshold(&self) -> Decimal;

    /// 観測に添えるメタデータ
    fn metadata(&self) -> SourceMetadata;

    /// 外部ソースから現在価格を取得する
    async fn fetch_current_price(&self) -> Result<Decimal, FetchError>;
}

/// 金価格トラッカー
pub struct GoldTracker {
    request: GoldRequest,
    client: Arc<dyn GoldPriceClient>,
}

impl GoldTracker {
    pub fn new(request: GoldRequest, client: Arc<dyn GoldPriceClient>) -> Self {
        Self { request, client }
    }
}

#[async_trait]
impl PriceTracker for GoldTracker {
    fn kind(&self) -> TrackerKind {
        TrackerKind::Gold
    }

    fn subject_id(&self) -> String {
        GOLD_SUBJECT_ID.to_string()
    }

    fn display_name(&self) -> String {
        GOLD_DISPLAY_NAME.to_string()
    }

    fn notification_threshold(&self) -> Decimal {
        self.request.notification_threshold()
    }

    fn metadata(&self) -> SourceMetadata {
        let mut metadata = SourceMetadata::new();
        metadata.insert("tracker_type".to_string(), json!(TrackerKind::Gold.as_str()));
        metadata.insert("source_url".to_string(), json!(self.request.base_url()));
        metadata
    }

    async fn fetch_current_price(&self) -> Result<Decimal, FetchError> {
        self.client.fetch_sell_price(self.request.base_url()).await
    }
}

/// Shopee商品トラッカー
pub struct ShopeeTracker {
    request: ShopeeRequest,
    client: Arc<dyn ShopeeClient>,
}

impl ShopeeTracker {
    pub fn new(request: ShopeeRequest, client: Arc<dyn ShopeeClient>) -> Self {
        Self { request, client }
    }
}

#[async_trait]
impl PriceTracker for ShopeeTracker {
    fn kind(&self) -> TrackerKind {
        TrackerKind::Shopee
    }

    fn subject_id(&self) -> String {
        self.request.subject_id()
    }

    fn display_name(&self) -> String {
        self.request.product_name()
    }

    fn notification_threshold(&self) -> Decimal {
        self.request.notification_threshold()
    }

    fn metadata(&self) -> SourceMetadata {
        let mut metadata = SourceMetadata::new();
        metadata.insert("tracker_type".to_string(), json!(TrackerKind::Shopee.as_str()));
        metadata.insert("shopee_product_id".to_string(), json!(self.request.product_id));
        metadata.insert("shop_id".to_string(), json!(self.request.config.shop_id));
        metadata.insert("product_name".to_string(), json!(self.request.product_name()));
        metadata.insert("base_url".to_string(), json!(self.request.base_url()));
        metadata
    }

    async fn fetch_current_price(&self) -> Result<Decimal, FetchError> {
        self.client
            .fetch_item_price(
                self.request.base_url(),
                &self.request.config.shop_id,
                &self.request.product_id,
            )
            .await
    }
}
