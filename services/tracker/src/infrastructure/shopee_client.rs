//! Shopee商品情報取得クライアント
//!
//! `GET {base}/api/v4/item/get?itemid=..&shopid=..`で商品データを取得する。

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use rust_decimal::Decimal;
use tracing::debug;

use super::http_client::{FetchError, ensure_success};
use crate::domain::shopee_product::{ShopeeItemResponse, ShopeeResponseError};

/// Shopee商品価格取得トレイト（テスト用の抽象化）
#[async_trait]
pub trait ShopeeClient: Send + Sync {
    /// 商品の現在価格を取得する
    ///
    /// # 引数
    /// * `base_url` - ShopeeのベースURL
    /// * `shop_id` - ショップID
    /// * `item_id` - 商品ID
    async fn fetch_item_price(
        &self,
        base_url: &str,
        shop_id: &str,
        item_id: &str,
    ) -> Result<Decimal, FetchError>;
}

/// Shopee API v4を使うHTTPクライアント
#[derive(Debug, Clone)]
pub struct HttpShopeeClient {
    client: Client,
}

impl HttpShopeeClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn item_url(base_url: &str) -> String {
        format!("{}/api/v4/item/get", base_url.trim_end_matches('/'))
    }

    fn headers(base_url: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9,vi;q=0.8"));
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert("x-api-source", HeaderValue::from_static("pc"));
        if let Ok(referer) = HeaderValue::from_str(&format!("{}/", base_url.trim_end_matches('/'))) {
            headers.insert(REFERER, referer);
        }
        headers
    }
}

impl From<ShopeeResponseError> for FetchError {
    fn from(err: ShopeeResponseError) -> Self {
        match err {
            ShopeeResponseError::Api { .. } => FetchError::Api(err.to_string()),
            ShopeeResponseError::MissingData | ShopeeResponseError::InvalidPrice(_) => {
                FetchError::Parse(err.to_string())
            }
        }
    }
}

#[async_trait]
impl ShopeeClient for HttpShopeeClient {
    async fn fetch_item_price(
        &self,
        base_url: &str,
        shop_id: &str,
        item_id: &str,
    ) -> Result<Decimal, FetchError> {
        let response = self
            .client
            .get(Self::item_url(base_url))
            .headers(Self::headers(base_url))
            .query(&[("itemid", item_id), ("shopid", shop_id)])
            .send()
            .await?;

        let body: ShopeeItemResponse = ensure_success(response).await?.json().await?;
        let item = body.into_item()?;
        let price = item.current_price()?;

        debug!(
            shop_id = shop_id,
            item_id = item_id,
            name = item.name.as_deref().unwrap_or(""),
            price = %price,
            "Shopee商品価格を取得"
        );

        Ok(price)
    }
}
