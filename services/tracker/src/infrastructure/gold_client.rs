//! 金価格取得クライアント
//!
//! まずJSON API（`{base}/api/gold-price`）を試し、失敗した場合は
//! 価格ページ（`{base}/gia-vang`）のHTMLから売値を読み取る。

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::http_client::{FetchError, ensure_success};
use crate::domain::gold_price::{parse_api_sell_price, parse_page_sell_price};

/// 金価格取得トレイト（テスト用の抽象化）
#[async_trait]
pub trait GoldPriceClient: Send + Sync {
    /// 現在の売値を取得する
    ///
    /// # 引数
    /// * `base_url` - 取得元のベースURL
    async fn fetch_sell_price(&self, base_url: &str) -> Result<Decimal, FetchError>;
}

/// DOJIサイトから金価格を取得するHTTPクライアント
#[derive(Debug, Clone)]
pub struct DojiGoldClient {
    client: Client,
}

impl DojiGoldClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api_url(base_url: &str) -> String {
        format!("{}/api/gold-price", base_url.trim_end_matches('/'))
    }

    fn page_url(base_url: &str) -> String {
        format!("{}/gia-vang", base_url.trim_end_matches('/'))
    }

    async fn fetch_from_api(&self, base_url: &str) -> Result<Decimal, FetchError> {
        let response = self.client.get(Self::api_url(base_url)).send().await?;
        let body: Value = ensure_success(response).await?.json().await?;

        parse_api_sell_price(&body)
            .ok_or_else(|| FetchError::Parse("sell_price not found in API response".to_string()))
    }

    async fn fetch_from_page(&self, base_url: &str) -> Result<Decimal, FetchError> {
        let response = self.client.get(Self::page_url(base_url)).send().await?;
        let html = ensure_success(response).await?.text().await?;

        parse_page_sell_price(&html)
            .ok_or_else(|| FetchError::Parse("gold price element not found on page".to_string()))
    }
}

#[async_trait]
impl GoldPriceClient for DojiGoldClient {
    async fn fetch_sell_price(&self, base_url: &str) -> Result<Decimal, FetchError> {
        match self.fetch_from_api(base_url).await {
            Ok(price) => {
                debug!(price = %price, "金価格APIから取得");
                return Ok(price);
            }
            Err(err) => {
                warn!(error = %err, "金価格API取得失敗、ページ取得にフォールバック");
            }
        }

        let price = self.fetch_from_page(base_url).await?;
        info!(price = %price, "金価格ページから取得");
        Ok(price)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// テスト用のモック金価格クライアント
    #[derive(Clone)]
    pub struct MockGoldPriceClient {
        result: Arc<Mutex<Result<Decimal, FetchError>>>,
        requested_urls: Arc<Mutex<Vec<String>>>,
    }

    impl MockGoldPriceClient {
        pub fn returning(result: Result<Decimal, FetchError>) -> Self {
            Self {
                result: Arc::new(Mutex::new(result)),
                requested_urls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn requested_urls(&self) -> Vec<String> {
            self.requested_urls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GoldPriceClient for MockGoldPriceClient {
        async fn fetch_sell_price(&self, base_url: &str) -> Result<Decimal, FetchError> {
            self.requested_urls.lock().unwrap().push(base_url.to_string());
            self.result.lock().unwrap().clone()
        }
    }

    use crate::infrastructure::http_client::tests::{
        StubResponse, spawn_stub_server, stub_http_client,
    };
    use rust_decimal_macros::dec;
    use serde_json::json;

    const GOLD_PAGE: &str = r#"
        <html><body>
          <div class="gold-price">
            <span class="buy-price">83.000.000</span>
            <span class="sell-price">84.500.000</span>
          </div>
        </body></html>
    "#;

    #[tokio::test]
    async fn test_fetch_from_api() {
        let server = spawn_stub_server(vec![
            ("/api/gold-price", StubResponse::json(200, json!({"sell_price": 8450000}))),
            ("/gia-vang", StubResponse::html(200, GOLD_PAGE)),
        ])
        .await;
        let client = DojiGoldClient::new(stub_http_client());

        let price = client.fetch_sell_price(&server.base_url).await.unwrap();

        assert_eq!(price, dec!(8450000));
        // API成功時はページを取得しない
        assert_eq!(server.paths(), vec!["/api/gold-price"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_page_on_api_error_status() {
        let server = spawn_stub_server(vec![
            ("/api/gold-price", StubResponse::html(500, "internal error")),
            ("/gia-vang", StubResponse::html(200, GOLD_PAGE)),
        ])
        .await;
        let client = DojiGoldClient::new(stub_http_client());

        let price = client.fetch_sell_price(&server.base_url).await.unwrap();

        assert_eq!(price, dec!(84500));
        assert_eq!(server.paths(), vec!["/api/gold-price", "/gia-vang"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_page_on_zero_api_price() {
        let server = spawn_stub_server(vec![
            ("/api/gold-price", StubResponse::json(200, json!({"sell_price": 0}))),
            ("/gia-vang", StubResponse::html(200, GOLD_PAGE)),
        ])
        .await;
        let client = DojiGoldClient::new(stub_http_client());

        let price = client.fetch_sell_price(&server.base_url).await.unwrap();

        assert_eq!(price, dec!(84500));
        assert_eq!(server.paths(), vec!["/api/gold-price", "/gia-vang"]);
    }

    #[tokio::test]
    async fn test_both_sources_failing() {
        let server = spawn_stub_server(vec![
            ("/api/gold-price", StubResponse::html(500, "internal error")),
            ("/gia-vang", StubResponse::html(502, "bad gateway")),
        ])
        .await;
        let client = DojiGoldClient::new(stub_http_client());

        let result = client.fetch_sell_price(&server.base_url).await;

        // ページ側のエラーが返る
        assert!(matches!(result, Err(FetchError::Status { status: 502, .. })));
    }

    #[tokio::test]
    async fn test_page_without_price_is_parse_error() {
        let server = spawn_stub_server(vec![
            ("/api/gold-price", StubResponse::json(200, json!({}))),
            ("/gia-vang", StubResponse::html(200, "<html><body>maintenance</body></html>")),
        ])
        .await;
        let client = DojiGoldClient::new(stub_http_client());

        let result = client.fetch_sell_price(&server.base_url).await;

        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        assert_eq!(
            DojiGoldClient::api_url("https://doji.vn/"),
            "https://doji.vn/api/gold-price"
        );
        assert_eq!(
            DojiGoldClient::page_url("https://doji.vn"),
            "https://doji.vn/gia-vang"
        );
    }
}
