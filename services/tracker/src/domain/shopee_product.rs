/// Shopee商品の識別と価格抽出
///
/// - 商品URL（`https://shopee.vn/<名前>-i.<shopid>.<itemid>`）からID組を取り出す
/// - `/api/v4/item/get`レスポンスから表示価格を取り出す
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Shopee APIの価格は10万倍の整数で返される
const PRICE_SCALE: i64 = 100_000;

/// 商品URL解析のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProductUrlError {
    #[error("URLとして解析できません: {0}")]
    InvalidUrl(String),

    #[error("ShopeeのURLではありません: {0}")]
    NotShopee(String),

    #[error("URLにショップIDと商品IDが含まれていません: {0}")]
    MissingIds(String),
}

/// APIレスポンス解釈のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShopeeResponseError {
    /// APIがエラーコードを返した
    #[error("Shopee API error {code}: {message}")]
    Api { code: i64, message: String },

    /// dataフィールドが無い
    #[error("No data in Shopee response")]
    MissingData,

    /// 価格フィールドが無い、または不正な値
    #[error("Invalid price in Shopee response: {0}")]
    InvalidPrice(String),
}

/// URLから取り出したShopee商品の識別子
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopeeProductRef {
    /// ショップID（shopid）
    pub shop_id: String,
    /// 商品ID（itemid）
    pub item_id: String,
    /// スキームとホストのみのベースURL（例: `https://shopee.vn`）
    pub base_url: String,
}

impl ShopeeProductRef {
    /// 商品ページURLを解析する
    ///
    /// 以下の2形式に対応:
    /// - `https://shopee.vn/<商品名>-i.<shopid>.<itemid>`
    /// - `https://shopee.vn/product/<shopid>/<itemid>`
    pub fn from_url(raw: &str) -> Result<Self, ProductUrlError> {
        let url = Url::parse(raw).map_err(|_| ProductUrlError::InvalidUrl(raw.to_string()))?;

        let host = url
            .host_str()
            .filter(|host| host.split('.').any(|label| label == "shopee"))
            .ok_or_else(|| ProductUrlError::NotShopee(raw.to_string()))?;
        let base_url = format!("{}://{}", url.scheme(), host);

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default();

        let (shop_id, item_id) = match segments.as_slice() {
            ["product", shop_id, item_id] => (shop_id.to_string(), item_id.to_string()),
            [.., last] => {
                let mut parts = last.rsplit('.');
                match (parts.next(), parts.next()) {
                    (Some(item_id), Some(shop_id)) => (shop_id.to_string(), item_id.to_string()),
                    _ => return Err(ProductUrlError::MissingIds(raw.to_string())),
                }
            }
            [] => return Err(ProductUrlError::MissingIds(raw.to_string())),
        };

        if !is_numeric_id(&shop_id) || !is_numeric_id(&item_id) {
            return Err(ProductUrlError::MissingIds(raw.to_string()));
        }

        Ok(Self {
            shop_id,
            item_id,
            base_url,
        })
    }
}

fn is_numeric_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// `/api/v4/item/get`のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopeeItemResponse {
    #[serde(default)]
    pub error: Option<i64>,
    #[serde(default)]
    pub error_msg: Option<String>,
    #[serde(default)]
    pub data: Option<ShopeeItem>,
}

/// 商品データ（必要なフィールドのみ）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopeeItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub price_min: Option<i64>,
    #[serde(default)]
    pub price_max: Option<i64>,
}

impl ShopeeItemResponse {
    /// レスポンスから商品データを取り出す
    pub fn into_item(self) -> Result<ShopeeItem, ShopeeResponseError> {
        match self.error {
            Some(0) | None => {}
            Some(code) => {
                return Err(ShopeeResponseError::Api {
                    code,
                    message: self.error_msg.unwrap_or_else(|| "Unknown error".to_string()),
                });
            }
        }

        self.data.ok_or(ShopeeResponseError::MissingData)
    }
}

impl ShopeeItem {
    /// 表示価格を通貨単位で返す
    ///
    /// バリエーションで価格帯がある場合（`price_min != price_max`）は最安値を使う。
    pub fn current_price(&self) -> Result<Decimal, ShopeeResponseError> {
        let raw = if self.price_min != self.price_max {
            self.price_min
        } else {
            self.price
        };

        let raw = raw.ok_or_else(|| ShopeeResponseError::InvalidPrice("missing".to_string()))?;
        if raw <= 0 {
            return Err(ShopeeResponseError::InvalidPrice(raw.to_string()));
        }

        Ok(Decimal::from(raw) / Decimal::from(PRICE_SCALE))
    }
}
