/// トラッカー呼び出しペイロード
///
/// スケジューラから渡されるJSONペイロードを解析し、
/// `tracker_type`に応じたトラッカー種別ごとのリクエストに変換する。
///
/// 受け付ける形:
/// ```text
/// {"tracker_type": "gold", "config": {"notification_threshold": 0.02}}
/// {"tracker_type": "shopee", "product_id": "123", "config": {"shop_id": "456"}}
/// ```
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// 通知閾値のデフォルト（1%）
pub const DEFAULT_NOTIFICATION_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// 金価格の追跡対象ID
pub const GOLD_SUBJECT_ID: &str = "gold_doji";

/// 金価格取得元のデフォルトURL
pub const DEFAULT_GOLD_BASE_URL: &str = "https://doji.vn";

/// Shopeeのデフォルトベース URL
pub const DEFAULT_SHOPEE_BASE_URL: &str = "https://shopee.vn";

/// ペイロード解析のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    /// 対応するトラッカーが存在しない
    #[error("Unknown tracker type: {0}")]
    UnknownTrackerType(String),

    /// ペイロードの形式が不正
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// トラッカー種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerKind {
    Gold,
    Shopee,
}

impl TrackerKind {
    /// 登録済みの全トラッカー種別
    pub const ALL: [TrackerKind; 2] = [TrackerKind::Gold, TrackerKind::Shopee];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerKind::Gold => "gold",
            TrackerKind::Shopee => "shopee",
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackerKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RequestError::UnknownTrackerType(s.to_string()))
    }
}

/// 金価格トラッカーの設定
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GoldConfig {
    /// 通知閾値（相対変化率）
    pub notification_threshold: Option<Decimal>,
    /// 取得元のベースURL
    pub url: Option<String>,
}

/// Shopee商品トラッカーの設定
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShopeeConfig {
    /// ショップID
    #[serde(deserialize_with = "string_or_number")]
    pub shop_id: String,
    /// 通知閾値（相対変化率）
    #[serde(default)]
    pub notification_threshold: Option<Decimal>,
    /// ShopeeのベースURL（国別ドメイン）
    #[serde(default)]
    pub base_url: Option<String>,
    /// 通知に使う商品名
    #[serde(default)]
    pub product_name: Option<String>,
}

/// 金価格トラッカーへのリクエスト
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GoldRequest {
    #[serde(default)]
    pub config: GoldConfig,
}

impl GoldRequest {
    pub fn notification_threshold(&self) -> Decimal {
        self.config
            .notification_threshold
            .unwrap_or(DEFAULT_NOTIFICATION_THRESHOLD)
    }

    pub fn base_url(&self) -> &str {
        self.config.url.as_deref().unwrap_or(DEFAULT_GOLD_BASE_URL)
    }
}

/// Shopee商品トラッカーへのリクエスト
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShopeeRequest {
    /// Shopeeの商品ID（itemid）
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: String,
    pub config: ShopeeConfig,
}

impl ShopeeRequest {
    /// 価格履歴上の追跡対象ID
    pub fn subject_id(&self) -> String {
        format!("shopee_{}", self.product_id)
    }

    pub fn notification_threshold(&self) -> Decimal {
        self.config
            .notification_threshold
            .unwrap_or(DEFAULT_NOTIFICATION_THRESHOLD)
    }

    pub fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_SHOPEE_BASE_URL)
    }

    pub fn product_name(&self) -> String {
        match self.config.product_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("Shopee Product {}", self.product_id),
        }
    }
}

/// 種別ごとに解析済みのトラッカーリクエスト
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerRequest {
    Gold(GoldRequest),
    Shopee(ShopeeRequest),
}

impl TrackerRequest {
    /// 呼び出しペイロードを解析する
    ///
    /// # エラー
    /// - `tracker_type`が未登録の種別: `UnknownTrackerType`
    /// - オブジェクトでない、`tracker_type`欠落、必須フィールド欠落: `InvalidPayload`
    pub fn parse(payload: &Value) -> Result<Self, RequestError> {
        let object = payload.as_object().ok_or_else(|| {
            RequestError::InvalidPayload("payload must be a JSON object".to_string())
        })?;

        let tracker_type = object
            .get("tracker_type")
            .and_then(Value::as_str)
            .ok_or_else(|| RequestError::InvalidPayload("missing tracker_type".to_string()))?;

        let request = match tracker_type.parse::<TrackerKind>()? {
            TrackerKind::Gold => GoldRequest::deserialize(payload).map(TrackerRequest::Gold),
            TrackerKind::Shopee => ShopeeRequest::deserialize(payload).map(TrackerRequest::Shopee),
        }
        .map_err(|e| RequestError::InvalidPayload(e.to_string()))?;

        request.validate()?;
        Ok(request)
    }

    pub fn kind(&self) -> TrackerKind {
        match self {
            TrackerRequest::Gold(_) => TrackerKind::Gold,
            TrackerRequest::Shopee(_) => TrackerKind::Shopee,
        }
    }

    pub fn notification_threshold(&self) -> Decimal {
        match self {
            TrackerRequest::Gold(request) => request.notification_threshold(),
            TrackerRequest::Shopee(request) => request.notification_threshold(),
        }
    }

    fn validate(&self) -> Result<(), RequestError> {
        if self.notification_threshold().is_sign_negative() {
            return Err(RequestError::InvalidPayload(
                "notification_threshold must not be negative".to_string(),
            ));
        }

        if let TrackerRequest::Shopee(request) = self {
            if request.product_id.trim().is_empty() {
                return Err(RequestError::InvalidPayload(
                    "product_id is required for shopee tracker".to_string(),
                ));
            }
            if request.config.shop_id.trim().is_empty() {
                return Err(RequestError::InvalidPayload(
                    "config.shop_id is required for shopee tracker".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// 文字列または整数のIDを文字列として受け取る
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
