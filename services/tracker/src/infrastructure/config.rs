/// アプリケーション設定
///
/// 環境変数から読み込み、起動時に一度だけ構築して各コンポーネントに渡す。
///
/// 環境変数:
/// - PRICE_HISTORY_TABLE: 価格履歴テーブル名（必須）
/// - PRODUCTS_TABLE: 商品カタログテーブル名（カタログ利用時に必須）
/// - NOTIFICATION_CHANNEL: `sns` | `ntfy` | `none`（デフォルト`sns`）
/// - PRICE_TOPIC_ARN: 通知先SNSトピックARN（`sns`時に必須）
/// - NTFY_URL: ntfyサーバーURL（デフォルト`https://ntfy.sh`）
/// - NTFY_TOPIC: ntfyトピック名（`ntfy`時に必須）
/// - CRAWL_QUEUE_URL: ファンアウト先SQSキューURL（ファンアウトのみ、`FanoutConfig`）
/// - TRACKERS_CONFIG: 定期実行するペイロードのJSON配列（デフォルト`[]`）
/// - AWS_ENDPOINT_URL_OVERRIDE: AWSエンドポイント上書き（LocalStack等）
use aws_config::{BehaviorVersion, SdkConfig};
use serde_json::Value;
use thiserror::Error;

pub const PRICE_HISTORY_TABLE: &str = "PRICE_HISTORY_TABLE";
pub const PRODUCTS_TABLE: &str = "PRODUCTS_TABLE";
pub const NOTIFICATION_CHANNEL: &str = "NOTIFICATION_CHANNEL";
pub const PRICE_TOPIC_ARN: &str = "PRICE_TOPIC_ARN";
pub const NTFY_URL: &str = "NTFY_URL";
pub const NTFY_TOPIC: &str = "NTFY_TOPIC";
pub const CRAWL_QUEUE_URL: &str = "CRAWL_QUEUE_URL";
pub const TRACKERS_CONFIG: &str = "TRACKERS_CONFIG";
pub const AWS_ENDPOINT_URL_OVERRIDE: &str = "AWS_ENDPOINT_URL_OVERRIDE";

/// ntfyサーバーのデフォルトURL
pub const DEFAULT_NTFY_URL: &str = "https://ntfy.sh";

/// 設定読み込みのエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// 価格変動の通知先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationChannel {
    /// SNSトピックへJSONで発行
    Sns { topic_arn: String },
    /// ntfyトピックへテキストで送信
    Ntfy { server_url: String, topic: String },
    /// ログ出力のみ
    Disabled,
}

/// 全Lambda関数共通の設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    price_history_table: String,
    products_table: Option<String>,
    notification_channel: NotificationChannel,
    trackers_config: Vec<Value>,
    endpoint_url: Option<String>,
}

impl AppConfig {
    /// プロセスの環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字列の値は未設定として扱う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &str| get(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()));

        let price_history_table = require(PRICE_HISTORY_TABLE)?;

        let notification_channel = match get(NOTIFICATION_CHANNEL).as_deref().unwrap_or("sns") {
            "sns" => NotificationChannel::Sns {
                topic_arn: require(PRICE_TOPIC_ARN)?,
            },
            "ntfy" => NotificationChannel::Ntfy {
                server_url: get(NTFY_URL).unwrap_or_else(|| DEFAULT_NTFY_URL.to_string()),
                topic: require(NTFY_TOPIC)?,
            },
            "none" => NotificationChannel::Disabled,
            other => {
                return Err(ConfigError::InvalidValue {
                    name: NOTIFICATION_CHANNEL.to_string(),
                    reason: format!("unsupported channel {}", other),
                });
            }
        };

        let trackers_config = match get(TRACKERS_CONFIG) {
            Some(raw) => parse_trackers_config(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            price_history_table,
            products_table: get(PRODUCTS_TABLE),
            notification_channel,
            trackers_config,
            endpoint_url: get(AWS_ENDPOINT_URL_OVERRIDE),
        })
    }

    /// 明示的な値で設定を作成（テスト用）
    pub fn new(price_history_table: String, notification_channel: NotificationChannel) -> Self {
        Self {
            price_history_table,
            products_table: None,
            notification_channel,
            trackers_config: Vec::new(),
            endpoint_url: None,
        }
    }

    pub fn price_history_table(&self) -> &str {
        &self.price_history_table
    }

    pub fn products_table(&self) -> Option<&str> {
        self.products_table.as_deref()
    }

    pub fn notification_channel(&self) -> &NotificationChannel {
        &self.notification_channel
    }

    /// 定期実行で処理する固定ペイロード
    pub fn trackers_config(&self) -> &[Value] {
        &self.trackers_config
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    /// 商品カタログテーブル名を取得（未設定ならエラー）
    pub fn require_products_table(&self) -> Result<&str, ConfigError> {
        self.products_table()
            .ok_or_else(|| ConfigError::MissingEnvVar(PRODUCTS_TABLE.to_string()))
    }

    /// AWS SDK設定を読み込む（認証情報、リージョン、エンドポイント上書き）
    pub async fn load_sdk_config(&self) -> SdkConfig {
        load_sdk_config(self.endpoint_url()).await
    }
}

/// ファンアウトLambdaの設定
///
/// 商品カタログを読み、ジョブをキューへ投入するだけなので
/// 価格履歴テーブルや通知先は不要。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutConfig {
    products_table: String,
    crawl_queue_url: String,
    endpoint_url: Option<String>,
}

impl FanoutConfig {
    /// プロセスの環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む（空文字列は未設定扱い）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &str| get(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()));

        Ok(Self {
            products_table: require(PRODUCTS_TABLE)?,
            crawl_queue_url: require(CRAWL_QUEUE_URL)?,
            endpoint_url: get(AWS_ENDPOINT_URL_OVERRIDE),
        })
    }

    pub fn products_table(&self) -> &str {
        &self.products_table
    }

    pub fn crawl_queue_url(&self) -> &str {
        &self.crawl_queue_url
    }

    pub async fn load_sdk_config(&self) -> SdkConfig {
        load_sdk_config(self.endpoint_url.as_deref()).await
    }
}

/// AWS SDK設定を読み込む
///
/// # 引数
/// * `endpoint_url` - エンドポイント上書き（LocalStack等、未指定ならAWS標準）
pub async fn load_sdk_config(endpoint_url: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(endpoint_url) = endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }
    loader.load().await
}

fn parse_trackers_config(raw: &str) -> Result<Vec<Value>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        name: TRACKERS_CONFIG.to_string(),
        reason,
    };

    match serde_json::from_str::<Value>(raw).map_err(|e| invalid(e.to_string()))? {
        Value::Array(items) => Ok(items),
        _ => Err(invalid("expected a JSON array".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |name: &str| map.get(name).map(|value| value.to_string())
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::MissingEnvVar("PRICE_HISTORY_TABLE".to_string()).to_string(),
            "Missing environment variable: PRICE_HISTORY_TABLE"
        );
    }

    #[test]
    fn test_minimal_sns_config() {
        let config = AppConfig::from_lookup(lookup(&[
            (PRICE_HISTORY_TABLE, "price-history"),
            (PRICE_TOPIC_ARN, "arn:aws:sns:ap-southeast-1:123456789012:price"),
        ]))
        .unwrap();

        assert_eq!(config.price_history_table(), "price-history");
        assert_eq!(
            config.notification_channel(),
            &NotificationChannel::Sns {
                topic_arn: "arn:aws:sns:ap-southeast-1:123456789012:price".to_string()
            }
        );
        assert_eq!(config.products_table(), None);
        assert!(config.trackers_config().is_empty());
        assert_eq!(config.endpoint_url(), None);
    }

    #[test]
    fn test_missing_history_table() {
        let result = AppConfig::from_lookup(lookup(&[(NOTIFICATION_CHANNEL, "none")]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::MissingEnvVar(PRICE_HISTORY_TABLE.to_string())
        );
    }

    #[test]
    fn test_blank_value_is_missing() {
        let result = AppConfig::from_lookup(lookup(&[
            (PRICE_HISTORY_TABLE, "   "),
            (NOTIFICATION_CHANNEL, "none"),
        ]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_sns_requires_topic() {
        let result = AppConfig::from_lookup(lookup(&[(PRICE_HISTORY_TABLE, "t")]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::MissingEnvVar(PRICE_TOPIC_ARN.to_string())
        );
    }

    #[test]
    fn test_ntfy_channel() {
        let config = AppConfig::from_lookup(lookup(&[
            (PRICE_HISTORY_TABLE, "t"),
            (NOTIFICATION_CHANNEL, "ntfy"),
            (NTFY_TOPIC, "price-alerts"),
        ]))
        .unwrap();

        assert_eq!(
            config.notification_channel(),
            &NotificationChannel::Ntfy {
                server_url: DEFAULT_NTFY_URL.to_string(),
                topic: "price-alerts".to_string()
            }
        );

        let missing_topic = AppConfig::from_lookup(lookup(&[
            (PRICE_HISTORY_TABLE, "t"),
            (NOTIFICATION_CHANNEL, "ntfy"),
        ]));
        assert_eq!(
            missing_topic.unwrap_err(),
            ConfigError::MissingEnvVar(NTFY_TOPIC.to_string())
        );
    }

    #[test]
    fn test_unknown_channel() {
        let result = AppConfig::from_lookup(lookup(&[
            (PRICE_HISTORY_TABLE, "t"),
            (NOTIFICATION_CHANNEL, "email"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_optional_values() {
        let config = AppConfig::from_lookup(lookup(&[
            (PRICE_HISTORY_TABLE, "t"),
            (NOTIFICATION_CHANNEL, "none"),
            (PRODUCTS_TABLE, "products"),
            (AWS_ENDPOINT_URL_OVERRIDE, "http://localhost:4566"),
            (
                TRACKERS_CONFIG,
                r#"[{"tracker_type":"gold","config":{"notification_threshold":0.02}}]"#,
            ),
        ]))
        .unwrap();

        assert_eq!(config.notification_channel(), &NotificationChannel::Disabled);
        assert_eq!(config.require_products_table().unwrap(), "products");
        assert_eq!(config.endpoint_url(), Some("http://localhost:4566"));
        assert_eq!(config.trackers_config().len(), 1);
        assert_eq!(config.trackers_config()[0]["tracker_type"], "gold");
    }

    #[test]
    fn test_require_missing_products_table() {
        let config = AppConfig::new("t".to_string(), NotificationChannel::Disabled);
        assert_eq!(
            config.require_products_table().unwrap_err(),
            ConfigError::MissingEnvVar(PRODUCTS_TABLE.to_string())
        );
    }

    #[test]
    fn test_fanout_config_needs_only_catalog_and_queue() {
        // 価格履歴テーブルや通知先が無くても読み込める
        let config = FanoutConfig::from_lookup(lookup(&[
            (PRODUCTS_TABLE, "products"),
            (CRAWL_QUEUE_URL, "https://sqs.local/queue"),
        ]))
        .unwrap();

        assert_eq!(config.products_table(), "products");
        assert_eq!(config.crawl_queue_url(), "https://sqs.local/queue");
    }

    #[test]
    fn test_fanout_config_requires_queue_url() {
        let result = FanoutConfig::from_lookup(lookup(&[(PRODUCTS_TABLE, "products")]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::MissingEnvVar(CRAWL_QUEUE_URL.to_string())
        );

        let result = FanoutConfig::from_lookup(lookup(&[(CRAWL_QUEUE_URL, "https://sqs.local/queue")]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::MissingEnvVar(PRODUCTS_TABLE.to_string())
        );
    }

    #[test]
    fn test_trackers_config_must_be_array() {
        let result = AppConfig::from_lookup(lookup(&[
            (PRICE_HISTORY_TABLE, "t"),
            (NOTIFICATION_CHANNEL, "none"),
            (TRACKERS_CONFIG, r#"{"tracker_type":"gold"}"#),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = AppConfig::from_lookup(lookup(&[
            (PRICE_HISTORY_TABLE, "t"),
            (NOTIFICATION_CHANNEL, "none"),
            (TRACKERS_CONFIG, "not json"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    // 環境変数はプロセスグローバルな状態のためシリアル実行する
    #[test]
    #[serial]
    fn test_from_env() {
        // 安全性: serialで他の環境変数テストと同時に実行されない
        unsafe {
            std::env::set_var(PRICE_HISTORY_TABLE, "env-history");
            std::env::set_var(NOTIFICATION_CHANNEL, "none");
        }

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.price_history_table(), "env-history");
        assert_eq!(config.notification_channel(), &NotificationChannel::Disabled);

        // 安全性: 同上
        unsafe {
            std::env::remove_var(PRICE_HISTORY_TABLE);
            std::env::remove_var(NOTIFICATION_CHANNEL);
        }
    }
}
