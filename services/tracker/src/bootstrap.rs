//! Lambda関数の起動時構築
//!
//! 設定とAWS SDK設定から各サービスを組み立てる。
//! コールドスタート時に一度だけ呼び出し、以降の呼び出しで共有する。

use std::sync::Arc;

use aws_config::SdkConfig;
use thiserror::Error;
use tracing::info;

use crate::application::{CatalogService, Dispatcher, FanoutService, PriceTrackingService};
use crate::infrastructure::{
    AppConfig, ConfigError, ConfiguredNotifier, DojiGoldClient, DynamoObservationRepository,
    DynamoProductRepository, FanoutConfig, HttpShopeeClient, LogNotifier, NotificationChannel,
    NtfyNotifier, SnsNotifier, SqsJobQueue, build_http_client,
};

/// 本番構成のディスパッチャー
pub type TrackerDispatcher = Dispatcher<DynamoObservationRepository, ConfiguredNotifier>;

/// 本番構成のカタログサービス
pub type ProductCatalog = CatalogService<DynamoProductRepository>;

/// 本番構成のファンアウトサービス
pub type JobFanout = FanoutService<DynamoProductRepository, SqsJobQueue>;

/// 起動時構築のエラー型
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("HTTPクライアントの構築に失敗: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// 設定された通知チャネルの実装を作成する
pub fn build_notifier(
    config: &AppConfig,
    sdk_config: &SdkConfig,
) -> Result<ConfiguredNotifier, BootstrapError> {
    let notifier = match config.notification_channel() {
        NotificationChannel::Sns { topic_arn } => ConfiguredNotifier::Sns(SnsNotifier::new(
            aws_sdk_sns::Client::new(sdk_config),
            topic_arn.clone(),
        )),
        NotificationChannel::Ntfy { server_url, topic } => {
            ConfiguredNotifier::Ntfy(NtfyNotifier::new(server_url.clone(), topic.clone())?)
        }
        NotificationChannel::Disabled => ConfiguredNotifier::Log(LogNotifier),
    };
    Ok(notifier)
}

/// ディスパッチャーを作成する
pub fn build_dispatcher(
    config: &AppConfig,
    sdk_config: &SdkConfig,
) -> Result<TrackerDispatcher, BootstrapError> {
    let repository = DynamoObservationRepository::new(
        aws_sdk_dynamodb::Client::new(sdk_config),
        config.price_history_table().to_string(),
    );
    let notifier = build_notifier(config, sdk_config)?;

    let http_client = build_http_client()?;
    let gold_client = Arc::new(DojiGoldClient::new(http_client.clone()));
    let shopee_client = Arc::new(HttpShopeeClient::new(http_client));

    info!(
        price_history_table = config.price_history_table(),
        notification_channel = ?config.notification_channel(),
        "ディスパッチャーを初期化"
    );

    Ok(Dispatcher::new(
        PriceTrackingService::new(repository, notifier),
        gold_client,
        shopee_client,
    ))
}

/// 商品カタログを作成する（`PRODUCTS_TABLE`必須）
pub fn build_catalog(
    config: &AppConfig,
    sdk_config: &SdkConfig,
) -> Result<ProductCatalog, ConfigError> {
    let table_name = config.require_products_table()?;
    Ok(CatalogService::new(DynamoProductRepository::new(
        aws_sdk_dynamodb::Client::new(sdk_config),
        table_name.to_string(),
    )))
}

/// ファンアウトサービスを作成する
pub fn build_fanout(config: &FanoutConfig, sdk_config: &SdkConfig) -> JobFanout {
    let catalog = CatalogService::new(DynamoProductRepository::new(
        aws_sdk_dynamodb::Client::new(sdk_config),
        config.products_table().to_string(),
    ));
    let queue = SqsJobQueue::new(
        aws_sdk_sqs::Client::new(sdk_config),
        config.crawl_queue_url().to_string(),
    );
    FanoutService::new(catalog, queue)
}
