/// 定期実行Lambda関数
///
/// EventBridgeスケジュールから起動され、以下を順に処理する:
/// - 環境変数`TRACKERS_CONFIG`の固定ペイロード
/// - 商品カタログの追跡中商品（`PRODUCTS_TABLE`設定時）
///
/// 個々の失敗は結果リストに含め、バッチ全体は200を返す。
use aws_lambda_events::event::cloudwatch_events::CloudWatchEvent;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::{Value, json};
use tracker::bootstrap::{ProductCatalog, TrackerDispatcher, build_catalog, build_dispatcher};
use tracker::infrastructure::{AppConfig, init_logging};
use tracing::{error, info};

/// 起動時に構築する共有リソース
struct Resources {
    config: AppConfig,
    dispatcher: TrackerDispatcher,
    catalog: Option<ProductCatalog>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let config = AppConfig::from_env()?;
    let sdk_config = config.load_sdk_config().await;
    let dispatcher = build_dispatcher(&config, &sdk_config)?;

    // カタログは任意
    let catalog = match config.products_table() {
        Some(_) => Some(build_catalog(&config, &sdk_config)?),
        None => None,
    };

    info!(
        fixed_trackers = config.trackers_config().len(),
        catalog_enabled = catalog.is_some(),
        "定期実行Lambdaを初期化"
    );

    let resources = Resources {
        config,
        dispatcher,
        catalog,
    };
    let resources_ref = &resources;
    let func = service_fn(move |event: LambdaEvent<CloudWatchEvent>| async move {
        handler(resources_ref, event).await
    });
    lambda_runtime::run(func).await?;
    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// # 処理フロー
/// 1. 固定ペイロードと商品カタログから処理対象を集める
/// 2. ディスパッチャーで1件ずつ処理（失敗しても継続）
/// 3. 全結果をまとめて返す
async fn handler(resources: &Resources, event: LambdaEvent<CloudWatchEvent>) -> Result<Value, Error> {
    info!(
        source = event.payload.source.as_deref().unwrap_or("(unknown)"),
        "スケジュールイベントを受信"
    );

    let mut payloads = resources.config.trackers_config().to_vec();
    let mut results = Vec::new();

    if let Some(catalog) = &resources.catalog {
        match catalog.tracking_payloads().await {
            Ok(products) => payloads.extend(products),
            Err(err) => {
                error!(error = %err, "商品カタログの読み込み失敗");
                results.push(json!({
                    "statusCode": 500,
                    "error": format!("Failed to load product catalog: {}", err),
                }));
            }
        }
    }

    results.extend(resources.dispatcher.handle_all(&payloads).await);

    Ok(json!({
        "statusCode": 200,
        "processed": payloads.len(),
        "results": results,
    }))
}
