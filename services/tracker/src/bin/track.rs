/// 単発追跡Lambda関数
///
/// 呼び出しペイロード1件（`{"tracker_type": .., ..}`）を処理し、
/// `{"statusCode": .., ..}`形式の結果を返す。
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use tracker::bootstrap::{TrackerDispatcher, build_dispatcher};
use tracker::infrastructure::{AppConfig, init_logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // 設定とクライアントはコールドスタート時に一度だけ構築
    let config = AppConfig::from_env()?;
    let sdk_config = config.load_sdk_config().await;
    let dispatcher = build_dispatcher(&config, &sdk_config)?;

    let dispatcher_ref = &dispatcher;
    let func = service_fn(move |event: LambdaEvent<Value>| async move {
        handler(dispatcher_ref, event).await
    });
    lambda_runtime::run(func).await?;
    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// 失敗もレスポンスJSONで返す（Lambdaとしてはエラーにしない）。
async fn handler(dispatcher: &TrackerDispatcher, event: LambdaEvent<Value>) -> Result<Value, Error> {
    info!(request_id = %event.context.request_id, "追跡リクエストを受信");
    Ok(dispatcher.handle(&event.payload).await)
}
