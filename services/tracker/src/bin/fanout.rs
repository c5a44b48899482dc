/// ファンアウトLambda関数
///
/// EventBridgeスケジュールから起動され、追跡中の商品ごと（と金価格）に
/// 追跡ジョブをSQSへ投入する。ジョブはworker Lambdaが処理する。
use aws_lambda_events::event::cloudwatch_events::CloudWatchEvent;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use tracker::bootstrap::{JobFanout, build_fanout};
use tracker::infrastructure::{FanoutConfig, init_logging};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // 商品カタログとキューURLのみ必要
    let config = FanoutConfig::from_env()?;
    let sdk_config = config.load_sdk_config().await;
    let fanout = build_fanout(&config, &sdk_config);

    let fanout_ref = &fanout;
    let func = service_fn(move |event: LambdaEvent<CloudWatchEvent>| async move {
        handler(fanout_ref, event).await
    });
    lambda_runtime::run(func).await?;
    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// カタログを読めなかった場合のみエラーを返す（Lambdaの再試行に任せる）。
async fn handler(fanout: &JobFanout, _event: LambdaEvent<CloudWatchEvent>) -> Result<Value, Error> {
    info!("ファンアウト開始");

    match fanout.run().await {
        Ok(report) => Ok(report.to_response()),
        Err(err) => {
            error!(error = %err, "ファンアウト失敗");
            Err(err.into())
        }
    }
}
