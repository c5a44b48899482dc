/// 追跡ジョブワーカーLambda関数
///
/// SQSのレコード本文をそれぞれディスパッチャーで処理する。
/// 取得・読み込み・保存の失敗は部分バッチ失敗として返し、SQSに再配信させる。
/// 未知の種別や不正なペイロードは再試行しても成功しないため、ログに残して破棄する。
use aws_lambda_events::event::sqs::{BatchItemFailure, SqsBatchResponse, SqsEvent, SqsMessage};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use tracker::bootstrap::{TrackerDispatcher, build_dispatcher};
use tracker::infrastructure::{AppConfig, init_logging};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    let config = AppConfig::from_env()?;
    let sdk_config = config.load_sdk_config().await;
    let dispatcher = build_dispatcher(&config, &sdk_config)?;

    let dispatcher_ref = &dispatcher;
    let func = service_fn(move |event: LambdaEvent<SqsEvent>| async move {
        handler(dispatcher_ref, event).await
    });
    lambda_runtime::run(func).await?;
    Ok(())
}

/// レコード1件の処理結果
enum RecordResult {
    Done,
    /// 再配信で成功しうる失敗
    Retry,
    /// 破棄する
    Dropped,
}

/// Lambda関数のメインハンドラー
async fn handler(
    dispatcher: &TrackerDispatcher,
    event: LambdaEvent<SqsEvent>,
) -> Result<SqsBatchResponse, Error> {
    let records = event.payload.records;
    info!(record_count = records.len(), "SQSイベントを受信");

    let mut response = SqsBatchResponse::default();
    let mut dropped = 0usize;

    for record in &records {
        match process_record(dispatcher, record).await {
            RecordResult::Done => {}
            RecordResult::Dropped => dropped += 1,
            RecordResult::Retry => {
                let mut failure = BatchItemFailure::default();
                failure.item_identifier = record.message_id.clone().unwrap_or_default();
                response.batch_item_failures.push(failure);
            }
        }
    }

    info!(
        record_count = records.len(),
        retry_count = response.batch_item_failures.len(),
        dropped_count = dropped,
        "SQSイベント処理完了"
    );

    Ok(response)
}

async fn process_record(dispatcher: &TrackerDispatcher, record: &SqsMessage) -> RecordResult {
    let message_id = record.message_id.as_deref().unwrap_or("(unknown)");

    let payload: Value = match record.body.as_deref().map(serde_json::from_str) {
        Some(Ok(payload)) => payload,
        Some(Err(err)) => {
            error!(message_id = message_id, error = %err, "メッセージ本文がJSONではない");
            return RecordResult::Dropped;
        }
        None => {
            error!(message_id = message_id, "メッセージ本文が空");
            return RecordResult::Dropped;
        }
    };

    match dispatcher.dispatch(&payload).await {
        Ok(outcome) => {
            info!(
                message_id = message_id,
                subject_id = %outcome.observation.subject_id,
                "ジョブ処理成功"
            );
            RecordResult::Done
        }
        Err(err) if err.is_retryable() => {
            warn!(message_id = message_id, error = %err, "ジョブ処理失敗（再配信）");
            RecordResult::Retry
        }
        Err(err) => {
            error!(message_id = message_id, error = %err, "不正なジョブを破棄");
            RecordResult::Dropped
        }
    }
}
