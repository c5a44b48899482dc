//! 追跡ジョブキュー
//!
//! ファンアウトで生成した追跡ペイロードをSQSに投入する。

use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// ジョブ投入のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueueError {
    #[error("SQS送信エラー: {0}")]
    Send(String),

    #[error("JSONシリアライズエラー: {0}")]
    Serialize(String),
}

/// ジョブキュートレイト（テスト用の抽象化）
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 追跡ペイロードを1件投入する
    async fn enqueue(&self, payload: &Value) -> Result<(), QueueError>;
}

/// SQSを使うジョブキュー実装
#[derive(Debug, Clone)]
pub struct SqsJobQueue {
    client: SqsClient,
    queue_url: String,
}

impl SqsJobQueue {
    pub fn new(client: SqsClient, queue_url: String) -> Self {
        Self { client, queue_url }
    }
}

#[async_trait]
impl JobQueue for SqsJobQueue {
    async fn enqueue(&self, payload: &Value) -> Result<(), QueueError> {
        let body =
            serde_json::to_string(payload).map_err(|e| QueueError::Serialize(e.to_string()))?;

        let response = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::Send(e.to_string()))?;

        debug!(
            message_id = response.message_id().unwrap_or("unknown"),
            "ジョブを投入"
        );
        Ok(())
    }
}
