// ntfy通知クライアント
//
// `POST {server}/{topic}`にテキスト本文を送る。
// 一時的な失敗は指数バックオフで再試行する。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::{info, warn};

use super::notifier::{NotifyError, Notifier};
use crate::domain::PriceAlert;

/// 最大再試行回数
const MAX_RETRIES: u32 = 3;

/// リクエストタイムアウト（秒）
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// ntfyトピックへ送信する通知実装
#[derive(Clone)]
pub struct NtfyNotifier {
    /// HTTPクライアント（再試行ミドルウェア付き）
    client: ClientWithMiddleware,
    server_url: String,
    topic: String,
}

impl std::fmt::Debug for NtfyNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NtfyNotifier")
            .field("server_url", &self.server_url)
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl NtfyNotifier {
    /// 新しいNtfyNotifierを作成
    ///
    /// # 引数
    /// * `server_url` - ntfyサーバーURL（例: `https://ntfy.sh`）
    /// * `topic` - 送信先トピック
    pub fn new(server_url: String, topic: String) -> reqwest::Result<Self> {
        let base_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);

        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            server_url,
            topic,
        })
    }

    fn topic_url(&self) -> String {
        format!("{}/{}", self.server_url.trim_end_matches('/'), self.topic)
    }
}

/// ntfyのTagsヘッダー値（絵文字ショートコード）
fn tags(alert: &PriceAlert) -> &'static str {
    if alert.is_increase() {
        "chart_with_upwards_trend"
    } else {
        "chart_with_downwards_trend"
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn notify(&self, alert: &PriceAlert) -> Result<(), NotifyError> {
        let url = self.topic_url();

        let response = self
            .client
            .post(&url)
            .header("Title", alert.subject())
            .header("Tags", tags(alert))
            .body(alert.render_text())
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "ntfy送信エラー");
                NotifyError::Http(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), body = %body, "ntfyがエラーを返却");
            return Err(NotifyError::Http(format!("status={}, message={}", status.as_u16(), body)));
        }

        info!(url = %url, subject_id = %alert.subject_id, "ntfy送信成功");
        Ok(())
    }
}
