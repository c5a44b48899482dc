//! 価格変動通知モジュール
//!
//! 通知チャネル（SNS / ntfy / ログのみ）を`Notifier`トレイトで抽象化する。

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use super::ntfy_notifier::NtfyNotifier;
use super::sns_notifier::SnsNotifier;
use crate::domain::PriceAlert;

/// 通知のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NotifyError {
    /// SNS発行に失敗
    #[error("通知発行エラー: {0}")]
    Publish(String),

    /// メッセージのシリアライズに失敗
    #[error("JSONシリアライズエラー: {0}")]
    Serialize(String),

    /// ntfyへのHTTPリクエストに失敗
    #[error("HTTPエラー: {0}")]
    Http(String),
}

/// 通知トレイト（テスト用の抽象化）
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 価格変動アラートを送信する
    async fn notify(&self, alert: &PriceAlert) -> Result<(), NotifyError>;
}

/// ログ出力のみ行う通知実装（通知チャネル無効時）
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, alert: &PriceAlert) -> Result<(), NotifyError> {
        info!(
            subject_id = %alert.subject_id,
            old_price = %alert.old_price,
            new_price = %alert.new_price,
            message = %alert.render_text(),
            "価格変動（通知チャネル無効）"
        );
        Ok(())
    }
}

/// 設定で選択された通知チャネル
pub enum ConfiguredNotifier {
    Sns(SnsNotifier),
    Ntfy(NtfyNotifier),
    Log(LogNotifier),
}

#[async_trait]
impl Notifier for ConfiguredNotifier {
    async fn notify(&self, alert: &PriceAlert) -> Result<(), NotifyError> {
        match self {
            ConfiguredNotifier::Sns(notifier) => notifier.notify(alert).await,
            ConfiguredNotifier::Ntfy(notifier) => notifier.notify(alert).await,
            ConfiguredNotifier::Log(notifier) => notifier.notify(alert).await,
        }
    }
}
