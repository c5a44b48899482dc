/// 価格追跡サービス
///
/// 全トラッカー共通の処理フロー:
/// 1. 現在価格を取得
/// 2. 直前の観測を読み込み
/// 3. 変動率を評価
/// 4. 観測を追記
/// 5. 閾値以上の変動なら通知
///
/// 取得に失敗した場合は何も保存しない。通知の失敗は観測の保存を取り消さない。
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::tracker::PriceTracker;
use crate::domain::price_observation::{format_timestamp, next_timestamp};
use crate::domain::{PriceAlert, PriceChange, PriceObservation, evaluate};
use crate::infrastructure::{FetchError, Notifier, ObservationRepository, RepositoryError};

/// 1回の追跡処理のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackError {
    /// 価格取得失敗（観測は保存されない）
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// 直前の観測の読み込み失敗
    #[error("Failed to load last observation: {0}")]
    Load(RepositoryError),

    /// 観測の保存失敗
    #[error("Failed to store observation: {0}")]
    Store(RepositoryError),
}

impl TrackError {
    /// レスポンスに使うHTTPステータスコード
    pub fn status_code(&self) -> u16 {
        match self {
            TrackError::Fetch(_) => 502,
            TrackError::Load(_) | TrackError::Store(_) => 500,
        }
    }
}

/// 通知の結果
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationStatus {
    /// 閾値未満のため通知なし
    NotRequired,
    Sent,
    /// 通知に失敗（観測は保存済み）
    Failed(String),
}

/// 保存済みの観測と変動の評価
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub observation: PriceObservation,
    pub change: PriceChange,
    /// 通知に使う名前
    pub display_name: String,
}

impl Decision {
    /// 通知するアラートを組み立てる
    pub fn alert(&self) -> PriceAlert {
        PriceAlert {
            subject_id: self.observation.subject_id.clone(),
            display_name: self.display_name.clone(),
            old_price: self.change.previous_price.unwrap_or(Decimal::ZERO),
            new_price: self.change.current_price,
            change_ratio: self.change.change_ratio,
            timestamp: format_timestamp(&self.observation.timestamp),
        }
    }
}

/// 1回の追跡処理の結果
#[derive(Debug, Clone, PartialEq)]
pub struct TrackOutcome {
    pub observation: PriceObservation,
    pub change: PriceChange,
    pub notification: NotificationStatus,
}

impl TrackOutcome {
    /// 呼び出し元に返すレスポンスJSON
    pub fn to_response(&self) -> Value {
        let mut response = json!({
            "statusCode": 200,
            "subject_id": self.observation.subject_id,
            "current_price": self.change.current_price,
            "previous_price": self.change.previous_price,
            "change_ratio": self.change.change_ratio,
            "price_changed": self.change.price_changed(),
            "notified": self.notification == NotificationStatus::Sent,
            "timestamp": self.observation.timestamp_key(),
        });

        if let NotificationStatus::Failed(error) = &self.notification {
            response["notification_error"] = json!(error);
        }

        response
    }
}

/// 取得→比較→保存→通知を行うサービス
pub struct PriceTrackingService<R, N>
where
    R: ObservationRepository,
    N: Notifier,
{
    repository: R,
    notifier: N,
}

impl<R, N> PriceTrackingService<R, N>
where
    R: ObservationRepository,
    N: Notifier,
{
    pub fn new(repository: R, notifier: N) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// 現在時刻で追跡処理を実行する
    pub async fn track(&self, tracker: &dyn PriceTracker) -> Result<TrackOutcome, TrackError> {
        self.track_at(tracker, Utc::now()).await
    }

    /// 指定時刻で追跡処理を実行する
    ///
    /// # 引数
    /// * `tracker` - 対象のトラッカー
    /// * `now` - 観測時刻の基準（直前の観測以前なら+1マイクロ秒に補正）
    #[instrument(
        skip_all,
        fields(tracker_type = %tracker.kind(), subject_id = %tracker.subject_id())
    )]
    pub async fn track_at(
        &self,
        tracker: &dyn PriceTracker,
        now: DateTime<Utc>,
    ) -> Result<TrackOutcome, TrackError> {
        let current_price = tracker.fetch_current_price().await.map_err(|e| {
            warn!(error = %e, "価格取得失敗");
            TrackError::Fetch(e)
        })?;
        debug!(price = %current_price, "現在価格を取得");

        let last = self.load_last_observation(&tracker.subject_id()).await?;
        let decision = self
            .evaluate_and_store(tracker, current_price, last.as_ref(), now)
            .await?;
        let notification = self.notify(&decision).await;

        Ok(TrackOutcome {
            observation: decision.observation,
            change: decision.change,
            notification,
        })
    }

    /// 対象の直前の観測を読み込む（初回はNone）
    pub async fn load_last_observation(
        &self,
        subject_id: &str,
    ) -> Result<Option<PriceObservation>, TrackError> {
        self.repository
            .latest(subject_id)
            .await
            .map_err(TrackError::Load)
    }

    /// 変動を評価し、新しい観測を1件追記する
    ///
    /// 直前の観測が無い場合も保存する（通知はしない）。
    pub async fn evaluate_and_store(
        &self,
        tracker: &dyn PriceTracker,
        current_price: Decimal,
        last: Option<&PriceObservation>,
        now: DateTime<Utc>,
    ) -> Result<Decision, TrackError> {
        let change = evaluate(
            current_price,
            last.map(|o| o.price),
            tracker.notification_threshold(),
        );

        let observation = PriceObservation::new(
            tracker.subject_id(),
            next_timestamp(now, last.map(|o| &o.timestamp)),
            current_price,
            Some(tracker.metadata()),
        );
        self.repository
            .append(&observation)
            .await
            .map_err(TrackError::Store)?;

        info!(
            price = %current_price,
            previous_price = ?change.previous_price,
            change_ratio = ?change.change_ratio,
            notify = change.notify,
            "観測を保存"
        );

        Ok(Decision {
            display_name: tracker.display_name(),
            observation,
            change,
        })
    }

    /// 通知が必要な場合のみアラートを送信する
    ///
    /// 失敗は`NotificationStatus::Failed`として返し、エラーにはしない。
    pub async fn notify(&self, decision: &Decision) -> NotificationStatus {
        if !decision.change.notify {
            return NotificationStatus::NotRequired;
        }

        let alert = decision.alert();
        match self.notifier.notify(&alert).await {
            Ok(()) => {
                info!("価格変動を通知");
                NotificationStatus::Sent
            }
            Err(e) => {
                warn!(error = %e, "通知失敗（観測は保存済み）");
                NotificationStatus::Failed(e.to_string())
            }
        }
    }
}
