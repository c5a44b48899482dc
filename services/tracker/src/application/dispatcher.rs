/// ディスパッチャー
///
/// 呼び出しペイロードの`tracker_type`でトラッカーを選び、追跡処理を実行する。
/// 結果は`{"statusCode": ..}`形式のJSONで返す。
use std::sync::Arc;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info, warn};

use super::price_tracking::{PriceTrackingService, TrackError, TrackOutcome};
use super::tracker::{GoldTracker, PriceTracker, ShopeeTracker};
use crate::domain::{RequestError, TrackerRequest};
use crate::infrastructure::{GoldPriceClient, Notifier, ObservationRepository, ShopeeClient};

/// ディスパッチのエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Unknown tracker type: {0}")]
    UnknownTrackerType(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Track(#[from] TrackError),
}

impl From<RequestError> for DispatchError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::UnknownTrackerType(kind) => DispatchError::UnknownTrackerType(kind),
            RequestError::InvalidPayload(reason) => DispatchError::InvalidPayload(reason),
        }
    }
}

impl DispatchError {
    /// レスポンスに使うHTTPステータスコード
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::UnknownTrackerType(_) | DispatchError::InvalidPayload(_) => 400,
            DispatchError::Track(err) => err.status_code(),
        }
    }

    /// 再実行で成功しうるエラーかどうか
    ///
    /// ペイロード自体の誤りは何度実行しても失敗する。
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::Track(_))
    }

    pub fn to_response(&self) -> Value {
        json!({
            "statusCode": self.status_code(),
            "error": self.to_string(),
        })
    }
}

/// トラッカー種別ごとに処理を振り分けるディスパッチャー
pub struct Dispatcher<R, N>
where
    R: ObservationRepository,
    N: Notifier,
{
    tracking: PriceTrackingService<R, N>,
    gold_client: Arc<dyn GoldPriceClient>,
    shopee_client: Arc<dyn ShopeeClient>,
}

impl<R, N> Dispatcher<R, N>
where
    R: ObservationRepository,
    N: Notifier,
{
    pub fn new(
        tracking: PriceTrackingService<R, N>,
        gold_client: Arc<dyn GoldPriceClient>,
        shopee_client: Arc<dyn ShopeeClient>,
    ) -> Self {
        Self {
            tracking,
            gold_client,
            shopee_client,
        }
    }

    /// 解析済みリクエストに対応するトラッカーを生成する
    pub fn tracker_for(&self, request: TrackerRequest) -> Box<dyn PriceTracker> {
        match request {
            TrackerRequest::Gold(request) => {
                Box::new(GoldTracker::new(request, Arc::clone(&self.gold_client)))
            }
            TrackerRequest::Shopee(request) => {
                Box::new(ShopeeTracker::new(request, Arc::clone(&self.shopee_client)))
            }
        }
    }

    /// ペイロードを解析し、対応するトラッカーで追跡処理を実行する
    ///
    /// # 戻り値
    /// * `Ok(TrackOutcome)` - 観測を保存した（通知失敗を含む）
    /// * `Err(DispatchError)` - 未知の種別、不正なペイロード、取得/読み込み/保存の失敗
    pub async fn dispatch(&self, payload: &Value) -> Result<TrackOutcome, DispatchError> {
        let request = TrackerRequest::parse(payload)?;
        let tracker = self.tracker_for(request);
        Ok(self.tracking.track(tracker.as_ref()).await?)
    }

    /// ペイロードを処理してレスポンスJSONを返す（エラーもレスポンスに変換）
    pub async fn handle(&self, payload: &Value) -> Value {
        match self.dispatch(payload).await {
            Ok(outcome) => outcome.to_response(),
            Err(err) => {
                if err.is_retryable() {
                    error!(error = %err, "追跡処理失敗");
                } else {
                    warn!(error = %err, "不正なリクエスト");
                }
                err.to_response()
            }
        }
    }

    /// 複数のペイロードを順に処理する（1件の失敗で中断しない）
    pub async fn handle_all(&self, payloads: &[Value]) -> Vec<Value> {
        let mut results = Vec::with_capacity(payloads.len());
        for payload in payloads {
            results.push(self.handle(payload).await);
        }

        let failed = results.iter().filter(|r| r["statusCode"] != 200).count();
        info!(total = results.len(), failed = failed, "一括追跡処理完了");

        results
    }
}
