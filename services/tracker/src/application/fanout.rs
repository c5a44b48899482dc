/// ファンアウトサービス
///
/// 追跡中の商品ごとに1件、加えて金価格を1件、追跡ジョブをキューへ投入する。
/// ジョブはワーカーLambdaがディスパッチャー経由で処理する。
use serde_json::{Value, json};
use tracing::{info, warn};

use super::catalog::{CatalogError, CatalogService};
use crate::domain::TrackerKind;
use crate::infrastructure::{JobQueue, ProductRepository};

/// ファンアウトの結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub enqueued: usize,
    pub failed: usize,
}

impl FanoutReport {
    pub fn to_response(&self) -> Value {
        json!({
            "statusCode": 200,
            "enqueued": self.enqueued,
            "failed": self.failed,
        })
    }
}

pub struct FanoutService<P, Q>
where
    P: ProductRepository,
    Q: JobQueue,
{
    catalog: CatalogService<P>,
    queue: Q,
}

impl<P, Q> FanoutService<P, Q>
where
    P: ProductRepository,
    Q: JobQueue,
{
    pub fn new(catalog: CatalogService<P>, queue: Q) -> Self {
        Self { catalog, queue }
    }

    /// 全ジョブを投入する
    ///
    /// 1件の投入失敗では中断せず、件数を数えて続行する。
    /// カタログの読み込みに失敗した場合のみエラーを返す。
    pub async fn run(&self) -> Result<FanoutReport, CatalogError> {
        let mut jobs = self.catalog.tracking_payloads().await?;
        jobs.push(json!({ "tracker_type": TrackerKind::Gold.as_str() }));

        let mut report = FanoutReport::default();
        for job in &jobs {
            match self.queue.enqueue(job).await {
                Ok(()) => report.enqueued += 1,
                Err(err) => {
                    warn!(error = %err, tracker_type = %job["tracker_type"], "ジョブ投入失敗");
                    report.failed += 1;
                }
            }
        }

        info!(
            enqueued = report.enqueued,
            failed = report.failed,
            "ファンアウト完了"
        );
        Ok(report)
    }
}
