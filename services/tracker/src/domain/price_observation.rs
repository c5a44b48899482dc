/// 価格観測レコード
///
/// 価格履歴テーブルに追記される1件分の観測値。
/// `(subject_id, timestamp)`の組で一意になり、書き込み後は変更・削除されない。
use chrono::{DateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// トラッカー固有の付加情報（ショップID等）
pub type SourceMetadata = Map<String, Value>;

/// 1回の観測で記録された価格
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    /// 追跡対象ID（例: `gold_doji`, `shopee_123`）
    pub subject_id: String,
    /// 観測時刻（マイクロ秒精度、UTC）
    pub timestamp: DateTime<Utc>,
    /// 観測価格
    pub price: Decimal,
    /// トラッカー固有のメタデータ
    pub source_metadata: Option<SourceMetadata>,
}

impl PriceObservation {
    pub fn new(
        subject_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        price: Decimal,
        source_metadata: Option<SourceMetadata>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            timestamp,
            price,
            source_metadata,
        }
    }

    /// ソートキーとして保存するタイムスタンプ文字列
    pub fn timestamp_key(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// タイムスタンプを固定幅のISO-8601文字列に変換する
///
/// 常にマイクロ秒6桁と`Z`サフィックスを出力するため、
/// 文字列の辞書順と時系列順が一致する。
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// ISO-8601文字列をUTCのタイムスタンプとして解析する
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// 新しい観測に割り当てるタイムスタンプを決定する
///
/// 同一対象の直前の観測より厳密に後の時刻を返す。
/// 時計が進んでいない（または巻き戻った）場合は直前の時刻 + 1マイクロ秒を使う。
pub fn next_timestamp(now: DateTime<Utc>, last: Option<&DateTime<Utc>>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(6);
    match last {
        Some(last) if now <= *last => *last + TimeDelta::microseconds(1),
        _ => now,
    }
}
