/// DynamoDBで価格履歴を管理する観測リポジトリ
///
/// テーブル構成:
/// - パーティションキー: `subject_id`（S）
/// - ソートキー: `timestamp`（S、固定幅ISO-8601）
/// - 属性: `price`（N）、`metadata`（M、任意）
use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::types::AttributeValue;
use rust_decimal::Decimal;
use serde_dynamo::aws_sdk_dynamodb_1::{from_attribute_value, to_attribute_value};
use thiserror::Error;
use tracing::debug;

use crate::domain::price_observation::{PriceObservation, SourceMetadata, parse_timestamp};

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// DynamoDBへの書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// DynamoDBからの読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),

    /// 同じ`(subject_id, timestamp)`の観測が既に存在する
    #[error("Duplicate observation: {subject_id} at {timestamp}")]
    DuplicateObservation { subject_id: String, timestamp: String },

    /// データのシリアライズ/デシリアライズに失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 価格履歴の永続化トレイト
///
/// 観測は追記のみで、更新・削除の操作は持たない。
#[async_trait]
pub trait ObservationRepository: Send + Sync {
    /// 対象の最新の観測を取得する
    ///
    /// # 戻り値
    /// * 見つかった場合は`Ok(Some(PriceObservation))`
    /// * 初回（履歴なし）は`Ok(None)`
    async fn latest(&self, subject_id: &str) -> Result<Option<PriceObservation>, RepositoryError>;

    /// 観測を1件追記する
    ///
    /// 同じキーの観測が既に存在する場合は`DuplicateObservation`を返し、上書きしない。
    async fn append(&self, observation: &PriceObservation) -> Result<(), RepositoryError>;
}

/// ObservationRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoObservationRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoObservationRepository {
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// 観測をDynamoDBアイテムに変換
    fn to_item(
        observation: &PriceObservation,
    ) -> Result<HashMap<String, AttributeValue>, RepositoryError> {
        let mut item = HashMap::new();
        item.insert(
            "subject_id".to_string(),
            AttributeValue::S(observation.subject_id.clone()),
        );
        item.insert(
            "timestamp".to_string(),
            AttributeValue::S(observation.timestamp_key()),
        );
        item.insert(
            "price".to_string(),
            AttributeValue::N(observation.price.to_string()),
        );

        if let Some(metadata) = &observation.source_metadata {
            let value = to_attribute_value(metadata)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
            item.insert("metadata".to_string(), value);
        }

        Ok(item)
    }

    /// DynamoDBアイテムを観測に変換
    fn from_item(item: &HashMap<String, AttributeValue>) -> Result<PriceObservation, RepositoryError> {
        let missing = |field: &str| RepositoryError::SerializationError(format!("Missing {} field", field));

        let subject_id = item
            .get("subject_id")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| missing("subject_id"))?
            .clone();

        let timestamp = item
            .get("timestamp")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| missing("timestamp"))?;
        let timestamp = parse_timestamp(timestamp)
            .map_err(|e| RepositoryError::SerializationError(format!("Invalid timestamp: {}", e)))?;

        let price = item
            .get("price")
            .and_then(|v| v.as_n().ok())
            .ok_or_else(|| missing("price"))?;
        let price = Decimal::from_str(price)
            .map_err(|e| RepositoryError::SerializationError(format!("Invalid price: {}", e)))?;

        let source_metadata = match item.get("metadata") {
            Some(value) => {
                let metadata: SourceMetadata = from_attribute_value(value.clone())
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
                Some(metadata)
            }
            None => None,
        };

        Ok(PriceObservation {
            subject_id,
            timestamp,
            price,
            source_metadata,
        })
    }
}

#[async_trait]
impl ObservationRepository for DynamoObservationRepository {
    async fn latest(&self, subject_id: &str) -> Result<Option<PriceObservation>, RepositoryError> {
        // ソートキー降順で先頭1件のみ取得
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("subject_id = :sid")
            .expression_attribute_values(":sid", AttributeValue::S(subject_id.to_string()))
            .scan_index_forward(false)
            .limit(1)
            .send()
            .await
            .map_err(|e| RepositoryError::ReadError(e.to_string()))?;

        match result.items.as_deref().and_then(|items| items.first()) {
            Some(item) => Self::from_item(item).map(Some),
            None => Ok(None),
        }
    }

    async fn append(&self, observation: &PriceObservation) -> Result<(), RepositoryError> {
        let item = Self::to_item(observation)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(subject_id)")
            .send()
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception());
                if duplicate {
                    RepositoryError::DuplicateObservation {
                        subject_id: observation.subject_id.clone(),
                        timestamp: observation.timestamp_key(),
                    }
                } else {
                    RepositoryError::WriteError(e.to_string())
                }
            })?;

        debug!(
            subject_id = %observation.subject_id,
            timestamp = %observation.timestamp_key(),
            "観測を追記"
        );

        Ok(())
    }
}
