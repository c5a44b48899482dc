//! SNS通知モジュール
//!
//! 価格変動アラートをJSONメッセージとしてSNSトピックに発行する。

use async_trait::async_trait;
use aws_sdk_sns::Client as SnsClient;
use tracing::{info, warn};

use super::notifier::{NotifyError, Notifier};
use crate::domain::PriceAlert;

/// SNSトピックへ発行する通知実装
pub struct SnsNotifier {
    client: SnsClient,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn new(client: SnsClient, topic_arn: String) -> Self {
        Self { client, topic_arn }
    }

    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }
}

/// SNSに発行するメッセージ本文（JSON）を組み立てる
pub fn alert_message(alert: &PriceAlert) -> Result<String, NotifyError> {
    serde_json::to_string(alert).map_err(|e| NotifyError::Serialize(e.to_string()))
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn notify(&self, alert: &PriceAlert) -> Result<(), NotifyError> {
        let message = alert_message(alert)?;

        info!(
            topic_arn = %self.topic_arn,
            subject_id = %alert.subject_id,
            message_length = message.len(),
            "SNSメッセージ発行開始"
        );

        let result = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(alert.subject())
            .message(message)
            .send()
            .await;

        match result {
            Ok(response) => {
                info!(
                    topic_arn = %self.topic_arn,
                    message_id = response.message_id().unwrap_or("unknown"),
                    "SNS Publish成功"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    topic_arn = %self.topic_arn,
                    error = %err,
                    "SNS Publishエラー"
                );
                Err(NotifyError::Publish(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    #[test]
    fn test_alert_message_is_json() {
        let alert = PriceAlert {
            subject_id: "shopee_40004315413".to_string(),
            display_name: "Tai nghe".to_string(),
            old_price: dec!(100),
            new_price: dec!(95),
            change_ratio: Some(dec!(-0.05)),
            timestamp: "2024-05-01T00:00:00.000000Z".to_string(),
        };

        let message = alert_message(&alert).unwrap();
        let value: Value = serde_json::from_str(&message).unwrap();

        assert_eq!(value["subject_id"], "shopee_40004315413");
        assert_eq!(value["new_price"], 95.0);
        assert_eq!(value["change_ratio"], -0.05);
        assert_eq!(value["timestamp"], "2024-05-01T00:00:00.000000Z");
    }
}
