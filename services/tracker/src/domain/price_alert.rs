/// 価格変動アラート
///
/// 通知チャネルに送る内容。SNSにはJSON、ntfyにはテキストで送る。
use rust_decimal::Decimal;
use serde::Serialize;

/// SNSの件名の最大長
const MAX_SUBJECT_CHARS: usize = 100;

/// 閾値を超えた価格変動
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAlert {
    pub subject_id: String,
    pub display_name: String,
    pub old_price: Decimal,
    pub new_price: Decimal,
    /// 符号付き相対変化率（直前の価格が0の場合はNone）
    pub change_ratio: Option<Decimal>,
    pub timestamp: String,
}

impl PriceAlert {
    pub fn is_increase(&self) -> bool {
        self.new_price > self.old_price
    }

    /// 符号付き変化率（%、小数2桁）
    ///
    /// 変化率が無い場合と、%換算で桁あふれする場合はNone。
    pub fn change_percent(&self) -> Option<Decimal> {
        self.change_ratio
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|percent| percent.round_dp(2))
    }

    /// 通知の件名
    pub fn subject(&self) -> String {
        format!("Price Change: {}", self.display_name)
            .chars()
            .take(MAX_SUBJECT_CHARS)
            .collect()
    }

    /// 人が読む形式の通知本文
    pub fn render_text(&self) -> String {
        let direction = if self.is_increase() { "📈" } else { "📉" };
        let change = match self.change_percent() {
            Some(percent) => format!("{:+.2}%", percent),
            None => "n/a".to_string(),
        };

        format!(
            "{} {} Price Alert!\nPrevious: {:.2}\nCurrent: {:.2}\nChange: {}",
            direction,
            self.display_name,
            self.old_price.round_dp(2),
            self.new_price.round_dp(2),
            change
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn alert(old: Decimal, new: Decimal, ratio: Option<Decimal>) -> PriceAlert {
        PriceAlert {
            subject_id: "gold_doji".to_string(),
            display_name: "DOJI Gold Price (VND)".to_string(),
            old_price: old,
            new_price: new,
            change_ratio: ratio,
            timestamp: "2026-10-18T00:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn test_render_increase() {
        let text = alert(dec!(100), dec!(103), Some(dec!(0.03))).render_text();
        assert_eq!(
            text,
            "📈 DOJI Gold Price (VND) Price Alert!\nPrevious: 100.00\nCurrent: 103.00\nChange: +3.00%"
        );
    }

    #[test]
    fn test_render_uses_two_decimals() {
        // 変化率0.1は+10.00%、整数の価格も小数2桁で表示
        let text = alert(dec!(100), dec!(110), Some(dec!(0.1))).render_text();
        assert!(text.contains("Previous: 100.00\n"));
        assert!(text.contains("Current: 110.00\n"));
        assert!(text.ends_with("Change: +10.00%"));

        let text = alert(dec!(84500), dec!(84400), Some(dec!(-0.0012))).render_text();
        assert!(text.ends_with("Change: -0.12%"));
    }

    #[test]
    fn test_overflowing_ratio_renders_na() {
        let overflow = alert(dec!(0.0001), dec!(100000), Some(Decimal::MAX));
        assert_eq!(overflow.change_percent(), None);
        assert!(overflow.render_text().ends_with("Change: n/a"));
    }

    #[test]
    fn test_render_decrease() {
        let text = alert(dec!(84.5), dec!(80.276), Some(dec!(-0.05))).render_text();
        assert!(text.starts_with("📉"));
        assert!(text.contains("Current: 80.28"));
        assert!(text.ends_with("Change: -5.00%"));
    }

    #[test]
    fn test_render_without_ratio() {
        let text = alert(dec!(0), dec!(10), None).render_text();
        assert!(text.ends_with("Change: n/a"));
    }

    #[test]
    fn test_subject_is_truncated() {
        let mut long = alert(dec!(1), dec!(2), Some(dec!(1)));
        long.display_name = "x".repeat(200);
        assert_eq!(long.subject().chars().count(), 100);
        assert!(long.subject().starts_with("Price Change: "));
    }

    #[test]
    fn test_serialize_as_json_numbers() {
        let value = serde_json::to_value(alert(dec!(100), dec!(103), Some(dec!(0.03)))).unwrap();
        assert_eq!(value["subject_id"], "gold_doji");
        assert_eq!(value["old_price"], 100.0);
        assert_eq!(value["new_price"], 103.0);
        assert_eq!(value["change_ratio"], 0.03);
    }
}
