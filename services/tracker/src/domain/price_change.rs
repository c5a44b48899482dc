/// 価格変動の評価
///
/// 直前の価格と現在価格から相対変化率を求め、通知閾値と比較する。
use rust_decimal::Decimal;

/// 価格変動の評価結果
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChange {
    /// 直前の観測価格（初回はNone）
    pub previous_price: Option<Decimal>,
    /// 現在価格
    pub current_price: Decimal,
    /// 符号付き相対変化率 `(current - previous) / previous`
    ///
    /// 直前の価格が無い場合、または0の場合はNone。
    pub change_ratio: Option<Decimal>,
    /// 通知が必要かどうか
    pub notify: bool,
}

impl PriceChange {
    /// 価格が変化したかどうか
    pub fn price_changed(&self) -> bool {
        self.previous_price
            .is_some_and(|previous| previous != self.current_price)
    }
}

/// 現在価格を直前の価格と比較する
///
/// `|current - previous| / previous >= threshold`のとき通知対象とする。
/// 直前の価格が無い初回観測は通知しない。
/// 直前の価格が0の場合は変化率を定義できないため、価格が動いたときのみ通知する。
pub fn evaluate(current_price: Decimal, previous_price: Option<Decimal>, threshold: Decimal) -> PriceChange {
    let Some(previous) = previous_price else {
        return PriceChange {
            previous_price: None,
            current_price,
            change_ratio: None,
            notify: false,
        };
    };

    let change_ratio = (current_price - previous).checked_div(previous);
    let notify = match change_ratio {
        Some(ratio) => ratio.abs() >= threshold,
        None => current_price != previous,
    };

    PriceChange {
        previous_price: Some(previous),
        current_price,
        change_ratio,
        notify,
    }
}
