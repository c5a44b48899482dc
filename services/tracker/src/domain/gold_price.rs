/// 金価格の解析
///
/// 取得元は2系統:
/// - JSON API: `sell_price`フィールド
/// - 価格ページHTML: `.gold-price .sell-price`要素のテキスト（1000倍表記）
use std::str::FromStr;

use rust_decimal::Decimal;
use scraper::{Html, Selector};
use serde_json::Value;

/// 価格ページ上の売値要素のセレクタ
pub const SELL_PRICE_SELECTOR: &str = ".gold-price .sell-price";

/// 価格ページの表記は1000倍
const PAGE_PRICE_SCALE: i64 = 1_000;

/// JSON APIレスポンスから売値を取り出す
///
/// `sell_price`が数値または数値文字列で、正の値のときのみ返す。
pub fn parse_api_sell_price(body: &Value) -> Option<Decimal> {
    let price = match body.get("sell_price")? {
        Value::Number(number) => Decimal::from_str(&number.to_string()).ok()?,
        Value::String(text) => Decimal::from_str(text.trim()).ok()?,
        _ => return None,
    };

    (price > Decimal::ZERO).then_some(price)
}

/// 価格ページHTMLから売値を取り出す
pub fn parse_page_sell_price(html: &str) -> Option<Decimal> {
    let selector = Selector::parse(SELL_PRICE_SELECTOR).ok()?;
    let document = Html::parse_document(html);
    let element = document.select(&selector).next()?;
    let text: String = element.text().collect();

    parse_price_text(&text)
}

/// 表示用の価格テキストを数値化する
///
/// 区切り文字（`,` `.`）や単位を除いた数字列を1000で割る。
/// 例: `"74.500"` → `74.5`
pub fn parse_price_text(text: &str) -> Option<Decimal> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let raw = Decimal::from_str(&digits).ok()?;
    if raw.is_zero() {
        return None;
    }

    Some(raw / Decimal::from(PAGE_PRICE_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_api_price_number() {
        assert_eq!(
            parse_api_sell_price(&json!({"sell_price": 8450000})),
            Some(dec!(8450000))
        );
        assert_eq!(
            parse_api_sell_price(&json!({"sell_price": 84.5})),
            Some(dec!(84.5))
        );
    }

    #[test]
    fn test_api_price_string() {
        assert_eq!(
            parse_api_sell_price(&json!({"sell_price": " 8450000 "})),
            Some(dec!(8450000))
        );
    }

    #[test]
    fn test_api_price_missing_or_zero() {
        assert_eq!(parse_api_sell_price(&json!({})), None);
        assert_eq!(parse_api_sell_price(&json!({"sell_price": 0})), None);
        assert_eq!(parse_api_sell_price(&json!({"sell_price": null})), None);
        assert_eq!(parse_api_sell_price(&json!({"sell_price": "n/a"})), None);
    }

    #[test]
    fn test_price_text() {
        assert_eq!(parse_price_text("74.500"), Some(dec!(74.5)));
        assert_eq!(parse_price_text("84,500,000 VND"), Some(dec!(84500)));
        assert_eq!(parse_price_text("liên hệ"), None);
        assert_eq!(parse_price_text("0"), None);
    }

    #[test]
    fn test_page_price() {
        let html = r#"
            <html><body>
              <div class="gold-price">
                <span class="buy-price">83,000,000</span>
                <span class="sell-price">
                  85,<b>000</b>,000
                </span>
              </div>
            </body></html>
        "#;

        assert_eq!(parse_page_sell_price(html), Some(dec!(85000)));
    }

    #[test]
    fn test_page_without_price_element() {
        let html = "<html><body><div class=\"sell-price\">1</div></body></html>";
        assert_eq!(parse_page_sell_price(html), None);
    }
}
