// 価格取得用HTTPクライアントの共通部分
//
// 取得層では再試行しない。失敗はFetchErrorとして呼び出し元に返し、
// 次回のスケジュール実行に任せる。

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

/// リクエストタイムアウト（秒）
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// 接続タイムアウト（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

/// ブラウザ相当のUser-Agent
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 外部価格ソースからの取得エラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    /// 接続失敗、タイムアウト等
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// 2xx以外のHTTPステータス
    #[error("HTTPエラー: status={status}, message={message}")]
    Status { status: u16, message: String },

    /// 取得元APIがエラーを返した
    #[error("APIエラー: {0}")]
    Api(String),

    /// レスポンスを解釈できない
    #[error("レスポンス解析エラー: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// 価格取得用のHTTPクライアントを構築する
pub fn build_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
}

/// レスポンスステータスを検査し、失敗時は本文の先頭を含めたエラーにする
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(FetchError::Status {
        status: status.as_u16(),
        message: truncate(&body, 200),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
