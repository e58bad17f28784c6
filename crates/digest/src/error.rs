//! サマリー生成処理全体で使うエラー型。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

/// HTTP 500 のレスポンス本文。内部の詳細はログにのみ出力する。
pub const GENERIC_ERROR_MESSAGE: &str = "Error processing and saving summary";

#[derive(Error, Debug)]
pub enum DigestError {
    /// `date` パラメータが YYYY-MM-DD として解釈できない
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// `date` パラメータが JST の今日より後
    #[error("Future date is not allowed: {0}")]
    FutureDate(chrono::NaiveDate),

    /// `day` パラメータが既知のキーワードではない
    #[error("Invalid day parameter: {0}")]
    InvalidDay(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Notion データベースに必要なプロパティが存在しない
    #[error("Store schema error: {0}")]
    StoreSchema(String),

    #[error("Failed to fetch activity logs")]
    LogFetch(#[source] anyhow::Error),

    #[error("Failed to write summary page")]
    StoreWrite(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DigestError>;

impl DigestError {
    /// 呼び出し元の入力に起因するエラーかどうか。
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DigestError::InvalidDate(_) | DigestError::FutureDate(_) | DigestError::InvalidDay(_)
        )
    }

    /// HTTP 境界で返すステータスコード。
    pub fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// HTTP 境界で返すメッセージ。サーバー側のエラーは詳細を伏せる。
    pub fn client_message(&self) -> &'static str {
        match self {
            DigestError::InvalidDate(_) => "Invalid date format",
            DigestError::FutureDate(_) => "Future date is not allowed",
            DigestError::InvalidDay(_) => "Invalid day parameter",
            _ => GENERIC_ERROR_MESSAGE,
        }
    }
}

impl IntoResponse for DigestError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            warn!(error = %self, "Rejected request");
        } else {
            error!(error = %error_chain(&self), "Error processing and saving summary");
        }
        (self.status(), self.client_message()).into_response()
    }
}

/// エラーとその原因を `: ` でつないだ文字列。
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
