//! 查詢端錯誤

use pab_core::ResolveError;
use thiserror::Error;

/// 建立查詢端失敗
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("無法建立 HTTP 客戶端: {0}")]
    Client(String),

    #[error("對照表讀取失敗: {0}")]
    Csv(#[from] csv::Error),

    #[error("對照表格式錯誤 (第 {line} 行): {message}")]
    InvalidRow { line: u64, message: String },
}

/// HTTP 錯誤轉為解析錯誤；逾時與連線失敗皆為暫時性失敗
pub(crate) fn transport(err: reqwest::Error) -> ResolveError {
    match err.status() {
        Some(status) if status == reqwest::StatusCode::NOT_FOUND => {
            ResolveError::NotFound(err.to_string())
        }
        _ if err.is_decode() => ResolveError::Malformed(err.to_string()),
        _ => ResolveError::Transport(err.to_string()),
    }
}
