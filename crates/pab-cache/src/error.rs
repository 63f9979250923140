//! 快取錯誤類型

use thiserror::Error;

/// 快取錯誤
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("資料庫查詢失敗: {0}")]
    Query(String),

    #[error("資料庫鎖獲取失敗: {0}")]
    Lock(String),

    #[error("快取資料損毀 ({field}): {message}")]
    Corrupt { field: String, message: String },

    #[error("無法建立工作池: {0}")]
    Pool(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => CacheError::Query(msg),
            other => CacheError::Query(other.to_string()),
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for CacheError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        CacheError::Pool(err.to_string())
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
