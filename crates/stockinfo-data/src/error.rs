//! 데이터 모듈 오류 타입.

use stockinfo_core::CoreError;
use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 잘못된 입력 (I/O 수행 전 거부)
    #[error("Validation error: {0}")]
    Validation(String),

    /// 모든 계층에서 엔티티를 찾을 수 없음
    #[error("Not found: {0}")]
    NotFound(String),

    /// 외부 데이터 소스 오류 (전송 실패, 타임아웃, 비정상 상태 코드, 해석 불가 응답)
    #[error("Upstream error from {provider}: {message}")]
    Upstream {
        provider: String,
        message: String,
        retryable: bool,
    },

    /// 저장소 읽기/쓰기 오류
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    Connection(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    Migration(String),

    /// 캐시 오류
    #[error("Cache error: {0}")]
    Cache(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DataError {
    /// 외부 소스 오류를 생성합니다.
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        DataError::Upstream {
            provider: provider.into(),
            message: message.into(),
            retryable: false,
        }
    }

    /// reqwest 오류를 외부 소스 오류로 변환합니다.
    pub fn from_http(provider: &str, err: reqwest::Error) -> Self {
        DataError::Upstream {
            provider: provider.to_string(),
            retryable: err.is_timeout() || err.is_connect(),
            message: err.to_string(),
        }
    }

    /// 재시도할 가치가 있는 오류인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Upstream { retryable, .. } => *retryable,
            DataError::Connection(_) => true,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DataError::Validation(_))
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                DataError::Connection(err.to_string())
            }
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) => DataError::Connection(err.to_string()),
            sqlx::Error::Database(db_err) => DataError::Persistence(db_err.message().to_string()),
            _ => DataError::Persistence(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DataError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DataError::Migration(err.to_string())
    }
}

impl From<redis::RedisError> for DataError {
    fn from(err: redis::RedisError) -> Self {
        DataError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Serialization(err.to_string())
    }
}

impl From<CoreError> for DataError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => DataError::Validation(msg),
            CoreError::Config(msg) => DataError::Config(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
