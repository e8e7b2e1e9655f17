// ==========================================
// 培训机构门户后台 - API层错误类型
// ==========================================
// 职责: 转换 Importer / Repository 错误为对外错误消息
// 注意: Display 文本即对外响应里的 error 字段，调整措辞会破坏前端契约
// ==========================================

use crate::api::auth::AuthError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 鉴权错误
    // ==========================================
    #[error("{0}")]
    Unauthorized(String),

    // ==========================================
    // 业务错误
    // ==========================================
    #[error("{0}")]
    ValidationError(String),

    /// 唯一键冲突（证书编号 / 注册编号）
    #[error("Certificate number or registration number already exists")]
    DuplicateKey,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PersistenceFailure(String),

    // ==========================================
    // 通用错误
    // ==========================================
    /// 内部错误：对外隐藏细节，细节只进日志
    #[error("Internal server error")]
    InternalError(String),
}

impl ApiError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthorized(_) => 401,
            ApiError::ValidationError(_)
            | ApiError::DuplicateKey
            | ApiError::PersistenceFailure(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::InternalError(_) => 500,
        }
    }

    /// 响应体（{"error": "..."}）
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::InvalidRecords { .. }
            | ImportError::ValidationFailed(_)
            | ImportError::NoValidRecords
            | ImportError::DuplicateEntries { .. } => ApiError::ValidationError(err.to_string()),
            ImportError::DuplicateKey => ApiError::DuplicateKey,
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::FileReadError(_)
            | ImportError::SpreadsheetParseError(_)
            | ImportError::CsvParseError(_) => ApiError::ValidationError(err.to_string()),
            e @ ImportError::PersistenceFailure(_) => ApiError::PersistenceFailure(e.to_string()),
            ImportError::Other(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, .. } => match entity.as_str() {
                "certificate" => ApiError::NotFound("Certificate not found".to_string()),
                "course" => ApiError::NotFound("Course not found".to_string()),
                _ => ApiError::NotFound(format!("{} not found", entity)),
            },
            RepositoryError::UniqueConstraintViolation(_) => ApiError::DuplicateKey,
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

// ==========================================
// 从 AuthError 转换
// ==========================================
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
