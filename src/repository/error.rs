// ==========================================
// 培训机构门户后台 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 约束错误 =====
    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 数据质量错误 =====
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// rusqlite 错误 → 仓储层错误
///
/// 约束违反单独拆出：UNIQUE 命中是导入管道的重复键信号，
/// 必须与普通查询失败区分
pub(crate) fn map_sqlite_error(err: rusqlite::Error) -> RepositoryError {
    match &err {
        rusqlite::Error::SqliteFailure(ffi_err, msg)
            if ffi_err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            let detail = msg.clone().unwrap_or_else(|| err.to_string());
            if detail.contains("FOREIGN KEY") {
                RepositoryError::ForeignKeyViolation(detail)
            } else {
                RepositoryError::UniqueConstraintViolation(detail)
            }
        }
        _ => RepositoryError::DatabaseQueryError(err.to_string()),
    }
}
