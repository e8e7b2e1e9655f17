// ==========================================
// 培训机构门户后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 面向用户的错误文案为英文（前端直接展示，不暴露内部细节）
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 操作员错误预览上限：超过则截断为前 5 条 + "...and more"
/// （完整列表始终保留在 `InvalidRecords::errors` 中）
pub const ERROR_PREVIEW_LIMIT: usize = 5;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0} (only .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("Failed to read file: {0}")]
    FileReadError(String),

    #[error("Failed to parse spreadsheet: {0}")]
    SpreadsheetParseError(String),

    #[error("Failed to parse CSV: {0}")]
    CsvParseError(String),

    // ===== 校验错误（批量路径，逐行） =====
    /// 携带完整逐行错误列表；Display 只预览前 ERROR_PREVIEW_LIMIT 条
    #[error("{}", preview_errors(.errors))]
    InvalidRecords { errors: Vec<String> },

    /// 单条路径的校验错误（无行号前缀）
    #[error("{0}")]
    ValidationFailed(String),

    /// 上传没有任何有效数据行
    #[error("No valid records provided")]
    NoValidRecords,

    // ===== 重复键错误（批量级，整批中止） =====
    #[error("Duplicate entries found: {}", identifiers.join(", "))]
    DuplicateEntries { identifiers: Vec<String> },

    /// 单条路径 / 约束兜底命中的重复键
    #[error("Certificate number or registration number already exists")]
    DuplicateKey,

    // ===== 持久化错误 =====
    /// 校验与查重都通过后存储层仍拒绝写入（瞬时故障等），不重试
    #[error("Failed to persist certificate records")]
    PersistenceFailure(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 组装操作员可见的校验错误消息（多行，截断到前 5 条）
fn preview_errors(errors: &[String]) -> String {
    let preview: Vec<&str> = errors
        .iter()
        .take(ERROR_PREVIEW_LIMIT)
        .map(String::as_str)
        .collect();
    let suffix = if errors.len() > ERROR_PREVIEW_LIMIT {
        "\n...and more"
    } else {
        ""
    };
    format!("Invalid records:\n{}{}", preview.join("\n"), suffix)
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::SpreadsheetParseError(err.to_string())
    }
}

// 实现 From<RepositoryError>
//
// 约束违反折算为重复键错误：存在性预查只是优化，
// UNIQUE 约束才是正确性机制，两条路径对调用方呈现同一种错误
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UniqueConstraintViolation(_) => ImportError::DuplicateKey,
            other => ImportError::PersistenceFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_keeps_short_lists_untruncated() {
        let err = ImportError::InvalidRecords {
            errors: vec![
                "Row 2: Missing required fields: certificateNo".to_string(),
                "Row 5: Missing required fields: studentName".to_string(),
            ],
        };
        let msg = err.to_string();
        assert_eq!(
            msg,
            "Invalid records:\nRow 2: Missing required fields: certificateNo\n\
             Row 5: Missing required fields: studentName"
        );
    }

    #[test]
    fn test_preview_truncates_after_five() {
        let errors: Vec<String> = (2..=9)
            .map(|n| format!("Row {}: Missing required fields: duration", n))
            .collect();
        let err = ImportError::InvalidRecords {
            errors: errors.clone(),
        };
        let msg = err.to_string();
        assert!(msg.ends_with("...and more"));
        assert!(msg.contains("Row 6:"));
        assert!(!msg.contains("Row 7:"));
        // 完整列表不受展示截断影响
        if let ImportError::InvalidRecords { errors } = err {
            assert_eq!(errors.len(), 8);
        }
    }

    #[test]
    fn test_constraint_violation_maps_to_duplicate_key() {
        let repo_err = RepositoryError::UniqueConstraintViolation(
            "UNIQUE constraint failed: certificate.certificate_no".to_string(),
        );
        let err = ImportError::from(repo_err);
        assert!(matches!(err, ImportError::DuplicateKey));
        assert_eq!(
            err.to_string(),
            "Certificate number or registration number already exists"
        );
    }

    #[test]
    fn test_duplicate_entries_message() {
        let err = ImportError::DuplicateEntries {
            identifiers: vec!["CERT-1".to_string(), "REG-9".to_string()],
        };
        assert_eq!(err.to_string(), "Duplicate entries found: CERT-1, REG-9");
    }
}
