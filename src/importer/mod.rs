// ==========================================
// 培训机构门户后台 - 导入层
// ==========================================
// 职责: 批量证书导入管道（解析 → 校验 → 查重 → 落库）
// 支持: Excel (.xlsx/.xls) / CSV / JSON 批量载荷
// ==========================================

// 模块声明
pub mod certificate_importer;
pub mod date_normalizer;
pub mod duplicate_checker;
pub mod error;
pub mod field_validator;
pub mod file_parser;
pub mod row_processor;

// 重导出核心类型
pub use certificate_importer::{CertificateImporter, ImportStage};
pub use date_normalizer::{normalize_date, to_display_date, InvalidDate};
pub use duplicate_checker::{partition_against_store, DuplicatePartition};
pub use error::{ImportError, ERROR_PREVIEW_LIMIT};
pub use field_validator::validate_row;
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use row_processor::{process_rows, RowOutcome};
