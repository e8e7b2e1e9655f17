// ==========================================
// 培训机构门户后台 - 字段校验器
// ==========================================
// 职责: 对单条记录做必填字段 + 日期格式校验
// 约束: 纯函数、无 I/O；面对任意半结构化行永不 panic，
//       永远产出结果而不是中断调用方
// ==========================================

use crate::domain::certificate::{RawImportRow, FIELD_ISSUED_AT, REQUIRED_FIELDS};
use crate::importer::date_normalizer::normalize_date;
use chrono::{DateTime, Utc};

/// 校验一行记录
///
/// # 规则
/// - 一趟扫描列出**所有**缺失/空白的必填字段（不是只报第一个）
///   字段空白 = 缺列 / Empty / 按文本口径 TRIM 后为空
/// - 必填字段齐全时再校验 issuedAt 可归一化；
///   无法解析与缺失是两种不同的错误（后者回显原始值）
///
/// # 返回
/// - Ok(DateTime<Utc>): 校验通过，附带归一化后的签发日期
/// - Err(String): 操作员可读的失败原因
pub fn validate_row(row: &RawImportRow) -> Result<DateTime<Utc>, String> {
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .filter(|field| row.cell(field).is_blank())
        .copied()
        .collect();

    if !missing.is_empty() {
        return Err(format!("Missing required fields: {}", missing.join(", ")));
    }

    normalize_date(&row.cell(FIELD_ISSUED_AT)).map_err(|e| e.to_string())
}
