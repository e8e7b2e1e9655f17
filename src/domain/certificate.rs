// ==========================================
// 培训机构门户后台 - 证书领域模型
// ==========================================
// 职责: 定义证书实体与导入管道的中间结构
// 红线: 不含数据访问逻辑,不含校验逻辑
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// 字段标识符（上传表头 / JSON 载荷共用）
// ==========================================
pub const FIELD_STUDENT_NAME: &str = "studentName";
pub const FIELD_COURSE_NAME: &str = "courseName";
pub const FIELD_DURATION: &str = "duration";
pub const FIELD_CERTIFICATE_NO: &str = "certificateNo";
pub const FIELD_FATHERS_NAME: &str = "fathersName";
pub const FIELD_INSTITUTE: &str = "institute";
pub const FIELD_REGISTRATION_NO: &str = "registrationNo";
pub const FIELD_ISSUED_AT: &str = "issuedAt";

/// 必填字段全集（顺序即错误消息中的报告顺序）
pub const REQUIRED_FIELDS: [&str; 8] = [
    FIELD_STUDENT_NAME,
    FIELD_COURSE_NAME,
    FIELD_DURATION,
    FIELD_CERTIFICATE_NO,
    FIELD_FATHERS_NAME,
    FIELD_INSTITUTE,
    FIELD_REGISTRATION_NO,
    FIELD_ISSUED_AT,
];

// ==========================================
// CertificateRecord - 已签发证书（持久化实体）
// ==========================================
// 用途: 导入层/API 层写入，核验页只读
// 约束: certificate_no / registration_no 全局唯一（UNIQUE 列兜底）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    pub id: i64,                      // 存储层自增主键
    pub student_name: String,         // 学员姓名
    pub course_name: String,          // 课程名称
    pub duration: String,             // 学制（自由文本，如 "6 Months"）
    pub certificate_no: String,       // 证书编号（唯一键①）
    pub fathers_name: String,         // 父亲姓名
    pub institute: String,            // 发证机构
    pub registration_no: String,      // 注册编号（唯一键②）
    pub issued_at: DateTime<Utc>,     // 签发日期（当日 UTC 零点）
    pub created_at: DateTime<Utc>,    // 记录创建时间
    pub updated_at: DateTime<Utc>,    // 记录更新时间
}

// ==========================================
// NewCertificate - 已归一化的候选记录
// ==========================================
// 用途: 行处理器输出 / 批量写入器输入
// 约束: 仅能由字段校验 + 日期归一化产出，文本均已 TRIM
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCertificate {
    pub student_name: String,
    pub course_name: String,
    pub duration: String,
    pub certificate_no: String,
    pub fathers_name: String,
    pub institute: String,
    pub registration_no: String,
    pub issued_at: DateTime<Utc>,
}

// ==========================================
// CellValue - 上传单元格的未定型值
// ==========================================
// 上传边界处行没有固定形状：同一列可能是文本、数字或
// 电子表格日期序列号。所有消费方必须先经字段校验 /
// 日期归一化，才能把值当作定型数据使用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// 按文本口径取值（TRIM 后），空白视为 None
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => Some(format_cell_number(*n)),
            CellValue::Empty => None,
        }
    }

    /// 字段是否为空白（缺失 / Empty / 纯空白文本）
    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }

    /// 诊断展示用的原始值（保留原貌，供错误消息回显）
    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_cell_number(*n),
            CellValue::Empty => String::new(),
        }
    }
}

/// 数字单元格转文本：整数不带小数点（证书编号常被解析为数字）
fn format_cell_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ==========================================
// RawImportRow - 上传文件中的一行（未校验）
// ==========================================
// 生命周期: 仅存在于一次导入请求内，不落库
#[derive(Debug, Clone)]
pub struct RawImportRow {
    /// 电子表格展示行号：数据行 i（0 起）报告为 i + 2，
    /// 与操作员在表格软件里看到的行号一致（第 1 行是表头）
    pub row_number: usize,
    pub cells: HashMap<String, CellValue>,
}

impl RawImportRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            cells: HashMap::new(),
        }
    }

    /// 取指定字段单元格，缺列等价于空白
    pub fn cell(&self, field: &str) -> CellValue {
        self.cells.get(field).cloned().unwrap_or(CellValue::Empty)
    }
}

// ==========================================
// ImportOutcome - 单次批量导入的结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    /// 本次导入批次 ID（审计用）
    pub batch_id: String,
    /// 成功创建的证书（落库后按唯一键回读）
    pub created: Vec<CertificateRecord>,
    /// 逐行错误明细（完整列表，不截断）
    pub errors: Vec<String>,
    /// 尝试导入的数据行数
    pub attempted: usize,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

// ==========================================
// CertificateInput - 单条创建/编辑的 JSON 载荷
// ==========================================
// issued_at 保持原始文本，统一走导入管道的校验与归一化
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInput {
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub certificate_no: String,
    #[serde(default)]
    pub fathers_name: String,
    #[serde(default)]
    pub institute: String,
    #[serde(default)]
    pub registration_no: String,
    #[serde(default)]
    pub issued_at: String,
}

impl CertificateInput {
    /// 转为未校验行，复用批量管道的字段校验/日期归一化
    ///
    /// 单条路径没有表头行，行号固定为 1
    pub fn into_raw_row(self) -> RawImportRow {
        fn cell(value: String) -> CellValue {
            if value.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(value)
            }
        }

        let mut row = RawImportRow::new(1);
        row.cells
            .insert(FIELD_STUDENT_NAME.to_string(), cell(self.student_name));
        row.cells
            .insert(FIELD_COURSE_NAME.to_string(), cell(self.course_name));
        row.cells
            .insert(FIELD_DURATION.to_string(), cell(self.duration));
        row.cells
            .insert(FIELD_CERTIFICATE_NO.to_string(), cell(self.certificate_no));
        row.cells
            .insert(FIELD_FATHERS_NAME.to_string(), cell(self.fathers_name));
        row.cells
            .insert(FIELD_INSTITUTE.to_string(), cell(self.institute));
        row.cells.insert(
            FIELD_REGISTRATION_NO.to_string(),
            cell(self.registration_no),
        );
        row.cells
            .insert(FIELD_ISSUED_AT.to_string(), cell(self.issued_at));
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_blank_detection() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text("   ".to_string()).is_blank());
        assert!(!CellValue::Text(" CERT-1 ".to_string()).is_blank());
        assert!(!CellValue::Number(45474.0).is_blank());
    }

    #[test]
    fn test_cell_value_number_as_text() {
        // 整数编号不应带小数点
        assert_eq!(
            CellValue::Number(20240001.0).as_text(),
            Some("20240001".to_string())
        );
    }

    #[test]
    fn test_missing_column_is_blank() {
        let row = RawImportRow::new(2);
        assert!(row.cell(FIELD_CERTIFICATE_NO).is_blank());
    }
}
