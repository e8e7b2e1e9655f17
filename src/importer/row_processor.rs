// ==========================================
// 培训机构门户后台 - 行处理器
// ==========================================
// 职责: 对批量上传的每一行独立执行 字段校验 + 日期归一化，
//       逐行累积错误而不中断整批
// 约定: 错误消息中的行号为电子表格展示行号（含表头偏移，
//       数据行 1 报告为 Row 2），与操作员看到的表格一致
// ==========================================

use crate::domain::certificate::{
    NewCertificate, RawImportRow, FIELD_CERTIFICATE_NO, FIELD_COURSE_NAME, FIELD_DURATION,
    FIELD_FATHERS_NAME, FIELD_INSTITUTE, FIELD_REGISTRATION_NO, FIELD_STUDENT_NAME,
};
use crate::importer::field_validator::validate_row;
use tracing::debug;

/// 行处理结果
#[derive(Debug, Clone)]
pub struct RowOutcome {
    /// 校验通过并完成归一化的候选记录（保持原始顺序）
    pub valid: Vec<NewCertificate>,
    /// 完整的逐行错误列表（`Row <n>: <reason>`，不截断）
    pub errors: Vec<String>,
    /// 尝试处理的数据行数
    pub attempted: usize,
}

/// 处理一次上传的全部数据行
///
/// 每行独立处理：无效行记入错误列表并跳出后续处理，
/// 不影响同批其他行；有效行产出文本已 TRIM、
/// issuedAt 已归一化的 NewCertificate
pub fn process_rows(rows: &[RawImportRow]) -> RowOutcome {
    let mut valid = Vec::new();
    let mut errors = Vec::new();

    for row in rows {
        match validate_row(row) {
            Ok(issued_at) => {
                valid.push(build_certificate(row, issued_at));
            }
            Err(reason) => {
                debug!(row = row.row_number, %reason, "行校验失败");
                errors.push(format!("Row {}: {}", row.row_number, reason));
            }
        }
    }

    RowOutcome {
        valid,
        errors,
        attempted: rows.len(),
    }
}

/// 由已校验的行构造候选记录
///
/// 校验已保证各字段非空白；这里用 unwrap_or_default 兜底
/// 而不是 panic，保持处理器"永不中断调用方"的红线
fn build_certificate(
    row: &RawImportRow,
    issued_at: chrono::DateTime<chrono::Utc>,
) -> NewCertificate {
    let text = |field: &str| row.cell(field).as_text().unwrap_or_default();

    NewCertificate {
        student_name: text(FIELD_STUDENT_NAME),
        course_name: text(FIELD_COURSE_NAME),
        duration: text(FIELD_DURATION),
        certificate_no: text(FIELD_CERTIFICATE_NO),
        fathers_name: text(FIELD_FATHERS_NAME),
        institute: text(FIELD_INSTITUTE),
        registration_no: text(FIELD_REGISTRATION_NO),
        issued_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::certificate::{CellValue, FIELD_ISSUED_AT, REQUIRED_FIELDS};

    /// 构造第 idx 个数据行（0 起），行号套用展示行号约定
    fn make_row(idx: usize, certificate_no: Option<&str>) -> RawImportRow {
        let mut row = RawImportRow::new(idx + 2);
        for field in REQUIRED_FIELDS {
            row.cells
                .insert(field.to_string(), CellValue::Text(format!(" v-{} ", field)));
        }
        row.cells.insert(
            FIELD_ISSUED_AT.to_string(),
            CellValue::Text("2024-07-15".to_string()),
        );
        match certificate_no {
            Some(no) => row.cells.insert(
                FIELD_CERTIFICATE_NO.to_string(),
                CellValue::Text(no.to_string()),
            ),
            None => row
                .cells
                .insert(FIELD_CERTIFICATE_NO.to_string(), CellValue::Empty),
        };
        row
    }

    #[test]
    fn test_ten_rows_one_bad_reports_row_four() {
        // 数据行 3（0 起为 2）缺 certificateNo，展示行号为 Row 4
        let rows: Vec<RawImportRow> = (0..10)
            .map(|i| {
                if i == 2 {
                    make_row(i, None)
                } else {
                    make_row(i, Some(&format!("CERT-{}", i)))
                }
            })
            .collect();

        let outcome = process_rows(&rows);
        assert_eq!(outcome.valid.len(), 9);
        assert_eq!(outcome.attempted, 10);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(
            outcome.errors[0],
            "Row 4: Missing required fields: certificateNo"
        );
    }

    #[test]
    fn test_bad_row_does_not_abort_batch() {
        let rows = vec![
            make_row(0, Some("CERT-0")),
            make_row(1, None),
            make_row(2, Some("CERT-2")),
        ];
        let outcome = process_rows(&rows);
        // 后续行继续处理
        assert_eq!(outcome.valid.len(), 2);
        assert_eq!(outcome.valid[1].certificate_no, "CERT-2");
    }

    #[test]
    fn test_text_fields_trimmed_and_date_normalized() {
        let outcome = process_rows(&[make_row(0, Some(" CERT-0 "))]);
        let cert = &outcome.valid[0];
        assert_eq!(cert.certificate_no, "CERT-0");
        assert_eq!(cert.student_name, "v-studentName");
        assert_eq!(cert.issued_at.format("%Y-%m-%d").to_string(), "2024-07-15");
    }

    #[test]
    fn test_full_error_list_returned_untruncated() {
        // 8 个坏行：处理器返回全部 8 条，截断只发生在展示层
        let rows: Vec<RawImportRow> = (0..8).map(|i| make_row(i, None)).collect();
        let outcome = process_rows(&rows);
        assert_eq!(outcome.errors.len(), 8);
        assert_eq!(outcome.valid.len(), 0);
    }

    #[test]
    fn test_empty_input() {
        let outcome = process_rows(&[]);
        assert_eq!(outcome.attempted, 0);
        assert!(outcome.valid.is_empty());
        assert!(outcome.errors.is_empty());
    }
}
