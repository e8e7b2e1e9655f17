// ==========================================
// 培训机构门户后台 - 上传文件解析器
// ==========================================
// 支持: Excel (.xlsx/.xls，仅第一个工作表) / CSV (.csv)
// 约定: 表头行列名必须与字段标识符完全一致；
//       多余列忽略，缺列等价于该字段整列空白
// ==========================================

use crate::domain::certificate::{CellValue, RawImportRow};
use crate::importer::error::ImportError;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（管道阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为未校验行列表
    ///
    /// # 约定
    /// - 行号为电子表格展示行号（第 1 行是表头，数据行从 Row 2 起）
    /// - 完全空白的行跳过，但不改变后续行的展示行号
    fn parse_to_rows(&self, file_path: &Path) -> Result<Vec<RawImportRow>, ImportError>;
}

/// 表头展示行号之后第一个数据行的展示行号
const FIRST_DATA_ROW: usize = 2;

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_rows(&self, file_path: &Path) -> Result<Vec<RawImportRow>, ImportError> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut row = RawImportRow::new(idx + FIRST_DATA_ROW);

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    let cell = if value.trim().is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(value.to_string())
                    };
                    row.cells.insert(header.clone(), cell);
                }
            }

            // 跳过完全空白的行（展示行号不回退）
            if row.cells.values().all(CellValue::is_blank) {
                continue;
            }

            rows.push(row);
        }

        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_rows(&self, file_path: &Path) -> Result<Vec<RawImportRow>, ImportError> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        // .xlsx / .xls 按文件头自动识别
        let mut workbook = open_workbook_auto(file_path)
            .map_err(|e| ImportError::SpreadsheetParseError(e.to_string()))?;

        // 只读第一个工作表
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::SpreadsheetParseError("workbook has no sheets".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::SpreadsheetParseError(e.to_string()))?;

        // 表头（第一行）
        let mut sheet_rows = range.rows();
        let header_row = sheet_rows.next().ok_or_else(|| {
            ImportError::SpreadsheetParseError("sheet has no header row".to_string())
        })?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, data_row) in sheet_rows.enumerate() {
            let mut row = RawImportRow::new(idx + FIRST_DATA_ROW);

            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.cells.insert(header.clone(), to_cell_value(cell));
                }
            }

            if row.cells.values().all(CellValue::is_blank) {
                continue;
            }

            rows.push(row);
        }

        Ok(rows)
    }
}

/// Excel 单元格 → 未定型值
///
/// 数字与日期序列号保留数值形态，交给日期归一化器判定；
/// 错误单元格按空白处理，由字段校验器报缺失
fn to_cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> Result<Vec<RawImportRow>, ImportError> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_to_rows(path),
            "xlsx" | "xls" => ExcelParser.parse_to_rows(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(lines: &[&str]) -> NamedTempFile {
        let mut temp_file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = write_csv(&[
            "studentName,certificateNo,issuedAt",
            "Amit Kumar,CERT-001,2024-07-15",
            "Ravi Singh,CERT-002,45474",
        ]);

        let rows = CsvParser.parse_to_rows(temp_file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(
            rows[0].cell("studentName"),
            CellValue::Text("Amit Kumar".to_string())
        );
        // 序列号在 CSV 路径下以文本到达
        assert_eq!(rows[1].cell("issuedAt"), CellValue::Text("45474".to_string()));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_rows(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skips_blank_rows_keeps_numbering() {
        let temp_file = write_csv(&[
            "studentName,certificateNo",
            "Amit,CERT-001",
            ",",
            "Ravi,CERT-002",
        ]);

        let rows = CsvParser.parse_to_rows(temp_file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        // 空行被跳过，但 Ravi 仍是表格里的第 4 行
        assert_eq!(rows[1].row_number, 4);
    }

    #[test]
    fn test_csv_extra_columns_carried_and_ignored_downstream() {
        let temp_file = write_csv(&[
            "studentName,certificateNo,remarks",
            "Amit,CERT-001,none",
        ]);

        let rows = CsvParser.parse_to_rows(temp_file.path()).unwrap();
        // 多余列保留在行里，由字段校验器按需取值时自然忽略
        assert_eq!(rows[0].cell("remarks"), CellValue::Text("none".to_string()));
    }

    #[test]
    fn test_missing_column_reads_as_blank() {
        let temp_file = write_csv(&["studentName", "Amit"]);
        let rows = CsvParser.parse_to_rows(temp_file.path()).unwrap();
        assert!(rows[0].cell("certificateNo").is_blank());
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let result = UniversalFileParser.parse("upload.pdf");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
