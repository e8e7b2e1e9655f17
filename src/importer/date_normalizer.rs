// ==========================================
// 培训机构门户后台 - 日期归一化器
// ==========================================
// 职责: 把异构日期表示（ISO 文本 / 电子表格序列号）归一为
//       统一时间戳（当日 UTC 零点）
// 约束: 纯函数、确定性——同一原始值永远归一为同一时间戳
// ==========================================

use crate::domain::certificate::CellValue;
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::fmt;

/// 电子表格序列号纪元：1899-12-30（天数约定）
/// 序列号 N 映射为 纪元 + N 天
const SERIAL_EPOCH_YMD: (i32, u32, u32) = (1899, 12, 30);

/// 序列号上限，对应 9999-12-31；超出视为非法
const SERIAL_MAX: f64 = 2_958_465.0;

/// 无效日期：携带原始值，供错误消息回显
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDate {
    pub raw: String,
}

impl fmt::Display for InvalidDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid issued date format: {} (use YYYY-MM-DD)",
            self.raw
        )
    }
}

impl std::error::Error for InvalidDate {}

fn serial_epoch() -> NaiveDate {
    let (y, m, d) = SERIAL_EPOCH_YMD;
    // 常量日期，构造必然成功
    NaiveDate::from_ymd_opt(y, m, d).expect("serial epoch is a valid date")
}

/// 序列号 → 日历日期（小数部分为当日时间，截断丢弃）
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > SERIAL_MAX {
        return None;
    }
    serial_epoch().checked_add_days(Days::new(serial.trunc() as u64))
}

/// 文本 → 日历日期（ISO 日期优先，其次 RFC 3339，最后按序列号文本兜底）
fn text_to_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    // CSV 上传时序列号以文本形式到达
    if let Ok(serial) = trimmed.parse::<f64>() {
        return serial_to_date(serial);
    }
    None
}

/// 把上传单元格归一为统一时间戳（当日 UTC 零点）
///
/// # 参数
/// - value: 未定型单元格（文本 / 数字 / 空）
///
/// # 返回
/// - Ok(DateTime<Utc>): 归一成功
/// - Err(InvalidDate): 两条路径都未能产出合法日期，携带原始值
pub fn normalize_date(value: &CellValue) -> Result<DateTime<Utc>, InvalidDate> {
    let date = match value {
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::Text(s) => text_to_date(s),
        CellValue::Empty => None,
    };

    date.and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| InvalidDate {
            raw: value.raw_display(),
        })
}

/// 统一时间戳 → 展示日期（YYYY-MM-DD，核验页与编辑表单用）
pub fn to_display_date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}
