// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、token 验签桩、CSV 样例生成
// ==========================================

use institute_portal::api::auth::{AdminClaims, TokenVerifier, ADMIN_ROLE};
use institute_portal::db;
use std::error::Error;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

/// 测试管理员 token
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_and_init(&db_path)?;
    drop(conn);

    Ok((temp_file, db_path))
}

/// 固定 token 的验签桩：TEST_ADMIN_TOKEN → admin
pub struct StubVerifier;

impl TokenVerifier for StubVerifier {
    fn verify(&self, token: &str) -> Option<AdminClaims> {
        if token == TEST_ADMIN_TOKEN {
            Some(AdminClaims {
                subject: "test-admin".to_string(),
                role: ADMIN_ROLE.to_string(),
            })
        } else {
            None
        }
    }
}

/// 管理员 Authorization 头
pub fn admin_header() -> String {
    format!("Bearer {}", TEST_ADMIN_TOKEN)
}

/// 写一个带表头的证书 CSV 临时文件（.csv 后缀）
///
/// # 参数
/// - rows: 数据行（与表头列顺序一致）
pub fn write_certificate_csv(rows: &[[String; 8]]) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = Builder::new().suffix(".csv").tempfile()?;
    writeln!(
        file,
        "studentName,courseName,duration,certificateNo,fathersName,institute,registrationNo,issuedAt"
    )?;
    for row in rows {
        writeln!(file, "{}", row.join(","))?;
    }
    file.flush()?;
    Ok(file)
}

/// 标准样例数据行
pub fn sample_row(cert_no: &str, reg_no: &str) -> [String; 8] {
    [
        "Amit Kumar".to_string(),
        "Web Development".to_string(),
        "6 Months".to_string(),
        cert_no.to_string(),
        "Raj Kumar".to_string(),
        "NKB Institute".to_string(),
        reg_no.to_string(),
        "2024-07-15".to_string(),
    ]
}
