// ==========================================
// 培训机构门户后台 - 证书 Repository 实现
// ==========================================
// 存储: rusqlite（statement 全部参数化）
// 约束: certificate_no / registration_no 的 UNIQUE 列
//       是重复键的最终防线
// ==========================================

use crate::db::{open_and_init, configure_sqlite_connection, init_schema};
use crate::domain::certificate::{CertificateRecord, NewCertificate};
use crate::repository::certificate_repo::CertificateRepository;
use crate::repository::error::{map_sqlite_error, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection};
use std::sync::{Arc, Mutex};

/// SELECT 列顺序（与 row_to_certificate 对齐）
const SELECT_COLUMNS: &str = "id, student_name, course_name, duration, certificate_no, \
     fathers_name, institute, registration_no, issued_at, created_at, updated_at";

const INSERT_SQL: &str = "INSERT INTO certificate (\
     student_name, course_name, duration, certificate_no, fathers_name, \
     institute, registration_no, issued_at, created_at, updated_at\
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

// ==========================================
// CertificateRepositoryImpl
// ==========================================
pub struct CertificateRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CertificateRepositoryImpl {
    /// 创建新的 Repository 实例（打开连接并确保 schema 就绪）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_and_init(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 内存库实例（单元测试用）
    pub fn new_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        configure_sqlite_connection(&conn)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn).map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（多仓储共享一个请求级连接）
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)
                .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按唯一键回读（批量提交后的响应载荷）
    fn fetch_by_keys(
        conn: &Connection,
        certificate_nos: &[String],
        registration_nos: &[String],
    ) -> RepositoryResult<Vec<CertificateRecord>> {
        if certificate_nos.is_empty() {
            return Ok(Vec::new());
        }

        let cert_placeholders = placeholders(certificate_nos.len());
        let reg_placeholders = placeholders(registration_nos.len());
        let sql = format!(
            "SELECT {} FROM certificate WHERE certificate_no IN ({}) \
             AND registration_no IN ({}) ORDER BY id",
            SELECT_COLUMNS, cert_placeholders, reg_placeholders
        );

        let mut stmt = conn.prepare(&sql).map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map(
                params_from_iter(certificate_nos.iter().chain(registration_nos.iter())),
                row_to_certificate,
            )
            .map_err(map_sqlite_error)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(map_sqlite_error)?);
        }
        Ok(records)
    }

    fn fetch_by_id(conn: &Connection, id: i64) -> RepositoryResult<Option<CertificateRecord>> {
        let sql = format!("SELECT {} FROM certificate WHERE id = ?1", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(map_sqlite_error)?;
        let mut rows = stmt
            .query_map(params![id], row_to_certificate)
            .map_err(map_sqlite_error)?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(map_sqlite_error)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CertificateRepository for CertificateRepositoryImpl {
    async fn list_all(&self) -> RepositoryResult<Vec<CertificateRecord>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM certificate ORDER BY id", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map([], row_to_certificate)
            .map_err(map_sqlite_error)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(map_sqlite_error)?);
        }
        Ok(records)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<CertificateRecord>> {
        let conn = self.lock()?;
        Self::fetch_by_id(&conn, id)
    }

    async fn find_by_certificate_no(
        &self,
        certificate_no: &str,
    ) -> RepositoryResult<Option<CertificateRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM certificate WHERE certificate_no = ?1",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).map_err(map_sqlite_error)?;
        let mut rows = stmt
            .query_map(params![certificate_no], row_to_certificate)
            .map_err(map_sqlite_error)?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(map_sqlite_error)?)),
            None => Ok(None),
        }
    }

    async fn find_existing_keys(
        &self,
        certificate_nos: &[String],
        registration_nos: &[String],
    ) -> RepositoryResult<Vec<(String, String)>> {
        if certificate_nos.is_empty() && registration_nos.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let sql = format!(
            "SELECT certificate_no, registration_no FROM certificate \
             WHERE certificate_no IN ({}) OR registration_no IN ({})",
            placeholders(certificate_nos.len()),
            placeholders(registration_nos.len())
        );

        let mut stmt = conn.prepare(&sql).map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map(
                params_from_iter(certificate_nos.iter().chain(registration_nos.iter())),
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .map_err(map_sqlite_error)?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row.map_err(map_sqlite_error)?);
        }
        Ok(keys)
    }

    async fn has_conflicting_keys(
        &self,
        certificate_no: &str,
        registration_no: &str,
        exclude_id: Option<i64>,
    ) -> RepositoryResult<bool> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM certificate \
                 WHERE (certificate_no = ?1 OR registration_no = ?2) \
                 AND (?3 IS NULL OR id != ?3)",
                params![certificate_no, registration_no, exclude_id],
                |row| row.get(0),
            )
            .map_err(map_sqlite_error)?;
        Ok(count > 0)
    }

    async fn insert_one(
        &self,
        certificate: NewCertificate,
    ) -> RepositoryResult<CertificateRecord> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            INSERT_SQL,
            params![
                certificate.student_name,
                certificate.course_name,
                certificate.duration,
                certificate.certificate_no,
                certificate.fathers_name,
                certificate.institute,
                certificate.registration_no,
                certificate.issued_at.to_rfc3339(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(map_sqlite_error)?;

        // 回读唯一键而不是信任 last_insert_rowid 之外的生成值
        let created = Self::fetch_by_keys(
            &conn,
            std::slice::from_ref(&certificate.certificate_no),
            std::slice::from_ref(&certificate.registration_no),
        )?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "certificate".to_string(),
                id: certificate.certificate_no.clone(),
            })
    }

    async fn batch_insert(
        &self,
        certificates: Vec<NewCertificate>,
    ) -> RepositoryResult<Vec<CertificateRecord>> {
        if certificates.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        {
            let mut stmt = tx.prepare(INSERT_SQL).map_err(map_sqlite_error)?;
            for certificate in &certificates {
                // 任一条命中 UNIQUE 约束即整体回滚（tx Drop 即回滚）
                stmt.execute(params![
                    certificate.student_name,
                    certificate.course_name,
                    certificate.duration,
                    certificate.certificate_no,
                    certificate.fathers_name,
                    certificate.institute,
                    certificate.registration_no,
                    certificate.issued_at.to_rfc3339(),
                    now,
                    now,
                ])
                .map_err(map_sqlite_error)?;
            }
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 提交后按唯一键回读，返回含主键/时间戳的完整记录
        let certificate_nos: Vec<String> = certificates
            .iter()
            .map(|c| c.certificate_no.clone())
            .collect();
        let registration_nos: Vec<String> = certificates
            .iter()
            .map(|c| c.registration_no.clone())
            .collect();
        Self::fetch_by_keys(&conn, &certificate_nos, &registration_nos)
    }

    async fn update(
        &self,
        id: i64,
        certificate: NewCertificate,
    ) -> RepositoryResult<CertificateRecord> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                "UPDATE certificate SET student_name = ?1, course_name = ?2, duration = ?3, \
                 certificate_no = ?4, fathers_name = ?5, institute = ?6, registration_no = ?7, \
                 issued_at = ?8, updated_at = ?9 WHERE id = ?10",
                params![
                    certificate.student_name,
                    certificate.course_name,
                    certificate.duration,
                    certificate.certificate_no,
                    certificate.fathers_name,
                    certificate.institute,
                    certificate.registration_no,
                    certificate.issued_at.to_rfc3339(),
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )
            .map_err(map_sqlite_error)?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "certificate".to_string(),
                id: id.to_string(),
            });
        }

        Self::fetch_by_id(&conn, id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "certificate".to_string(),
            id: id.to_string(),
        })
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let affected = conn
            .execute("DELETE FROM certificate WHERE id = ?1", params![id])
            .map_err(map_sqlite_error)?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "certificate".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM certificate", [], |row| row.get(0))
            .map_err(map_sqlite_error)
    }
}

/// 生成裸占位符串："?, ?, ?"；空列表给 "NULL"（IN (NULL) 不命中任何行）
fn placeholders(count: usize) -> String {
    if count == 0 {
        return "NULL".to_string();
    }
    vec!["?"; count].join(", ")
}

/// SELECT 行 → CertificateRecord
fn row_to_certificate(row: &rusqlite::Row<'_>) -> rusqlite::Result<CertificateRecord> {
    Ok(CertificateRecord {
        id: row.get(0)?,
        student_name: row.get(1)?,
        course_name: row.get(2)?,
        duration: row.get(3)?,
        certificate_no: row.get(4)?,
        fathers_name: row.get(5)?,
        institute: row.get(6)?,
        registration_no: row.get(7)?,
        issued_at: parse_timestamp_column(row, 8)?,
        created_at: parse_timestamp_column(row, 9)?,
        updated_at: parse_timestamp_column(row, 10)?,
    })
}

/// TEXT 时间列解析：RFC 3339 优先，兼容裸日期（按 UTC 零点）
pub(crate) fn parse_timestamp_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid timestamp text: {}", raw),
            )),
        )
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
