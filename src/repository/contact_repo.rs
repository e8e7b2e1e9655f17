// ==========================================
// 培训机构门户后台 - 联系表单 Repository
// ==========================================

use crate::domain::contact::{ContactInput, ContactSubmission};
use crate::repository::certificate_repo_impl::parse_timestamp_column;
use crate::repository::error::{map_sqlite_error, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ContactRepository Trait
// ==========================================
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// 保存一条联系表单提交，返回落库后的完整记录
    async fn insert(&self, input: ContactInput) -> RepositoryResult<ContactSubmission>;

    /// 按提交时间倒序列出全部提交
    async fn list_all(&self) -> RepositoryResult<Vec<ContactSubmission>>;
}

// ==========================================
// ContactRepositoryImpl
// ==========================================
pub struct ContactRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ContactRepositoryImpl {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl ContactRepository for ContactRepositoryImpl {
    async fn insert(&self, input: ContactInput) -> RepositoryResult<ContactSubmission> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO contact_submission (name, email, phone, message, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                input.name,
                input.email,
                input.phone,
                input.message,
                now.to_rfc3339(),
            ],
        )
        .map_err(map_sqlite_error)?;

        let id = conn.last_insert_rowid();
        Ok(ContactSubmission {
            id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            message: input.message,
            created_at: now,
        })
    }

    async fn list_all(&self) -> RepositoryResult<Vec<ContactSubmission>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, email, phone, message, created_at \
                 FROM contact_submission ORDER BY created_at DESC, id DESC",
            )
            .map_err(map_sqlite_error)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ContactSubmission {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    phone: row.get(3)?,
                    message: row.get(4)?,
                    created_at: parse_timestamp_column(row, 5)?,
                })
            })
            .map_err(map_sqlite_error)?;

        let mut submissions = Vec::new();
        for row in rows {
            submissions.push(row.map_err(map_sqlite_error)?);
        }
        Ok(submissions)
    }
}
