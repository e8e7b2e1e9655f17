// ==========================================
// 培训机构门户后台 - 课程 / 报名 Repository
// ==========================================
// 约束: enrollment.course_id 外键引用 course(id)，
//       删除课程时级联删除其报名记录
// ==========================================

use crate::domain::course::{
    Course, CourseInput, CourseWithEnrollments, Enrollment, EnrollmentInput,
};
use crate::repository::certificate_repo_impl::parse_timestamp_column;
use crate::repository::error::{map_sqlite_error, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// CourseRepository Trait
// ==========================================
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// 列出全部课程及各自的报名记录（后台列表页）
    async fn list_with_enrollments(&self) -> RepositoryResult<Vec<CourseWithEnrollments>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Course>>;

    async fn insert(&self, input: CourseInput) -> RepositoryResult<Course>;

    async fn update(&self, id: i64, input: CourseInput) -> RepositoryResult<Course>;

    /// 删除课程（其报名记录级联删除）
    async fn delete(&self, id: i64) -> RepositoryResult<()>;

    /// 新增报名记录（course_id 不存在时报外键错误）
    async fn insert_enrollment(&self, input: EnrollmentInput) -> RepositoryResult<Enrollment>;

    async fn list_enrollments(&self, course_id: i64) -> RepositoryResult<Vec<Enrollment>>;
}

// ==========================================
// CourseRepositoryImpl
// ==========================================
pub struct CourseRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CourseRepositoryImpl {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn fetch_course(conn: &Connection, id: i64) -> RepositoryResult<Option<Course>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, title, description, duration, fee, created_at, updated_at \
                 FROM course WHERE id = ?1",
            )
            .map_err(map_sqlite_error)?;
        let mut rows = stmt
            .query_map(params![id], row_to_course)
            .map_err(map_sqlite_error)?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(map_sqlite_error)?)),
            None => Ok(None),
        }
    }

    fn fetch_enrollments(conn: &Connection, course_id: i64) -> RepositoryResult<Vec<Enrollment>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, name, email, phone, course_id, created_at \
                 FROM enrollment WHERE course_id = ?1 ORDER BY id",
            )
            .map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map(params![course_id], row_to_enrollment)
            .map_err(map_sqlite_error)?;

        let mut enrollments = Vec::new();
        for row in rows {
            enrollments.push(row.map_err(map_sqlite_error)?);
        }
        Ok(enrollments)
    }
}

#[async_trait]
impl CourseRepository for CourseRepositoryImpl {
    async fn list_with_enrollments(&self) -> RepositoryResult<Vec<CourseWithEnrollments>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, description, duration, fee, created_at, updated_at \
                 FROM course ORDER BY id",
            )
            .map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map([], row_to_course)
            .map_err(map_sqlite_error)?;

        let mut courses = Vec::new();
        for row in rows {
            courses.push(row.map_err(map_sqlite_error)?);
        }
        drop(stmt);

        let mut result = Vec::with_capacity(courses.len());
        for course in courses {
            let enrollments = Self::fetch_enrollments(&conn, course.id)?;
            result.push(CourseWithEnrollments {
                course,
                enrollments,
            });
        }
        Ok(result)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Course>> {
        let conn = self.lock()?;
        Self::fetch_course(&conn, id)
    }

    async fn insert(&self, input: CourseInput) -> RepositoryResult<Course> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO course (title, description, duration, fee, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                input.title,
                input.description,
                input.duration,
                input.fee,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(map_sqlite_error)?;

        let id = conn.last_insert_rowid();
        Ok(Course {
            id,
            title: input.title,
            description: input.description,
            duration: input.duration,
            fee: input.fee,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, id: i64, input: CourseInput) -> RepositoryResult<Course> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                "UPDATE course SET title = ?1, description = ?2, duration = ?3, fee = ?4, \
                 updated_at = ?5 WHERE id = ?6",
                params![
                    input.title,
                    input.description,
                    input.duration,
                    input.fee,
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )
            .map_err(map_sqlite_error)?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "course".to_string(),
                id: id.to_string(),
            });
        }

        Self::fetch_course(&conn, id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "course".to_string(),
            id: id.to_string(),
        })
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let affected = conn
            .execute("DELETE FROM course WHERE id = ?1", params![id])
            .map_err(map_sqlite_error)?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "course".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_enrollment(&self, input: EnrollmentInput) -> RepositoryResult<Enrollment> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO enrollment (name, email, phone, course_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                input.name,
                input.email,
                input.phone,
                input.course_id,
                now.to_rfc3339(),
            ],
        )
        .map_err(map_sqlite_error)?;

        let id = conn.last_insert_rowid();
        Ok(Enrollment {
            id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            course_id: input.course_id,
            created_at: now,
        })
    }

    async fn list_enrollments(&self, course_id: i64) -> RepositoryResult<Vec<Enrollment>> {
        let conn = self.lock()?;
        Self::fetch_enrollments(&conn, course_id)
    }
}

fn row_to_course(row: &rusqlite::Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        duration: row.get(3)?,
        fee: row.get(4)?,
        created_at: parse_timestamp_column(row, 5)?,
        updated_at: parse_timestamp_column(row, 6)?,
    })
}

fn row_to_enrollment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        course_id: row.get(4)?,
        created_at: parse_timestamp_column(row, 5)?,
    })
}
