// ==========================================
// 培训机构门户后台 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 内嵌建表语句，首次启动即可用
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 内嵌数据库 schema
///
/// 说明：
/// - certificate_no / registration_no 的 UNIQUE 约束是重复键的最终防线，
///   导入前的存在性查询只负责给出更友好的错误消息
/// - 证书删除为物理删除，无软删除列
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS certificate (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    student_name     TEXT NOT NULL,
    course_name      TEXT NOT NULL,
    duration         TEXT NOT NULL,
    certificate_no   TEXT NOT NULL UNIQUE,
    fathers_name     TEXT NOT NULL,
    institute        TEXT NOT NULL,
    registration_no  TEXT NOT NULL UNIQUE,
    issued_at        TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contact_submission (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    phone       TEXT,
    message     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS course (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    duration     TEXT NOT NULL,
    fee          REAL NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS enrollment (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    phone       TEXT,
    course_id   INTEGER NOT NULL REFERENCES course(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id  TEXT NOT NULL DEFAULT 'global',
    key       TEXT NOT NULL,
    value     TEXT NOT NULL,
    PRIMARY KEY (scope_id, key)
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等，CREATE TABLE IF NOT EXISTS）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// 打开连接并确保 schema 就绪
pub fn open_and_init(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 内存库共享连接（单元测试用，schema 已就绪）
pub fn open_in_memory_for_tests() -> std::sync::Arc<std::sync::Mutex<Connection>> {
    let conn = Connection::open_in_memory().expect("open in-memory database");
    configure_sqlite_connection(&conn).expect("configure in-memory database");
    init_schema(&conn).expect("init in-memory schema");
    std::sync::Arc::new(std::sync::Mutex::new(conn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        // 重复执行不应报错
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM certificate", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_certificate_no_unique_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let insert = "INSERT INTO certificate (student_name, course_name, duration, \
                      certificate_no, fathers_name, institute, registration_no, \
                      issued_at, created_at, updated_at) \
                      VALUES ('A', 'B', '6 Months', ?1, 'C', 'D', ?2, '2024-07-01', '', '')";
        conn.execute(insert, ["CERT-1", "REG-1"]).unwrap();
        // 相同 certificate_no 必须被拒绝，而不是静默覆盖
        let err = conn.execute(insert, ["CERT-1", "REG-2"]);
        assert!(err.is_err());
    }
}
