// ==========================================
// 培训机构门户后台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::{configure_sqlite_connection, open_and_init};
use rusqlite::{params, Connection};
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 联系表单通知收件邮箱
pub const KEY_CONTACT_NOTIFY_EMAIL: &str = "contact_notify_email";
/// 机构名称（证书验证页与通知落款）
pub const KEY_INSTITUTE_NAME: &str = "institute_name";

/// 默认数据库文件名
const DEFAULT_DB_FILE: &str = "institute-portal.db";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_and_init(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 覆写 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2) \
             ON CONFLICT (scope_id, key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// 联系表单通知收件邮箱（未配置时为 None，走 NoopNotifier）
    pub fn contact_notify_email(&self) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self
            .get_global_config_value(KEY_CONTACT_NOTIFY_EMAIL)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    /// 机构名称（默认空串由调用方兜底）
    pub fn institute_name(&self) -> Result<Option<String>, Box<dyn Error>> {
        self.get_global_config_value(KEY_INSTITUTE_NAME)
    }
}

/// 默认数据库路径：INSTITUTE_PORTAL_DB 环境变量优先，
/// 否则落在用户数据目录下
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("INSTITUTE_PORTAL_DB") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("institute-portal")
        .join(DEFAULT_DB_FILE)
}
