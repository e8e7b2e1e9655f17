// ==========================================
// 培训机构门户后台 - 配置层
// ==========================================

pub mod config_manager;

pub use config_manager::{
    default_db_path, ConfigManager, KEY_CONTACT_NOTIFY_EMAIL, KEY_INSTITUTE_NAME,
};
