// ==========================================
// 培训机构门户后台 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 证书签发/验证 + 批量导入 + 课程/联系表单管理
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::certificate::{
    CertificateInput, CertificateRecord, ImportOutcome, NewCertificate, RawImportRow,
};
pub use domain::contact::{ContactInput, ContactSubmission};
pub use domain::course::{Course, CourseInput, Enrollment, EnrollmentInput};

// 导入管道
pub use importer::{CertificateImporter, ImportError, ImportStage};

// 仓储
pub use repository::{
    CertificateRepository, CertificateRepositoryImpl, ContactRepository, ContactRepositoryImpl,
    CourseRepository, CourseRepositoryImpl, RepositoryError,
};

// API
pub use api::{
    ApiError, CertificateApi, ContactApi, ContactNotifier, CourseApi, NoopNotifier, TokenVerifier,
};

// 配置
pub use config::ConfigManager;

/// 系统版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "培训机构门户后台";
