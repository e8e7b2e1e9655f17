// ==========================================
// 培训机构门户后台 - 仓储层
// ==========================================
// 分层:
// - error: 仓储层统一错误类型
// - certificate_repo: 证书仓储 trait + 实现
// - contact_repo: 联系表单仓储
// - course_repo: 课程 / 报名仓储
// ==========================================

pub mod certificate_repo;
pub mod certificate_repo_impl;
pub mod contact_repo;
pub mod course_repo;
pub mod error;

pub use certificate_repo::CertificateRepository;
pub use certificate_repo_impl::CertificateRepositoryImpl;
pub use contact_repo::{ContactRepository, ContactRepositoryImpl};
pub use course_repo::{CourseRepository, CourseRepositoryImpl};
pub use error::{RepositoryError, RepositoryResult};
