// ==========================================
// 培训机构门户后台 - API层
// ==========================================
// 分层:
// - auth: Bearer token 解析与管理员校验
// - error: API层统一错误（status_code + error 响应体）
// - certificate_api: 证书 CRUD / 批量导入 / 公开验证
// - contact_api: 公开联系表单
// - course_api: 课程目录 / 报名 / 后台课程管理
// ==========================================

pub mod auth;
pub mod certificate_api;
pub mod contact_api;
pub mod course_api;
pub mod error;

pub use auth::{require_admin, AdminClaims, AuthError, TokenVerifier, ADMIN_ROLE};
pub use certificate_api::{BulkCreateResponse, CertificateApi, VerifyResponse};
pub use contact_api::{ContactApi, ContactNotifier, ContactResponse, NoopNotifier};
pub use course_api::CourseApi;
pub use error::{ApiError, ApiResult};
