// ==========================================
// 培训机构门户后台 - 领域模型层
// ==========================================
// 职责: 定义领域实体与导入中间结构
// 红线: 不含数据访问逻辑,不含校验逻辑
// ==========================================

pub mod certificate;
pub mod contact;
pub mod course;

// 重导出核心类型
pub use certificate::{
    CellValue, CertificateInput, CertificateRecord, ImportOutcome, NewCertificate, RawImportRow,
    REQUIRED_FIELDS,
};
pub use contact::{ContactInput, ContactSubmission};
pub use course::{Course, CourseInput, CourseWithEnrollments, Enrollment, EnrollmentInput};
