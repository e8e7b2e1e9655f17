// ==========================================
// 培训机构门户后台 - 课程领域模型
// ==========================================
// 用途: 公开课程目录 + 报名捕获 + 后台课程管理
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Course - 课程（持久化实体）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: String,      // 学制描述（如 "6 Months"）
    pub fee: f64,              // 学费
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 课程创建/编辑载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub fee: f64,
}

// ==========================================
// Enrollment - 报名记录（持久化实体）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub course_id: i64,
    pub created_at: DateTime<Utc>,
}

/// 报名载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub course_id: i64,
}

/// 课程 + 报名列表（后台列表页视图）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithEnrollments {
    #[serde(flatten)]
    pub course: Course,
    pub enrollments: Vec<Enrollment>,
}
