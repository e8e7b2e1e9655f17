// ==========================================
// 培训机构门户后台 - 课程/报名API
// ==========================================
// 职责: 公开课程目录与报名捕获 + 后台课程 CRUD
// 鉴权: 课程增删改与报名列表要求管理员；目录与报名提交公开
// ==========================================

use crate::api::auth::{require_admin, TokenVerifier};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::course::{
    Course, CourseInput, CourseWithEnrollments, Enrollment, EnrollmentInput,
};
use crate::repository::error::RepositoryError;
use crate::repository::CourseRepository;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// CourseApi
// ==========================================
pub struct CourseApi {
    repo: Arc<dyn CourseRepository>,
    verifier: Arc<dyn TokenVerifier>,
}

impl CourseApi {
    pub fn new(repo: Arc<dyn CourseRepository>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { repo, verifier }
    }

    /// 公开课程目录（无鉴权，不含报名记录）
    pub async fn list_public(&self) -> ApiResult<Vec<Course>> {
        let listed = self.repo.list_with_enrollments().await?;
        Ok(listed.into_iter().map(|c| c.course).collect())
    }

    /// 后台课程列表（含各课程的报名记录）
    pub async fn list_admin(
        &self,
        authorization: Option<&str>,
    ) -> ApiResult<Vec<CourseWithEnrollments>> {
        require_admin(self.verifier.as_ref(), authorization)?;
        Ok(self.repo.list_with_enrollments().await?)
    }

    #[instrument(skip(self, authorization, input))]
    pub async fn create(
        &self,
        authorization: Option<&str>,
        input: CourseInput,
    ) -> ApiResult<Course> {
        require_admin(self.verifier.as_ref(), authorization)?;
        validate_course_input(&input)?;
        let created = self.repo.insert(input).await?;
        info!(id = created.id, title = %created.title, "课程创建完成");
        Ok(created)
    }

    #[instrument(skip(self, authorization, input))]
    pub async fn update(
        &self,
        authorization: Option<&str>,
        id: i64,
        input: CourseInput,
    ) -> ApiResult<Course> {
        require_admin(self.verifier.as_ref(), authorization)?;
        validate_course_input(&input)?;
        Ok(self.repo.update(id, input).await?)
    }

    /// 删除课程（其报名记录级联删除）
    #[instrument(skip(self, authorization))]
    pub async fn delete(&self, authorization: Option<&str>, id: i64) -> ApiResult<()> {
        require_admin(self.verifier.as_ref(), authorization)?;
        self.repo.delete(id).await?;
        info!(id, "课程已删除");
        Ok(())
    }

    /// 公开报名入口（无鉴权）
    #[instrument(skip(self, input))]
    pub async fn enroll(&self, input: EnrollmentInput) -> ApiResult<Enrollment> {
        let mut missing = Vec::new();
        if input.name.trim().is_empty() {
            missing.push("name");
        }
        if input.email.trim().is_empty() {
            missing.push("email");
        }
        if !missing.is_empty() {
            return Err(ApiError::ValidationError(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        match self.repo.insert_enrollment(input).await {
            Ok(enrollment) => {
                info!(id = enrollment.id, course_id = enrollment.course_id, "报名记录已保存");
                Ok(enrollment)
            }
            // 外键未命中 = 目标课程不存在
            Err(RepositoryError::ForeignKeyViolation(_)) => {
                Err(ApiError::NotFound("Course not found".to_string()))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// 后台报名列表（按课程）
    pub async fn list_enrollments(
        &self,
        authorization: Option<&str>,
        course_id: i64,
    ) -> ApiResult<Vec<Enrollment>> {
        require_admin(self.verifier.as_ref(), authorization)?;
        Ok(self.repo.list_enrollments(course_id).await?)
    }
}

fn validate_course_input(input: &CourseInput) -> Result<(), ApiError> {
    let mut missing = Vec::new();
    if input.title.trim().is_empty() {
        missing.push("title");
    }
    if input.description.trim().is_empty() {
        missing.push("description");
    }
    if input.duration.trim().is_empty() {
        missing.push("duration");
    }
    if !missing.is_empty() {
        return Err(ApiError::ValidationError(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }
    if input.fee < 0.0 {
        return Err(ApiError::ValidationError(
            "Fee must not be negative".to_string(),
        ));
    }
    Ok(())
}
