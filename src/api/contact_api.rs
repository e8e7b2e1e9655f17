// ==========================================
// 培训机构门户后台 - 联系表单API
// ==========================================
// 职责: 公开联系表单的校验、落库与通知转发
// 顺序: 先落库后通知；通知失败不回滚提交，只记日志
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::contact::{ContactInput, ContactSubmission};
use crate::repository::ContactRepository;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::LazyLock;
use tracing::{info, instrument, warn};

/// 联系表单必填字段（缺失消息按此顺序列出）
const REQUIRED_CONTACT_FIELDS: [&str; 3] = ["name", "email", "message"];

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("email regex")
});

/// E.164 风格：可选 +，首位 1-9，最长 15 位
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("phone regex"));

/// 提交成功响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub message: String,
}

// ==========================================
// ContactNotifier - 外发通知能力边界
// ==========================================
#[async_trait]
pub trait ContactNotifier: Send + Sync {
    /// 把一条已落库的提交转发给机构收件人
    async fn notify(&self, submission: &ContactSubmission) -> anyhow::Result<()>;
}

/// 空实现（未配置外发通道时使用）
pub struct NoopNotifier;

#[async_trait]
impl ContactNotifier for NoopNotifier {
    async fn notify(&self, _submission: &ContactSubmission) -> anyhow::Result<()> {
        Ok(())
    }
}

// ==========================================
// ContactApi
// ==========================================
pub struct ContactApi {
    repo: Arc<dyn ContactRepository>,
    notifier: Arc<dyn ContactNotifier>,
}

impl ContactApi {
    pub fn new(repo: Arc<dyn ContactRepository>, notifier: Arc<dyn ContactNotifier>) -> Self {
        Self { repo, notifier }
    }

    /// 公开提交入口（无鉴权）
    #[instrument(skip(self, input))]
    pub async fn submit(&self, input: ContactInput) -> ApiResult<ContactResponse> {
        let validated = validate_contact_input(input)?;
        let submission = self.repo.insert(validated).await?;

        // 通知失败不影响已提交的记录
        if let Err(e) = self.notifier.notify(&submission).await {
            warn!(id = submission.id, error = %e, "联系表单通知发送失败");
        }

        info!(id = submission.id, "联系表单提交完成");
        Ok(ContactResponse {
            message: "Message sent successfully".to_string(),
        })
    }
}

/// 校验联系表单载荷并整理字段
///
/// 规则与缺失字段消息格式同证书导入的字段校验：
/// 一次遍历收齐所有缺失字段再报错
fn validate_contact_input(input: ContactInput) -> Result<ContactInput, ApiError> {
    let name = input.name.trim().to_string();
    let email = input.email.trim().to_string();
    let message = input.message.trim().to_string();
    let phone = input
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let mut missing = Vec::new();
    for (field, value) in REQUIRED_CONTACT_FIELDS
        .iter()
        .zip([&name, &email, &message])
    {
        if value.is_empty() {
            missing.push(*field);
        }
    }
    if !missing.is_empty() {
        return Err(ApiError::ValidationError(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    if !EMAIL_REGEX.is_match(&email) {
        return Err(ApiError::ValidationError(
            "Invalid email address".to_string(),
        ));
    }

    if let Some(p) = &phone {
        if !PHONE_REGEX.is_match(p) {
            return Err(ApiError::ValidationError(
                "Invalid phone number".to_string(),
            ));
        }
    }

    Ok(ContactInput {
        name,
        email,
        phone,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ContactInput {
        ContactInput {
            name: "Priya Sharma".to_string(),
            email: "priya@example.com".to_string(),
            phone: Some("+919876543210".to_string()),
            message: "Interested in DCA course".to_string(),
        }
    }

    #[test]
    fn test_valid_input_passes_and_trims() {
        let mut raw = input();
        raw.name = "  Priya Sharma  ".to_string();
        let validated = validate_contact_input(raw).unwrap();
        assert_eq!(validated.name, "Priya Sharma");
    }

    #[test]
    fn test_missing_fields_listed_in_one_pass() {
        let raw = ContactInput {
            name: "".to_string(),
            email: "  ".to_string(),
            phone: None,
            message: "".to_string(),
        };
        let err = validate_contact_input(raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: name, email, message"
        );
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut raw = input();
        raw.email = "not-an-email".to_string();
        assert_eq!(
            validate_contact_input(raw).unwrap_err().to_string(),
            "Invalid email address"
        );
    }

    #[test]
    fn test_email_match_is_case_insensitive() {
        let mut raw = input();
        raw.email = "PRIYA@EXAMPLE.COM".to_string();
        assert!(validate_contact_input(raw).is_ok());
    }

    #[test]
    fn test_bad_phone_rejected_but_empty_phone_ok() {
        let mut raw = input();
        raw.phone = Some("0123".to_string());
        assert_eq!(
            validate_contact_input(raw).unwrap_err().to_string(),
            "Invalid phone number"
        );

        let mut raw = input();
        raw.phone = Some("   ".to_string());
        assert_eq!(validate_contact_input(raw).unwrap().phone, None);
    }
}
