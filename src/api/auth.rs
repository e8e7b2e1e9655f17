// ==========================================
// 培训机构门户后台 - 管理端鉴权
// ==========================================
// 职责: Bearer token 解析与管理员角色校验
// 边界: token 的签发/验签由 TokenVerifier 实现方负责，
//       本模块只定义能力边界与 401 语义
// ==========================================

use thiserror::Error;

/// 管理员角色名
pub const ADMIN_ROLE: &str = "admin";

/// 已验签 token 携带的声明
#[derive(Debug, Clone)]
pub struct AdminClaims {
    /// 用户标识
    pub subject: String,
    /// 角色（"admin" 才能访问后台接口）
    pub role: String,
}

/// 鉴权错误
/// Display 文本即对外 401 响应的 error 字段
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Admin access required")]
    AdminRequired,
}

// ==========================================
// TokenVerifier - token 验签能力边界
// ==========================================
pub trait TokenVerifier: Send + Sync {
    /// 验签 token，返回其声明；无效时返回 None
    fn verify(&self, token: &str) -> Option<AdminClaims>;
}

/// 校验 Authorization 头并要求管理员角色
///
/// # 参数
/// - verifier: token 验签实现
/// - authorization: Authorization 头原文（可空）
///
/// # 返回
/// - Ok(AdminClaims): 管理员声明
/// - Err(AuthError): 缺 token / 无效 token / 非管理员
pub fn require_admin(
    verifier: &dyn TokenVerifier,
    authorization: Option<&str>,
) -> Result<AdminClaims, AuthError> {
    let header = authorization.unwrap_or("").trim();
    if header.is_empty() {
        return Err(AuthError::MissingToken);
    }

    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    let claims = verifier.verify(token).ok_or(AuthError::InvalidToken)?;
    if claims.role != ADMIN_ROLE {
        return Err(AuthError::AdminRequired);
    }
    Ok(claims)
}
