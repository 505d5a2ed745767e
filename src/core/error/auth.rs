//! 认证错误类型
//!
//! 主体身份无法建立时的拒绝结果，属于决策引擎的正常拒绝路径

use thiserror::Error;

use crate::core::error::codes::{ErrorCode, PublicError, ToPublicError};
use crate::core::types::PrincipalId;

/// 认证操作结果类型别名
pub type AuthResult<T> = Result<T, AuthError>;

/// 认证相关错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("主体不存在: {0}")]
    UnknownPrincipal(PrincipalId),
}

impl ToPublicError for AuthError {
    fn to_public_error(&self) -> PublicError {
        PublicError::new(self.to_error_code(), self.to_public_message())
    }

    fn to_error_code(&self) -> ErrorCode {
        ErrorCode::Unauthorized
    }

    /// 对外只返回通用消息，不泄露主体标识等内部状态
    fn to_public_message(&self) -> String {
        self.to_error_code().default_message().to_string()
    }
}
