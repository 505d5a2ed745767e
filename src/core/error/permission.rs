//! 权限错误类型
//!
//! 主体身份已建立但缺少所需权限时的拒绝结果，
//! 属于决策引擎的正常拒绝路径而非异常控制流

use thiserror::Error;

use crate::core::error::codes::{ErrorCode, PublicError, ToPublicError};

/// 权限操作结果类型别名
pub type PermissionResult<T> = Result<T, PermissionError>;

/// 权限相关错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Permission denied: {permission} for role {role}")]
    MissingPermission { role: String, permission: String },

    /// 未分配角色的主体视为持有空权限集
    #[error("Permission denied: {permission} (no role assigned)")]
    NoRoleAssigned { permission: String },

    #[error("Permission denied: only the superadmin role may perform this operation")]
    SuperadminRequired,
}

impl ToPublicError for PermissionError {
    fn to_public_error(&self) -> PublicError {
        PublicError::new(self.to_error_code(), self.to_public_message())
    }

    fn to_error_code(&self) -> ErrorCode {
        ErrorCode::PermissionDenied
    }

    /// 对外只返回通用消息，不泄露角色与权限集信息
    fn to_public_message(&self) -> String {
        self.to_error_code().default_message().to_string()
    }
}
