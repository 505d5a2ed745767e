//! 角色变更错误类型
//!
//! 涵盖角色创建、更新、删除过程中的冲突与缺失错误

use thiserror::Error;

use crate::core::error::codes::{ErrorCode, PublicError, ToPublicError};
use crate::core::types::RoleId;

/// 冲突操作结果类型别名
pub type ConflictResult<T> = Result<T, ConflictError>;

/// 冲突相关错误
///
/// 应用层的预检查只是建议性的，存储层约束在提交时捕获并转换为此类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    #[error("角色名已被占用: {0}")]
    RoleNameTaken(String),

    #[error("角色 {name} 正在被 {referencing} 个主体引用，无法删除")]
    RoleInUse { name: String, referencing: usize },
}

impl ToPublicError for ConflictError {
    fn to_public_error(&self) -> PublicError {
        PublicError::new(self.to_error_code(), self.to_public_message())
    }

    fn to_error_code(&self) -> ErrorCode {
        match self {
            ConflictError::RoleNameTaken(_) => ErrorCode::ResourceAlreadyExists,
            ConflictError::RoleInUse { .. } => ErrorCode::Conflict,
        }
    }

    fn to_public_message(&self) -> String {
        self.to_string()
    }
}

/// 未找到相关错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("角色不存在: {0}")]
    Role(RoleId),

    #[error("权限不存在: {0}")]
    Permission(String),
}

impl ToPublicError for NotFoundError {
    fn to_public_error(&self) -> PublicError {
        PublicError::new(self.to_error_code(), self.to_public_message())
    }

    fn to_error_code(&self) -> ErrorCode {
        ErrorCode::ResourceNotFound
    }

    fn to_public_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_error_messages() {
        let err = ConflictError::RoleNameTaken("Editor".to_string());
        assert!(err.to_string().contains("Editor"));

        let err = ConflictError::RoleInUse {
            name: "Editor".to_string(),
            referencing: 3,
        };
        assert!(err.to_string().contains("Editor"));
        assert!(err.to_string().contains('3'));
        assert_eq!(err.to_error_code(), ErrorCode::Conflict);
    }

    #[test]
    fn test_not_found_error_codes() {
        let err = NotFoundError::Role(RoleId::new(7));
        assert_eq!(err.to_error_code(), ErrorCode::ResourceNotFound);
        assert!(err.to_string().contains("r7"));
    }
}
