//! 统一错误处理系统 for AuthCore
//!
//! ## 设计理念
//!
//! 1. **按域划分**：验证、冲突、缺失、认证、权限、存储各自独立成枚举，
//!    便于调用方精确匹配可恢复的边界错误
//! 2. **分层转换**：各域错误使用 `#[from]` 注解自动汇入统一错误类型，
//!    保留完整错误信息
//! 3. **统一接口**：`AuthzResult<T>` 提供统一的返回类型，简化错误传播

use thiserror::Error;

// 子模块
pub mod auth;
pub mod codes;
pub mod permission;
pub mod role;
pub mod storage;
pub mod validation;

// 重新导出错误码
pub use codes::{ErrorCode, ErrorCategory, PublicError, ToPublicError};

// 重新导出所有错误类型
pub use auth::{AuthError, AuthResult};
pub use permission::{PermissionError, PermissionResult};
pub use role::{ConflictError, ConflictResult, NotFoundError};
pub use storage::{StorageError, StorageResult};
pub use validation::{ValidationError, ValidationResult};

/// 统一的授权核心错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("验证错误: {0}")]
    Validation(#[from] ValidationError),

    #[error("冲突错误: {0}")]
    Conflict(#[from] ConflictError),

    #[error("未找到: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),

    #[error("权限错误: {0}")]
    Permission(#[from] PermissionError),

    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
}

/// 统一的结果类型
pub type AuthzResult<T> = Result<T, AuthzError>;

impl ToPublicError for AuthzError {
    fn to_public_error(&self) -> PublicError {
        PublicError::new(self.to_error_code(), self.to_public_message())
    }

    fn to_error_code(&self) -> ErrorCode {
        match self {
            AuthzError::Validation(e) => e.to_error_code(),
            AuthzError::Conflict(e) => e.to_error_code(),
            AuthzError::NotFound(e) => e.to_error_code(),
            AuthzError::Auth(e) => e.to_error_code(),
            AuthzError::Permission(e) => e.to_error_code(),
            AuthzError::Storage(e) => e.to_error_code(),
        }
    }

    fn to_public_message(&self) -> String {
        match self {
            AuthzError::Validation(e) => e.to_public_message(),
            AuthzError::Conflict(e) => e.to_public_message(),
            AuthzError::NotFound(e) => e.to_public_message(),
            AuthzError::Auth(e) => e.to_public_message(),
            AuthzError::Permission(e) => e.to_public_message(),
            AuthzError::Storage(e) => e.to_public_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RoleId;

    #[test]
    fn test_from_conversions() {
        let err: AuthzError = ValidationError::EmptyRoleName.into();
        assert!(matches!(err, AuthzError::Validation(_)));

        let err: AuthzError = NotFoundError::Role(RoleId::new(1)).into();
        assert!(matches!(err, AuthzError::NotFound(_)));

        let err: AuthzError = StorageError::DbError("io".to_string()).into();
        assert!(matches!(err, AuthzError::Storage(_)));
    }

    #[test]
    fn test_public_error_delegation() {
        let err: AuthzError = ConflictError::RoleNameTaken("Editor".to_string()).into();
        assert_eq!(err.to_error_code(), ErrorCode::ResourceAlreadyExists);

        // 存储错误对外不透明
        let err: AuthzError = StorageError::DbError("detail".to_string()).into();
        assert!(!err.to_public_message().contains("detail"));
    }
}
