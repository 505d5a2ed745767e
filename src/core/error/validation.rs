//! 验证错误类型
//!
//! 涵盖角色名与权限名输入验证相关的错误

use thiserror::Error;

use crate::core::error::codes::{ErrorCode, PublicError, ToPublicError};

/// 验证操作结果类型别名
pub type ValidationResult<T> = Result<T, ValidationError>;

/// 验证相关错误
///
/// 属于可恢复的边界错误，直接带完整细节返回给调用方，不自动重试
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("角色名不能为空")]
    EmptyRoleName,

    /// 一个或多个权限名不在权限目录中
    ///
    /// 携带全部未识别的名称，而不仅是第一个
    #[error("存在未知的权限名: {}", .0.join(", "))]
    UnknownPermissions(Vec<String>),
}

impl ValidationError {
    /// 未识别的权限名列表（其他变体返回空）
    pub fn invalid_names(&self) -> &[String] {
        match self {
            ValidationError::UnknownPermissions(names) => names,
            _ => &[],
        }
    }
}

impl ToPublicError for ValidationError {
    fn to_public_error(&self) -> PublicError {
        PublicError::new(self.to_error_code(), self.to_public_message())
    }

    fn to_error_code(&self) -> ErrorCode {
        match self {
            ValidationError::EmptyRoleName => ErrorCode::InvalidInput,
            ValidationError::UnknownPermissions(_) => ErrorCode::ValidationError,
        }
    }

    fn to_public_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_permissions_message_lists_all_names() {
        let err = ValidationError::UnknownPermissions(vec![
            "bogus:perm".to_string(),
            "fake:perm".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("bogus:perm"));
        assert!(msg.contains("fake:perm"));
        assert_eq!(err.invalid_names().len(), 2);
    }

    #[test]
    fn test_public_error_codes() {
        assert_eq!(
            ValidationError::EmptyRoleName.to_error_code(),
            ErrorCode::InvalidInput
        );
        assert_eq!(
            ValidationError::UnknownPermissions(vec![]).to_error_code(),
            ErrorCode::ValidationError
        );
    }
}
