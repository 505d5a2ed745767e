//! 存储层错误类型
//!
//! 涵盖底层数据库与事务机制的意外失败。此类错误在内部带完整上下文记录日志，
//! 对外仅以不透明的内部错误呈现；本核心不做重试，重试策略属于调用方

use thiserror::Error;

use crate::core::error::codes::{ErrorCode, PublicError, ToPublicError};

/// 存储操作结果类型别名
pub type StorageResult<T> = Result<T, StorageError>;

/// 存储层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    DbError(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("存储操作超时: {0}")]
    Timeout(String),
}

impl ToPublicError for StorageError {
    fn to_public_error(&self) -> PublicError {
        PublicError::new(self.to_error_code(), self.to_public_message())
    }

    fn to_error_code(&self) -> ErrorCode {
        match self {
            StorageError::Timeout(_) => ErrorCode::Timeout,
            _ => ErrorCode::InternalError,
        }
    }

    /// 对外只返回通用消息，内部细节经日志记录
    fn to_public_message(&self) -> String {
        self.to_error_code().default_message().to_string()
    }
}
