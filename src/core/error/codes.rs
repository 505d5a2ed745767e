//! 对外错误码定义
//!
//! 本模块定义标准化的错误码体系，用于：
//! - 客户端响应
//! - API 返回
//! - 协议序列化
//!
//! 错误码格式: XXYY
//! - XX: 错误类别 (00=成功, 02=执行, 03=验证, 04=权限, 05=资源, 09=系统)
//! - YY: 具体错误

use serde::{Deserialize, Serialize};

/// 对外错误码 - 用于客户端响应
///
/// 设计原则：
/// 1. 稳定性：错误码一旦定义不应随意修改，保证客户端兼容性
/// 2. 精简性：只暴露必要的错误信息，不包含内部实现细节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // ==================== 成功 (00xx) ====================
    Success = 0,

    // ==================== 执行错误 (02xx) ====================
    /// 执行超时
    Timeout = 201,
    /// 并发冲突
    Conflict = 203,

    // ==================== 验证错误 (03xx) ====================
    /// 通用验证错误
    ValidationError = 300,
    /// 无效输入
    InvalidInput = 302,
    /// 约束违反
    ConstraintViolation = 303,

    // ==================== 权限错误 (04xx) ====================
    /// 权限不足
    PermissionDenied = 400,
    /// 未认证
    Unauthorized = 401,

    // ==================== 资源错误 (05xx) ====================
    /// 资源未找到
    ResourceNotFound = 500,
    /// 资源已存在
    ResourceAlreadyExists = 501,

    // ==================== 系统错误 (09xx) ====================
    /// 内部服务器错误
    InternalError = 900,
    /// 服务不可用
    ServiceUnavailable = 901,
}

impl ErrorCode {
    /// 获取错误码的 i32 值
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// 根据 i32 值获取错误码
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(ErrorCode::Success),
            201 => Some(ErrorCode::Timeout),
            203 => Some(ErrorCode::Conflict),
            300 => Some(ErrorCode::ValidationError),
            302 => Some(ErrorCode::InvalidInput),
            303 => Some(ErrorCode::ConstraintViolation),
            400 => Some(ErrorCode::PermissionDenied),
            401 => Some(ErrorCode::Unauthorized),
            500 => Some(ErrorCode::ResourceNotFound),
            501 => Some(ErrorCode::ResourceAlreadyExists),
            900 => Some(ErrorCode::InternalError),
            901 => Some(ErrorCode::ServiceUnavailable),
            _ => None,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self.as_i32() {
            0 => ErrorCategory::Success,
            200..=299 => ErrorCategory::Execution,
            300..=399 => ErrorCategory::Validation,
            400..=499 => ErrorCategory::Permission,
            500..=599 => ErrorCategory::Resource,
            900..=999 => ErrorCategory::System,
            _ => ErrorCategory::Unknown,
        }
    }

    /// 获取默认的错误消息
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "成功",
            ErrorCode::Timeout => "执行超时",
            ErrorCode::Conflict => "并发冲突",
            ErrorCode::ValidationError => "验证错误",
            ErrorCode::InvalidInput => "无效输入",
            ErrorCode::ConstraintViolation => "约束违反",
            ErrorCode::PermissionDenied => "权限不足",
            ErrorCode::Unauthorized => "未认证",
            ErrorCode::ResourceNotFound => "资源未找到",
            ErrorCode::ResourceAlreadyExists => "资源已存在",
            ErrorCode::InternalError => "内部服务器错误",
            ErrorCode::ServiceUnavailable => "服务不可用",
        }
    }

    /// 判断是否为成功状态
    pub fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// 判断是否为客户端错误 (4xx 类错误)
    pub fn is_client_error(&self) -> bool {
        let code = self.as_i32();
        (200..=499).contains(&code)
    }

    /// 判断是否为服务器错误 (5xx/9xx 类错误)
    pub fn is_server_error(&self) -> bool {
        let code = self.as_i32();
        (900..=999).contains(&code)
    }

    /// 判断错误是否可重试
    ///
    /// 本核心内部不做重试，重试策略属于调用方
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::Timeout | ErrorCode::Conflict | ErrorCode::ServiceUnavailable
        )
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Success
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_i32(), self.default_message())
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Success,
    Execution,
    Validation,
    Permission,
    Resource,
    System,
    Unknown,
}

impl ErrorCategory {
    /// 获取类别的 HTTP 状态码映射
    pub fn to_http_status(&self) -> u16 {
        match self {
            ErrorCategory::Success => 200,
            ErrorCategory::Execution => 409,
            ErrorCategory::Validation => 422,
            ErrorCategory::Permission => 403,
            ErrorCategory::Resource => 404,
            ErrorCategory::System => 500,
            ErrorCategory::Unknown => 500,
        }
    }
}

/// 对外错误信息 - 用于序列化到响应中
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicError {
    /// 错误码
    pub code: ErrorCode,
    /// 错误消息
    pub message: String,
}

impl PublicError {
    /// 创建新的对外错误
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 使用默认消息创建错误
    pub fn with_default_message(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
        }
    }
}

/// 内部错误到对外错误的转换 trait
///
/// 实现此 trait 可以将内部错误转换为对外错误，过滤敏感信息
pub trait ToPublicError {
    /// 转换为对外错误
    fn to_public_error(&self) -> PublicError;

    /// 获取对外错误码
    fn to_error_code(&self) -> ErrorCode;

    /// 获取对外错误消息（过滤敏感信息）
    fn to_public_message(&self) -> String;
}
