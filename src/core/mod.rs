pub mod error;
pub mod types;

// 错误和结果类型
pub use error::{
    AuthError, AuthResult, AuthzError, AuthzResult, ConflictError, ErrorCode, NotFoundError,
    PermissionError, PermissionResult, PublicError, StorageError, StorageResult, ToPublicError,
    ValidationError, ValidationResult,
};

// 核心数据类型
pub use types::{
    PermissionDef, PermissionId, PermissionRecord, PrincipalId, Role, RoleId, RoleRecord,
    SUPERADMIN_ROLE_NAME,
};
