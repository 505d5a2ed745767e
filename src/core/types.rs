//! 核心数据类型定义
//!
//! 提供角色、权限、主体的标识符与记录类型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 保留角色名：持有该角色的主体绕过显式权限检查
///
/// 注意：比较是精确的字符串匹配，重命名该角色会使其失去通配权限
pub const SUPERADMIN_ROLE_NAME: &str = "superadmin";

/// A unique identifier for roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(u64);

impl RoleId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A unique identifier for permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionId(u64);

impl PermissionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A unique identifier for principals (owned by the external identity subsystem)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 权限记录 - 能力标识符
///
/// 由外部进程一次性种子写入，运行期只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub id: PermissionId,
    /// 唯一、不可变的命名空间名称，如 "doc:read"
    pub name: String,
    pub description: Option<String>,
}

/// 权限种子定义 - 进程入口点种子写入时使用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDef {
    pub name: String,
    pub description: Option<String>,
}

impl PermissionDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// 角色的持久化记录（权限关联存储在独立的连接表中）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    /// 全局唯一的角色名（已去除首尾空白）
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 读取时富化后的角色视图
///
/// permissions 在读取时与权限目录连接得到描述信息，按名称排序，不落盘
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permissions: Vec<PermissionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// 检查角色是否持有指定权限（精确、大小写敏感匹配）
    pub fn has_permission(&self, permission_name: &str) -> bool {
        self.permissions.iter().any(|p| p.name == permission_name)
    }

    /// 是否为保留的超级管理员角色
    pub fn is_superadmin(&self) -> bool {
        self.name == SUPERADMIN_ROLE_NAME
    }

    /// 角色持有的权限名集合
    pub fn permission_names(&self) -> Vec<&str> {
        self.permissions.iter().map(|p| p.name.as_str()).collect()
    }
}
