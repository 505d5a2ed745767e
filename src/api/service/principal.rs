//! 主体（Principal）相关类型
//!
//! 主体的创建、认证与存储属于外部身份子系统；本核心只读取主体到角色的
//! 外键引用以计算有效权限集。已认证的主体身份以不可变值的形式沿调用链
//! 显式传递，而不是附着在可变的请求对象上

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::StorageResult;
use crate::core::types::{PrincipalId, RoleId};

/// 已认证的主体身份 - 不可变的上下文值
///
/// 由外部认证协作方（令牌校验）产生。role_name_hint 仅供观测参考，
/// 决策引擎永不信任它，总是重新读取角色存储
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    principal_id: PrincipalId,
    role_name_hint: Option<String>,
}

impl AuthenticatedPrincipal {
    pub fn new(principal_id: PrincipalId) -> Self {
        Self {
            principal_id,
            role_name_hint: None,
        }
    }

    pub fn with_role_name_hint(mut self, hint: impl Into<String>) -> Self {
        self.role_name_hint = Some(hint.into());
        self
    }

    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal_id
    }

    pub fn role_name_hint(&self) -> Option<&str> {
        self.role_name_hint.as_deref()
    }
}

/// 主体记录 - 至多引用一个角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrincipalRecord {
    pub id: PrincipalId,
    pub role: Option<RoleId>,
}

/// 主体目录 trait - 身份子系统拥有的主体到角色外键数据的只读接口
pub trait PrincipalDirectory: Send + Sync {
    /// 按标识查找主体记录
    fn find(&self, id: &PrincipalId) -> StorageResult<Option<PrincipalRecord>>;

    /// 统计当前引用指定角色的主体数量（角色删除前的在用检查）
    fn count_referencing(&self, role: RoleId) -> StorageResult<usize>;
}

/// 内存主体目录
///
/// 供嵌入方和测试使用；生产部署中由身份子系统提供自己的实现
#[derive(Default)]
pub struct MemoryPrincipalDirectory {
    /// 主体到角色引用的映射：principal_id -> Option<role_id>
    principals: Arc<RwLock<HashMap<PrincipalId, Option<RoleId>>>>,
}

impl MemoryPrincipalDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== 维护操作（身份子系统侧） ====================

    /// 登记主体（未分配角色）
    pub fn register(&self, id: PrincipalId) {
        let mut principals = self.principals.write();
        principals.entry(id).or_insert(None);
    }

    /// 为主体分配角色（None 表示取消分配）
    pub fn assign_role(&self, id: PrincipalId, role: Option<RoleId>) {
        let mut principals = self.principals.write();
        principals.insert(id, role);
    }

    /// 移除主体
    pub fn remove(&self, id: &PrincipalId) {
        let mut principals = self.principals.write();
        principals.remove(id);
    }
}

impl PrincipalDirectory for MemoryPrincipalDirectory {
    fn find(&self, id: &PrincipalId) -> StorageResult<Option<PrincipalRecord>> {
        let principals = self.principals.read();
        Ok(principals
            .get(id)
            .map(|role| PrincipalRecord { id: *id, role: *role }))
    }

    fn count_referencing(&self, role: RoleId) -> StorageResult<usize> {
        let principals = self.principals.read();
        Ok(principals
            .values()
            .filter(|r| **r == Some(role))
            .count())
    }
}
