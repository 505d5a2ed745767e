//! 授权决策引擎 - 业务层
//!
//! 职责：
//! 1. 提供统一的每请求允许/拒绝决策入口
//! 2. 实现业务逻辑判定（superadmin 角色绕过显式权限检查）
//!
//! 设计原则：
//! - 无状态：每次检查独立执行，不持久化任何决策状态
//! - 每次检查对角色存储做一次新鲜读取，不信任令牌携带的角色名提示
//! - 存储故障一律映射为拒绝，绝不失败开放（fail open）
//! - 只读、无锁，可无上限并发调用

use std::sync::Arc;

use crate::api::service::principal::{AuthenticatedPrincipal, PrincipalDirectory};
use crate::core::error::{AuthError, AuthzResult, PermissionError};
use crate::core::types::Role;
use crate::storage::RoleStore;

/// 授权决策引擎
pub struct Authorizer {
    store: RoleStore,
    directory: Arc<dyn PrincipalDirectory>,
}

impl Authorizer {
    /// 创建决策引擎
    pub fn new(store: RoleStore, directory: Arc<dyn PrincipalDirectory>) -> Self {
        Self { store, directory }
    }

    // ==================== 统一决策入口 ====================

    /// 判定主体是否持有所需权限
    ///
    /// 决策流程：
    /// 1. 主体无法解析 -> 拒绝（认证错误）
    /// 2. 重新读取主体的角色（提示仅作观测参考）
    /// 3. 角色名为保留值 superadmin -> 无条件允许
    /// 4. 否则所需权限名在角色权限集中 -> 允许；不在 -> 拒绝（权限错误）
    /// 5. 解析过程中任何意外失败 -> 拒绝（存储错误，记录完整上下文）
    ///
    /// 权限名匹配是精确、大小写敏感的字符串比较；除 superadmin 保留名外
    /// 没有任何层级或通配语义
    pub fn authorize(
        &self,
        principal: &AuthenticatedPrincipal,
        required_permission: &str,
    ) -> AuthzResult<()> {
        let role = self.resolve_role(principal, required_permission)?;

        match role {
            Some(role) if role.is_superadmin() => Ok(()),
            Some(role) => {
                if role.has_permission(required_permission) {
                    Ok(())
                } else {
                    Err(PermissionError::MissingPermission {
                        role: role.name,
                        permission: required_permission.to_string(),
                    }
                    .into())
                }
            }
            // 未分配角色的主体持有空权限集，对任何非空需求均拒绝
            None => Err(PermissionError::NoRoleAssigned {
                permission: required_permission.to_string(),
            }
            .into()),
        }
    }

    /// 判定主体是否持有保留的 superadmin 角色（特权管理流程的前置门禁）
    pub fn require_superadmin(&self, principal: &AuthenticatedPrincipal) -> AuthzResult<()> {
        let role = self.resolve_role(principal, "<superadmin>")?;

        match role {
            Some(role) if role.is_superadmin() => Ok(()),
            _ => Err(PermissionError::SuperadminRequired.into()),
        }
    }

    // ==================== 解析 ====================

    /// 解析主体的角色：目录查找 + 角色存储的新鲜读取
    ///
    /// 主体引用的角色已不存在时视同未分配角色（空权限集），
    /// 外键由外部身份子系统拥有，可能滞后于角色删除
    fn resolve_role(
        &self,
        principal: &AuthenticatedPrincipal,
        required_permission: &str,
    ) -> AuthzResult<Option<Role>> {
        let record = self
            .directory
            .find(principal.principal_id())
            .map_err(|e| {
                log::error!(
                    "权限检查期间主体目录读取失败: principal={}, required={}, err={}",
                    principal.principal_id(),
                    required_permission,
                    e
                );
                e
            })?
            .ok_or_else(|| AuthError::UnknownPrincipal(*principal.principal_id()))?;

        let role_id = match record.role {
            Some(role_id) => role_id,
            None => return Ok(None),
        };

        let role = self.store.find_role(role_id).map_err(|e| {
            log::error!(
                "权限检查期间角色读取失败: principal={}, role={}, required={}, err={}",
                principal.principal_id(),
                role_id,
                required_permission,
                e
            );
            e
        })?;

        if let (Some(hint), Some(resolved)) = (principal.role_name_hint(), role.as_ref()) {
            if hint != resolved.name {
                log::debug!(
                    "角色名提示与存储不一致: hint={}, resolved={}, principal={}",
                    hint,
                    resolved.name,
                    principal.principal_id()
                );
            }
        }

        Ok(role)
    }
}
