//! 角色服务 - 业务层
//!
//! 职责：
//! 1. 对外提供角色的创建、查询、更新、删除操作
//! 2. 实现业务规则检查（如删除前的主体引用检查）
//! 3. 记录变更日志
//!
//! 设计原则：
//! - 不直接操作存储事务，通过 RoleStore 完成持久化
//! - 本服务只应由特权管理流程调用，它是角色与权限关联的唯一写入方

use std::sync::Arc;

use crate::api::service::principal::PrincipalDirectory;
use crate::core::error::{AuthzResult, ConflictError, StorageError};
use crate::core::types::{PermissionRecord, Role, RoleId};
use crate::storage::{PermissionCatalog, RoleStore};

/// 角色服务
pub struct RoleService {
    store: RoleStore,
    catalog: PermissionCatalog,
    directory: Arc<dyn PrincipalDirectory>,
}

impl RoleService {
    /// 创建角色服务
    pub fn new(
        store: RoleStore,
        catalog: PermissionCatalog,
        directory: Arc<dyn PrincipalDirectory>,
    ) -> Self {
        Self {
            store,
            catalog,
            directory,
        }
    }

    // ==================== 变更操作 ====================

    /// 创建角色
    pub fn create_role(&self, name: &str, permission_names: &[String]) -> AuthzResult<Role> {
        let role = self.store.create_role(name, permission_names)?;
        log::info!(
            "角色已创建: {} ({}), 权限 {} 个",
            role.name,
            role.id,
            role.permissions.len()
        );
        Ok(role)
    }

    /// 更新角色（名称与权限集均可选；权限集整体替换）
    pub fn update_role(
        &self,
        id: RoleId,
        name: Option<&str>,
        permission_names: Option<&[String]>,
    ) -> AuthzResult<Role> {
        let role = self.store.update_role(id, name, permission_names)?;
        log::info!("角色已更新: {} ({})", role.name, role.id);
        Ok(role)
    }

    /// 删除角色
    ///
    /// 角色必须存在，且当前没有任何主体引用它；删除不影响权限目录
    pub fn delete_role(&self, id: RoleId) -> AuthzResult<()> {
        let role = self.store.get_role(id)?;

        let referencing = self
            .directory
            .count_referencing(id)
            .map_err(|e| {
                log::error!("删除角色 {} 前的主体引用统计失败: {}", role.name, e);
                e
            })?;
        if referencing > 0 {
            return Err(ConflictError::RoleInUse {
                name: role.name,
                referencing,
            }
            .into());
        }

        self.store.delete_role(id)?;
        log::info!("角色已删除: {} ({})", role.name, id);
        Ok(())
    }

    // ==================== 读取操作 ====================

    /// 列出全部角色（读取时富化权限描述）
    pub fn list_roles(&self) -> AuthzResult<Vec<Role>> {
        self.store.list_roles()
    }

    /// 按 ID 查询角色
    pub fn get_role(&self, id: RoleId) -> AuthzResult<Role> {
        self.store.get_role(id)
    }

    /// 按名称顺序列出全部权限
    pub fn list_permissions(&self) -> Result<Vec<PermissionRecord>, StorageError> {
        self.catalog.list_all()
    }
}
