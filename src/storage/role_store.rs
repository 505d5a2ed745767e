//! 角色存储
//!
//! 持久化的角色记录及其与权限目录的规范化多对多关联。
//! 每个变更操作是一个独立的 Redb 写事务：开始 -> 校验 -> 写入 -> 提交；
//! 任何错误路径提前返回即丢弃事务，未提交的写事务在丢弃时回滚，
//! 因此所有失败都不产生部分写入。
//!
//! 应用层的名称预检查只是建议性的；名称索引表在同一个独占写事务内的
//! 插入才是真正的唯一约束，权限名校验与关联写入同属一个事务

use chrono::Utc;
use redb::{Database, ReadableTable};
use std::sync::Arc;

use crate::core::error::{
    AuthzResult, ConflictError, NotFoundError, StorageError, ValidationError,
};
use crate::core::types::{PermissionRecord, Role, RoleId, RoleRecord, SUPERADMIN_ROLE_NAME};
use crate::storage::catalog::validate_names_in_table;
use crate::storage::redb_types::{
    ByteKey, ID_COUNTER_TABLE, PERMISSIONS_TABLE, ROLES_TABLE, ROLE_ID_COUNTER_KEY,
    ROLE_NAMES_TABLE, ROLE_PERMISSIONS_TABLE,
};
use crate::storage::{deserialize_record, next_counter_id, serialize_record};

/// 角色存储 - 持久化层
///
/// 数据库句柄在构造时注入，生命周期归进程入口点所有
#[derive(Clone)]
pub struct RoleStore {
    db: Arc<Database>,
}

impl RoleStore {
    /// 创建角色存储，确保底层表存在
    pub fn new(db: Arc<Database>) -> Result<Self, StorageError> {
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        {
            write_txn
                .open_table(ROLES_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            write_txn
                .open_table(ROLE_NAMES_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            write_txn
                .open_table(ROLE_PERMISSIONS_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            write_txn
                .open_table(PERMISSIONS_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            write_txn
                .open_table(ID_COUNTER_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        Ok(Self { db })
    }

    // ==================== 键编码 ====================

    fn encode_role_key(id: RoleId) -> ByteKey {
        ByteKey(id.as_u64().to_be_bytes().to_vec())
    }

    fn encode_name_key(name: &str) -> ByteKey {
        ByteKey(name.as_bytes().to_vec())
    }

    /// 连接表键：角色ID（8字节大端）+ b':' + 权限名
    fn encode_join_key(id: RoleId, permission_name: &str) -> ByteKey {
        let mut key = id.as_u64().to_be_bytes().to_vec();
        key.push(b':');
        key.extend_from_slice(permission_name.as_bytes());
        ByteKey(key)
    }

    fn join_prefix(id: RoleId) -> Vec<u8> {
        let mut prefix = id.as_u64().to_be_bytes().to_vec();
        prefix.push(b':');
        prefix
    }

    // ==================== 变更操作 ====================

    /// 创建角色
    ///
    /// 名称去除首尾空白后不得为空；所有权限名必须存在于目录中。
    /// 失败时（验证失败或名称冲突）不产生任何持久化效果
    pub fn create_role(&self, name: &str, permission_names: &[String]) -> AuthzResult<Role> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyRoleName.into());
        }

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        let role;
        {
            let mut roles = write_txn
                .open_table(ROLES_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            let mut role_names = write_txn
                .open_table(ROLE_NAMES_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            let mut joins = write_txn
                .open_table(ROLE_PERMISSIONS_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            let mut counters = write_txn
                .open_table(ID_COUNTER_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            let permissions = write_txn
                .open_table(PERMISSIONS_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;

            let name_key = Self::encode_name_key(trimmed);
            if role_names
                .get(&name_key)
                .map_err(|e| StorageError::DbError(e.to_string()))?
                .is_some()
            {
                return Err(ConflictError::RoleNameTaken(trimmed.to_string()).into());
            }

            let valid_names = validate_names_in_table(&permissions, permission_names)?;

            let id = RoleId::new(next_counter_id(&mut counters, ROLE_ID_COUNTER_KEY)?);
            let now = Utc::now();
            let record = RoleRecord {
                id,
                name: trimmed.to_string(),
                created_at: now,
                updated_at: now,
            };

            // 名称索引插入即唯一约束：返回旧值说明名称已被并发占用
            let previous = role_names
                .insert(&name_key, ByteKey(id.as_u64().to_be_bytes().to_vec()))
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            if previous.is_some() {
                return Err(ConflictError::RoleNameTaken(trimmed.to_string()).into());
            }

            roles
                .insert(
                    Self::encode_role_key(id),
                    ByteKey(serialize_record(&record)?),
                )
                .map_err(|e| StorageError::DbError(e.to_string()))?;

            for permission_name in &valid_names {
                joins
                    .insert(Self::encode_join_key(id, permission_name), ByteKey(Vec::new()))
                    .map_err(|e| StorageError::DbError(e.to_string()))?;
            }

            role = enrich_role(&record, &joins, &permissions)?;
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        Ok(role)
    }

    /// 更新角色
    ///
    /// 在同一个写事务内加载现有记录（防止与并发删除产生丢失更新）。
    /// 提供新名称且与当前不同时重新校验唯一性；提供权限名列表时
    /// 整体替换原有权限集（空列表即清空），不做合并
    pub fn update_role(
        &self,
        id: RoleId,
        new_name: Option<&str>,
        permission_names: Option<&[String]>,
    ) -> AuthzResult<Role> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        let role;
        {
            let mut roles = write_txn
                .open_table(ROLES_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            let mut role_names = write_txn
                .open_table(ROLE_NAMES_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            let mut joins = write_txn
                .open_table(ROLE_PERMISSIONS_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            let permissions = write_txn
                .open_table(PERMISSIONS_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;

            let role_key = Self::encode_role_key(id);
            let mut record: RoleRecord = match roles
                .get(&role_key)
                .map_err(|e| StorageError::DbError(e.to_string()))?
            {
                Some(value) => deserialize_record(&value.value().0)?,
                None => return Err(NotFoundError::Role(id).into()),
            };

            if let Some(name) = new_name {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::EmptyRoleName.into());
                }

                if trimmed != record.name {
                    // 只在名称实际变化时检查占用，占用者必然是其他角色
                    let new_key = Self::encode_name_key(trimmed);
                    if role_names
                        .get(&new_key)
                        .map_err(|e| StorageError::DbError(e.to_string()))?
                        .is_some()
                    {
                        return Err(ConflictError::RoleNameTaken(trimmed.to_string()).into());
                    }

                    if record.name == SUPERADMIN_ROLE_NAME {
                        log::warn!(
                            "角色 {} 重命名为 {}，该角色将失去超级管理员通配权限",
                            record.name,
                            trimmed
                        );
                    } else if trimmed == SUPERADMIN_ROLE_NAME {
                        log::warn!(
                            "角色 {} 重命名为保留名 {}，该角色将获得超级管理员通配权限",
                            record.name,
                            trimmed
                        );
                    }

                    role_names
                        .remove(Self::encode_name_key(&record.name))
                        .map_err(|e| StorageError::DbError(e.to_string()))?;
                    let previous = role_names
                        .insert(&new_key, ByteKey(id.as_u64().to_be_bytes().to_vec()))
                        .map_err(|e| StorageError::DbError(e.to_string()))?;
                    if previous.is_some() {
                        return Err(ConflictError::RoleNameTaken(trimmed.to_string()).into());
                    }

                    record.name = trimmed.to_string();
                }
            }

            if let Some(names) = permission_names {
                let valid_names = validate_names_in_table(&permissions, names)?;

                // 整体替换：先删除全部现有关联，再写入新集合
                let existing = collect_join_keys(&joins, &Self::join_prefix(id))?;
                for key in existing {
                    joins
                        .remove(key)
                        .map_err(|e| StorageError::DbError(e.to_string()))?;
                }
                for permission_name in &valid_names {
                    joins
                        .insert(Self::encode_join_key(id, permission_name), ByteKey(Vec::new()))
                        .map_err(|e| StorageError::DbError(e.to_string()))?;
                }
            }

            record.updated_at = Utc::now();
            roles
                .insert(&role_key, ByteKey(serialize_record(&record)?))
                .map_err(|e| StorageError::DbError(e.to_string()))?;

            role = enrich_role(&record, &joins, &permissions)?;
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        Ok(role)
    }

    /// 删除角色及其全部权限关联（原子操作），不影响权限目录
    ///
    /// 主体引用检查由上层的角色服务在调用前完成
    pub fn delete_role(&self, id: RoleId) -> AuthzResult<()> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        {
            let mut roles = write_txn
                .open_table(ROLES_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            let mut role_names = write_txn
                .open_table(ROLE_NAMES_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            let mut joins = write_txn
                .open_table(ROLE_PERMISSIONS_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;

            let record: RoleRecord = match roles
                .remove(Self::encode_role_key(id))
                .map_err(|e| StorageError::DbError(e.to_string()))?
            {
                Some(value) => deserialize_record(&value.value().0)?,
                None => return Err(NotFoundError::Role(id).into()),
            };

            role_names
                .remove(Self::encode_name_key(&record.name))
                .map_err(|e| StorageError::DbError(e.to_string()))?;

            let existing = collect_join_keys(&joins, &Self::join_prefix(id))?;
            for key in existing {
                joins
                    .remove(key)
                    .map_err(|e| StorageError::DbError(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        Ok(())
    }

    // ==================== 读取操作 ====================

    /// 按 ID 查询角色，读取时富化权限描述；不存在返回 None
    pub fn find_role(&self, id: RoleId) -> AuthzResult<Option<Role>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let roles = read_txn
            .open_table(ROLES_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let joins = read_txn
            .open_table(ROLE_PERMISSIONS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let permissions = read_txn
            .open_table(PERMISSIONS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        match roles
            .get(Self::encode_role_key(id))
            .map_err(|e| StorageError::DbError(e.to_string()))?
        {
            Some(value) => {
                let record: RoleRecord = deserialize_record(&value.value().0)?;
                Ok(Some(enrich_role(&record, &joins, &permissions)?))
            }
            None => Ok(None),
        }
    }

    /// 按 ID 查询角色，不存在则返回 NotFound
    pub fn get_role(&self, id: RoleId) -> AuthzResult<Role> {
        self.find_role(id)?
            .ok_or_else(|| NotFoundError::Role(id).into())
    }

    /// 按名称查询角色 ID
    pub fn find_role_id_by_name(&self, name: &str) -> AuthzResult<Option<RoleId>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let role_names = read_txn
            .open_table(ROLE_NAMES_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        match role_names
            .get(Self::encode_name_key(name.trim()))
            .map_err(|e| StorageError::DbError(e.to_string()))?
        {
            Some(value) => Ok(Some(RoleId::new(crate::storage::decode_u64(
                &value.value().0,
            )?))),
            None => Ok(None),
        }
    }

    /// 列出全部角色，读取时逐个富化权限描述
    ///
    /// 整个列表在同一个读快照内构建，无变更时两次调用结果一致
    pub fn list_roles(&self) -> AuthzResult<Vec<Role>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let roles = read_txn
            .open_table(ROLES_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let joins = read_txn
            .open_table(ROLE_PERMISSIONS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let permissions = read_txn
            .open_table(PERMISSIONS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        let mut result = Vec::new();
        let iter = roles
            .iter()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        for item in iter {
            let (_key, value) = item.map_err(|e| StorageError::DbError(e.to_string()))?;
            let record: RoleRecord = deserialize_record(&value.value().0)?;
            result.push(enrich_role(&record, &joins, &permissions)?);
        }

        Ok(result)
    }
}

impl std::fmt::Debug for RoleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleStore").finish()
    }
}

/// 收集指定前缀下的全部连接表键
fn collect_join_keys<T: ReadableTable<ByteKey, ByteKey>>(
    joins: &T,
    prefix: &[u8],
) -> AuthzResult<Vec<ByteKey>> {
    let mut keys = Vec::new();
    let iter = joins
        .iter()
        .map_err(|e| StorageError::DbError(e.to_string()))?;
    for item in iter {
        let (key, _value) = item.map_err(|e| StorageError::DbError(e.to_string()))?;
        let key_bytes = key.value().0;
        if key_bytes.starts_with(prefix) {
            keys.push(ByteKey(key_bytes));
        }
    }
    Ok(keys)
}

/// 读取时富化：用权限目录中的描述补全角色的权限集（按名称排序，不落盘）
fn enrich_role<T1, T2>(record: &RoleRecord, joins: &T1, permissions: &T2) -> AuthzResult<Role>
where
    T1: ReadableTable<ByteKey, ByteKey>,
    T2: ReadableTable<ByteKey, ByteKey>,
{
    let prefix = {
        let mut p = record.id.as_u64().to_be_bytes().to_vec();
        p.push(b':');
        p
    };

    let mut enriched: Vec<PermissionRecord> = Vec::new();
    let iter = joins
        .iter()
        .map_err(|e| StorageError::DbError(e.to_string()))?;
    for item in iter {
        let (key, _value) = item.map_err(|e| StorageError::DbError(e.to_string()))?;
        let key_bytes = key.value().0;
        if !key_bytes.starts_with(&prefix) {
            continue;
        }
        let name_bytes = &key_bytes[prefix.len()..];
        let permission_name = std::str::from_utf8(name_bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        match permissions
            .get(ByteKey(permission_name.as_bytes().to_vec()))
            .map_err(|e| StorageError::DbError(e.to_string()))?
        {
            Some(value) => enriched.push(deserialize_record(&value.value().0)?),
            // 目录条目永不删除，缺失说明存储损坏
            None => {
                return Err(StorageError::DbError(format!(
                    "角色 {} 引用的权限在目录中缺失: {}",
                    record.name, permission_name
                ))
                .into())
            }
        }
    }
    enriched.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Role {
        id: record.id,
        name: record.name.clone(),
        permissions: enriched,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}
