//! 权限目录
//!
//! 不可变、可查询的有效能力标识符全集。由外部进程一次性种子写入，
//! 运行期内本核心只读，角色变更器永不修改或删除目录条目

use redb::{Database, ReadableTable};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::error::{AuthzResult, StorageError, StorageResult, ValidationError};
use crate::core::types::{PermissionDef, PermissionId, PermissionRecord};
use crate::storage::redb_types::{
    ByteKey, ID_COUNTER_TABLE, PERMISSIONS_TABLE, PERMISSION_ID_COUNTER_KEY,
};
use crate::storage::{deserialize_record, next_counter_id, serialize_record};

/// 权限目录 - 只读查询层
///
/// 数据库句柄在构造时注入，与角色存储共享同一个数据库
#[derive(Clone)]
pub struct PermissionCatalog {
    db: Arc<Database>,
}

impl PermissionCatalog {
    /// 创建权限目录，确保底层表存在
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        {
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

    /// 校验候选权限名集合
    ///
    /// 当且仅当所有名称都存在于目录中时返回该集合；任何名称未知则失败，
    /// 错误中枚举全部未识别的名称而不仅是第一个。
    /// 空输入返回空集合（创建无权限的角色是合法的）
    pub fn validate_names(&self, names: &[String]) -> AuthzResult<BTreeSet<String>> {
        if names.is_empty() {
            return Ok(BTreeSet::new());
        }

        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let table = read_txn
            .open_table(PERMISSIONS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        validate_names_in_table(&table, names)
    }

    /// 按名称顺序返回全部权限，用于确定性的界面列表
    pub fn list_all(&self) -> StorageResult<Vec<PermissionRecord>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let table = read_txn
            .open_table(PERMISSIONS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        let mut records = Vec::new();
        let iter = table
            .iter()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        // 表以名称为键，迭代顺序即名称顺序
        for item in iter {
            let (_key, value) = item.map_err(|e| StorageError::DbError(e.to_string()))?;
            records.push(deserialize_record(&value.value().0)?);
        }

        Ok(records)
    }

    /// 按名称查询单个权限
    pub fn get(&self, name: &str) -> StorageResult<Option<PermissionRecord>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let table = read_txn
            .open_table(PERMISSIONS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        match table
            .get(ByteKey(name.as_bytes().to_vec()))
            .map_err(|e| StorageError::DbError(e.to_string()))?
        {
            Some(value) => Ok(Some(deserialize_record(&value.value().0)?)),
            None => Ok(None),
        }
    }

    /// 种子写入权限定义（幂等：已存在的名称跳过）
    ///
    /// 仅供进程入口点的外部种子流程调用，不属于运行期变更面。
    /// 返回本次实际写入的数量
    pub fn seed_permissions(&self, defs: &[PermissionDef]) -> StorageResult<usize> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        let mut inserted = 0;
        {
            let mut table = write_txn
                .open_table(PERMISSIONS_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            let mut counters = write_txn
                .open_table(ID_COUNTER_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;

            for def in defs {
                let key = ByteKey(def.name.as_bytes().to_vec());
                let exists = table
                    .get(&key)
                    .map_err(|e| StorageError::DbError(e.to_string()))?
                    .is_some();
                if exists {
                    continue;
                }

                let id = next_counter_id(&mut counters, PERMISSION_ID_COUNTER_KEY)?;
                let record = PermissionRecord {
                    id: PermissionId::new(id),
                    name: def.name.clone(),
                    description: def.description.clone(),
                };
                table
                    .insert(&key, ByteKey(serialize_record(&record)?))
                    .map_err(|e| StorageError::DbError(e.to_string()))?;
                inserted += 1;
            }
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        if inserted > 0 {
            log::info!("权限目录种子写入完成: 新增 {} 条", inserted);
        }
        Ok(inserted)
    }
}

impl std::fmt::Debug for PermissionCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionCatalog").finish()
    }
}

/// 在已打开的权限表上校验名称集合
///
/// 供变更器在写事务内复用，保证引用的权限名在提交时刻存在于目录中
pub(crate) fn validate_names_in_table<T: ReadableTable<ByteKey, ByteKey>>(
    table: &T,
    names: &[String],
) -> AuthzResult<BTreeSet<String>> {
    let mut valid = BTreeSet::new();
    let mut unknown = Vec::new();

    for name in names {
        let exists = table
            .get(ByteKey(name.as_bytes().to_vec()))
            .map_err(|e| StorageError::DbError(e.to_string()))?
            .is_some();
        if exists {
            valid.insert(name.clone());
        } else if !unknown.contains(name) {
            unknown.push(name.clone());
        }
    }

    if unknown.is_empty() {
        Ok(valid)
    } else {
        unknown.sort();
        Err(ValidationError::UnknownPermissions(unknown).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AuthzError;
    use tempfile::TempDir;

    fn open_catalog(dir: &TempDir) -> PermissionCatalog {
        let db = Database::create(dir.path().join("test.db"))
            .expect("Failed to create database");
        PermissionCatalog::new(Arc::new(db)).expect("Failed to create catalog")
    }

    fn seed_docs(catalog: &PermissionCatalog) {
        catalog
            .seed_permissions(&[
                PermissionDef::new("doc:read").with_description("Read documents"),
                PermissionDef::new("doc:write").with_description("Write documents"),
                PermissionDef::new("doc:delete"),
            ])
            .expect("Failed to seed permissions");
    }

    #[test]
    fn test_seed_is_idempotent() {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let catalog = open_catalog(&dir);

        seed_docs(&catalog);
        let second = catalog
            .seed_permissions(&[PermissionDef::new("doc:read")])
            .expect("Failed to re-seed permissions");
        // 已存在的名称跳过
        assert_eq!(second, 0);
        assert_eq!(catalog.list_all().expect("Failed to list").len(), 3);
    }

    #[test]
    fn test_list_all_ordered_by_name() {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let catalog = open_catalog(&dir);
        catalog
            .seed_permissions(&[
                PermissionDef::new("task:create"),
                PermissionDef::new("doc:read"),
                PermissionDef::new("leave:approve"),
            ])
            .expect("Failed to seed permissions");

        let names: Vec<String> = catalog
            .list_all()
            .expect("Failed to list")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["doc:read", "leave:approve", "task:create"]);
    }

    #[test]
    fn test_validate_names_all_known() {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let catalog = open_catalog(&dir);
        seed_docs(&catalog);

        let valid = catalog
            .validate_names(&["doc:read".to_string(), "doc:write".to_string()])
            .expect("Failed to validate");
        assert_eq!(valid.len(), 2);
        assert!(valid.contains("doc:read"));
    }

    #[test]
    fn test_validate_names_reports_every_unknown_name() {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let catalog = open_catalog(&dir);
        seed_docs(&catalog);

        let err = catalog
            .validate_names(&[
                "doc:read".to_string(),
                "bogus:perm".to_string(),
                "fake:perm".to_string(),
            ])
            .expect_err("Expected validation failure");

        match err {
            AuthzError::Validation(ValidationError::UnknownPermissions(names)) => {
                assert_eq!(names, vec!["bogus:perm".to_string(), "fake:perm".to_string()]);
            }
            other => panic!("Expected UnknownPermissions, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_empty_input_is_legal() {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let catalog = open_catalog(&dir);

        let valid = catalog.validate_names(&[]).expect("Failed to validate");
        assert!(valid.is_empty());
    }

    #[test]
    fn test_get_single_permission() {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let catalog = open_catalog(&dir);
        seed_docs(&catalog);

        let record = catalog
            .get("doc:read")
            .expect("Failed to get")
            .expect("Permission should exist");
        assert_eq!(record.name, "doc:read");
        assert_eq!(record.description.as_deref(), Some("Read documents"));

        assert!(catalog.get("missing:perm").expect("Failed to get").is_none());
    }
}
