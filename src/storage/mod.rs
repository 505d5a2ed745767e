//! 存储层
//!
//! 基于 Redb 的权限目录与角色存储。数据库句柄由进程入口点打开并注入，
//! 其生命周期归进程入口点所有，本层不持有全局状态

pub mod catalog;
pub mod redb_types;
pub mod role_store;

pub use catalog::PermissionCatalog;
pub use role_store::RoleStore;

use crate::core::error::{StorageError, StorageResult};
use redb::{ReadableTable, Table};
use redb_types::ByteKey;

/// 序列化记录为 JSON 字节
pub(crate) fn serialize_record<T: serde::Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// 从 JSON 字节反序列化记录
pub(crate) fn deserialize_record<T: serde::de::DeserializeOwned>(data: &[u8]) -> StorageResult<T> {
    serde_json::from_slice(data).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// 从计数器表分配下一个递增 ID
///
/// 必须在持有写事务时调用，分配与后续写入在同一事务内提交
pub(crate) fn next_counter_id(
    counters: &mut Table<'_, ByteKey, ByteKey>,
    counter_key: &[u8],
) -> StorageResult<u64> {
    let current = match counters
        .get(ByteKey(counter_key.to_vec()))
        .map_err(|e| StorageError::DbError(e.to_string()))?
    {
        Some(value) => decode_u64(&value.value().0)?,
        None => 0,
    };

    let next = current + 1;
    counters
        .insert(
            ByteKey(counter_key.to_vec()),
            ByteKey(next.to_be_bytes().to_vec()),
        )
        .map_err(|e| StorageError::DbError(e.to_string()))?;

    Ok(next)
}

/// 解码大端编码的 u64
pub(crate) fn decode_u64(data: &[u8]) -> StorageResult<u64> {
    let bytes: [u8; 8] = data
        .try_into()
        .map_err(|_| StorageError::Serialization(format!("无效的 u64 编码长度: {}", data.len())))?;
    Ok(u64::from_be_bytes(bytes))
}
