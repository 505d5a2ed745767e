//! Redb 存储共享类型定义
//!
//! 提供 Redb 数据库操作所需的共享类型，包括 ByteKey 和表定义

use redb::{TableDefinition, TypeName};
use std::cmp::Ordering as CmpOrdering;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ByteKey(pub Vec<u8>);

impl redb::Key for ByteKey {
    fn compare(data1: &[u8], data2: &[u8]) -> CmpOrdering {
        data1.cmp(data2)
    }
}

impl redb::Value for ByteKey {
    type SelfType<'a> = ByteKey where Self: 'a;
    type AsBytes<'a> = Vec<u8> where Self: 'a;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> ByteKey where Self: 'a {
        ByteKey(data.to_vec())
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Vec<u8> where Self: 'b {
        value.0.clone()
    }

    fn type_name() -> TypeName {
        TypeName::new("authcore::ByteKey")
    }
}

/// 权限目录表：权限名 -> PermissionRecord (JSON)
///
/// 以名称为键，遍历即得到按名称排序的确定性列表
pub const PERMISSIONS_TABLE: TableDefinition<ByteKey, ByteKey> = TableDefinition::new("permissions");

/// 角色表：角色ID（大端字节）-> RoleRecord (JSON)
pub const ROLES_TABLE: TableDefinition<ByteKey, ByteKey> = TableDefinition::new("roles");

// 角色名称索引表 - 名称到ID的映射，同时充当存储层唯一约束
pub const ROLE_NAMES_TABLE: TableDefinition<ByteKey, ByteKey> = TableDefinition::new("role_names");

/// 角色-权限连接表：角色ID + b':' + 权限名 -> 空值
///
/// 规范化的多对多关系，读取时与权限目录连接
pub const ROLE_PERMISSIONS_TABLE: TableDefinition<ByteKey, ByteKey> =
    TableDefinition::new("role_permissions");

// ID 生成器表 - 用于为角色和权限生成递增的代理键
pub const ID_COUNTER_TABLE: TableDefinition<ByteKey, ByteKey> = TableDefinition::new("id_counters");

/// ID 计数器键
pub const ROLE_ID_COUNTER_KEY: &[u8] = b"role";
pub const PERMISSION_ID_COUNTER_KEY: &[u8] = b"permission";
