//! 角色生命周期集成测试
//!
//! 测试范围:
//! - storage::catalog - 权限目录的种子写入与校验
//! - storage::role_store - 角色的事务性创建、更新、删除
//! - api::service::RoleService - 业务层的引用检查与读取富化

use std::sync::Arc;

use redb::Database;
use tempfile::TempDir;

use authcore::api::service::{MemoryPrincipalDirectory, RoleService};
use authcore::core::error::{AuthzError, ConflictError, NotFoundError, ValidationError};
use authcore::core::types::{PermissionDef, PrincipalId};
use authcore::storage::{PermissionCatalog, RoleStore};

fn create_test_service(dir: &TempDir) -> (RoleService, Arc<MemoryPrincipalDirectory>) {
    let db = Arc::new(
        Database::create(dir.path().join("authcore.db")).expect("创建数据库失败"),
    );
    let catalog = PermissionCatalog::new(Arc::clone(&db)).expect("创建权限目录失败");
    catalog
        .seed_permissions(&[
            PermissionDef::new("doc:read").with_description("Read documents"),
            PermissionDef::new("doc:write").with_description("Write documents"),
        ])
        .expect("种子写入权限失败");
    let store = RoleStore::new(db).expect("创建角色存储失败");
    let directory = Arc::new(MemoryPrincipalDirectory::new());
    let service = RoleService::new(
        store,
        catalog,
        Arc::clone(&directory) as Arc<dyn authcore::api::service::PrincipalDirectory>,
    );
    (service, directory)
}

// ==================== 创建 ====================

#[test]
fn test_create_role_with_seeded_permissions() {
    let dir = TempDir::new().expect("创建临时目录失败");
    let (service, _directory) = create_test_service(&dir);

    let role = service
        .create_role("Editor", &["doc:read".to_string(), "doc:write".to_string()])
        .expect("创建角色失败");

    assert_eq!(role.name, "Editor");
    assert_eq!(role.permission_names(), vec!["doc:read", "doc:write"]);
}

#[test]
fn test_create_duplicate_role_is_conflict() {
    let dir = TempDir::new().expect("创建临时目录失败");
    let (service, _directory) = create_test_service(&dir);

    service.create_role("Editor", &[]).expect("创建角色失败");

    // 再次创建同名角色，即使权限集不同也冲突
    let err = service
        .create_role("Editor", &[])
        .expect_err("应当返回冲突错误");
    assert!(matches!(
        err,
        AuthzError::Conflict(ConflictError::RoleNameTaken(_))
    ));
}

#[test]
fn test_concurrent_create_same_name_exactly_one_wins() {
    let dir = TempDir::new().expect("创建临时目录失败");
    let db = Arc::new(
        Database::create(dir.path().join("authcore.db")).expect("创建数据库失败"),
    );
    let _catalog = PermissionCatalog::new(Arc::clone(&db)).expect("创建权限目录失败");
    let store = RoleStore::new(db).expect("创建角色存储失败");

    // 两个线程同时创建同名角色：存储层在独占写事务内的名称索引保证
    // 恰好一个成功，另一个得到冲突错误
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || store.create_role("Editor", &[]))
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("线程执行失败"))
        .collect();

    let ok_count = results.iter().filter(|r| r.is_ok()).count();
    let conflict_count = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(AuthzError::Conflict(ConflictError::RoleNameTaken(_)))
            )
        })
        .count();
    assert_eq!(ok_count, 1);
    assert_eq!(conflict_count, 1);
}

#[test]
fn test_create_role_succeeds_iff_every_permission_known() {
    let dir = TempDir::new().expect("创建临时目录失败");
    let (service, _directory) = create_test_service(&dir);

    let err = service
        .create_role("Editor", &["doc:read".to_string(), "bogus:perm".to_string()])
        .expect_err("应当返回验证错误");
    match err {
        AuthzError::Validation(ValidationError::UnknownPermissions(names)) => {
            assert_eq!(names, vec!["bogus:perm".to_string()]);
        }
        other => panic!("期望 UnknownPermissions，实际为 {:?}", other),
    }

    // 失败后没有角色被持久化
    assert!(service.list_roles().expect("列出角色失败").is_empty());
}

// ==================== 更新 ====================

#[test]
fn test_update_with_invalid_permission_keeps_prior_state() {
    let dir = TempDir::new().expect("创建临时目录失败");
    let (service, _directory) = create_test_service(&dir);

    let editor = service
        .create_role("Editor", &["doc:read".to_string(), "doc:write".to_string()])
        .expect("创建角色失败");

    let err = service
        .update_role(
            editor.id,
            None,
            Some(&["doc:read".to_string(), "bogus:perm".to_string()]),
        )
        .expect_err("应当返回验证错误");
    match err {
        AuthzError::Validation(ValidationError::UnknownPermissions(names)) => {
            assert_eq!(names, vec!["bogus:perm".to_string()]);
        }
        other => panic!("期望 UnknownPermissions，实际为 {:?}", other),
    }

    // 原有权限集原样保留
    let current = service.get_role(editor.id).expect("查询角色失败");
    assert_eq!(current.permission_names(), vec!["doc:read", "doc:write"]);
}

#[test]
fn test_update_replaces_entire_permission_set() {
    let dir = TempDir::new().expect("创建临时目录失败");
    let (service, _directory) = create_test_service(&dir);

    let editor = service
        .create_role("Editor", &["doc:read".to_string(), "doc:write".to_string()])
        .expect("创建角色失败");

    // 整体替换而非合并
    let updated = service
        .update_role(editor.id, None, Some(&["doc:write".to_string()]))
        .expect("更新角色失败");
    assert_eq!(updated.permission_names(), vec!["doc:write"]);

    // 空列表清空全部权限
    let cleared = service
        .update_role(editor.id, None, Some(&[]))
        .expect("更新角色失败");
    assert!(cleared.permissions.is_empty());
}

// ==================== 删除 ====================

#[test]
fn test_delete_role_in_use_is_conflict_and_role_survives() {
    let dir = TempDir::new().expect("创建临时目录失败");
    let (service, directory) = create_test_service(&dir);

    let editor = service
        .create_role("Editor", &["doc:read".to_string()])
        .expect("创建角色失败");
    directory.assign_role(PrincipalId::new(), Some(editor.id));

    let err = service
        .delete_role(editor.id)
        .expect_err("应当返回冲突错误");
    match err {
        AuthzError::Conflict(ConflictError::RoleInUse { name, referencing }) => {
            assert_eq!(name, "Editor");
            assert_eq!(referencing, 1);
        }
        other => panic!("期望 RoleInUse，实际为 {:?}", other),
    }

    // 冲突后角色依然存在
    assert!(service.get_role(editor.id).is_ok());
}

#[test]
fn test_delete_role_leaves_catalog_intact() {
    let dir = TempDir::new().expect("创建临时目录失败");
    let (service, _directory) = create_test_service(&dir);

    let editor = service
        .create_role("Editor", &["doc:read".to_string(), "doc:write".to_string()])
        .expect("创建角色失败");
    service.delete_role(editor.id).expect("删除角色失败");

    assert!(matches!(
        service.get_role(editor.id).expect_err("应当返回未找到"),
        AuthzError::NotFound(NotFoundError::Role(_))
    ));
    // 权限目录条目不受角色删除影响
    assert_eq!(service.list_permissions().expect("列出权限失败").len(), 2);
}

// ==================== 读取 ====================

#[test]
fn test_list_roles_enriched_and_idempotent() {
    let dir = TempDir::new().expect("创建临时目录失败");
    let (service, _directory) = create_test_service(&dir);

    service
        .create_role("Editor", &["doc:read".to_string()])
        .expect("创建角色失败");
    service.create_role("Viewer", &[]).expect("创建角色失败");

    let first = service.list_roles().expect("列出角色失败");
    let second = service.list_roles().expect("列出角色失败");

    // 无变更时两次调用返回完全一致的富化结果
    assert_eq!(first, second);

    let editor = first
        .iter()
        .find(|r| r.name == "Editor")
        .expect("Editor 应当存在");
    assert_eq!(
        editor.permissions[0].description.as_deref(),
        Some("Read documents")
    );
}

#[test]
fn test_get_unknown_role_not_found() {
    let dir = TempDir::new().expect("创建临时目录失败");
    let (service, _directory) = create_test_service(&dir);

    let err = service
        .get_role(authcore::core::types::RoleId::new(12345))
        .expect_err("应当返回未找到");
    assert!(matches!(err, AuthzError::NotFound(NotFoundError::Role(_))));
}
