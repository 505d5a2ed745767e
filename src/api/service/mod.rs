//! 服务层
//!
//! 在存储层之上提供业务语义：角色变更服务与授权决策引擎。
//! 认证（令牌签发与校验）由外部协作方完成，本层只消费已验证的主体身份

pub mod authorizer;
pub mod principal;
pub mod role_service;

pub use authorizer::Authorizer;
pub use principal::{
    AuthenticatedPrincipal, MemoryPrincipalDirectory, PrincipalDirectory, PrincipalRecord,
};
pub use role_service::RoleService;
