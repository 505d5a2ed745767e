pub mod service;

pub use service::{
    AuthenticatedPrincipal, Authorizer, MemoryPrincipalDirectory, PrincipalDirectory,
    PrincipalRecord, RoleService,
};
