//! Typed read/write access over the tenancy and authorization entities (C2
//! Store, the authz slice). One `XxxRepository` zero-sized struct per
//! entity family, methods taking `&DbPool` or any `sqlx::Executor` so
//! multi-row operations can share a transaction.

mod agents;
mod extensions;
mod memberships;
mod scopes;
mod tenants;

pub use agents::AgentRepository;
pub use extensions::ExtensionRepository;
pub use memberships::MembershipRepository;
pub use scopes::ScopeRepository;
pub use tenants::TenantRepository;
