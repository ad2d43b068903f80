//! Authorization: ScopeEngine (C4) and TenantTree (C5).

pub mod repositories;
pub mod scope_engine;
pub mod scope_pattern;
pub mod tenant_tree;

pub use scope_engine::ScopeEngine;
pub use tenant_tree::TenantTree;
