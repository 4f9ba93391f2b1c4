//! Repository traits over the access-control data model (§4.1–4.3) plus an
//! in-memory reference implementation used by tests and by `warden`'s own doc
//! examples.
//!
//! These traits say nothing about SQL, connection pools, or transactions — per
//! §5 that is the concern of whatever crate wires a real relational driver
//! behind them. What they fix is the *operation set* and its failure modes
//! (`warden_errors::AccessError`), exactly as a pluggable backend would need.
//!
//! Resource/child-type compatibility (§4.5's `child_resource_types` table) is
//! not enforced here: it is registry policy, not a storage invariant. Callers
//! (`warden-api`, `warden`) are expected to validate against the Service Type
//! Registry before calling [`ResourceStore::create_resource`].

mod memory;
mod permission;
mod principal;
mod resource;

pub use memory::InMemoryStore;
pub use permission::PermissionStore;
pub use principal::PrincipalStore;
pub use resource::ResourceStore;

pub use warden_errors::Result;
