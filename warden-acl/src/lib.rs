//! The permission algebra and effective-access resolver (§4.4, §4.6).
//!
//! Everything here is pure: no store access, no process-wide state. Callers
//! fetch the root-to-target chain and the candidate permission entries (see
//! `warden-store`), then hand them to [`resolve_effective_access`].

mod algebra;
mod tree;

pub use algebra::{permissions_for, resolve_effective_access, resources_with_any_access, Decision, Reason};
pub use tree::ResourceTree;
