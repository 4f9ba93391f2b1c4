//! Data model for the access-control core.
//!
//! This crate only defines types: resources, principals, permission entries and the
//! small validated newtypes used as their identifiers. It has no I/O and no policy
//! logic — see `warden-acl` for the algebra and `warden-store` for persistence traits.

mod ids;
mod permission;
mod principal;
mod resource;
mod service;

pub use ids::{GroupId, ResourceId, UserId};
pub use permission::{Access, PermissionEntry, PermissionName, Principal, Scope};
pub use principal::{ExternalIdentity, Group, GroupName, Membership, PrincipalSet, User, UserName};
pub use resource::{Resource, ResourceName, ResourceType};
pub use service::{Service, ServiceName, ServiceTypeId};

/// Name of the well-known group every principal implicitly belongs to.
pub const ANONYMOUS_GROUP: &str = "anonymous";

/// Name of the well-known group whose members bypass the resolver entirely.
pub const ADMINISTRATORS_GROUP: &str = "administrators";

/// Default maximum length for a `user_name`, used when the embedding application does
/// not override it via `warden::AccessConfig`.
pub const DEFAULT_MAX_USER_NAME_LENGTH: usize = 64;
