use async_trait::async_trait;
use warden_errors::Result;
use warden_types::{Access, PermissionEntry, PermissionName, Principal, ResourceId, Scope};

/// `PermissionEntry` CRUD and the batched lookups the resolver needs (§4.3,
/// §4.6 complexity note).
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Upserts `(principal, resource, name)`: a second call with the same key
    /// replaces `access`/`scope` in place rather than erroring (§4.3, §8
    /// idempotency invariant).
    async fn set_entry(
        &self,
        principal: Principal,
        resource_id: ResourceId,
        name: PermissionName,
        access: Access,
        scope: Scope,
    ) -> Result<()>;

    /// `NotFound` if no entry exists for the key; otherwise removes it.
    async fn clear_entry(&self, principal: Principal, resource_id: ResourceId, name: PermissionName) -> Result<()>;

    async fn list_for_principal(&self, principal: Principal) -> Result<Vec<PermissionEntry>>;

    async fn list_for_resource(&self, resource_id: ResourceId) -> Result<Vec<PermissionEntry>>;

    /// One query for every `(principal, resource)` pair drawn from the
    /// cartesian product of `principals` and `resource_ids`, for a single
    /// `name`. This is the batched lookup the resolver's root-to-target walk
    /// needs so that resolving one request costs one round trip to the store,
    /// not one per ancestor (§4.6).
    async fn list_for_principals_on_path(
        &self,
        principals: &[Principal],
        resource_ids: &[ResourceId],
        name: &PermissionName,
    ) -> Result<Vec<PermissionEntry>>;
}
