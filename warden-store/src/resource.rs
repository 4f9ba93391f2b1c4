use async_trait::async_trait;
use warden_errors::Result;
use warden_types::{GroupId, Resource, ResourceId, ResourceName, ResourceType, Service, ServiceTypeId, UserId};

/// The resource forest: service roots, their descendants, and lookups between
/// names (wire-facing) and ids (storage-facing) (§4.1).
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Creates a new service root. `name` must be unique among service roots.
    async fn create_service(&self, name: ResourceName, service_type: ServiceTypeId, url: String) -> Result<Service>;

    /// Deletes a service root and its whole subtree, and every permission
    /// entry referencing any of it (§3 lifecycles).
    async fn delete_service(&self, id: ResourceId) -> Result<()>;

    async fn get_service(&self, id: ResourceId) -> Result<Service>;

    async fn find_service_by_name(&self, name: &ResourceName) -> Result<Option<Service>>;

    async fn list_services(&self, service_type: Option<&ServiceTypeId>) -> Result<Vec<Service>>;

    /// Creates a non-root resource. `(parent_id, name)` must be unique among
    /// `parent_id`'s children; `parent_id` must exist.
    async fn create_resource(
        &self,
        parent_id: ResourceId,
        name: ResourceName,
        resource_type: ResourceType,
        owner_user_id: Option<UserId>,
        owner_group_id: Option<GroupId>,
    ) -> Result<Resource>;

    /// Renames a resource in place, re-checking sibling uniqueness.
    async fn rename_resource(&self, id: ResourceId, new_name: ResourceName) -> Result<Resource>;

    /// Reparents a resource. Type/child-rule re-validation is the caller's
    /// responsibility (see module docs).
    async fn move_resource(&self, id: ResourceId, new_parent_id: ResourceId) -> Result<Resource>;

    /// Deletes a resource and every descendant, leaves-first, within one
    /// transaction, cascading to permission entries that reference any of
    /// them. `NotFound` if `id` does not exist (idempotency: calling this
    /// twice on the same id returns `NotFound` the second time, per §8).
    async fn delete_subtree(&self, id: ResourceId) -> Result<()>;

    async fn get_resource(&self, id: ResourceId) -> Result<Resource>;

    async fn list_children(&self, id: ResourceId) -> Result<Vec<Resource>>;

    /// Root-to-node, inclusive of `id` itself.
    async fn list_ancestors(&self, id: ResourceId) -> Result<Vec<Resource>>;

    /// Every resource in the service's tree, root included, in no particular
    /// order (`GetResourceTree`, §4.7).
    async fn get_tree(&self, service_id: ResourceId) -> Result<Vec<Resource>>;

    /// Walks `names` one level at a time from `service_id`, matching on
    /// `resource_name` among the current node's children. Returns the deepest
    /// matched node (the service root itself if `names` is empty or its first
    /// element fails to match) plus the unmatched tail of `names`. A trailing
    /// empty component in `names` is treated as absent.
    async fn lookup_by_path(&self, service_id: ResourceId, names: &[ResourceName]) -> Result<(Resource, Vec<ResourceName>)>;
}
