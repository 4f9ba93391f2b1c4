//! The Admin API Contract (§4.7): typed operations over the store traits. Each
//! mutating operation is one call into exactly one store method plus, where
//! the contract requires it, a pre-check against the Service Type Registry —
//! there is no separate transaction type here because `warden-store`'s trait
//! methods are already specified to run under one transaction each (§4.7).

use warden_errors::{access_bail, Result};
use warden_registry::ServiceTypeRegistry;
use warden_store::{PermissionStore, PrincipalStore, ResourceStore};
use warden_types::{
    Access, Group, GroupId, GroupName, PermissionEntry, PermissionName, Principal, Resource, ResourceId, ResourceName,
    ResourceType, Scope, Service, ServiceTypeId, User, UserId, UserName,
};

/// `CreateService(name, type, url)`. `type` must be a recognized service-type.
pub async fn create_service(
    resources: &dyn ResourceStore,
    registry: &ServiceTypeRegistry,
    name: ResourceName,
    service_type: ServiceTypeId,
    url: String,
) -> Result<Service> {
    if registry.get(&service_type).is_none() {
        access_bail!(PolicyViolation, "unrecognized service_type {service_type}");
    }
    resources.create_service(name, service_type, url).await
}

/// `DeleteService(name)`. Looked up by name since the contract names services
/// by their gateway-exposed name, not their storage id.
pub async fn delete_service(resources: &dyn ResourceStore, name: &ResourceName) -> Result<()> {
    let Some(service) = resources.find_service_by_name(name).await? else {
        access_bail!(NotFound, "service {name} not found");
    };
    resources.delete_service(service.resource.id).await
}

pub async fn list_services(resources: &dyn ResourceStore, service_type: Option<&ServiceTypeId>) -> Result<Vec<Service>> {
    resources.list_services(service_type).await
}

/// The enclosing service's `service_type`, via the root of `resource_id`'s
/// chain. Needed to validate child-type rules and declared permission names,
/// both of which are keyed by service-type, not by individual resource.
async fn root_service_type(resources: &dyn ResourceStore, resource_id: ResourceId) -> Result<ServiceTypeId> {
    let chain = resources.list_ancestors(resource_id).await?;
    let Some(root) = chain.first() else {
        access_bail!(Internal, "resource {resource_id} has no ancestor chain");
    };
    let service = resources.get_service(root.id).await?;
    Ok(service.service_type)
}

/// `CreateResource(parent_id, name, type)`. Validates `type` against the
/// enclosing service-type's `child_resource_types` table (§3's quantified
/// invariant, §9's note that this is registry policy, not a storage
/// invariant) before delegating to the store. Ownership is not part of this
/// operation's signature in §4.7; resources are created unowned.
pub async fn create_resource(
    resources: &dyn ResourceStore,
    registry: &ServiceTypeRegistry,
    parent_id: ResourceId,
    name: ResourceName,
    resource_type: ResourceType,
) -> Result<Resource> {
    let parent = resources.get_resource(parent_id).await?;
    let service_type = root_service_type(resources, parent_id).await?;
    let Some(descriptor) = registry.get(&service_type) else {
        access_bail!(Internal, "service_type {service_type} not in registry");
    };
    if !descriptor.allows_child(parent.resource_type, resource_type) {
        access_bail!(
            PolicyViolation,
            "{resource_type} is not a valid child of {} under service_type {service_type}",
            parent.resource_type
        );
    }
    resources.create_resource(parent_id, name, resource_type, None, None).await
}

/// `DeleteResource(id)`. Cascades to descendants and to permission entries
/// (`ResourceStore::delete_subtree`); `NotFound` on a repeated call (§8
/// idempotency invariant).
pub async fn delete_resource(resources: &dyn ResourceStore, id: ResourceId) -> Result<()> {
    resources.delete_subtree(id).await
}

/// `GetResourceTree(service_id)`: every resource in the service's tree.
pub async fn get_resource_tree(resources: &dyn ResourceStore, service_id: ResourceId) -> Result<Vec<Resource>> {
    resources.get_tree(service_id).await
}

/// `CreateUser(name, email, password?, group)`. Password issuance is out of
/// scope for the core (§1, §4.7's own parenthetical); `group`, when given,
/// must already exist and the new user is added as a member in the same
/// call.
pub async fn create_user(
    principals: &dyn PrincipalStore,
    user_name: UserName,
    email: Option<String>,
    group: Option<&GroupName>,
) -> Result<User> {
    let user = principals.create_user(user_name, email).await?;
    if let Some(group_name) = group {
        let Some(group) = principals.find_group_by_name(group_name).await? else {
            access_bail!(NotFound, "group {group_name} not found");
        };
        principals.add_member(user.id, group.id).await?;
    }
    Ok(user)
}

/// `DeleteUser(name)`. `PolicyViolation` while the user still owns a resource
/// (§9 open question (a)).
pub async fn delete_user(principals: &dyn PrincipalStore, user_name: &UserName) -> Result<()> {
    let Some(user) = principals.find_user_by_name(user_name).await? else {
        access_bail!(NotFound, "user {user_name} not found");
    };
    principals.delete_user(user.id).await
}

pub async fn create_group(principals: &dyn PrincipalStore, group_name: GroupName) -> Result<Group> {
    principals.create_group(group_name).await
}

pub async fn delete_group(principals: &dyn PrincipalStore, group_name: &GroupName) -> Result<()> {
    let Some(group) = principals.find_group_by_name(group_name).await? else {
        access_bail!(NotFound, "group {group_name} not found");
    };
    principals.delete_group(group.id).await
}

pub async fn add_member(principals: &dyn PrincipalStore, user_id: UserId, group_id: GroupId) -> Result<()> {
    principals.add_member(user_id, group_id).await
}

pub async fn remove_member(principals: &dyn PrincipalStore, user_id: UserId, group_id: GroupId) -> Result<()> {
    principals.remove_member(user_id, group_id).await
}

/// `SetPermission(principal, resource, name, access, scope)`. `name` must be
/// declared by the enclosing service-type (§3, §8 quantified invariant);
/// idempotent upsert is `PermissionStore::set_entry`'s own contract.
pub async fn set_permission(
    resources: &dyn ResourceStore,
    permissions: &dyn PermissionStore,
    registry: &ServiceTypeRegistry,
    principal: Principal,
    resource_id: ResourceId,
    name: PermissionName,
    access: Access,
    scope: Scope,
) -> Result<()> {
    let service_type = root_service_type(resources, resource_id).await?;
    let Some(descriptor) = registry.get(&service_type) else {
        access_bail!(Internal, "service_type {service_type} not in registry");
    };
    if !descriptor.permission_names.contains(&name) {
        access_bail!(PolicyViolation, "{name} is not declared by service_type {service_type}");
    }
    permissions.set_entry(principal, resource_id, name, access, scope).await
}

/// `ClearPermission(principal, resource, name)`.
pub async fn clear_permission(
    permissions: &dyn PermissionStore,
    principal: Principal,
    resource_id: ResourceId,
    name: PermissionName,
) -> Result<()> {
    permissions.clear_entry(principal, resource_id, name).await
}

/// `ListPermissions(principal=?, resource=?)`. At least one filter is
/// required; when both are given, entries are fetched by resource and then
/// narrowed to the requested principal (the store has no combined index for
/// this pair, and it is an admin/audit query, not the hot path).
pub async fn list_permissions(
    permissions: &dyn PermissionStore,
    principal: Option<Principal>,
    resource_id: Option<ResourceId>,
) -> Result<Vec<PermissionEntry>> {
    match (principal, resource_id) {
        (Some(principal), Some(resource_id)) => {
            let by_resource = permissions.list_for_resource(resource_id).await?;
            Ok(by_resource.into_iter().filter(|e| e.principal == principal).collect())
        }
        (Some(principal), None) => permissions.list_for_principal(principal).await,
        (None, Some(resource_id)) => permissions.list_for_resource(resource_id).await,
        (None, None) => access_bail!(InputValidation, "list_permissions requires a principal or a resource filter"),
    }
}
