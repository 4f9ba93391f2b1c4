//! [`AccessInfo`]: the single entry point an embedding application drives,
//! wiring the Service Type Registry (`warden-registry`), the repository
//! traits (`warden-store`), and the permission algebra (`warden-acl`) behind
//! one object — generalized from the reference workspace's `CachedUserInfo`,
//! which plays the same "one object the HTTP layer asks" role for privilege
//! checks over a cached, file-backed ACL tree.

use std::sync::Arc;

use tracing::error;
use warden_acl::Decision;
use warden_errors::Result;
use warden_registry::{builtin_registry, Method, ServiceTypeRegistry};
use warden_store::{PermissionStore, PrincipalStore, ResourceStore};
use warden_types::{
    Access, Group, GroupName, PermissionEntry, PermissionName, Principal, PrincipalSet, Resource, ResourceId,
    ResourceName, ResourceType, Scope, Service, ServiceTypeId, User, UserId, UserName,
};

use crate::caller::Caller;

/// Wires one backend (anything implementing all three repository traits —
/// `warden-store::InMemoryStore` for tests/demos, a relational adapter in
/// production) to the built-in Service Type Registry. Cloning is cheap: the
/// backend is held behind an `Arc`, matching `CachedUserInfo`'s own
/// `Arc<ConfigCache>` sharing.
pub struct AccessInfo<S> {
    store: Arc<S>,
    registry: &'static ServiceTypeRegistry,
}

impl<S> Clone for AccessInfo<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: self.registry,
        }
    }
}

impl<S> AccessInfo<S>
where
    S: ResourceStore + PrincipalStore + PermissionStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            registry: builtin_registry(),
        }
    }

    fn resources(&self) -> &dyn ResourceStore {
        self.store.as_ref()
    }

    fn principals(&self) -> &dyn PrincipalStore {
        self.store.as_ref()
    }

    fn permissions(&self) -> &dyn PermissionStore {
        self.store.as_ref()
    }

    async fn principal_set_for(&self, caller: Caller) -> Result<PrincipalSet> {
        match caller {
            Caller::Anonymous => self.store.resolve_anonymous_principal_set().await,
            Caller::User(user_id) => self.store.resolve_principal_set(user_id).await,
        }
    }

    /// The gateway call-in of §6: `ResolveAccess(principal, service_name,
    /// method, path, query)`. Never fails — any lookup error, or an
    /// unrecognized service name, is logged and denied (§4.6, §7), the same
    /// fail-closed contract `warden_api::resolve_access` already holds for an
    /// already-parsed request; this is that function plus the raw-request
    /// parsing step (service lookup + registry dispatch + `parse_request`)
    /// the admin-facing `ResolveAccess` operation assumes has already
    /// happened.
    pub async fn resolve_access(
        &self,
        caller: Caller,
        service_name: &ResourceName,
        method: Method,
        path_segments: Vec<&str>,
        query: &std::collections::HashMap<String, String>,
    ) -> Decision {
        let service = match self.resources().find_service_by_name(service_name).await {
            Ok(Some(service)) => service,
            Ok(None) => {
                error!(service = %service_name, "resolve_access: unknown service, denying");
                return Decision {
                    allow: false,
                    reason: warden_acl::Reason::DefaultDeny,
                };
            }
            Err(err) => {
                error!(error = %err, service = %service_name, "resolve_access: service lookup failed, denying");
                return Decision {
                    allow: false,
                    reason: warden_acl::Reason::DefaultDeny,
                };
            }
        };

        let Some(descriptor) = self.registry.get(&service.service_type) else {
            error!(service_type = %service.service_type, "resolve_access: unregistered service_type, denying");
            return Decision {
                allow: false,
                reason: warden_acl::Reason::DefaultDeny,
            };
        };

        let ctx = warden_registry::RequestContext::new(service_name, method, path_segments, query);
        let parsed = descriptor.parser.parse(&ctx);

        let principal_set = match self.principal_set_for(caller).await {
            Ok(principal_set) => principal_set,
            Err(err) => {
                error!(error = %err, ?caller, "resolve_access: principal resolution failed, denying");
                return Decision {
                    allow: false,
                    reason: warden_acl::Reason::DefaultDeny,
                };
            }
        };

        warden_api::resolve_access(self.resources(), self.permissions(), self.registry, &principal_set, &service, &parsed).await
    }

    pub async fn create_service(&self, name: ResourceName, service_type: ServiceTypeId, url: String) -> Result<Service> {
        warden_api::create_service(self.resources(), self.registry, name, service_type, url).await
    }

    pub async fn delete_service(&self, name: &ResourceName) -> Result<()> {
        warden_api::delete_service(self.resources(), name).await
    }

    pub async fn list_services(&self, service_type: Option<&ServiceTypeId>) -> Result<Vec<Service>> {
        warden_api::list_services(self.resources(), service_type).await
    }

    pub async fn create_resource(&self, parent_id: ResourceId, name: ResourceName, resource_type: ResourceType) -> Result<Resource> {
        warden_api::create_resource(self.resources(), self.registry, parent_id, name, resource_type).await
    }

    pub async fn delete_resource(&self, id: ResourceId) -> Result<()> {
        warden_api::delete_resource(self.resources(), id).await
    }

    pub async fn get_resource_tree(&self, service_id: ResourceId) -> Result<Vec<Resource>> {
        warden_api::get_resource_tree(self.resources(), service_id).await
    }

    pub async fn create_user(&self, user_name: UserName, email: Option<String>, group: Option<&GroupName>) -> Result<User> {
        warden_api::create_user(self.principals(), user_name, email, group).await
    }

    pub async fn delete_user(&self, user_name: &UserName) -> Result<()> {
        warden_api::delete_user(self.principals(), user_name).await
    }

    pub async fn create_group(&self, group_name: GroupName) -> Result<Group> {
        warden_api::create_group(self.principals(), group_name).await
    }

    pub async fn delete_group(&self, group_name: &GroupName) -> Result<()> {
        warden_api::delete_group(self.principals(), group_name).await
    }

    pub async fn add_member(&self, user_id: UserId, group_id: warden_types::GroupId) -> Result<()> {
        warden_api::add_member(self.principals(), user_id, group_id).await
    }

    pub async fn remove_member(&self, user_id: UserId, group_id: warden_types::GroupId) -> Result<()> {
        warden_api::remove_member(self.principals(), user_id, group_id).await
    }

    pub async fn set_permission(
        &self,
        principal: Principal,
        resource_id: ResourceId,
        name: PermissionName,
        access: Access,
        scope: Scope,
    ) -> Result<()> {
        warden_api::set_permission(self.resources(), self.permissions(), self.registry, principal, resource_id, name, access, scope).await
    }

    pub async fn clear_permission(&self, principal: Principal, resource_id: ResourceId, name: PermissionName) -> Result<()> {
        warden_api::clear_permission(self.permissions(), principal, resource_id, name).await
    }

    pub async fn list_permissions(&self, principal: Option<Principal>, resource_id: Option<ResourceId>) -> Result<Vec<PermissionEntry>> {
        warden_api::list_permissions(self.permissions(), principal, resource_id).await
    }
}
