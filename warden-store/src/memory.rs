use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use warden_errors::{AccessError, ErrorKind, Result};
use warden_types::{
    Access, Group, GroupId, GroupName, PermissionEntry, PermissionName, Principal, PrincipalSet, Resource,
    ResourceId, ResourceName, ResourceType, Scope, Service, ServiceTypeId, User, UserId, UserName,
    ADMINISTRATORS_GROUP, ANONYMOUS_GROUP,
};

use crate::{PermissionStore, PrincipalStore, ResourceStore};

/// A key into the permission-entry table: `(principal, resource, name)` is
/// unique per §3.
type EntryKey = (Principal, ResourceId, String);

#[derive(Default)]
struct State {
    resources: HashMap<ResourceId, Resource>,
    children: HashMap<ResourceId, BTreeMap<String, ResourceId>>,
    services: HashMap<ResourceId, Service>,
    service_roots_by_name: HashMap<String, ResourceId>,
    next_resource_id: i64,

    users: HashMap<UserId, User>,
    users_by_name: HashMap<String, UserId>,
    next_user_id: i64,

    groups: HashMap<GroupId, Group>,
    groups_by_name: HashMap<String, GroupId>,
    next_group_id: i64,

    memberships: HashSet<(UserId, GroupId)>,
    external_identities: HashMap<(String, String), UserId>,

    permissions: HashMap<EntryKey, PermissionEntry>,

    anonymous_group_id: GroupId,
    administrators_group_id: GroupId,
}

/// An in-memory, single-process reference implementation of the three
/// repository traits. Used by tests and as a dev/demo backend; a real
/// deployment plugs in a relational driver behind the same traits instead
/// (§5, §1).
///
/// Mirrors the reference workspace's `OnceLock<RwLock<ConfigCache>>` pattern
/// (`acl.rs::cached_config`), trading the on-disk reload-on-mtime-change logic
/// for a plain in-memory `RwLock<State>` since there is no file to reload.
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        let mut state = State::default();
        let anonymous_group_id = GroupId::new(1);
        let administrators_group_id = GroupId::new(2);
        state.groups.insert(
            anonymous_group_id,
            Group {
                id: anonymous_group_id,
                group_name: GroupName::try_from(ANONYMOUS_GROUP).expect("well-known group name is valid"),
            },
        );
        state.groups_by_name.insert(ANONYMOUS_GROUP.to_string(), anonymous_group_id);
        state.groups.insert(
            administrators_group_id,
            Group {
                id: administrators_group_id,
                group_name: GroupName::try_from(ADMINISTRATORS_GROUP).expect("well-known group name is valid"),
            },
        );
        state
            .groups_by_name
            .insert(ADMINISTRATORS_GROUP.to_string(), administrators_group_id);
        state.next_group_id = 3;
        state.next_user_id = 1;
        state.next_resource_id = 1;
        state.anonymous_group_id = anonymous_group_id;
        state.administrators_group_id = administrators_group_id;
        Self {
            state: RwLock::new(state),
        }
    }

    /// The well-known `administrators` group id, for tests that want to add a
    /// user to it directly.
    pub async fn administrators_group_id(&self) -> GroupId {
        self.state.read().await.administrators_group_id
    }

    pub async fn anonymous_group_id(&self) -> GroupId {
        self.state.read().await.anonymous_group_id
    }
}

impl State {
    fn next_resource(&mut self) -> ResourceId {
        let id = ResourceId::new(self.next_resource_id);
        self.next_resource_id += 1;
        id
    }

    fn require_resource(&self, id: ResourceId) -> Result<&Resource> {
        self.resources
            .get(&id)
            .ok_or_else(|| AccessError::not_found(format!("resource {id} not found")))
    }

    fn descendants_of(&self, id: ResourceId) -> Vec<ResourceId> {
        let mut out = Vec::new();
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            if let Some(kids) = self.children.get(&current) {
                for child_id in kids.values() {
                    out.push(*child_id);
                    frontier.push(*child_id);
                }
            }
        }
        out
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn create_service(&self, name: ResourceName, service_type: ServiceTypeId, url: String) -> Result<Service> {
        let mut state = self.state.write().await;
        if state.service_roots_by_name.contains_key(name.as_str()) {
            return Err(AccessError::conflict(format!("service {name} already exists")));
        }
        let id = state.next_resource();
        let resource = Resource {
            id,
            resource_name: name.clone(),
            resource_type: ResourceType::Service,
            parent_id: None,
            owner_user_id: None,
            owner_group_id: None,
        };
        state.resources.insert(id, resource.clone());
        state.service_roots_by_name.insert(name.as_str().to_string(), id);
        let service = Service {
            resource,
            service_type,
            url,
        };
        state.services.insert(id, service.clone());
        Ok(service)
    }

    async fn delete_service(&self, id: ResourceId) -> Result<()> {
        self.delete_subtree(id).await?;
        let mut state = self.state.write().await;
        if let Some(service) = state.services.remove(&id) {
            state.service_roots_by_name.remove(service.resource.resource_name.as_str());
        }
        Ok(())
    }

    async fn get_service(&self, id: ResourceId) -> Result<Service> {
        let state = self.state.read().await;
        state
            .services
            .get(&id)
            .cloned()
            .ok_or_else(|| AccessError::not_found(format!("service {id} not found")))
    }

    async fn find_service_by_name(&self, name: &ResourceName) -> Result<Option<Service>> {
        let state = self.state.read().await;
        Ok(state
            .service_roots_by_name
            .get(name.as_str())
            .and_then(|id| state.services.get(id))
            .cloned())
    }

    async fn list_services(&self, service_type: Option<&ServiceTypeId>) -> Result<Vec<Service>> {
        let state = self.state.read().await;
        Ok(state
            .services
            .values()
            .filter(|svc| service_type.is_none_or(|ty| &svc.service_type == ty))
            .cloned()
            .collect())
    }

    async fn create_resource(
        &self,
        parent_id: ResourceId,
        name: ResourceName,
        resource_type: ResourceType,
        owner_user_id: Option<UserId>,
        owner_group_id: Option<GroupId>,
    ) -> Result<Resource> {
        let mut state = self.state.write().await;
        state.require_resource(parent_id)?;
        let siblings = state.children.entry(parent_id).or_default();
        if siblings.contains_key(name.as_str()) {
            return Err(AccessError::conflict(format!(
                "resource {name} already exists under parent {parent_id}"
            )));
        }
        let id = state.next_resource();
        let resource = Resource {
            id,
            resource_name: name.clone(),
            resource_type,
            parent_id: Some(parent_id),
            owner_user_id,
            owner_group_id,
        };
        state.children.entry(parent_id).or_default().insert(name.as_str().to_string(), id);
        state.resources.insert(id, resource.clone());
        Ok(resource)
    }

    async fn rename_resource(&self, id: ResourceId, new_name: ResourceName) -> Result<Resource> {
        let mut state = self.state.write().await;
        let parent_id = state.require_resource(id)?.parent_id;
        let old_name = state.require_resource(id)?.resource_name.clone();

        match parent_id {
            Some(parent_id) => {
                let siblings = state.children.entry(parent_id).or_default();
                if siblings.contains_key(new_name.as_str()) {
                    return Err(AccessError::conflict(format!(
                        "resource {new_name} already exists under parent {parent_id}"
                    )));
                }
                siblings.remove(old_name.as_str());
                siblings.insert(new_name.as_str().to_string(), id);
            }
            None => {
                if state.service_roots_by_name.contains_key(new_name.as_str()) {
                    return Err(AccessError::conflict(format!("service {new_name} already exists")));
                }
                state.service_roots_by_name.remove(old_name.as_str());
                state.service_roots_by_name.insert(new_name.as_str().to_string(), id);
            }
        }

        let resource = state.resources.get_mut(&id).expect("checked above");
        resource.resource_name = new_name;
        let updated = resource.clone();
        if let Some(service) = state.services.get_mut(&id) {
            service.resource = updated.clone();
        }
        Ok(updated)
    }

    async fn move_resource(&self, id: ResourceId, new_parent_id: ResourceId) -> Result<Resource> {
        let mut state = self.state.write().await;
        let resource = state.require_resource(id)?.clone();
        state.require_resource(new_parent_id)?;
        let Some(old_parent_id) = resource.parent_id else {
            return Err(AccessError::policy_violation("service roots cannot be moved"));
        };
        let new_siblings = state.children.entry(new_parent_id).or_default();
        if new_siblings.contains_key(resource.resource_name.as_str()) {
            return Err(AccessError::conflict(format!(
                "resource {} already exists under parent {new_parent_id}",
                resource.resource_name
            )));
        }
        if let Some(old_siblings) = state.children.get_mut(&old_parent_id) {
            old_siblings.remove(resource.resource_name.as_str());
        }
        state
            .children
            .entry(new_parent_id)
            .or_default()
            .insert(resource.resource_name.as_str().to_string(), id);
        let updated = state.resources.get_mut(&id).expect("checked above");
        updated.parent_id = Some(new_parent_id);
        Ok(updated.clone())
    }

    async fn delete_subtree(&self, id: ResourceId) -> Result<()> {
        let mut state = self.state.write().await;
        state.require_resource(id)?;
        let mut to_delete = state.descendants_of(id);
        to_delete.push(id);
        // leaves first: descendants_of is post-order-ish by construction (children
        // pushed after parents during the walk), so reverse for a leaves-first order.
        to_delete.reverse();
        let to_delete: HashSet<ResourceId> = to_delete.into_iter().collect();

        for &node_id in &to_delete {
            if let Some(resource) = state.resources.remove(&node_id) {
                if let Some(parent_id) = resource.parent_id {
                    if let Some(siblings) = state.children.get_mut(&parent_id) {
                        siblings.remove(resource.resource_name.as_str());
                    }
                }
            }
            state.children.remove(&node_id);
        }
        state
            .permissions
            .retain(|(_, resource_id, _), _| !to_delete.contains(resource_id));
        Ok(())
    }

    async fn get_resource(&self, id: ResourceId) -> Result<Resource> {
        let state = self.state.read().await;
        state.require_resource(id).cloned()
    }

    async fn list_children(&self, id: ResourceId) -> Result<Vec<Resource>> {
        let state = self.state.read().await;
        state.require_resource(id)?;
        Ok(state
            .children
            .get(&id)
            .map(|kids| kids.values().filter_map(|child_id| state.resources.get(child_id).cloned()).collect())
            .unwrap_or_default())
    }

    async fn list_ancestors(&self, id: ResourceId) -> Result<Vec<Resource>> {
        let state = self.state.read().await;
        let mut chain = vec![state.require_resource(id)?.clone()];
        let mut current = chain[0].clone();
        while let Some(parent_id) = current.parent_id {
            let parent = state.require_resource(parent_id)?.clone();
            chain.push(parent.clone());
            current = parent;
        }
        chain.reverse();
        Ok(chain)
    }

    async fn get_tree(&self, service_id: ResourceId) -> Result<Vec<Resource>> {
        let state = self.state.read().await;
        let root = state.require_resource(service_id)?.clone();
        let mut out = vec![root];
        for id in state.descendants_of(service_id) {
            out.push(state.require_resource(id)?.clone());
        }
        Ok(out)
    }

    async fn lookup_by_path(&self, service_id: ResourceId, names: &[ResourceName]) -> Result<(Resource, Vec<ResourceName>)> {
        let state = self.state.read().await;
        let mut current = state.require_resource(service_id)?.clone();
        let mut names = names
            .iter()
            .filter(|name| !name.as_str().is_empty())
            .cloned()
            .collect::<Vec<_>>();
        names.reverse(); // pop() from the front

        let mut remaining = Vec::new();
        while let Some(name) = names.pop() {
            let Some(child_id) = state.children.get(&current.id).and_then(|kids| kids.get(name.as_str())) else {
                remaining.push(name);
                names.reverse();
                remaining.extend(names);
                return Ok((current, remaining));
            };
            current = state.require_resource(*child_id)?.clone();
        }
        Ok((current, remaining))
    }
}

#[async_trait]
impl PrincipalStore for InMemoryStore {
    async fn create_user(&self, user_name: UserName, email: Option<String>) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users_by_name.contains_key(user_name.as_str()) {
            return Err(AccessError::conflict(format!("user {user_name} already exists")));
        }
        let id = UserId::new(state.next_user_id);
        state.next_user_id += 1;
        let user = User {
            id,
            user_name: user_name.clone(),
            email,
        };
        state.users.insert(id, user.clone());
        state.users_by_name.insert(user_name.as_str().to_string(), id);
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AccessError::not_found(format!("user {id} not found")))?;
        let owns_something = state
            .resources
            .values()
            .any(|resource| resource.owner_user_id == Some(id));
        if owns_something {
            return Err(AccessError::policy_violation(format!(
                "user {id} still owns at least one resource"
            )));
        }
        state.users.remove(&id);
        state.users_by_name.remove(user.user_name.as_str());
        state.memberships.retain(|(user_id, _)| *user_id != id);
        state.external_identities.retain(|_, owner| *owner != id);
        state.permissions.retain(|(principal, _, _), _| *principal != Principal::User(id));
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User> {
        let state = self.state.read().await;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AccessError::not_found(format!("user {id} not found")))
    }

    async fn find_user_by_name(&self, user_name: &UserName) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users_by_name.get(user_name.as_str()).and_then(|id| state.users.get(id)).cloned())
    }

    async fn create_group(&self, group_name: GroupName) -> Result<Group> {
        let mut state = self.state.write().await;
        if state.groups_by_name.contains_key(group_name.as_str()) {
            return Err(AccessError::conflict(format!("group {group_name} already exists")));
        }
        let id = GroupId::new(state.next_group_id);
        state.next_group_id += 1;
        let group = Group {
            id,
            group_name: group_name.clone(),
        };
        state.groups.insert(id, group.clone());
        state.groups_by_name.insert(group_name.as_str().to_string(), id);
        Ok(group)
    }

    async fn delete_group(&self, id: GroupId) -> Result<()> {
        let mut state = self.state.write().await;
        if id == state.anonymous_group_id || id == state.administrators_group_id {
            return Err(AccessError::policy_violation("well-known groups cannot be deleted"));
        }
        let group = state
            .groups
            .remove(&id)
            .ok_or_else(|| AccessError::not_found(format!("group {id} not found")))?;
        state.groups_by_name.remove(group.group_name.as_str());
        state.memberships.retain(|(_, group_id)| *group_id != id);
        state.permissions.retain(|(principal, _, _), _| *principal != Principal::Group(id));
        Ok(())
    }

    async fn get_group(&self, id: GroupId) -> Result<Group> {
        let state = self.state.read().await;
        state
            .groups
            .get(&id)
            .cloned()
            .ok_or_else(|| AccessError::not_found(format!("group {id} not found")))
    }

    async fn find_group_by_name(&self, group_name: &GroupName) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state
            .groups_by_name
            .get(group_name.as_str())
            .and_then(|id| state.groups.get(id))
            .cloned())
    }

    async fn add_member(&self, user_id: UserId, group_id: GroupId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .users
            .get(&user_id)
            .ok_or_else(|| AccessError::not_found(format!("user {user_id} not found")))?;
        state
            .groups
            .get(&group_id)
            .ok_or_else(|| AccessError::not_found(format!("group {group_id} not found")))?;
        state.memberships.insert((user_id, group_id));
        Ok(())
    }

    async fn remove_member(&self, user_id: UserId, group_id: GroupId) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.memberships.remove(&(user_id, group_id)) {
            return Err(AccessError::not_found(format!(
                "{user_id} is not a member of {group_id}"
            )));
        }
        Ok(())
    }

    async fn resolve_principal_set(&self, user_id: UserId) -> Result<PrincipalSet> {
        let state = self.state.read().await;
        state
            .users
            .get(&user_id)
            .ok_or_else(|| AccessError::not_found(format!("user {user_id} not found")))?;
        let mut group_ids: BTreeSet<GroupId> = state
            .memberships
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, gid)| *gid)
            .collect();
        group_ids.insert(state.anonymous_group_id);
        let is_admin = group_ids.contains(&state.administrators_group_id);
        Ok(PrincipalSet::new(Some(user_id), group_ids, is_admin))
    }

    async fn resolve_anonymous_principal_set(&self) -> Result<PrincipalSet> {
        let state = self.state.read().await;
        let mut group_ids = BTreeSet::new();
        group_ids.insert(state.anonymous_group_id);
        Ok(PrincipalSet::new(None, group_ids, false))
    }

    async fn link_external_identity(&self, provider_name: String, external_id: String, user_id: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .users
            .get(&user_id)
            .ok_or_else(|| AccessError::not_found(format!("user {user_id} not found")))?;
        let key = (provider_name, external_id);
        if state.external_identities.contains_key(&key) {
            return Err(AccessError::conflict("external identity already linked"));
        }
        state.external_identities.insert(key, user_id);
        Ok(())
    }

    async fn unlink_external_identity(&self, provider_name: &str, external_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let key = (provider_name.to_string(), external_id.to_string());
        if state.external_identities.remove(&key).is_none() {
            return Err(AccessError::not_found("external identity not linked"));
        }
        Ok(())
    }

    async fn resolve_external_identity(&self, provider_name: &str, external_id: &str) -> Result<Option<UserId>> {
        let state = self.state.read().await;
        let key = (provider_name.to_string(), external_id.to_string());
        Ok(state.external_identities.get(&key).copied())
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn set_entry(
        &self,
        principal: Principal,
        resource_id: ResourceId,
        name: PermissionName,
        access: Access,
        scope: Scope,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.require_resource(resource_id)?;
        let key = (principal, resource_id, name.as_str().to_string());
        state.permissions.insert(
            key,
            PermissionEntry {
                principal,
                resource_id,
                name,
                access,
                scope,
            },
        );
        Ok(())
    }

    async fn clear_entry(&self, principal: Principal, resource_id: ResourceId, name: PermissionName) -> Result<()> {
        let mut state = self.state.write().await;
        let key = (principal, resource_id, name.as_str().to_string());
        if state.permissions.remove(&key).is_none() {
            return Err(AccessError::not_found("no such permission entry"));
        }
        Ok(())
    }

    async fn list_for_principal(&self, principal: Principal) -> Result<Vec<PermissionEntry>> {
        let state = self.state.read().await;
        Ok(state
            .permissions
            .values()
            .filter(|entry| entry.principal == principal)
            .cloned()
            .collect())
    }

    async fn list_for_resource(&self, resource_id: ResourceId) -> Result<Vec<PermissionEntry>> {
        let state = self.state.read().await;
        Ok(state
            .permissions
            .values()
            .filter(|entry| entry.resource_id == resource_id)
            .cloned()
            .collect())
    }

    async fn list_for_principals_on_path(
        &self,
        principals: &[Principal],
        resource_ids: &[ResourceId],
        name: &PermissionName,
    ) -> Result<Vec<PermissionEntry>> {
        let state = self.state.read().await;
        let principal_set: HashSet<Principal> = principals.iter().copied().collect();
        let resource_set: HashSet<ResourceId> = resource_ids.iter().copied().collect();
        Ok(state
            .permissions
            .values()
            .filter(|entry| {
                entry.name == *name && principal_set.contains(&entry.principal) && resource_set.contains(&entry.resource_id)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn duplicate_sibling_name_is_a_conflict() {
        let store = InMemoryStore::new();
        let svc = store
            .create_service(
                ResourceName::try_from("svc1").unwrap(),
                ServiceTypeId::try_from("api").unwrap(),
                "http://backend".to_string(),
            )
            .await
            .unwrap();
        store
            .create_resource(svc.resource.id, ResourceName::try_from("r1").unwrap(), ResourceType::Route, None, None)
            .await
            .unwrap();
        let err = store
            .create_resource(svc.resource.id, ResourceName::try_from("r1").unwrap(), ResourceType::Route, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn delete_subtree_cascades_to_permissions() {
        let store = InMemoryStore::new();
        let svc = store
            .create_service(
                ResourceName::try_from("svc1").unwrap(),
                ServiceTypeId::try_from("api").unwrap(),
                "http://backend".to_string(),
            )
            .await
            .unwrap();
        let child = store
            .create_resource(svc.resource.id, ResourceName::try_from("r1").unwrap(), ResourceType::Route, None, None)
            .await
            .unwrap();
        let user = store
            .create_user(UserName::try_from("alice").unwrap(), None)
            .await
            .unwrap();
        store
            .set_entry(
                Principal::User(user.id),
                child.id,
                PermissionName::try_from("read").unwrap(),
                Access::Allow,
                Scope::Match,
            )
            .await
            .unwrap();
        store.delete_subtree(child.id).await.unwrap();
        assert!(store.get_resource(child.id).await.is_err());
        assert!(store.list_for_resource(child.id).await.unwrap().is_empty());
        let err = store.delete_subtree(child.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn set_entry_is_idempotent() {
        let store = InMemoryStore::new();
        let svc = store
            .create_service(
                ResourceName::try_from("svc1").unwrap(),
                ServiceTypeId::try_from("api").unwrap(),
                "http://backend".to_string(),
            )
            .await
            .unwrap();
        let user = store
            .create_user(UserName::try_from("alice").unwrap(), None)
            .await
            .unwrap();
        let name = PermissionName::try_from("read").unwrap();
        for _ in 0..2 {
            store
                .set_entry(Principal::User(user.id), svc.resource.id, name.clone(), Access::Allow, Scope::Recursive)
                .await
                .unwrap();
        }
        let entries = store.list_for_principal(Principal::User(user.id)).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn owning_user_blocks_deletion() {
        let store = InMemoryStore::new();
        let svc = store
            .create_service(
                ResourceName::try_from("svc1").unwrap(),
                ServiceTypeId::try_from("api").unwrap(),
                "http://backend".to_string(),
            )
            .await
            .unwrap();
        let user = store
            .create_user(UserName::try_from("alice").unwrap(), None)
            .await
            .unwrap();
        store
            .create_resource(
                svc.resource.id,
                ResourceName::try_from("r1").unwrap(),
                ResourceType::Route,
                Some(user.id),
                None,
            )
            .await
            .unwrap();
        let err = store.delete_user(user.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PolicyViolation);
    }

    #[tokio::test]
    async fn anonymous_principal_set_has_no_user_id() {
        let store = InMemoryStore::new();
        let principal_set = store.resolve_anonymous_principal_set().await.unwrap();
        assert!(principal_set.is_anonymous());
        assert!(!principal_set.is_admin);
        assert!(principal_set.is_member_of(store.anonymous_group_id().await));
    }
}
