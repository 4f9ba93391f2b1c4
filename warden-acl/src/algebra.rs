use std::collections::BTreeSet;

use tracing::trace;
use warden_types::{Access, PermissionEntry, PermissionName, Principal, PrincipalSet, Resource, ResourceId};

/// Why a [`Decision`] came out the way it did — carried for tracing/observability,
/// never for control flow by the caller (§7: the resolver "never throws to the
/// gateway — it returns a decision").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reason {
    AdminBypass,
    Ownership,
    UserEntry,
    GroupEntry,
    UnknownPermission,
    DefaultDeny,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Decision {
    pub allow: bool,
    pub reason: Reason,
}

impl Decision {
    fn allow(reason: Reason) -> Self {
        Self { allow: true, reason }
    }

    fn deny(reason: Reason) -> Self {
        Self { allow: false, reason }
    }

    pub fn is_allow(self) -> bool {
        self.allow
    }
}

/// Rank used to combine several applicable entries of the same principal kind at
/// one resource node (§4.4): `(deny, match) > (allow, match) > (deny, recursive) >
/// (allow, recursive)`. Higher wins.
fn rank(access: Access, scope: warden_types::Scope) -> u8 {
    use warden_types::Scope::*;
    match (access, scope) {
        (Access::Deny, Match) => 4,
        (Access::Allow, Match) => 3,
        (Access::Deny, Recursive) => 2,
        (Access::Allow, Recursive) => 1,
    }
}

/// Whether `entry`, attached to `node_id`, applies to a lookup whose target is
/// `target_id`: `match`-scoped entries only apply when the entry's own resource
/// equals the target; `recursive`-scoped entries apply to the entry's resource
/// and every descendant, so they always apply once we already know `node_id` is
/// an ancestor-or-self of `target_id` (the caller guarantees that by only ever
/// walking the root-to-target chain).
fn applies(entry: &PermissionEntry, node_id: ResourceId, target_id: ResourceId) -> bool {
    entry.resource_id == node_id
        && match entry.scope {
            warden_types::Scope::Recursive => true,
            warden_types::Scope::Match => node_id == target_id,
        }
}

/// Combines every applicable entry of one principal kind at one node into a
/// single access outcome, by the rank in [`rank`]. `None` if nothing applies.
fn strongest<'a>(entries: impl Iterator<Item = &'a PermissionEntry>) -> Option<Access> {
    entries.max_by_key(|e| rank(e.access, e.scope)).map(|e| e.access)
}

/// The combined root-to-target walk (§4.4). At each node, starting from the
/// target and moving toward the root, a user entry (there can be at most one,
/// per the data model's uniqueness invariant) takes precedence over that same
/// node's group entries; group entries at one node combine via [`rank`] ("deny
/// wins among groups at the same depth", tempered by match-beats-recursive).
/// The walk stops at the first node — user or group — that carries anything
/// applicable; a node's entries are never shadowed by a farther ancestor of
/// the *other* kind. This is the ordering the §8 worked scenario requires:
/// a closer group `deny` overrides a farther ancestor's recursive user
/// `allow`, even though user-kind otherwise outranks group-kind.
fn closest_combined(
    chain: &[Resource],
    target_id: ResourceId,
    principal_set: &PrincipalSet,
    name: &PermissionName,
    entries: &[PermissionEntry],
) -> Option<(Access, Reason)> {
    for node in chain.iter().rev() {
        let node_id = node.id;

        if let Some(user_id) = principal_set.user_id {
            let user_entries = entries
                .iter()
                .filter(|e| e.principal == Principal::User(user_id) && e.name == *name && applies(e, node_id, target_id));
            if let Some(access) = strongest(user_entries) {
                return Some((access, Reason::UserEntry));
            }
        }

        let group_entries = entries.iter().filter(|e| {
            e.name == *name
                && applies(e, node_id, target_id)
                && matches!(e.principal, Principal::Group(group_id) if principal_set.is_member_of(group_id))
        });
        if let Some(access) = strongest(group_entries) {
            return Some((access, Reason::GroupEntry));
        }
    }
    None
}

/// The full Effective Resolver algebra (§4.4, §4.6) over an already-resolved
/// root-to-target chain and an already-fetched batch of candidate entries.
/// Path resolution and entry fetching are the caller's job (`warden-store`);
/// this function is pure and holds no state, so it cannot itself violate
/// §5's "no global mutable caches in the core".
///
/// `entries` should contain every entry for `name` on any node in `chain`,
/// for `principal_set.user_id` and for each of `principal_set.group_ids`
/// (`PermissionStore::list_for_principals_on_path` is shaped for exactly
/// this).
pub fn resolve_effective_access(
    chain: &[Resource],
    principal_set: &PrincipalSet,
    declared_names: &BTreeSet<PermissionName>,
    name: &PermissionName,
    entries: &[PermissionEntry],
) -> Decision {
    if principal_set.is_admin {
        trace!(%name, "admin bypass");
        return Decision::allow(Reason::AdminBypass);
    }

    let Some(target) = chain.last() else {
        return Decision::deny(Reason::DefaultDeny);
    };

    if !declared_names.contains(name) {
        trace!(%name, "permission name not declared for this service type");
        return Decision::deny(Reason::UnknownPermission);
    }

    let owns_as_user = principal_set.user_id.is_some() && target.owner_user_id == principal_set.user_id;
    let owns_as_group = target
        .owner_group_id
        .is_some_and(|owner_group_id| principal_set.is_member_of(owner_group_id));
    if owns_as_user || owns_as_group {
        trace!(resource_id = %target.id, "ownership short-circuit");
        return Decision::allow(Reason::Ownership);
    }

    match closest_combined(chain, target.id, principal_set, name, entries) {
        Some((Access::Allow, reason)) => {
            trace!(resource_id = %target.id, ?reason, "allow");
            Decision::allow(reason)
        }
        Some((Access::Deny, reason)) => {
            trace!(resource_id = %target.id, ?reason, "deny");
            Decision::deny(reason)
        }
        None => {
            trace!(resource_id = %target.id, "no applicable entry, default deny");
            Decision::deny(Reason::DefaultDeny)
        }
    }
}

/// The full set of `(name, access)` pairs in effect for `principal_set` at
/// `chain`'s target, one entry per name in `declared_names` (§10.6, modeled on
/// the reference workspace's `AclTree::roles()` closest-wins walk). Unlike
/// [`resolve_effective_access`], this is an audit/debug query, not the hot
/// path — it runs the same algebra once per declared name rather than
/// short-circuiting on the first requested name.
///
/// `entries` may contain entries for any of `declared_names`; each name's
/// computation filters to its own entries internally.
pub fn permissions_for(
    chain: &[Resource],
    principal_set: &PrincipalSet,
    declared_names: &BTreeSet<PermissionName>,
    entries: &[PermissionEntry],
) -> std::collections::BTreeMap<PermissionName, Access> {
    declared_names
        .iter()
        .map(|name| {
            let decision = resolve_effective_access(chain, principal_set, declared_names, name, entries);
            let access = if decision.allow { Access::Allow } else { Access::Deny };
            (name.clone(), access)
        })
        .collect()
}

/// Every resource under `tree` that `principal_set` has *some* declared
/// access to, for any name in `declared_names` (§10.6, modeled on the
/// reference workspace's `get_child_paths`). An admin/debug surface, not the
/// hot path: it walks every node in `tree` and re-runs the algebra per node.
///
/// `entries` should contain every entry for `declared_names` on any node in
/// `tree`, for `principal_set.user_id` and each of `principal_set.group_ids`.
pub fn resources_with_any_access(
    tree: &crate::tree::ResourceTree,
    principal_set: &PrincipalSet,
    declared_names: &BTreeSet<PermissionName>,
    entries: &[PermissionEntry],
) -> Vec<ResourceId> {
    tree.ids()
        .filter(|&id| {
            let chain: Vec<Resource> = tree.ancestors(id).into_iter().cloned().collect();
            declared_names
                .iter()
                .any(|name| resolve_effective_access(&chain, principal_set, declared_names, name, entries).allow)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use warden_types::{GroupId, ResourceType, Scope, UserId};

    use super::*;

    fn resource(id: i64, parent: Option<i64>) -> Resource {
        Resource {
            id: ResourceId::new(id),
            resource_name: format!("r{id}").try_into().unwrap(),
            resource_type: ResourceType::Route,
            parent_id: parent.map(ResourceId::new),
            owner_user_id: None,
            owner_group_id: None,
        }
    }

    fn entry(principal: Principal, resource_id: i64, name: &str, access: Access, scope: Scope) -> PermissionEntry {
        PermissionEntry {
            principal,
            resource_id: ResourceId::new(resource_id),
            name: name.try_into().unwrap(),
            access,
            scope,
        }
    }

    fn names(list: &[&str]) -> BTreeSet<PermissionName> {
        list.iter().map(|s| (*s).try_into().unwrap()).collect()
    }

    fn principal_set(user_id: i64, group_ids: &[i64]) -> PrincipalSet {
        PrincipalSet::new(
            Some(UserId::new(user_id)),
            group_ids.iter().map(|g| GroupId::new(*g)).collect(),
            false,
        )
    }

    /// svc1(1) -> r1(2) -> r2(3) -> r3(4) -> r4(5), scenario 1 from §8.
    fn nested_chain() -> Vec<Resource> {
        vec![
            resource(1, None),
            resource(2, Some(1)),
            resource(3, Some(2)),
            resource(4, Some(3)),
            resource(5, Some(4)),
        ]
    }

    #[test]
    fn nested_deny_precedence_matches_worked_scenario() {
        let user = Principal::User(UserId::new(1));
        let group = Principal::Group(GroupId::new(10));
        let declared = names(&["read", "write"]);
        let ps = principal_set(1, &[10]);

        let entries = vec![
            entry(user, 1, "write", Access::Deny, Scope::Match),
            entry(user, 2, "read", Access::Allow, Scope::Recursive),
            entry(user, 4, "write", Access::Allow, Scope::Recursive),
            entry(group, 1, "write", Access::Allow, Scope::Recursive),
            entry(group, 3, "read", Access::Deny, Scope::Recursive),
            entry(group, 4, "write", Access::Deny, Scope::Match),
            entry(group, 5, "write", Access::Deny, Scope::Match),
        ];

        let chain = nested_chain();
        let read: PermissionName = "read".try_into().unwrap();
        let write: PermissionName = "write".try_into().unwrap();

        let at = |depth: usize| &chain[..depth];

        // GET /svc1
        assert!(!resolve_effective_access(at(1), &ps, &declared, &read, &entries).allow);
        // GET /svc1/R1
        assert!(resolve_effective_access(at(2), &ps, &declared, &read, &entries).allow);
        // POST /svc1/R1
        assert!(resolve_effective_access(at(2), &ps, &declared, &write, &entries).allow);
        // GET /svc1/R1/R2
        assert!(!resolve_effective_access(at(3), &ps, &declared, &read, &entries).allow);
        // POST /svc1/R1/R2
        assert!(resolve_effective_access(at(3), &ps, &declared, &write, &entries).allow);
        // POST /svc1/R1/R2/R3
        assert!(resolve_effective_access(at(4), &ps, &declared, &write, &entries).allow);
        // POST /svc1/R1/R2/R3/R4
        assert!(!resolve_effective_access(at(5), &ps, &declared, &write, &entries).allow);
    }

    #[test]
    fn admin_bypasses_every_entry() {
        let declared = names(&["read", "write"]);
        let mut ps = principal_set(1, &[10]);
        ps.is_admin = true;
        let write: PermissionName = "write".try_into().unwrap();
        let entries = vec![entry(Principal::User(UserId::new(1)), 1, "write", Access::Deny, Scope::Match)];
        let chain = nested_chain();
        assert!(resolve_effective_access(&chain, &ps, &declared, &write, &entries).allow);
    }

    #[test]
    fn ownership_grants_full_access_without_any_entry() {
        let declared = names(&["read", "write"]);
        let ps = principal_set(1, &[10]);
        let mut owned = resource(2, Some(1));
        owned.owner_user_id = Some(UserId::new(1));
        let sibling = resource(3, Some(1));
        let root = resource(1, None);

        let read: PermissionName = "read".try_into().unwrap();
        assert!(resolve_effective_access(&[root.clone(), owned], &ps, &declared, &read, &[]).allow);
        assert!(!resolve_effective_access(&[root, sibling], &ps, &declared, &read, &[]).allow);
    }

    #[test]
    fn group_deny_overrides_group_allow_at_same_depth() {
        let declared = names(&["read"]);
        let ps = principal_set(1, &[10, 20]);
        let root = resource(1, None);
        let target = resource(2, Some(1));
        let read: PermissionName = "read".try_into().unwrap();

        let entries = vec![
            entry(Principal::Group(GroupId::new(10)), 2, "read", Access::Allow, Scope::Match),
            entry(Principal::Group(GroupId::new(20)), 2, "read", Access::Deny, Scope::Match),
        ];
        assert!(!resolve_effective_access(&[root, target], &ps, &declared, &read, &entries).allow);
    }

    #[test]
    fn closed_world_default_denies_with_no_entries() {
        let declared = names(&["read"]);
        let ps = principal_set(1, &[10]);
        let chain = vec![resource(1, None)];
        let read: PermissionName = "read".try_into().unwrap();
        assert!(!resolve_effective_access(&chain, &ps, &declared, &read, &[]).allow);
    }

    #[test]
    fn unrecognized_permission_name_is_denied() {
        let declared = names(&["read"]);
        let ps = principal_set(1, &[10]);
        let chain = vec![resource(1, None)];
        let unknown = PermissionName::unknown();
        let decision = resolve_effective_access(&chain, &ps, &declared, &unknown, &[]);
        assert!(!decision.allow);
        assert_eq!(decision.reason, Reason::UnknownPermission);
    }

    #[test]
    fn match_scoped_entry_on_an_ancestor_never_applies_to_a_descendant_target() {
        let declared = names(&["read"]);
        let ps = principal_set(1, &[10]);
        let root = resource(1, None);
        let target = resource(2, Some(1));
        let read: PermissionName = "read".try_into().unwrap();
        let entries = vec![entry(Principal::User(UserId::new(1)), 1, "read", Access::Allow, Scope::Match)];
        assert!(!resolve_effective_access(&[root, target], &ps, &declared, &read, &entries).allow);
    }

    #[test]
    fn permissions_for_reports_every_declared_name() {
        let declared = names(&["read", "write"]);
        let ps = principal_set(1, &[10]);
        let chain = nested_chain();
        let entries = vec![entry(Principal::User(UserId::new(1)), 2, "read", Access::Allow, Scope::Recursive)];
        let effective = permissions_for(&chain[..3], &ps, &declared, &entries);
        assert_eq!(effective.get(&names(&["read"]).into_iter().next().unwrap()), Some(&Access::Allow));
        assert_eq!(effective.get(&names(&["write"]).into_iter().next().unwrap()), Some(&Access::Deny));
    }

    #[test]
    fn resources_with_any_access_finds_only_granted_nodes() {
        use crate::tree::ResourceTree;

        let declared = names(&["read"]);
        let ps = principal_set(1, &[]);
        let tree = ResourceTree::from_flat(nested_chain()).unwrap();
        let entries = vec![entry(Principal::User(UserId::new(1)), 2, "read", Access::Allow, Scope::Match)];
        let granted = resources_with_any_access(&tree, &ps, &declared, &entries);
        assert_eq!(granted, vec![ResourceId::new(2)]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let declared = names(&["read", "write"]);
        let ps = principal_set(1, &[10]);
        let chain = nested_chain();
        let entries = vec![entry(Principal::User(UserId::new(1)), 2, "read", Access::Allow, Scope::Recursive)];
        let read: PermissionName = "read".try_into().unwrap();
        let first = resolve_effective_access(&chain[..3], &ps, &declared, &read, &entries);
        let second = resolve_effective_access(&chain[..3], &ps, &declared, &read, &entries);
        assert_eq!(first, second);
    }
}
