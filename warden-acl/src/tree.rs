use std::collections::BTreeMap;

use warden_types::{Resource, ResourceId, ResourceName};

/// A read-only snapshot of one service's resource tree, built fresh from a flat
/// listing (`ResourceStore::get_tree`) for the duration of one admin-API call.
///
/// This is **not** a cache: per §5, the core keeps no global mutable state
/// beyond the read-only Service Type Registry, so nothing here outlives the
/// call that built it. Its shape — a tree of nodes addressed by name among
/// siblings — mirrors the reference workspace's `AclTree`/`AclTreeNode`, minus
/// the `OnceLock<RwLock<_>>` reload-on-mtime-change caching layer that crate
/// uses for its on-disk config (there is no on-disk file here to reload).
pub struct ResourceTree {
    by_id: BTreeMap<ResourceId, ResourceNode>,
    root_id: ResourceId,
}

struct ResourceNode {
    resource: Resource,
    children: BTreeMap<String, ResourceId>,
}

impl ResourceTree {
    /// `flat` must contain the service root and every descendant, as returned
    /// by `ResourceStore::get_tree`; the root is the one entry with
    /// `parent_id: None`.
    pub fn from_flat(flat: Vec<Resource>) -> Option<Self> {
        let root_id = flat.iter().find(|r| r.parent_id.is_none())?.id;
        let mut by_id = BTreeMap::new();
        for resource in &flat {
            by_id.insert(
                resource.id,
                ResourceNode {
                    resource: resource.clone(),
                    children: BTreeMap::new(),
                },
            );
        }
        for resource in &flat {
            if let Some(parent_id) = resource.parent_id {
                by_id
                    .get_mut(&parent_id)?
                    .children
                    .insert(resource.resource_name.as_str().to_string(), resource.id);
            }
        }
        Some(Self { by_id, root_id })
    }

    pub fn root_id(&self) -> ResourceId {
        self.root_id
    }

    /// Every resource id in the tree, in no particular order. Used by
    /// `resources_with_any_access` to walk the whole tree once per query.
    pub fn ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.by_id.keys().copied()
    }

    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.by_id.get(&id).map(|node| &node.resource)
    }

    pub fn children(&self, id: ResourceId) -> impl Iterator<Item = &Resource> {
        self.by_id
            .get(&id)
            .into_iter()
            .flat_map(|node| node.children.values())
            .filter_map(move |child_id| self.get(*child_id))
    }

    /// Root-to-node chain, inclusive.
    pub fn ancestors(&self, id: ResourceId) -> Vec<&Resource> {
        let mut chain = Vec::new();
        let mut current = self.get(id);
        while let Some(resource) = current {
            chain.push(resource);
            current = resource.parent_id.and_then(|parent_id| self.get(parent_id));
        }
        chain.reverse();
        chain
    }

    /// Walks `names` one level at a time from the root, exactly like
    /// `ResourceStore::lookup_by_path`, but against this in-memory snapshot.
    pub fn lookup_by_path(&self, names: &[ResourceName]) -> (&Resource, Vec<ResourceName>) {
        let mut current = self.get(self.root_id).expect("root_id always present");
        let mut names = names.iter().filter(|n| !n.as_str().is_empty());
        let mut remaining = Vec::new();
        for name in names.by_ref() {
            let Some(node) = self.by_id.get(&current.id) else { break };
            let Some(&child_id) = node.children.get(name.as_str()) else {
                remaining.push(name.clone());
                break;
            };
            current = self.get(child_id).expect("child id recorded in tree");
        }
        remaining.extend(names.cloned());
        (current, remaining)
    }
}
