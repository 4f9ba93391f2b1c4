use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;

use warden_types::{PermissionName, ResourceType, ServiceTypeId};

use crate::parsers::{ApiParser, ThreddsParser, WfsParser, WmsParser, WpsParser};
use crate::request::RequestParser;

/// Everything the resolver and the admin API need to know about one
/// `service_type` (§4.5): the permission names it declares, which child
/// resource types its parent types permit, and the parser that maps an
/// inbound request to a `(path, permission_name)` pair.
pub struct ServiceTypeDescriptor {
    pub service_type: ServiceTypeId,
    pub permission_names: BTreeSet<PermissionName>,
    pub child_resource_types: HashMap<ResourceType, HashSet<ResourceType>>,
    pub parser: Box<dyn RequestParser>,
}

impl ServiceTypeDescriptor {
    pub fn allows_child(&self, parent_type: ResourceType, child_type: ResourceType) -> bool {
        self.child_resource_types
            .get(&parent_type)
            .is_some_and(|children| children.contains(&child_type))
    }
}

fn names(raw: &[&str]) -> BTreeSet<PermissionName> {
    raw.iter().map(|n| PermissionName::try_from(*n).expect("built-in permission names are valid")).collect()
}

fn child_rules(raw: &[(ResourceType, &[ResourceType])]) -> HashMap<ResourceType, HashSet<ResourceType>> {
    raw.iter().map(|(parent, children)| (*parent, children.iter().copied().collect())).collect()
}

fn service_type(raw: &str) -> ServiceTypeId {
    ServiceTypeId::try_from(raw).expect("built-in service types are valid")
}

fn api_descriptor() -> ServiceTypeDescriptor {
    ServiceTypeDescriptor {
        service_type: service_type("api"),
        permission_names: names(&["read", "write"]),
        child_resource_types: child_rules(&[
            (ResourceType::Service, &[ResourceType::Route]),
            (ResourceType::Route, &[ResourceType::Route]),
        ]),
        parser: Box::new(ApiParser),
    }
}

fn wps_descriptor() -> ServiceTypeDescriptor {
    ServiceTypeDescriptor {
        service_type: service_type("wps"),
        permission_names: names(&["get_capabilities", "describe_process", "execute"]),
        child_resource_types: child_rules(&[(ResourceType::Service, &[ResourceType::Process])]),
        parser: Box::new(WpsParser),
    }
}

fn wms_descriptor() -> ServiceTypeDescriptor {
    ServiceTypeDescriptor {
        service_type: service_type("wms"),
        permission_names: names(&[
            "get_capabilities",
            "get_map",
            "get_feature_info",
            "get_legend_graphic",
            "get_metadata",
        ]),
        child_resource_types: child_rules(&[(ResourceType::Service, &[ResourceType::Workspace])]),
        parser: Box::new(WmsParser),
    }
}

fn wfs_descriptor() -> ServiceTypeDescriptor {
    ServiceTypeDescriptor {
        service_type: service_type("wfs"),
        permission_names: names(&[
            "get_capabilities",
            "describe_feature_type",
            "get_feature",
            "lock_feature",
            "transaction",
        ]),
        child_resource_types: child_rules(&[(ResourceType::Service, &[ResourceType::Workspace])]),
        parser: Box::new(WfsParser),
    }
}

fn thredds_descriptor() -> ServiceTypeDescriptor {
    ServiceTypeDescriptor {
        service_type: service_type("thredds"),
        permission_names: names(&["read", "write"]),
        child_resource_types: child_rules(&[
            (ResourceType::Service, &[ResourceType::Directory]),
            (ResourceType::Directory, &[ResourceType::Directory, ResourceType::File]),
        ]),
        parser: Box::new(ThreddsParser),
    }
}

/// The Service Type Registry (§4.5): a static, process-wide table keyed by
/// `service_type`. Built once; read-only afterwards, mirroring the reference
/// workspace's `init_access_config`/`access_conf()` pair
/// (`proxmox-access-control/src/init.rs`) but without that crate's
/// feature-gated file-path helpers, which belong to the file-backed config
/// layer this core does not have (§1, §5).
pub struct ServiceTypeRegistry {
    descriptors: HashMap<ServiceTypeId, ServiceTypeDescriptor>,
}

impl ServiceTypeRegistry {
    fn with_builtins() -> Self {
        let mut descriptors = HashMap::new();
        for descriptor in [
            api_descriptor(),
            wps_descriptor(),
            wms_descriptor(),
            wfs_descriptor(),
            thredds_descriptor(),
        ] {
            descriptors.insert(descriptor.service_type.clone(), descriptor);
        }
        Self { descriptors }
    }

    pub fn get(&self, service_type: &ServiceTypeId) -> Option<&ServiceTypeDescriptor> {
        self.descriptors.get(service_type)
    }

    pub fn recognized_service_types(&self) -> impl Iterator<Item = &ServiceTypeId> {
        self.descriptors.keys()
    }
}

static REGISTRY: OnceLock<ServiceTypeRegistry> = OnceLock::new();

/// The process-wide registry of built-in service types. Initialized once on
/// first access (§9: "the Service Type Registry ... [is a] process-wide
/// constant initialized once at startup").
pub fn builtin_registry() -> &'static ServiceTypeRegistry {
    REGISTRY.get_or_init(ServiceTypeRegistry::with_builtins)
}
