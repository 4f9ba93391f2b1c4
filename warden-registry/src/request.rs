use std::collections::HashMap;

use warden_types::{PermissionName, ResourceName};

/// The HTTP method of an inbound request, as much of it as the generic `api`
/// parser (§4.5) needs to pick `read` vs `write`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Other,
}

impl Method {
    pub fn is_read_only(self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }
}

/// Everything a per-service-type parser needs: the already-split path segments
/// following the service name, the service name itself (needed by the
/// WMS/WFS `geoserver` special case, which compares a path segment against
/// it), the method, and the query parameters.
pub struct RequestContext<'a> {
    pub service_name: &'a ResourceName,
    pub method: Method,
    /// Path segments *after* the service name, e.g. `/svc1/wms` parses to
    /// `["wms"]`; `/svc1/WATERSHED/wms` to `["WATERSHED", "wms"]`.
    pub path_segments: Vec<&'a str>,
    pub query: &'a HashMap<String, String>,
}

impl<'a> RequestContext<'a> {
    pub fn new(
        service_name: &'a ResourceName,
        method: Method,
        path_segments: Vec<&'a str>,
        query: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            service_name,
            method,
            path_segments,
            query,
        }
    }
}

/// The output of a parser (§4.5): the chain of resource names from the
/// service root to the effective target, and the permission name being
/// requested.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedRequest {
    pub resource_path_from_root: Vec<ResourceName>,
    pub permission_name: PermissionName,
}

impl ParsedRequest {
    pub fn new(resource_path_from_root: Vec<ResourceName>, permission_name: PermissionName) -> Self {
        Self {
            resource_path_from_root,
            permission_name,
        }
    }

    /// The sentinel result for a request that does not match the parser's
    /// expected shape: targets the service root with the "unknown"
    /// permission name, which no service-type ever whitelists (§4.5).
    pub fn unrecognized() -> Self {
        Self {
            resource_path_from_root: Vec::new(),
            permission_name: PermissionName::unknown(),
        }
    }
}

/// A per-service-type request parser (§4.5's `parse_request`).
pub trait RequestParser: Send + Sync {
    fn parse(&self, ctx: &RequestContext) -> ParsedRequest;
}
