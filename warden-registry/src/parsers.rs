use std::collections::HashMap;

use warden_types::{PermissionName, ResourceName};

use crate::request::{Method, ParsedRequest, RequestContext, RequestParser};

fn query_ci<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

fn permission_name(raw: &str) -> Option<PermissionName> {
    PermissionName::try_from(raw.to_ascii_lowercase()).ok()
}

fn resource_name(raw: &str) -> Option<ResourceName> {
    ResourceName::try_from(raw).ok()
}

/// Generic HTTP (`api`, §4.5): path = segments after the service root;
/// permission is `read` for HEAD/GET, `write` otherwise.
pub struct ApiParser;

impl RequestParser for ApiParser {
    fn parse(&self, ctx: &RequestContext) -> ParsedRequest {
        let permission = if ctx.method.is_read_only() { "read" } else { "write" };
        let path = ctx.path_segments.iter().filter_map(|seg| resource_name(seg)).collect();
        ParsedRequest::new(path, permission_name(permission).expect("read/write are valid names"))
    }
}

/// WPS (§4.5): `service`/`request`/`identifier`/`version` come from the query
/// string. `GetCapabilities` always targets the service root, ignoring
/// `identifier`, even when one is supplied (§8 scenario 3). Other requests
/// target the `identifier` child of the service.
///
/// The XML execute-body form of these parameters (`original_source/magpie`'s
/// `ows_parser_factory` also reads an XML POST body for `Execute`) is not
/// implemented — only the query-string form is supported.
pub struct WpsParser;

impl RequestParser for WpsParser {
    fn parse(&self, ctx: &RequestContext) -> ParsedRequest {
        let Some(request_param) = query_ci(ctx.query, "request") else {
            return ParsedRequest::unrecognized();
        };
        let normalized = match request_param.to_ascii_lowercase().as_str() {
            "getcapabilities" => "get_capabilities",
            "describeprocess" => "describe_process",
            "execute" => "execute",
            _ => return ParsedRequest::unrecognized(),
        };
        let Some(permission) = permission_name(normalized) else {
            return ParsedRequest::unrecognized();
        };

        if normalized == "get_capabilities" {
            return ParsedRequest::new(Vec::new(), permission);
        }

        let path = query_ci(ctx.query, "identifier")
            .and_then(resource_name)
            .into_iter()
            .collect();
        ParsedRequest::new(path, permission)
    }
}

/// Shared WMS/WFS logic: for `GetCapabilities`, the workspace is the path
/// segment preceding `marker` (`wms`/`wfs`), unless that segment is
/// `geoserver` (meaning: no workspace, target the service root). For every
/// other request, the workspace is the prefix of `layers`/`typenames` before
/// the first `:`.
fn wms_wfs_target(ctx: &RequestContext, marker: &str, layer_param: &str, permission: &str) -> ParsedRequest {
    let Some(permission) = permission_name(permission) else {
        return ParsedRequest::unrecognized();
    };

    let workspace_name = if permission.as_str() == "get_capabilities" {
        let Some(marker_idx) = ctx.path_segments.iter().position(|seg| *seg == marker) else {
            return ParsedRequest::unrecognized();
        };
        if marker_idx == 0 {
            None
        } else {
            let preceding = ctx.path_segments[marker_idx - 1];
            if preceding == "geoserver" {
                None
            } else {
                Some(preceding.to_string())
            }
        }
    } else {
        let Some(layer_value) = query_ci(ctx.query, layer_param) else {
            return ParsedRequest::unrecognized();
        };
        layer_value.split(':').next().map(|s| s.to_string()).filter(|s| !s.is_empty())
    };

    let path = workspace_name.and_then(|name| resource_name(&name)).into_iter().collect();
    ParsedRequest::new(path, permission)
}

pub struct WmsParser;

impl RequestParser for WmsParser {
    fn parse(&self, ctx: &RequestContext) -> ParsedRequest {
        let Some(request_param) = query_ci(ctx.query, "request") else {
            return ParsedRequest::unrecognized();
        };
        let normalized = match request_param.to_ascii_lowercase().as_str() {
            "getcapabilities" => "get_capabilities",
            "getmap" => "get_map",
            "getfeatureinfo" => "get_feature_info",
            "getlegendgraphic" => "get_legend_graphic",
            "getmetadata" => "get_metadata",
            _ => return ParsedRequest::unrecognized(),
        };
        wms_wfs_target(ctx, "wms", "layers", normalized)
    }
}

pub struct WfsParser;

impl RequestParser for WfsParser {
    fn parse(&self, ctx: &RequestContext) -> ParsedRequest {
        let Some(request_param) = query_ci(ctx.query, "request") else {
            return ParsedRequest::unrecognized();
        };
        let normalized = match request_param.to_ascii_lowercase().as_str() {
            "getcapabilities" => "get_capabilities",
            "describefeaturetype" => "describe_feature_type",
            "getfeature" => "get_feature",
            "lockfeature" => "lock_feature",
            "transaction" => "transaction",
            _ => return ParsedRequest::unrecognized(),
        };
        wms_wfs_target(ctx, "wfs", "typenames", normalized)
    }
}

/// THREDDS (§4.5): the path contains exactly one of `fileServer`, `dodsC`,
/// `catalog`; the target path is the segments following that marker, with
/// the trailing `.html` stripped for `dodsC`. Permission is always `read`.
pub struct ThreddsParser;

impl RequestParser for ThreddsParser {
    fn parse(&self, ctx: &RequestContext) -> ParsedRequest {
        const MARKERS: [&str; 3] = ["fileServer", "dodsC", "catalog"];
        let Some(marker_idx) = ctx.path_segments.iter().position(|seg| MARKERS.contains(seg)) else {
            return ParsedRequest::unrecognized();
        };
        let marker = ctx.path_segments[marker_idx];
        let mut tail: Vec<String> = ctx.path_segments[marker_idx + 1..].iter().map(|s| s.to_string()).collect();
        if marker == "dodsC" {
            if let Some(last) = tail.last_mut() {
                if let Some(stripped) = last.strip_suffix(".html") {
                    *last = stripped.to_string();
                }
            }
        }
        let path = tail.iter().filter_map(|seg| resource_name(seg)).collect();
        ParsedRequest::new(path, permission_name("read").expect("read is a valid name"))
    }
}
