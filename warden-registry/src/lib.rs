//! The Service Type Registry (§4.5): built-in service types, their declared
//! permission names and child-resource rules, and their request parsers.

mod parsers;
mod registry;
mod request;

pub use parsers::{ApiParser, ThreddsParser, WfsParser, WmsParser, WpsParser};
pub use registry::{builtin_registry, ServiceTypeDescriptor, ServiceTypeRegistry};
pub use request::{Method, ParsedRequest, RequestContext, RequestParser};

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use warden_types::{ResourceName, ServiceTypeId};

    use super::*;

    fn ctx<'a>(
        service_name: &'a ResourceName,
        method: Method,
        path_segments: Vec<&'a str>,
        query: &'a HashMap<String, String>,
    ) -> RequestContext<'a> {
        RequestContext::new(service_name, method, path_segments, query)
    }

    #[test]
    fn wps_get_capabilities_ignores_identifier() {
        let service_name: ResourceName = "wps1".try_into().unwrap();
        let mut query = HashMap::new();
        query.insert("service".to_string(), "WPS".to_string());
        query.insert("request".to_string(), "GetCapabilities".to_string());
        query.insert("identifier".to_string(), "proc1".to_string());

        let descriptor = builtin_registry().get(&ServiceTypeId::try_from("wps").unwrap()).unwrap();
        let parsed = descriptor.parser.parse(&ctx(&service_name, Method::Get, vec![], &query));
        assert!(parsed.resource_path_from_root.is_empty());
        assert_eq!(parsed.permission_name.as_str(), "get_capabilities");
    }

    #[test]
    fn wps_execute_targets_identifier() {
        let service_name: ResourceName = "wps1".try_into().unwrap();
        let mut query = HashMap::new();
        query.insert("request".to_string(), "Execute".to_string());
        query.insert("identifier".to_string(), "proc1".to_string());

        let descriptor = builtin_registry().get(&ServiceTypeId::try_from("wps").unwrap()).unwrap();
        let parsed = descriptor.parser.parse(&ctx(&service_name, Method::Get, vec![], &query));
        assert_eq!(parsed.resource_path_from_root.len(), 1);
        assert_eq!(parsed.resource_path_from_root[0].as_str(), "proc1");
        assert_eq!(parsed.permission_name.as_str(), "execute");
    }

    #[test]
    fn thredds_doc_sc_strips_html_suffix() {
        let service_name: ResourceName = "thredds".try_into().unwrap();
        let query = HashMap::new();
        let descriptor = builtin_registry().get(&ServiceTypeId::try_from("thredds").unwrap()).unwrap();
        let parsed = descriptor.parser.parse(&ctx(
            &service_name,
            Method::Get,
            vec!["dodsC", "dir1", "file1.nc.html"],
            &query,
        ));
        assert_eq!(
            parsed.resource_path_from_root.iter().map(|n| n.as_str()).collect::<Vec<_>>(),
            vec!["dir1", "file1.nc"]
        );
        assert_eq!(parsed.permission_name.as_str(), "read");
    }

    #[test]
    fn wms_getcapabilities_uses_path_segment_unless_geoserver() {
        let service_name: ResourceName = "geoserver".try_into().unwrap();
        let mut query = HashMap::new();
        query.insert("request".to_string(), "GetCapabilities".to_string());
        let descriptor = builtin_registry().get(&ServiceTypeId::try_from("wms").unwrap()).unwrap();

        let parsed = descriptor.parser.parse(&ctx(&service_name, Method::Get, vec!["WATERSHED", "wms"], &query));
        assert_eq!(parsed.resource_path_from_root[0].as_str(), "WATERSHED");

        let parsed_root = descriptor.parser.parse(&ctx(&service_name, Method::Get, vec!["geoserver", "wms"], &query));
        assert!(parsed_root.resource_path_from_root.is_empty());
    }

    #[test]
    fn wms_getmap_uses_layers_prefix() {
        let service_name: ResourceName = "geoserver".try_into().unwrap();
        let mut query = HashMap::new();
        query.insert("request".to_string(), "GetMap".to_string());
        query.insert("layers".to_string(), "WATERSHED:BV_1NS".to_string());
        let descriptor = builtin_registry().get(&ServiceTypeId::try_from("wms").unwrap()).unwrap();
        let parsed = descriptor.parser.parse(&ctx(&service_name, Method::Get, vec!["wms"], &query));
        assert_eq!(parsed.resource_path_from_root[0].as_str(), "WATERSHED");
    }

    #[test]
    fn unmatched_request_shape_is_the_unknown_sentinel() {
        let service_name: ResourceName = "wps1".try_into().unwrap();
        let query = HashMap::new();
        let descriptor = builtin_registry().get(&ServiceTypeId::try_from("wps").unwrap()).unwrap();
        let parsed = descriptor.parser.parse(&ctx(&service_name, Method::Get, vec![], &query));
        assert!(parsed.permission_name.is_unknown());
    }
}
