use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::{Resource, ResourceName};

/// The gateway-exposed name of a service is just its `resource_name` at the tree root.
pub type ServiceName = ResourceName;

const SERVICE_TYPE_PATTERN: &str = r"^[a-z][a-z0-9_]{0,31}$";

fn service_type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SERVICE_TYPE_PATTERN).expect("valid service type regex"))
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognized or malformed service type {0:?}")]
pub struct InvalidServiceType(pub String);

/// Tag selecting the parser, permission-name set and child-type rules for a
/// [`Service`] (§3, §4.5). The set of *recognized* tags (`wps`, `wms`, `wfs`,
/// `thredds`, `api`, ...) is an environment input owned by the Service Type
/// Registry, not by this type — this newtype only enforces the lexical shape.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceTypeId(String);

impl ServiceTypeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ServiceTypeId {
    type Error = InvalidServiceType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !service_type_regex().is_match(&value) {
            return Err(InvalidServiceType(value));
        }
        Ok(Self(value))
    }
}

impl<'a> TryFrom<&'a str> for ServiceTypeId {
    type Error = InvalidServiceType;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<ServiceTypeId> for String {
    fn from(value: ServiceTypeId) -> Self {
        value.0
    }
}

impl fmt::Display for ServiceTypeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A specialized [`Resource`] carrying the `service_type` tag, the backend `url`
/// and the gateway-exposed name (§3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub resource: Resource,
    pub service_type: ServiceTypeId,
    pub url: String,
}

impl Service {
    pub fn name(&self) -> &ServiceName {
        &self.resource.resource_name
    }
}
