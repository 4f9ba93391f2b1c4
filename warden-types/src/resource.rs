use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{GroupId, ResourceId, UserId};

/// Characters allowed in a resource/segment name: no `/` (path separator), no
/// whitespace or control characters.
const NAME_PATTERN: &str = r"^[^\s/[:cntrl:]]{1,255}$";

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NAME_PATTERN).expect("valid resource name regex"))
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid resource name {0:?}")]
pub struct InvalidResourceName(pub String);

/// A validated `resource_name`: unique among the siblings of one parent (§3).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName(String);

impl ResourceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResourceName {
    type Error = InvalidResourceName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !name_regex().is_match(&value) {
            return Err(InvalidResourceName(value));
        }
        Ok(Self(value))
    }
}

impl<'a> TryFrom<&'a str> for ResourceName {
    type Error = InvalidResourceName;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<ResourceName> for String {
    fn from(value: ResourceName) -> Self {
        value.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for ResourceName {
    type Err = InvalidResourceName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

/// The closed set of resource kinds (§3). Child/parent compatibility between these
/// is *not* fixed here — it is declared per service-type by the Service Type Registry
/// (§4.5), since e.g. `wps` only ever nests `process` under `service` while `thredds`
/// nests `directory`/`file`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Service,
    Directory,
    File,
    Workspace,
    Route,
    Process,
}

serde_plain::derive_display_from_serialize!(ResourceType);
serde_plain::derive_fromstr_from_deserialize!(ResourceType);

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Service => "service",
            ResourceType::Directory => "directory",
            ResourceType::File => "file",
            ResourceType::Workspace => "workspace",
            ResourceType::Route => "route",
            ResourceType::Process => "process",
        }
    }
}

/// A node in a per-service tree (§3).
///
/// `Service` roots are represented by the same struct (`resource_type ==
/// ResourceType::Service`, `parent_id == None`); their extra attributes
/// (`service_type`, `url`) live in [`crate::Service`], the side-table for the
/// `service` variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub resource_name: ResourceName,
    pub resource_type: ResourceType,
    pub parent_id: Option<ResourceId>,
    pub owner_user_id: Option<UserId>,
    pub owner_group_id: Option<GroupId>,
}

impl Resource {
    pub fn is_service_root(&self) -> bool {
        self.resource_type == ResourceType::Service && self.parent_id.is_none()
    }
}
