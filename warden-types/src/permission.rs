use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{GroupId, ResourceId, UserId};

const PERMISSION_NAME_PATTERN: &str = r"^[a-z][a-z0-9_]{0,63}$";

fn permission_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PERMISSION_NAME_PATTERN).expect("valid permission name regex"))
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed permission name {0:?}")]
pub struct InvalidPermissionName(pub String);

/// A permission name drawn from a service-type's declared set (`read`, `write`,
/// `get_capabilities`, `describe_process`, `execute`, ...). Which names are valid for
/// a given resource is decided by the Service Type Registry, not by this type.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName(String);

impl PermissionName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The sentinel name a parser returns when a request does not match its
    /// expected shape (§4.5). Never whitelisted by any service-type, so it is
    /// always denied by the resolver.
    pub fn unknown() -> Self {
        Self("unknown".to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == "unknown"
    }
}

impl TryFrom<String> for PermissionName {
    type Error = InvalidPermissionName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !permission_name_regex().is_match(&value) {
            return Err(InvalidPermissionName(value));
        }
        Ok(Self(value))
    }
}

impl<'a> TryFrom<&'a str> for PermissionName {
    type Error = InvalidPermissionName;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<PermissionName> for String {
    fn from(value: PermissionName) -> Self {
        value.0
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Whether a [`PermissionEntry`] grants or denies its `name` (§3).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Allow,
    Deny,
}

serde_plain::derive_display_from_serialize!(Access);
serde_plain::derive_fromstr_from_deserialize!(Access);

/// Whether a [`PermissionEntry`] applies only to its own resource (`Match`) or
/// also to every descendant (`Recursive`) (§3).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Match,
    Recursive,
}

serde_plain::derive_display_from_serialize!(Scope);
serde_plain::derive_fromstr_from_deserialize!(Scope);

/// The principal a [`PermissionEntry`] or ownership link is attached to: either a
/// single user or a group (§3).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Principal {
    User(UserId),
    Group(GroupId),
}

impl Principal {
    pub fn is_user(&self) -> bool {
        matches!(self, Principal::User(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Principal::Group(_))
    }
}

/// A `(principal, resource, name, access, scope)` tuple granting or denying a named
/// operation (§3, glossary). At most one entry exists per `(principal, resource,
/// name)` triple; `PermissionStore::set_entry` enforces this by upsert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub principal: Principal,
    pub resource_id: ResourceId,
    pub name: PermissionName,
    pub access: Access,
    pub scope: Scope,
}
