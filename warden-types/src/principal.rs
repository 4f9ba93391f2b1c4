use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{GroupId, UserId};

// Colons and slashes are avoided the same way the reference workspace avoids them in
// its own user-name regex: colon is used as a field separator in serialized records,
// slash is used as the resource-path delimiter.
const PRINCIPAL_NAME_PATTERN: &str = r"^[^\s:/[:cntrl:]]{1,255}$";

fn principal_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PRINCIPAL_NAME_PATTERN).expect("valid principal name regex"))
}

macro_rules! principal_name {
    ($name:ident, $err:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        #[derive(Debug, Error, Clone, PartialEq, Eq)]
        #[error("invalid name {0:?}")]
        pub struct $err(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Validates against `max_len`, the embedding application's configured
            /// maximum (`AccessConfig::max_user_name_length`, §6).
            pub fn parse_with_limit(value: String, max_len: usize) -> Result<Self, $err> {
                if value.len() > max_len || !principal_name_regex().is_match(&value) {
                    return Err($err(value));
                }
                Ok(Self(value))
            }
        }

        impl TryFrom<String> for $name {
            type Error = $err;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                if !principal_name_regex().is_match(&value) {
                    return Err($err(value));
                }
                Ok(Self(value))
            }
        }

        impl<'a> TryFrom<&'a str> for $name {
            type Error = $err;

            fn try_from(value: &'a str) -> Result<Self, Self::Error> {
                Self::try_from(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

principal_name!(UserName, InvalidUserName, "A validated, unique `user_name` (§3).");
principal_name!(
    GroupName,
    InvalidGroupName,
    "A validated, unique `group_name` (§3)."
);

/// A local user account (§3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub user_name: UserName,
    pub email: Option<String>,
}

/// A group of users (§3). Membership is resolved through [`crate::PrincipalSet`],
/// not stored on this struct.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub group_name: GroupName,
}

/// One row of the many-to-many user/group relation (§3).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub group_id: GroupId,
}

/// `(provider_name, external_id) -> local_user_id`, unique on the pair (§3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub provider_name: String,
    pub external_id: String,
    pub user_id: UserId,
}

/// A user plus the transitive set of groups it belongs to, including the
/// implicit `anonymous` membership and, if applicable, the `administrators`
/// marker (glossary: *Principal*). Produced by `PrincipalStore::resolve_principal_set`
/// and consumed by the Effective Resolver (§4.6).
///
/// `user_id` is `None` for an unauthenticated caller: it still carries the
/// implicit `anonymous` group membership, but there is no local user behind
/// it and `is_admin` is always `false`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrincipalSet {
    pub user_id: Option<UserId>,
    pub group_ids: BTreeSet<GroupId>,
    pub is_admin: bool,
}

impl PrincipalSet {
    pub fn new(user_id: Option<UserId>, group_ids: BTreeSet<GroupId>, is_admin: bool) -> Self {
        Self {
            user_id,
            group_ids,
            is_admin,
        }
    }

    pub fn is_member_of(&self, group_id: GroupId) -> bool {
        self.group_ids.contains(&group_id)
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}
