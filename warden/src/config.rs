//! Process-wide configuration (§6's "environment inputs the core honors", §10.4),
//! mirroring the reference workspace's `init_access_config`/`access_conf()` split
//! between "policy the embedder decides" and fixed data: here, the embedder picks
//! the well-known group names and the user-name length limit once at startup,
//! and the rest (recognized service-types, their permission names) stays in
//! `warden-registry`'s own compiled-in, process-wide table.

use std::sync::OnceLock;

use warden_types::{ADMINISTRATORS_GROUP, ANONYMOUS_GROUP, DEFAULT_MAX_USER_NAME_LENGTH};

/// Embedder-supplied policy knobs. `Default` covers every field so the facade
/// is usable in tests and examples without a bespoke `init()` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessConfig {
    pub anonymous_group_name: String,
    pub administrators_group_name: String,
    pub max_user_name_length: usize,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            anonymous_group_name: ANONYMOUS_GROUP.to_string(),
            administrators_group_name: ADMINISTRATORS_GROUP.to_string(),
            max_user_name_length: DEFAULT_MAX_USER_NAME_LENGTH,
        }
    }
}

static CONFIG: OnceLock<AccessConfig> = OnceLock::new();

/// Installs the process-wide configuration. Must be called at most once,
/// before the first call to [`access_conf`]; a second call is a no-op and
/// returns the config that was actually installed (the caller's, if this was
/// the first call; the existing one otherwise) so callers can detect a
/// double-init instead of silently losing their settings.
pub fn init_access_config(config: AccessConfig) -> AccessConfig {
    CONFIG.get_or_init(|| config).clone()
}

/// The process-wide configuration, defaulted if [`init_access_config`] was
/// never called.
pub fn access_conf() -> &'static AccessConfig {
    CONFIG.get_or_init(AccessConfig::default)
}
