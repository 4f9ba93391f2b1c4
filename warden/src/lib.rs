//! The access-control core's facade: wires the Service Type Registry
//! (`warden-registry`), the repository traits (`warden-store`), and the
//! permission algebra (`warden-acl`) behind a single [`AccessInfo`] entry
//! point, plus the process-wide [`config::AccessConfig`] an embedding
//! application installs once at startup.
//!
//! This crate has no opinion on transport (§1): `AccessInfo::resolve_access`
//! takes already-split path segments and a query map, not an HTTP request,
//! and returns a plain `Decision` the gateway interprets as allow/deny.

mod access_info;
mod caller;
mod config;

pub use access_info::AccessInfo;
pub use caller::Caller;
pub use config::{access_conf, init_access_config, AccessConfig};

pub use warden_acl::{Decision, Reason};
pub use warden_registry::Method;

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::sync::Arc;

    use warden_registry::Method;
    use warden_store::InMemoryStore;
    use warden_types::{Access, Principal, ResourceType, Scope};

    use super::*;

    async fn seeded_thredds() -> (AccessInfo<InMemoryStore>, warden_types::UserId) {
        let store = Arc::new(InMemoryStore::new());
        let info = AccessInfo::new(store);
        let service = info
            .create_service("thredds".try_into().unwrap(), "thredds".try_into().unwrap(), "http://backend".to_string())
            .await
            .unwrap();
        let dir1 = info
            .create_resource(service.resource.id, "dir1".try_into().unwrap(), ResourceType::Directory)
            .await
            .unwrap();
        let file1 = info
            .create_resource(dir1.id, "file1.nc".try_into().unwrap(), ResourceType::File)
            .await
            .unwrap();
        let user = info.create_user("alice".try_into().unwrap(), None, None).await.unwrap();
        info.set_permission(
            Principal::User(user.id),
            file1.id,
            "read".try_into().unwrap(),
            Access::Allow,
            Scope::Match,
        )
        .await
        .unwrap();
        (info, user.id)
    }

    #[tokio::test]
    async fn thredds_fileserver_and_dodsc_paths_resolve_the_same_target() {
        let (info, user_id) = seeded_thredds().await;
        let query = HashMap::new();
        let service_name: warden_types::ResourceName = "thredds".try_into().unwrap();

        let via_fileserver = info
            .resolve_access(
                Caller::User(user_id),
                &service_name,
                Method::Get,
                vec!["fileServer", "dir1", "file1.nc"],
                &query,
            )
            .await;
        assert!(via_fileserver.allow);

        let via_dodsc = info
            .resolve_access(
                Caller::User(user_id),
                &service_name,
                Method::Get,
                vec!["dodsC", "dir1", "file1.nc.html"],
                &query,
            )
            .await;
        assert!(via_dodsc.allow, "the .html suffix must be stripped before lookup");

        let catalog_on_directory = info
            .resolve_access(Caller::User(user_id), &service_name, Method::Get, vec!["catalog", "dir1", ""], &query)
            .await;
        assert!(!catalog_on_directory.allow, "no grant exists on dir1 itself");
    }

    #[tokio::test]
    async fn wps_get_capabilities_ignores_identifier_end_to_end() {
        let store = Arc::new(InMemoryStore::new());
        let info = AccessInfo::new(store);
        let service = info
            .create_service("wps1".try_into().unwrap(), "wps".try_into().unwrap(), "http://backend".to_string())
            .await
            .unwrap();
        let proc1 = info
            .create_resource(service.resource.id, "proc1".try_into().unwrap(), ResourceType::Process)
            .await
            .unwrap();
        info.create_resource(service.resource.id, "proc2".try_into().unwrap(), ResourceType::Process)
            .await
            .unwrap();
        let user = info.create_user("alice".try_into().unwrap(), None, None).await.unwrap();
        info.set_permission(
            Principal::User(user.id),
            service.resource.id,
            "get_capabilities".try_into().unwrap(),
            Access::Allow,
            Scope::Recursive,
        )
        .await
        .unwrap();
        info.set_permission(
            Principal::User(user.id),
            proc1.id,
            "execute".try_into().unwrap(),
            Access::Deny,
            Scope::Match,
        )
        .await
        .unwrap();

        let service_name: warden_types::ResourceName = "wps1".try_into().unwrap();
        let mut capabilities_query = HashMap::new();
        capabilities_query.insert("service".to_string(), "WPS".to_string());
        capabilities_query.insert("request".to_string(), "GetCapabilities".to_string());
        capabilities_query.insert("identifier".to_string(), "proc1".to_string());
        let decision = info
            .resolve_access(Caller::User(user.id), &service_name, Method::Get, vec![], &capabilities_query)
            .await;
        assert!(decision.allow, "GetCapabilities must ignore identifier and target the service root");

        let mut execute_query = HashMap::new();
        execute_query.insert("request".to_string(), "Execute".to_string());
        execute_query.insert("identifier".to_string(), "proc1".to_string());
        let decision = info
            .resolve_access(Caller::User(user.id), &service_name, Method::Get, vec![], &execute_query)
            .await;
        assert!(!decision.allow);
    }

    #[tokio::test]
    async fn anonymous_caller_gets_only_the_anonymous_groups_grants() {
        let store = Arc::new(InMemoryStore::new());
        let info = AccessInfo::new(store);
        let service = info
            .create_service("svc1".try_into().unwrap(), "api".try_into().unwrap(), "http://backend".to_string())
            .await
            .unwrap();
        let service_name = service.resource.resource_name.clone();
        let query = HashMap::new();
        let decision = info
            .resolve_access(Caller::Anonymous, &service_name, Method::Get, vec![], &query)
            .await;
        assert!(!decision.allow, "closed-world default: no entries means deny");
    }

    #[tokio::test]
    async fn resolve_access_denies_for_an_unknown_service() {
        let store = Arc::new(InMemoryStore::new());
        let info = AccessInfo::new(store);
        let service_name: warden_types::ResourceName = "does-not-exist".try_into().unwrap();
        let query = HashMap::new();
        let decision = info
            .resolve_access(Caller::Anonymous, &service_name, Method::Get, vec![], &query)
            .await;
        assert!(!decision.allow);
    }
}
