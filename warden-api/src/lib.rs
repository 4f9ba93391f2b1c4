//! The Admin API Contract (§4.7): typed async operations over the
//! `warden-store` traits, plus the `ResolveAccess` hot path. This is a typed
//! interface, not an HTTP routing table — wiring it onto a wire format is the
//! embedding application's job (§1, §6).

mod envelope;
mod operations;
mod resolve;

pub use envelope::ApiResponse;
pub use operations::{
    add_member, clear_permission, create_group, create_resource, create_service, create_user, delete_group,
    delete_resource, delete_service, delete_user, get_resource_tree, list_permissions, list_services, remove_member,
    set_permission,
};
pub use resolve::resolve_access;

#[cfg(test)]
mod test {
    use warden_registry::{builtin_registry, ParsedRequest};
    use warden_store::{InMemoryStore, PrincipalStore};
    use warden_types::{Access, Principal, ResourceType, Scope};

    use super::*;

    async fn seed_api_service(store: &InMemoryStore) -> (warden_types::Service, warden_types::Resource) {
        let service = create_service(
            store,
            builtin_registry(),
            "svc1".try_into().unwrap(),
            "api".try_into().unwrap(),
            "http://backend".to_string(),
        )
        .await
        .unwrap();
        let r1 = create_resource(
            store,
            builtin_registry(),
            service.resource.id,
            "R1".try_into().unwrap(),
            ResourceType::Route,
        )
        .await
        .unwrap();
        (service, r1)
    }

    #[tokio::test]
    async fn create_resource_rejects_an_unregistered_child_type() {
        let store = InMemoryStore::new();
        let service = create_service(
            &store,
            builtin_registry(),
            "thredds1".try_into().unwrap(),
            "thredds".try_into().unwrap(),
            "http://backend".to_string(),
        )
        .await
        .unwrap();
        // `thredds` only nests `directory`/`file` under its root, never `route`.
        let result = create_resource(
            &store,
            builtin_registry(),
            service.resource.id,
            "bad".try_into().unwrap(),
            ResourceType::Route,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind, warden_errors::ErrorKind::PolicyViolation);
    }

    #[tokio::test]
    async fn set_permission_rejects_an_undeclared_name() {
        let store = InMemoryStore::new();
        let (_service, r1) = seed_api_service(&store).await;
        let user = store.create_user("alice".try_into().unwrap(), None).await.unwrap();
        let bogus_name: warden_types::PermissionName = "describe_process".try_into().unwrap();
        let result = set_permission(
            &store,
            &store,
            builtin_registry(),
            Principal::User(user.id),
            r1.id,
            bogus_name,
            Access::Allow,
            Scope::Match,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind, warden_errors::ErrorKind::PolicyViolation);
    }

    #[tokio::test]
    async fn resolve_access_matches_scenario_one_from_the_worked_examples() {
        let store = InMemoryStore::new();
        let (service, r1) = seed_api_service(&store).await;
        let r2 = create_resource(&store, builtin_registry(), r1.id, "R2".try_into().unwrap(), ResourceType::Route)
            .await
            .unwrap();
        let user = store.create_user("alice".try_into().unwrap(), None).await.unwrap();
        let group = store.create_group("acl-group".try_into().unwrap()).await.unwrap();
        store.add_member(user.id, group.id).await.unwrap();

        let read: warden_types::PermissionName = "read".try_into().unwrap();
        let write: warden_types::PermissionName = "write".try_into().unwrap();
        set_permission(
            &store,
            &store,
            builtin_registry(),
            Principal::User(user.id),
            r1.id,
            read.clone(),
            Access::Allow,
            Scope::Recursive,
        )
        .await
        .unwrap();
        set_permission(
            &store,
            &store,
            builtin_registry(),
            Principal::Group(group.id),
            r2.id,
            read.clone(),
            Access::Deny,
            Scope::Recursive,
        )
        .await
        .unwrap();

        let principal_set = store.resolve_principal_set(user.id).await.unwrap();

        let get_r1 = ParsedRequest::new(vec!["R1".try_into().unwrap()], read.clone());
        let decision = resolve_access(&store, &store, builtin_registry(), &principal_set, &service, &get_r1).await;
        assert!(decision.allow);

        let get_r1_r2 = ParsedRequest::new(vec!["R1".try_into().unwrap(), "R2".try_into().unwrap()], read);
        let decision = resolve_access(&store, &store, builtin_registry(), &principal_set, &service, &get_r1_r2).await;
        assert!(!decision.allow);

        let post_r1_r2 = ParsedRequest::new(vec!["R1".try_into().unwrap(), "R2".try_into().unwrap()], write);
        let decision = resolve_access(&store, &store, builtin_registry(), &principal_set, &service, &post_r1_r2).await;
        assert!(!decision.allow, "write was never granted on R2, so it stays denied");
    }

    #[test]
    fn response_envelope_reports_create_and_not_found() {
        let created = ApiResponse::created("svc1");
        assert_eq!(created.code, 201);
        let err = warden_errors::AccessError::not_found("service x missing");
        let response: ApiResponse<()> = ApiResponse::from_error(&err);
        assert_eq!(response.code, 404);
    }
}
