//! `ResolveAccess(principal, service, parsed_request) -> Allow|Deny` (§4.7), the
//! hot path. Unlike every other operation in this crate, this one never
//! returns `Err`: any store failure is logged and collapsed to `Deny`,
//! per §4.6's "any persistence failure during resolution is fatal for that
//! request and surfaces as an internal error; the gateway must treat this as
//! deny (fail-closed)" and §7's "the resolver never throws to the gateway —
//! it returns a decision."

use tracing::error;
use warden_acl::{resolve_effective_access, Decision, Reason};
use warden_registry::{ParsedRequest, ServiceTypeRegistry};
use warden_store::ResourceStore;
use warden_types::{Principal, PrincipalSet, Service};

/// Resolves one already-parsed request against the store. Admin bypass is
/// checked before any store call, so it still applies "in degraded lookup
/// modes" (§4.6) — a principal carrying the administrators marker is never
/// denied because of a store outage.
pub async fn resolve_access(
    resources: &dyn ResourceStore,
    permissions: &dyn warden_store::PermissionStore,
    registry: &ServiceTypeRegistry,
    principal_set: &PrincipalSet,
    service: &Service,
    parsed: &ParsedRequest,
) -> Decision {
    if principal_set.is_admin {
        return Decision {
            allow: true,
            reason: Reason::AdminBypass,
        };
    }

    let Some(descriptor) = registry.get(&service.service_type) else {
        error!(service_type = %service.service_type, "resolve_access: unrecognized service_type, denying");
        return Decision {
            allow: false,
            reason: Reason::DefaultDeny,
        };
    };

    let (target, _unmatched) = match resources
        .lookup_by_path(service.resource.id, &parsed.resource_path_from_root)
        .await
    {
        Ok(result) => result,
        Err(err) => {
            error!(error = %err, service = %service.name(), "resolve_access: path lookup failed, denying");
            return Decision {
                allow: false,
                reason: Reason::DefaultDeny,
            };
        }
    };

    let chain = match resources.list_ancestors(target.id).await {
        Ok(chain) => chain,
        Err(err) => {
            error!(error = %err, resource_id = %target.id, "resolve_access: ancestor lookup failed, denying");
            return Decision {
                allow: false,
                reason: Reason::DefaultDeny,
            };
        }
    };

    let mut principals: Vec<Principal> = Vec::with_capacity(principal_set.group_ids.len() + 1);
    if let Some(user_id) = principal_set.user_id {
        principals.push(Principal::User(user_id));
    }
    principals.extend(principal_set.group_ids.iter().map(|group_id| Principal::Group(*group_id)));

    let resource_ids: Vec<_> = chain.iter().map(|r| r.id).collect();
    let entries = match permissions
        .list_for_principals_on_path(&principals, &resource_ids, &parsed.permission_name)
        .await
    {
        Ok(entries) => entries,
        Err(err) => {
            error!(error = %err, resource_id = %target.id, "resolve_access: permission lookup failed, denying");
            return Decision {
                allow: false,
                reason: Reason::DefaultDeny,
            };
        }
    };

    resolve_effective_access(&chain, principal_set, &descriptor.permission_names, &parsed.permission_name, &entries)
}
