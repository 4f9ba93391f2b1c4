use async_trait::async_trait;
use warden_errors::Result;
use warden_types::{Group, GroupId, GroupName, PrincipalSet, User, UserId, UserName};

/// Users, groups, memberships, and external identities (§4.2).
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn create_user(&self, user_name: UserName, email: Option<String>) -> Result<User>;

    /// `PolicyViolation` on deletion while the user still owns at least one
    /// resource (§9 open question (a)); otherwise cascades to the user's
    /// permission entries and memberships.
    async fn delete_user(&self, id: UserId) -> Result<()>;

    async fn get_user(&self, id: UserId) -> Result<User>;

    async fn find_user_by_name(&self, user_name: &UserName) -> Result<Option<User>>;

    async fn create_group(&self, group_name: GroupName) -> Result<Group>;

    async fn delete_group(&self, id: GroupId) -> Result<()>;

    async fn get_group(&self, id: GroupId) -> Result<Group>;

    async fn find_group_by_name(&self, group_name: &GroupName) -> Result<Option<Group>>;

    async fn add_member(&self, user_id: UserId, group_id: GroupId) -> Result<()>;

    async fn remove_member(&self, user_id: UserId, group_id: GroupId) -> Result<()>;

    /// The user id, the union of group ids it belongs to, plus the implicit
    /// `anonymous` membership and the `administrators` marker when applicable
    /// (§4.2).
    async fn resolve_principal_set(&self, user_id: UserId) -> Result<PrincipalSet>;

    /// The principal-set for an unauthenticated caller: just `anonymous`, no
    /// admin marker.
    async fn resolve_anonymous_principal_set(&self) -> Result<PrincipalSet>;

    async fn link_external_identity(&self, provider_name: String, external_id: String, user_id: UserId) -> Result<()>;

    async fn unlink_external_identity(&self, provider_name: &str, external_id: &str) -> Result<()>;

    async fn resolve_external_identity(&self, provider_name: &str, external_id: &str) -> Result<Option<UserId>>;
}
