use warden_types::UserId;

/// Who is making a request to [`crate::AccessInfo::resolve_access`]: either an
/// authenticated local user, or nobody (an unauthenticated gateway caller,
/// still subject to whatever `anonymous` has been granted).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Caller {
    Anonymous,
    User(UserId),
}
