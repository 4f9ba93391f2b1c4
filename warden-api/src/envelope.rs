//! JSON request/response envelope shape for the admin API surface (§6): every
//! response carries `code`, `type`, `detail`, and a domain-specific body. This
//! crate only defines the envelope and its exit-code mapping; serializing it
//! onto an actual HTTP response is the external gateway's job (§1).

use serde::Serialize;
use warden_errors::AccessError;

/// One admin-API response: `code` is the §6 exit code, `type` is a short
/// machine-readable tag (`ok`, or the `ErrorKind` string), `detail` is a
/// human-readable message, and `body` is whatever the operation produced.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ApiResponse<T> {
    pub code: u16,
    #[serde(rename = "type")]
    pub kind: String,
    pub detail: String,
    pub body: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 200 for reads and idempotent set/clear.
    pub fn ok(body: T) -> Self {
        Self {
            code: 200,
            kind: "ok".to_string(),
            detail: String::new(),
            body: Some(body),
        }
    }

    /// 201 for create.
    pub fn created(body: T) -> Self {
        Self {
            code: 201,
            kind: "ok".to_string(),
            detail: String::new(),
            body: Some(body),
        }
    }

    /// 204 for delete; no body.
    pub fn no_content() -> Self {
        Self {
            code: 204,
            kind: "ok".to_string(),
            detail: String::new(),
            body: None,
        }
    }

    pub fn from_error(error: &AccessError) -> Self {
        Self {
            code: error.status(),
            kind: error.kind.as_str().to_string(),
            detail: error.message.clone(),
            body: None,
        }
    }
}

#[cfg(test)]
mod test {
    use warden_errors::ErrorKind;

    use super::*;

    #[test]
    fn from_error_carries_the_kinds_status_code() {
        let err = AccessError::new(ErrorKind::Conflict, "duplicate name");
        let response: ApiResponse<()> = ApiResponse::from_error(&err);
        assert_eq!(response.code, 409);
        assert_eq!(response.kind, "conflict");
        assert_eq!(response.detail, "duplicate name");
    }

    #[test]
    fn ok_carries_200_and_a_body() {
        let response = ApiResponse::ok(42);
        assert_eq!(response.code, 200);
        assert_eq!(response.body, Some(42));
    }
}
