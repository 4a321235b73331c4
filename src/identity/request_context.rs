use uuid::Uuid;

use super::Principal;

/// Typed per-request context handed to handlers after authentication.
/// Built once by the authentication extractor and dropped with the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub principal: Principal,
    pub request_id: Uuid,
}

impl RequestContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal, request_id: Uuid::new_v4() }
    }
}
