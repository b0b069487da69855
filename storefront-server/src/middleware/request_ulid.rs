//! Middleware for generating [ulid::Ulid]s on requests.

use axum::http::Request;
use tower_http::request_id::{MakeRequestId, RequestId};
use ulid::Ulid;

/// Make a [Ulid] request ID.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeRequestUlid;

impl MakeRequestId for MakeRequestUlid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let req_id = Ulid::new().to_string().parse();
        match req_id {
            Ok(id) => Some(RequestId::new(id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_request_ids_are_ulids() {
        let request = Request::new(Body::empty());

        let id = MakeRequestUlid
            .make_request_id(&request)
            .expect("ulids are valid header values");
        let id = id.header_value().to_str().expect("ascii");

        assert!(Ulid::from_string(id).is_ok());
    }
}
