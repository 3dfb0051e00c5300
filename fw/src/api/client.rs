//! TornApi trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiError, ApiRequest};

/// Remote data source for player and faction records
///
/// Each call is a single request with no retries; callers decide what a
/// failure means for their session.
#[async_trait]
pub trait TornApi: Send + Sync {
    /// Fetch one entity, returning the JSON body
    ///
    /// A body with an `error` field must come back as
    /// [`ApiError::Rejected`], never as `Ok`.
    async fn fetch(&self, request: &ApiRequest, api_key: &str) -> Result<Value, ApiError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::api::reject_on_error_field;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tracing::debug;

    /// Mock API answering from canned bodies keyed by request path
    pub struct MockTornApi {
        bodies: HashMap<String, Value>,
        calls: Mutex<Vec<ApiRequest>>,
    }

    impl MockTornApi {
        pub fn new() -> Self {
            Self {
                bodies: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Answer requests for `path` (e.g. `user/101`) with `body`
        pub fn with_body(mut self, path: &str, body: Value) -> Self {
            self.bodies.insert(path.to_string(), body);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<ApiRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TornApi for MockTornApi {
        async fn fetch(&self, request: &ApiRequest, _api_key: &str) -> Result<Value, ApiError> {
            debug!(path = %request.path(), "MockTornApi::fetch: called");
            self.calls.lock().unwrap().push(request.clone());
            let body = self
                .bodies
                .get(&request.path())
                .cloned()
                .ok_or_else(|| ApiError::InvalidResponse(format!("No mock body for {}", request.path())))?;
            reject_on_error_field(body)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::PlayerId;
        use serde_json::json;

        #[tokio::test]
        async fn test_mock_answers_and_counts() {
            let api = MockTornApi::new().with_body("user/1", json!({ "player_id": 1 }));
            let body = api.fetch(&ApiRequest::user(PlayerId(1)), "k").await.unwrap();
            assert_eq!(body["player_id"], 1);
            assert_eq!(api.call_count(), 1);
        }

        #[tokio::test]
        async fn test_mock_rejects_error_bodies() {
            let api = MockTornApi::new().with_body("user/1", json!({ "error": { "code": 2, "error": "Incorrect key" } }));
            let result = api.fetch(&ApiRequest::user(PlayerId(1)), "k").await;
            assert!(matches!(result, Err(ApiError::Rejected { code: 2, .. })));
        }

        #[tokio::test]
        async fn test_mock_unknown_path_errors() {
            let api = MockTornApi::new();
            assert!(api.fetch(&ApiRequest::faction(None), "k").await.is_err());
            assert_eq!(api.call_count(), 1);
        }
    }
}
