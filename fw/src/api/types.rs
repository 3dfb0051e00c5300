//! Request and response types for the Torn API

use serde_json::Value;
use tracing::debug;

use super::ApiError;
use crate::domain::PlayerId;

/// Selections requested for a single player
pub const USER_SELECTIONS: &str = "basic,profile,timestamp";

/// Selections requested for a faction roster
pub const FACTION_SELECTIONS: &str = "basic,timestamp";

/// API entity namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    User,
    Faction,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Faction => write!(f, "faction"),
        }
    }
}

/// One API request, minus the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub entity: EntityType,
    /// `None` addresses the key owner's own user or faction
    pub id: Option<u64>,
    pub selections: String,
}

impl ApiRequest {
    pub fn user(id: PlayerId) -> Self {
        Self {
            entity: EntityType::User,
            id: Some(id.get()),
            selections: USER_SELECTIONS.to_string(),
        }
    }

    pub fn faction(id: Option<u64>) -> Self {
        Self {
            entity: EntityType::Faction,
            id,
            selections: FACTION_SELECTIONS.to_string(),
        }
    }

    /// Path relative to the API base, e.g. `user/101` or `faction/`
    pub fn path(&self) -> String {
        match self.id {
            Some(id) => format!("{}/{}", self.entity, id),
            None => format!("{}/", self.entity),
        }
    }
}

/// Turn a body carrying an `error` field into [`ApiError::Rejected`]
///
/// The API reports business errors with HTTP 200 and a body like
/// `{"error": {"code": 2, "error": "Incorrect key"}}`.
pub fn reject_on_error_field(body: Value) -> Result<Value, ApiError> {
    let Some(error) = body.get("error") else {
        return Ok(body);
    };
    debug!(%error, "reject_on_error_field: body carries error");

    let (code, message) = match error {
        Value::Object(fields) => (
            fields.get("code").and_then(Value::as_u64).unwrap_or(0) as u32,
            fields
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        ),
        Value::String(s) => (0, s.clone()),
        other => (0, other.to_string()),
    };

    Err(ApiError::Rejected { code, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paths() {
        assert_eq!(ApiRequest::user(PlayerId(101)).path(), "user/101");
        assert_eq!(ApiRequest::faction(Some(9)).path(), "faction/9");
        assert_eq!(ApiRequest::faction(None).path(), "faction/");
    }

    #[test]
    fn test_selections() {
        assert_eq!(ApiRequest::user(PlayerId(1)).selections, "basic,profile,timestamp");
        assert_eq!(ApiRequest::faction(None).selections, "basic,timestamp");
    }

    #[test]
    fn test_success_body_passes_through() {
        let body = json!({ "player_id": 101, "name": "A" });
        assert_eq!(reject_on_error_field(body.clone()).unwrap(), body);
    }

    #[test]
    fn test_error_object_rejected() {
        let body = json!({ "error": { "code": 2, "error": "Incorrect key" } });
        match reject_on_error_field(body) {
            Err(ApiError::Rejected { code, message }) => {
                assert_eq!(code, 2);
                assert_eq!(message, "Incorrect key");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_error_string_rejected() {
        let body = json!({ "error": "Key is empty" });
        assert!(matches!(
            reject_on_error_field(body),
            Err(ApiError::Rejected { code: 0, ref message }) if message == "Key is empty"
        ));
    }
}
