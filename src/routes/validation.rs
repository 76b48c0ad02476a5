use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};

use crate::constants::{
    ACTOR_EMAIL_HEADER, ACTOR_HEADER, ERR_INVALID_ACTOR_ID, ERR_INVALID_TIMESTAMP,
    KEY_SEPARATOR, MAX_ACTOR_ID_LEN,
};
use crate::error::AppError;

/// Current time as Unix milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix milliseconds to an RFC3339 string, defaulting to now if invalid
pub fn timestamp_to_rfc3339(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Parse an RFC3339 date-time into Unix milliseconds
pub fn rfc3339_to_timestamp(value: &str) -> Result<i64, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp_millis())
        .map_err(|_| AppError::Validation(ERR_INVALID_TIMESTAMP.to_string()))
}

/// Check that an identity can be used as a storage key component
pub fn validate_actor_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ACTOR_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_graphic() && c != KEY_SEPARATOR)
}

/// Authenticated caller, as forwarded by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .ok_or(AppError::Unauthorized)?;

        if !validate_actor_id(value) {
            tracing::warn!("{}: {:?}", ERR_INVALID_ACTOR_ID, value);
            return Err(AppError::Unauthorized);
        }

        Ok(Actor(value.to_string()))
    }
}

/// Email address of the authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorEmail(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ActorEmail
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| ActorEmail(v.trim().to_string()))
            .filter(|email| !email.0.is_empty())
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_actor_id() {
        assert!(validate_actor_id("user-123"));
        assert!(validate_actor_id("auth0|abc.def"));
        assert!(!validate_actor_id(""));
        assert!(!validate_actor_id("has space"));
        assert!(!validate_actor_id("a/b"));
        assert!(!validate_actor_id(&"a".repeat(MAX_ACTOR_ID_LEN + 1)));
    }

    #[test]
    fn test_timestamp_conversion() {
        let millis = rfc3339_to_timestamp("2024-12-10T00:00:00Z").unwrap();
        assert_eq!(millis, 1_733_788_800_000);
        assert_eq!(timestamp_to_rfc3339(millis), "2024-12-10T00:00:00+00:00");
    }

    #[test]
    fn test_invalid_timestamp() {
        assert!(matches!(
            rfc3339_to_timestamp("next tuesday"),
            Err(AppError::Validation(_))
        ));
    }
}
