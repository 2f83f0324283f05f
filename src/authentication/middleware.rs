use std::sync::Arc;

use warp::{
    reject::{self, Rejection},
    Filter,
};

use crate::{constants::TOKEN_PREFIX, error::ActionError};

use super::jwt::{verify_jwt_session, SessionData};

#[derive(Debug)]
pub struct Unauthorized;

impl reject::Reject for Unauthorized {}

/// Extracts the token from an `Authorization: Token <jwt>` header value.
pub fn parse_authorization(header: &str) -> Option<&str> {
    header
        .strip_prefix(TOKEN_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn session_from_header(header: &str, secret: &[u8]) -> Result<SessionData, ActionError> {
    let token = parse_authorization(header)
        .ok_or_else(|| ActionError::unauthorized("Invalid Session; Malformed authorization header"))?;

    verify_jwt_session(token, secret).map(Into::into)
}

pub fn with_session(
    secret: Arc<[u8]>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::<String>("authorization").and_then(move |header: String| {
        let secret = secret.clone();
        async move {
            match session_from_header(&header, &secret) {
                Ok(session) => Ok(session),
                Err(e) => {
                    log::debug!("Rejected session: {e}");
                    Err(warp::reject::custom(Unauthorized))
                }
            }
        }
    })
}

/// Like `with_session`, but anonymous requests pass through as `None`.
pub fn with_possible_session(
    secret: Arc<[u8]>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").map(move |header: Option<String>| {
        header.and_then(|header| session_from_header(&header, &secret).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{jwt::generate_jwt_session, schema::{User, UserRole}};

    fn secret() -> Arc<[u8]> {
        Arc::from(&b"secret"[..])
    }

    fn token() -> String {
        let user = User {
            id: 9,
            email: "baker@example.com".to_string(),
            username: "baker".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password: String::new(),
            uid: UserRole::User,
        };
        generate_jwt_session(&user, b"secret", 1).unwrap()
    }

    #[test]
    fn parses_token_header() {
        assert_eq!(parse_authorization("Token abc.def"), Some("abc.def"));
        assert_eq!(parse_authorization("Bearer abc.def"), None);
        assert_eq!(parse_authorization("Token "), None);
    }

    #[tokio::test]
    async fn session_filter_accepts_valid_token() {
        let session = warp::test::request()
            .header("authorization", format!("Token {}", token()))
            .filter(&with_session(secret()))
            .await
            .unwrap();

        assert_eq!(session.user_id, 9);
    }

    #[tokio::test]
    async fn session_filter_rejects_garbage() {
        let result = warp::test::request()
            .header("authorization", "Token nope")
            .filter(&with_session(secret()))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn possible_session_is_none_for_anonymous() {
        let session = warp::test::request()
            .filter(&with_possible_session(secret()))
            .await
            .unwrap();

        assert!(session.is_none());
    }
}
