use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::schema::{Id, User};
use crate::error::ActionError;
use crate::schema::UserRole;

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    pub user_uid: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String, uid: UserRole, lifetime_hours: i64) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(lifetime_hours)).timestamp();

        Self {
            user_id: id,
            username,
            user_uid: uid,
            iat,
            exp,
        }
    }
}

/// The acting user, passed explicitly to every action that needs one.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
    pub user_uid: UserRole,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ActionError> {
        if !action.authenticate(&self) {
            return Err(ActionError::unauthorized(
                "You don't have permission to perform this action",
            ));
        }
        Ok(())
    }

    /// `own` is enough for rows owned by the session user, anything else needs `all`.
    pub fn authorize_owned(
        &self,
        owner_id: Id,
        own: ActionType,
        all: ActionType,
    ) -> Result<(), ActionError> {
        self.authenticate(own)?;

        match self.authenticate(all) {
            Ok(_) => Ok(()),
            Err(e) => {
                if owner_id != self.user_id {
                    Err(e)
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl Into<SessionData> for JwtSessionData {
    fn into(self) -> SessionData {
        SessionData {
            username: self.username,
            user_id: self.user_id,
            user_uid: self.user_uid,
        }
    }
}

fn signing_key(secret: &[u8]) -> Result<Hmac<Sha256>, ActionError> {
    Hmac::new_from_slice(secret).map_err(|_| ActionError::internal("Invalid session signing key"))
}

pub fn generate_jwt_session(
    user: &User,
    secret: &[u8],
    lifetime_hours: i64,
) -> Result<String, ActionError> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(
        user.id,
        user.username.to_owned(),
        user.uid.to_owned(),
        lifetime_hours,
    );

    claims
        .sign_with_key(&key)
        .map_err(|e| ActionError::Internal(format!("Failed to sign session: {e}")))
}

pub fn verify_jwt_session(token: &str, secret: &[u8]) -> Result<JwtSessionData, ActionError> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| ActionError::unauthorized("Invalid Session; Invalid token"))?;

    let now = Local::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(ActionError::unauthorized("Invalid session; Token expired"));
    }

    Ok(session)
}
