use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::SESSION_LIFETIME_HOURS;
use crate::database::error::ApiError;
use crate::database::schema::{Id, User, UserRole};

use super::permissions::ActionType;

/// HMAC key shared by every request handler.
#[derive(Clone)]
pub struct SessionKey(Hmac<Sha256>);

impl SessionKey {
    pub fn new(secret: &str) -> Result<Self, ApiError> {
        Hmac::new_from_slice(secret.as_bytes())
            .map(Self)
            .map_err(|_| ApiError::Internal(String::from("Invalid session key")))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub version: i32,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, email: String, role: UserRole) -> Self {
        Self::with_lifetime(id, email, role, Duration::hours(SESSION_LIFETIME_HOURS))
    }

    pub fn with_lifetime(id: Id, email: String, role: UserRole, lifetime: Duration) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + lifetime).timestamp();

        Self {
            user_id: id,
            email,
            role,
            version: 0,
            iat,
            exp,
        }
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: Id,
    pub email: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(ApiError::Forbidden);
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            email: value.email,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

pub fn sign_jwt_session(key: &SessionKey, claims: &JwtSessionData) -> Result<String, ApiError> {
    claims
        .sign_with_key(&key.0)
        .map_err(|e| ApiError::Internal(format!("Could not sign session: {e}")))
}

pub fn generate_jwt_session(key: &SessionKey, user: &User) -> Result<String, ApiError> {
    let claims = JwtSessionData::new(user.id, user.email.to_owned(), user.role.to_owned())
        .with_version(user.token_version);

    sign_jwt_session(key, &claims)
}

pub fn verify_jwt_session(key: &SessionKey, token: &str) -> Result<JwtSessionData, ApiError> {
    let session: JwtSessionData = token
        .verify_with_key(&key.0)
        .map_err(|_| ApiError::InvalidSession(String::from("Invalid token")))?;

    let now = Local::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(ApiError::InvalidSession(String::from("Token expired")));
    }

    Ok(session)
}
