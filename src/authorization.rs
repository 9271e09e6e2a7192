use std::sync::Arc;

use axum::http::{HeaderMap, header};
use eyre::{Context, ContextCompat, ensure};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shuttle_runtime::SecretStore;
use tracing::{debug, error};

use crate::error::ApiError;
use crate::model::{User, UserId};
use crate::store::UserStore;

const BEARER_PREFIX: &str = "bearer ";
const TOKEN_SECRET_KEY: &str = "TOKEN_SECRET";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: Option<UserId>,
    iat: Option<i64>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token carries no user id")]
    MissingId,
}

/// Signs and verifies HS256 bearer tokens.
///
/// Keyed once from the process secret, which never changes afterwards.
/// Tokens carry no expiry.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn new(secret: impl AsRef<[u8]>) -> eyre::Result<Self> {
        let secret = secret.as_ref();
        ensure!(!secret.is_empty(), "token secret must not be empty");

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn from_secrets(secrets: &SecretStore) -> eyre::Result<Self> {
        let secret = secrets
            .get(TOKEN_SECRET_KEY)
            .with_context(|| format!("cannot get {TOKEN_SECRET_KEY}"))?;
        Self::new(secret).context("invalid token secret")
    }

    /// Issues a token for `user`, stamped with the current time.
    pub fn issue(&self, user: UserId) -> eyre::Result<String> {
        let claims = Claims {
            id: Some(user),
            iat: Some(chrono::Utc::now().timestamp()),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("cannot sign token")
    }

    /// Checks the signature and returns the user id the token was issued for.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })?;
        data.claims.id.ok_or(TokenError::MissingId)
    }
}

/// Raw token from an `Authorization: Bearer <token>` header, if any.
///
/// The scheme is matched case-insensitively. Any other shape is reported as
/// absent rather than as an error.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let scheme = value.get(..BEARER_PREFIX.len())?;
    if scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        value.get(BEARER_PREFIX.len()..)
    } else {
        None
    }
}

/// Admits requests that must carry a valid bearer token.
///
/// Cheaply cloneable.
#[derive(Clone)]
pub struct Authorization {
    keys: TokenKeys,
    users: Arc<dyn UserStore>,
}

impl Authorization {
    pub fn new(keys: TokenKeys, users: Arc<dyn UserStore>) -> Self {
        Self { keys, users }
    }

    /// Resolves the request's bearer token to an existing user.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<User, ApiError> {
        let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
        let id = self.keys.verify(token).map_err(|e| {
            debug!("rejecting token: {e}");
            ApiError::Unauthorized
        })?;
        match self.users.find_user(id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                debug!("token references unknown user {id}");
                Err(ApiError::Unauthorized)
            }
            Err(e) => {
                error!("cannot look up user {id}: {e:?}");
                Err(ApiError::Persistence)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use uuid::Uuid;

    use super::*;
    use crate::model::NewUser;
    use crate::store::MemoryStore;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn keys() -> TokenKeys {
        TokenKeys::new("correct horse battery staple").unwrap()
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("BEARER abc")), Some("abc"));
    }

    #[test]
    fn other_schemes_are_absent() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearerabc")), None);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(TokenKeys::new("").is_err());
    }

    #[test]
    fn issued_token_verifies() {
        let keys = keys();
        let id = Uuid::new_v4();
        let token = keys.issue(id).unwrap();
        assert_eq!(keys.verify(&token), Ok(id));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = TokenKeys::new("another secret").unwrap();
        let token = other.issue(Uuid::new_v4()).unwrap();
        assert_eq!(keys().verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let keys = keys();
        let original = keys.issue(Uuid::new_v4()).unwrap();
        let other = keys.issue(Uuid::new_v4()).unwrap();
        let original: Vec<&str> = original.split('.').collect();
        let other: Vec<&str> = other.split('.').collect();
        // claims of one token under the signature of another
        let tampered = format!("{}.{}.{}", original[0], other[1], original[2]);
        assert_eq!(keys.verify(&tampered), Err(TokenError::BadSignature));
        assert_eq!(keys.verify("not-a-token"), Err(TokenError::Malformed));
    }

    #[test]
    fn claims_without_id_are_rejected() {
        let keys = keys();
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "iat": 1 }),
            &keys.encoding,
        )
        .unwrap();
        assert_eq!(keys.verify(&token), Err(TokenError::MissingId));
    }

    #[test]
    fn unsigned_tokens_are_rejected() {
        let keys = keys();
        let token = keys.issue(Uuid::new_v4()).unwrap();
        let (unsigned, _) = token.rsplit_once('.').unwrap();
        assert_eq!(keys.verify(&format!("{unsigned}.")), Err(TokenError::BadSignature));
    }

    async fn gate_with_user() -> (Authorization, User) {
        let store = Arc::new(MemoryStore::new());
        let user = NewUser {
            username: "tfarrell01".into(),
            name: "Tim Farrell".into(),
            password_hash: "hash".into(),
        }
        .into_user()
        .unwrap();
        assert!(store.insert_user(user.clone()).await.unwrap());
        (Authorization::new(keys(), store), user)
    }

    #[tokio::test]
    async fn authenticate_resolves_user() {
        let (gate, user) = gate_with_user().await;
        let token = keys().issue(user.id).unwrap();
        let resolved = gate
            .authenticate(&headers(&format!("bearer {token}")))
            .await
            .unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn authenticate_without_token_is_unauthorized() {
        let (gate, _) = gate_with_user().await;
        let res = gate.authenticate(&HeaderMap::new()).await;
        assert!(matches!(res, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn authenticate_unknown_user_is_unauthorized() {
        let (gate, _) = gate_with_user().await;
        let token = keys().issue(Uuid::new_v4()).unwrap();
        let res = gate
            .authenticate(&headers(&format!("Bearer {token}")))
            .await;
        assert!(matches!(res, Err(ApiError::Unauthorized)));
    }
}
