use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use crate::api::rest::AppState;
use crate::error::{Error, Result};
use crate::ledger::engine::Caller;
use crate::types::ids::UserId;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub exp: u64,     // Expiration time
    pub iat: u64,     // Issued at
}

/// HS256 bearer-token verification. Token issuance belongs to the
/// external auth service; this side only mints tokens for tooling and
/// verifies what callers present.
pub struct JwtAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtAuth {
    pub fn new(secret: &str) -> Self {
        JwtAuth {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn generate_token(&self, user_id: UserId, duration_secs: u64) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::AuthenticationError(e.to_string()))?
            .as_secs();

        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + duration_secs,
            iat: now,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| Error::AuthenticationError(e.to_string()))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::default(),
        ).map_err(|e| Error::AuthenticationError(e.to_string()))?;

        Ok(token_data.claims)
    }
}

/// The resolved caller, attached to the request after verification.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
}

impl AuthContext {
    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.user_id,
            email: self.email.clone(),
        }
    }
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let auth_header = request.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(Error::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(Error::Unauthorized)?
        .trim();

    let claims = state.auth.verify_token(token)?;
    let user_id = UserId::from_string(&claims.sub)
        .map_err(|e| Error::AuthenticationError(e.to_string()))?;

    // Tokens for deactivated accounts verify but must not resolve.
    let account = state
        .identities
        .find_by_id(user_id)
        .await?
        .ok_or(Error::Unauthorized)?;

    request.extensions_mut().insert(AuthContext {
        user_id: account.user_id,
        email: account.email,
        display_name: account.display_name,
    });

    Ok(next.run(request).await)
}
