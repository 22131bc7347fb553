use jsonwebtoken::{DecodingKey, Validation};
use poem::{Error as PoemError, Result as PoemResult, http::StatusCode};
use poem_openapi::SecurityScheme;
use poem_openapi::auth::Bearer;
use serde::Deserialize;
use uuid::Uuid;

/// Bearer tokens are issued by the account tier; this service only
/// verifies them against the shared secret.
#[derive(SecurityScheme)]
#[oai(ty = "bearer", bearer_format = "JWT")]
pub struct JwtAuth(pub Bearer);

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Uuid,
    email: String,
    #[allow(dead_code)]
    exp: usize,
}

impl JwtAuth {
    pub fn into_user(self, config: &AuthConfig) -> PoemResult<AuthenticatedUser> {
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());
        match jsonwebtoken::decode::<Claims>(&self.0.token, &decoding, &Validation::default()) {
            Ok(data) => Ok(AuthenticatedUser {
                user_id: data.claims.sub,
                email: data.claims.email,
            }),
            Err(_) => Err(PoemError::from_string(
                "invalid or expired token",
                StatusCode::UNAUTHORIZED,
            )),
        }
    }
}
