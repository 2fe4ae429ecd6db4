//! Bearer-JWT extractor. Identity itself is resolved upstream; this only
//! verifies the token and turns its claims into a [`Caller`].

use actix_web::{
    dev::Payload, error::ErrorUnauthorized, web, FromRequest, HttpRequest,
    Result as ActixResult,
};
use futures_util::future::{ready, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::game::types::Caller;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identity reference of the caller.
    pub sub: String,
    /// May this identity create games?
    #[serde(default)]
    pub gm: bool,
    pub exp: usize,
}

/// HMAC secret shared with the identity provider.
#[derive(Clone)]
pub struct AuthKeys {
    secret: Vec<u8>,
}

impl AuthKeys {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        AuthKeys {
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn decode(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::default(),
        )
        .ok()
        .map(|data| data.claims)
    }

    /// Mints a token; used by tooling and tests.
    pub fn issue(&self, claims: &Claims) -> jsonwebtoken::errors::Result<String> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(&self.secret),
        )
    }
}

/// Extracts and validates a Bearer-JWT, exposing the resolved caller.
#[derive(Debug, Clone)]
pub struct JwtAuth(pub Caller);

impl FromRequest for JwtAuth {
    type Error = actix_web::Error;
    type Future = Ready<ActixResult<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
        let res = (|| {
            // Expect:  Authorization: Bearer <JWT>
            let hdr = req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| ErrorUnauthorized("missing Authorization header"))?;

            let token = hdr
                .strip_prefix("Bearer ")
                .ok_or_else(|| ErrorUnauthorized("malformed Authorization header"))?;

            let keys = req
                .app_data::<web::Data<AuthKeys>>()
                .ok_or_else(|| ErrorUnauthorized("server mis-config"))?;
            let claims = keys
                .decode(token)
                .ok_or_else(|| ErrorUnauthorized("invalid / expired token"))?;

            if claims.sub.trim().is_empty() {
                return Err(ErrorUnauthorized("bad sub"));
            }

            Ok(JwtAuth(Caller {
                identity: claims.sub,
                gm_eligible: claims.gm,
            }))
        })();

        ready(res)
    }
}
