use std::future::{ready, Ready};

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use log::debug;
use uuid::Uuid;

use crate::errors::AppError;

use self::jwt::TokenKeys;

/// Identity of the caller, placed in request extensions by [`AuthMiddleware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAuthData {
    pub user_id: Uuid,
}

impl FromRequest for UserAuthData {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserAuthData>()
                .copied()
                .ok_or_else(|| AppError::unauthorized("missing bearer token")),
        )
    }
}

/// Validates `Authorization: Bearer` tokens.
///
/// Requests without the header pass through untouched and are turned away by
/// the [`UserAuthData`] extractor on protected handlers. A header that is
/// present but malformed, expired or wrongly signed is rejected right here.
pub struct AuthMiddleware {
    pub keys: TokenKeys,
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            keys: self.keys.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    keys: TokenKeys,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match jwt::parse_request(&req, "Bearer ") {
            Ok(None) => {}
            Ok(Some(token)) => match jwt::validate(&token, &self.keys) {
                Ok(user_id) => {
                    req.extensions_mut().insert(UserAuthData { user_id });
                }
                Err(err) => {
                    debug!("rejected bearer token: {}", err);
                    return Box::pin(async move { Err(err.into()) });
                }
            },
            Err(err) => return Box::pin(async move { Err(err.into()) }),
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}

pub mod jwt {
    use actix_web::dev::ServiceRequest;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{
        decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
    };
    use uuid::Uuid;

    use crate::{dto::Claims, errors::AppError};

    pub const TOKEN_TTL_DAYS: i64 = 7;

    /// HMAC keys derived from the configured secret.
    #[derive(Clone)]
    pub struct TokenKeys {
        encoding: EncodingKey,
        decoding: DecodingKey,
    }

    impl TokenKeys {
        pub fn new(secret: &str) -> Self {
            Self {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }
        }
    }

    pub fn create(user_id: Uuid, keys: &TokenKeys) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims::new(
            user_id,
            now.timestamp() as usize,
            (now + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
        );
        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AppError::internal(format!("token creation failed: {e}")))
    }

    /// Returns the user id carried by a valid token.
    ///
    /// Only the HMAC family is accepted, whatever the token header claims.
    pub fn validate(token: &str, keys: &TokenKeys) -> Result<Uuid, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;

        decode::<Claims>(token, &keys.decoding, &validation)
            .map(|data| data.claims.user_id)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AppError::unauthorized("token expired"),
                ErrorKind::InvalidAlgorithm => AppError::unauthorized("unexpected signing method"),
                _ => AppError::unauthorized("invalid token"),
            })
    }

    /// `Ok(None)` when no Authorization header was sent.
    pub fn parse_request(req: &ServiceRequest, prefix: &str) -> Result<Option<String>, AppError> {
        let Some(auth_header) = req.headers().get("Authorization") else {
            return Ok(None);
        };
        let token = auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix(prefix))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized("malformed authorization header"))?;
        Ok(Some(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    use super::jwt::{self, TokenKeys};
    use super::*;
    use crate::dto::Claims;

    #[test]
    fn issued_token_resolves_to_the_same_user() {
        let keys = TokenKeys::new("unit-test-secret");
        let user_id = Uuid::new_v4();
        let token = jwt::create(user_id, &keys).unwrap();
        assert_eq!(jwt::validate(&token, &keys).unwrap(), user_id);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = jwt::create(Uuid::new_v4(), &TokenKeys::new("one")).unwrap();
        let err = jwt::validate(&token, &TokenKeys::new("two")).unwrap_err();
        assert_eq!(err, AppError::unauthorized("invalid token"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let secret = "unit-test-secret";
        let now = Utc::now().timestamp() as usize;
        let claims = Claims::new(Uuid::new_v4(), now - 3600, now - 60);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        let err = jwt::validate(&token, &TokenKeys::new(secret)).unwrap_err();
        assert_eq!(err, AppError::unauthorized("token expired"));
    }

    #[test]
    fn other_hmac_variants_are_accepted() {
        let secret = "unit-test-secret";
        let user_id = Uuid::new_v4();
        let now = Utc::now().timestamp() as usize;
        let token = encode(
            &Header::new(Algorithm::HS512),
            &Claims::new(user_id, now, now + 600),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        assert_eq!(jwt::validate(&token, &TokenKeys::new(secret)).unwrap(), user_id);
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = TokenKeys::new("unit-test-secret");
        assert!(jwt::validate("not.a.jwt", &keys).is_err());
        assert!(jwt::validate("", &keys).is_err());
    }
}
