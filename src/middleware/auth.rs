use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::{
    dev::{forward_ready, Extensions, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderMap},
    Error, HttpMessage, HttpRequest,
};

use crate::auth::{Claims, TokenService};

/// Outcome of reading the bearer token, stored in request extensions by [`Authentication`].
#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    Missing,
    Invalid,
    Valid(Claims),
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap, tokens: &TokenService) -> Self {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|auth_header| auth_header.to_str().ok())
            .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        match token {
            None => Credentials::Missing,
            Some(token) => match tokens.verify(token) {
                Ok(claims) => Credentials::Valid(claims),
                Err(e) => {
                    log::debug!("Rejected bearer token: {}", e);
                    Credentials::Invalid
                }
            },
        }
    }

    /// What [`Authentication`] recorded; `Missing` when it never ran.
    pub fn from_extensions(extensions: &Extensions) -> Self {
        extensions
            .get::<Credentials>()
            .cloned()
            .unwrap_or(Credentials::Missing)
    }

    pub fn of(req: &HttpRequest) -> Self {
        Self::from_extensions(&req.extensions())
    }
}

/// Decodes the `Authorization` header once per request. It never rejects a
/// request; routes that need a principal are wrapped in [`super::RoleGate`].
pub struct Authentication {
    tokens: Arc<TokenService>,
}

impl Authentication {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Authentication { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddleware {
            service,
            tokens: Arc::clone(&self.tokens),
        }))
    }
}

pub struct AuthenticationMiddleware<S> {
    service: S,
    tokens: Arc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = S::Future;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let credentials = Credentials::from_headers(req.headers(), &self.tokens);
        req.extensions_mut().insert(credentials);
        self.service.call(req)
    }
}
