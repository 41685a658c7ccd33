use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use mongodb::bson::oid::ObjectId;

use super::Credentials;
use crate::db::Repository;
use crate::errors::ApiError;
use crate::models::user::{User, UserRole, ADMIN_ROLES};
use crate::state::AppState;

/// Resolves credentials to the stored user they were issued for.
pub async fn verify_user(
    credentials: &Credentials,
    users: &dyn Repository<User>,
) -> Result<User, ApiError> {
    let claims = match credentials {
        Credentials::Missing => return Err(ApiError::unauthorized("No token provided")),
        Credentials::Invalid => return Err(ApiError::unauthorized("Invalid token")),
        Credentials::Valid(claims) => claims,
    };

    let id = ObjectId::parse_str(&claims.sub).map_err(|_| ApiError::unauthorized("Invalid token"))?;
    users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))
}

pub async fn authorize(
    credentials: &Credentials,
    users: &dyn Repository<User>,
    allowed: &[UserRole],
) -> Result<User, ApiError> {
    let user = verify_user(credentials, users).await?;
    if allowed.contains(&user.role) {
        Ok(user)
    } else {
        log::warn!("User {} denied: role {:?} not in {:?}", user.email, user.role, allowed);
        Err(ApiError::Forbidden("Insufficient permissions".into()))
    }
}

/// Route middleware admitting only the given roles. The resolved [`User`] is
/// handed to the handler through `web::ReqData<User>`.
#[derive(Clone, Copy)]
pub struct RoleGate {
    allowed: &'static [UserRole],
}

impl RoleGate {
    pub fn admin() -> Self {
        RoleGate { allowed: ADMIN_ROLES }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RoleGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RoleGateMiddleware {
            service: Rc::new(service),
            allowed: self.allowed,
        }))
    }
}

pub struct RoleGateMiddleware<S> {
    service: Rc<S>,
    allowed: &'static [UserRole],
}

impl<S, B> Service<ServiceRequest> for RoleGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let allowed = self.allowed;

        Box::pin(async move {
            let credentials = Credentials::from_extensions(&req.extensions());
            let state = req.app_data::<web::Data<AppState>>().cloned();

            let outcome = match state {
                Some(state) => authorize(&credentials, state.users.as_ref(), allowed).await,
                None => Err(ApiError::internal("Application state is not configured")),
            };

            match outcome {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                // Answer before any extractor reads the body.
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}
