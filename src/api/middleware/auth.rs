use std::rc::Rc;

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, trace};

use crate::api::jwt::get_jwt_service;
use crate::api::services::{ErrorCode, error_response};

/// 通过认证的调用者
///
/// 由 [`UserAuth`] 写入请求扩展，handler 通过 `web::ReqData<Principal>` 取用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
}

/// Bearer token authentication middleware
#[derive(Clone)]
pub struct UserAuth;

impl<S, B> Transform<S, ServiceRequest> for UserAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = UserAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(UserAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct UserAuthMiddleware<S> {
    service: Rc<S>,
}

/// 从 Authorization header 提取 Bearer token
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 校验 token 并取出用户 ID
fn authenticate(req: &ServiceRequest) -> Option<Principal> {
    let token = extract_bearer_token(req)?;

    match get_jwt_service().validate_access_token(&token) {
        Ok(claims) => {
            trace!("Bearer token accepted for user {}", claims.sub);
            Some(Principal {
                user_id: claims.sub,
            })
        }
        Err(e) => {
            debug!("Bearer token validation failed: {}", e);
            None
        }
    }
}

impl<S, B> Service<ServiceRequest> for UserAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            let Some(principal) = authenticate(&req) else {
                debug!("Rejected unauthenticated request to {}", req.path());
                return Ok(req.into_response(
                    error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::TokenInvalid,
                        "Unauthorized: Invalid or missing token",
                    )
                    .map_into_right_body(),
                ));
            };

            req.extensions_mut().insert(principal);
            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}
