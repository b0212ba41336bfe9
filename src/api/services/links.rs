//! 需要登录的链接管理接口

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::middleware::Principal;
use crate::services::{CreateLinkRequest, LinkService};
use crate::storage::LinkState;

use super::helpers::api_result;

/// `POST /api/shorten` 请求体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenBody {
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// `PUT /api/toggle/{id}` 响应体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub success: bool,
    pub is_active: bool,
    pub password_attempts: i32,
    pub message: &'static str,
}

impl From<LinkState> for ToggleResponse {
    fn from(state: LinkState) -> Self {
        Self {
            success: true,
            is_active: state.is_active,
            password_attempts: state.password_attempts,
            message: if state.is_active {
                "Link enabled"
            } else {
                "Link disabled"
            },
        }
    }
}

/// `PUT /api/reset-attempts/{id}` 响应体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetAttemptsResponse {
    pub success: bool,
    pub password_attempts: i32,
    pub message: &'static str,
}

pub struct LinkApi;

impl LinkApi {
    pub async fn shorten(
        service: web::Data<Arc<LinkService>>,
        principal: web::ReqData<Principal>,
        body: web::Json<ShortenBody>,
    ) -> impl Responder {
        let body = body.into_inner();
        let req = CreateLinkRequest {
            original_url: body.original_url,
            password: body.password,
        };

        api_result(service.create_link(&principal.user_id, req).await)
    }

    pub async fn list(
        service: web::Data<Arc<LinkService>>,
        principal: web::ReqData<Principal>,
    ) -> impl Responder {
        api_result(service.list_links(&principal.user_id).await)
    }

    pub async fn toggle(
        service: web::Data<Arc<LinkService>>,
        principal: web::ReqData<Principal>,
        id: web::Path<String>,
    ) -> impl Responder {
        let result = service.toggle_status(&id, &principal.user_id).await;
        if let Ok(state) = &result {
            info!(
                "User {} toggled link {} (active: {})",
                principal.user_id, id, state.is_active
            );
        }
        api_result(result.map(ToggleResponse::from))
    }

    pub async fn reset_attempts(
        service: web::Data<Arc<LinkService>>,
        principal: web::ReqData<Principal>,
        id: web::Path<String>,
    ) -> HttpResponse {
        let result = service.reset_attempts(&id, &principal.user_id).await;
        api_result(result.map(|state| ResetAttemptsResponse {
            success: true,
            password_attempts: state.password_attempts,
            message: "Password attempts reset",
        }))
    }
}
