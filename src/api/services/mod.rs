mod error_code;
mod health;
mod helpers;
mod links;
mod redirect;

use std::sync::Arc;

use actix_web::web;

pub use error_code::ErrorCode;
pub use health::{AppStartTime, HealthService, health_routes};
pub use helpers::{api_result, error_from_guardlink, error_response, json_config, json_response};
pub use links::LinkApi;
pub use redirect::{
    ClientIpKeyExtractor, PasswordPage, RedirectService, VerifyRateLimit, verify_rate_limit,
};

use crate::api::middleware::UserAuth;
use crate::services::LinkService;
use crate::storage::SeaOrmStorage;

/// 应用共享状态
///
/// 在 `HttpServer::new` 之前构建一次，每个 worker 克隆使用。
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub storage: Arc<SeaOrmStorage>,
    pub password_page: PasswordPage,
    pub verify_rate_limit: Option<VerifyRateLimit>,
    pub start_time: AppStartTime,
}

/// `/api` 下的路由
///
/// 固定路径必须在 `/{alias}` 之前注册。
pub fn api_routes(verify_rate_limit: Option<&VerifyRateLimit>) -> actix_web::Scope {
    web::scope("/api")
        .route(
            "/shorten",
            web::post().to(LinkApi::shorten).wrap(UserAuth),
        )
        .route("/urls", web::get().to(LinkApi::list).wrap(UserAuth))
        .route(
            "/verify-password",
            redirect::rate_limited(
                web::post().to(RedirectService::verify_password),
                verify_rate_limit,
            ),
        )
        .route(
            "/toggle/{id}",
            web::put().to(LinkApi::toggle).wrap(UserAuth),
        )
        .route(
            "/reset-attempts/{id}",
            web::put().to(LinkApi::reset_attempts).wrap(UserAuth),
        )
        .route("/{alias}", web::get().to(RedirectService::handle_redirect))
}

/// 注册全部路由与共享数据
///
/// 服务启动和集成测试共用这一份配置。
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.link_service.clone()))
        .app_data(web::Data::new(state.storage.clone()))
        .app_data(web::Data::new(state.password_page.clone()))
        .app_data(web::Data::new(state.start_time.clone()))
        .app_data(json_config())
        .service(health_routes())
        .service(api_routes(state.verify_rate_limit.as_ref()))
        .route("/{alias}", web::get().to(RedirectService::handle_redirect));
}
