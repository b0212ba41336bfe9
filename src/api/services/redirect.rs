//! 公开接口：alias 跳转与密码校验

use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError,
};
use actix_web::dev::ServiceRequest;
use actix_web::{HttpResponse, Responder, web};
use governor::middleware::NoOpMiddleware;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::RateLimitConfig;
use crate::errors::{GuardlinkError, Result};
use crate::services::{LinkService, ResolveOutcome};
use crate::utils::encode_location;
use crate::utils::ip::client_ip;

use super::helpers::{api_result, error_from_guardlink};

const PASSWORD_PROMPT_ASSET: &str = "password-prompt.html";

#[derive(Embed)]
#[folder = "assets/"]
struct PromptAssets;

/// 受保护链接返回的密码输入页
///
/// 启动时加载一次：优先读取 `redirect.password_prompt_page` 指定的文件，
/// 否则使用编译进二进制的默认页面。
#[derive(Clone)]
pub struct PasswordPage(Arc<str>);

impl PasswordPage {
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(path) => {
                let html = std::fs::read_to_string(path).map_err(|e| {
                    GuardlinkError::file_operation(format!(
                        "无法读取密码输入页 {}: {}",
                        path, e
                    ))
                })?;
                info!("Using password prompt page from {}", path);
                Ok(Self(html.into()))
            }
            None => Self::embedded(),
        }
    }

    pub fn embedded() -> Result<Self> {
        let file = PromptAssets::get(PASSWORD_PROMPT_ASSET).ok_or_else(|| {
            GuardlinkError::internal(format!("Embedded asset {} missing", PASSWORD_PROMPT_ASSET))
        })?;
        Ok(Self(String::from_utf8_lossy(&file.data).into()))
    }

    pub fn html(&self) -> &str {
        &self.0
    }
}

/// 限流 key：客户端 IP（仅信任来自可信代理的转发头）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIpKeyExtractor {
    trusted_proxies: Arc<[String]>,
}

impl ClientIpKeyExtractor {
    pub fn new(trusted_proxies: &[String]) -> Self {
        Self {
            trusted_proxies: trusted_proxies.into(),
        }
    }
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(
        &self,
        req: &ServiceRequest,
    ) -> std::result::Result<Self::Key, Self::KeyExtractionError> {
        let conn_info = req.connection_info();
        client_ip(conn_info.peer_addr(), req.headers(), &self.trusted_proxies)
            .ok_or_else(|| SimpleKeyExtractionError::new("Unable to extract client IP"))
    }
}

pub type VerifyRateLimit = GovernorConfig<ClientIpKeyExtractor, NoOpMiddleware>;

/// 密码校验接口的限流配置，`rate_limit.enabled = false` 时返回 `None`
///
/// 返回的配置在所有 worker 之间共享同一个令牌桶。
pub fn verify_rate_limit(config: &RateLimitConfig) -> Result<Option<VerifyRateLimit>> {
    if !config.enabled {
        return Ok(None);
    }

    let seconds = config.verify_seconds_per_request.max(1);
    let burst = config.verify_burst.max(1);

    let governor = GovernorConfigBuilder::default()
        .seconds_per_request(seconds)
        .burst_size(burst)
        .key_extractor(ClientIpKeyExtractor::new(&config.trusted_proxies))
        .finish()
        .ok_or_else(|| GuardlinkError::internal("Invalid rate limit configuration"))?;

    debug!(
        "Verify-password rate limiter: 1 req/{}s, burst {}",
        seconds, burst
    );
    Ok(Some(governor))
}

/// 把限流配置挂到路由上
pub fn rate_limited(
    route: actix_web::Route,
    limit: Option<&VerifyRateLimit>,
) -> actix_web::Route {
    match limit {
        Some(config) => route.wrap(Governor::new(config)),
        None => route,
    }
}

/// `POST /api/verify-password` 请求体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPasswordBody {
    #[serde(default)]
    pub short_url: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPasswordResponse {
    pub original_url: String,
    pub success: bool,
}

pub struct RedirectService;

impl RedirectService {
    /// `GET /{alias}`
    pub async fn handle_redirect(
        alias: web::Path<String>,
        service: web::Data<Arc<LinkService>>,
        page: web::Data<PasswordPage>,
    ) -> impl Responder {
        let alias = alias.into_inner();
        trace!("Resolving alias '{}'", alias);

        match service.resolve(&alias).await {
            Ok(ResolveOutcome::Redirect(target)) => {
                debug!("Redirecting '{}' -> {}", alias, target);
                HttpResponse::Found()
                    .insert_header(("Location", encode_location(&target).as_ref()))
                    .insert_header(("Cache-Control", "no-store"))
                    .finish()
            }
            Ok(ResolveOutcome::RequiresPassword) => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .insert_header(("Cache-Control", "no-store"))
                .body(page.html().to_owned()),
            Err(e) => error_from_guardlink(&e),
        }
    }

    /// `POST /api/verify-password`
    pub async fn verify_password(
        service: web::Data<Arc<LinkService>>,
        body: web::Json<VerifyPasswordBody>,
    ) -> impl Responder {
        let body = body.into_inner();
        let short_url = body.short_url.unwrap_or_default();
        let password = body.password.unwrap_or_default();

        let result = service
            .verify_password(&short_url, &password)
            .await
            .map(|original_url| VerifyPasswordResponse {
                original_url,
                success: true,
            });
        api_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_page_posts_to_verify_endpoint() {
        let page = PasswordPage::embedded().unwrap();
        assert!(page.html().contains("/api/verify-password"));
    }

    #[test]
    fn test_load_page_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.html");
        std::fs::write(&path, "<p>custom</p>").unwrap();

        let page = PasswordPage::load(path.to_str()).unwrap();
        assert_eq!(page.html(), "<p>custom</p>");
    }

    #[test]
    fn test_missing_page_file_is_an_error() {
        assert!(matches!(
            PasswordPage::load(Some("/nonexistent/prompt.html")),
            Err(GuardlinkError::FileOperation(_))
        ));
    }

    #[test]
    fn test_blank_path_falls_back_to_embedded() {
        let page = PasswordPage::load(Some("  ")).unwrap();
        assert!(page.html().contains("password"));
    }

    #[test]
    fn test_rate_limit_disabled() {
        let config = RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        };
        assert!(verify_rate_limit(&config).unwrap().is_none());
    }

    #[test]
    fn test_rate_limit_clamps_zero_values() {
        let config = RateLimitConfig {
            verify_seconds_per_request: 0,
            verify_burst: 0,
            ..RateLimitConfig::default()
        };
        assert!(verify_rate_limit(&config).unwrap().is_some());
    }
}
