use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::api::services::{AppStartTime, AppState, PasswordPage, verify_rate_limit};
use crate::config::StaticConfig;
use crate::services::LinkService;
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub state: AppState,
}

/// 准备服务器启动的上下文
///
/// 连接存储、执行迁移、加载密码输入页并构建共享的限流器。
pub async fn prepare_server_startup(
    config: &StaticConfig,
    start_time: AppStartTime,
) -> Result<StartupContext> {
    let started = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.info().backend);

    let link_count = storage
        .count()
        .await
        .context("Failed to query link count")?;
    info!("{} short links in storage", link_count);

    let password_page = PasswordPage::load(config.redirect.password_prompt_page.as_deref())
        .context("Failed to load password prompt page")?;

    let verify_rate_limit =
        verify_rate_limit(&config.rate_limit).context("Failed to build rate limiter")?;
    log_rate_limit_mode(config);

    if config.auth.jwt_secret.is_empty() {
        warn!("auth.jwt_secret is empty: tokens will not survive a restart");
    }

    let state = AppState {
        link_service: Arc::new(LinkService::new(storage.clone())),
        storage: storage.clone(),
        password_page,
        verify_rate_limit,
        start_time,
    };

    debug!(
        "Pre-startup processing completed in {} ms",
        started.elapsed().as_millis()
    );

    Ok(StartupContext { storage, state })
}

fn log_rate_limit_mode(config: &StaticConfig) {
    let rate_limit = &config.rate_limit;
    if !rate_limit.enabled {
        warn!("Verify-password rate limiting is disabled");
    } else if rate_limit.trusted_proxies.is_empty() {
        info!("Verify-password rate limiting keyed on peer address (no trusted proxies)");
    } else {
        info!(
            "Verify-password rate limiting: trusting X-Forwarded-For from {:?}",
            rate_limit.trusted_proxies
        );
    }
}
