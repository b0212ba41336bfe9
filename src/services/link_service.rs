//! Link service
//!
//! 创建、列出、解析短链接，密码校验与锁定，以及所有者的启停 / 重置操作。
//! HTTP 层只做参数提取与响应序列化，业务规则都在这里。

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::get_config;
use crate::errors::{GuardlinkError, Result};
use crate::storage::{FailedAttempt, InsertOutcome, LinkState, LinkView, SeaOrmStorage, ShortLink};
use crate::utils::password::{process_new_password, verify_password};
use crate::utils::{extract_alias, generate_random_code, is_reserved_alias, is_valid_alias};

/// 连续输错密码达到该次数后链接自动禁用
pub const LOCKOUT_THRESHOLD: i32 = 5;

// ============ Request/Response DTOs ============

/// 创建链接请求
#[derive(Debug, Clone, Default)]
pub struct CreateLinkRequest {
    pub original_url: Option<String>,
    /// 空字符串等同于不设密码
    pub password: Option<String>,
}

/// 创建成功后返回给调用方的信息
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLink {
    pub original_url: String,
    pub short_url: String,
    pub id: String,
    pub is_password_protected: bool,
    /// 不参与序列化，供日志与测试使用
    #[serde(skip)]
    pub alias: String,
}

/// 解析 alias 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// 已计入点击，跳转到目标地址
    Redirect(String),
    /// 需要先输入密码
    RequiresPassword,
}

/// alias 生成器签名，参数为期望长度
pub type AliasGenerator = fn(usize) -> String;

/// LinkService 的可调参数
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub alias_length: usize,
    pub max_alias_attempts: u32,
    /// 拼接 shortUrl 使用的对外地址，不含结尾 `/`
    pub base_url: String,
    pub alias_generator: AliasGenerator,
}

impl LinkSettings {
    /// 从全局配置读取
    pub fn from_config() -> Self {
        let config = get_config();
        Self {
            alias_length: config.features.alias_length,
            max_alias_attempts: config.features.max_alias_attempts,
            base_url: config.server.base_url(),
            alias_generator: generate_random_code,
        }
    }
}

// ============ LinkService Implementation ============

pub struct LinkService {
    storage: Arc<SeaOrmStorage>,
    settings: LinkSettings,
}

impl LinkService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self::with_settings(storage, LinkSettings::from_config())
    }

    pub fn with_settings(storage: Arc<SeaOrmStorage>, settings: LinkSettings) -> Self {
        Self { storage, settings }
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }

    pub fn short_url_for(&self, alias: &str) -> String {
        format!("{}/{}", self.settings.base_url, alias)
    }

    /// 创建短链接
    ///
    /// alias 随机生成；撞上已有 alias 时重新生成，最多尝试 `max_alias_attempts` 次。
    pub async fn create_link(
        &self,
        owner_id: &str,
        req: CreateLinkRequest,
    ) -> Result<CreatedLink> {
        let original_url = req
            .original_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GuardlinkError::bad_request("URL is required"))?
            .to_string();

        let password_hash = process_new_password(req.password.as_deref()).map_err(|e| {
            error!("Failed to hash password: {}", e);
            GuardlinkError::from(e)
        })?;

        let generate = self.settings.alias_generator;
        let mut link = ShortLink::new(
            owner_id,
            original_url,
            generate(self.settings.alias_length),
            password_hash,
        );

        let attempts = self.settings.max_alias_attempts.max(1);
        for attempt in 1..=attempts {
            let outcome = if is_reserved_alias(&link.alias) {
                InsertOutcome::AliasTaken
            } else {
                self.storage.insert(&link).await?
            };

            match outcome {
                InsertOutcome::Inserted => {
                    info!(
                        "LinkService: created link '{}' -> '{}' (protected: {})",
                        link.alias, link.original_url, link.is_password_protected
                    );
                    return Ok(CreatedLink {
                        short_url: self.short_url_for(&link.alias),
                        original_url: link.original_url,
                        id: link.id,
                        is_password_protected: link.is_password_protected,
                        alias: link.alias,
                    });
                }
                InsertOutcome::AliasTaken => {
                    debug!(
                        "Alias '{}' taken, regenerating ({}/{})",
                        link.alias, attempt, attempts
                    );
                    link = link.with_alias(generate(self.settings.alias_length));
                }
            }
        }

        error!("Gave up generating a unique alias after {} attempts", attempts);
        Err(GuardlinkError::internal("Failed to generate a unique alias"))
    }

    /// 列出调用者的全部链接，最新的在前
    pub async fn list_links(&self, owner_id: &str) -> Result<Vec<LinkView>> {
        let links = self.storage.list_by_owner(owner_id).await?;
        Ok(links.into_iter().map(LinkView::from).collect())
    }

    /// 解析 alias
    pub async fn resolve(&self, alias: &str) -> Result<ResolveOutcome> {
        if !is_valid_alias(alias) {
            return Err(GuardlinkError::not_found("URL not found"));
        }

        let link = self
            .storage
            .get_by_alias(alias)
            .await?
            .ok_or_else(|| GuardlinkError::not_found("URL not found"))?;

        if !link.is_active {
            return Err(GuardlinkError::forbidden("This link has been disabled"));
        }

        if link.is_password_protected {
            debug!("Alias '{}' requires a password", alias);
            return Ok(ResolveOutcome::RequiresPassword);
        }

        // 读取之后可能被并发禁用，计数更新本身带 is_active 条件
        if !self.storage.increment_clicks(alias).await? {
            return Err(GuardlinkError::forbidden("This link has been disabled"));
        }

        Ok(ResolveOutcome::Redirect(link.original_url))
    }

    /// 校验受保护链接的密码
    ///
    /// `short_url` 可以是 alias，也可以是完整短链接。成功时返回目标地址并计入一次点击；
    /// 失败时累计失败次数，第 [`LOCKOUT_THRESHOLD`] 次失败会同时禁用链接。
    pub async fn verify_password(&self, short_url: &str, password: &str) -> Result<String> {
        if short_url.trim().is_empty() || password.is_empty() {
            return Err(GuardlinkError::bad_request(
                "Short URL and password are required",
            ));
        }

        let alias = extract_alias(short_url);
        if !is_valid_alias(alias) {
            return Err(GuardlinkError::not_found("URL not found"));
        }

        let link = self
            .storage
            .get_by_alias(alias)
            .await?
            .ok_or_else(|| GuardlinkError::not_found("URL not found"))?;

        if !link.is_active {
            return Err(GuardlinkError::forbidden("This link has been disabled"));
        }

        let hash = match (&link.password_hash, link.is_password_protected) {
            (Some(hash), true) => hash.clone(),
            _ => {
                return Err(GuardlinkError::bad_request(
                    "URL is not password protected",
                ));
            }
        };

        if check_password(password.to_string(), hash).await? {
            if !self.storage.increment_clicks(alias).await? {
                return Err(GuardlinkError::forbidden("This link has been disabled"));
            }
            debug!("Password accepted for alias '{}'", alias);
            return Ok(link.original_url);
        }

        match self
            .storage
            .record_failed_attempt(&link.id, LOCKOUT_THRESHOLD)
            .await?
        {
            FailedAttempt::Recorded { attempts, disabled } => {
                debug!(
                    "Wrong password for alias '{}' (attempts: {}, disabled: {})",
                    alias, attempts, disabled
                );
                Err(GuardlinkError::invalid_password(attempts, disabled))
            }
            FailedAttempt::AlreadyDisabled => {
                Err(GuardlinkError::forbidden("This link has been disabled"))
            }
        }
    }

    /// 切换启用状态（仅所有者）
    pub async fn toggle_status(&self, id: &str, owner_id: &str) -> Result<LinkState> {
        self.storage
            .toggle_active(id, owner_id)
            .await?
            .ok_or_else(|| GuardlinkError::not_found("URL not found"))
    }

    /// 失败次数清零（仅所有者），幂等
    pub async fn reset_attempts(&self, id: &str, owner_id: &str) -> Result<LinkState> {
        self.storage
            .reset_attempts(id, owner_id)
            .await?
            .ok_or_else(|| GuardlinkError::not_found("URL not found"))
    }
}

/// Argon2 校验是 CPU 密集操作，放到阻塞线程池执行
async fn check_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| GuardlinkError::internal(format!("Password check task failed: {}", e)))?
        .map_err(|e| {
            error!("Stored password hash is unreadable: {}", e);
            GuardlinkError::from(e)
        })
}
