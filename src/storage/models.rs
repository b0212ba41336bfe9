use chrono::{DateTime, Utc};
use serde::Serialize;

/// 一条短链接记录
///
/// `password_hash` 只在存储层和服务层之间流转，对外一律使用 [`LinkView`]。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortLink {
    pub id: String,
    pub owner_id: String,
    pub original_url: String,
    pub alias: String,
    pub clicks: i64,
    pub is_password_protected: bool,
    pub password_hash: Option<String>,
    pub password_attempts: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShortLink {
    /// 创建新链接，`is_password_protected` 由是否提供哈希决定
    pub fn new(
        owner_id: impl Into<String>,
        original_url: impl Into<String>,
        alias: impl Into<String>,
        password_hash: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            original_url: original_url.into(),
            alias: alias.into(),
            clicks: 0,
            is_password_protected: password_hash.is_some(),
            password_hash,
            password_attempts: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// 换一个 alias 重新插入（alias 冲突重试时使用）
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }
}

/// 对外返回的链接视图（不含密码哈希）
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinkView {
    pub id: String,
    pub owner_id: String,
    pub original_url: String,
    /// 与前端约定：列表接口中 `shortUrl` 字段存放 alias
    pub short_url: String,
    pub clicks: i64,
    pub is_password_protected: bool,
    pub password_attempts: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShortLink> for LinkView {
    fn from(link: ShortLink) -> Self {
        Self {
            id: link.id,
            owner_id: link.owner_id,
            original_url: link.original_url,
            short_url: link.alias,
            clicks: link.clicks,
            is_password_protected: link.is_password_protected,
            password_attempts: link.password_attempts,
            is_active: link.is_active,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

/// 管理操作之后的链接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkState {
    pub is_active: bool,
    pub password_attempts: i32,
}

/// 一次失败的密码尝试被记录后的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedAttempt {
    /// 已计入，`disabled` 表示本次是否触发了锁定
    Recorded { attempts: i32, disabled: bool },
    /// 链接在此之前已被禁用，本次未计入
    AlreadyDisabled,
}

/// 存储后端信息（用于健康检查）
#[derive(Serialize, Clone, Debug)]
pub struct StorageInfo {
    pub backend: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_link_defaults() {
        let link = ShortLink::new("user-1", "https://example.com", "abc123", None);

        assert_eq!(link.clicks, 0);
        assert_eq!(link.password_attempts, 0);
        assert!(link.is_active);
        assert!(!link.is_password_protected);
        assert!(link.password_hash.is_none());
        assert_eq!(link.created_at, link.updated_at);
        assert!(uuid::Uuid::parse_str(&link.id).is_ok());
    }

    #[test]
    fn test_protection_follows_hash() {
        let link = ShortLink::new("u", "https://x", "a", Some("$argon2id$...".to_string()));
        assert!(link.is_password_protected);
        assert!(link.password_hash.is_some());
    }

    #[test]
    fn test_with_alias_keeps_identity() {
        let link = ShortLink::new("u", "https://x", "first", None);
        let id = link.id.clone();
        let relabeled = link.with_alias("second");
        assert_eq!(relabeled.alias, "second");
        assert_eq!(relabeled.id, id);
    }

    #[test]
    fn test_view_omits_hash() {
        let link = ShortLink::new("u", "https://x", "abc", Some("secret-hash".to_string()));
        let json = serde_json::to_value(LinkView::from(link)).unwrap();

        assert_eq!(json["shortUrl"], "abc");
        assert_eq!(json["isPasswordProtected"], true);
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("secret-hash"));
    }
}
