use crate::storage::ShortLink;
use migration::entities::link;

/// 将 Sea-ORM Model 转换为 ShortLink
pub fn model_to_link(model: link::Model) -> ShortLink {
    ShortLink {
        id: model.id,
        owner_id: model.owner_id,
        original_url: model.original_url,
        alias: model.alias,
        clicks: model.clicks.max(0),
        is_password_protected: model.is_password_protected,
        password_hash: model.password_hash,
        password_attempts: model.password_attempts.max(0),
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// 将新建的 ShortLink 转换为 ActiveModel
///
/// 记录创建后只通过条件 UPDATE 修改，所以这里只有插入场景。
pub fn link_to_active_model(link: &ShortLink) -> link::ActiveModel {
    use sea_orm::ActiveValue::Set;

    link::ActiveModel {
        id: Set(link.id.clone()),
        owner_id: Set(link.owner_id.clone()),
        original_url: Set(link.original_url.clone()),
        alias: Set(link.alias.clone()),
        clicks: Set(link.clicks),
        is_password_protected: Set(link.is_password_protected),
        password_hash: Set(link.password_hash.clone()),
        password_attempts: Set(link.password_attempts),
        is_active: Set(link.is_active),
        created_at: Set(link.created_at),
        updated_at: Set(link.updated_at),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::ActiveValue;

    use super::*;

    fn model() -> link::Model {
        let now = Utc::now();
        link::Model {
            id: "0c3a".to_string(),
            owner_id: "alice".to_string(),
            original_url: "https://example.com".to_string(),
            alias: "abc123".to_string(),
            clicks: 42,
            is_password_protected: true,
            password_hash: Some("hash".to_string()),
            password_attempts: 2,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_model_to_link() {
        let link = model_to_link(model());

        assert_eq!(link.alias, "abc123");
        assert_eq!(link.owner_id, "alice");
        assert_eq!(link.clicks, 42);
        assert_eq!(link.password_attempts, 2);
        assert!(link.is_password_protected);
    }

    #[test]
    fn test_negative_counters_are_clamped() {
        let link = model_to_link(link::Model {
            clicks: -3,
            password_attempts: -1,
            ..model()
        });
        assert_eq!(link.clicks, 0);
        assert_eq!(link.password_attempts, 0);
    }

    #[test]
    fn test_link_to_active_model_sets_every_column() {
        let link = ShortLink::new("bob", "https://target.com", "xyz", None);
        let active = link_to_active_model(&link);

        assert!(matches!(active.id, ActiveValue::Set(ref id) if *id == link.id));
        assert!(matches!(active.alias, ActiveValue::Set(ref a) if a == "xyz"));
        assert!(matches!(active.password_hash, ActiveValue::Set(None)));
        assert!(matches!(active.is_active, ActiveValue::Set(true)));
        assert!(matches!(active.clicks, ActiveValue::Set(0)));
    }
}
