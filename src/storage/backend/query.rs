//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::trace;

use super::converters::model_to_link;
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::ShortLink;

use migration::entities::link;

impl SeaOrmStorage {
    /// 按 alias 查找
    pub async fn get_by_alias(&self, alias: &str) -> Result<Option<ShortLink>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("get_by_alias({})", alias),
            self.retry_config,
            || async {
                link::Entity::find()
                    .filter(link::Column::Alias.eq(alias))
                    .one(db)
                    .await
            },
        )
        .await?;

        trace!("Lookup alias '{}': found={}", alias, model.is_some());
        Ok(model.map(model_to_link))
    }

    /// 列出某用户的全部链接，按创建时间倒序
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ShortLink>> {
        let db = &self.db;

        let models = retry::with_retry("list_by_owner", self.retry_config, || async {
            link::Entity::find()
                .filter(link::Column::OwnerId.eq(owner_id))
                .order_by_desc(link::Column::CreatedAt)
                .order_by_desc(link::Column::Id)
                .all(db)
                .await
        })
        .await?;

        Ok(models.into_iter().map(model_to_link).collect())
    }

    /// 链接总数
    pub async fn count(&self) -> Result<u64> {
        Ok(link::Entity::find().count(&self.db).await?)
    }

    /// 连通性检查
    pub async fn ping(&self) -> Result<()> {
        Ok(self.db.ping().await?)
    }
}
