//! Mutation operations for SeaOrmStorage
//!
//! 所有计数与状态变更都是带条件的单条 UPDATE（必要时在同一事务内回读），
//! 并发请求之间不会丢失增量。
//!
//! MySQL 的单表 UPDATE 按书写顺序求值 SET 子句，后面的表达式会看到前面
//! 已赋的新值，因此依赖旧值的列必须排在被修改的列之前。

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ExprTrait, QueryFilter,
    SqlErr, TransactionTrait, sea_query::Expr,
};
use tracing::{debug, info, warn};

use super::converters::link_to_active_model;
use super::{SeaOrmStorage, retry};
use crate::errors::{GuardlinkError, Result};
use crate::storage::ShortLink;
use crate::storage::models::{FailedAttempt, LinkState};

use migration::entities::link;

/// 插入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// alias 已被占用（唯一索引冲突）
    AliasTaken,
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// 失败尝试 +1，达到阈值时同一条语句内禁用
///
/// 只作用于仍处于启用状态的链接。
async fn bump_failed_attempts<C: ConnectionTrait>(
    conn: &C,
    id: &str,
    lockout_threshold: i32,
) -> std::result::Result<u64, DbErr> {
    let next_attempts = Expr::col(link::Column::PasswordAttempts).add(1);

    let result = link::Entity::update_many()
        .col_expr(
            link::Column::IsActive,
            Expr::case(next_attempts.clone().gte(lockout_threshold), Expr::val(false))
                .finally(Expr::col(link::Column::IsActive))
                .into(),
        )
        .col_expr(link::Column::PasswordAttempts, next_attempts)
        .col_expr(link::Column::UpdatedAt, Expr::val(Utc::now()))
        .filter(link::Column::Id.eq(id))
        .filter(link::Column::IsActive.eq(true))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// 翻转启用状态；由禁用转为启用时清零失败次数
async fn flip_active<C: ConnectionTrait>(
    conn: &C,
    id: &str,
    owner_id: &str,
) -> std::result::Result<u64, DbErr> {
    let result = link::Entity::update_many()
        .col_expr(
            link::Column::PasswordAttempts,
            Expr::case(Expr::col(link::Column::IsActive).eq(false), Expr::val(0))
                .finally(Expr::col(link::Column::PasswordAttempts))
                .into(),
        )
        .col_expr(link::Column::IsActive, Expr::col(link::Column::IsActive).not())
        .col_expr(link::Column::UpdatedAt, Expr::val(Utc::now()))
        .filter(link::Column::Id.eq(id))
        .filter(link::Column::OwnerId.eq(owner_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

async fn clear_attempts<C: ConnectionTrait>(
    conn: &C,
    id: &str,
    owner_id: &str,
) -> std::result::Result<u64, DbErr> {
    let result = link::Entity::update_many()
        .col_expr(link::Column::PasswordAttempts, Expr::val(0))
        .col_expr(link::Column::UpdatedAt, Expr::val(Utc::now()))
        .filter(link::Column::Id.eq(id))
        .filter(link::Column::OwnerId.eq(owner_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// 在事务中回读刚更新的行
async fn read_state<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> std::result::Result<Option<link::Model>, DbErr> {
    link::Entity::find_by_id(id.to_string()).one(conn).await
}

async fn record_failed_attempt_txn(
    db: &DatabaseConnection,
    id: &str,
    lockout_threshold: i32,
) -> std::result::Result<FailedAttempt, DbErr> {
    let txn = db.begin().await?;

    if bump_failed_attempts(&txn, id, lockout_threshold).await? == 0 {
        txn.rollback().await?;
        return Ok(FailedAttempt::AlreadyDisabled);
    }

    let model = read_state(&txn, id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("link {} vanished mid-transaction", id)))?;
    txn.commit().await?;

    Ok(FailedAttempt::Recorded {
        attempts: model.password_attempts,
        disabled: !model.is_active,
    })
}

async fn toggle_active_txn(
    db: &DatabaseConnection,
    id: &str,
    owner_id: &str,
) -> std::result::Result<Option<LinkState>, DbErr> {
    let txn = db.begin().await?;

    if flip_active(&txn, id, owner_id).await? == 0 {
        txn.rollback().await?;
        return Ok(None);
    }

    let state = read_state(&txn, id).await?.map(|m| LinkState {
        is_active: m.is_active,
        password_attempts: m.password_attempts,
    });
    txn.commit().await?;

    Ok(state)
}

async fn reset_attempts_txn(
    db: &DatabaseConnection,
    id: &str,
    owner_id: &str,
) -> std::result::Result<Option<LinkState>, DbErr> {
    let txn = db.begin().await?;
    clear_attempts(&txn, id, owner_id).await?;

    // MySQL 对值未变化的行可能报告 0 行受影响，所以以回读结果判断归属
    let state = link::Entity::find()
        .filter(link::Column::Id.eq(id))
        .filter(link::Column::OwnerId.eq(owner_id))
        .one(&txn)
        .await?
        .map(|m| LinkState {
            is_active: m.is_active,
            password_attempts: m.password_attempts,
        });
    txn.commit().await?;

    Ok(state)
}

impl SeaOrmStorage {
    /// 插入新链接
    ///
    /// alias 冲突不是错误，而是返回 [`InsertOutcome::AliasTaken`] 交给调用方换 alias 重试。
    pub async fn insert(&self, link: &ShortLink) -> Result<InsertOutcome> {
        let db = &self.db;

        let result = retry::with_retry(
            &format!("insert({})", link.alias),
            self.retry_config,
            || {
                let active_model = link_to_active_model(link);
                async move {
                    link::Entity::insert(active_model)
                        .exec_without_returning(db)
                        .await
                }
            },
        )
        .await;

        match result {
            Ok(_) => {
                info!("Short link created: {} (owner {})", link.alias, link.owner_id);
                Ok(InsertOutcome::Inserted)
            }
            Err(e) if is_unique_violation(&e) => {
                debug!("Alias collision on '{}'", link.alias);
                Ok(InsertOutcome::AliasTaken)
            }
            Err(e) => Err(GuardlinkError::database_operation(format!(
                "创建短链接失败: {}",
                e
            ))),
        }
    }

    /// 点击数 +1，仅对启用中的链接生效
    ///
    /// 返回 `false` 表示链接不存在或已被禁用。
    pub async fn increment_clicks(&self, alias: &str) -> Result<bool> {
        let db = &self.db;

        let result = retry::with_retry(
            &format!("increment_clicks({})", alias),
            self.retry_config,
            || async {
                link::Entity::update_many()
                    .col_expr(
                        link::Column::Clicks,
                        Expr::col(link::Column::Clicks).add(1),
                    )
                    .col_expr(link::Column::UpdatedAt, Expr::val(Utc::now()))
                    .filter(link::Column::Alias.eq(alias))
                    .filter(link::Column::IsActive.eq(true))
                    .exec(db)
                    .await
            },
        )
        .await?;

        Ok(result.rows_affected > 0)
    }

    /// 记录一次失败的密码尝试
    pub async fn record_failed_attempt(
        &self,
        id: &str,
        lockout_threshold: i32,
    ) -> Result<FailedAttempt> {
        let db = &self.db;

        let outcome = retry::with_retry(
            &format!("record_failed_attempt({})", id),
            self.retry_config,
            || record_failed_attempt_txn(db, id, lockout_threshold),
        )
        .await?;

        if let FailedAttempt::Recorded {
            attempts,
            disabled: true,
        } = outcome
        {
            warn!("Link {} disabled after {} failed password attempts", id, attempts);
        }
        Ok(outcome)
    }

    /// 切换启用状态，`None` 表示该用户名下没有这条链接
    pub async fn toggle_active(&self, id: &str, owner_id: &str) -> Result<Option<LinkState>> {
        let db = &self.db;

        let state = retry::with_retry(
            &format!("toggle_active({})", id),
            self.retry_config,
            || toggle_active_txn(db, id, owner_id),
        )
        .await?;

        if let Some(state) = state {
            info!("Link {} toggled: active={}", id, state.is_active);
        }
        Ok(state)
    }

    /// 失败次数清零（不改变启用状态），`None` 表示该用户名下没有这条链接
    pub async fn reset_attempts(&self, id: &str, owner_id: &str) -> Result<Option<LinkState>> {
        let db = &self.db;

        let state = retry::with_retry(
            &format!("reset_attempts({})", id),
            self.retry_config,
            || reset_attempts_txn(db, id, owner_id),
        )
        .await?;

        if state.is_some() {
            info!("Password attempts reset for link {}", id);
        }
        Ok(state)
    }
}
