use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 links 表
        manager
            .create_table(
                Table::create()
                    .table(Link::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Link::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Link::OwnerId).string().not_null())
                    .col(ColumnDef::new(Link::OriginalUrl).text().not_null())
                    .col(ColumnDef::new(Link::Alias).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Link::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Link::IsPasswordProtected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Link::PasswordHash).string().null())
                    .col(
                        ColumnDef::new(Link::PasswordAttempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Link::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Link::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Link::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // alias 全局唯一，由数据库保证
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_alias")
                    .table(Link::Table)
                    .col(Link::Alias)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 按 owner 列表查询（最新在前）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_owner_created")
                    .table(Link::Table)
                    .col(Link::OwnerId)
                    .col(Link::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_links_owner_created")
                    .table(Link::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_links_alias")
                    .table(Link::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Link::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Link {
    #[sea_orm(iden = "links")]
    Table,
    Id,
    OwnerId,
    OriginalUrl,
    Alias,
    Clicks,
    IsPasswordProtected,
    PasswordHash,
    PasswordAttempts,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
