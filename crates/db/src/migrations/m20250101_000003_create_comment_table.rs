//! Create comments table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comments::Content).text().not_null())
                    .col(
                        ColumnDef::new(Comments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Comments::UserId).integer().not_null())
                    .col(ColumnDef::new(Comments::PlantId).integer().not_null())
                    .col(ColumnDef::new(Comments::ImageKey).string_len(1024))
                    .to_owned(),
            )
            .await?;

        // Composite index: (plant_id, created_at) for newest-first listing
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_plant_id_created_at")
                    .table(Comments::Table)
                    .col(Comments::PlantId)
                    .col(Comments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Foreign key: user_id -> users.id
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_comments_user_id")
                    .from(Comments::Table, Comments::UserId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        // Foreign key: plant_id -> plants.id
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_comments_plant_id")
                    .from(Comments::Table, Comments::PlantId)
                    .to(Plants::Table, Plants::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Comments {
    Table,
    Id,
    Content,
    CreatedAt,
    UserId,
    PlantId,
    ImageKey,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Plants {
    Table,
    Id,
}
