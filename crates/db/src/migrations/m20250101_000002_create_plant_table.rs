//! Create plants and plant_images tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Plants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Plants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Plants::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Plants::Description).text().not_null())
                    .col(ColumnDef::new(Plants::MainImageUrl).string_len(1024))
                    .to_owned(),
            )
            .await?;

        // Index: name (for catalog search)
        manager
            .create_index(
                Index::create()
                    .name("idx_plants_name")
                    .table(Plants::Table)
                    .col(Plants::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlantImages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlantImages::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PlantImages::PlantId).integer().not_null())
                    .col(ColumnDef::new(PlantImages::ImageUrl).string_len(1024).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plant_images_plant_id")
                            .from(PlantImages::Table, PlantImages::PlantId)
                            .to(Plants::Table, Plants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: plant_id (gallery lookup)
        manager
            .create_index(
                Index::create()
                    .name("idx_plant_images_plant_id")
                    .table(PlantImages::Table)
                    .col(PlantImages::PlantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlantImages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Plants::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Plants {
    Table,
    Id,
    Name,
    Description,
    MainImageUrl,
}

#[derive(Iden)]
enum PlantImages {
    Table,
    Id,
    PlantId,
    ImageUrl,
}
