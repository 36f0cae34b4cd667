//! Create the like and saved-list join tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(join_table(UserPlantLikes::Table, "user_plant_likes"))
            .await?;
        manager
            .create_index(plant_index(UserPlantLikes::Table, "user_plant_likes"))
            .await?;

        manager
            .create_table(join_table(UserPlantMylist::Table, "user_plant_mylist"))
            .await?;
        manager
            .create_index(plant_index(UserPlantMylist::Table, "user_plant_mylist"))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserPlantMylist::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserPlantLikes::Table).to_owned())
            .await
    }
}

/// A `(user_id, plant_id)` table cascading from both sides.
fn join_table<T>(table: T, name: &str) -> TableCreateStatement
where
    T: Iden + Copy + 'static,
{
    Table::create()
        .table(table)
        .if_not_exists()
        .col(ColumnDef::new(JoinColumn::UserId).integer().not_null())
        .col(ColumnDef::new(JoinColumn::PlantId).integer().not_null())
        .primary_key(
            Index::create()
                .name(format!("pk_{name}"))
                .col(JoinColumn::UserId)
                .col(JoinColumn::PlantId),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{name}_user_id"))
                .from(table, JoinColumn::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{name}_plant_id"))
                .from(table, JoinColumn::PlantId)
                .to(Plants::Table, Plants::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

/// Index: plant_id (per-plant counts)
fn plant_index<T>(table: T, name: &str) -> IndexCreateStatement
where
    T: Iden + Copy + 'static,
{
    Index::create()
        .name(format!("idx_{name}_plant_id"))
        .table(table)
        .col(JoinColumn::PlantId)
        .to_owned()
}

#[derive(Iden, Clone, Copy)]
enum UserPlantLikes {
    Table,
}

#[derive(Iden, Clone, Copy)]
enum UserPlantMylist {
    Table,
}

/// Columns shared by both join tables.
#[derive(Iden)]
enum JoinColumn {
    UserId,
    PlantId,
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
