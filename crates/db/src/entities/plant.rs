//! Plant entity.

use sea_orm::entity::prelude::*;

/// A catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "plants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Storage key of the main image, not a public URL.
    #[sea_orm(nullable)]
    pub main_image_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::plant_image::Entity")]
    Images,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::plant_like::Entity")]
    Likes,
    #[sea_orm(has_many = "super::saved_plant::Entity")]
    Saves,
}

impl Related<super::plant_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::plant_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl Related<super::saved_plant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Saves.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
