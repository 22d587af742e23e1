//! Users table.
//!
//! Claim sheets reference their owner by `username`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::claim_sheets::Entity")]
    ClaimSheets,
}

impl Related<super::claim_sheets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClaimSheets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
