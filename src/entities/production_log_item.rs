use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[sea_orm(string_value = "ingredient")]
    Ingredient,
    #[sea_orm(string_value = "output")]
    Output,
}

/// One merged line of a production run; `position` keeps first-appearance order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_log_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub production_log_id: Uuid,
    pub kind: ItemKind,
    pub position: i32,
    pub product_id: Uuid,
    pub quantity: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::production_log::Entity",
        from = "Column::ProductionLogId",
        to = "super::production_log::Column::Id",
        on_delete = "Cascade"
    )]
    ProductionLog,
}

impl Related<super::production_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
