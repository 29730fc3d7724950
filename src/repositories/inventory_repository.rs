use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::{CreditOutcome, DebitOutcome, InventoryRepository};
use crate::entities::inventory::{self, Column, Entity as Inventory};

/// sea-orm backed inventory store
pub struct SeaOrmInventoryRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SeaOrmInventoryRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<'a, C> InventoryRepository for SeaOrmInventoryRepository<'a, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn find(&self, product_id: Uuid) -> Result<Option<inventory::Model>, DbErr> {
        Inventory::find()
            .filter(Column::ProductId.eq(product_id))
            .one(self.conn)
            .await
    }

    async fn debit(&self, product_id: Uuid, quantity: i64) -> Result<DebitOutcome, DbErr> {
        // quantity >= requested is checked in the same statement that decrements
        let result = Inventory::update_many()
            .col_expr(Column::Quantity, Expr::col(Column::Quantity).sub(quantity))
            .col_expr(Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(Column::ProductId.eq(product_id))
            .filter(Column::Quantity.gte(quantity))
            .exec(self.conn)
            .await?;

        let outcome = match self.find(product_id).await? {
            None => DebitOutcome::Missing,
            Some(record) if result.rows_affected == 0 => DebitOutcome::Insufficient {
                available: record.quantity,
            },
            Some(record) => DebitOutcome::Applied(record),
        };
        Ok(outcome)
    }

    async fn credit(&self, product_id: Uuid, quantity: i64) -> Result<CreditOutcome, DbErr> {
        // single upsert so concurrent first credits of a product both land
        let new_id = Uuid::new_v4();
        let now = Utc::now();
        let row = inventory::ActiveModel {
            id: Set(new_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            created_at: Set(now),
            updated_at: Set(None),
        };
        Inventory::insert(row)
            .on_conflict(
                OnConflict::column(Column::ProductId)
                    .value(
                        Column::Quantity,
                        Expr::col((Inventory, Column::Quantity)).add(quantity),
                    )
                    .value(Column::UpdatedAt, Expr::value(Some(now)))
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;

        let record = self.find(product_id).await?.ok_or_else(|| {
            DbErr::RecordNotFound(format!("inventory record for product {}", product_id))
        })?;
        if record.id == new_id {
            Ok(CreditOutcome::Created(record))
        } else {
            Ok(CreditOutcome::Updated(record))
        }
    }
}
