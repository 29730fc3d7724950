use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

use super::{LedgerRepository, NewLedgerEntry};
use crate::entities::inventory_transaction;

/// sea-orm backed ledger; every call is a plain insert.
pub struct SeaOrmLedgerRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SeaOrmLedgerRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<'a, C> LedgerRepository for SeaOrmLedgerRepository<'a, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn append(&self, entry: NewLedgerEntry) -> Result<inventory_transaction::Model, DbErr> {
        inventory_transaction::ActiveModel {
            inventory_id: Set(entry.inventory_id),
            product_id: Set(entry.product_id),
            r#type: Set(entry.transaction_type),
            quantity: Set(entry.quantity),
            price: Set(entry.price),
            note: Set(entry.note),
            production_log_id: Set(entry.production_log_id),
            ..Default::default()
        }
        .insert(self.conn)
        .await
    }
}
