//! In-memory fakes of the storage ports for workflow unit tests.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DbErr;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::{
    CreditOutcome, DebitOutcome, InventoryRepository, LedgerRepository, NewLedgerEntry,
    ProductionLogRepository,
};
use crate::entities::{inventory, inventory_transaction};
use crate::models::{NewProductionLog, ProductionLog};

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub inventory: Mutex<HashMap<Uuid, inventory::Model>>,
    pub ledger: Mutex<Vec<inventory_transaction::Model>>,
    pub logs: Mutex<Vec<ProductionLog>>,
    pub fail_appends: AtomicBool,
}

impl MemoryStore {
    pub fn with_stock(stock: &[(Uuid, i64)]) -> Self {
        let store = Self::default();
        {
            let mut inventory = store.inventory.lock().unwrap();
            for &(product_id, quantity) in stock {
                inventory.insert(product_id, record(product_id, quantity));
            }
        }
        store
    }

    pub fn quantity(&self, product_id: Uuid) -> Option<i64> {
        self.inventory
            .lock()
            .unwrap()
            .get(&product_id)
            .map(|r| r.quantity)
    }

    pub fn ledger(&self) -> Vec<inventory_transaction::Model> {
        self.ledger.lock().unwrap().clone()
    }
}

fn record(product_id: Uuid, quantity: i64) -> inventory::Model {
    inventory::Model {
        id: Uuid::new_v4(),
        product_id,
        quantity,
        created_at: Utc::now(),
        updated_at: None,
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn find(&self, product_id: Uuid) -> Result<Option<inventory::Model>, DbErr> {
        Ok(self.inventory.lock().unwrap().get(&product_id).cloned())
    }

    async fn debit(&self, product_id: Uuid, quantity: i64) -> Result<DebitOutcome, DbErr> {
        let mut inventory = self.inventory.lock().unwrap();
        let outcome = match inventory.get_mut(&product_id) {
            None => DebitOutcome::Missing,
            Some(r) if r.quantity < quantity => DebitOutcome::Insufficient {
                available: r.quantity,
            },
            Some(r) => {
                r.quantity -= quantity;
                DebitOutcome::Applied(r.clone())
            }
        };
        Ok(outcome)
    }

    async fn credit(&self, product_id: Uuid, quantity: i64) -> Result<CreditOutcome, DbErr> {
        let mut inventory = self.inventory.lock().unwrap();
        if let Some(r) = inventory.get_mut(&product_id) {
            r.quantity += quantity;
            return Ok(CreditOutcome::Updated(r.clone()));
        }
        let created = record(product_id, quantity);
        inventory.insert(product_id, created.clone());
        Ok(CreditOutcome::Created(created))
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn append(&self, entry: NewLedgerEntry) -> Result<inventory_transaction::Model, DbErr> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("ledger unavailable".into()));
        }
        let row = inventory_transaction::Model {
            id: Uuid::new_v4(),
            inventory_id: entry.inventory_id,
            product_id: entry.product_id,
            r#type: entry.transaction_type,
            quantity: entry.quantity,
            price: entry.price,
            note: entry.note,
            production_log_id: entry.production_log_id,
            created_at: Utc::now(),
        };
        self.ledger.lock().unwrap().push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl ProductionLogRepository for MemoryStore {
    async fn insert(&self, log: NewProductionLog) -> Result<ProductionLog, DbErr> {
        let saved = ProductionLog {
            id: Uuid::new_v4(),
            output_item: log.output_items,
            ingredient_item: log.ingredient_items,
            actor_id: log.actor.id,
            actor_name: log.actor.name,
            created_at: Utc::now(),
        };
        self.logs.lock().unwrap().push(saved.clone());
        Ok(saved)
    }
}
