pub mod inventory;
pub mod inventory_transaction;
pub mod production_log;
pub mod production_log_item;

pub use inventory_transaction::TransactionType;
pub use production_log_item::ItemKind;
