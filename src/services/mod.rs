pub mod inventory;
pub mod production_logs;

pub use inventory::{InventoryService, LedgerQuery, StockMovementRequest};
pub use production_logs::{ProductionLogService, RecordProductionRequest};
