pub mod common;
pub mod inventory;
pub mod production_logs;

pub use common::{PageLimits, PaginatedResponse, PaginationMeta, PaginationParams};
pub use inventory::InventoryHandlerState;
pub use production_logs::ProductionLogHandlerState;
