pub mod line_item;
pub mod production_log;

pub use line_item::{merge_line_items, LineItem, MAX_LINE_QUANTITY};
pub use production_log::{Actor, NewProductionLog, ProductionLog};
