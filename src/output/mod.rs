pub mod console;
pub mod json_schema;

pub use console::ConsoleObserver;
pub use json_schema::{FailedItem, PruneItem, PruneReport, ScanItem, ScanReport};
