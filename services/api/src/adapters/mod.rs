pub mod db;
pub mod memory;
pub mod spreadsheet;

pub use db::DbAdapter;
pub use memory::MemoryStore;
pub use spreadsheet::WorkbookReader;
