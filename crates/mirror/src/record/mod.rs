pub mod entities;
pub mod interfaces;
pub mod sqlite;

pub use interfaces::{OrderRecord, OrderRepository, RecordError, StoredOrder};
pub use sqlite::{SqliteOrderRepository, sqlite_url};
