pub mod config;
pub mod logger;
pub mod mirror;
pub mod query;
pub mod record;
pub mod refresh;
pub mod server;

pub use config::{Config, ConfigError, DashboardConfig};
pub use mirror::{MirrorError, MirrorSummary, OrderMirror};
pub use refresh::{RefreshError, RefreshReport, Refresher};
