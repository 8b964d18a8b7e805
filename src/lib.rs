pub mod aggregate;
pub mod app;
pub mod cache;
pub mod calendar;
pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod state;
pub mod storage;

pub use app::router;
pub use cache::{HabitDayCache, ReconcilePolicy};
pub use client::HttpLedger;
pub use config::Config;
pub use ledger::CheckLedger;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
