use crate::models::LedgerData;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

/// Server-side ledger: the in-memory copy plus the file it is persisted to.
#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<LedgerData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: LedgerData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
        }
    }
}
