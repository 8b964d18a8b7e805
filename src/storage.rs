use crate::errors::LedgerError;
use crate::models::LedgerData;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{error, info};

const DEFAULT_DATA_PATH: &str = "data/habits.json";

pub fn resolve_data_path() -> PathBuf {
    env::var("APP_DATA_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH))
}

/// Never fails: a missing or unreadable ledger file starts an empty ledger.
pub async fn load_data(path: &Path) -> LedgerData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<LedgerData>(&bytes) {
            Ok(data) => {
                info!(
                    habits = data.habits.len(),
                    "loaded ledger from {}",
                    path.display()
                );
                data
            }
            Err(err) => {
                error!("failed to parse ledger file: {err}");
                LedgerData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => LedgerData::default(),
        Err(err) => {
            error!("failed to read ledger file: {err}");
            LedgerData::default()
        }
    }
}

/// Writes a sibling temp file and renames it over `path`, so a crash mid-write
/// leaves the previous ledger intact.
pub async fn persist_data(path: &Path, data: &LedgerData) -> Result<(), LedgerError> {
    let payload =
        serde_json::to_vec_pretty(data).map_err(|err| LedgerError::Storage(err.to_string()))?;
    let staging = staging_path(path);
    fs::write(&staging, payload)
        .await
        .map_err(|err| LedgerError::Storage(err.to_string()))?;
    if let Err(err) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(LedgerError::Storage(err.to_string()));
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("habit_tracker_{tag}_{}_{nanos}.json", std::process::id()));
        path
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let data = load_data(&temp_path("missing")).await;
        assert!(data.habits.is_empty());
        assert!(data.checks.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let path = temp_path("corrupt");
        fs::write(&path, b"{not json").await.unwrap();
        let data = load_data(&path).await;
        assert!(data.habits.is_empty());
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn persisted_ledger_reloads() {
        let path = temp_path("persist");
        let mut data = LedgerData::default();
        let owner = Identity::from("u1");
        let habit = data.create_habit(&owner, "read").unwrap();
        let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        data.upsert_check(&owner, &habit.id, day, true).unwrap();

        persist_data(&path, &data).await.unwrap();
        let loaded = load_data(&path).await;
        assert_eq!(loaded.habits, data.habits);
        assert_eq!(loaded.checks, data.checks);
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn persist_replaces_the_file_and_leaves_no_staging_file() {
        let path = temp_path("replace");
        fs::write(&path, b"{\"habits\": [], \"checks\": {}}").await.unwrap();

        let mut data = LedgerData::default();
        data.create_habit(&Identity::from("u1"), "read").unwrap();
        persist_data(&path, &data).await.unwrap();

        assert_eq!(load_data(&path).await.habits, data.habits);
        assert!(!fs::try_exists(staging_path(&path)).await.unwrap());
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn persist_into_a_missing_directory_fails() {
        let mut path = temp_path("nodir");
        path.push("ledger.json");
        let result = persist_data(&path, &LedgerData::default()).await;
        assert!(matches!(result, Err(LedgerError::Storage(_))));
    }
}
