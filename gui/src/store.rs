use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use thermostat_common::{
    merge::merge_patch, ConfPatch, LiveState, LiveStatePatch, StoreError, ThermostatConf,
};

#[derive(Clone)]
pub struct JsonRecordFile {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl JsonRecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_ref()
    }

    pub async fn read_raw(&self) -> Result<Vec<u8>, StoreError> {
        tokio::fs::read(self.path()).await.map_err(|source| StoreError::Io {
            path: self.path().to_path_buf(),
            source,
        })
    }

    pub async fn read<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let raw = self.read_raw().await?;
        serde_json::from_slice(&raw).map_err(|source| StoreError::Malformed {
            path: self.path().to_path_buf(),
            source,
        })
    }

    // A missing file starts from an empty object; a malformed one is left as is.
    pub async fn merge<P: Serialize>(&self, patch: &P) -> Result<Value, StoreError> {
        let _guard = self.lock.lock().await;

        let mut document = match self.read::<Value>().await {
            Ok(document) => document,
            Err(StoreError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Value::Object(Map::new())
            }
            Err(err) => return Err(err),
        };

        merge_patch(&mut document, patch)?;
        self.replace(&document).await?;
        Ok(document)
    }

    async fn replace(&self, document: &Value) -> Result<(), StoreError> {
        let io_error = |source| StoreError::Io {
            path: self.path().to_path_buf(),
            source,
        };

        if let Some(parent) = self.path().parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let payload = serde_json::to_vec(document)?;
        let staging = staging_path(self.path());
        tokio::fs::write(&staging, payload).await.map_err(io_error)?;
        tokio::fs::rename(&staging, self.path())
            .await
            .map_err(io_error)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staging = OsString::from(path.as_os_str());
    staging.push(".tmp");
    PathBuf::from(staging)
}

#[derive(Clone)]
pub struct LiveStateStore {
    file: JsonRecordFile,
}

impl LiveStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonRecordFile::new(path),
        }
    }

    pub async fn read_raw(&self) -> Result<Vec<u8>, StoreError> {
        self.file.read_raw().await
    }

    pub async fn read(&self) -> Result<LiveState, StoreError> {
        self.file.read().await
    }

    pub async fn merge(&self, patch: &LiveStatePatch) -> Result<(), StoreError> {
        self.file.merge(patch).await.map(|_| ())
    }
}

#[derive(Clone)]
pub struct ConfigStore {
    file: JsonRecordFile,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonRecordFile::new(path),
        }
    }

    pub async fn read(&self) -> Result<ThermostatConf, StoreError> {
        self.file.read().await
    }

    pub async fn merge(&self, patch: &ConfPatch) -> Result<(), StoreError> {
        self.file.merge(patch).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use thermostat_common::{
        conf::{ImmediateSetting, TempOverride},
        Celsius, OperationMode,
    };

    use super::*;

    async fn seed(path: &Path, value: Value) {
        tokio::fs::write(path, serde_json::to_vec(&value).unwrap())
            .await
            .unwrap();
    }

    async fn load(path: &Path) -> Value {
        serde_json::from_slice(&tokio::fs::read(path).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn live_merge_touches_only_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curr_data.json");
        seed(
            &path,
            json!({ "tempc": "21.3", "tempt": "20", "state1": 1, "state2": 0, "mode": "heating", "pressure": "1.4" }),
        )
        .await;

        let store = LiveStateStore::new(&path);
        store
            .merge(&LiveStatePatch {
                tempt: Some(Celsius::from(23)),
            })
            .await
            .unwrap();

        assert_eq!(
            load(&path).await,
            json!({ "tempc": "21.3", "tempt": "23", "state1": 1, "state2": 0, "mode": "heating", "pressure": "1.4" })
        );
        assert_eq!(store.read().await.unwrap().tempt, Celsius::from(23));
    }

    #[tokio::test]
    async fn conf_merge_keeps_other_sub_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thermostat.json");
        seed(
            &path,
            json!({
                "operation_mode": "temp_override",
                "immediate": { "temp": "18" },
                "temp_override": { "temp": "24", "time_stamp": 1_700_000_000 },
                "daily_schedule": [{ "weekday": "monday", "times_of_operation": [] }]
            }),
        )
        .await;

        ConfigStore::new(&path)
            .merge(&ConfPatch {
                operation_mode: Some(OperationMode::Immediate),
                immediate: Some(ImmediateSetting {
                    temp: Celsius::from(21),
                }),
                temp_override: None,
            })
            .await
            .unwrap();

        assert_eq!(
            load(&path).await,
            json!({
                "operation_mode": "immediate",
                "immediate": { "temp": "21" },
                "temp_override": { "temp": "24", "time_stamp": 1_700_000_000 },
                "daily_schedule": [{ "weekday": "monday", "times_of_operation": [] }]
            })
        );
    }

    #[tokio::test]
    async fn override_merge_keeps_unrelated_nested_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thermostat.json");
        seed(
            &path,
            json!({ "temp_override": { "temp": "24", "time_stamp": 1, "source": "web" } }),
        )
        .await;

        ConfigStore::new(&path)
            .merge(&ConfPatch {
                operation_mode: Some(OperationMode::TempOverride),
                immediate: None,
                temp_override: Some(TempOverride {
                    temp: Celsius::from(19),
                    timestamp: 42,
                }),
            })
            .await
            .unwrap();

        assert_eq!(
            load(&path).await,
            json!({
                "operation_mode": "temp_override",
                "temp_override": { "temp": "19", "time_stamp": 42, "source": "web" }
            })
        );
    }

    #[tokio::test]
    async fn merge_into_missing_file_creates_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("curr_data.json");

        LiveStateStore::new(&path)
            .merge(&LiveStatePatch {
                tempt: Some(Celsius::from(20)),
            })
            .await
            .unwrap();

        assert_eq!(load(&path).await, json!({ "tempt": "20" }));
        assert!(!staging_path(&path).exists());
    }

    #[tokio::test]
    async fn malformed_record_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thermostat.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let result = ConfigStore::new(&path).merge(&ConfPatch::default()).await;

        assert!(matches!(result, Err(StoreError::Malformed { .. })));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"{ not json".to_vec());
    }

    #[tokio::test]
    async fn reading_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LiveStateStore::new(dir.path().join("absent.json"));

        assert!(matches!(store.read_raw().await, Err(StoreError::Io { .. })));
    }
}
