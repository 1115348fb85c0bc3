//! 键值存储
//!
//! 会话配置和跨进程的限流时间戳都存放在这里。`MemoryStore` 的克隆共享同一份数据，
//! 测试中用它模拟同源的多个标签页；`FileStore` 让同一状态目录下的所有进程看到同一份数据。

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::StoreError;

/// 字符串键值存储
///
/// 单个键的写入是原子的，多个写入者之间后写者胜出。
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// 内存存储
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // 锁内没有会 panic 的操作，中毒时直接取回数据
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// 基于 JSON 文件的存储
///
/// 文件内容是一个 `{ "key": "value" }` 对象。写入先落到临时文件再 rename，
/// 读者不会看到写了一半的文件。
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_string(&self) -> String {
        self.path.display().to_string()
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::ReadFailed {
                    path: self.path_string(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|source| StoreError::Encoding {
            key: self.path_string(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_failed = |source| StoreError::WriteFailed {
            path: self.path_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_failed)?;
            }
        }

        let json = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Encoding {
            key: self.path_string(),
            source,
        })?;

        let tmp = self.path.with_extension(format!("tmp.{}", std::process::id()));
        fs::write(&tmp, json).map_err(write_failed)?;
        fs::rename(&tmp, &self.path).map_err(write_failed)?;

        debug!("写入存储文件: {}", self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // 文件损坏时从空表重新开始，保证后续写入还能成功
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> FileStore {
        let dir = std::env::temp_dir().join(format!(
            "trivia_quiz_store_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        FileStore::new(dir.join("shared.json"))
    }

    #[test]
    fn test_memory_store_clones_share_data() {
        let tab_a = MemoryStore::new();
        let tab_b = tab_a.clone();

        tab_a.set("lastFetchTime", "42").unwrap();
        assert_eq!(tab_b.get("lastFetchTime").unwrap().as_deref(), Some("42"));

        tab_b.remove("lastFetchTime").unwrap();
        assert_eq!(tab_a.get("lastFetchTime").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_between_instances() {
        let store = temp_store("persist");
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("lastFetchTime", "1000").unwrap();
        store.set("quizSettings", "{}").unwrap();

        let other = FileStore::new(store.path().to_path_buf());
        assert_eq!(other.get("lastFetchTime").unwrap().as_deref(), Some("1000"));

        other.remove("lastFetchTime").unwrap();
        assert_eq!(store.get("lastFetchTime").unwrap(), None);
        assert_eq!(store.get("quizSettings").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_store_recovers_from_corrupt_file() {
        let store = temp_store("corrupt");
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.get("k"), Err(StoreError::Encoding { .. })));
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
