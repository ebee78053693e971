// ==========================================
// 燃气瓶配送管理系统 - 内存集合存储
// ==========================================
// 用途: 测试与无持久化运行
// ==========================================

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::{CollectionKey, CollectionStore};

#[derive(Default)]
pub struct MemoryCollectionStore {
    data: Mutex<HashMap<CollectionKey, JsonValue>>,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_data(&self) -> RepositoryResult<MutexGuard<'_, HashMap<CollectionKey, JsonValue>>> {
        self.data
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 已写入的集合数量
    pub fn len(&self) -> usize {
        self.data.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CollectionStore for MemoryCollectionStore {
    fn load(&self, key: CollectionKey) -> RepositoryResult<Option<JsonValue>> {
        Ok(self.get_data()?.get(&key).cloned())
    }

    fn save(&self, key: CollectionKey, value: &JsonValue) -> RepositoryResult<()> {
        self.get_data()?.insert(key, value.clone());
        Ok(())
    }

    fn save_all(&self, batch: &[(CollectionKey, JsonValue)]) -> RepositoryResult<()> {
        let mut data = self.get_data()?;
        for (key, value) in batch {
            data.insert(*key, value.clone());
        }
        Ok(())
    }
}
