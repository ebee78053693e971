// ==========================================
// 燃气瓶配送管理系统 - SQLite 集合存储
// ==========================================
// 存储: collection_kv 表 (key → JSON 文本)
// 约束: save_all 在单个事务中完成, 失败整体回滚
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::{CollectionKey, CollectionStore};

// ==========================================
// SqliteCollectionStore
// ==========================================
pub struct SqliteCollectionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCollectionStore {
    /// 打开数据库文件并初始化表结构
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 (与 ConfigManager 共享连接)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 内存数据库, 用于测试
    pub fn in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 已存储的集合键 (诊断用)
    pub fn stored_keys(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key FROM collection_kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }
}

const UPSERT_SQL: &str = r#"
    INSERT INTO collection_kv (key, value, updated_at)
    VALUES (?1, ?2, datetime('now'))
    ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')
"#;

impl CollectionStore for SqliteCollectionStore {
    fn load(&self, key: CollectionKey) -> RepositoryResult<Option<JsonValue>> {
        let conn = self.get_conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM collection_kv WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            None => Ok(None),
            Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
                RepositoryError::CorruptCollection {
                    collection: key.to_string(),
                    message: e.to_string(),
                }
            }),
        }
    }

    fn save(&self, key: CollectionKey, value: &JsonValue) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let text = serde_json::to_string(value)?;
        conn.execute(UPSERT_SQL, params![key.as_str(), text])?;
        Ok(())
    }

    fn save_all(&self, batch: &[(CollectionKey, JsonValue)]) -> RepositoryResult<()> {
        // 先序列化, 避免事务中途失败
        let encoded = batch
            .iter()
            .map(|(key, value)| Ok((key.as_str(), serde_json::to_string(value)?)))
            .collect::<RepositoryResult<Vec<(&str, String)>>>()?;

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        for (key, text) in &encoded {
            tx.execute(UPSERT_SQL, params![key, text])?;
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::debug!(collections = encoded.len(), "集合批量写入完成");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_and_load() {
        let store = SqliteCollectionStore::in_memory().unwrap();
        assert!(store.load(CollectionKey::Drivers).unwrap().is_none());

        store
            .save(CollectionKey::Drivers, &json!([{"id": "d1"}]))
            .unwrap();
        let loaded = store.load(CollectionKey::Drivers).unwrap().unwrap();
        assert_eq!(loaded, json!([{"id": "d1"}]));
    }

    #[test]
    fn test_save_all_overwrites() {
        let store = SqliteCollectionStore::in_memory().unwrap();
        store
            .save_all(&[
                (CollectionKey::Drivers, json!([1])),
                (CollectionKey::Suppliers, json!([2])),
            ])
            .unwrap();
        store
            .save_all(&[(CollectionKey::Drivers, json!([3]))])
            .unwrap();

        assert_eq!(store.load(CollectionKey::Drivers).unwrap(), Some(json!([3])));
        assert_eq!(store.load(CollectionKey::Suppliers).unwrap(), Some(json!([2])));
        assert_eq!(store.stored_keys().unwrap(), vec!["drivers", "suppliers"]);
    }
}
