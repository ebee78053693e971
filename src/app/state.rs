// ==========================================
// 燃气瓶配送管理系统 - 应用状态
// ==========================================
// 职责: 打开数据库, 组装配置与账本服务
// 说明: ConfigManager 与集合存储共享同一个连接
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::{ApiError, ApiResult, LedgerApi};
use crate::config::config_manager::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::repository::SqliteCollectionStore;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "GAS_CYLINDER_LEDGER_DB_PATH";

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 账本服务
    pub ledger: LedgerApi<SqliteCollectionStore>,
}

impl AppState {
    /// 打开数据库并加载账本
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 1. 打开共享连接 (建表幂等)
    /// 2. 从 config_kv 读取运行参数
    /// 3. 从 collection_kv 加载全部集合
    pub fn open(db_path: &str) -> ApiResult<Self> {
        tracing::info!("初始化AppState, 数据库路径: {}", db_path);

        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("无法打开数据库: {}", e)))?;
        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接组装 (测试可传入内存连接)
    pub fn from_connection(db_path: &str, conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone())?);
        let config = config_manager.load_ledger_config()?;
        let store = SqliteCollectionStore::from_connection(conn)?;
        let ledger = LedgerApi::open(store, config)?;

        tracing::info!(
            tax_rate = %ledger.config().tax_rate,
            stock_history_cap = ledger.config().stock_history_cap,
            "AppState初始化完成"
        );
        Ok(Self {
            db_path: db_path.to_string(),
            config_manager,
            ledger,
        })
    }

    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./gas_cylinder_ledger.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("gas-cylinder-ledger");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("gas_cylinder_ledger.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_open_in_memory_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::from_connection(":memory:", Arc::new(Mutex::new(conn))).unwrap();
        assert_eq!(state.get_db_path(), ":memory:");
        assert!(state.ledger.state().bottle_types.is_empty());
        assert_eq!(state.ledger.config().return_order_digits, 5);
    }
}
