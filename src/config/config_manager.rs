// ==========================================
// 燃气瓶配送管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::ledger_config::LedgerConfig;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const TAX_RATE: &str = "tax_rate";
    pub const STOCK_HISTORY_CAP: &str = "stock_history_cap";
    pub const SUPPLY_ORDER_PREFIX: &str = "supply_order_prefix";
    pub const RETURN_ORDER_PREFIX: &str = "return_order_prefix";
    pub const RETURN_ORDER_DIGITS: &str = "return_order_digits";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
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

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照 (JSON)
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 加载账本运行参数
    ///
    /// 缺失或格式错误的配置项回退到默认值 (记录告警)
    pub fn load_ledger_config(&self) -> RepositoryResult<LedgerConfig> {
        let defaults = LedgerConfig::default();

        let tax_rate = self
            .parse_or_default(config_keys::TAX_RATE, defaults.tax_rate, |s| {
                Decimal::from_str(s).ok().filter(|d| *d >= Decimal::ZERO)
            })?;
        let stock_history_cap = self.parse_or_default(
            config_keys::STOCK_HISTORY_CAP,
            defaults.stock_history_cap,
            |s| s.parse::<usize>().ok().filter(|v| *v > 0),
        )?;
        let supply_order_prefix = self
            .get_config_value(config_keys::SUPPLY_ORDER_PREFIX)?
            .unwrap_or(defaults.supply_order_prefix);
        let return_order_prefix = self
            .get_config_value(config_keys::RETURN_ORDER_PREFIX)?
            .unwrap_or(defaults.return_order_prefix);
        let return_order_digits = self.parse_or_default(
            config_keys::RETURN_ORDER_DIGITS,
            defaults.return_order_digits,
            |s| s.parse::<usize>().ok().filter(|v| (1..=12).contains(v)),
        )?;

        Ok(LedgerConfig {
            tax_rate,
            stock_history_cap,
            supply_order_prefix,
            return_order_prefix,
            return_order_digits,
        })
    }

    fn parse_or_default<T, F>(&self, key: &str, default: T, parse: F) -> RepositoryResult<T>
    where
        F: Fn(&str) -> Option<T>,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match parse(raw.trim()) {
                Some(v) => Ok(v),
                None => {
                    tracing::warn!(key, raw = %raw, "配置值无效, 使用默认值");
                    Ok(default)
                }
            },
        }
    }
}
