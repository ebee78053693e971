// ==========================================
// 燃气瓶配送管理系统 - 配置层
// ==========================================
// 职责: 系统配置管理, 缺省值 + config_kv 覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod ledger_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use ledger_config::LedgerConfig;
