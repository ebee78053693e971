// ==========================================
// 燃气瓶配送管理系统 - 应用层
// ==========================================
// 职责: 组装数据库、配置与账本服务
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
