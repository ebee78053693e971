// ==========================================
// 燃气瓶配送管理系统 - API 层
// ==========================================
// 职责: 账本服务入口, 供 CLI 及上层界面调用
// ==========================================

pub mod error;
pub mod ledger_api;
pub mod snapshot;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use ledger_api::{BottleStockLine, DriverStatement, LedgerApi, LedgerEngines, StockSummary};
pub use snapshot::LedgerSnapshot;
