// ==========================================
// 燃气瓶配送管理系统 - 核心库
// ==========================================
// 核心: 回收单对账 + 司机往来账
// 技术栈: Rust + SQLite
// 职责: 供货出库 / 回收对账 / 库存台账 / 资金流水 / 工厂往来
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 集合存储
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 运行参数
pub mod config;

// 数据库基础设施 (连接初始化/PRAGMA 统一)
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 账本服务
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Account, PaymentMethod, Quantity, StockType};

// 领域实体
pub use domain::{
    BottleType, Driver, ReturnOrder, ReturnOrderRequest, Supplier, SupplyOrder,
    SupplyOrderRequest,
};

// 引擎
pub use engine::{
    BottleCatalog, DriverLedger, FinancialJournal, LedgerError, LedgerState, PaymentAllocator,
    ReturnReconciler, StockLedger, SupplierLedger, SupplyOrderProcessor,
};

// API
pub use api::{ApiError, ApiResult, LedgerApi, LedgerSnapshot};

// 存储
pub use repository::{CollectionKey, CollectionStore, MemoryCollectionStore, SqliteCollectionStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "燃气瓶配送管理系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
