// ==========================================
// 燃气瓶配送管理系统 - 引擎层
// ==========================================
// 职责: 实现账本业务规则, 只操作内存中的 LedgerState
// 红线: Engine 不访问存储, 持久化由服务层统一提交
// 红线: 每次库存/资金变动必须留下流水
// ==========================================

pub mod catalog;
pub mod driver_ledger;
pub mod error;
pub mod journal;
pub mod money;
pub mod numbering;
pub mod payment_allocator;
pub mod return_reconciler;
pub mod state;
pub mod stock_ledger;
pub mod supplier_ledger;
pub mod supply_processor;

use chrono::{NaiveDateTime, Utc};

// 重导出核心引擎
pub use catalog::BottleCatalog;
pub use driver_ledger::{DriverLedger, PaymentApplication};
pub use error::{LedgerError, LedgerResult, SkipReason, SkippedItem};
pub use journal::{FinancialJournal, IncomeEntry};
pub use payment_allocator::PaymentAllocator;
pub use return_reconciler::{ReturnOutcome, ReturnReconciler};
pub use state::LedgerState;
pub use stock_ledger::{DefectiveConsumption, StockLedger, StockTotals};
pub use supplier_ledger::{FactoryOutcome, SupplierLedger};
pub use supply_processor::{SupplyOrderProcessor, SupplyOutcome};

/// 新记录 id
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 当前时间 (UTC)
pub(crate) fn timestamp() -> NaiveDateTime {
    Utc::now().naive_utc()
}
