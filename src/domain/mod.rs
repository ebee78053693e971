// ==========================================
// 燃气瓶配送管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、请求结构
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod bottle;
pub mod driver;
pub mod finance;
pub mod return_order;
pub mod stock;
pub mod supplier;
pub mod supply;
pub mod types;

// 重导出核心类型
pub use bottle::{BottleType, NewBottleType, PricingUpdate};
pub use driver::{
    Driver, DriverTransaction, DriverTransactionType, RcChange, RcHistoryEntry,
    RemainingBottlesPatch,
};
pub use finance::{
    CashOperation, CashOperationType, FinancialTransaction, FinancialTransactionType, Journal,
};
pub use return_order::{
    ExpenseNote, ForeignLine, PaymentSplit, PaymentSummary, ReturnItemInput, ReturnOrder,
    ReturnOrderItem, ReturnOrderRequest, ReturnTotals,
};
pub use stock::{
    DefectiveBottle, DefectiveOrigin, EmptyBottlesStock, ForeignBottle, StockBook, StockHistory,
};
pub use supplier::{
    FactoryReceiptLine, FactoryShipmentLine, Supplier, SupplierTransaction,
    SupplierTransactionType,
};
pub use supply::{SupplyItemInput, SupplyOrder, SupplyOrderItem, SupplyOrderRequest};
pub use types::{Account, ChangeType, PaymentMethod, Quantity, StockType};
