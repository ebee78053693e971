// ==========================================
// 燃气瓶配送管理系统 - 账本运行参数
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 账本运行参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// 回收单税率 (仅计算, 不计入应缴总额)
    pub tax_rate: Decimal,
    /// 库存流水保留条数 (全局, 超出截断最旧)
    pub stock_history_cap: usize,
    pub supply_order_prefix: String,
    pub return_order_prefix: String,
    /// 回收单号序号位数
    pub return_order_digits: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            stock_history_cap: 1000,
            supply_order_prefix: "BS-".to_string(),
            return_order_prefix: "BD-".to_string(),
            return_order_digits: 5,
        }
    }
}
