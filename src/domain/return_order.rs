// ==========================================
// 燃气瓶配送管理系统 - 回收单 (B.D) 领域模型
// ==========================================
// 红线: 回收单一次生成, 永不修改
// 说明: 两种"售出数量"口径并存, 分别命名保存
//   - returned_shortfall = max(0, 出库满瓶 - 退回满瓶 - 坏瓶), 计价口径
//   - cash_sale_quantity = 回收空瓶 + 押金销售, 司机口径
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::Quantity;

// ==========================================
// ReturnOrder - 回收单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnOrder {
    pub id: String,
    pub order_number: String, // "BD-#####"
    pub supply_order_id: String,
    pub driver_id: Option<String>,
    pub date: NaiveDateTime,
    pub items: Vec<ReturnOrderItem>,
    pub expenses: Vec<ExpenseNote>,
    pub totals: ReturnTotals,
    pub payment: PaymentSummary,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnOrderItem {
    pub bottle_type_id: String,
    pub full_quantity: u32, // 原出库满瓶
    pub returned_empty_quantity: u32,
    pub returned_full_quantity: u32,
    pub foreign_quantity: u32,
    pub defective_quantity: u32,
    pub consigne_quantity: u32,
    pub lost_quantity: u32,
    pub unit_price: Decimal,
    pub consigne_price: Decimal,

    // ===== 派生数量 =====
    pub returned_shortfall: u32,
    pub cash_sale_quantity: u32,

    // ===== 金额 =====
    pub amount: Decimal,          // returned_shortfall × unit_price
    pub consigne_amount: Decimal, // consigne × consigne_price
}

impl ReturnOrderItem {
    /// 计价数量: 出库满瓶 - 退回满瓶 - 坏瓶, 不低于 0
    pub fn shortfall_of(full: u32, returned_full: u32, defective: u32) -> u32 {
        full.saturating_sub(returned_full).saturating_sub(defective)
    }

    /// 回收分类合计 (守恒校验用)
    pub fn accounted(&self) -> u64 {
        [
            self.returned_empty_quantity,
            self.returned_full_quantity,
            self.foreign_quantity,
            self.defective_quantity,
            self.consigne_quantity,
            self.lost_quantity,
        ]
        .iter()
        .map(|q| u64::from(*q))
        .sum()
    }
}

/// 费用备注 (油费、路费等, 从应缴额中扣除)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseNote {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: Decimal,
}

// ==========================================
// ReturnTotals - 回收单金额汇总
// ==========================================
// 注意: tax_amount 计算并保存, 但不计入 total
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnTotals {
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub consigne_fees_total: Decimal,
    pub total_expenses: Decimal,
    pub total: Decimal, // subtotal + consigne_fees_total - total_expenses
}

impl ReturnTotals {
    /// 燃气欠款基数: 不含押金费用, 溢出时为 None
    pub fn gas_base(&self) -> Option<Decimal> {
        self.subtotal.checked_sub(self.total_expenses)
    }
}

// ==========================================
// PaymentSummary - 付款分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub cash: Decimal,
    pub check: Decimal,
    pub mygaz: Decimal,
    pub total_paid: Decimal,
    pub invoice_debt: Decimal, // max(0, total - total_paid)
    pub gas_debt: Decimal,     // max(0, subtotal - expenses - total_paid), 记入司机账
    pub surplus: Decimal,      // max(0, total_paid - total), 仅记录
}

// ==========================================
// 回收请求
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnOrderRequest {
    pub supply_order_id: String,
    #[serde(default)]
    pub items: Vec<ReturnItemInput>,
    #[serde(default)]
    pub expenses: Vec<ExpenseNote>,
    #[serde(default)]
    pub payment: PaymentSplit,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItemInput {
    pub bottle_type_id: String,
    #[serde(default)]
    pub returned_empty: Quantity,
    #[serde(default)]
    pub returned_full: Quantity,
    #[serde(default)]
    pub foreign: Quantity,
    /// 外品牌明细, 为空时按 foreign 汇总记一条
    #[serde(default)]
    pub foreign_details: Vec<ForeignLine>,
    #[serde(default)]
    pub defective: Quantity,
    #[serde(default)]
    pub consigne: Quantity,
    #[serde(default)]
    pub lost: Quantity,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub consigne_price: Option<Decimal>,
}

impl ReturnItemInput {
    pub fn accounted(&self) -> u64 {
        [
            self.returned_empty,
            self.returned_full,
            self.foreign,
            self.defective,
            self.consigne,
            self.lost,
        ]
        .iter()
        .map(|q| u64::from(q.get()))
        .sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignLine {
    pub company_name: String,
    #[serde(default)]
    pub quantity: Quantity,
}

/// 本次回收的付款
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSplit {
    #[serde(default)]
    pub cash: Decimal,
    #[serde(default)]
    pub check: Decimal,
    #[serde(default)]
    pub mygaz: Decimal,
}
