// ==========================================
// 燃气瓶配送管理系统 - 司机账本领域模型
// ==========================================
// 红线: balance == advances - debt, 任何写操作后必须成立
// 红线: debt / advances 不低于 0
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// Driver - 司机
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,

    // ===== 往来账 =====
    #[serde(default)]
    pub debt: Decimal,
    #[serde(default)]
    pub advances: Decimal,
    #[serde(default)]
    pub balance: Decimal,

    // ===== R.C. 瓶 (瓶型 → 数量) =====
    #[serde(default)]
    pub remaining_bottles: BTreeMap<String, i64>,

    #[serde(default)]
    pub transactions: Vec<DriverTransaction>,
    #[serde(default)]
    pub rc_history: Vec<RcHistoryEntry>,

    pub created_at: NaiveDateTime,
}

impl Driver {
    pub fn new(id: String, name: String, phone: Option<String>, now: NaiveDateTime) -> Self {
        Self {
            id,
            name,
            phone,
            debt: Decimal::ZERO,
            advances: Decimal::ZERO,
            balance: Decimal::ZERO,
            remaining_bottles: BTreeMap::new(),
            transactions: Vec::new(),
            rc_history: Vec::new(),
            created_at: now,
        }
    }

    /// 重算冗余余额
    pub fn recompute_balance(&mut self) {
        self.balance = self.advances - self.debt;
    }

    pub fn is_consistent(&self) -> bool {
        self.balance == self.advances - self.debt
            && self.debt >= Decimal::ZERO
            && self.advances >= Decimal::ZERO
    }
}

// ==========================================
// DriverTransaction - 司机往来流水
// ==========================================
// amount 有符号: 欠款为正, 付款为负
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverTransaction {
    pub id: String,
    pub date: NaiveDateTime,
    pub transaction_type: DriverTransactionType,
    pub amount: Decimal,
    pub description: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverTransactionType {
    Debt,
    Payment,
}

// ==========================================
// R.C. 瓶变更
// ==========================================

/// R.C. 瓶更新方式
///
/// - `Merge`: 按瓶型累加
/// - `Override`: 整体替换, 并记录差异
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "bottles", rename_all = "snake_case")]
pub enum RemainingBottlesPatch {
    Merge(BTreeMap<String, i64>),
    Override(BTreeMap<String, i64>),
}

/// 覆盖操作的差异记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RcHistoryEntry {
    pub id: String,
    pub date: NaiveDateTime,
    pub changes: Vec<RcChange>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RcChange {
    pub bottle_type_id: String,
    pub previous_qty: i64,
    pub new_qty: i64,
    pub diff: i64,
}
