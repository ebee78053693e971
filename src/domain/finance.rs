// ==========================================
// 燃气瓶配送管理系统 - 资金流水领域模型
// ==========================================
// 红线: 每一笔现金操作对应一条财务分录 (1:1)
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{Account, PaymentMethod};

// ==========================================
// CashOperation - 现金操作
// ==========================================
// amount 有符号: 收入为正, 支出为负
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOperation {
    pub id: String,
    pub date: NaiveDateTime,
    pub operation_type: CashOperationType,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub account: Account,
    pub description: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashOperationType {
    Income,
    Expense,
}

// ==========================================
// FinancialTransaction - 财务分录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTransaction {
    pub id: String,
    pub date: NaiveDateTime,
    pub transaction_type: FinancialTransactionType,
    pub amount: Decimal,
    pub source_account: Account,
    pub destination_account: Account,
    pub description: String,
    pub cash_operation_id: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialTransactionType {
    ReturnPayment, // 回收单收款
    DriverPayment, // 司机还款/预付
}

/// 资金台账
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    pub cash_operations: Vec<CashOperation>,
    pub financial_transactions: Vec<FinancialTransaction>,
}

impl Journal {
    /// 账户净额 (流入为正)
    pub fn account_balance(&self, account: &Account) -> Decimal {
        self.financial_transactions
            .iter()
            .map(|t| {
                let mut v = Decimal::ZERO;
                if &t.destination_account == account {
                    v = v.saturating_add(t.amount);
                }
                if &t.source_account == account {
                    v = v.saturating_sub(t.amount);
                }
                v
            })
            .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
    }
}
