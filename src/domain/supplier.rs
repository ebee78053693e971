// ==========================================
// 燃气瓶配送管理系统 - 工厂/供应商往来领域模型
// ==========================================
// 说明: 送厂的空瓶/坏瓶记为工厂欠瓶, 换回满瓶时冲减
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::Quantity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub empty_owed: BTreeMap<String, i64>,
    #[serde(default)]
    pub defective_owed: BTreeMap<String, i64>,
    #[serde(default)]
    pub transactions: Vec<SupplierTransaction>,
    pub created_at: NaiveDateTime,
}

impl Supplier {
    pub fn owed_total(&self, bottle_type_id: &str) -> i64 {
        self.empty_owed.get(bottle_type_id).copied().unwrap_or(0)
            + self.defective_owed.get(bottle_type_id).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierTransaction {
    pub id: String,
    pub date: NaiveDateTime,
    pub transaction_type: SupplierTransactionType,
    pub bottle_type_id: String,
    pub empty_quantity: u32,
    pub defective_quantity: u32,
    pub full_quantity: u32,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierTransactionType {
    SentToFactory,
    ReceivedFromFactory,
}

// ==========================================
// 请求
// ==========================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryShipmentLine {
    pub bottle_type_id: String,
    #[serde(default)]
    pub empty: Quantity,
    #[serde(default)]
    pub defective: Quantity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryReceiptLine {
    pub bottle_type_id: String,
    #[serde(default)]
    pub full: Quantity,
    /// 工厂拒收退回的坏瓶
    #[serde(default)]
    pub defective: Quantity,
}
