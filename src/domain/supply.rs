// ==========================================
// 燃气瓶配送管理系统 - 供货单 (B.S) 领域模型
// ==========================================
// 红线: 创建后不可修改, 只能整单删除(回滚库存)
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::Quantity;

// ==========================================
// SupplyOrder - 供货单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyOrder {
    pub id: String,
    pub order_number: String, // "BS-N"
    pub driver_id: Option<String>,
    pub client_id: Option<String>,
    pub date: NaiveDateTime,
    pub items: Vec<SupplyOrderItem>,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyOrderItem {
    pub bottle_type_id: String,
    pub empty_quantity: u32,
    pub full_quantity: u32,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

impl SupplyOrder {
    /// 某瓶型在本单中的出库满瓶数 (同瓶型多行合并)
    pub fn issued_full(&self, bottle_type_id: &str) -> Option<u32> {
        let mut found = false;
        let mut total = 0u32;
        for item in self.items.iter().filter(|i| i.bottle_type_id == bottle_type_id) {
            found = true;
            total = total.saturating_add(item.full_quantity);
        }
        found.then_some(total)
    }

    /// 某瓶型在本单中的出库单价 (取首行)
    pub fn unit_price_of(&self, bottle_type_id: &str) -> Option<Decimal> {
        self.items
            .iter()
            .find(|i| i.bottle_type_id == bottle_type_id)
            .map(|i| i.unit_price)
    }
}

// ==========================================
// 创建请求
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyOrderRequest {
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub items: Vec<SupplyItemInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyItemInput {
    pub bottle_type_id: String,
    #[serde(default)]
    pub empty_quantity: Quantity,
    #[serde(default)]
    pub full_quantity: Quantity,
    /// 不填则取瓶型单价
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}
