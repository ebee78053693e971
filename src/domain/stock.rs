// ==========================================
// 燃气瓶配送管理系统 - 库存台账领域模型
// ==========================================
// 覆盖: 空瓶库存 / 坏瓶明细 / 外品牌瓶记录 / 库存流水
// 红线: 所有库存变动必须留下流水
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::types::{ChangeType, StockType};

// ==========================================
// EmptyBottlesStock - 空瓶库存
// ==========================================
// 每个瓶型一行, 数量可为负(欠瓶)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyBottlesStock {
    pub bottle_type_id: String,
    pub quantity: i64,
    pub last_updated: NaiveDateTime,
}

// ==========================================
// DefectiveBottle - 坏瓶明细
// ==========================================
// 追加式, 数量有符号; 负数行表示消耗不足的缺口
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectiveBottle {
    pub id: String,
    pub bottle_type_id: String,
    pub quantity: i64,
    pub origin: DefectiveOrigin,
    pub note: Option<String>,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectiveOrigin {
    Return(String), // 来源回收单 id
    Manual,
    Factory,
    FactoryNegative,
}

// ==========================================
// ForeignBottle - 外品牌瓶记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignBottle {
    pub id: String,
    pub return_order_id: String,
    pub company_name: String,
    pub bottle_type_id: String,
    pub quantity: u32,
    pub date: NaiveDateTime,
}

// ==========================================
// StockHistory - 库存流水
// ==========================================
// quantity 为绝对值, 方向由 change_type 表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHistory {
    pub id: String,
    pub date: NaiveDateTime,
    pub bottle_type_id: String,
    pub stock_type: StockType,
    pub change_type: ChangeType,
    pub quantity: i64,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub note: String,
}

impl StockHistory {
    pub fn signed_quantity(&self) -> i64 {
        self.change_type.signed(self.quantity)
    }
}

// ==========================================
// StockBook - 库存账簿 (空瓶 + 坏瓶 + 流水)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockBook {
    pub empty_stock: Vec<EmptyBottlesStock>,
    pub defective_bottles: Vec<DefectiveBottle>,
    pub history: Vec<StockHistory>,
}

impl StockBook {
    /// 当前空瓶数量, 无记录视为 0
    pub fn empty_quantity(&self, bottle_type_id: &str) -> i64 {
        self.empty_stock
            .iter()
            .find(|s| s.bottle_type_id == bottle_type_id)
            .map(|s| s.quantity)
            .unwrap_or(0)
    }

    /// 当前坏瓶合计 (有符号求和)
    pub fn defective_quantity(&self, bottle_type_id: &str) -> i64 {
        self.defective_bottles
            .iter()
            .filter(|d| d.bottle_type_id == bottle_type_id)
            .map(|d| d.quantity)
            .sum()
    }
}
