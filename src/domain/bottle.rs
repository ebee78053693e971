// ==========================================
// 燃气瓶配送管理系统 - 瓶型目录领域模型
// ==========================================
// 约束: remaining + distributed 在正常流程下跟踪 total
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::Quantity;

// ==========================================
// BottleType - 瓶型主数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleType {
    pub id: String,
    pub name: String,     // 如 "Butane12"
    pub capacity: String, // 容量描述, 如 "12kg"

    // ===== 满瓶数量 =====
    #[serde(default)]
    pub total_quantity: u32,
    #[serde(default)]
    pub distributed_quantity: u32, // 在外(司机/客户手中)
    #[serde(default)]
    pub remaining_quantity: u32, // 仓库内

    // ===== 价格 =====
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub consigne_price: Decimal, // 押金销售单价
    #[serde(default)]
    pub tax_rate: Decimal,

    pub updated_at: NaiveDateTime,
}

impl BottleType {
    /// 出库给司机/客户
    ///
    /// 调用方负责保证 remaining 充足
    pub fn issue(&mut self, full: u32) {
        self.remaining_quantity = self.remaining_quantity.saturating_sub(full);
        self.distributed_quantity = self.distributed_quantity.saturating_add(full);
    }

    /// 撤销出库 (删除供货单)
    ///
    /// remaining 不超过 total, distributed 不低于 0
    pub fn revert_issue(&mut self, full: u32) {
        self.remaining_quantity = self
            .remaining_quantity
            .saturating_add(full)
            .min(self.total_quantity);
        self.distributed_quantity = self.distributed_quantity.saturating_sub(full);
    }

    /// 回收结算: 退回满瓶入库, 按原出库量冲减在外数量
    ///
    /// # 返回
    /// 是否触发了 total 上限截断
    pub fn settle_return(&mut self, issued_full: u32, returned_full: u32) -> bool {
        let raw = self.remaining_quantity.saturating_add(returned_full);
        self.remaining_quantity = raw.min(self.total_quantity);
        self.distributed_quantity = self.distributed_quantity.saturating_sub(issued_full);
        raw > self.total_quantity
    }

    /// 入库新满瓶 (采购/工厂换回)
    pub fn receive(&mut self, full: u32) {
        self.total_quantity = self.total_quantity.saturating_add(full);
        self.remaining_quantity = self.remaining_quantity.saturating_add(full);
    }
}

// ==========================================
// 瓶型维护请求
// ==========================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBottleType {
    pub name: String,
    #[serde(default)]
    pub capacity: String,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub consigne_price: Decimal,
    /// 不填则取配置默认税率
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    #[serde(default)]
    pub initial_quantity: Quantity,
}

/// 价格调整, 未填字段保持不变
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingUpdate {
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub consigne_price: Option<Decimal>,
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
}
