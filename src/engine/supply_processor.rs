// ==========================================
// 燃气瓶配送管理系统 - 供货单引擎
// ==========================================
// 职责: 满瓶出库给司机/客户, 删除时回滚
// 流程:
// 1) 校验明细 (空单/零数量/未知瓶型/库存不足)
// 2) 按瓶型扣减 remaining, 增加 distributed
// 3) 生成 "BS-N" 单号, 写入供货单
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{SupplyOrder, SupplyOrderItem, SupplyOrderRequest};
use crate::engine::error::{LedgerError, LedgerResult, SkipReason, SkippedItem};
use crate::engine::money;
use crate::engine::numbering::next_supply_order_number;
use crate::engine::state::{find, find_mut, LedgerState};
use crate::engine::stock_ledger::StockLedger;
use crate::engine::{new_id, timestamp};

/// 供货单创建结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyOutcome {
    pub order: SupplyOrder,
    pub skipped: Vec<SkippedItem>,
}

#[derive(Debug, Clone)]
pub struct SupplyOrderProcessor {
    stock: StockLedger,
    prefix: String,
}

impl SupplyOrderProcessor {
    pub fn new(stock: StockLedger, prefix: impl Into<String>) -> Self {
        Self {
            stock,
            prefix: prefix.into(),
        }
    }

    /// 创建供货单
    pub fn create(
        &self,
        state: &mut LedgerState,
        request: SupplyOrderRequest,
    ) -> LedgerResult<SupplyOutcome> {
        if request.items.is_empty() {
            return Err(LedgerError::Validation("供货单明细不能为空".to_string()));
        }
        if let Some(driver_id) = request.driver_id.as_deref() {
            if state.driver(driver_id).is_none() {
                return Err(LedgerError::not_found("Driver", driver_id));
            }
        }

        // ===== 第一遍: 校验, 不写入 =====
        let mut skipped = Vec::new();
        let mut items = Vec::with_capacity(request.items.len());
        let mut demand: BTreeMap<&str, u32> = BTreeMap::new();

        for input in &request.items {
            let Some(bottle) = find(&state.bottle_types, &input.bottle_type_id) else {
                skipped.push(SkippedItem::new(
                    &input.bottle_type_id,
                    SkipReason::UnknownBottleType,
                ));
                continue;
            };
            if input.full_quantity.is_zero() && input.empty_quantity.is_zero() {
                return Err(LedgerError::Validation(format!(
                    "明细数量不能全为0: bottle_type={}",
                    input.bottle_type_id
                )));
            }

            let full = input.full_quantity.get();
            let unit_price = input.unit_price.unwrap_or(bottle.unit_price);
            if unit_price < Decimal::ZERO {
                return Err(LedgerError::Validation(format!(
                    "单价不能为负: bottle_type={}",
                    input.bottle_type_id
                )));
            }
            let requested = demand.entry(bottle.id.as_str()).or_insert(0);
            *requested = requested.saturating_add(full);
            if *requested > bottle.remaining_quantity {
                return Err(LedgerError::InsufficientStock {
                    bottle_type_id: bottle.id.clone(),
                    available: bottle.remaining_quantity,
                    requested: *requested,
                });
            }

            items.push(SupplyOrderItem {
                bottle_type_id: bottle.id.clone(),
                empty_quantity: input.empty_quantity.get(),
                full_quantity: full,
                unit_price,
                amount: money::line_amount(full, unit_price, "供货明细金额")?,
            });
        }

        if items.is_empty() {
            return Err(LedgerError::Validation(
                "供货单没有可处理的明细".to_string(),
            ));
        }
        let total_amount = money::checked_sum(items.iter().map(|i| i.amount), "供货单总额")?;

        // ===== 第二遍: 出库 =====
        let order_number = next_supply_order_number(&state.supply_orders, &self.prefix);
        let note = format!("供货单 {} 出库", order_number);
        for item in &items {
            if item.full_quantity == 0 {
                continue;
            }
            if let Some(bottle) = find_mut(&mut state.bottle_types, &item.bottle_type_id) {
                let previous = bottle.remaining_quantity;
                bottle.issue(item.full_quantity);
                bottle.updated_at = timestamp();
                self.stock.record_full_movement(
                    &mut state.stock,
                    &item.bottle_type_id,
                    previous,
                    bottle.remaining_quantity,
                    &note,
                );
            }
        }

        let order = SupplyOrder {
            id: new_id(),
            order_number,
            driver_id: request.driver_id,
            client_id: request.client_id,
            date: timestamp(),
            total_amount,
            items,
        };
        state.supply_orders.push(order.clone());

        tracing::info!(
            order_number = %order.order_number,
            items = order.items.len(),
            skipped = skipped.len(),
            total_amount = %order.total_amount,
            "供货单已创建"
        );
        Ok(SupplyOutcome { order, skipped })
    }

    /// 删除供货单并回滚出库
    ///
    /// # 规则
    /// - remaining = min(total, remaining + full)
    /// - distributed = max(0, distributed - full)
    /// - 已有回收单的供货单不能删除
    pub fn delete(
        &self,
        state: &mut LedgerState,
        supply_order_id: &str,
    ) -> LedgerResult<SupplyOrder> {
        let index = state
            .supply_orders
            .iter()
            .position(|o| o.id == supply_order_id)
            .ok_or_else(|| LedgerError::not_found("SupplyOrder", supply_order_id))?;
        if let Some(ret) = state.return_order_for_supply(supply_order_id) {
            return Err(LedgerError::Conflict(format!(
                "供货单已有回收单 {}, 不能删除",
                ret.order_number
            )));
        }

        let order = state.supply_orders.remove(index);
        let note = format!("删除供货单 {}", order.order_number);
        for item in &order.items {
            let Some(bottle) = find_mut(&mut state.bottle_types, &item.bottle_type_id) else {
                tracing::warn!(
                    bottle_type_id = %item.bottle_type_id,
                    "回滚时瓶型已不存在, 跳过"
                );
                continue;
            };
            let previous = bottle.remaining_quantity;
            bottle.revert_issue(item.full_quantity);
            bottle.updated_at = timestamp();
            self.stock.record_full_movement(
                &mut state.stock,
                &item.bottle_type_id,
                previous,
                bottle.remaining_quantity,
                &note,
            );
        }

        tracing::info!(order_number = %order.order_number, "供货单已删除");
        Ok(order)
    }
}
