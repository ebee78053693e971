// ==========================================
// 燃气瓶配送管理系统 - 回收单对账引擎 (核心)
// ==========================================
// 输入: 供货单 + 各分类回收数量 + 费用 + 付款
// 输出: 回收单 (一次生成, 不可修改)
// 流程:
// 1) 校验: 空明细/重复回收/守恒 (任一失败则不写入)
//    请求未列出的供货明细视为全部未退回
// 2) 派生数量: returned_shortfall (计价) / cash_sale_quantity (司机口径)
// 3) 金额: subtotal / 押金 / 税额(不计入 total) / 费用 / total
// 4) 库存: 空瓶 / 满瓶 / 外品牌 / 坏瓶, 每次变动写流水
// 5) 付款分配 → 资金流水
// 6) 司机账: debt += gas_debt, 丢失瓶并入 R.C.
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::instrument;

use crate::domain::types::non_negative;
use crate::domain::{
    Account, BottleType, DefectiveOrigin, FinancialTransactionType, ForeignBottle,
    RemainingBottlesPatch, ReturnItemInput, ReturnOrder, ReturnOrderItem, ReturnOrderRequest,
    ReturnTotals, SupplyOrder,
};
use crate::engine::driver_ledger::DriverLedger;
use crate::engine::error::{LedgerError, LedgerResult, SkipReason, SkippedItem};
use crate::engine::journal::{FinancialJournal, IncomeEntry};
use crate::engine::money;
use crate::engine::numbering::next_return_order_number;
use crate::engine::payment_allocator::PaymentAllocator;
use crate::engine::state::{find, find_mut, LedgerState};
use crate::engine::stock_ledger::StockLedger;
use crate::engine::{new_id, timestamp};

/// 未填写外品牌明细时的公司名
pub const UNSPECIFIED_COMPANY: &str = "未指定";

/// 回收处理结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnOutcome {
    pub order: ReturnOrder,
    pub skipped: Vec<SkippedItem>,
    pub driver_updated: bool,
}

// 校验通过的明细 + 外品牌分配
struct PlannedLine {
    item: ReturnOrderItem,
    foreign: Vec<(String, u32)>,
}

// ==========================================
// ReturnReconciler
// ==========================================
#[derive(Debug, Clone)]
pub struct ReturnReconciler {
    stock: StockLedger,
    drivers: DriverLedger,
    allocator: PaymentAllocator,
    journal: FinancialJournal,
    tax_rate: Decimal,
    prefix: String,
    digits: usize,
}

impl ReturnReconciler {
    pub fn new(
        stock: StockLedger,
        tax_rate: Decimal,
        prefix: impl Into<String>,
        digits: usize,
    ) -> Self {
        Self {
            stock,
            drivers: DriverLedger::new(),
            allocator: PaymentAllocator::new(),
            journal: FinancialJournal::new(),
            tax_rate,
            prefix: prefix.into(),
            digits,
        }
    }

    /// 处理回收单
    ///
    /// # 参数
    /// - `state`: 工作副本, 出错时由调用方整体丢弃
    /// - `request`: 回收请求
    ///
    /// # 返回
    /// 回收单 + 被跳过的明细 + 是否更新了司机账
    #[instrument(skip(self, state, request), fields(
        supply_order_id = %request.supply_order_id,
        items_count = request.items.len()
    ))]
    pub fn process(
        &self,
        state: &mut LedgerState,
        request: ReturnOrderRequest,
    ) -> LedgerResult<ReturnOutcome> {
        if request.items.is_empty() {
            return Err(LedgerError::Validation("回收单明细不能为空".to_string()));
        }
        let supply = state
            .supply_order(&request.supply_order_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("SupplyOrder", &request.supply_order_id))?;
        if let Some(existing) = state.return_order_for_supply(&supply.id) {
            return Err(LedgerError::Conflict(format!(
                "供货单 {} 已对账, 回收单 {}",
                supply.order_number, existing.order_number
            )));
        }

        // ===== 1. 校验 + 派生数量 (不写入) =====
        let (lines, skipped) = self.plan_lines(state, &supply, &request.items)?;

        // ===== 2. 金额 =====
        let totals = self.compute_totals(&lines, &request)?;
        let payment = self.allocator.allocate(&totals, &request.payment)?;

        let order_number =
            next_return_order_number(&state.return_orders, &self.prefix, self.digits);
        let return_order_id = new_id();

        // ===== 3. 库存 =====
        let mut lost_bottles: BTreeMap<String, i64> = BTreeMap::new();
        for line in &lines {
            self.apply_stock_effects(state, &return_order_id, &order_number, line);
            if line.item.lost_quantity > 0 {
                *lost_bottles
                    .entry(line.item.bottle_type_id.clone())
                    .or_insert(0) += i64::from(line.item.lost_quantity);
            }
        }

        // ===== 4. 司机账 =====
        let driver_id = supply.driver_id.clone();
        let driver = driver_id
            .as_deref()
            .and_then(|id| find_mut(&mut state.drivers, id));
        let driver_updated = match driver {
            Some(driver) => {
                self.drivers.apply_debt_delta(
                    driver,
                    payment.gas_debt,
                    &format!("回收单 {} 燃气欠款", order_number),
                    Some(order_number.clone()),
                )?;
                if !lost_bottles.is_empty() {
                    self.drivers.update_remaining_bottles(
                        driver,
                        RemainingBottlesPatch::Merge(lost_bottles),
                        Some(format!("回收单 {} 丢失瓶", order_number)),
                    );
                }
                true
            }
            None => {
                if let Some(id) = driver_id.as_deref() {
                    tracing::warn!(driver_id = id, "司机不存在, 跳过司机账更新");
                }
                false
            }
        };

        // ===== 5. 资金流水 =====
        let source = match (&driver_id, &supply.client_id) {
            (Some(id), _) if driver_updated => Account::Driver(id.clone()),
            (_, Some(client_id)) => Account::Client(client_id.clone()),
            _ => Account::External,
        };
        for (method, amount) in self.allocator.tranches(&payment) {
            self.journal.record_income(
                &mut state.journal,
                IncomeEntry {
                    method,
                    amount,
                    source: source.clone(),
                    transaction_type: FinancialTransactionType::ReturnPayment,
                    description: format!("回收单 {} 收款 ({})", order_number, method),
                    reference: Some(order_number.clone()),
                },
            );
        }
        if payment.surplus > Decimal::ZERO {
            tracing::info!(surplus = %payment.surplus, "付款超出应缴额, 仅记录");
        }

        // ===== 6. 回收单 =====
        let order = ReturnOrder {
            id: return_order_id,
            order_number,
            supply_order_id: supply.id.clone(),
            driver_id: if driver_updated { driver_id } else { None },
            date: timestamp(),
            items: lines.into_iter().map(|l| l.item).collect(),
            expenses: request.expenses,
            totals,
            payment,
            note: request.note,
        };
        state.return_orders.push(order.clone());

        tracing::info!(
            order_number = %order.order_number,
            subtotal = %order.totals.subtotal,
            total = %order.totals.total,
            gas_debt = %order.payment.gas_debt,
            skipped = skipped.len(),
            "回收单已生成"
        );
        Ok(ReturnOutcome {
            order,
            skipped,
            driver_updated,
        })
    }

    // ==========================================
    // 校验与派生
    // ==========================================

    fn plan_lines<'a>(
        &self,
        state: &LedgerState,
        supply: &'a SupplyOrder,
        inputs: &'a [ReturnItemInput],
    ) -> LedgerResult<(Vec<PlannedLine>, Vec<SkippedItem>)> {
        let mut seen: HashSet<&'a str> = HashSet::new();
        let mut skipped = Vec::new();
        let mut lines = Vec::with_capacity(supply.items.len().max(inputs.len()));

        for input in inputs {
            let bottle_type_id = input.bottle_type_id.as_str();
            if !seen.insert(bottle_type_id) {
                skipped.push(SkippedItem::new(bottle_type_id, SkipReason::DuplicateLine));
                continue;
            }
            let Some(bottle) = find(&state.bottle_types, bottle_type_id) else {
                skipped.push(SkippedItem::new(
                    bottle_type_id,
                    SkipReason::UnknownBottleType,
                ));
                continue;
            };
            let Some(full) = supply.issued_full(bottle_type_id) else {
                skipped.push(SkippedItem::new(bottle_type_id, SkipReason::NotOnSupplyOrder));
                continue;
            };
            lines.push(self.plan_line(supply, bottle, full, input)?);
        }

        if lines.is_empty() {
            return Err(LedgerError::Validation(
                "回收单没有可处理的明细".to_string(),
            ));
        }

        // 未列出的供货明细按全部未退回结算, 供货单不留未结数量
        for supply_item in &supply.items {
            let bottle_type_id = supply_item.bottle_type_id.as_str();
            if !seen.insert(bottle_type_id) {
                continue;
            }
            let Some(full) = supply.issued_full(bottle_type_id).filter(|f| *f > 0) else {
                continue;
            };
            let Some(bottle) = find(&state.bottle_types, bottle_type_id) else {
                skipped.push(SkippedItem::new(
                    bottle_type_id,
                    SkipReason::UnknownBottleType,
                ));
                continue;
            };
            tracing::warn!(bottle_type_id, full, "回收单未包含供货明细, 按全部未退回结算");
            let implicit = ReturnItemInput {
                bottle_type_id: bottle_type_id.to_string(),
                ..Default::default()
            };
            lines.push(self.plan_line(supply, bottle, full, &implicit)?);
        }
        Ok((lines, skipped))
    }

    // 单行: 外品牌分配 + 守恒校验 + 计价
    fn plan_line(
        &self,
        supply: &SupplyOrder,
        bottle: &BottleType,
        full: u32,
        input: &ReturnItemInput,
    ) -> LedgerResult<PlannedLine> {
        let bottle_type_id = bottle.id.as_str();

        // 有明细时以明细合计为准
        let foreign: Vec<(String, u32)> = if input.foreign_details.is_empty() {
            if input.foreign.is_zero() {
                Vec::new()
            } else {
                vec![(UNSPECIFIED_COMPANY.to_string(), input.foreign.get())]
            }
        } else {
            input
                .foreign_details
                .iter()
                .filter(|d| !d.quantity.is_zero())
                .map(|d| {
                    let name = d.company_name.trim();
                    let name = if name.is_empty() { UNSPECIFIED_COMPANY } else { name };
                    (name.to_string(), d.quantity.get())
                })
                .collect()
        };
        let foreign_quantity = foreign
            .iter()
            .fold(0u32, |acc, (_, q)| acc.saturating_add(*q));

        let accounted =
            input.accounted() - u64::from(input.foreign.get()) + u64::from(foreign_quantity);
        if accounted > u64::from(full) {
            return Err(LedgerError::Validation(format!(
                "回收数量超过出库满瓶: bottle_type={}, 回收={}, 出库={}",
                bottle_type_id, accounted, full
            )));
        }

        let unit_price = input
            .unit_price
            .or_else(|| supply.unit_price_of(bottle_type_id))
            .unwrap_or(bottle.unit_price);
        let consigne_price = input.consigne_price.unwrap_or(bottle.consigne_price);
        if unit_price < Decimal::ZERO || consigne_price < Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "单价不能为负: bottle_type={}",
                bottle_type_id
            )));
        }

        let returned_full = input.returned_full.get();
        let defective = input.defective.get();
        let consigne = input.consigne.get();
        let returned_empty = input.returned_empty.get();
        let returned_shortfall = ReturnOrderItem::shortfall_of(full, returned_full, defective);

        Ok(PlannedLine {
            item: ReturnOrderItem {
                bottle_type_id: bottle.id.clone(),
                full_quantity: full,
                returned_empty_quantity: returned_empty,
                returned_full_quantity: returned_full,
                foreign_quantity,
                defective_quantity: defective,
                consigne_quantity: consigne,
                lost_quantity: input.lost.get(),
                unit_price,
                consigne_price,
                returned_shortfall,
                cash_sale_quantity: returned_empty.saturating_add(consigne),
                amount: money::line_amount(returned_shortfall, unit_price, "回收明细金额")?,
                consigne_amount: money::line_amount(consigne, consigne_price, "押金金额")?,
            },
            foreign,
        })
    }

    fn compute_totals(
        &self,
        lines: &[PlannedLine],
        request: &ReturnOrderRequest,
    ) -> LedgerResult<ReturnTotals> {
        let subtotal = money::checked_sum(lines.iter().map(|l| l.item.amount), "小计")?;
        let consigne_fees_total =
            money::checked_sum(lines.iter().map(|l| l.item.consigne_amount), "押金合计")?;
        let total_expenses = money::checked_sum(
            request.expenses.iter().map(|e| non_negative(e.amount)),
            "费用合计",
        )?;
        let gross = money::checked_add(subtotal, consigne_fees_total, "应缴总额")?;

        Ok(ReturnTotals {
            subtotal,
            tax_rate: self.tax_rate,
            tax_amount: money::checked_mul(subtotal, self.tax_rate, "税额")?.round_dp(2),
            consigne_fees_total,
            total_expenses,
            total: money::checked_sub(gross, total_expenses, "应缴总额")?,
        })
    }

    // ==========================================
    // 库存写入
    // ==========================================

    fn apply_stock_effects(
        &self,
        state: &mut LedgerState,
        return_order_id: &str,
        order_number: &str,
        line: &PlannedLine,
    ) {
        let item = &line.item;
        let bottle_type_id = item.bottle_type_id.as_str();

        // 空瓶: +回收空瓶, -押金销售, -丢失, -外品牌
        let movements = [
            (i64::from(item.returned_empty_quantity), "回收空瓶"),
            (-i64::from(item.consigne_quantity), "押金销售"),
            (-i64::from(item.lost_quantity), "丢失"),
            (-i64::from(item.foreign_quantity), "外品牌"),
        ];
        for (delta, label) in movements {
            self.stock.mutate_empty(
                &mut state.stock,
                bottle_type_id,
                delta,
                &format!("回收单 {} {}", order_number, label),
            );
        }

        // 满瓶
        if let Some(bottle) = find_mut(&mut state.bottle_types, bottle_type_id) {
            let previous = bottle.remaining_quantity;
            let clamped = bottle.settle_return(item.full_quantity, item.returned_full_quantity);
            bottle.updated_at = timestamp();
            if clamped {
                tracing::warn!(
                    bottle_type_id,
                    total = bottle.total_quantity,
                    "退回满瓶超出总量, remaining 已截断"
                );
            }
            self.stock.record_full_movement(
                &mut state.stock,
                bottle_type_id,
                previous,
                bottle.remaining_quantity,
                &format!("回收单 {} 退回满瓶", order_number),
            );
        }

        // 外品牌
        let now = timestamp();
        for (company_name, quantity) in &line.foreign {
            state.foreign_bottles.push(ForeignBottle {
                id: new_id(),
                return_order_id: return_order_id.to_string(),
                company_name: company_name.clone(),
                bottle_type_id: bottle_type_id.to_string(),
                quantity: *quantity,
                date: now,
            });
        }

        // 坏瓶
        self.stock.add_defective(
            &mut state.stock,
            bottle_type_id,
            item.defective_quantity,
            DefectiveOrigin::Return(return_order_id.to_string()),
            &format!("回收单 {} 坏瓶", order_number),
        );
    }
}
