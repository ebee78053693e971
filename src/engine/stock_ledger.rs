// ==========================================
// 燃气瓶配送管理系统 - 库存台账引擎
// ==========================================
// 职责: 空瓶/坏瓶/满瓶数量变动 + 流水记录
// 规则:
// 1) 空瓶库存不设下限, 首次变动直接以 delta 建行
// 2) 坏瓶消耗按先进先出清零最早的正数行, 不足部分追加负数行
// 3) 每次变动写一条流水, 流水全局保留最近 N 条
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{
    ChangeType, DefectiveBottle, DefectiveOrigin, EmptyBottlesStock, StockBook, StockHistory,
    StockType,
};
use crate::engine::{new_id, timestamp};

// ==========================================
// StockTotals - 库存合计 (流水重放/对账)
// ==========================================
// 数量为 0 的瓶型不出现
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTotals {
    pub empty: BTreeMap<String, i64>,
    pub defective: BTreeMap<String, i64>,
}

impl StockTotals {
    fn normalized(mut self) -> Self {
        self.empty.retain(|_, v| *v != 0);
        self.defective.retain(|_, v| *v != 0);
        self
    }
}

/// 坏瓶消耗结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefectiveConsumption {
    pub from_stock: u32, // 实际从正数行扣减
    pub shortfall: u32,  // 以负数行记录的缺口
}

// ==========================================
// StockLedger
// ==========================================
#[derive(Debug, Clone)]
pub struct StockLedger {
    history_cap: usize,
}

impl StockLedger {
    pub fn new(history_cap: usize) -> Self {
        Self {
            history_cap: history_cap.max(1),
        }
    }

    // ==========================================
    // 空瓶
    // ==========================================

    /// 空瓶库存变动
    ///
    /// # 参数
    /// - `delta`: 有符号变动量, 0 视为无操作
    ///
    /// # 返回
    /// 变动后的数量 (可为负)
    pub fn mutate_empty(
        &self,
        book: &mut StockBook,
        bottle_type_id: &str,
        delta: i64,
        note: &str,
    ) -> i64 {
        let now = timestamp();
        let (previous, current) = match book
            .empty_stock
            .iter_mut()
            .find(|s| s.bottle_type_id == bottle_type_id)
        {
            Some(row) => {
                if delta == 0 {
                    return row.quantity;
                }
                let previous = row.quantity;
                row.quantity += delta;
                row.last_updated = now;
                (previous, row.quantity)
            }
            None => {
                if delta == 0 {
                    return 0;
                }
                book.empty_stock.push(EmptyBottlesStock {
                    bottle_type_id: bottle_type_id.to_string(),
                    quantity: delta,
                    last_updated: now,
                });
                (0, delta)
            }
        };

        tracing::debug!(bottle_type_id, delta, previous, current, note, "空瓶库存变动");
        self.push_history(
            book,
            bottle_type_id,
            StockType::Empty,
            previous,
            current,
            note,
            now,
        );
        current
    }

    // ==========================================
    // 坏瓶
    // ==========================================

    /// 追加坏瓶记录
    ///
    /// # 返回
    /// 新记录 id, 数量为 0 时返回 None
    pub fn add_defective(
        &self,
        book: &mut StockBook,
        bottle_type_id: &str,
        quantity: u32,
        origin: DefectiveOrigin,
        note: &str,
    ) -> Option<String> {
        if quantity == 0 {
            return None;
        }
        let now = timestamp();
        let previous = book.defective_quantity(bottle_type_id);
        let id = new_id();
        book.defective_bottles.push(DefectiveBottle {
            id: id.clone(),
            bottle_type_id: bottle_type_id.to_string(),
            quantity: i64::from(quantity),
            origin,
            note: non_empty(note),
            date: now,
        });

        self.push_history(
            book,
            bottle_type_id,
            StockType::Defective,
            previous,
            previous + i64::from(quantity),
            note,
            now,
        );
        Some(id)
    }

    /// 消耗坏瓶 (先进先出)
    ///
    /// # 规则
    /// - 按录入顺序扣减该瓶型的正数行, 清零的行直接删除
    /// - 正数库存不足时追加一条负数行记录缺口, 来源为 `shortfall_origin`
    pub fn consume_defective(
        &self,
        book: &mut StockBook,
        bottle_type_id: &str,
        amount: u32,
        shortfall_origin: DefectiveOrigin,
        note: &str,
    ) -> DefectiveConsumption {
        if amount == 0 {
            return DefectiveConsumption {
                from_stock: 0,
                shortfall: 0,
            };
        }
        let now = timestamp();
        let previous = book.defective_quantity(bottle_type_id);

        let mut remaining = i64::from(amount);
        for entry in book
            .defective_bottles
            .iter_mut()
            .filter(|d| d.bottle_type_id == bottle_type_id && d.quantity > 0)
        {
            if remaining == 0 {
                break;
            }
            let take = entry.quantity.min(remaining);
            entry.quantity -= take;
            remaining -= take;
        }
        book.defective_bottles
            .retain(|d| !(d.bottle_type_id == bottle_type_id && d.quantity == 0));

        if remaining > 0 {
            book.defective_bottles.push(DefectiveBottle {
                id: new_id(),
                bottle_type_id: bottle_type_id.to_string(),
                quantity: -remaining,
                origin: shortfall_origin,
                note: non_empty(note),
                date: now,
            });
        }

        let shortfall = u32::try_from(remaining).unwrap_or(u32::MAX);
        self.push_history(
            book,
            bottle_type_id,
            StockType::Defective,
            previous,
            previous - i64::from(amount),
            note,
            now,
        );

        DefectiveConsumption {
            from_stock: amount - shortfall,
            shortfall,
        }
    }

    // ==========================================
    // 满瓶 (瓶型目录)
    // ==========================================

    /// 记录瓶型 remaining 数量变动
    pub fn record_full_movement(
        &self,
        book: &mut StockBook,
        bottle_type_id: &str,
        previous: u32,
        current: u32,
        note: &str,
    ) {
        if previous == current {
            return;
        }
        self.push_history(
            book,
            bottle_type_id,
            StockType::Full,
            i64::from(previous),
            i64::from(current),
            note,
            timestamp(),
        );
    }

    // ==========================================
    // 流水
    // ==========================================

    #[allow(clippy::too_many_arguments)]
    fn push_history(
        &self,
        book: &mut StockBook,
        bottle_type_id: &str,
        stock_type: StockType,
        previous: i64,
        current: i64,
        note: &str,
        now: NaiveDateTime,
    ) {
        let delta = current - previous;
        book.history.push(StockHistory {
            id: new_id(),
            date: now,
            bottle_type_id: bottle_type_id.to_string(),
            stock_type,
            change_type: ChangeType::from_delta(delta),
            quantity: delta.abs(),
            previous_quantity: previous,
            new_quantity: current,
            note: note.to_string(),
        });

        if book.history.len() > self.history_cap {
            let excess = book.history.len() - self.history_cap;
            book.history.drain(..excess);
        }
    }

    /// 从零重放流水, 得到空瓶/坏瓶合计
    pub fn replay(history: &[StockHistory]) -> StockTotals {
        let mut totals = StockTotals::default();
        for entry in history {
            let target = match entry.stock_type {
                StockType::Empty => &mut totals.empty,
                StockType::Defective => &mut totals.defective,
                StockType::Full => continue,
            };
            *target.entry(entry.bottle_type_id.clone()).or_insert(0) += entry.signed_quantity();
        }
        totals.normalized()
    }

    /// 账簿当前合计
    pub fn totals(book: &StockBook) -> StockTotals {
        let mut totals = StockTotals::default();
        for row in &book.empty_stock {
            *totals.empty.entry(row.bottle_type_id.clone()).or_insert(0) += row.quantity;
        }
        for entry in &book.defective_bottles {
            *totals.defective.entry(entry.bottle_type_id.clone()).or_insert(0) += entry.quantity;
        }
        totals.normalized()
    }
}

fn non_empty(note: &str) -> Option<String> {
    let trimmed = note.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
