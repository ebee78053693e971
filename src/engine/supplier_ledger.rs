// ==========================================
// 燃气瓶配送管理系统 - 工厂往来账引擎
// ==========================================
// 送厂: 空瓶库存减少, 坏瓶按先进先出消耗, 工厂欠瓶增加
// 回厂: 满瓶入库, 拒收坏瓶退回坏瓶库, 工厂欠瓶先冲空瓶后冲坏瓶
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::domain::{
    DefectiveOrigin, FactoryReceiptLine, FactoryShipmentLine, Supplier, SupplierTransaction,
    SupplierTransactionType,
};
use crate::engine::error::{LedgerError, LedgerResult, SkipReason, SkippedItem};
use crate::engine::state::{find, find_mut, LedgerState};
use crate::engine::stock_ledger::StockLedger;
use crate::engine::{new_id, timestamp};

/// 工厂往来处理结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryOutcome {
    pub supplier: Supplier,
    pub skipped: Vec<SkippedItem>,
}

#[derive(Debug, Clone)]
pub struct SupplierLedger {
    stock: StockLedger,
}

impl SupplierLedger {
    pub fn new(stock: StockLedger) -> Self {
        Self { stock }
    }

    /// 新建供应商
    pub fn create_supplier(
        &self,
        suppliers: &mut Vec<Supplier>,
        name: &str,
    ) -> LedgerResult<Supplier> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("供应商名称不能为空".to_string()));
        }
        if suppliers.iter().any(|s| s.name == name) {
            return Err(LedgerError::Conflict(format!("供应商已存在: {}", name)));
        }
        let supplier = Supplier {
            id: new_id(),
            name: name.to_string(),
            empty_owed: BTreeMap::new(),
            defective_owed: BTreeMap::new(),
            transactions: Vec::new(),
            created_at: timestamp(),
        };
        suppliers.push(supplier.clone());
        tracing::info!(supplier_id = %supplier.id, name, "供应商已创建");
        Ok(supplier)
    }

    /// 送厂 (空瓶 + 坏瓶)
    pub fn send_to_factory(
        &self,
        state: &mut LedgerState,
        supplier_id: &str,
        lines: Vec<FactoryShipmentLine>,
        note: Option<String>,
    ) -> LedgerResult<FactoryOutcome> {
        if state.supplier(supplier_id).is_none() {
            return Err(LedgerError::not_found("Supplier", supplier_id));
        }
        let (lines, skipped) = filter_lines(state, lines, |l| &l.bottle_type_id, |l| {
            l.empty.is_zero() && l.defective.is_zero()
        })?;

        let now = timestamp();
        let mut transactions = Vec::with_capacity(lines.len());
        for line in &lines {
            let empty = line.empty.get();
            let defective = line.defective.get();
            self.stock.mutate_empty(
                &mut state.stock,
                &line.bottle_type_id,
                -line.empty.as_i64(),
                "送厂空瓶",
            );
            let consumption = self.stock.consume_defective(
                &mut state.stock,
                &line.bottle_type_id,
                defective,
                DefectiveOrigin::FactoryNegative,
                "送厂坏瓶",
            );
            if consumption.shortfall > 0 {
                tracing::warn!(
                    bottle_type_id = %line.bottle_type_id,
                    shortfall = consumption.shortfall,
                    "坏瓶库存不足, 已记录缺口"
                );
            }

            transactions.push(SupplierTransaction {
                id: new_id(),
                date: now,
                transaction_type: SupplierTransactionType::SentToFactory,
                bottle_type_id: line.bottle_type_id.clone(),
                empty_quantity: empty,
                defective_quantity: defective,
                full_quantity: 0,
                note: note.clone(),
            });
        }

        let supplier = find_mut(&mut state.suppliers, supplier_id)
            .ok_or_else(|| LedgerError::not_found("Supplier", supplier_id))?;
        for line in &lines {
            *supplier
                .empty_owed
                .entry(line.bottle_type_id.clone())
                .or_insert(0) += line.empty.as_i64();
            *supplier
                .defective_owed
                .entry(line.bottle_type_id.clone())
                .or_insert(0) += line.defective.as_i64();
        }
        supplier.empty_owed.retain(|_, v| *v != 0);
        supplier.defective_owed.retain(|_, v| *v != 0);
        supplier.transactions.extend(transactions);

        tracing::info!(supplier_id, lines = lines.len(), "送厂已登记");
        Ok(FactoryOutcome {
            supplier: supplier.clone(),
            skipped,
        })
    }

    /// 工厂换回满瓶
    ///
    /// # 规则
    /// - 满瓶: total += full, remaining += full
    /// - 拒收坏瓶退回坏瓶库 (来源 factory)
    /// - 冲减欠瓶: 先 empty_owed, 再 defective_owed, 均不低于 0
    pub fn receive_from_factory(
        &self,
        state: &mut LedgerState,
        supplier_id: &str,
        lines: Vec<FactoryReceiptLine>,
        note: Option<String>,
    ) -> LedgerResult<FactoryOutcome> {
        if state.supplier(supplier_id).is_none() {
            return Err(LedgerError::not_found("Supplier", supplier_id));
        }
        let (lines, skipped) = filter_lines(state, lines, |l| &l.bottle_type_id, |l| {
            l.full.is_zero() && l.defective.is_zero()
        })?;

        let now = timestamp();
        let mut transactions = Vec::with_capacity(lines.len());
        for line in &lines {
            let full = line.full.get();
            if let Some(bottle) = find_mut(&mut state.bottle_types, &line.bottle_type_id) {
                let previous = bottle.remaining_quantity;
                bottle.receive(full);
                bottle.updated_at = now;
                self.stock.record_full_movement(
                    &mut state.stock,
                    &line.bottle_type_id,
                    previous,
                    bottle.remaining_quantity,
                    "工厂换回满瓶",
                );
            }
            self.stock.add_defective(
                &mut state.stock,
                &line.bottle_type_id,
                line.defective.get(),
                DefectiveOrigin::Factory,
                "工厂退回坏瓶",
            );

            transactions.push(SupplierTransaction {
                id: new_id(),
                date: now,
                transaction_type: SupplierTransactionType::ReceivedFromFactory,
                bottle_type_id: line.bottle_type_id.clone(),
                empty_quantity: 0,
                defective_quantity: line.defective.get(),
                full_quantity: full,
                note: note.clone(),
            });
        }

        let supplier = find_mut(&mut state.suppliers, supplier_id)
            .ok_or_else(|| LedgerError::not_found("Supplier", supplier_id))?;
        for line in &lines {
            // 退回的坏瓶同样冲减欠瓶
            let mut settle = line.full.as_i64() + line.defective.as_i64();
            for owed in [&mut supplier.empty_owed, &mut supplier.defective_owed] {
                if settle == 0 {
                    break;
                }
                let slot = owed.entry(line.bottle_type_id.clone()).or_insert(0);
                let take = (*slot).max(0).min(settle);
                *slot -= take;
                settle -= take;
            }
            if settle > 0 {
                tracing::warn!(
                    bottle_type_id = %line.bottle_type_id,
                    excess = settle,
                    "换回数量超出欠瓶"
                );
            }
        }
        supplier.empty_owed.retain(|_, v| *v != 0);
        supplier.defective_owed.retain(|_, v| *v != 0);
        supplier.transactions.extend(transactions);

        tracing::info!(supplier_id, lines = lines.len(), "工厂换回已登记");
        Ok(FactoryOutcome {
            supplier: supplier.clone(),
            skipped,
        })
    }
}

// 过滤未知瓶型/重复行, 全部为零数量时报错
fn filter_lines<T>(
    state: &LedgerState,
    lines: Vec<T>,
    bottle_type_of: impl Fn(&T) -> &String,
    is_empty: impl Fn(&T) -> bool,
) -> LedgerResult<(Vec<T>, Vec<SkippedItem>)> {
    let mut seen = HashSet::new();
    let mut skipped = Vec::new();
    let mut kept = Vec::with_capacity(lines.len());
    for line in lines {
        let bottle_type_id = bottle_type_of(&line).clone();
        if find(&state.bottle_types, &bottle_type_id).is_none() {
            skipped.push(SkippedItem::new(&bottle_type_id, SkipReason::UnknownBottleType));
            continue;
        }
        if !seen.insert(bottle_type_id.clone()) {
            skipped.push(SkippedItem::new(&bottle_type_id, SkipReason::DuplicateLine));
            continue;
        }
        if is_empty(&line) {
            continue;
        }
        kept.push(line);
    }
    if kept.is_empty() {
        return Err(LedgerError::Validation("没有可处理的明细".to_string()));
    }
    Ok((kept, skipped))
}
