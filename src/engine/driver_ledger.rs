// ==========================================
// 燃气瓶配送管理系统 - 司机账本引擎
// ==========================================
// 红线: 每次写入后 balance == advances - debt
// 红线: debt / advances 不低于 0
// ==========================================

use rust_decimal::Decimal;
use std::collections::BTreeSet;

use crate::domain::{
    Driver, DriverTransaction, DriverTransactionType, RcChange, RcHistoryEntry,
    RemainingBottlesPatch,
};
use crate::engine::error::{LedgerError, LedgerResult};
use crate::engine::money;
use crate::engine::{new_id, timestamp};

/// 付款分解: 冲抵欠款部分 + 转为预付部分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentApplication {
    pub debt_paid: Decimal,
    pub advance_added: Decimal,
}

// ==========================================
// DriverLedger
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DriverLedger;

impl DriverLedger {
    pub fn new() -> Self {
        Self
    }

    /// 新建司机
    pub fn create_driver(
        &self,
        drivers: &mut Vec<Driver>,
        name: &str,
        phone: Option<String>,
    ) -> LedgerResult<Driver> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("司机姓名不能为空".to_string()));
        }
        let phone = phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        let driver = Driver::new(new_id(), name.to_string(), phone, timestamp());
        drivers.push(driver.clone());

        tracing::info!(driver_id = %driver.id, name, "司机已创建");
        Ok(driver)
    }

    /// 司机付款
    ///
    /// # 规则
    /// - amount <= debt: 直接冲减欠款
    /// - amount > debt: 欠款清零, 超出部分记为预付
    pub fn record_payment(
        &self,
        driver: &mut Driver,
        amount: Decimal,
        reference: Option<String>,
    ) -> LedgerResult<PaymentApplication> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "付款金额必须大于0: {}",
                amount
            )));
        }

        let (application, description) = if amount <= driver.debt {
            driver.debt -= amount;
            (
                PaymentApplication {
                    debt_paid: amount,
                    advance_added: Decimal::ZERO,
                },
                format!("还款 {}", amount),
            )
        } else {
            let debt_paid = driver.debt;
            let advance_added = amount - debt_paid;
            let advances = money::checked_add(driver.advances, advance_added, "司机预付")?;
            driver.debt = Decimal::ZERO;
            driver.advances = advances;
            (
                PaymentApplication {
                    debt_paid,
                    advance_added,
                },
                format!("还清欠款 {}, 预付 {}", debt_paid, advance_added),
            )
        };
        driver.recompute_balance();

        driver.transactions.push(DriverTransaction {
            id: new_id(),
            date: timestamp(),
            transaction_type: DriverTransactionType::Payment,
            amount: -amount,
            description,
            reference,
        });

        tracing::info!(
            driver_id = %driver.id,
            %amount,
            debt = %driver.debt,
            advances = %driver.advances,
            "司机付款已入账"
        );
        Ok(application)
    }

    /// 调整欠款
    ///
    /// # 参数
    /// - `delta`: 正数增加欠款, 负数冲减 (欠款不低于 0)
    ///
    /// # 返回
    /// 调整后的欠款, 溢出时返回校验错误且司机不变
    pub fn apply_debt_delta(
        &self,
        driver: &mut Driver,
        delta: Decimal,
        description: &str,
        reference: Option<String>,
    ) -> LedgerResult<Decimal> {
        let debt = money::checked_add(driver.debt, delta, "司机欠款")?;
        driver.debt = debt.max(Decimal::ZERO);
        driver.recompute_balance();

        let transaction_type = if delta < Decimal::ZERO {
            DriverTransactionType::Payment
        } else {
            DriverTransactionType::Debt
        };
        driver.transactions.push(DriverTransaction {
            id: new_id(),
            date: timestamp(),
            transaction_type,
            amount: delta,
            description: description.to_string(),
            reference,
        });

        tracing::debug!(driver_id = %driver.id, %delta, debt = %driver.debt, "司机欠款调整");
        Ok(driver.debt)
    }

    /// 更新 R.C. 瓶
    ///
    /// # 返回
    /// 各瓶型的变化 (数量未变的瓶型不出现)
    ///
    /// # 说明
    /// 仅覆盖模式写入 rc_history
    pub fn update_remaining_bottles(
        &self,
        driver: &mut Driver,
        patch: RemainingBottlesPatch,
        note: Option<String>,
    ) -> Vec<RcChange> {
        match patch {
            RemainingBottlesPatch::Merge(additions) => {
                let mut changes = Vec::new();
                for (bottle_type_id, qty) in additions {
                    if qty == 0 {
                        continue;
                    }
                    let slot = driver
                        .remaining_bottles
                        .entry(bottle_type_id.clone())
                        .or_insert(0);
                    let previous_qty = *slot;
                    *slot += qty;
                    changes.push(RcChange {
                        bottle_type_id,
                        previous_qty,
                        new_qty: *slot,
                        diff: qty,
                    });
                }
                changes
            }
            RemainingBottlesPatch::Override(replacement) => {
                let keys: BTreeSet<&String> = driver
                    .remaining_bottles
                    .keys()
                    .chain(replacement.keys())
                    .collect();
                let changes: Vec<RcChange> = keys
                    .into_iter()
                    .filter_map(|key| {
                        let previous_qty = driver.remaining_bottles.get(key).copied().unwrap_or(0);
                        let new_qty = replacement.get(key).copied().unwrap_or(0);
                        (previous_qty != new_qty).then(|| RcChange {
                            bottle_type_id: key.clone(),
                            previous_qty,
                            new_qty,
                            diff: new_qty - previous_qty,
                        })
                    })
                    .collect();

                driver.remaining_bottles = replacement;
                if !changes.is_empty() {
                    driver.rc_history.push(RcHistoryEntry {
                        id: new_id(),
                        date: timestamp(),
                        changes: changes.clone(),
                        note,
                    });
                }
                changes
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn driver() -> Driver {
        Driver::new("d1".into(), "Ahmed".into(), None, timestamp())
    }

    #[test]
    fn test_payment_within_debt() {
        let ledger = DriverLedger::new();
        let mut d = driver();
        ledger
            .apply_debt_delta(&mut d, Decimal::from(100), "debt", None)
            .unwrap();

        let app = ledger.record_payment(&mut d, Decimal::from(40), None).unwrap();
        assert_eq!(app.debt_paid, Decimal::from(40));
        assert_eq!(app.advance_added, Decimal::ZERO);
        assert_eq!(d.debt, Decimal::from(60));
        assert_eq!(d.balance, Decimal::from(-60));
        assert!(d.is_consistent());
    }

    #[test]
    fn test_debt_overflow_leaves_driver_untouched() {
        let ledger = DriverLedger::new();
        let mut d = driver();
        ledger.apply_debt_delta(&mut d, Decimal::MAX, "debt", None).unwrap();

        let result = ledger.apply_debt_delta(&mut d, Decimal::ONE, "debt", None);
        assert!(matches!(result, Err(LedgerError::Validation(_))));
        assert_eq!(d.debt, Decimal::MAX);
        assert_eq!(d.transactions.len(), 1);
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let ledger = DriverLedger::new();
        let mut d = driver();
        assert!(ledger.record_payment(&mut d, Decimal::ZERO, None).is_err());
        assert!(d.transactions.is_empty());
    }

    #[test]
    fn test_override_keeps_removed_keys_in_diff() {
        let ledger = DriverLedger::new();
        let mut d = driver();
        d.remaining_bottles.insert("a".into(), 3);

        let changes = ledger.update_remaining_bottles(
            &mut d,
            RemainingBottlesPatch::Override(BTreeMap::new()),
            None,
        );
        assert_eq!(
            changes,
            vec![RcChange {
                bottle_type_id: "a".into(),
                previous_qty: 3,
                new_qty: 0,
                diff: -3,
            }]
        );
        assert!(d.remaining_bottles.is_empty());
    }
}
