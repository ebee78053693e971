// ==========================================
// 燃气瓶配送管理系统 - 付款分配引擎
// ==========================================
// 规则:
// - total_paid   = cash + check + mygaz (负数视为 0)
// - invoice_debt = max(0, total - total_paid)
// - gas_debt     = max(0, (subtotal - expenses) - total_paid)
//   gas_debt 不含押金费用, 是实际记入司机账的金额
// ==========================================

use rust_decimal::Decimal;

use crate::domain::types::non_negative;
use crate::domain::{PaymentMethod, PaymentSplit, PaymentSummary, ReturnTotals};
use crate::engine::error::{LedgerError, LedgerResult};
use crate::engine::money;

#[derive(Debug, Clone, Default)]
pub struct PaymentAllocator;

impl PaymentAllocator {
    pub fn new() -> Self {
        Self
    }

    /// 分配付款, 得到两种欠款口径
    ///
    /// # 返回
    /// 付款合计溢出时返回校验错误
    pub fn allocate(
        &self,
        totals: &ReturnTotals,
        split: &PaymentSplit,
    ) -> LedgerResult<PaymentSummary> {
        let cash = non_negative(split.cash);
        let check = non_negative(split.check);
        let mygaz = non_negative(split.mygaz);
        let total_paid = money::checked_sum([cash, check, mygaz], "付款合计")?;
        let gas_base = totals.gas_base().ok_or_else(|| {
            LedgerError::Validation("金额超出范围: 燃气欠款基数".to_string())
        })?;
        let invoice_debt = money::checked_sub(totals.total, total_paid, "应缴欠款")?;
        let gas_debt = money::checked_sub(gas_base, total_paid, "燃气欠款")?;
        let surplus = money::checked_sub(total_paid, totals.total, "超额付款")?;

        Ok(PaymentSummary {
            cash,
            check,
            mygaz,
            total_paid,
            invoice_debt: non_negative(invoice_debt),
            gas_debt: non_negative(gas_debt),
            surplus: non_negative(surplus),
        })
    }

    /// 非零付款分项
    pub fn tranches(&self, summary: &PaymentSummary) -> Vec<(PaymentMethod, Decimal)> {
        [
            (PaymentMethod::Cash, summary.cash),
            (PaymentMethod::Check, summary.check),
            (PaymentMethod::MyGaz, summary.mygaz),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount > Decimal::ZERO)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(subtotal: i64, consigne: i64, expenses: i64) -> ReturnTotals {
        let subtotal = Decimal::from(subtotal);
        let consigne = Decimal::from(consigne);
        let expenses = Decimal::from(expenses);
        ReturnTotals {
            subtotal,
            tax_rate: Decimal::new(10, 2),
            tax_amount: subtotal * Decimal::new(10, 2),
            consigne_fees_total: consigne,
            total_expenses: expenses,
            total: subtotal + consigne - expenses,
        }
    }

    #[test]
    fn test_gas_debt_excludes_consigne() {
        let allocator = PaymentAllocator::new();
        let split = PaymentSplit {
            cash: Decimal::from(500),
            ..Default::default()
        };
        let summary = allocator.allocate(&totals(1020, 50, 30), &split).unwrap();

        assert_eq!(summary.total_paid, Decimal::from(500));
        assert_eq!(summary.invoice_debt, Decimal::from(540));
        assert_eq!(summary.gas_debt, Decimal::from(490));
        assert_eq!(summary.surplus, Decimal::ZERO);
    }

    #[test]
    fn test_overpayment_and_negative_inputs() {
        let allocator = PaymentAllocator::new();
        let split = PaymentSplit {
            cash: Decimal::from(700),
            check: Decimal::from(-50),
            mygaz: Decimal::from(400),
        };
        let summary = allocator.allocate(&totals(1020, 50, 30), &split).unwrap();

        assert_eq!(summary.check, Decimal::ZERO);
        assert_eq!(summary.total_paid, Decimal::from(1100));
        assert_eq!(summary.invoice_debt, Decimal::ZERO);
        assert_eq!(summary.gas_debt, Decimal::ZERO);
        assert_eq!(summary.surplus, Decimal::from(60));

        let tranches = allocator.tranches(&summary);
        assert_eq!(
            tranches,
            vec![
                (PaymentMethod::Cash, Decimal::from(700)),
                (PaymentMethod::MyGaz, Decimal::from(400)),
            ]
        );
    }

    #[test]
    fn test_payment_sum_overflow_rejected() {
        let allocator = PaymentAllocator::new();
        let split = PaymentSplit {
            cash: Decimal::MAX,
            check: Decimal::MAX,
            mygaz: Decimal::ZERO,
        };
        assert!(allocator.allocate(&totals(1020, 50, 30), &split).is_err());
    }
}
