// ==========================================
// 燃气瓶配送管理系统 - 金额运算
// ==========================================
// 规则: 金额一律使用 checked 运算, 溢出视为校验错误
// 溢出在任何写入前返回, 工作副本整体丢弃
// ==========================================

use rust_decimal::Decimal;

use crate::engine::error::{LedgerError, LedgerResult};

fn overflow(what: &str) -> LedgerError {
    LedgerError::Validation(format!("金额超出范围: {}", what))
}

/// 数量 × 单价
pub fn line_amount(quantity: u32, price: Decimal, what: &str) -> LedgerResult<Decimal> {
    Decimal::from(quantity)
        .checked_mul(price)
        .ok_or_else(|| overflow(what))
}

pub fn checked_add(a: Decimal, b: Decimal, what: &str) -> LedgerResult<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(what))
}

pub fn checked_sub(a: Decimal, b: Decimal, what: &str) -> LedgerResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow(what))
}

pub fn checked_mul(a: Decimal, b: Decimal, what: &str) -> LedgerResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(what))
}

/// 逐项累加
pub fn checked_sum<I>(values: I, what: &str) -> LedgerResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| checked_add(acc, v, what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_amount_overflow_is_validation() {
        assert_eq!(
            line_amount(20, Decimal::from(60), "amount").unwrap(),
            Decimal::from(1200)
        );
        assert!(matches!(
            line_amount(20, Decimal::MAX, "amount"),
            Err(LedgerError::Validation(_))
        ));
        assert_eq!(line_amount(0, Decimal::MAX, "amount").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_checked_sum() {
        let values = [Decimal::from(1), Decimal::from(2), Decimal::from(3)];
        assert_eq!(checked_sum(values, "sum").unwrap(), Decimal::from(6));
        assert!(checked_sum([Decimal::MAX, Decimal::ONE], "sum").is_err());
        assert!(checked_sub(Decimal::MIN, Decimal::ONE, "diff").is_err());
    }
}
