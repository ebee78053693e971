// ==========================================
// 燃气瓶配送管理系统 - 单号生成
// ==========================================
// 供货单: "BS-N", 取现有最大序号 + 1, 无则从 1 开始
// 回收单: "BD-#####", 序号定宽补零
// ==========================================

use crate::domain::{ReturnOrder, SupplyOrder};

fn max_sequence<'a>(numbers: impl Iterator<Item = &'a str>, prefix: &str) -> u64 {
    numbers
        .filter_map(|n| n.strip_prefix(prefix)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// 下一个供货单号
pub fn next_supply_order_number(orders: &[SupplyOrder], prefix: &str) -> String {
    let next = max_sequence(orders.iter().map(|o| o.order_number.as_str()), prefix) + 1;
    format!("{}{}", prefix, next)
}

/// 下一个回收单号
pub fn next_return_order_number(orders: &[ReturnOrder], prefix: &str, digits: usize) -> String {
    let next = max_sequence(orders.iter().map(|o| o.order_number.as_str()), prefix) + 1;
    format!("{}{:0width$}", prefix, next, width = digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_sequence_ignores_foreign_formats() {
        let numbers = ["BS-3", "BS-12", "XX-99", "BS-abc", "BS-7"];
        assert_eq!(max_sequence(numbers.iter().copied(), "BS-"), 12);
        assert_eq!(max_sequence(std::iter::empty(), "BS-"), 0);
    }

    #[test]
    fn test_number_formats() {
        assert_eq!(next_supply_order_number(&[], "BS-"), "BS-1");
        assert_eq!(next_return_order_number(&[], "BD-", 5), "BD-00001");
    }
}
