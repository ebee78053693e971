// ==========================================
// 燃气瓶配送管理系统 - 资金台账引擎
// ==========================================
// 红线: 每笔现金操作镜像一条财务分录 (来源账户 → 去向账户)
// ==========================================

use rust_decimal::Decimal;

use crate::domain::{
    Account, CashOperation, CashOperationType, FinancialTransaction, FinancialTransactionType,
    Journal, PaymentMethod,
};
use crate::engine::{new_id, timestamp};

/// 一笔收款
#[derive(Debug, Clone)]
pub struct IncomeEntry {
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub source: Account,
    pub transaction_type: FinancialTransactionType,
    pub description: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FinancialJournal;

impl FinancialJournal {
    pub fn new() -> Self {
        Self
    }

    /// 记录收款
    ///
    /// # 返回
    /// 现金操作 id; 金额不为正时不记录, 返回 None
    pub fn record_income(&self, journal: &mut Journal, entry: IncomeEntry) -> Option<String> {
        if entry.amount <= Decimal::ZERO {
            return None;
        }
        let now = timestamp();
        let destination = entry.method.account();
        let cash_operation_id = new_id();

        journal.cash_operations.push(CashOperation {
            id: cash_operation_id.clone(),
            date: now,
            operation_type: CashOperationType::Income,
            amount: entry.amount,
            method: entry.method,
            account: destination.clone(),
            description: entry.description.clone(),
            reference: entry.reference.clone(),
        });
        journal.financial_transactions.push(FinancialTransaction {
            id: new_id(),
            date: now,
            transaction_type: entry.transaction_type,
            amount: entry.amount,
            source_account: entry.source.clone(),
            destination_account: destination.clone(),
            description: entry.description,
            cash_operation_id: cash_operation_id.clone(),
            reference: entry.reference,
        });

        tracing::debug!(
            method = %entry.method,
            amount = %entry.amount,
            source = %entry.source,
            destination = %destination,
            "资金流水已记录"
        );
        Some(cash_operation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_operation_mirrors_transaction() {
        let journal_engine = FinancialJournal::new();
        let mut journal = Journal::default();

        let id = journal_engine
            .record_income(
                &mut journal,
                IncomeEntry {
                    method: PaymentMethod::Check,
                    amount: Decimal::from(250),
                    source: Account::Driver("d1".into()),
                    transaction_type: FinancialTransactionType::DriverPayment,
                    description: "payment".into(),
                    reference: None,
                },
            )
            .unwrap();

        assert_eq!(journal.cash_operations.len(), 1);
        assert_eq!(journal.financial_transactions.len(), 1);
        let tx = &journal.financial_transactions[0];
        assert_eq!(tx.cash_operation_id, id);
        assert_eq!(tx.destination_account, Account::Bank);
        assert_eq!(journal.account_balance(&Account::Bank), Decimal::from(250));
        assert_eq!(
            journal.account_balance(&Account::Driver("d1".into())),
            Decimal::from(-250)
        );
    }

    #[test]
    fn test_zero_amount_not_recorded() {
        let journal_engine = FinancialJournal::new();
        let mut journal = Journal::default();
        let id = journal_engine.record_income(
            &mut journal,
            IncomeEntry {
                method: PaymentMethod::Cash,
                amount: Decimal::ZERO,
                source: Account::External,
                transaction_type: FinancialTransactionType::ReturnPayment,
                description: String::new(),
                reference: None,
            },
        );
        assert!(id.is_none());
        assert!(journal.cash_operations.is_empty());
    }
}
