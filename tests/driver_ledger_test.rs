// ==========================================
// DriverLedger 集成测试
// ==========================================
// 测试目标: 司机欠款/预付/余额与 R.C. 瓶
// 覆盖范围: 付款冲抵、欠款调整、合并/覆盖模式、资金流水
// ==========================================


use rust_decimal::Decimal;
use std::collections::BTreeMap;

use gas_cylinder_ledger::api::ApiError;
use gas_cylinder_ledger::domain::{
    Account, DriverTransactionType, FinancialTransactionType, PaymentMethod, RemainingBottlesPatch,
};
use test_helpers::*;

#[test]
fn test_payment_exceeding_debt_becomes_advance() {
    let mut api = memory_ledger();
    let driver = seed_driver(&mut api);
    api.apply_driver_debt_delta(&driver.id, Decimal::from(490), "回收单欠款")
        .unwrap();

    let application = api
        .record_driver_payment(&driver.id, Decimal::from(600), PaymentMethod::Cash, None)
        .unwrap();
    assert_eq!(application.debt_paid, Decimal::from(490));
    assert_eq!(application.advance_added, Decimal::from(110));

    let d = api.state().driver(&driver.id).unwrap();
    assert_eq!(d.debt, Decimal::ZERO);
    assert_eq!(d.advances, Decimal::from(110));
    assert_eq!(d.balance, Decimal::from(110));
    assert!(d.is_consistent());

    let last = d.transactions.last().unwrap();
    assert_eq!(last.transaction_type, DriverTransactionType::Payment);
    assert_eq!(last.amount, Decimal::from(-600));
}

#[test]
fn test_payment_recorded_in_journal() {
    let mut api = memory_ledger();
    let driver = seed_driver(&mut api);

    api.record_driver_payment(
        &driver.id,
        Decimal::from(250),
        PaymentMethod::Check,
        Some("CHQ-001".to_string()),
    )
    .unwrap();

    let journal = &api.state().journal;
    assert_eq!(journal.cash_operations.len(), 1);
    let tx = &journal.financial_transactions[0];
    assert_eq!(tx.transaction_type, FinancialTransactionType::DriverPayment);
    assert_eq!(tx.source_account, Account::Driver(driver.id.clone()));
    assert_eq!(tx.destination_account, Account::Bank);
    assert_eq!(tx.reference.as_deref(), Some("CHQ-001"));
}

#[test]
fn test_invalid_payment_leaves_state() {
    let mut api = memory_ledger();
    let driver = seed_driver(&mut api);
    let before = api.state().clone();

    let zero = api.record_driver_payment(&driver.id, Decimal::ZERO, PaymentMethod::Cash, None);
    assert!(matches!(zero, Err(ApiError::ValidationError(_))));

    let ghost = api.record_driver_payment("ghost", Decimal::from(10), PaymentMethod::Cash, None);
    assert!(matches!(ghost, Err(ApiError::NotFound(_))));

    assert_eq!(api.state(), &before);
}

#[test]
fn test_negative_delta_clamped_and_logged_as_payment() {
    let mut api = memory_ledger();
    let driver = seed_driver(&mut api);
    api.apply_driver_debt_delta(&driver.id, Decimal::from(100), "欠款")
        .unwrap();

    let d = api
        .apply_driver_debt_delta(&driver.id, Decimal::from(-150), "冲减")
        .unwrap();
    assert_eq!(d.debt, Decimal::ZERO);
    assert_eq!(d.balance, Decimal::ZERO);
    assert!(d.is_consistent());

    let kinds: Vec<DriverTransactionType> =
        d.transactions.iter().map(|t| t.transaction_type).collect();
    assert_eq!(
        kinds,
        vec![DriverTransactionType::Debt, DriverTransactionType::Payment]
    );
}

#[test]
fn test_balance_consistent_over_sequence() {
    let mut api = memory_ledger();
    let driver = seed_driver(&mut api);

    let steps: [(i64, bool); 6] = [
        (300, false),
        (120, true),
        (-50, false),
        (400, true),
        (75, false),
        (10, true),
    ];
    for (value, is_payment) in steps {
        if is_payment {
            api.record_driver_payment(&driver.id, Decimal::from(value), PaymentMethod::Cash, None)
                .unwrap();
        } else {
            api.apply_driver_debt_delta(&driver.id, Decimal::from(value), "调整")
                .unwrap();
        }
        let d = api.state().driver(&driver.id).unwrap();
        assert!(d.is_consistent(), "不一致: {:?}", d);
    }
}

#[test]
fn test_merge_remaining_bottles() {
    let mut api = memory_ledger();
    let driver = seed_driver(&mut api);

    let first = BTreeMap::from([("a".to_string(), 2), ("b".to_string(), 1)]);
    let second = BTreeMap::from([("a".to_string(), 3)]);
    api.update_driver_remaining_bottles(&driver.id, RemainingBottlesPatch::Merge(first), None)
        .unwrap();
    let changes = api
        .update_driver_remaining_bottles(&driver.id, RemainingBottlesPatch::Merge(second), None)
        .unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].previous_qty, 2);
    assert_eq!(changes[0].new_qty, 5);

    let d = api.state().driver(&driver.id).unwrap();
    assert_eq!(d.remaining_bottles.get("a"), Some(&5));
    assert_eq!(d.remaining_bottles.get("b"), Some(&1));
    // 合并模式不写 rc_history
    assert!(d.rc_history.is_empty());
}

#[test]
fn test_override_remaining_bottles_writes_history() {
    let mut api = memory_ledger();
    let driver = seed_driver(&mut api);
    api.update_driver_remaining_bottles(
        &driver.id,
        RemainingBottlesPatch::Merge(BTreeMap::from([
            ("a".to_string(), 4),
            ("b".to_string(), 2),
        ])),
        None,
    )
    .unwrap();

    let changes = api
        .update_driver_remaining_bottles(
            &driver.id,
            RemainingBottlesPatch::Override(BTreeMap::from([
                ("a".to_string(), 1),
                ("b".to_string(), 2),
                ("c".to_string(), 6),
            ])),
            Some("盘点".to_string()),
        )
        .unwrap();

    let diffs: Vec<(String, i64)> = changes
        .iter()
        .map(|c| (c.bottle_type_id.clone(), c.diff))
        .collect();
    assert_eq!(diffs, vec![("a".to_string(), -3), ("c".to_string(), 6)]);

    let d = api.state().driver(&driver.id).unwrap();
    assert_eq!(d.rc_history.len(), 1);
    assert_eq!(d.rc_history[0].note.as_deref(), Some("盘点"));
    assert_eq!(d.remaining_bottles.len(), 3);

    // 相同内容覆盖不产生历史
    let same = d.remaining_bottles.clone();
    let changes = api
        .update_driver_remaining_bottles(&driver.id, RemainingBottlesPatch::Override(same), None)
        .unwrap();
    assert!(changes.is_empty());
    assert_eq!(api.state().driver(&driver.id).unwrap().rc_history.len(), 1);
}

#[test]
fn test_patch_serde_shape() {
    let patch: RemainingBottlesPatch =
        serde_json::from_str(r#"{"mode":"override","bottles":{"a":3}}"#).unwrap();
    assert_eq!(
        patch,
        RemainingBottlesPatch::Override(BTreeMap::from([("a".to_string(), 3)]))
    );
}

#[test]
fn test_driver_statement() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 100);
    let driver = seed_driver(&mut api);
    let first = api
        .create_supply_order(supply_request(Some(&driver.id), &bt.id, 10))
        .unwrap();
    api.create_supply_order(supply_request(Some(&driver.id), &bt.id, 5))
        .unwrap();
    api.process_return_order(return_request(
        &first.order.id,
        vec![return_item(&bt.id, [10, 0, 0, 0, 0, 0])],
        200,
    ))
    .unwrap();

    let statement = api.driver_statement(&driver.id).unwrap();
    assert_eq!(statement.return_orders.len(), 1);
    assert_eq!(statement.open_supply_orders.len(), 1);
    assert_eq!(statement.driver.debt, Decimal::from(400));
    assert_eq!(statement.journal_balance, Decimal::from(-200));

    assert!(matches!(
        api.driver_statement("ghost"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_create_driver_requires_name() {
    let mut api = memory_ledger();
    let result = api.create_driver("  ", None);
    assert!(matches!(result, Err(ApiError::ValidationError(_))));
    assert!(api.state().drivers.is_empty());
}

#[test]
fn test_debt_overflow_rejected() {
    let mut api = memory_ledger();
    let driver = seed_driver(&mut api);
    api.apply_driver_debt_delta(&driver.id, Decimal::MAX, "欠款")
        .unwrap();

    let result = api.apply_driver_debt_delta(&driver.id, Decimal::MAX, "欠款");
    assert!(matches!(result, Err(ApiError::ValidationError(_))));

    let d = api.state().driver(&driver.id).unwrap();
    assert_eq!(d.debt, Decimal::MAX);
    assert_eq!(d.transactions.len(), 1);
    assert!(d.is_consistent());
}
