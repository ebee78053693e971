// ==========================================
// SupplyOrderProcessor 集成测试
// ==========================================
// 测试目标: 供货出库与删除回滚
// 覆盖范围: 单号生成、库存扣减、校验、跳过未知瓶型
// ==========================================


use rust_decimal::Decimal;

use gas_cylinder_ledger::api::ApiError;
use gas_cylinder_ledger::domain::{Quantity, SupplyItemInput, SupplyOrderRequest};
use gas_cylinder_ledger::engine::SkipReason;
use test_helpers::*;

#[test]
fn test_supply_issues_full_bottles() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 100);
    let driver = seed_driver(&mut api);

    let outcome = api
        .create_supply_order(supply_request(Some(&driver.id), &bt.id, 20))
        .unwrap();

    assert_eq!(outcome.order.order_number, "BS-1");
    assert_eq!(outcome.order.total_amount, Decimal::from(1200));
    assert!(outcome.skipped.is_empty());

    let bottle = api.state().bottle_type(&bt.id).unwrap();
    assert_eq!(bottle.remaining_quantity, 80);
    assert_eq!(bottle.distributed_quantity, 20);
    assert_eq!(bottle.total_quantity, 100);
}

#[test]
fn test_delete_restores_stock() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 100);
    let driver = seed_driver(&mut api);
    let outcome = api
        .create_supply_order(supply_request(Some(&driver.id), &bt.id, 20))
        .unwrap();

    let deleted = api.delete_supply_order(&outcome.order.id).unwrap();
    assert_eq!(deleted.order_number, "BS-1");

    let bottle = api.state().bottle_type(&bt.id).unwrap();
    assert_eq!(bottle.remaining_quantity, 100);
    assert_eq!(bottle.distributed_quantity, 0);
    assert!(api.state().supply_orders.is_empty());
}

#[test]
fn test_order_numbers_increase() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 100);

    let first = api.create_supply_order(supply_request(None, &bt.id, 5)).unwrap();
    let second = api.create_supply_order(supply_request(None, &bt.id, 5)).unwrap();
    assert_eq!(first.order.order_number, "BS-1");
    assert_eq!(second.order.order_number, "BS-2");

    // 删除最新一单后序号回退到现有最大值 + 1
    api.delete_supply_order(&second.order.id).unwrap();
    let third = api.create_supply_order(supply_request(None, &bt.id, 5)).unwrap();
    assert_eq!(third.order.order_number, "BS-2");
}

#[test]
fn test_insufficient_stock_rejected() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 10);

    let result = api.create_supply_order(supply_request(None, &bt.id, 11));
    assert!(matches!(result, Err(ApiError::InsufficientStock(_))));

    let bottle = api.state().bottle_type(&bt.id).unwrap();
    assert_eq!(bottle.remaining_quantity, 10);
    assert!(api.state().supply_orders.is_empty());
}

#[test]
fn test_split_lines_checked_against_stock_together() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 10);

    let line = |full: u32| SupplyItemInput {
        bottle_type_id: bt.id.clone(),
        empty_quantity: Quantity::ZERO,
        full_quantity: Quantity::new(full),
        unit_price: None,
    };
    let result = api.create_supply_order(SupplyOrderRequest {
        driver_id: None,
        client_id: None,
        items: vec![line(6), line(6)],
    });
    assert!(matches!(result, Err(ApiError::InsufficientStock(_))));
}

#[test]
fn test_empty_and_zero_items_rejected() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 10);

    let empty = api.create_supply_order(SupplyOrderRequest::default());
    assert!(matches!(empty, Err(ApiError::ValidationError(_))));

    let zero = api.create_supply_order(supply_request(None, &bt.id, 0));
    assert!(matches!(zero, Err(ApiError::ValidationError(_))));
}

#[test]
fn test_unknown_bottle_type_skipped() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 10);

    let mut request = supply_request(None, &bt.id, 3);
    request.items.push(SupplyItemInput {
        bottle_type_id: "missing".to_string(),
        full_quantity: Quantity::new(2),
        ..Default::default()
    });
    let outcome = api.create_supply_order(request).unwrap();

    assert_eq!(outcome.order.items.len(), 1);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].reason, SkipReason::UnknownBottleType);

    // 全部未知 → 校验错误
    let all_unknown = api.create_supply_order(supply_request(None, "missing", 1));
    assert!(matches!(all_unknown, Err(ApiError::ValidationError(_))));
}

#[test]
fn test_unknown_driver_is_not_found() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 10);

    let result = api.create_supply_order(supply_request(Some("ghost"), &bt.id, 1));
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[test]
fn test_unit_price_override() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 10);

    let mut request = supply_request(None, &bt.id, 4);
    request.items[0].unit_price = Some(Decimal::new(555, 1));
    let outcome = api.create_supply_order(request).unwrap();

    assert_eq!(outcome.order.items[0].unit_price, Decimal::new(555, 1));
    assert_eq!(outcome.order.total_amount, Decimal::from(222));
}

#[test]
fn test_supply_writes_full_stock_history() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 50);
    let before = api.state().stock.history.len();

    api.create_supply_order(supply_request(None, &bt.id, 7)).unwrap();

    let history = &api.state().stock.history;
    assert_eq!(history.len(), before + 1);
    let row = history.last().unwrap();
    assert_eq!(row.previous_quantity, 50);
    assert_eq!(row.new_quantity, 43);
    assert_eq!(row.quantity, 7);
}

#[test]
fn test_amount_overflow_rejected() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 100);

    let mut request = supply_request(None, &bt.id, 20);
    request.items[0].unit_price = Some(Decimal::MAX);
    let result = api.create_supply_order(request);
    assert!(matches!(result, Err(ApiError::ValidationError(_))));

    assert!(api.state().supply_orders.is_empty());
    assert_eq!(api.state().bottle_type(&bt.id).unwrap().remaining_quantity, 100);
}
