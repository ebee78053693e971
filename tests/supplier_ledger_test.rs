// ==========================================
// SupplierLedger 集成测试
// ==========================================
// 测试目标: 工厂往来 (送厂/换回)
// 覆盖范围: 欠瓶累计与冲减、坏瓶缺口、满瓶入库
// ==========================================


use gas_cylinder_ledger::api::ApiError;
use gas_cylinder_ledger::domain::{
    DefectiveOrigin, FactoryReceiptLine, FactoryShipmentLine, Quantity, SupplierTransactionType,
};
use gas_cylinder_ledger::engine::SkipReason;
use test_helpers::*;

fn shipment(bottle_type_id: &str, empty: u32, defective: u32) -> FactoryShipmentLine {
    FactoryShipmentLine {
        bottle_type_id: bottle_type_id.to_string(),
        empty: Quantity::new(empty),
        defective: Quantity::new(defective),
    }
}

fn receipt(bottle_type_id: &str, full: u32, defective: u32) -> FactoryReceiptLine {
    FactoryReceiptLine {
        bottle_type_id: bottle_type_id.to_string(),
        full: Quantity::new(full),
        defective: Quantity::new(defective),
    }
}

#[test]
fn test_send_to_factory_moves_stock() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 10);
    let supplier = api.create_supplier("Usine Mohammedia").unwrap();
    api.adjust_empty_stock(&bt.id, 30, "盘点").unwrap();
    api.add_defective_bottles(&bt.id, Quantity::new(2), "检查")
        .unwrap();

    let outcome = api
        .send_to_factory(&supplier.id, vec![shipment(&bt.id, 25, 3)], None)
        .unwrap();

    assert_eq!(outcome.supplier.empty_owed.get(&bt.id), Some(&25));
    assert_eq!(outcome.supplier.defective_owed.get(&bt.id), Some(&3));
    assert_eq!(outcome.supplier.owed_total(&bt.id), 28);
    assert_eq!(
        outcome.supplier.transactions[0].transaction_type,
        SupplierTransactionType::SentToFactory
    );

    let stock = &api.state().stock;
    assert_eq!(stock.empty_quantity(&bt.id), 5);
    // 坏瓶只有 2 个, 缺口 1 记负数行
    assert_eq!(stock.defective_quantity(&bt.id), -1);
    assert_eq!(
        stock.defective_bottles.last().unwrap().origin,
        DefectiveOrigin::FactoryNegative
    );
}

#[test]
fn test_receive_from_factory_settles_owed() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 10);
    let supplier = api.create_supplier("Usine").unwrap();
    api.send_to_factory(&supplier.id, vec![shipment(&bt.id, 8, 4)], None)
        .unwrap();

    let outcome = api
        .receive_from_factory(
            &supplier.id,
            vec![receipt(&bt.id, 9, 1)],
            Some("换回".to_string()),
        )
        .unwrap();

    // 10 个先冲空瓶 8, 余 2 冲坏瓶
    assert_eq!(outcome.supplier.empty_owed.get(&bt.id), None);
    assert_eq!(outcome.supplier.defective_owed.get(&bt.id), Some(&2));

    let bottle = api.state().bottle_type(&bt.id).unwrap();
    assert_eq!(bottle.total_quantity, 19);
    assert_eq!(bottle.remaining_quantity, 19);

    let factory_rows: Vec<_> = api
        .state()
        .stock
        .defective_bottles
        .iter()
        .filter(|d| d.origin == DefectiveOrigin::Factory)
        .collect();
    assert_eq!(factory_rows.len(), 1);
    assert_eq!(factory_rows[0].quantity, 1);

    let last = outcome.supplier.transactions.last().unwrap();
    assert_eq!(last.transaction_type, SupplierTransactionType::ReceivedFromFactory);
    assert_eq!(last.full_quantity, 9);
    assert_eq!(last.note.as_deref(), Some("换回"));
}

#[test]
fn test_receive_more_than_owed_clamps_at_zero() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 0);
    let supplier = api.create_supplier("Usine").unwrap();
    api.send_to_factory(&supplier.id, vec![shipment(&bt.id, 2, 0)], None)
        .unwrap();

    let outcome = api
        .receive_from_factory(&supplier.id, vec![receipt(&bt.id, 5, 0)], None)
        .unwrap();
    assert!(outcome.supplier.empty_owed.is_empty());
    assert!(outcome.supplier.defective_owed.is_empty());
    assert_eq!(api.state().bottle_type(&bt.id).unwrap().total_quantity, 5);
}

#[test]
fn test_unknown_lines_and_supplier() {
    let mut api = memory_ledger();
    let bt = seed_butane(&mut api, 10);
    let supplier = api.create_supplier("Usine").unwrap();

    let outcome = api
        .send_to_factory(
            &supplier.id,
            vec![shipment(&bt.id, 1, 0), shipment("missing", 1, 0)],
            None,
        )
        .unwrap();
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].reason, SkipReason::UnknownBottleType);

    let missing = api.send_to_factory("ghost", vec![shipment(&bt.id, 1, 0)], None);
    assert!(matches!(missing, Err(ApiError::NotFound(_))));

    let nothing = api.send_to_factory(&supplier.id, vec![shipment(&bt.id, 0, 0)], None);
    assert!(matches!(nothing, Err(ApiError::ValidationError(_))));
}

#[test]
fn test_duplicate_supplier_rejected() {
    let mut api = memory_ledger();
    api.create_supplier("Usine").unwrap();
    assert!(matches!(
        api.create_supplier("Usine"),
        Err(ApiError::Conflict(_))
    ));
}
