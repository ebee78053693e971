// ==========================================
// 燃气瓶配送管理系统 - 瓶型目录引擎
// ==========================================
// 职责: 新增瓶型 / 满瓶入库 / 价格维护
// 满瓶数量变动写入库存流水 (stock_type = full)
// ==========================================

use rust_decimal::Decimal;

use crate::domain::{BottleType, NewBottleType, PricingUpdate, Quantity, StockBook};
use crate::engine::error::{LedgerError, LedgerResult};
use crate::engine::state::find_mut;
use crate::engine::stock_ledger::StockLedger;
use crate::engine::{new_id, timestamp};

#[derive(Debug, Clone)]
pub struct BottleCatalog {
    stock: StockLedger,
    default_tax_rate: Decimal,
}

impl BottleCatalog {
    pub fn new(stock: StockLedger, default_tax_rate: Decimal) -> Self {
        Self {
            stock,
            default_tax_rate,
        }
    }

    /// 新增瓶型
    ///
    /// # 规则
    /// - total = remaining = 初始数量, distributed = 0
    /// - 名称不能为空, 不能与已有瓶型重名
    pub fn add_bottle_type(
        &self,
        bottle_types: &mut Vec<BottleType>,
        book: &mut StockBook,
        request: NewBottleType,
    ) -> LedgerResult<BottleType> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("瓶型名称不能为空".to_string()));
        }
        if bottle_types.iter().any(|b| b.name == name) {
            return Err(LedgerError::Conflict(format!("瓶型已存在: {}", name)));
        }
        validate_prices(
            Some(request.unit_price),
            Some(request.consigne_price),
            request.tax_rate,
        )?;

        let initial = request.initial_quantity.get();
        let bottle = BottleType {
            id: new_id(),
            name: name.to_string(),
            capacity: request.capacity.trim().to_string(),
            total_quantity: initial,
            distributed_quantity: 0,
            remaining_quantity: initial,
            unit_price: request.unit_price,
            consigne_price: request.consigne_price,
            tax_rate: request.tax_rate.unwrap_or(self.default_tax_rate),
            updated_at: timestamp(),
        };
        self.stock
            .record_full_movement(book, &bottle.id, 0, initial, "新增瓶型");
        bottle_types.push(bottle.clone());

        tracing::info!(bottle_type_id = %bottle.id, name = %bottle.name, initial, "瓶型已创建");
        Ok(bottle)
    }

    /// 满瓶入库
    pub fn restock(
        &self,
        bottle_types: &mut [BottleType],
        book: &mut StockBook,
        bottle_type_id: &str,
        quantity: Quantity,
        note: Option<&str>,
    ) -> LedgerResult<BottleType> {
        if quantity.is_zero() {
            return Err(LedgerError::Validation("入库数量必须大于0".to_string()));
        }
        let bottle = find_mut(bottle_types, bottle_type_id)
            .ok_or_else(|| LedgerError::not_found("BottleType", bottle_type_id))?;

        let previous = bottle.remaining_quantity;
        bottle.receive(quantity.get());
        bottle.updated_at = timestamp();
        self.stock.record_full_movement(
            book,
            bottle_type_id,
            previous,
            bottle.remaining_quantity,
            note.unwrap_or("满瓶入库"),
        );

        tracing::info!(
            bottle_type_id,
            quantity = quantity.get(),
            total = bottle.total_quantity,
            "满瓶入库"
        );
        Ok(bottle.clone())
    }

    /// 调整价格/税率
    pub fn update_pricing(
        &self,
        bottle_types: &mut [BottleType],
        bottle_type_id: &str,
        update: PricingUpdate,
    ) -> LedgerResult<BottleType> {
        validate_prices(update.unit_price, update.consigne_price, update.tax_rate)?;
        let bottle = find_mut(bottle_types, bottle_type_id)
            .ok_or_else(|| LedgerError::not_found("BottleType", bottle_type_id))?;

        if let Some(price) = update.unit_price {
            bottle.unit_price = price;
        }
        if let Some(price) = update.consigne_price {
            bottle.consigne_price = price;
        }
        if let Some(rate) = update.tax_rate {
            bottle.tax_rate = rate;
        }
        bottle.updated_at = timestamp();

        tracing::info!(
            bottle_type_id,
            unit_price = %bottle.unit_price,
            consigne_price = %bottle.consigne_price,
            tax_rate = %bottle.tax_rate,
            "瓶型价格已更新"
        );
        Ok(bottle.clone())
    }
}

fn validate_prices(
    unit_price: Option<Decimal>,
    consigne_price: Option<Decimal>,
    tax_rate: Option<Decimal>,
) -> LedgerResult<()> {
    if unit_price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(LedgerError::Validation("单价不能为负".to_string()));
    }
    if consigne_price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(LedgerError::Validation("押金单价不能为负".to_string()));
    }
    if tax_rate.is_some_and(|r| r < Decimal::ZERO || r > Decimal::ONE) {
        return Err(LedgerError::Validation("税率必须在 0~1 之间".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> BottleCatalog {
        BottleCatalog::new(StockLedger::new(100), Decimal::new(10, 2))
    }

    #[test]
    fn test_add_uses_default_tax_rate() {
        let mut types = Vec::new();
        let mut book = StockBook::default();
        let bt = catalog()
            .add_bottle_type(
                &mut types,
                &mut book,
                NewBottleType {
                    name: " Butane12 ".into(),
                    capacity: "12kg".into(),
                    unit_price: Decimal::from(60),
                    initial_quantity: Quantity::new(100),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(bt.name, "Butane12");
        assert_eq!(bt.tax_rate, Decimal::new(10, 2));
        assert_eq!((bt.total_quantity, bt.remaining_quantity), (100, 100));
        assert_eq!(book.history.len(), 1);
    }

    #[test]
    fn test_invalid_tax_rate_rejected() {
        let mut types = Vec::new();
        let mut book = StockBook::default();
        let result = catalog().add_bottle_type(
            &mut types,
            &mut book,
            NewBottleType {
                name: "Propane".into(),
                tax_rate: Some(Decimal::from(2)),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(LedgerError::Validation(_))));
        assert!(types.is_empty());
    }
}
