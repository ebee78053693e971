// ==========================================
// 燃气瓶配送管理系统 - 账本服务 API
// ==========================================
// 职责: 持有全部集合, 对外提供命令与查询
// 事务: 命令在工作副本上执行
//   1) 引擎出错 → 丢弃工作副本, 内存与存储均不变
//   2) 成功 → 变更集合一次性写入存储 (save_all)
//   3) 写入成功后才替换内存状态
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::snapshot::LedgerSnapshot;
use crate::config::LedgerConfig;
use crate::domain::{
    Account, BottleType, DefectiveOrigin, Driver, FactoryReceiptLine, FactoryShipmentLine,
    FinancialTransactionType, NewBottleType, PaymentMethod, PricingUpdate, Quantity, RcChange,
    RemainingBottlesPatch, ReturnOrder, ReturnOrderRequest, Supplier, SupplyOrder,
    SupplyOrderRequest,
};
use crate::engine::state::find_mut;
use crate::engine::{
    timestamp, BottleCatalog, DefectiveConsumption, DriverLedger, FactoryOutcome,
    FinancialJournal, IncomeEntry, LedgerError, LedgerResult, LedgerState, PaymentApplication,
    ReturnOutcome, ReturnReconciler, StockLedger, StockTotals, SupplierLedger,
    SupplyOrderProcessor, SupplyOutcome,
};
use crate::repository::error::RepositoryResult;
use crate::repository::store::{CollectionKey, CollectionStore};

// ==========================================
// LedgerEngines - 按配置组装的引擎集合
// ==========================================
#[derive(Debug, Clone)]
pub struct LedgerEngines {
    pub stock: StockLedger,
    pub catalog: BottleCatalog,
    pub supply: SupplyOrderProcessor,
    pub reconciler: ReturnReconciler,
    pub drivers: DriverLedger,
    pub journal: FinancialJournal,
    pub suppliers: SupplierLedger,
}

impl LedgerEngines {
    pub fn new(config: &LedgerConfig) -> Self {
        let stock = StockLedger::new(config.stock_history_cap);
        Self {
            catalog: BottleCatalog::new(stock.clone(), config.tax_rate),
            supply: SupplyOrderProcessor::new(stock.clone(), config.supply_order_prefix.clone()),
            reconciler: ReturnReconciler::new(
                stock.clone(),
                config.tax_rate,
                config.return_order_prefix.clone(),
                config.return_order_digits,
            ),
            drivers: DriverLedger::new(),
            journal: FinancialJournal::new(),
            suppliers: SupplierLedger::new(stock.clone()),
            stock,
        }
    }
}

// ==========================================
// 查询结果
// ==========================================

/// 单个瓶型的库存概览
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleStockLine {
    pub bottle_type_id: String,
    pub name: String,
    pub total: u32,
    pub distributed: u32,
    pub remaining: u32,
    pub empty: i64,
    pub defective: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub bottles: Vec<BottleStockLine>,
    pub totals: StockTotals,
    /// 流水重放结果是否与账簿一致 (流水被截断后可能不一致)
    pub history_consistent: bool,
}

/// 司机对账单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStatement {
    pub driver: Driver,
    pub return_orders: Vec<ReturnOrder>,
    pub open_supply_orders: Vec<SupplyOrder>,
    /// 资金流水中该司机账户的净额 (付出为负)
    pub journal_balance: Decimal,
}

// ==========================================
// LedgerApi
// ==========================================
pub struct LedgerApi<S: CollectionStore> {
    store: S,
    config: LedgerConfig,
    engines: LedgerEngines,
    state: LedgerState,
}

impl<S: CollectionStore> LedgerApi<S> {
    /// 从存储加载全部集合
    pub fn open(store: S, config: LedgerConfig) -> ApiResult<Self> {
        let state = LedgerState::load(&store)?;
        Ok(Self {
            engines: LedgerEngines::new(&config),
            store,
            config,
            state,
        })
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 全有或全无地执行一条命令
    fn execute<T>(
        &mut self,
        command: &str,
        f: impl FnOnce(&LedgerEngines, &mut LedgerState) -> LedgerResult<T>,
    ) -> ApiResult<T> {
        let mut working = self.state.clone();
        let value = f(&self.engines, &mut working).map_err(|e| {
            tracing::warn!(command, error = %e, "命令失败, 状态未变更");
            ApiError::from(e)
        })?;

        let changed = working.changed_collections(&self.state);
        if !changed.is_empty() {
            let batch = changed
                .iter()
                .map(|key| Ok((*key, working.encode(*key)?)))
                .collect::<RepositoryResult<Vec<_>>>()?;
            self.store.save_all(&batch).map_err(|e| {
                tracing::error!(command, error = %e, "持久化失败, 状态未变更");
                ApiError::from(e)
            })?;
        }
        self.state = working;

        tracing::info!(
            command,
            collections = ?changed.iter().map(CollectionKey::as_str).collect::<Vec<_>>(),
            "命令已提交"
        );
        Ok(value)
    }

    // ==========================================
    // 瓶型目录
    // ==========================================

    pub fn add_bottle_type(&mut self, request: NewBottleType) -> ApiResult<BottleType> {
        self.execute("add_bottle_type", |engines, state| {
            engines
                .catalog
                .add_bottle_type(&mut state.bottle_types, &mut state.stock, request)
        })
    }

    pub fn restock_bottle_type(
        &mut self,
        bottle_type_id: &str,
        quantity: Quantity,
        note: Option<&str>,
    ) -> ApiResult<BottleType> {
        self.execute("restock_bottle_type", |engines, state| {
            engines.catalog.restock(
                &mut state.bottle_types,
                &mut state.stock,
                bottle_type_id,
                quantity,
                note,
            )
        })
    }

    pub fn update_bottle_pricing(
        &mut self,
        bottle_type_id: &str,
        update: PricingUpdate,
    ) -> ApiResult<BottleType> {
        self.execute("update_bottle_pricing", |engines, state| {
            engines
                .catalog
                .update_pricing(&mut state.bottle_types, bottle_type_id, update)
        })
    }

    // ==========================================
    // 主数据
    // ==========================================

    pub fn create_driver(&mut self, name: &str, phone: Option<String>) -> ApiResult<Driver> {
        self.execute("create_driver", |engines, state| {
            engines.drivers.create_driver(&mut state.drivers, name, phone)
        })
    }

    pub fn create_supplier(&mut self, name: &str) -> ApiResult<Supplier> {
        self.execute("create_supplier", |engines, state| {
            engines.suppliers.create_supplier(&mut state.suppliers, name)
        })
    }

    // ==========================================
    // 供货单 / 回收单
    // ==========================================

    pub fn create_supply_order(&mut self, request: SupplyOrderRequest) -> ApiResult<SupplyOutcome> {
        self.execute("create_supply_order", |engines, state| {
            engines.supply.create(state, request)
        })
    }

    pub fn delete_supply_order(&mut self, supply_order_id: &str) -> ApiResult<SupplyOrder> {
        self.execute("delete_supply_order", |engines, state| {
            engines.supply.delete(state, supply_order_id)
        })
    }

    pub fn process_return_order(
        &mut self,
        request: ReturnOrderRequest,
    ) -> ApiResult<ReturnOutcome> {
        self.execute("process_return_order", |engines, state| {
            engines.reconciler.process(state, request)
        })
    }

    // ==========================================
    // 司机账
    // ==========================================

    /// 司机付款, 同时登记资金流水
    pub fn record_driver_payment(
        &mut self,
        driver_id: &str,
        amount: Decimal,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> ApiResult<PaymentApplication> {
        self.execute("record_driver_payment", |engines, state| {
            let driver = find_mut(&mut state.drivers, driver_id)
                .ok_or_else(|| LedgerError::not_found("Driver", driver_id))?;
            let application = engines
                .drivers
                .record_payment(driver, amount, reference.clone())?;
            let description = format!("司机 {} 付款 ({})", driver.name, method);
            engines.journal.record_income(
                &mut state.journal,
                IncomeEntry {
                    method,
                    amount,
                    source: Account::Driver(driver_id.to_string()),
                    transaction_type: FinancialTransactionType::DriverPayment,
                    description,
                    reference,
                },
            );
            Ok(application)
        })
    }

    pub fn apply_driver_debt_delta(
        &mut self,
        driver_id: &str,
        delta: Decimal,
        description: &str,
    ) -> ApiResult<Driver> {
        self.execute("apply_driver_debt_delta", |engines, state| {
            let driver = find_mut(&mut state.drivers, driver_id)
                .ok_or_else(|| LedgerError::not_found("Driver", driver_id))?;
            engines
                .drivers
                .apply_debt_delta(driver, delta, description, None)?;
            Ok(driver.clone())
        })
    }

    pub fn update_driver_remaining_bottles(
        &mut self,
        driver_id: &str,
        patch: RemainingBottlesPatch,
        note: Option<String>,
    ) -> ApiResult<Vec<RcChange>> {
        self.execute("update_driver_remaining_bottles", |engines, state| {
            let driver = find_mut(&mut state.drivers, driver_id)
                .ok_or_else(|| LedgerError::not_found("Driver", driver_id))?;
            Ok(engines
                .drivers
                .update_remaining_bottles(driver, patch, note))
        })
    }

    // ==========================================
    // 手工库存调整
    // ==========================================

    pub fn adjust_empty_stock(
        &mut self,
        bottle_type_id: &str,
        delta: i64,
        note: &str,
    ) -> ApiResult<i64> {
        self.execute("adjust_empty_stock", |engines, state| {
            ensure_bottle_type(state, bottle_type_id)?;
            if delta == 0 {
                return Err(LedgerError::Validation("调整数量不能为0".to_string()));
            }
            if delta.unsigned_abs() > u64::from(u32::MAX) {
                return Err(LedgerError::Validation(format!(
                    "调整数量超出范围: {}",
                    delta
                )));
            }
            Ok(engines
                .stock
                .mutate_empty(&mut state.stock, bottle_type_id, delta, note))
        })
    }

    pub fn add_defective_bottles(
        &mut self,
        bottle_type_id: &str,
        quantity: Quantity,
        note: &str,
    ) -> ApiResult<String> {
        self.execute("add_defective_bottles", |engines, state| {
            ensure_bottle_type(state, bottle_type_id)?;
            engines
                .stock
                .add_defective(
                    &mut state.stock,
                    bottle_type_id,
                    quantity.get(),
                    DefectiveOrigin::Manual,
                    note,
                )
                .ok_or_else(|| LedgerError::Validation("坏瓶数量必须大于0".to_string()))
        })
    }

    pub fn remove_defective_bottles(
        &mut self,
        bottle_type_id: &str,
        quantity: Quantity,
        note: &str,
    ) -> ApiResult<DefectiveConsumption> {
        self.execute("remove_defective_bottles", |engines, state| {
            ensure_bottle_type(state, bottle_type_id)?;
            if quantity.is_zero() {
                return Err(LedgerError::Validation("坏瓶数量必须大于0".to_string()));
            }
            Ok(engines.stock.consume_defective(
                &mut state.stock,
                bottle_type_id,
                quantity.get(),
                DefectiveOrigin::Manual,
                note,
            ))
        })
    }

    // ==========================================
    // 工厂往来
    // ==========================================

    pub fn send_to_factory(
        &mut self,
        supplier_id: &str,
        lines: Vec<FactoryShipmentLine>,
        note: Option<String>,
    ) -> ApiResult<FactoryOutcome> {
        self.execute("send_to_factory", |engines, state| {
            engines.suppliers.send_to_factory(state, supplier_id, lines, note)
        })
    }

    pub fn receive_from_factory(
        &mut self,
        supplier_id: &str,
        lines: Vec<FactoryReceiptLine>,
        note: Option<String>,
    ) -> ApiResult<FactoryOutcome> {
        self.execute("receive_from_factory", |engines, state| {
            engines
                .suppliers
                .receive_from_factory(state, supplier_id, lines, note)
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn stock_summary(&self) -> StockSummary {
        let book = &self.state.stock;
        let bottles = self
            .state
            .bottle_types
            .iter()
            .map(|b| BottleStockLine {
                bottle_type_id: b.id.clone(),
                name: b.name.clone(),
                total: b.total_quantity,
                distributed: b.distributed_quantity,
                remaining: b.remaining_quantity,
                empty: book.empty_quantity(&b.id),
                defective: book.defective_quantity(&b.id),
            })
            .collect();
        let totals = StockLedger::totals(book);
        StockSummary {
            bottles,
            history_consistent: StockLedger::replay(&book.history) == totals,
            totals,
        }
    }

    /// 从零重放库存流水
    pub fn replay_stock_history(&self) -> StockTotals {
        StockLedger::replay(&self.state.stock.history)
    }

    pub fn driver_statement(&self, driver_id: &str) -> ApiResult<DriverStatement> {
        let driver = self
            .state
            .driver(driver_id)
            .ok_or_else(|| LedgerError::not_found("Driver", driver_id))?;
        let return_orders: Vec<ReturnOrder> = self
            .state
            .return_orders
            .iter()
            .filter(|r| r.driver_id.as_deref() == Some(driver_id))
            .cloned()
            .collect();
        let open_supply_orders = self
            .state
            .supply_orders
            .iter()
            .filter(|o| o.driver_id.as_deref() == Some(driver_id))
            .filter(|o| self.state.return_order_for_supply(&o.id).is_none())
            .cloned()
            .collect();

        Ok(DriverStatement {
            driver: driver.clone(),
            return_orders,
            open_supply_orders,
            journal_balance: self
                .state
                .journal
                .account_balance(&Account::Driver(driver_id.to_string())),
        })
    }

    // ==========================================
    // 快照
    // ==========================================

    pub fn export_snapshot(&self) -> ApiResult<LedgerSnapshot> {
        let snapshot = LedgerSnapshot::capture(&self.state, timestamp())?;
        tracing::info!(collections = snapshot.collections.len(), "快照已导出");
        Ok(snapshot)
    }

    /// 导入快照
    ///
    /// # 返回
    /// 被覆盖的集合
    pub fn import_snapshot(&mut self, snapshot: LedgerSnapshot) -> ApiResult<Vec<CollectionKey>> {
        let (collections, unknown) = snapshot.into_parts();
        for name in &unknown {
            tracing::warn!(collection = %name, "快照包含未知集合, 已忽略");
        }
        if collections.is_empty() {
            return Err(ApiError::ImportError("快照中没有可导入的集合".to_string()));
        }

        self.execute("import_snapshot", |_, state| {
            let mut replaced = Vec::with_capacity(collections.len());
            for (key, value) in collections {
                state.replace(key, value)?;
                replaced.push(key);
            }
            Ok(replaced)
        })
    }
}

fn ensure_bottle_type(state: &LedgerState, bottle_type_id: &str) -> LedgerResult<()> {
    state
        .bottle_type(bottle_type_id)
        .map(|_| ())
        .ok_or_else(|| LedgerError::not_found("BottleType", bottle_type_id))
}
