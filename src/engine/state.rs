// ==========================================
// 燃气瓶配送管理系统 - 账本聚合状态
// ==========================================
// 职责: 持有全部集合, 负责集合 <-> JSON 映射与变更检测
// 说明: 命令在工作副本上执行, 成功后按集合比较决定写入范围
// ==========================================

use serde_json::Value as JsonValue;

use crate::domain::{
    BottleType, Driver, ForeignBottle, Journal, ReturnOrder, StockBook, Supplier, SupplyOrder,
};
use crate::repository::error::RepositoryResult;
use crate::repository::store::{
    decode_collection, encode_collection, load_collection, CollectionKey, CollectionStore,
};

// ==========================================
// LedgerState
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerState {
    pub bottle_types: Vec<BottleType>,
    pub supply_orders: Vec<SupplyOrder>,
    pub return_orders: Vec<ReturnOrder>,
    pub stock: StockBook,
    pub foreign_bottles: Vec<ForeignBottle>,
    pub drivers: Vec<Driver>,
    pub journal: Journal,
    pub suppliers: Vec<Supplier>,
}

impl LedgerState {
    /// 从存储加载全部集合
    pub fn load<S: CollectionStore + ?Sized>(store: &S) -> RepositoryResult<Self> {
        let state = Self {
            bottle_types: load_collection(store, CollectionKey::BottleTypes)?,
            supply_orders: load_collection(store, CollectionKey::SupplyOrders)?,
            return_orders: load_collection(store, CollectionKey::ReturnOrders)?,
            stock: StockBook {
                empty_stock: load_collection(store, CollectionKey::EmptyBottlesStock)?,
                defective_bottles: load_collection(store, CollectionKey::DefectiveBottles)?,
                history: load_collection(store, CollectionKey::StockHistory)?,
            },
            foreign_bottles: load_collection(store, CollectionKey::ForeignBottles)?,
            drivers: load_collection(store, CollectionKey::Drivers)?,
            journal: Journal {
                cash_operations: load_collection(store, CollectionKey::CashOperations)?,
                financial_transactions: load_collection(
                    store,
                    CollectionKey::FinancialTransactions,
                )?,
            },
            suppliers: load_collection(store, CollectionKey::Suppliers)?,
        };

        tracing::info!(
            bottle_types = state.bottle_types.len(),
            supply_orders = state.supply_orders.len(),
            return_orders = state.return_orders.len(),
            drivers = state.drivers.len(),
            "账本状态已加载"
        );
        Ok(state)
    }

    /// 序列化单个集合
    pub fn encode(&self, key: CollectionKey) -> RepositoryResult<JsonValue> {
        match key {
            CollectionKey::BottleTypes => encode_collection(&self.bottle_types),
            CollectionKey::SupplyOrders => encode_collection(&self.supply_orders),
            CollectionKey::ReturnOrders => encode_collection(&self.return_orders),
            CollectionKey::EmptyBottlesStock => encode_collection(&self.stock.empty_stock),
            CollectionKey::DefectiveBottles => encode_collection(&self.stock.defective_bottles),
            CollectionKey::ForeignBottles => encode_collection(&self.foreign_bottles),
            CollectionKey::StockHistory => encode_collection(&self.stock.history),
            CollectionKey::Drivers => encode_collection(&self.drivers),
            CollectionKey::CashOperations => encode_collection(&self.journal.cash_operations),
            CollectionKey::FinancialTransactions => {
                encode_collection(&self.journal.financial_transactions)
            }
            CollectionKey::Suppliers => encode_collection(&self.suppliers),
        }
    }

    /// 整体替换单个集合 (导入)
    pub fn replace(&mut self, key: CollectionKey, value: JsonValue) -> RepositoryResult<()> {
        match key {
            CollectionKey::BottleTypes => self.bottle_types = decode_collection(key, value)?,
            CollectionKey::SupplyOrders => self.supply_orders = decode_collection(key, value)?,
            CollectionKey::ReturnOrders => self.return_orders = decode_collection(key, value)?,
            CollectionKey::EmptyBottlesStock => {
                self.stock.empty_stock = decode_collection(key, value)?
            }
            CollectionKey::DefectiveBottles => {
                self.stock.defective_bottles = decode_collection(key, value)?
            }
            CollectionKey::ForeignBottles => self.foreign_bottles = decode_collection(key, value)?,
            CollectionKey::StockHistory => self.stock.history = decode_collection(key, value)?,
            CollectionKey::Drivers => self.drivers = decode_collection(key, value)?,
            CollectionKey::CashOperations => {
                self.journal.cash_operations = decode_collection(key, value)?
            }
            CollectionKey::FinancialTransactions => {
                self.journal.financial_transactions = decode_collection(key, value)?
            }
            CollectionKey::Suppliers => self.suppliers = decode_collection(key, value)?,
        }
        Ok(())
    }

    /// 与另一个状态相比发生变化的集合
    pub fn changed_collections(&self, other: &LedgerState) -> Vec<CollectionKey> {
        CollectionKey::ALL
            .into_iter()
            .filter(|key| !self.same_collection(other, *key))
            .collect()
    }

    fn same_collection(&self, other: &LedgerState, key: CollectionKey) -> bool {
        match key {
            CollectionKey::BottleTypes => self.bottle_types == other.bottle_types,
            CollectionKey::SupplyOrders => self.supply_orders == other.supply_orders,
            CollectionKey::ReturnOrders => self.return_orders == other.return_orders,
            CollectionKey::EmptyBottlesStock => self.stock.empty_stock == other.stock.empty_stock,
            CollectionKey::DefectiveBottles => {
                self.stock.defective_bottles == other.stock.defective_bottles
            }
            CollectionKey::ForeignBottles => self.foreign_bottles == other.foreign_bottles,
            CollectionKey::StockHistory => self.stock.history == other.stock.history,
            CollectionKey::Drivers => self.drivers == other.drivers,
            CollectionKey::CashOperations => {
                self.journal.cash_operations == other.journal.cash_operations
            }
            CollectionKey::FinancialTransactions => {
                self.journal.financial_transactions == other.journal.financial_transactions
            }
            CollectionKey::Suppliers => self.suppliers == other.suppliers,
        }
    }

    // ===== 查询辅助 =====

    pub fn bottle_type(&self, id: &str) -> Option<&BottleType> {
        find(&self.bottle_types, id)
    }

    pub fn driver(&self, id: &str) -> Option<&Driver> {
        find(&self.drivers, id)
    }

    pub fn supply_order(&self, id: &str) -> Option<&SupplyOrder> {
        find(&self.supply_orders, id)
    }

    pub fn supplier(&self, id: &str) -> Option<&Supplier> {
        find(&self.suppliers, id)
    }

    pub fn return_order_for_supply(&self, supply_order_id: &str) -> Option<&ReturnOrder> {
        self.return_orders
            .iter()
            .find(|r| r.supply_order_id == supply_order_id)
    }
}

// ==========================================
// 按 id 查找 (按字段借用, 便于同时修改多个集合)
// ==========================================

pub trait Identified {
    fn id(&self) -> &str;
}

macro_rules! impl_identified {
    ($($ty:ty),* $(,)?) => {
        $(impl Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_identified!(BottleType, Driver, SupplyOrder, ReturnOrder, Supplier);

pub fn find<'a, T: Identified>(items: &'a [T], id: &str) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

pub fn find_mut<'a, T: Identified>(items: &'a mut [T], id: &str) -> Option<&'a mut T> {
    items.iter_mut().find(|item| item.id() == id)
}
