// ==========================================
// 燃气瓶配送管理系统 - 集合存储接口
// ==========================================
// 职责: 按逻辑集合名存取整块 JSON
// 红线: Repository 不含业务逻辑
// ==========================================

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;

use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// CollectionKey - 集合键
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollectionKey {
    BottleTypes,
    SupplyOrders,
    ReturnOrders,
    EmptyBottlesStock,
    DefectiveBottles,
    ForeignBottles,
    StockHistory,
    Drivers,
    CashOperations,
    FinancialTransactions,
    Suppliers,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 11] = [
        CollectionKey::BottleTypes,
        CollectionKey::SupplyOrders,
        CollectionKey::ReturnOrders,
        CollectionKey::EmptyBottlesStock,
        CollectionKey::DefectiveBottles,
        CollectionKey::ForeignBottles,
        CollectionKey::StockHistory,
        CollectionKey::Drivers,
        CollectionKey::CashOperations,
        CollectionKey::FinancialTransactions,
        CollectionKey::Suppliers,
    ];

    /// 存储键名 (与导出快照字段一致)
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKey::BottleTypes => "bottleTypes",
            CollectionKey::SupplyOrders => "supplyOrders",
            CollectionKey::ReturnOrders => "returnOrders",
            CollectionKey::EmptyBottlesStock => "emptyBottlesStock",
            CollectionKey::DefectiveBottles => "defectiveBottles",
            CollectionKey::ForeignBottles => "foreignBottles",
            CollectionKey::StockHistory => "stockHistory",
            CollectionKey::Drivers => "drivers",
            CollectionKey::CashOperations => "cashOperations",
            CollectionKey::FinancialTransactions => "financialTransactions",
            CollectionKey::Suppliers => "suppliers",
        }
    }

    /// 从键名解析
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// CollectionStore - 存储接口
// ==========================================

/// 集合存储
///
/// 每个集合以一个 JSON 数组整体存取
pub trait CollectionStore {
    /// 读取集合, 不存在返回 None
    fn load(&self, key: CollectionKey) -> RepositoryResult<Option<JsonValue>>;

    /// 覆盖写入集合
    fn save(&self, key: CollectionKey, value: &JsonValue) -> RepositoryResult<()>;

    /// 批量写入
    ///
    /// 默认逐个写入; 支持事务的实现应覆盖为全有或全无
    fn save_all(&self, batch: &[(CollectionKey, JsonValue)]) -> RepositoryResult<()> {
        for (key, value) in batch {
            self.save(*key, value)?;
        }
        Ok(())
    }
}

impl<S: CollectionStore + ?Sized> CollectionStore for Box<S> {
    fn load(&self, key: CollectionKey) -> RepositoryResult<Option<JsonValue>> {
        (**self).load(key)
    }

    fn save(&self, key: CollectionKey, value: &JsonValue) -> RepositoryResult<()> {
        (**self).save(key, value)
    }

    fn save_all(&self, batch: &[(CollectionKey, JsonValue)]) -> RepositoryResult<()> {
        (**self).save_all(batch)
    }
}

// ==========================================
// 类型化辅助函数
// ==========================================

/// 读取并反序列化集合, 不存在返回空列表
pub fn load_collection<T, S>(store: &S, key: CollectionKey) -> RepositoryResult<Vec<T>>
where
    T: DeserializeOwned,
    S: CollectionStore + ?Sized,
{
    match store.load(key)? {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(value) => decode_collection(key, value),
    }
}

/// 反序列化集合 JSON
pub fn decode_collection<T: DeserializeOwned>(
    key: CollectionKey,
    value: JsonValue,
) -> RepositoryResult<Vec<T>> {
    serde_json::from_value(value).map_err(|e| RepositoryError::CorruptCollection {
        collection: key.to_string(),
        message: e.to_string(),
    })
}

/// 序列化集合
pub fn encode_collection<T: Serialize>(items: &[T]) -> RepositoryResult<JsonValue> {
    Ok(serde_json::to_value(items)?)
}
