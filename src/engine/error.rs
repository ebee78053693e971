// ==========================================
// 燃气瓶配送管理系统 - 引擎层错误类型
// ==========================================
// 规则:
// - 校验错误: 在任何写入前中止整个操作
// - 引用缺失(瓶型/司机): 跳过该明细并记录, 不中止
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::error::RepositoryError;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("数据验证失败: {0}")]
    Validation(String),

    #[error("库存不足: bottle_type={bottle_type_id}, 可用={available}, 需要={requested}")]
    InsufficientStock {
        bottle_type_id: String,
        available: u32,
        requested: u32,
    },

    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("业务冲突: {0}")]
    Conflict(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LedgerError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        LedgerError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result 类型别名
pub type LedgerResult<T> = Result<T, LedgerError>;

// ==========================================
// SkippedItem - 被跳过的明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedItem {
    pub bottle_type_id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    UnknownBottleType, // 瓶型不存在
    NotOnSupplyOrder,  // 供货单无此瓶型
    DuplicateLine,     // 同瓶型重复录入
}

impl SkippedItem {
    pub fn new(bottle_type_id: &str, reason: SkipReason) -> Self {
        tracing::warn!(bottle_type_id, ?reason, "明细已跳过");
        Self {
            bottle_type_id: bottle_type_id.to_string(),
            reason,
        }
    }
}
