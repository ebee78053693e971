// ==========================================
// 燃气瓶配送管理系统 - API层错误类型
// ==========================================
// 职责: 将引擎/仓储错误转换为用户可读的错误消息
// ==========================================

use crate::engine::error::LedgerError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("库存不足: {0}")]
    InsufficientStock(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务冲突: {0}")]
    Conflict(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据格式错误: {0}")]
    DataFormatError(String),

    // ==========================================
    // 导入导出
    // ==========================================
    #[error("快照导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::CorruptCollection {
                collection,
                message,
            } => ApiError::DataFormatError(format!("{}: {}", collection, message)),
            RepositoryError::SerializationError(msg) => ApiError::DataFormatError(msg),
            RepositoryError::Unavailable(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 LedgerError 转换
// ==========================================
impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(msg) => ApiError::ValidationError(msg),
            LedgerError::InsufficientStock {
                bottle_type_id,
                available,
                requested,
            } => ApiError::InsufficientStock(format!(
                "瓶型{}可用{}个, 需要{}个",
                bottle_type_id, available, requested
            )),
            LedgerError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            LedgerError::Conflict(msg) => ApiError::Conflict(msg),
            LedgerError::Repository(err) => err.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_conversion() {
        let api_err: ApiError = LedgerError::not_found("Driver", "D001").into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Driver"));
                assert!(msg.contains("D001"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = LedgerError::InsufficientStock {
            bottle_type_id: "bt".to_string(),
            available: 3,
            requested: 5,
        }
        .into();
        assert!(matches!(api_err, ApiError::InsufficientStock(_)));
    }

    #[test]
    fn test_repository_error_passthrough() {
        let api_err: ApiError =
            LedgerError::Repository(RepositoryError::LockError("poisoned".into())).into();
        match api_err {
            ApiError::DatabaseConnectionError(msg) => assert!(msg.contains("poisoned")),
            _ => panic!("Expected DatabaseConnectionError"),
        }
    }
}
