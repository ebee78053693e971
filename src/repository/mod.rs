// ==========================================
// 燃气瓶配送管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 按集合存取 JSON, 屏蔽存储细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod memory_store;
pub mod sqlite_store;
pub mod store;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use memory_store::MemoryCollectionStore;
pub use sqlite_store::SqliteCollectionStore;
pub use store::{
    decode_collection, encode_collection, load_collection, CollectionKey, CollectionStore,
};
