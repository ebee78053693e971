// ==========================================
// 燃气瓶配送管理系统 - 账本快照 (导出/导入)
// ==========================================
// 格式: { <集合名>: [...], exportDate, version }
// 导入: 快照中出现的集合整体覆盖, 不做合并
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::engine::LedgerState;
use crate::repository::error::RepositoryResult;
use crate::repository::store::CollectionKey;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub export_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(flatten)]
    pub collections: Map<String, JsonValue>,
}

impl LedgerSnapshot {
    /// 从当前状态生成完整快照
    pub fn capture(state: &LedgerState, export_date: NaiveDateTime) -> RepositoryResult<Self> {
        let mut collections = Map::new();
        for key in CollectionKey::ALL {
            collections.insert(key.as_str().to_string(), state.encode(key)?);
        }
        Ok(Self {
            export_date: Some(export_date),
            version: Some(crate::VERSION.to_string()),
            collections,
        })
    }

    /// 按集合键拆分, 未知键单独返回
    pub fn into_parts(self) -> (Vec<(CollectionKey, JsonValue)>, Vec<String>) {
        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for (name, value) in self.collections {
            match CollectionKey::parse(&name) {
                Some(key) => known.push((key, value)),
                None => unknown.push(name),
            }
        }
        (known, unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_snapshot() {
        let raw = r#"{
            "exportDate": "2026-03-01T08:00:00",
            "version": "0.1.0",
            "drivers": [],
            "legacyStuff": [1, 2]
        }"#;
        let snapshot: LedgerSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.version.as_deref(), Some("0.1.0"));

        let (known, unknown) = snapshot.into_parts();
        assert_eq!(known.len(), 1);
        assert_eq!(known[0].0, CollectionKey::Drivers);
        assert_eq!(unknown, vec!["legacyStuff".to_string()]);
    }
}
