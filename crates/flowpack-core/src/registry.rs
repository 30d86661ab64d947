//! フローレジストリ
//!
//! ビルドまでの間、登録されたフローとイメージ内配置先を保持します。

use crate::error::{FlowError, Result};
use crate::flow::Flow;
use crate::slug::slugify;
use std::collections::BTreeMap;
use std::path::Path;

/// イメージ内でフローペイロードを配置する固定ディレクトリ
pub const FLOW_DIR: &str = "/root/.flowpack/flows";

/// フローペイロードの拡張子
pub const FLOW_EXTENSION: &str = "flow";

/// 登録済みフローの集合
///
/// 名前 -> コンテナ内パスの対応と、ビルド時まで保持するペイロードを持ちます。
/// 名前順で決定的に列挙されます。
#[derive(Debug, Default)]
pub struct FlowRegistry {
    locations: BTreeMap<String, String>,
    flows: BTreeMap<String, Flow>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// フローを登録し、コンテナ内の配置先パスを返す
    ///
    /// 同名のフローが既に登録されている場合は `NameConflict` となり、
    /// レジストリは変更されません。
    pub fn add(&mut self, flow: &Flow) -> Result<String> {
        if self.contains(&flow.name) {
            return Err(FlowError::NameConflict {
                name: flow.name.clone(),
            });
        }

        let location = format!("{}/{}.{}", FLOW_DIR, slugify(&flow.name), FLOW_EXTENSION);
        self.locations.insert(flow.name.clone(), location.clone());
        self.flows.insert(flow.name.clone(), flow.clone());
        tracing::debug!("Registered flow '{}' at {}", flow.name, location);
        Ok(location)
    }

    /// 名前が登録済みかどうか
    pub fn contains(&self, name: &str) -> bool {
        self.locations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// 名前 -> コンテナ内パスの対応（名前順）
    pub fn locations(&self) -> &BTreeMap<String, String> {
        &self.locations
    }

    /// 登録順（名前順）でフロー本体を列挙
    pub fn flows(&self) -> impl Iterator<Item = (&String, &Flow)> {
        self.flows.iter()
    }

    /// 登録済みフロー名のリスト（名前順）
    pub fn names(&self) -> Vec<&str> {
        self.locations.keys().map(String::as_str).collect()
    }

    /// コンテナ内パスからフローを読み戻す
    ///
    /// コンテナ内のランタイムコンテキストでのみ呼び出される想定です。
    pub fn load(&self, location: impl AsRef<Path>) -> Result<Flow> {
        Flow::load(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_flow(name: &str) -> Flow {
        Flow::new(name, vec!["python".into(), "run.py".into()])
    }

    #[test]
    fn test_add_returns_slugged_location() {
        let mut registry = FlowRegistry::new();
        let location = registry.add(&sample_flow("My Flow!")).unwrap();
        assert_eq!(location, "/root/.flowpack/flows/my-flow.flow");
        assert!(registry.contains("My Flow!"));
    }

    #[test]
    fn test_add_duplicate_name_is_conflict() {
        let mut registry = FlowRegistry::new();
        registry.add(&sample_flow("etl")).unwrap();

        let err = registry.add(&sample_flow("etl")).unwrap_err();
        assert!(matches!(err, FlowError::NameConflict { ref name } if name == "etl"));

        // 失敗した add ではレジストリは変化しない
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_contains_unregistered() {
        let registry = FlowRegistry::new();
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn test_locations_sorted_by_name() {
        let mut registry = FlowRegistry::new();
        registry.add(&sample_flow("zeta")).unwrap();
        registry.add(&sample_flow("alpha")).unwrap();

        let names: Vec<&str> = registry.names();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etl.flow");

        let flow = sample_flow("etl");
        std::fs::write(&path, flow.to_bytes().unwrap()).unwrap();

        let registry = FlowRegistry::new();
        let restored = registry.load(&path).unwrap();
        assert_eq!(restored.name, "etl");
    }
}
