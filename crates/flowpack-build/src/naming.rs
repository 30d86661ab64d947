//! イメージ名とタグの解決
//!
//! 未設定の名前・タグをビルド開始時に決定的に補完し、
//! レジストリ込みの完全修飾名を組み立てます。

use crate::error::{BuildError, BuildResult};
use chrono::{SecondsFormat, Utc};
use flowpack_core::{FlowRegistry, slugify};
use uuid::Uuid;

/// ビルド対象イメージの名前とタグ
///
/// どちらもビルド開始まで未設定でよく、`resolve` 後は不変として扱います。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageIdentity {
    pub name: Option<String>,
    pub tag: Option<String>,
}

impl ImageIdentity {
    pub fn new(name: Option<String>, tag: Option<String>) -> Self {
        Self { name, tag }
    }

    /// 未設定の名前・タグを補完
    ///
    /// 名前: 登録フローがちょうど1件ならその名前のスラッグ、
    /// それ以外はランダムなUUID。
    /// タグ: 現在のUTC時刻（ISO-8601）のスラッグ。
    /// 設定済みの値は決して上書きしません（冪等）。
    pub fn resolve(&mut self, registry: &FlowRegistry) {
        if self.name.is_none() {
            let name = if registry.len() == 1 {
                slugify(registry.names()[0])
            } else {
                Uuid::new_v4().to_string()
            };
            self.name = Some(name);
        }

        if self.tag.is_none() {
            let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false);
            self.tag = Some(slugify(&timestamp));
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.name.is_some() && self.tag.is_some()
    }

    /// レジストリ込みのイメージ名（タグなし）
    ///
    /// レジストリ未設定なら名前のみを返します。
    pub fn repository(&self, registry_url: Option<&str>) -> BuildResult<String> {
        let name = self.name.as_deref().ok_or(BuildError::IncompleteIdentity)?;
        Ok(join_registry(registry_url, name))
    }

    /// 完全修飾イメージ名 `registry/name:tag`
    pub fn qualified(&self, registry_url: Option<&str>) -> BuildResult<String> {
        let tag = self.tag.as_deref().ok_or(BuildError::IncompleteIdentity)?;
        Ok(format!("{}:{}", self.repository(registry_url)?, tag))
    }
}

/// レジストリURLとイメージ名をPOSIXパス風に結合
///
/// 空のレジストリはそのまま省かれます。
fn join_registry(registry_url: Option<&str>, name: &str) -> String {
    match registry_url {
        Some(registry) if !registry.is_empty() => {
            format!("{}/{}", registry.trim_end_matches('/'), name)
        }
        _ => name.to_string(),
    }
}
