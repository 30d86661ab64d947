//! フローモデル
//!
//! パッケージング対象の実行単位。イメージ内には JSON ペイロードとして
//! 書き込まれ、コンテナ内のランタイムが同じ形式を読み戻します。

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// パッケージングされる実行単位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// フロー名（レジストリ内で一意）
    pub name: String,
    /// コンテナ内で実行されるコマンド
    pub entrypoint: Vec<String>,
    /// 任意の説明
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Flow {
    pub fn new(name: impl Into<String>, entrypoint: Vec<String>) -> Self {
        Self {
            name: name.into(),
            entrypoint,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// シリアライズ済みペイロードを生成
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// シリアライズ済みペイロードからフローを復元
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// ファイルパスからフローを読み戻す
    ///
    /// コンテナ内のランタイムコンテキストでのみ呼び出される想定です。
    pub fn load(location: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(location.as_ref())?;
        Self::from_bytes(&bytes)
    }
}
