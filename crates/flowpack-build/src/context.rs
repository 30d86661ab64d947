//! ビルドコンテキストのアーカイブ化
//!
//! ステージングディレクトリ（または呼び出し側のツリー）を
//! Docker デーモンへ送る tar.gz アーカイブに変換します。

use crate::error::{BuildError, BuildResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::Path;
use tar::Builder;

pub struct BuildContext;

impl BuildContext {
    /// ビルドコンテキストをtar.gzアーカイブとして作成
    ///
    /// レンダリング済みの Dockerfile はコンテキストツリー内に
    /// 既に含まれている前提です。
    pub fn create(context_path: &Path) -> BuildResult<Vec<u8>> {
        tracing::debug!("Creating build context from: {}", context_path.display());

        let mut archive_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive_data, Compression::default());
            let mut tar = Builder::new(encoder);

            tar.append_dir_all(".", context_path)
                .map_err(BuildError::Io)?;
            tar.finish().map_err(BuildError::Io)?;
        }

        tracing::debug!("Build context created: {} bytes", archive_data.len());
        Self::check_context_size(archive_data.len());

        Ok(archive_data)
    }

    /// コンテキストサイズのチェックと警告
    fn check_context_size(size: usize) {
        const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024; // 500MB

        if size > MAX_CONTEXT_SIZE {
            tracing::warn!(
                "警告: ビルドコンテキストが大きすぎます（{}MB）\n\
                 カスタム Dockerfile を使う場合は不要なファイルを含まない\n\
                 ディレクトリでビルドすることを推奨します。",
                size / 1024 / 1024
            );
        }
    }
}
