//! ステージングディレクトリ管理
//!
//! ビルド1回分のビルドコンテキストを一時ディレクトリとして確保します。
//! 成功・失敗を問わず drop 時に必ず削除されます。

use crate::error::{BuildError, BuildResult};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// ビルド1回にスコープされたステージングディレクトリ
///
/// カスタム Dockerfile が指定されたビルドでは、呼び出し側の
/// カレントディレクトリ配下に作られます（ビルドコンテキストが
/// 呼び出し側のツリーになるため）。
#[derive(Debug)]
pub struct StagingDir {
    inner: TempDir,
}

impl StagingDir {
    /// ステージングディレクトリを作成
    ///
    /// `inside_current_dir` が true の場合はカレントディレクトリ配下に
    /// ネストして作成します。
    pub fn create(inside_current_dir: bool) -> BuildResult<Self> {
        let inner = if inside_current_dir {
            tempfile::tempdir_in(".")?
        } else {
            tempfile::tempdir()?
        };
        tracing::debug!("Created staging directory: {}", inner.path().display());
        Ok(Self { inner })
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// ユーザー指定ファイルをステージングディレクトリへコピー
    ///
    /// 同名ファイルが既に存在して内容が異なる場合は `StagingCollision`。
    /// 内容が同一なら上書きコピーします（実質 no-op）。
    pub fn stage_file(&self, source: &Path) -> BuildResult<PathBuf> {
        let file_name = source.file_name().ok_or_else(|| {
            BuildError::InvalidConfig(format!(
                "File source has no file name: {}",
                source.display()
            ))
        })?;
        let dest = self.path().join(file_name);

        if dest.exists() {
            let existing = fs::read(&dest)?;
            let incoming = fs::read(source)?;
            if existing != incoming {
                return Err(BuildError::StagingCollision {
                    file: file_name.to_string_lossy().into_owned(),
                    directory: self.path().to_path_buf(),
                });
            }
        }

        fs::copy(source, &dest)?;
        Ok(dest)
    }

    /// シリアライズ済みペイロードやスクリプトを書き込む
    pub fn write_blob(&self, file_name: &str, bytes: &[u8]) -> BuildResult<PathBuf> {
        let dest = self.path().join(file_name);
        fs::write(&dest, bytes)?;
        Ok(dest)
    }
}
