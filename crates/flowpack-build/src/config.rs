//! パッケージング設定
//!
//! ビルド対象イメージの構成をビルダーで組み立て、
//! 検証済みの不変な `PackagingConfig` を生成します。

use crate::error::{BuildError, BuildResult};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// コンテナ内の設定ファイルパスを指す予約済み環境変数
pub const CONFIG_PATH_ENV: &str = "FLOWPACK__USER_CONFIG_PATH";

/// 予約済み環境変数のデフォルト値
pub const DEFAULT_CONFIG_PATH: &str = "/root/.flowpack/config.toml";

/// デフォルトの対象インタプリタバージョン（major.minor）
pub const DEFAULT_PYTHON_VERSION: &str = "3.11";

/// 最小ベースイメージに必要なOSパッケージのブートストラップ
const BOOTSTRAP_COMMAND: &str =
    "apt update && apt install -y gcc git && rm -rf /var/lib/apt/lists/*";

/// プラットフォーム識別子からデフォルトのデーモンURLを選択
///
/// 構築時に一度だけ呼ばれる明示的なデフォルト解決ステップです。
pub fn default_daemon_url(platform: &str) -> &'static str {
    if platform == "windows" {
        "npipe:////./pipe/docker_engine"
    } else {
        "unix:///var/run/docker.sock"
    }
}

/// 検証済みのパッケージング設定
///
/// `PackagingConfigBuilder` からのみ生成されます。ビルド開始後は変更されません。
#[derive(Debug, Clone)]
pub struct PackagingConfig {
    /// push 先のレジストリURL。未設定ならイメージはローカルに残る
    pub registry_url: Option<String>,
    /// ベースイメージ。`dockerfile` とは排他
    pub base_image: Option<String>,
    /// 呼び出し側が用意した Dockerfile。設定時はカレントディレクトリが
    /// ビルドコンテキストになる
    pub dockerfile: Option<PathBuf>,
    /// pip 形式の依存リスト（末尾に wheel が常に付く）
    pub python_dependencies: Vec<String>,
    /// イメージに焼き込む環境変数
    pub env_vars: BTreeMap<String, String>,
    /// 絶対パスのコピー元 -> イメージ内コピー先
    pub files: BTreeMap<PathBuf, String>,
    /// Docker デーモンの接続URL
    pub base_url: String,
    /// イメージに入れる flowpack のバージョン
    pub flowpack_version: String,
    /// 対象インタプリタの major.minor
    pub python_version: String,
    /// true なら ベースイメージの pull を省略
    pub local_image: bool,
    /// 依存インストール前に実行する追加シェルコマンド
    pub extra_commands: Vec<String>,
    /// 初期イメージ名（未設定ならビルド時に解決）
    pub image_name: Option<String>,
    /// 初期イメージタグ（未設定ならビルド時に解決）
    pub image_tag: Option<String>,
}

impl PackagingConfig {
    pub fn builder() -> PackagingConfigBuilder {
        PackagingConfigBuilder::default()
    }
}

/// `PackagingConfig` のビルダー
///
/// 可変なリスト・マップはここでだけ組み立て、`build()` で検証と
/// デフォルト補完を行った不変値を返します。
#[derive(Debug, Default)]
pub struct PackagingConfigBuilder {
    registry_url: Option<String>,
    base_image: Option<String>,
    dockerfile: Option<PathBuf>,
    python_dependencies: Vec<String>,
    env_vars: BTreeMap<String, String>,
    files: BTreeMap<PathBuf, String>,
    base_url: Option<String>,
    flowpack_version: Option<String>,
    python_version: Option<String>,
    local_image: bool,
    extra_commands: Vec<String>,
    image_name: Option<String>,
    image_tag: Option<String>,
}

impl PackagingConfigBuilder {
    pub fn registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = Some(url.into());
        self
    }

    pub fn base_image(mut self, image: impl Into<String>) -> Self {
        self.base_image = Some(image.into());
        self
    }

    pub fn dockerfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.dockerfile = Some(path.into());
        self
    }

    pub fn python_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.python_dependencies.push(dependency.into());
        self
    }

    pub fn python_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.python_dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn file(mut self, source: impl Into<PathBuf>, dest: impl Into<String>) -> Self {
        self.files.insert(source.into(), dest.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn flowpack_version(mut self, version: impl Into<String>) -> Self {
        self.flowpack_version = Some(version.into());
        self
    }

    pub fn python_version(mut self, version: impl Into<String>) -> Self {
        self.python_version = Some(version.into());
        self
    }

    pub fn local_image(mut self, local_image: bool) -> Self {
        self.local_image = local_image;
        self
    }

    pub fn extra_command(mut self, command: impl Into<String>) -> Self {
        self.extra_commands.push(command.into());
        self
    }

    pub fn image_name(mut self, name: impl Into<String>) -> Self {
        self.image_name = Some(name.into());
        self
    }

    pub fn image_tag(mut self, tag: impl Into<String>) -> Self {
        self.image_tag = Some(tag.into());
        self
    }

    /// 検証とデフォルト補完を行い、不変な設定を生成
    pub fn build(self) -> BuildResult<PackagingConfig> {
        if self.base_image.is_some() && self.dockerfile.is_some() {
            return Err(BuildError::InvalidConfig(
                "Only one of `base_image` and `dockerfile` can be provided".to_string(),
            ));
        }

        let not_absolute: Vec<String> = self
            .files
            .keys()
            .filter(|path| !path.is_absolute())
            .map(|path| path.display().to_string())
            .collect();
        if !not_absolute.is_empty() {
            return Err(BuildError::InvalidConfig(format!(
                "Provided paths {} are not absolute file paths, please provide absolute paths only",
                not_absolute.join(", ")
            )));
        }

        let flowpack_version = self
            .flowpack_version
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
        let python_version = self
            .python_version
            .unwrap_or_else(|| DEFAULT_PYTHON_VERSION.to_string());

        let mut extra_commands = self.extra_commands;
        let base_image = match (&self.base_image, &self.dockerfile) {
            (None, None) => {
                // リリース版は公式イメージ、それ以外は slim から直接組み立てる
                if is_release_version(&flowpack_version) {
                    Some(format!(
                        "flowpack/flowpack:{}-python{}",
                        flowpack_version, python_version
                    ))
                } else {
                    extra_commands.insert(0, BOOTSTRAP_COMMAND.to_string());
                    Some(format!("python:{}-slim", python_version))
                }
            }
            _ => self.base_image,
        };

        // flowpack 自体はイメージビルド時に未導入の場合のみ入れる
        extra_commands.push(format!(
            "pip show flowpack || pip install git+https://github.com/chronista-club/flowpack.git@{}#egg=flowpack",
            flowpack_version
        ));

        let mut python_dependencies = self.python_dependencies;
        python_dependencies.push("wheel".to_string());

        let mut env_vars = self.env_vars;
        env_vars
            .entry(CONFIG_PATH_ENV.to_string())
            .or_insert_with(|| DEFAULT_CONFIG_PATH.to_string());

        let base_url = self
            .base_url
            .unwrap_or_else(|| default_daemon_url(std::env::consts::OS).to_string());

        Ok(PackagingConfig {
            registry_url: self.registry_url,
            base_image,
            dockerfile: self.dockerfile,
            python_dependencies,
            env_vars,
            files: self.files,
            base_url,
            flowpack_version,
            python_version,
            local_image: self.local_image,
            extra_commands,
            image_name: self.image_name,
            image_tag: self.image_tag,
        })
    }
}

/// `x.y.z` 形式のリリースバージョンかどうか
fn is_release_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
