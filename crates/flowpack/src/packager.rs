//! フローパッケージャ
//!
//! 設定・フローレジストリ・イメージ識別子をまとめ、
//! ステージング → Dockerfile 生成 → pull → build → 検証 → push の
//! パイプラインを1回のビルド呼び出しとして実行します。

use crate::error::Result;
use colored::Colorize;
use flowpack_build::{
    BuildError, DockerfileRenderer, ImageBuilder, ImageIdentity, ImagePuller, ImagePusher,
    PackagingConfig, StagingDir,
};
use flowpack_container::{EnvRunner, connect};
use flowpack_core::{Flow, FlowRegistry};
use std::path::Path;

/// フローを Docker イメージへパッケージングするオーケストレータ
///
/// 複数スレッドからの同時変更は想定しません（単一ライター）。
pub struct FlowPackager {
    config: PackagingConfig,
    registry: FlowRegistry,
    identity: ImageIdentity,
}

impl FlowPackager {
    pub fn new(config: PackagingConfig) -> Self {
        let identity = ImageIdentity::new(config.image_name.clone(), config.image_tag.clone());
        Self {
            config,
            registry: FlowRegistry::new(),
            identity,
        }
    }

    pub fn config(&self) -> &PackagingConfig {
        &self.config
    }

    pub fn identity(&self) -> &ImageIdentity {
        &self.identity
    }

    /// フローを登録し、コンテナ内の配置先パスを返す
    pub fn add_flow(&mut self, flow: &Flow) -> Result<String> {
        Ok(self.registry.add(flow)?)
    }

    /// 名前のフローが登録済みかどうか
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// コンテナ内パスからフローを読み戻す
    ///
    /// コンテナ内のランタイムコンテキストでのみ呼び出される想定です。
    pub fn get_flow(&self, location: impl AsRef<Path>) -> Result<Flow> {
        Ok(self.registry.load(location)?)
    }

    /// 完全修飾イメージ名 `registry/name:tag`
    ///
    /// 名前・タグが未解決の場合は `IncompleteIdentity` です。
    pub fn name(&self) -> Result<String> {
        Ok(self
            .identity
            .qualified(self.config.registry_url.as_deref())?)
    }

    /// イメージをビルドし、要求があればレジストリへプッシュ
    ///
    /// 未設定のイメージ名・タグはここで解決され、以降は変わりません。
    /// ステージングディレクトリは成功・失敗を問わず破棄されます。
    pub async fn build(&mut self, push: bool) -> Result<ImageIdentity> {
        self.identity.resolve(&self.registry);

        let custom_dockerfile = self.config.dockerfile.is_some();
        let staging = StagingDir::create(custom_dockerfile)?;

        let result = self.run_build(&staging, push).await;
        drop(staging);
        result?;

        Ok(self.identity.clone())
    }

    async fn run_build(&self, staging: &StagingDir, push: bool) -> Result<()> {
        // ベースイメージの pull（ローカルイメージ指定時は省略）
        if let Some(base_image) = &self.config.base_image
            && !self.config.local_image
        {
            let docker = connect(&self.config.base_url).await?;
            ImagePuller::new(docker).pull(base_image).await?;
        }

        let dockerfile_path =
            DockerfileRenderer::new(&self.config, &self.registry).render_into(staging)?;

        // レジストリ未設定での push 要求は警告のみで続行（イメージはローカルに残る）
        if push && self.config.registry_url.is_none() {
            tracing::warn!("No registry_url is configured; the image will not be pushed");
            println!(
                "{}",
                "⚠ registry_url が未設定のため、イメージはプッシュされません".yellow()
            );
        }

        let repository = self
            .identity
            .repository(self.config.registry_url.as_deref())?;
        let tag = self
            .identity
            .tag
            .clone()
            .ok_or(BuildError::IncompleteIdentity)?;
        let full_name = format!("{}:{}", repository, tag);

        // カスタム Dockerfile のビルドでは呼び出し側のツリーがコンテキスト
        let context_dir = if self.config.dockerfile.is_some() {
            std::env::current_dir()?
        } else {
            staging.path().to_path_buf()
        };

        println!("{}", "🔨 フローの Docker イメージをビルド中...".green());
        let docker = connect(&self.config.base_url).await?;
        let builder = ImageBuilder::new(docker);
        builder
            .build(&context_dir, &dockerfile_path, &full_name)
            .await?;

        // 成否はエラー行ではなく、最終的なイメージの有無で判定する
        if !builder.image_exists(&repository).await? {
            return Err(BuildError::BuildFailed(
                "the image is missing from the local store; the flow may have failed a \
                 deployment healthcheck - please ensure that all necessary files and \
                 dependencies have been included"
                    .to_string(),
            )
            .into());
        }

        if push && self.config.registry_url.is_some() {
            let docker = connect(&self.config.base_url).await?;
            let pusher = ImagePusher::new(docker);
            pusher.push(&repository, &tag).await?;
            // プッシュ済みイメージはローカルに溜めない（ベストエフォート）
            pusher.remove_local(&repository, &tag).await;
        }

        println!("  {} {}", "✓".green(), full_name.cyan());
        Ok(())
    }

    /// 指定パスのフローをコンテナ内で実行するランナーを返す
    ///
    /// イメージ名・タグが解決済み（ビルド済み）であることが前提です。
    pub fn env_runner(&self, flow_location: impl Into<String>) -> Result<EnvRunner> {
        let image = self.identity.qualified(None)?;
        Ok(EnvRunner::new(
            image,
            flow_location,
            self.config.base_url.clone(),
        ))
    }
}
