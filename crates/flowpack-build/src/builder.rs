//! イメージビルドドライバ
//!
//! ステージング済みコンテキストをデーモンのビルドAPIへ送り、
//! 構造化されたビルド出力をストリームとして消費します。

use crate::context::BuildContext;
use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use bollard::image::BuildImageOptions;
use colored::Colorize;
use futures_util::stream::StreamExt;
use std::collections::HashMap;
use std::path::Path;

pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージをビルド
    ///
    /// ビルド出力の各行は `stream`（情報行、そのまま表示）か
    /// `errorDetail`（エラー行、ログに出すのみ）として処理します。
    /// エラー行でストリームを中断せず、成否は呼び出し側が
    /// `image_exists` で最終的なイメージの有無から判定します。
    pub async fn build(
        &self,
        context_dir: &Path,
        dockerfile_path: &Path,
        tag: &str,
    ) -> BuildResult<()> {
        tracing::info!("Building image: {}", tag);

        let dockerfile = dockerfile_path
            .strip_prefix(context_dir)
            .unwrap_or(dockerfile_path)
            .to_string_lossy()
            .into_owned();

        let options = BuildImageOptions {
            dockerfile,
            t: tag.to_string(),
            rm: true,      // 中間コンテナを削除
            forcerm: true, // ビルド失敗時も中間コンテナを削除
            ..Default::default()
        };

        let context_data = BuildContext::create(context_dir)?;

        use bytes::Bytes;
        use http_body_util::{Either, Full};
        let body = Full::new(Bytes::from(context_data));
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        while let Some(msg) = stream.next().await {
            match msg {
                Ok(output) => self.handle_build_output(output),
                Err(e) => return Err(BuildError::DockerConnection(e)),
            }
        }

        Ok(())
    }

    /// ビルド出力の処理
    fn handle_build_output(&self, output: bollard::models::BuildInfo) {
        if let Some(stream) = output.stream
            && stream != "\n"
        {
            print!("{}", stream);
        }

        if let Some(error) = output.error {
            tracing::error!("Build error: {}", error);
            eprintln!("{}", error.red());
        }

        if let Some(error_detail) = output.error_detail
            && let Some(message) = error_detail.message
        {
            tracing::error!("Build error detail: {}", message);
            eprintln!("{}", message.red());
        }

        if let Some(status) = output.status {
            println!("{}", status.cyan());
        }
    }

    /// 完全修飾名に一致するイメージがローカルストアに存在するか
    pub async fn image_exists(&self, reference: &str) -> BuildResult<bool> {
        let mut filters = HashMap::new();
        filters.insert("reference".to_string(), vec![reference.to_string()]);

        let options = bollard::image::ListImagesOptions::<String> {
            filters,
            ..Default::default()
        };
        let images = self.docker.list_images(Some(options)).await?;
        Ok(!images.is_empty())
    }
}
