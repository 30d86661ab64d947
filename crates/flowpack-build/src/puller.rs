//! ベースイメージの pull 処理
//!
//! ビルドに先立ちベースイメージをレジストリから取得します。

use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use colored::Colorize;
use futures_util::StreamExt;
use std::io::Write;

/// イメージ pull を実行するハンドラ
pub struct ImagePuller {
    docker: Docker,
}

impl ImagePuller {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// ベースイメージを pull
    ///
    /// `error` フィールドを持つ行を受け取った時点で即座に失敗し、
    /// 以降の行は読みません。`progress` を持つ行は進捗として表示します。
    pub async fn pull(&self, image: &str) -> BuildResult<()> {
        tracing::info!("Pulling base image: {}", image);
        println!("  → {}", image.cyan());

        #[allow(deprecated)]
        let options = bollard::image::CreateImageOptions::<String> {
            from_image: image.to_string(),
            ..Default::default()
        };

        #[allow(deprecated)]
        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(error) = info.error {
                        return Err(BuildError::PullFailed { message: error });
                    }
                    if let Some(progress) = info.progress {
                        let status = info.status.as_deref().unwrap_or("");
                        print!("\r  ↓ {} {}     ", status, progress);
                        std::io::stdout().flush().ok();
                    }
                }
                Err(e) => {
                    return Err(BuildError::PullFailed {
                        message: e.to_string(),
                    });
                }
            }
        }

        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Docker接続が必要なため、通常のテストではスキップ
    async fn test_pull_alpine() {
        let docker = Docker::connect_with_local_defaults().unwrap();
        let puller = ImagePuller::new(docker);
        puller.pull("alpine:latest").await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Docker接続が必要なため、通常のテストではスキップ
    async fn test_pull_unknown_image_fails() {
        let docker = Docker::connect_with_local_defaults().unwrap();
        let puller = ImagePuller::new(docker);

        let err = puller
            .pull("flowpack/does-not-exist:never")
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::PullFailed { .. }));
    }
}
