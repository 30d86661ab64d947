//! イメージプッシュ処理
//!
//! ビルドしたイメージをコンテナレジストリにプッシュします。
//! 認証はデーモン側の設定に委ねます。

use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use bollard::models::PushImageInfo;
use colored::Colorize;
use futures_util::StreamExt;
use std::io::Write;

/// イメージプッシュを実行するハンドラ
pub struct ImagePusher {
    docker: Docker,
}

impl ImagePusher {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージをレジストリにプッシュ
    ///
    /// # Arguments
    /// * `image` - イメージ名（レジストリ込み、タグなし）
    /// * `tag` - イメージタグ
    ///
    /// `error` フィールドを持つ行を受け取った時点で即座に失敗し、
    /// 以降の行は読みません。
    pub async fn push(&self, image: &str, tag: &str) -> BuildResult<String> {
        self.validate_tag(tag)?;

        let full_image = format!("{}:{}", image, tag);
        tracing::info!("Pushing image to the registry: {}", full_image);
        println!("  → {}", full_image.cyan());

        #[allow(deprecated)]
        let options = bollard::image::PushImageOptions::<String> {
            tag: tag.to_string(),
        };

        #[allow(deprecated)]
        let mut stream = self.docker.push_image(image, Some(options), None);

        let mut last_status = String::new();

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(error) = info.error {
                        return Err(BuildError::PushFailed { message: error });
                    }
                    self.handle_progress(&info, &mut last_status);
                }
                Err(e) => {
                    return Err(BuildError::PushFailed {
                        message: e.to_string(),
                    });
                }
            }
        }

        // 最終行の改行
        println!();

        Ok(full_image)
    }

    /// プッシュ済みイメージをローカルストアから削除（ベストエフォート）
    ///
    /// 削除の失敗はビルドの失敗として扱いません。
    pub async fn remove_local(&self, image: &str, tag: &str) {
        let full_image = format!("{}:{}", image, tag);

        #[allow(deprecated)]
        let options = bollard::image::RemoveImageOptions {
            force: true,
            ..Default::default()
        };

        if let Err(e) = self.docker.remove_image(&full_image, Some(options), None).await {
            tracing::warn!("Failed to remove local image {}: {}", full_image, e);
        } else {
            tracing::debug!("Removed local image {}", full_image);
        }
    }

    /// タグのバリデーション
    fn validate_tag(&self, tag: &str) -> BuildResult<()> {
        // Docker タグの制約:
        // - 128文字以下
        // - 英数字、ピリオド、ハイフン、アンダースコアのみ
        // - 先頭はピリオドまたはハイフンではない

        if tag.is_empty() {
            return Err(BuildError::InvalidTag {
                tag: "(empty)".to_string(),
            });
        }

        if tag.len() > 128 {
            return Err(BuildError::InvalidTag {
                tag: format!("Tag too long ({} characters, max 128)", tag.len()),
            });
        }

        if tag.starts_with('.') || tag.starts_with('-') {
            return Err(BuildError::InvalidTag {
                tag: tag.to_string(),
            });
        }

        for c in tag.chars() {
            if !c.is_ascii_alphanumeric() && c != '.' && c != '-' && c != '_' {
                return Err(BuildError::InvalidTag {
                    tag: format!("Invalid character '{}' in tag: {}", c, tag),
                });
            }
        }

        Ok(())
    }

    /// プッシュ進捗を表示
    fn handle_progress(&self, info: &PushImageInfo, last_status: &mut String) {
        if let Some(status) = &info.status {
            let progress = info.progress.as_deref().unwrap_or("");

            match status.as_str() {
                "Pushing" => {
                    print!("\r  ↑ {} {}     ", status, progress);
                    std::io::stdout().flush().ok();
                }
                "Pushed" => {
                    println!("\r  {} Pushed                    ", "✓".green());
                }
                "Layer already exists" => {
                    println!("\r  {} Layer already exists      ", "✓".green());
                }
                "Preparing" | "Waiting" => {
                    // 準備中は表示をスキップ（ノイズ軽減）
                }
                _ => {
                    if status != last_status {
                        println!("\r  ℹ {}                    ", status);
                        *last_status = status.clone();
                    }
                }
            }
        }
    }
}
