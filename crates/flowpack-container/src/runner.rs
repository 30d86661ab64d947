//! 実行側ヘルパー
//!
//! ビルド済みイメージからコンテナを起動し、環境変数を与えて
//! パッケージ済みフローを実行します。

use crate::docker::connect;
use crate::error::{ContainerError, Result};
use bollard::Docker;
use bollard::container::{Config, CreateContainerOptions, StartContainerOptions};
use std::collections::BTreeMap;

/// コンテナを起動し続けるためのキープアライブコマンド
const KEEPALIVE_COMMAND: [&str; 3] = ["tail", "-f", "/dev/null"];

/// ビルド済みイメージ内でフローを実行するランナー
///
/// `run` は create → start → exec → stop のライフサイクルを持ち、
/// exec の成否に関わらずコンテナは必ず停止されます。
#[derive(Debug, Clone)]
pub struct EnvRunner {
    image: String,
    flow_location: String,
    base_url: String,
}

impl EnvRunner {
    /// # Arguments
    /// * `image` - ビルド済みイメージの `name:tag`
    /// * `flow_location` - コンテナ内のフローペイロードのパス
    /// * `base_url` - Docker デーモンの接続URL
    pub fn new(
        image: impl Into<String>,
        flow_location: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            image: image.into(),
            flow_location: flow_location.into(),
            base_url: base_url.into(),
        }
    }

    /// 環境変数を与えてフローを実行
    ///
    /// 標準出力・標準エラーは行単位でコンソールへ流します。
    pub async fn run(&self, env: &BTreeMap<String, String>) -> Result<()> {
        let docker = connect(&self.base_url).await?;

        let config = Config {
            image: Some(self.image.clone()),
            cmd: Some(KEEPALIVE_COMMAND.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        };

        let container = docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await
            .map_err(|e| match e {
                bollard::errors::Error::DockerResponseServerError {
                    status_code: 404, ..
                } => ContainerError::ImageNotFound {
                    image: self.image.clone(),
                },
                other => ContainerError::from(other),
            })?;

        docker
            .start_container(&container.id, None::<StartContainerOptions<String>>)
            .await?;

        let result = self.exec_flow(&docker, &container.id, env).await;

        // 実行の成否に関わらずコンテナは必ず停止する
        if let Err(e) = docker
            .stop_container(
                &container.id,
                None::<bollard::query_parameters::StopContainerOptions>,
            )
            .await
        {
            tracing::warn!("Failed to stop container {}: {}", container.id, e);
        }

        result
    }

    async fn exec_flow(
        &self,
        docker: &Docker,
        container_id: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<()> {
        use bollard::container::LogOutput;
        use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
        use futures_util::stream::StreamExt;

        let exec_config = CreateExecOptions {
            cmd: Some(vec![
                "python".to_string(),
                "-c".to_string(),
                run_script(&self.flow_location),
            ]),
            env: Some(env_pairs(env)),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let message = docker.create_exec(container_id, exec_config).await?;

        match docker
            .start_exec(&message.id, Some(StartExecOptions::default()))
            .await?
        {
            StartExecResults::Attached { mut output, .. } => {
                while let Some(msg) = output.next().await {
                    match msg {
                        Ok(LogOutput::StdOut { message })
                        | Ok(LogOutput::Console { message }) => {
                            let text = String::from_utf8_lossy(&message);
                            for line in text.split('\n').filter(|line| !line.is_empty()) {
                                println!("{}", line);
                            }
                        }
                        Ok(LogOutput::StdErr { message }) => {
                            let text = String::from_utf8_lossy(&message);
                            for line in text.split('\n').filter(|line| !line.is_empty()) {
                                eprintln!("{}", line);
                            }
                        }
                        Ok(LogOutput::StdIn { .. }) => {}
                        Err(e) => {
                            return Err(ContainerError::ExecFailed {
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }
            StartExecResults::Detached => {}
        }

        Ok(())
    }
}

/// コンテナ内でフローを読み戻して実行するスクリプト
fn run_script(flow_location: &str) -> String {
    format!(
        "import json, subprocess, sys; payload = open('{}'); flow = json.load(payload); payload.close(); sys.exit(subprocess.call(flow['entrypoint']))",
        flow_location
    )
}

/// 環境変数マップを `KEY=value` の列に変換
fn env_pairs(env: &BTreeMap<String, String>) -> Vec<String> {
    env.iter().map(|(k, v)| format!("{}={}", k, v)).collect()
}
