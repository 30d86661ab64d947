//! Docker デーモンへの接続
//!
//! 操作ごとに新しいクライアントを開きます。接続は使い回しません。

use crate::error::{ContainerError, Result};
use bollard::{API_DEFAULT_VERSION, Docker};

/// デーモン接続のタイムアウト（秒）
const CONNECT_TIMEOUT_SECS: u64 = 120;

/// デーモンURLに応じたクライアントを構築
fn client_for(base_url: &str) -> std::result::Result<Docker, bollard::errors::Error> {
    if base_url.starts_with("unix://") {
        return Docker::connect_with_unix(base_url, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION);
    }

    #[cfg(windows)]
    if base_url.starts_with("npipe://") {
        return Docker::connect_with_named_pipe(
            base_url,
            CONNECT_TIMEOUT_SECS,
            API_DEFAULT_VERSION,
        );
    }

    Docker::connect_with_http(base_url, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)
}

/// Docker接続を初期化
///
/// APIバージョンを自動ネゴシエーションし、接続テストとして ping を送ります。
pub async fn connect(base_url: &str) -> Result<Docker> {
    let docker =
        client_for(base_url).map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))?;

    let docker = docker
        .negotiate_version()
        .await
        .map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))?;

    // 接続テスト
    docker
        .ping()
        .await
        .map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))?;

    Ok(docker)
}
