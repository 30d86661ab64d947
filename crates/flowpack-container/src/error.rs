use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(
        "Dockerに接続できません: {0}\n\nヒント:\n  • Dockerが起動しているか確認してください\n  • デーモンURL（unix:// または tcp://）が正しいか確認してください"
    )]
    DockerConnectionFailed(String),

    #[error(
        "イメージ '{image}' が見つかりません\n\nヒント:\n  • 先に build() でイメージを作成してください\n  • イメージ名とタグを確認してください"
    )]
    ImageNotFound { image: String },

    #[error("コンテナ内でのフロー実行に失敗しました: {message}")]
    ExecFailed { message: String },

    #[error("Docker APIエラー: {0}")]
    DockerApiError(String),
}

impl From<bollard::errors::Error> for ContainerError {
    fn from(err: bollard::errors::Error) -> Self {
        let err_str = err.to_string();
        if err_str.contains("Connection refused") || err_str.contains("No such file or directory")
        {
            ContainerError::DockerConnectionFailed(err_str)
        } else {
            ContainerError::DockerApiError(err_str)
        }
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;
