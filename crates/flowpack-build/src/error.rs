use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Dockerfile not found: {0}")]
    DockerfileNotFound(PathBuf),

    #[error("Invalid build configuration: {0}")]
    InvalidConfig(String),

    #[error("File {file} already exists in {directory} with different contents")]
    StagingCollision { file: String, directory: PathBuf },

    #[error("Image name and tag have not been resolved")]
    IncompleteIdentity,

    #[error("Pull failed: {message}")]
    PullFailed { message: String },

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Invalid image tag: {tag}")]
    InvalidTag { tag: String },

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Docker connection error: {0}")]
    DockerConnection(#[from] bollard::errors::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Flow error: {0}")]
    Flow(#[from] flowpack_core::FlowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::DockerfileNotFound(path) => {
                format!(
                    "Dockerfileが見つかりません: {}\n\
                     \n\
                     解決方法:\n\
                     1. Dockerfileのパスを確認してください\n\
                     2. パスはビルドを実行するディレクトリからの相対パスです",
                    path.display()
                )
            }
            BuildError::BuildFailed(msg) => {
                format!(
                    "ビルドに失敗しました: {}\n\
                     \n\
                     必要なファイルと依存関係がすべて含まれているか確認してください。",
                    msg
                )
            }
            BuildError::StagingCollision { file, directory } => {
                format!(
                    "ファイル {} は {} に別の内容で既に存在します\n\
                     \n\
                     files に指定したコピー元のファイル名が重複していないか確認してください。",
                    file,
                    directory.display()
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;

pub type Result<T> = BuildResult<T>;
