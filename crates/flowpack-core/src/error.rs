use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("名前が衝突しています: フロー '{name}' は既に登録されています")]
    NameConflict { name: String },

    #[error("フローのシリアライズエラー: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;
