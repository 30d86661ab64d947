//! flowpack のコアモデル
//!
//! フロー（パッケージング対象の実行単位）のモデルと、
//! ビルドまでフローを保持するレジストリを提供します。

pub mod error;
pub mod flow;
pub mod registry;
pub mod slug;

pub use error::{FlowError, Result};
pub use flow::Flow;
pub use registry::{FLOW_DIR, FLOW_EXTENSION, FlowRegistry};
pub use slug::slugify;
