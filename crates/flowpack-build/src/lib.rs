//! flowpack の Docker イメージビルド機能
//!
//! Dockerfile のテンプレート生成、ステージングディレクトリ管理、
//! イメージビルド、ベースイメージの pull とレジストリへの push を提供します。

pub mod builder;
pub mod config;
pub mod context;
pub mod dockerfile;
pub mod error;
pub mod naming;
pub mod puller;
pub mod pusher;
pub mod staging;

pub use builder::ImageBuilder;
pub use config::{PackagingConfig, PackagingConfigBuilder, default_daemon_url};
pub use context::BuildContext;
pub use dockerfile::{DOCKERFILE_NAME, DockerfileRenderer, HEALTHCHECK_LOCATION};
pub use error::{BuildError, BuildResult};
pub use naming::ImageIdentity;
pub use puller::ImagePuller;
pub use pusher::ImagePusher;
pub use staging::StagingDir;
