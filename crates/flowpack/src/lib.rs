//! flowpack
//!
//! フロー（実行単位）を Docker イメージへパッケージングし、
//! 任意でレジストリへプッシュし、コンテナ内で実行するためのクレートです。
//!
//! ```no_run
//! use flowpack::{Flow, FlowPackager, PackagingConfig};
//!
//! # async fn example() -> flowpack::Result<()> {
//! let config = PackagingConfig::builder()
//!     .base_image("python:3.11-slim")
//!     .python_dependency("pandas")
//!     .build()?;
//!
//! let mut packager = FlowPackager::new(config);
//! packager.add_flow(&Flow::new("My Flow!", vec!["python".into(), "run.py".into()]))?;
//!
//! let identity = packager.build(false).await?;
//! println!("built {:?}", identity);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod packager;

pub use error::{PackagerError, Result};
pub use packager::FlowPackager;

pub use flowpack_build::{
    BuildError, ImageIdentity, PackagingConfig, PackagingConfigBuilder, default_daemon_url,
};
pub use flowpack_container::{ContainerError, EnvRunner};
pub use flowpack_core::{Flow, FlowError, FlowRegistry, slugify};
