//! Dockerfile のテンプレート生成
//!
//! 設定とフローレジストリから Dockerfile を組み立て、
//! 必要な成果物（フローペイロード・ヘルスチェックスクリプト・
//! ユーザーファイル）をステージングディレクトリへ配置します。

use crate::config::PackagingConfig;
use crate::error::{BuildError, BuildResult};
use crate::staging::StagingDir;
use flowpack_core::{FLOW_EXTENSION, FlowRegistry, slugify};
use std::fs;
use std::path::PathBuf;
use tera::{Context, Tera};

/// イメージ内の flowpack ホームディレクトリ
pub const FLOWPACK_HOME: &str = "/root/.flowpack";

/// イメージ内のヘルスチェックスクリプトの配置先
pub const HEALTHCHECK_LOCATION: &str = "/root/.flowpack/healthcheck.py";

/// ステージングディレクトリ内の Dockerfile の固定ファイル名
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// イメージビルド時にフローの読み込み可否を検証するスクリプト
const HEALTHCHECK_SCRIPT: &str = include_str!("healthcheck.py");

const DOCKERFILE_TEMPLATE: &str = r#"{{ base_commands }}

RUN pip install pip --upgrade
{{ extra_commands }}
{{ pip_installs }}

RUN mkdir -p /root/.flowpack/
{{ copy_flows }}
COPY {{ healthcheck_source }} /root/.flowpack/healthcheck.py
{{ copy_files }}

{{ env_vars }}

RUN python /root/.flowpack/healthcheck.py '{{ flow_file_paths }}' '{{ python_version }}'
"#;

/// Dockerfile を生成するレンダラ
pub struct DockerfileRenderer<'a> {
    config: &'a PackagingConfig,
    registry: &'a FlowRegistry,
}

impl<'a> DockerfileRenderer<'a> {
    pub fn new(config: &'a PackagingConfig, registry: &'a FlowRegistry) -> Self {
        Self { config, registry }
    }

    /// Dockerfile と成果物をステージングディレクトリへ書き出す
    ///
    /// 生成された Dockerfile の絶対パスを返します。
    pub fn render_into(&self, staging: &StagingDir) -> BuildResult<PathBuf> {
        // カスタム Dockerfile のビルドでは呼び出し側のカレントディレクトリが
        // コンテキストになるため、COPY 元はステージング先の絶対パスになる
        let custom_dockerfile = self.config.dockerfile.is_some();

        let base_commands = self.base_commands()?;
        let extra_commands = self
            .config
            .extra_commands
            .iter()
            .map(|cmd| format!("RUN {}", cmd))
            .collect::<Vec<_>>()
            .join("\n");
        let pip_installs = format!(
            "RUN pip install {}",
            self.config.python_dependencies.join(" ")
        );

        let mut copy_flows = Vec::new();
        for (name, flow) in self.registry.flows() {
            let blob_name = format!("{}.{}", slugify(name), FLOW_EXTENSION);
            let blob_path = staging.write_blob(&blob_name, &flow.to_bytes()?)?;
            let source = if custom_dockerfile {
                absolute_display(&blob_path)?
            } else {
                blob_name
            };
            let location = &self.registry.locations()[name];
            copy_flows.push(format!("COPY {} {}", source, location));
        }

        let healthcheck_path = staging.write_blob("healthcheck.py", HEALTHCHECK_SCRIPT.as_bytes())?;
        let healthcheck_source = if custom_dockerfile {
            absolute_display(&healthcheck_path)?
        } else {
            "healthcheck.py".to_string()
        };

        let mut copy_files = Vec::new();
        for (source, dest) in &self.config.files {
            let staged = staging.stage_file(source)?;
            let copy_source = if custom_dockerfile {
                absolute_display(&staged)?
            } else {
                staged
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            };
            copy_files.push(format!("COPY {} {}", copy_source, dest));
        }

        let env_vars = if self.config.env_vars.is_empty() {
            String::new()
        } else {
            format!(
                "ENV {}",
                self.config
                    .env_vars
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(" \\\n")
            )
        };

        let flow_locations: Vec<&String> = self.registry.locations().values().collect();
        let flow_file_paths = serde_json::to_string(&flow_locations)
            .map_err(flowpack_core::FlowError::Serialization)?;

        let mut context = Context::new();
        context.insert("base_commands", &base_commands);
        context.insert("extra_commands", &extra_commands);
        context.insert("pip_installs", &pip_installs);
        context.insert("copy_flows", &copy_flows.join("\n"));
        context.insert("healthcheck_source", &healthcheck_source);
        context.insert("copy_files", &copy_files.join("\n"));
        context.insert("env_vars", &env_vars);
        context.insert("flow_file_paths", &flow_file_paths);
        context.insert("python_version", &major_minor(&self.config.python_version));

        let rendered = Tera::one_off(DOCKERFILE_TEMPLATE, &context, false)?;

        // テンプレート展開で紛れ込むインデントに備え、各行の先頭空白を落とす
        let mut contents = rendered
            .lines()
            .map(str::trim_start)
            .collect::<Vec<_>>()
            .join("\n");
        contents.push('\n');

        let dockerfile_path = staging.path().join(DOCKERFILE_NAME);
        fs::write(&dockerfile_path, contents)?;
        tracing::debug!("Rendered Dockerfile at {}", dockerfile_path.display());

        Ok(fs::canonicalize(&dockerfile_path)?)
    }

    /// FROM 行、またはカスタム Dockerfile の埋め込みブロック
    fn base_commands(&self) -> BuildResult<String> {
        if let Some(dockerfile) = &self.config.dockerfile {
            if !dockerfile.exists() {
                return Err(BuildError::DockerfileNotFound(dockerfile.clone()));
            }
            let contents = fs::read_to_string(dockerfile)?;
            // 埋め込み用に再インデント（最終出力では行頭空白ごと落ちる）
            let indented: String = contents
                .lines()
                .map(|line| format!("{:16}{}", "", line))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(format!("\n{}", indented))
        } else {
            let base_image = self.config.base_image.as_deref().ok_or_else(|| {
                BuildError::InvalidConfig(
                    "Neither `base_image` nor `dockerfile` is set".to_string(),
                )
            })?;
            Ok(format!("FROM {}", base_image))
        }
    }
}

fn absolute_display(path: &std::path::Path) -> BuildResult<String> {
    Ok(fs::canonicalize(path)?.display().to_string())
}

/// バージョン文字列を major.minor へ正規化
fn major_minor(version: &str) -> String {
    version.split('.').take(2).collect::<Vec<_>>().join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackagingConfig;
    use flowpack_core::Flow;

    fn registry_with_flow(name: &str) -> FlowRegistry {
        let mut registry = FlowRegistry::new();
        registry
            .add(&Flow::new(name, vec!["python".into(), "run.py".into()]))
            .unwrap();
        registry
    }

    fn render(config: &PackagingConfig, registry: &FlowRegistry) -> (StagingDir, String) {
        let staging = StagingDir::create(false).unwrap();
        let path = DockerfileRenderer::new(config, registry)
            .render_into(&staging)
            .unwrap();
        let contents = fs::read_to_string(path).unwrap();
        (staging, contents)
    }

    #[test]
    fn test_render_default_build() {
        let config = PackagingConfig::builder()
            .base_image("python:3.11-slim")
            .python_dependency("pandas")
            .build()
            .unwrap();
        let registry = registry_with_flow("My Flow!");

        let (staging, contents) = render(&config, &registry);

        assert!(contents.starts_with("FROM python:3.11-slim\n"));
        assert!(contents.contains("RUN pip install pip --upgrade\n"));
        assert!(contents.contains("RUN pip install pandas wheel\n"));
        assert!(contents.contains("RUN mkdir -p /root/.flowpack/\n"));
        assert!(contents.contains("COPY my-flow.flow /root/.flowpack/flows/my-flow.flow\n"));
        assert!(contents.contains("COPY healthcheck.py /root/.flowpack/healthcheck.py\n"));
        assert!(contents.contains(
            "RUN python /root/.flowpack/healthcheck.py '[\"/root/.flowpack/flows/my-flow.flow\"]' '3.11'"
        ));

        // ペイロードとスクリプトがステージングされている
        assert!(staging.path().join("my-flow.flow").exists());
        assert!(staging.path().join("healthcheck.py").exists());
        assert!(staging.path().join(DOCKERFILE_NAME).exists());
    }

    #[test]
    fn test_render_strips_leading_whitespace() {
        let config = PackagingConfig::builder()
            .base_image("python:3.11-slim")
            .build()
            .unwrap();
        let registry = registry_with_flow("etl");

        let (_staging, contents) = render(&config, &registry);
        for line in contents.lines() {
            assert_eq!(line, line.trim_start());
        }
    }

    #[test]
    fn test_render_env_block() {
        let config = PackagingConfig::builder()
            .base_image("python:3.11-slim")
            .env_var("A_FIRST", "1")
            .env_var("B_SECOND", "2")
            .build()
            .unwrap();
        let registry = registry_with_flow("etl");

        let (_staging, contents) = render(&config, &registry);
        assert!(contents.contains("ENV A_FIRST=1 \\\nB_SECOND=2 \\\n"));
        assert!(contents.contains(&format!(
            "{}={}",
            crate::config::CONFIG_PATH_ENV,
            crate::config::DEFAULT_CONFIG_PATH
        )));
    }

    #[test]
    fn test_render_extra_commands_before_dependency_install() {
        let config = PackagingConfig::builder()
            .base_image("python:3.11-slim")
            .extra_command("echo ready")
            .build()
            .unwrap();
        let registry = registry_with_flow("etl");

        let (_staging, contents) = render(&config, &registry);
        let echo = contents.find("RUN echo ready").unwrap();
        let pip = contents.find("RUN pip install wheel").unwrap();
        assert!(echo < pip);
    }

    #[test]
    fn test_render_user_files() {
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("data.csv");
        fs::write(&source, "a,b,c").unwrap();

        let config = PackagingConfig::builder()
            .base_image("python:3.11-slim")
            .file(&source, "/data/data.csv")
            .build()
            .unwrap();
        let registry = registry_with_flow("etl");

        let (staging, contents) = render(&config, &registry);
        assert!(contents.contains("COPY data.csv /data/data.csv\n"));
        assert!(staging.path().join("data.csv").exists());
    }

    #[test]
    fn test_render_custom_dockerfile_embeds_and_uses_absolute_sources() {
        let work_dir = tempfile::tempdir().unwrap();
        let dockerfile = work_dir.path().join("Dockerfile.base");
        fs::write(&dockerfile, "FROM python:3.11\nRUN echo base\n").unwrap();

        let config = PackagingConfig::builder()
            .dockerfile(&dockerfile)
            .build()
            .unwrap();
        let registry = registry_with_flow("etl");

        let staging = StagingDir::create(false).unwrap();
        let path = DockerfileRenderer::new(&config, &registry)
            .render_into(&staging)
            .unwrap();
        let contents = fs::read_to_string(path).unwrap();

        // 埋め込まれたベースブロック（行頭空白は落ちている）
        assert!(contents.contains("FROM python:3.11\nRUN echo base\n"));

        // COPY 元はステージング先の絶対パス
        let staged_flow = fs::canonicalize(staging.path().join("etl.flow")).unwrap();
        assert!(contents.contains(&format!(
            "COPY {} /root/.flowpack/flows/etl.flow",
            staged_flow.display()
        )));
    }

    #[test]
    fn test_render_missing_custom_dockerfile() {
        let config = PackagingConfig::builder()
            .dockerfile("/nonexistent/Dockerfile")
            .build()
            .unwrap();
        let registry = registry_with_flow("etl");

        let staging = StagingDir::create(false).unwrap();
        let err = DockerfileRenderer::new(&config, &registry)
            .render_into(&staging)
            .unwrap_err();
        assert!(matches!(err, BuildError::DockerfileNotFound(_)));
    }

    #[test]
    fn test_render_multiple_flows_sorted() {
        let mut registry = FlowRegistry::new();
        registry
            .add(&Flow::new("zeta", vec!["python".into(), "z.py".into()]))
            .unwrap();
        registry
            .add(&Flow::new("alpha", vec!["python".into(), "a.py".into()]))
            .unwrap();

        let config = PackagingConfig::builder()
            .base_image("python:3.11-slim")
            .build()
            .unwrap();

        let (_staging, contents) = render(&config, &registry);
        let alpha = contents.find("COPY alpha.flow").unwrap();
        let zeta = contents.find("COPY zeta.flow").unwrap();
        assert!(alpha < zeta);
        assert!(contents.contains(
            "'[\"/root/.flowpack/flows/alpha.flow\",\"/root/.flowpack/flows/zeta.flow\"]'"
        ));
    }

    #[test]
    fn test_major_minor() {
        assert_eq!(major_minor("3.11"), "3.11");
        assert_eq!(major_minor("3.11.4"), "3.11");
        assert_eq!(major_minor("3"), "3");
    }
}
