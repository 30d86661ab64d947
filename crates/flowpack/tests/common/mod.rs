use flowpack::Flow;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub fn sample_flow(name: &str) -> Flow {
    Flow::new(name, vec!["python".to_string(), "run.py".to_string()])
}

pub struct TestFiles {
    pub root: TempDir,
}

impl TestFiles {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    #[allow(dead_code)]
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }
}

#[allow(dead_code)]
pub fn init_tracing() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
}
