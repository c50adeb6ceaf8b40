use std::collections::HashMap;
use std::path::Path;

use rstest::fixture;

use crate::config::ProjectConfig;
use crate::Context;

#[fixture]
pub fn tmp_context() -> TestContext {
    TestContext::default()
}

/// A [Context] that never touches the real environment
#[derive(Default)]
pub struct TestContext {
    env: HashMap<String, String>,
    bins: HashMap<String, String>,
    config: Option<ProjectConfig>,
}

impl TestContext {
    pub fn set_env<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) -> &mut Self {
        self.env.insert(key.as_ref().into(), value.as_ref().into());
        self
    }

    pub fn set_bin<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, bin: V) -> &mut Self {
        self.bins.insert(key.as_ref().into(), bin.as_ref().into());
        self
    }

    /// Use the given TOML as the project config
    pub fn set_config(&mut self, content: &str) -> &mut Self {
        let cfg = ProjectConfig::parse_str(Path::new("rcvscan.toml"), content)
            .expect("invalid test config");
        self.config = Some(cfg);
        self
    }
}

impl Context for TestContext {
    fn maybe_get_env(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }

    fn maybe_get_bin(&self, bin: &str) -> Option<String> {
        self.bins.get(bin).cloned()
    }

    fn get_project_config<'a>(&'a self) -> crate::Result<Option<&'a ProjectConfig>> {
        Ok(self.config.as_ref())
    }
}
