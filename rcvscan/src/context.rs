use blanket::blanket;
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;

use which::{which, which_in};

use crate::config::ProjectConfig;
use crate::Error;

use std::ops::DerefMut;
use std::sync::Mutex;

/// Env var pointing at the project config file
pub const CONFIG_ENV: &'static str = "RCVSCAN_CONFIG";
/// Config file looked up in the working directory when [CONFIG_ENV] is unset
pub const DEFAULT_CONFIG_FILE: &'static str = "rcvscan.toml";

#[derive(Clone)]
struct CachedBin {
    name: String,
    path: String,
}

fn wrapped_which(bin: &str) -> Option<PathBuf> {
    if let Ok(search_path) = env::var("RCVSCAN_PATH") {
        let cwd = env::current_dir().ok()?;
        return which_in(bin, Some(&search_path), &cwd).ok();
    }
    which(bin).ok()
}

fn config_file_from_env(value: Option<String>) -> PathBuf {
    value
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

#[inline(always)]
fn find_program(prog: &str) -> Option<String> {
    wrapped_which(prog).map(|it| it.to_string_lossy().into())
}

/// Context is a trait for an object that can find binaries, lookup env vars
/// and load the project config.
///
/// Most methods on this trait have a default implementation that is perfectly
/// safe to leave unchanged.
#[blanket(derive(Ref, Box))]
pub trait Context: Send + Sync {
    fn maybe_get_env(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn maybe_get_bin(&self, bin: &str) -> Option<String> {
        find_program(bin)
    }

    fn get_bin(&self, bin: &str) -> crate::Result<String> {
        self.maybe_get_bin(bin)
            .ok_or_else(|| Error::MissingBin(bin.into()))
    }

    fn get_env(&self, key: &str) -> crate::Result<String> {
        self.maybe_get_env(key)
            .ok_or_else(|| Error::MissingEnv(key.into()))
    }

    fn get_project_config_file(&self) -> PathBuf {
        config_file_from_env(self.maybe_get_env(CONFIG_ENV))
    }

    /// The project config, or `None` if there is no config file
    fn get_project_config<'a>(&'a self) -> crate::Result<Option<&'a ProjectConfig>>;
}

pub struct DefaultContext {
    bin_cache: Mutex<Vec<CachedBin>>,
    config_file: Option<PathBuf>,
    project_config: OnceCell<Option<ProjectConfig>>,
}

impl DefaultContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given config file instead of the env var or default location.
    /// The file has to exist.
    pub fn with_config_file(mut self, path: PathBuf) -> Self {
        self.config_file = Some(path);
        self.project_config = OnceCell::new();
        self
    }
}

impl Default for DefaultContext {
    fn default() -> Self {
        Self {
            bin_cache: Mutex::new(Vec::new()),
            config_file: None,
            project_config: OnceCell::new(),
        }
    }
}

impl Context for DefaultContext {
    fn get_project_config_file(&self) -> PathBuf {
        match &self.config_file {
            Some(path) => path.clone(),
            None => config_file_from_env(self.maybe_get_env(CONFIG_ENV)),
        }
    }

    fn get_project_config<'a>(&'a self) -> crate::Result<Option<&'a ProjectConfig>> {
        let cfg = self
            .project_config
            .get_or_try_init(|| -> crate::Result<Option<ProjectConfig>> {
                let path = self.get_project_config_file();
                let explicit =
                    self.config_file.is_some() || self.maybe_get_env(CONFIG_ENV).is_some();
                if !path.exists() && !explicit {
                    log::debug!("no project config at {}", path.to_string_lossy());
                    Ok(None)
                } else {
                    ProjectConfig::parse(&path).map(Some)
                }
            })?;
        Ok(cfg.as_ref())
    }

    fn maybe_get_bin(&self, prog: &str) -> Option<String> {
        let mut cache_guard = match self.bin_cache.lock() {
            Ok(v) => v,
            Err(poisoned) => poisoned.into_inner(),
        };
        let cache = cache_guard.deref_mut();
        if let Some(val) = cache.iter().find(|it| it.name == prog) {
            return Some(val.path.clone());
        }

        let found = find_program(prog)?;

        cache.push(CachedBin {
            name: prog.into(),
            path: found.clone(),
        });

        Some(found)
    }
}
