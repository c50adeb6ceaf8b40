use std::borrow::Cow;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::utils::{path_must_str, read_file};
use crate::Context;

#[derive(Debug)]
pub enum Error {
    InvalidType,
    MissingKey,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::InvalidType => "InvalidType",
                Self::MissingKey => "MissingKey",
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A view of one table in a TOML file that knows its dotted key path for
/// error messages
pub struct ConfigMap<'c> {
    path: &'c Path,
    name: Option<Cow<'c, str>>,
    table: &'c Table,
}

/// `[adb]` settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdbConfig {
    pub executable: Option<String>,
    pub serial: Option<String>,
}

/// `[receivers]` settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiversConfig {
    pub check_every_receiver: bool,
    /// Indicator files, relative paths are resolved against the config file
    pub iocs: Vec<PathBuf>,
}

/// The parsed project config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub path: PathBuf,
    pub can_adb: bool,
    pub adb: AdbConfig,
    pub receivers: ReceiversConfig,
}

impl AdbConfig {
    /// The configured executable, or `adb` found by the context
    pub fn get_executable<'a>(&'a self, ctx: &dyn Context) -> crate::Result<Cow<'a, str>> {
        match &self.executable {
            Some(v) => Ok(Cow::Borrowed(v.as_str())),
            None => ctx.get_bin("adb").map(Cow::Owned),
        }
    }

    /// The configured serial, or `ANDROID_SERIAL`
    pub fn get_serial<'a>(&'a self, ctx: &dyn Context) -> Option<Cow<'a, str>> {
        match &self.serial {
            Some(v) => Some(Cow::Borrowed(v.as_str())),
            None => ctx.maybe_get_env("ANDROID_SERIAL").map(Cow::Owned),
        }
    }
}

impl ProjectConfig {
    pub fn parse(source: &Path) -> crate::Result<Self> {
        parse_config(source, |cfg| Self::from_map(cfg))
    }

    pub fn parse_str(source: &Path, content: &str) -> crate::Result<Self> {
        let table: Table = toml::from_str(content).map_err(|e| crate::Error::new_cfg(source, &e))?;
        let base = ConfigMap {
            name: None,
            path: source,
            table: &table,
        };
        Self::from_map(&base)
    }

    fn from_map(cfg: &ConfigMap) -> crate::Result<Self> {
        let can_adb = match cfg.get_bool("can-adb") {
            Ok(v) => v,
            Err(Error::MissingKey) => true,
            Err(Error::InvalidType) => return Err(cfg.invalid_key("can-adb", "bool")),
        };

        let adb = match cfg.maybe_get_map_typecheck("adb")? {
            Some(m) => AdbConfig {
                executable: m.maybe_get_str_typecheck("executable")?.map(String::from),
                serial: m.maybe_get_str_typecheck("serial")?.map(String::from),
            },
            None => AdbConfig::default(),
        };

        let base_dir = cfg.path.parent().unwrap_or_else(|| Path::new("."));

        let receivers = match cfg.maybe_get_map_typecheck("receivers")? {
            Some(m) => ReceiversConfig {
                check_every_receiver: m.get_bool_or("check-every-receiver", false),
                iocs: m
                    .maybe_get_str_list_typecheck("iocs")?
                    .unwrap_or_default()
                    .into_iter()
                    .map(|it| base_dir.join(it))
                    .collect(),
            },
            None => ReceiversConfig::default(),
        };

        Ok(Self {
            path: cfg.path.to_path_buf(),
            can_adb,
            adb,
            receivers,
        })
    }
}

pub fn parse_config<R, F>(file: &Path, f: F) -> crate::Result<R>
where
    F: FnOnce(&ConfigMap) -> crate::Result<R>,
{
    let as_str = read_file(file)?;

    let table: Table = match toml::from_str(&as_str) {
        Ok(v) => v,
        Err(e) => return Err(crate::Error::new_cfg(file, &e)),
    };

    let base = ConfigMap {
        name: None,
        path: file,
        table: &table,
    };

    f(&base)
}

impl<'c> ConfigMap<'c> {
    fn get_full_path<'a>(&'a self) -> Option<&'a str> {
        self.name.as_ref().map(|it| it.as_ref())
    }

    fn key_path<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self.get_full_path() {
            None => Cow::Borrowed(key),
            Some(v) => Cow::Owned(format!("{}.{}", v, key)),
        }
    }

    /// Helper to create a crate::Error for an invalid key
    pub fn invalid_key(&self, key: &str, expected: &str) -> crate::Error {
        let path = self.key_path(key);
        crate::Error::InvalidConfig(
            path_must_str(self.path).into(),
            format!(
                "invalid value for key: {} (expected type: {})",
                path, expected
            ),
        )
    }

    fn get(&self, key: &str) -> Option<&'c Value> {
        self.table.get(key)
    }

    pub fn maybe_get_str(&self, key: &str) -> Result<Option<&'c str>> {
        match self.get(key) {
            Some(v) => match v.as_str() {
                Some(v) => Ok(Some(v)),
                None => Err(Error::InvalidType),
            },
            None => Ok(None),
        }
    }

    pub fn maybe_get_str_typecheck(&self, key: &str) -> crate::Result<Option<&'c str>> {
        self.maybe_get_str(key)
            .map_err(|_| self.invalid_key(key, "string"))
    }

    pub fn maybe_get_str_list(&self, key: &str) -> Result<Option<Vec<&'c str>>> {
        let arr = match self.get(key) {
            Some(v) => v.as_array().ok_or(Error::InvalidType)?,
            None => return Ok(None),
        };
        arr.iter()
            .map(|it| it.as_str().ok_or(Error::InvalidType))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    pub fn maybe_get_str_list_typecheck(&self, key: &str) -> crate::Result<Option<Vec<&'c str>>> {
        self.maybe_get_str_list(key)
            .map_err(|_| self.invalid_key(key, "string array"))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.get(key)
            .ok_or(Error::MissingKey)?
            .as_bool()
            .ok_or(Error::InvalidType)
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.table
            .get(key)
            .map(|it| it.as_bool().unwrap_or(default))
            .unwrap_or(default)
    }

    pub fn maybe_get_map(&self, key: &str) -> Result<Option<ConfigMap<'c>>> {
        match self.get(key) {
            Some(v) => match v.as_table() {
                Some(table) => {
                    let name = match self.get_full_path() {
                        Some(parents) => format!("{parents}.{key}"),
                        None => key.to_string(),
                    };
                    Ok(Some(Self {
                        name: Some(Cow::Owned(name)),
                        path: self.path,
                        table,
                    }))
                }
                None => Err(Error::InvalidType),
            },
            None => Ok(None),
        }
    }

    pub fn maybe_get_map_typecheck(&self, key: &str) -> crate::Result<Option<ConfigMap<'c>>> {
        self.maybe_get_map(key)
            .map_err(|_| self.invalid_key(key, "table"))
    }
}
