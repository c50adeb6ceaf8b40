use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::{path_must_str, read_file};

lazy_static! {
    static ref APP_ID_PATTERN: Regex =
        Regex::new(r"^\[\s*app:id\s*=\s*'([^']+)'\s*\]$").expect("invalid regex");
}

/// The indicator of compromise that matched a lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub stix2_file_name: String,
}

/// Anything that can tell whether an app id is a known indicator.
///
/// Errors are not recovered by callers, they abort whatever check is running.
pub trait IndicatorLookup: Send + Sync {
    fn check_app_id(&self, app_id: &str) -> crate::Result<Option<Indicator>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IndicatorCollection {
    name: String,
    stix2_file_name: String,
    app_ids: Vec<String>,
}

/// In memory indicator database built from STIX2 bundles
#[derive(Debug, Clone, Default)]
pub struct Indicators {
    collections: Vec<IndicatorCollection>,
}

#[derive(Deserialize)]
struct Stix2Bundle {
    #[serde(default)]
    objects: Vec<Stix2Object>,
}

#[derive(Deserialize)]
struct Stix2Object {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
}

impl Indicators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a single collection from a list of app ids
    pub fn from_app_ids<S, I>(name: &str, app_ids: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let mut it = Self::new();
        it.add_app_ids(name, "", app_ids);
        it
    }

    pub fn add_app_ids<S, I>(&mut self, name: &str, stix2_file_name: &str, app_ids: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.collections.push(IndicatorCollection {
            name: name.into(),
            stix2_file_name: stix2_file_name.into(),
            app_ids: app_ids.into_iter().map(Into::into).collect(),
        });
    }

    /// Load all `app:id` indicators out of a STIX2 bundle.
    ///
    /// The collection is named after the first `malware` object in the bundle,
    /// falling back to the file stem.
    pub fn load_stix2(&mut self, path: &Path) -> crate::Result<()> {
        let content = read_file(path)?;
        let bundle: Stix2Bundle = serde_json::from_str(&content)
            .map_err(|e| crate::Error::new_indicators(path, &e))?;

        let file_name = path
            .file_name()
            .map(|it| it.to_string_lossy().into_owned())
            .unwrap_or_else(|| path_must_str(path).into_owned());

        let mut name = None;
        let mut app_ids = Vec::new();

        for obj in bundle.objects {
            match obj.kind.as_str() {
                "malware" if name.is_none() => name = obj.name,
                "indicator" => {
                    let Some(pattern) = obj.pattern else {
                        continue;
                    };
                    match parse_app_id_pattern(&pattern) {
                        Some(id) => app_ids.push(id),
                        None => log::trace!("skipping non app:id pattern {}", pattern),
                    }
                }
                _ => {}
            }
        }

        let name = name.unwrap_or_else(|| {
            path.file_stem()
                .map(|it| it.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.clone())
        });

        log::debug!(
            "loaded {} app id indicators for {} from {}",
            app_ids.len(),
            name,
            file_name
        );
        self.add_app_ids(&name, &file_name, app_ids);
        Ok(())
    }

    pub fn total_app_ids(&self) -> usize {
        self.collections.iter().map(|it| it.app_ids.len()).sum()
    }
}

fn parse_app_id_pattern(pattern: &str) -> Option<String> {
    APP_ID_PATTERN
        .captures(pattern.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

impl IndicatorLookup for Indicators {
    fn check_app_id(&self, app_id: &str) -> crate::Result<Option<Indicator>> {
        if app_id.is_empty() {
            return Ok(None);
        }

        for col in &self.collections {
            if col.app_ids.iter().any(|it| it == app_id) {
                return Ok(Some(Indicator {
                    value: app_id.into(),
                    kind: "app_ids".into(),
                    name: col.name.clone(),
                    stix2_file_name: col.stix2_file_name.clone(),
                }));
            }
        }
        Ok(None)
    }
}
