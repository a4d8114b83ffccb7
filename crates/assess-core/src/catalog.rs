//! Assessment catalog: which scripts make up each assessment type.
//!
//! The catalog is loaded once at startup and shared read-only. An unknown
//! assessment type resolves to an empty script list rather than an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CatalogError, Result};
use crate::unit::{ParameterSet, UnitSpec, DEFAULT_PRIORITY};

/// A catalog entry: a script and the stage it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub path: String,

    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_priority() -> u32 {
    DEFAULT_PRIORITY
}

impl CatalogEntry {
    pub fn new(path: impl Into<String>, priority: u32) -> Self {
        Self {
            path: path.into(),
            priority,
        }
    }

    /// Turn this entry into a schedulable unit carrying `parameters`.
    pub fn to_unit(&self, parameters: &ParameterSet) -> UnitSpec {
        UnitSpec::new(self.path.clone(), self.priority).with_parameters(parameters.clone())
    }
}

/// On-disk catalog format.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    assessments: BTreeMap<String, Vec<CatalogEntry>>,
}

/// Read-only mapping from assessment type to its ordered script list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    assessments: BTreeMap<String, Vec<CatalogEntry>>,
}

impl Catalog {
    /// Build a catalog from explicit entries. Paths are used as given.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<CatalogEntry>)>,
        S: Into<String>,
    {
        Self {
            assessments: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// The built-in PowerReview catalog, with script names joined onto `scripts_dir`.
    pub fn builtin(scripts_dir: &Path) -> Self {
        let entry = |area: &str, priority: u32| {
            CatalogEntry::new(
                scripts_dir
                    .join(format!("PowerReview-{}.ps1", area))
                    .to_string_lossy()
                    .into_owned(),
                priority,
            )
        };

        Self::from_entries([
            (
                "full",
                vec![
                    entry("AzureAD", 1),
                    entry("Exchange", 1),
                    entry("SharePoint", 2),
                    entry("Teams", 2),
                    entry("Defender", 3),
                    entry("Compliance", 3),
                ],
            ),
            (
                "security",
                vec![entry("AzureAD", 1), entry("Defender", 1), entry("Exchange", 2)],
            ),
            (
                "compliance",
                vec![entry("Compliance", 1), entry("SharePoint", 2), entry("Teams", 2)],
            ),
            ("quick", vec![entry("AzureAD", 1), entry("Exchange", 1)]),
        ])
    }

    /// Parse a TOML catalog. Relative script paths resolve against `scripts_dir`.
    ///
    /// ```toml
    /// [[assessments.security]]
    /// path = "PowerReview-AzureAD.ps1"
    /// priority = 1
    /// ```
    pub fn from_toml_str(text: &str, scripts_dir: &Path) -> Result<Self> {
        let file: CatalogFile = toml::from_str(text)?;

        let assessments = file
            .assessments
            .into_iter()
            .map(|(name, entries)| {
                let entries = entries
                    .into_iter()
                    .map(|e| CatalogEntry::new(resolve(scripts_dir, &e.path), e.priority))
                    .collect();
                (name, entries)
            })
            .collect();

        Ok(Self { assessments })
    }

    /// Load a TOML catalog from disk.
    pub fn load(path: &Path, scripts_dir: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, scripts_dir)
    }

    /// Scripts for `assessment_type`; empty when the type is unknown.
    pub fn scripts(&self, assessment_type: &str) -> &[CatalogEntry] {
        self.assessments
            .get(assessment_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve `assessment_type` into units with `parameters` attached to each.
    pub fn units(&self, assessment_type: &str, parameters: &ParameterSet) -> Vec<UnitSpec> {
        self.scripts(assessment_type)
            .iter()
            .map(|e| e.to_unit(parameters))
            .collect()
    }

    /// Known assessment type names, sorted.
    pub fn assessment_types(&self) -> impl Iterator<Item = &str> {
        self.assessments.keys().map(String::as_str)
    }

    pub fn contains(&self, assessment_type: &str) -> bool {
        self.assessments.contains_key(assessment_type)
    }
}

fn resolve(scripts_dir: &Path, path: &str) -> String {
    let p = Path::new(path);
    if p.is_absolute() {
        path.to_string()
    } else {
        scripts_dir.join(p).to_string_lossy().into_owned()
    }
}
