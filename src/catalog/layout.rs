//! On-disk catalog layouts.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Where the catalog of a `(group, locale)` pair lives relative to the base path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// `base/{locale}/{group}.json`
    LocaleDir,
    /// `base/{group}/{locale}.json`
    GroupDir,
    /// `base/{locale}.json`, one object per group inside.
    LocaleFile,
}

impl Layout {
    pub const ALL: [Layout; 3] = [Layout::LocaleDir, Layout::GroupDir, Layout::LocaleFile];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::LocaleDir => "locale-dir",
            Layout::GroupDir => "group-dir",
            Layout::LocaleFile => "locale-file",
        }
    }

    pub fn locate(&self, base: &Path, group: &str, locale: &str) -> CatalogLocator {
        match self {
            Layout::LocaleDir => {
                CatalogLocator::file(base.join(locale).join(format!("{}.json", group)))
            }
            Layout::GroupDir => {
                CatalogLocator::file(base.join(group).join(format!("{}.json", locale)))
            }
            Layout::LocaleFile => {
                CatalogLocator::section(base.join(format!("{}.json", locale)), group)
            }
        }
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layout::ALL
            .into_iter()
            .find(|layout| layout.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownLayout(s.to_string()))
    }
}

/// Resolved location of one catalog: a whole file, or a named section of a
/// shared file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogLocator {
    pub path: PathBuf,
    pub section: Option<String>,
}

impl CatalogLocator {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            section: None,
        }
    }

    pub fn section(path: impl Into<PathBuf>, section: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            section: Some(section.into()),
        }
    }
}

impl Display for CatalogLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.section {
            Some(section) => write!(f, "{}#{}", self.path.display(), section),
            None => write!(f, "{}", self.path.display()),
        }
    }
}
