//! Case providers.
//!
//! [`ManifestDirectory`] reads one JSON manifest per group from a directory
//! (the files the `make` command writes). [`StaticCases`] serves groups held
//! in memory.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::{
    builtin::main_group,
    error::Error,
    key::{DEFAULT_GROUP_SUFFIX, group_key},
    traits::CaseProvider,
    types::CodeGroup,
};

/// True when `query` names `group`, either by its full name or by its key.
fn names_group(group_name: &str, query: &str, suffix: &str) -> bool {
    group_name == query || group_key(group_name, suffix) == group_key(query, suffix)
}

/// Group manifests stored as `{dir}/{GroupName}.json`.
#[derive(Debug, Clone)]
pub struct ManifestDirectory {
    dir: PathBuf,
    suffix: String,
    builtin: Option<CodeGroup>,
}

impl ManifestDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            suffix: DEFAULT_GROUP_SUFFIX.to_string(),
            builtin: None,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Also serves the built-in `Main` group, unless a manifest shadows it.
    pub fn with_builtin(mut self) -> Self {
        self.builtin = Some(main_group());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a manifest for `group_name` is stored at.
    pub fn manifest_path(&self, group_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", group_name))
    }

    fn manifest_names(&self) -> Result<Vec<String>, Error> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_manifest(&self, path: &Path) -> Result<CodeGroup, Error> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| Error::InvalidCatalog {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl CaseProvider for ManifestDirectory {
    fn list_groups(&self) -> Result<Vec<String>, Error> {
        let mut names = self.manifest_names()?;
        if let Some(builtin) = &self.builtin
            && !names
                .iter()
                .any(|name| names_group(name, builtin.name(), &self.suffix))
        {
            names.insert(0, builtin.name().to_string());
        }
        Ok(names)
    }

    fn load_group(&self, name: &str) -> Result<CodeGroup, Error> {
        let exact = self.manifest_path(name);
        if exact.is_file() {
            return self.read_manifest(&exact);
        }

        let suffixed = self.manifest_path(&format!("{}{}", name, self.suffix));
        if suffixed.is_file() {
            return self.read_manifest(&suffixed);
        }

        if let Some(found) = self
            .manifest_names()?
            .into_iter()
            .find(|candidate| names_group(candidate, name, &self.suffix))
        {
            return self.read_manifest(&self.manifest_path(&found));
        }

        match &self.builtin {
            Some(builtin) if names_group(builtin.name(), name, &self.suffix) => Ok(builtin.clone()),
            _ => {
                warn!(group = name, dir = %self.dir.display(), "group not found");
                Err(Error::UnknownGroup(name.to_string()))
            }
        }
    }
}

/// Groups held in memory, served in insertion order.
#[derive(Debug, Clone, Default)]
pub struct StaticCases {
    groups: Vec<CodeGroup>,
    suffix: String,
}

impl StaticCases {
    pub fn new(groups: Vec<CodeGroup>) -> Self {
        Self {
            groups,
            suffix: DEFAULT_GROUP_SUFFIX.to_string(),
        }
    }

    /// Only the built-in `Main` group.
    pub fn builtin() -> Self {
        Self::new(vec![main_group()])
    }

    pub fn push(&mut self, group: CodeGroup) {
        self.groups.push(group);
    }
}

impl CaseProvider for StaticCases {
    fn list_groups(&self) -> Result<Vec<String>, Error> {
        Ok(self.groups.iter().map(|g| g.name().to_string()).collect())
    }

    fn load_group(&self, name: &str) -> Result<CodeGroup, Error> {
        self.groups
            .iter()
            .find(|g| names_group(g.name(), name, &self.suffix))
            .cloned()
            .ok_or_else(|| Error::UnknownGroup(name.to_string()))
    }
}
