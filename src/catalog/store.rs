use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    catalog::{CatalogLocator, Layout},
    config::TranslationSettings,
    error::Error,
    types::Catalog,
};

/// What happened when a legacy catalog was folded into the current layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No legacy catalog exists (or old and new are the same place).
    NothingToMigrate,
    /// The legacy catalog was merged into the new one and removed.
    Migrated {
        from: CatalogLocator,
        to: CatalogLocator,
        imported: usize,
    },
    /// The legacy catalog could not be parsed and was left untouched.
    LeftCorrupt { path: PathBuf, reason: String },
}

/// File-backed catalogs under one base directory.
///
/// The store knows the current layout and an ordered list of legacy layouts.
/// [`MessageStore::open`] migrates any legacy catalog into the current
/// location before reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageStore {
    base: PathBuf,
    layout: Layout,
    legacy_layouts: Vec<Layout>,
}

impl MessageStore {
    pub fn new(base: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            base: base.into(),
            layout,
            legacy_layouts: Vec::new(),
        }
    }

    /// Sets the legacy layouts, in migration order. The current layout and
    /// repeated entries are ignored.
    pub fn with_legacy_layouts(mut self, layouts: impl IntoIterator<Item = Layout>) -> Self {
        self.legacy_layouts.clear();
        for layout in layouts {
            if layout != self.layout && !self.legacy_layouts.contains(&layout) {
                self.legacy_layouts.push(layout);
            }
        }
        self
    }

    pub fn from_settings(settings: &TranslationSettings) -> Self {
        Self::new(&settings.base_path, settings.layout)
            .with_legacy_layouts(settings.legacy_layouts.iter().copied())
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn legacy_layouts(&self) -> &[Layout] {
        &self.legacy_layouts
    }

    /// Location of `(group, locale)` in the current layout.
    pub fn locator(&self, group: &str, locale: &str) -> CatalogLocator {
        self.layout.locate(&self.base, group, locale)
    }

    /// Migrates every legacy catalog of `(group, locale)` into the current
    /// layout, then reads the result.
    pub fn open(&self, group: &str, locale: &str) -> Result<Catalog, Error> {
        let current = self.locator(group, locale);
        for legacy in &self.legacy_layouts {
            let old = legacy.locate(&self.base, group, locale);
            Self::migrate_legacy(&old, &current)?;
        }
        Ok(Self::read(&current))
    }

    /// Reads `(group, locale)` without touching the filesystem: the current
    /// catalog, with gaps filled from any legacy catalog still on disk.
    pub fn lookup(&self, group: &str, locale: &str) -> Catalog {
        let mut catalog = Self::read(&self.locator(group, locale));
        for legacy in &self.legacy_layouts {
            let older = Self::read(&legacy.locate(&self.base, group, locale));
            for (key, message) in older.iter() {
                if !catalog.contains_key(key) {
                    catalog.insert(key, message);
                }
            }
        }
        catalog
    }

    /// Reads a catalog. Missing files give an empty catalog; unreadable or
    /// malformed content is logged and also gives an empty catalog.
    pub fn read(locator: &CatalogLocator) -> Catalog {
        match load(locator) {
            Ok(catalog) => catalog.unwrap_or_default(),
            Err(reason) => {
                warn!(catalog = %locator, %reason, "ignoring unreadable catalog");
                Catalog::new()
            }
        }
    }

    /// Writes `catalog` as pretty JSON with sorted keys and a trailing newline.
    ///
    /// Returns `Ok(false)` without touching the file when its bytes would not
    /// change. For section locators only that section of the shared file is
    /// replaced.
    pub fn write(locator: &CatalogLocator, catalog: &Catalog) -> Result<bool, Error> {
        let rendered = match &locator.section {
            None => render(catalog)?,
            Some(section) => {
                let mut document = load_document(&locator.path)?.unwrap_or_default();
                document.insert(section.clone(), serde_json::to_value(catalog)?);
                render(&sorted_document(document))?
            }
        };

        let written = write_if_changed(&locator.path, rendered.as_bytes())?;
        if !written {
            debug!(catalog = %locator, "catalog unchanged, skipping write");
        }
        Ok(written)
    }

    /// Folds the catalog at `old` into the one at `new` and removes `old`.
    ///
    /// Keys already present at `new` win, even with an empty message. Calling
    /// this again after a successful migration is a no-op. A legacy catalog
    /// that cannot be parsed is left in place.
    pub fn migrate_legacy(
        old: &CatalogLocator,
        new: &CatalogLocator,
    ) -> Result<MigrationOutcome, Error> {
        if old == new {
            return Ok(MigrationOutcome::NothingToMigrate);
        }

        let legacy = match load(old) {
            Ok(Some(catalog)) => catalog,
            Ok(None) => return Ok(MigrationOutcome::NothingToMigrate),
            Err(reason) => {
                warn!(catalog = %old, %reason, "legacy catalog is corrupt, leaving it in place");
                return Ok(MigrationOutcome::LeftCorrupt {
                    path: old.path.clone(),
                    reason,
                });
            }
        };

        let mut merged = Self::read(new);
        let mut imported = 0;
        for (key, message) in legacy.iter() {
            if !merged.contains_key(key) {
                merged.insert(key, message);
                imported += 1;
            }
        }

        Self::write(new, &merged)?;
        remove(old)?;

        info!(from = %old, to = %new, imported, "migrated legacy catalog");
        Ok(MigrationOutcome::Migrated {
            from: old.clone(),
            to: new.clone(),
            imported,
        })
    }
}

/// Adds a default message for every desired key that is missing.
///
/// Keys already present are returned unchanged, whatever their value (an
/// empty message included). Returns the merged catalog and the number of
/// keys that were added.
pub fn merge_missing<I, K, F>(existing: &Catalog, desired_keys: I, default_fn: F) -> (Catalog, usize)
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
    F: Fn(&str) -> String,
{
    let mut merged = existing.clone();
    let mut added = 0;
    for key in desired_keys {
        let key = key.as_ref();
        if !merged.contains_key(key) {
            merged.insert(key, default_fn(key));
            added += 1;
        }
    }
    (merged, added)
}

/// `Ok(None)` when the file or section does not exist, `Err` with a reason
/// when it exists but is not a string-to-string object.
fn load(locator: &CatalogLocator) -> Result<Option<Catalog>, String> {
    let bytes = match fs::read(&locator.path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };

    match &locator.section {
        None => parse_catalog(&bytes).map(Some),
        Some(section) => {
            let document = parse_document(&bytes)?;
            match document.get(section) {
                Some(value) => serde_json::from_value::<Catalog>(value.clone())
                    .map(Some)
                    .map_err(|e| format!("section `{}`: {}", section, e)),
                None => Ok(None),
            }
        }
    }
}

fn parse_catalog(bytes: &[u8]) -> Result<Catalog, String> {
    if is_blank(bytes) {
        return Ok(Catalog::new());
    }
    serde_json::from_slice(bytes).map_err(|e| e.to_string())
}

fn parse_document(bytes: &[u8]) -> Result<BTreeMap<String, Value>, String> {
    if is_blank(bytes) {
        return Ok(BTreeMap::new());
    }
    serde_json::from_slice(bytes).map_err(|e| e.to_string())
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Loads a shared multi-group file. A corrupt file is an error here: writing
/// over it would lose the other groups.
fn load_document(path: &Path) -> Result<Option<BTreeMap<String, Value>>, Error> {
    match fs::read(path) {
        Ok(bytes) => parse_document(&bytes)
            .map(Some)
            .map_err(|reason| Error::InvalidCatalog {
                path: path.to_path_buf(),
                reason,
            }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Sorts the keys of every nested object; `preserve_order` would otherwise
/// keep whatever order a hand-edited section was written in.
fn sorted_document(document: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    document
        .into_iter()
        .map(|(key, value)| (key, sorted_value(value)))
        .collect()
}

fn sorted_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sorted_value(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted_value).collect()),
        other => other,
    }
}

fn render<T: Serialize>(value: &T) -> Result<String, Error> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Writes `bytes` through a temporary file and an atomic rename, unless the
/// file already holds exactly these bytes.
pub(crate) fn write_if_changed(path: &Path, bytes: &[u8]) -> Result<bool, Error> {
    if fs::read(path).is_ok_and(|current| current == bytes) {
        return Ok(false);
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::write_error(path, e))?;

    let mut file = NamedTempFile::new_in(parent).map_err(|e| Error::write_error(path, e))?;
    file.write_all(bytes).map_err(|e| Error::write_error(path, e))?;
    file.persist(path)
        .map_err(|e| Error::write_error(path, e.error))?;
    Ok(true)
}

fn remove(locator: &CatalogLocator) -> Result<(), Error> {
    let path = &locator.path;
    if let Some(section) = &locator.section {
        let mut document = load_document(path)?.unwrap_or_default();
        document.remove(section);
        if !document.is_empty() {
            write_if_changed(path, render(&sorted_document(document))?.as_bytes())?;
            return Ok(());
        }
    }

    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::write_error(path, e)),
    }
    if let Some(parent) = path.parent() {
        remove_dir_if_empty(parent);
    }
    Ok(())
}

fn remove_dir_if_empty(dir: &Path) {
    let is_empty = fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty && let Err(e) = fs::remove_dir(dir) {
        debug!(dir = %dir.display(), error = %e, "could not remove empty legacy directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn catalog(pairs: &[(&str, &str)]) -> Catalog {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_read_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let locator = CatalogLocator::file(dir.path().join("en/main.json"));
        assert!(MessageStore::read(&locator).is_empty());
    }

    #[test]
    fn test_read_corrupt_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(MessageStore::read(&CatalogLocator::file(&path)).is_empty());

        fs::write(&path, r#"{"a": {"nested": true}}"#).unwrap();
        assert!(MessageStore::read(&CatalogLocator::file(&path)).is_empty());
    }

    #[test]
    fn test_write_is_sorted_pretty_with_newline() {
        let dir = TempDir::new().unwrap();
        let locator = CatalogLocator::file(dir.path().join("en/main.json"));
        let written =
            MessageStore::write(&locator, &catalog(&[("zeta", "Z"), ("alpha", "A")])).unwrap();
        assert!(written);

        let content = fs::read_to_string(&locator.path).unwrap();
        assert_eq!(content, "{\n  \"alpha\": \"A\",\n  \"zeta\": \"Z\"\n}\n");
    }

    #[test]
    fn test_write_skips_identical_content() {
        let dir = TempDir::new().unwrap();
        let locator = CatalogLocator::file(dir.path().join("main.json"));
        let data = catalog(&[("a", "A")]);
        assert!(MessageStore::write(&locator, &data).unwrap());
        assert!(!MessageStore::write(&locator, &data).unwrap());
    }

    #[test]
    fn test_write_section_keeps_other_groups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("en.json");
        fs::write(&path, r#"{"user": {"user_not_found": "Gone"}}"#).unwrap();

        let locator = CatalogLocator::section(&path, "main");
        MessageStore::write(&locator, &catalog(&[("forbidden", "No")])).unwrap();

        let user = MessageStore::read(&CatalogLocator::section(&path, "user"));
        assert_eq!(user.get("user_not_found"), Some("Gone"));
        assert_eq!(MessageStore::read(&locator).get("forbidden"), Some("No"));
    }

    #[test]
    fn test_write_section_refuses_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("en.json");
        fs::write(&path, "[1, 2").unwrap();

        let result = MessageStore::write(&CatalogLocator::section(&path, "main"), &Catalog::new());
        assert!(matches!(result, Err(Error::InvalidCatalog { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[1, 2");
    }

    #[test]
    fn test_merge_missing_keeps_existing() {
        let existing = catalog(&[("a", "Custom A"), ("b", "")]);
        let (merged, added) =
            merge_missing(&existing, ["a", "b", "c"], |key| format!("default {}", key));
        assert_eq!(added, 1);
        assert_eq!(merged.get("a"), Some("Custom A"));
        assert_eq!(merged.get("c"), Some("default c"));
    }

    #[test]
    fn test_merge_missing_keeps_empty_message() {
        let existing = catalog(&[("a", "")]);
        let (merged, added) = merge_missing(&existing, ["a"], |_| "DEFAULT".to_string());
        assert_eq!(added, 0);
        assert_eq!(merged.get("a"), Some(""));
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_write_section_sorts_other_groups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("en.json");
        fs::write(&path, r#"{"user": {"zeta": "Z", "alpha": "A"}}"#).unwrap();

        let locator = CatalogLocator::section(&path, "main");
        MessageStore::write(&locator, &catalog(&[("forbidden", "No")])).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "{\n  \"main\": {\n    \"forbidden\": \"No\"\n  },\n  \"user\": {\n    \"alpha\": \"A\",\n    \"zeta\": \"Z\"\n  }\n}\n"
        );
    }

    #[test]
    fn test_migrate_merges_and_removes_old() {
        let dir = TempDir::new().unwrap();
        let old = Layout::GroupDir.locate(dir.path(), "foo", "en");
        let new = Layout::LocaleDir.locate(dir.path(), "foo", "en");
        MessageStore::write(&old, &catalog(&[("bar", "old bar"), ("baz", "old baz")])).unwrap();
        MessageStore::write(&new, &catalog(&[("baz", "new baz")])).unwrap();

        let outcome = MessageStore::migrate_legacy(&old, &new).unwrap();
        assert_eq!(
            outcome,
            MigrationOutcome::Migrated {
                from: old.clone(),
                to: new.clone(),
                imported: 1,
            }
        );

        let merged = MessageStore::read(&new);
        assert_eq!(merged.get("bar"), Some("old bar"));
        assert_eq!(merged.get("baz"), Some("new baz"));
        assert!(!old.path.exists());
        assert!(!dir.path().join("foo").exists());

        assert_eq!(
            MessageStore::migrate_legacy(&old, &new).unwrap(),
            MigrationOutcome::NothingToMigrate
        );
    }

    #[test]
    fn test_migrate_never_overwrites_empty_new_message() {
        let dir = TempDir::new().unwrap();
        let old = Layout::GroupDir.locate(dir.path(), "foo", "en");
        let new = Layout::LocaleDir.locate(dir.path(), "foo", "en");
        MessageStore::write(&old, &catalog(&[("foo", "bar"), ("blank", "")])).unwrap();
        MessageStore::write(&new, &catalog(&[("foo", "")])).unwrap();

        let outcome = MessageStore::migrate_legacy(&old, &new).unwrap();
        assert!(matches!(outcome, MigrationOutcome::Migrated { imported: 1, .. }));

        let merged = MessageStore::read(&new);
        assert_eq!(merged.get("foo"), Some(""));
        assert_eq!(merged.get("blank"), Some(""));
    }

    #[test]
    fn test_migrate_leaves_corrupt_legacy_file() {
        let dir = TempDir::new().unwrap();
        let old = Layout::GroupDir.locate(dir.path(), "foo", "en");
        let new = Layout::LocaleDir.locate(dir.path(), "foo", "en");
        fs::create_dir_all(old.path.parent().unwrap()).unwrap();
        fs::write(&old.path, "not json").unwrap();

        let outcome = MessageStore::migrate_legacy(&old, &new).unwrap();
        assert!(matches!(outcome, MigrationOutcome::LeftCorrupt { .. }));
        assert!(old.path.exists());
        assert!(!new.path.exists());
    }

    #[test]
    fn test_migrate_from_section_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("en.json");
        fs::write(
            &path,
            r#"{"main": {"forbidden": "Nope"}, "user": {"user_not_found": "Gone"}}"#,
        )
        .unwrap();

        let old = CatalogLocator::section(&path, "main");
        let new = Layout::LocaleDir.locate(dir.path(), "main", "en");
        MessageStore::migrate_legacy(&old, &new).unwrap();

        assert_eq!(MessageStore::read(&new).get("forbidden"), Some("Nope"));
        assert!(path.exists());
        assert!(MessageStore::read(&old).is_empty());
        assert_eq!(
            MessageStore::read(&CatalogLocator::section(&path, "user")).get("user_not_found"),
            Some("Gone")
        );
    }

    #[test]
    fn test_open_runs_migrations() {
        let dir = TempDir::new().unwrap();
        let store = MessageStore::new(dir.path(), Layout::LocaleDir)
            .with_legacy_layouts([Layout::GroupDir, Layout::LocaleDir]);
        assert_eq!(store.legacy_layouts(), &[Layout::GroupDir]);

        let old = Layout::GroupDir.locate(dir.path(), "main", "uz");
        MessageStore::write(&old, &catalog(&[("forbidden", "Taqiqlangan")])).unwrap();

        let opened = store.open("main", "uz").unwrap();
        assert_eq!(opened.get("forbidden"), Some("Taqiqlangan"));
        assert!(!old.path.exists());
        assert!(store.locator("main", "uz").path.exists());
    }

    #[test]
    fn test_lookup_does_not_migrate() {
        let dir = TempDir::new().unwrap();
        let store =
            MessageStore::new(dir.path(), Layout::LocaleDir).with_legacy_layouts([Layout::GroupDir]);
        let old = Layout::GroupDir.locate(dir.path(), "main", "en");
        MessageStore::write(&old, &catalog(&[("forbidden", "Legacy")])).unwrap();

        assert_eq!(store.lookup("main", "en").get("forbidden"), Some("Legacy"));
        assert!(old.path.exists());
    }
}
