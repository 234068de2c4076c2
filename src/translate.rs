//! Translators: resolve the message of a typed case in a locale.
//!
//! [`FileTranslator`] reads the catalogs the sync engine maintains.
//! [`KeyValueTranslator`] delegates to an opaque [`TranslationBackend`] and
//! uses the English default sentence as the lookup key.
//! [`TranslatorRegistry`] picks one of them by the driver name in [`Config`].

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use tracing::debug;

use crate::{
    catalog::MessageStore,
    config::{Config, TranslationSettings},
    error::Error,
    traits::{TranslationBackend, Translator},
};

pub const FILE_DRIVER: &str = "file";
pub const KEY_VALUE_DRIVER: &str = "key-value";

/// Reads messages from catalogs on disk, falling back to the pattern text.
#[derive(Debug, Clone)]
pub struct FileTranslator {
    store: MessageStore,
    settings: TranslationSettings,
}

impl FileTranslator {
    pub fn new(settings: TranslationSettings) -> Self {
        Self {
            store: MessageStore::from_settings(&settings),
            settings,
        }
    }
}

impl Translator for FileTranslator {
    fn translate(&self, group_key: &str, case_key: &str, locale: &str) -> Result<String, Error> {
        let mut locales = vec![locale];
        if self.settings.locale_fallback != locale {
            locales.push(&self.settings.locale_fallback);
        }

        for candidate in locales {
            let catalog = self.store.lookup(group_key, candidate);
            if let Some(message) = catalog.get(case_key).filter(|m| !m.is_empty()) {
                return Ok(message.to_string());
            }
        }

        debug!(group = group_key, case = case_key, locale, "no catalog message, using pattern");
        Ok(self.settings.default_message(case_key, locale))
    }
}

/// Uses the English default sentence as the key into a [`TranslationBackend`].
///
/// The key is seeded on every lookup so the backend learns about new cases.
pub struct KeyValueTranslator {
    backend: Arc<dyn TranslationBackend>,
    settings: TranslationSettings,
}

impl KeyValueTranslator {
    pub fn new(backend: Arc<dyn TranslationBackend>, settings: TranslationSettings) -> Self {
        Self { backend, settings }
    }

    /// The backend key of a case: its default sentence in the fallback locale.
    pub fn key_for(&self, case_key: &str) -> String {
        self.settings
            .default_message(case_key, &self.settings.locale_fallback)
    }
}

impl Translator for KeyValueTranslator {
    fn translate(&self, _group_key: &str, case_key: &str, locale: &str) -> Result<String, Error> {
        let key = self.key_for(case_key);
        let scope = &self.settings.scope;

        self.backend.seed(scope, &key)?;
        match self.backend.get(scope, &key, locale)? {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Ok(key),
        }
    }
}

/// A [`TranslationBackend`] held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    entries: Mutex<HashMap<String, BTreeMap<String, String>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_key(scope: &str, key: &str) -> String {
        format!("{}\u{1f}{}", scope, key)
    }

    /// Stores a translation of `key` for `locale`.
    pub fn set(&self, scope: &str, key: &str, locale: &str, text: &str) -> Result<(), Error> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::backend_error("in-memory backend lock poisoned"))?;
        entries
            .entry(Self::entry_key(scope, key))
            .or_default()
            .insert(locale.to_string(), text.to_string());
        Ok(())
    }

    /// Whether `key` has been seeded or set in `scope`.
    pub fn contains(&self, scope: &str, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(&Self::entry_key(scope, key)))
            .unwrap_or(false)
    }
}

impl TranslationBackend for InMemoryBackend {
    fn get(&self, scope: &str, key: &str, locale: &str) -> Result<Option<String>, Error> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::backend_error("in-memory backend lock poisoned"))?;
        Ok(entries
            .get(&Self::entry_key(scope, key))
            .and_then(|locales| locales.get(locale))
            .cloned())
    }

    fn seed(&self, scope: &str, key: &str) -> Result<(), Error> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::backend_error("in-memory backend lock poisoned"))?;
        entries.entry(Self::entry_key(scope, key)).or_default();
        Ok(())
    }
}

/// Named translator drivers.
///
/// `file` is always available. `key-value` is available once a backend has
/// been attached with [`TranslatorRegistry::with_backend`]. Applications may
/// register further drivers with [`TranslatorRegistry::extend`].
#[derive(Default)]
pub struct TranslatorRegistry {
    drivers: HashMap<String, Arc<dyn Translator>>,
    backend: Option<Arc<dyn TranslationBackend>>,
}

impl TranslatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: Arc<dyn TranslationBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Registers a driver under `name`, replacing any previous one.
    pub fn extend(&mut self, name: impl Into<String>, translator: Arc<dyn Translator>) {
        self.drivers.insert(name.into(), translator);
    }

    /// Resolves the driver named in `config.translations.driver`.
    pub fn resolve(&self, config: &Config) -> Result<Arc<dyn Translator>, Error> {
        let name = config.translations.driver.as_str();
        if let Some(translator) = self.drivers.get(name) {
            return Ok(Arc::clone(translator));
        }

        match name {
            FILE_DRIVER => Ok(Arc::new(FileTranslator::new(config.translations.clone()))),
            KEY_VALUE_DRIVER => match &self.backend {
                Some(backend) => Ok(Arc::new(KeyValueTranslator::new(
                    Arc::clone(backend),
                    config.translations.clone(),
                ))),
                None => Err(Error::UnknownDriver(name.to_string())),
            },
            other => Err(Error::UnknownDriver(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::MessageStore, types::Catalog};
    use tempfile::TempDir;

    fn settings(dir: &TempDir) -> TranslationSettings {
        TranslationSettings {
            base_path: dir.path().to_path_buf(),
            locales: vec!["en".to_string(), "uz".to_string()],
            ..TranslationSettings::default()
        }
    }

    #[test]
    fn test_file_translator_reads_catalog() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        let store = MessageStore::from_settings(&settings);
        let catalog: Catalog = [("forbidden", "Taqiqlangan")].into_iter().collect();
        MessageStore::write(&store.locator("main", "uz"), &catalog).unwrap();

        let translator = FileTranslator::new(settings);
        assert_eq!(translator.translate("main", "forbidden", "uz").unwrap(), "Taqiqlangan");
    }

    #[test]
    fn test_file_translator_uses_fallback_locale_then_pattern() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        let store = MessageStore::from_settings(&settings);
        let catalog: Catalog = [("forbidden", "Forbidden!")].into_iter().collect();
        MessageStore::write(&store.locator("main", "en"), &catalog).unwrap();

        let translator = FileTranslator::new(settings);
        assert_eq!(translator.translate("main", "forbidden", "uz").unwrap(), "Forbidden!");
        assert_eq!(
            translator.translate("main", "not_found", "uz").unwrap(),
            "Not found error occurred."
        );
    }

    #[test]
    fn test_key_value_translator_seeds_and_falls_back() {
        let backend = Arc::new(InMemoryBackend::new());
        let translator =
            KeyValueTranslator::new(backend.clone(), TranslationSettings::default());

        let text = translator.translate("user", "user_not_found", "uz").unwrap();
        assert_eq!(text, "User not found error occurred.");
        assert!(backend.contains("exceptions", "User not found error occurred."));

        backend
            .set("exceptions", "User not found error occurred.", "uz", "Foydalanuvchi topilmadi.")
            .unwrap();
        assert_eq!(
            translator.translate("user", "user_not_found", "uz").unwrap(),
            "Foydalanuvchi topilmadi."
        );
    }

    #[test]
    fn test_registry_resolves_drivers() {
        let mut config = Config::default();
        let registry = TranslatorRegistry::new();
        assert!(registry.resolve(&config).is_ok());

        config.translations.driver = KEY_VALUE_DRIVER.to_string();
        assert!(matches!(
            registry.resolve(&config),
            Err(Error::UnknownDriver(name)) if name == "key-value"
        ));

        let registry = TranslatorRegistry::new().with_backend(Arc::new(InMemoryBackend::new()));
        assert!(registry.resolve(&config).is_ok());

        config.translations.driver = "redis".to_string();
        assert!(registry.resolve(&config).is_err());
    }

    struct Fixed;

    impl Translator for Fixed {
        fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, Error> {
            Ok("fixed".to_string())
        }
    }

    #[test]
    fn test_registry_extend_overrides_builtin_names() {
        let mut registry = TranslatorRegistry::new();
        registry.extend(FILE_DRIVER, Arc::new(Fixed));
        let translator = registry.resolve(&Config::default()).unwrap();
        assert_eq!(translator.translate("main", "x", "en").unwrap(), "fixed");
    }
}
