//! Keeps message catalogs populated for every case of every group.
//!
//! Sync only ever adds: a key that is already present is never rewritten,
//! even when its message is empty, so human edits survive any number of runs.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use unic_langid::LanguageIdentifier;

use crate::{
    catalog::{MessageStore, merge_missing},
    config::{Config, TranslationSettings},
    error::{Error, ValidationError},
    traits::CaseProvider,
    types::CodeGroup,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    /// Seed new keys with the case's declared message when it has one.
    pub prefer_declared_messages: bool,
    /// Compute the report without writing or migrating anything.
    pub dry_run: bool,
}

/// Outcome of syncing one group across its locales.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Catalog key of the group (e.g. `main`).
    pub group: String,
    pub total_cases: usize,
    /// Keys filled in, summed over all locales.
    pub added: usize,
    /// Keys that already had a message, summed over all locales.
    pub already_present: usize,
    /// Every catalog location that was considered.
    pub touched: Vec<String>,
    /// Catalog locations whose content changed on disk.
    pub written: Vec<String>,
}

/// One group that could not be synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFailure {
    pub group: String,
    pub reason: String,
}

/// Outcome of syncing every group of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub reports: Vec<SyncReport>,
    pub failures: Vec<GroupFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn added(&self) -> usize {
        self.reports.iter().map(|r| r.added).sum()
    }

    pub fn already_present(&self) -> usize {
        self.reports.iter().map(|r| r.already_present).sum()
    }
}

/// Drives [`MessageStore`] for whole groups.
#[derive(Debug, Clone)]
pub struct TranslationSync {
    store: MessageStore,
    settings: TranslationSettings,
    suffix: String,
}

impl TranslationSync {
    pub fn new(store: MessageStore, settings: TranslationSettings, suffix: impl Into<String>) -> Self {
        Self {
            store,
            settings,
            suffix: suffix.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            MessageStore::from_settings(&config.translations),
            config.translations.clone(),
            config.cases.suffix.clone(),
        )
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Ensures every case of `group` has a message in each of `locales`.
    ///
    /// Every locale is checked before any catalog is read or written.
    pub fn sync(
        &self,
        group: &CodeGroup,
        locales: &[String],
        options: &SyncOptions,
    ) -> Result<SyncReport, Error> {
        check_locales(locales)?;
        let group_key = group.key(&self.suffix);
        let keys: Vec<String> = group.cases().iter().map(|c| c.key()).collect();

        let mut report = SyncReport {
            group: group_key.clone(),
            total_cases: keys.len(),
            ..SyncReport::default()
        };

        for locale in locales {
            let locator = self.store.locator(&group_key, locale);
            let existing = if options.dry_run {
                self.store.lookup(&group_key, locale)
            } else {
                self.store.open(&group_key, locale)?
            };

            let (merged, added) = merge_missing(&existing, &keys, |key| {
                self.default_message(group, key, locale, options)
            });
            report.added += added;
            report.already_present += keys.len() - added;
            report.touched.push(locator.to_string());

            if options.dry_run {
                debug!(catalog = %locator, added, "dry run, not writing");
                continue;
            }

            if MessageStore::write(&locator, &merged)? {
                report.written.push(locator.to_string());
            }
        }

        info!(
            group = %report.group,
            added = report.added,
            already_present = report.already_present,
            "synced translations"
        );
        Ok(report)
    }

    /// Syncs every group `provider` lists. A failing group is recorded and
    /// the remaining groups are still processed.
    pub fn sync_all(
        &self,
        provider: &dyn CaseProvider,
        locales: &[String],
        options: &SyncOptions,
    ) -> Result<BatchReport, Error> {
        check_locales(locales)?;
        let mut batch = BatchReport::default();

        for (name, group) in provider.load_all()? {
            let result = group.and_then(|group| self.sync(&group, locales, options));
            match result {
                Ok(report) => batch.reports.push(report),
                Err(e) => {
                    warn!(group = %name, error = %e, "group sync failed");
                    batch.failures.push(GroupFailure {
                        group: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(batch)
    }

    fn default_message(
        &self,
        group: &CodeGroup,
        key: &str,
        locale: &str,
        options: &SyncOptions,
    ) -> String {
        if options.prefer_declared_messages
            && let Some(message) = group
                .cases()
                .iter()
                .find(|c| c.key() == key)
                .and_then(|c| c.message.as_deref())
        {
            return message.to_string();
        }
        self.settings.default_message(key, locale)
    }
}

/// Locales become path segments, so anything that is not a language
/// identifier (`../x`, `en/admin`) is rejected.
fn check_locales(locales: &[String]) -> Result<(), ValidationError> {
    match locales.iter().find(|l| !is_valid_locale(l)) {
        Some(locale) => Err(ValidationError::InvalidLocale(locale.clone())),
        None => Ok(()),
    }
}

fn is_valid_locale(locale: &str) -> bool {
    !locale.is_empty() && locale.replace('_', "-").parse::<LanguageIdentifier>().is_ok()
}

/// Parses a comma-separated locale list.
///
/// Entries are trimmed and deduplicated; entries that are not valid BCP 47
/// language identifiers are dropped with a warning. When nothing usable is
/// left, `defaults` is returned.
pub fn normalize_locales(raw: Option<&str>, defaults: &[String]) -> Vec<String> {
    let mut locales: Vec<String> = Vec::new();

    for entry in raw.unwrap_or_default().split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if !is_valid_locale(entry) {
            warn!(locale = entry, "ignoring invalid locale");
            continue;
        }
        if !locales.iter().any(|l| l == entry) {
            locales.push(entry.to_string());
        }
    }

    if locales.is_empty() {
        defaults.to_vec()
    } else {
        locales
    }
}
