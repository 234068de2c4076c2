use crate::{error::Error, types::CodeGroup};

/// A source of response-code groups.
pub trait CaseProvider {
    /// Names of every group this provider knows, in a stable order.
    fn list_groups(&self) -> Result<Vec<String>, Error>;

    /// Loads one group by name.
    fn load_group(&self, name: &str) -> Result<CodeGroup, Error>;

    /// Loads every group, keeping each group's own result.
    fn load_all(&self) -> Result<Vec<(String, Result<CodeGroup, Error>)>, Error> {
        Ok(self
            .list_groups()?
            .into_iter()
            .map(|name| {
                let group = self.load_group(&name);
                (name, group)
            })
            .collect())
    }
}

/// Resolves the message of a case in a locale.
pub trait Translator: Send + Sync {
    fn translate(&self, group_key: &str, case_key: &str, locale: &str) -> Result<String, Error>;
}

/// An opaque key/value translation source, such as a database-backed
/// translation table.
pub trait TranslationBackend: Send + Sync {
    /// Returns the stored text for `key` in `locale`, if there is one.
    fn get(&self, scope: &str, key: &str, locale: &str) -> Result<Option<String>, Error>;

    /// Registers `key` so translators can fill it in later. Must be idempotent.
    fn seed(&self, scope: &str, key: &str) -> Result<(), Error>;
}
