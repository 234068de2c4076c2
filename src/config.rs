//! Runtime configuration.
//!
//! A [`Config`] is built once (from defaults, JSON or the CLI's TOML file) and
//! then shared read-only, usually as `Arc<Config>`. Every field has a default,
//! so partial documents are accepted.

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    catalog::Layout,
    error::Error,
    key::{DEFAULT_GROUP_SUFFIX, humanize},
    types::ErrorCode,
};

/// Pattern used when neither the requested nor the fallback locale has one.
pub const DEFAULT_PATTERN: &str = ":readable error occurred.";

/// Name of the template that is always available.
pub const DEFAULT_TEMPLATE: &str = "default";

/// How the HTTP status of a native failure is inferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusInference {
    /// Map well-known failure kinds to their status.
    #[default]
    KindTable,
    /// Use the failure's self-reported status, then its numeric code when that
    /// looks like a 4xx/5xx status.
    CarriedCode,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_error_code: ErrorCode,
    /// `Some(true)` always shows debug meta, `Some(false)` never does,
    /// `None` defers to `app_debug`.
    pub force_debug_meta: Option<bool>,
    pub app_debug: bool,
    pub exception_status: StatusInference,
    pub response: ResponseSettings,
    pub cases: CaseSettings,
    pub translations: TranslationSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_error_code: ErrorCode::Int(-1),
            force_debug_meta: None,
            app_debug: false,
            exception_status: StatusInference::default(),
            response: ResponseSettings::default(),
            cases: CaseSettings::default(),
            translations: TranslationSettings::default(),
        }
    }
}

impl Config {
    pub fn from_json_str(source: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(source)?)
    }

    /// Whether debug meta may be attached to responses.
    pub fn show_debug_meta(&self) -> bool {
        self.force_debug_meta.unwrap_or(self.app_debug)
    }

    /// The configured default code, never empty.
    pub fn default_code(&self) -> ErrorCode {
        if self.default_error_code.is_empty() {
            ErrorCode::Int(-1)
        } else {
            self.default_error_code.clone().normalized()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseSettings {
    /// Name of the active template.
    pub template: String,
    /// Extra templates by name. A `default` entry here replaces the built-in one.
    pub templates: BTreeMap<String, Value>,
}

impl Default for ResponseSettings {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            templates: BTreeMap::new(),
        }
    }
}

impl ResponseSettings {
    /// Looks a template up by name, consulting the built-in `default` last.
    pub fn template(&self, name: &str) -> Option<Value> {
        match self.templates.get(name) {
            Some(template) => Some(template.clone()),
            None if name == DEFAULT_TEMPLATE => Some(default_template()),
            None => None,
        }
    }
}

/// The built-in template, matching the documented wire contract.
pub fn default_template() -> Value {
    json!({
        "success": ":success",
        "data": ":data",
        "error": {
            "message": ":message",
            "code": ":code",
        },
        "meta": ":meta",
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CaseSettings {
    /// Directory holding one JSON manifest per group.
    pub dir: PathBuf,
    /// Suffix stripped from group names when deriving their catalog key.
    pub suffix: String,
}

impl Default for CaseSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("respcodes"),
            suffix: DEFAULT_GROUP_SUFFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationSettings {
    /// Registered translator name: `file` or `key-value`.
    pub driver: String,
    pub base_path: PathBuf,
    pub layout: Layout,
    /// Older layouts migrated into `layout` whenever a catalog is opened.
    pub legacy_layouts: Vec<Layout>,
    pub locales: Vec<String>,
    pub locale_fallback: String,
    /// Default-message pattern per locale; `:readable` is replaced by the
    /// humanized case key.
    pub patterns: BTreeMap<String, String>,
    /// Scope passed to key/value translation backends.
    pub scope: String,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            driver: "file".to_string(),
            base_path: PathBuf::from("lang/vendor/respcode"),
            layout: Layout::LocaleDir,
            legacy_layouts: vec![Layout::GroupDir],
            locales: vec!["en".to_string()],
            locale_fallback: "en".to_string(),
            patterns: BTreeMap::from([("en".to_string(), DEFAULT_PATTERN.to_string())]),
            scope: "exceptions".to_string(),
        }
    }
}

impl TranslationSettings {
    /// Pattern for `locale`, then for the fallback locale, then the hardcoded one.
    pub fn pattern(&self, locale: &str) -> &str {
        self.patterns
            .get(locale)
            .or_else(|| self.patterns.get(&self.locale_fallback))
            .map(String::as_str)
            .unwrap_or(DEFAULT_PATTERN)
    }

    /// Default message for a case key in `locale`.
    pub fn default_message(&self, case_key: &str, locale: &str) -> String {
        self.pattern(locale)
            .replace(":readable", &humanize(case_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_code(), ErrorCode::Int(-1));
        assert_eq!(config.response.template, "default");
        assert_eq!(config.translations.layout, Layout::LocaleDir);
        assert_eq!(config.translations.legacy_layouts, vec![Layout::GroupDir]);
        assert!(!config.show_debug_meta());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json_str(
            r#"{"default_error_code": "E_UNKNOWN", "translations": {"locales": ["en", "uz"]}}"#,
        )
        .unwrap();
        assert_eq!(config.default_code(), ErrorCode::Text("E_UNKNOWN".to_string()));
        assert_eq!(config.translations.locales, vec!["en", "uz"]);
        assert_eq!(config.translations.driver, "file");
        assert_eq!(config.cases.suffix, "RespCode");
    }

    #[test]
    fn test_empty_default_code_falls_back() {
        let config = Config {
            default_error_code: ErrorCode::Text(String::new()),
            ..Config::default()
        };
        assert_eq!(config.default_code(), ErrorCode::Int(-1));
    }

    #[test]
    fn test_debug_visibility() {
        let mut config = Config {
            app_debug: true,
            ..Config::default()
        };
        assert!(config.show_debug_meta());

        config.force_debug_meta = Some(false);
        assert!(!config.show_debug_meta());

        config.app_debug = false;
        config.force_debug_meta = Some(true);
        assert!(config.show_debug_meta());
    }

    #[test]
    fn test_layout_names() {
        let config = Config::from_json_str(
            r#"{"translations": {"layout": "locale-file", "legacy_layouts": ["group-dir", "locale-dir"]}}"#,
        )
        .unwrap();
        assert_eq!(config.translations.layout, Layout::LocaleFile);
        assert_eq!(
            config.translations.legacy_layouts,
            vec![Layout::GroupDir, Layout::LocaleDir]
        );
        assert!(Config::from_json_str(r#"{"translations": {"layout": "flat"}}"#).is_err());
    }

    #[test]
    fn test_pattern_lookup_order() {
        let mut settings = TranslationSettings::default();
        settings
            .patterns
            .insert("uz".to_string(), ":readable xatosi yuz berdi.".to_string());

        assert_eq!(settings.pattern("uz"), ":readable xatosi yuz berdi.");
        assert_eq!(settings.pattern("fr"), DEFAULT_PATTERN);

        settings.patterns.clear();
        assert_eq!(settings.pattern("en"), DEFAULT_PATTERN);
    }

    #[test]
    fn test_default_message() {
        let settings = TranslationSettings::default();
        assert_eq!(
            settings.default_message("app_version_outdated", "en"),
            "App version outdated error occurred."
        );
    }

    #[test]
    fn test_template_lookup() {
        let mut response = ResponseSettings::default();
        assert_eq!(response.template("default"), Some(default_template()));
        assert_eq!(response.template("compact"), None);

        response
            .templates
            .insert("compact".to_string(), json!({"ok": ":success"}));
        assert_eq!(response.template("compact"), Some(json!({"ok": ":success"})));
    }

    #[test]
    fn test_status_inference_names() {
        let config = Config::from_json_str(r#"{"exception_status": "carried-code"}"#).unwrap();
        assert_eq!(config.exception_status, StatusInference::CarriedCode);
    }
}
