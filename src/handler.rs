//! Builds API error responses: normalize, log, render.

use std::{
    collections::BTreeMap,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::{
    config::Config,
    error::Error,
    normalize::{
        DEFAULT_HTTP_STATUS, ErrorInput, NormalizedError, Normalizer, Overrides,
        UNEXPECTED_ERROR_MESSAGE,
    },
    render::{RenderVars, ResponseRenderer, minimal},
    traits::Translator,
    translate::TranslatorRegistry,
    types::ErrorCode,
};

pub const VALIDATION_MESSAGE: &str = "Validation error";
pub const VALIDATION_CODE: u32 = 1002;
pub const MAINTENANCE_MESSAGE: &str = "Server is under maintenance.";
pub const MAINTENANCE_CODE: u32 = 503;

/// An HTTP status and the JSON body to send with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Clone)]
pub struct ErrorHandler {
    config: Arc<Config>,
    normalizer: Normalizer,
    locale: String,
}

impl ErrorHandler {
    pub fn new(config: Arc<Config>, translator: Arc<dyn Translator>) -> Self {
        let locale = config.translations.locale_fallback.clone();
        Self {
            normalizer: Normalizer::new(Arc::clone(&config), translator),
            config,
            locale,
        }
    }

    /// Uses the translator driver named in `config`.
    pub fn from_registry(config: Arc<Config>, registry: &TranslatorRegistry) -> Result<Self, Error> {
        let translator = registry.resolve(&config)?;
        Ok(Self::new(config, translator))
    }

    /// Locale used to translate typed cases.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn normalize(&self, input: impl Into<ErrorInput>, overrides: &Overrides) -> NormalizedError {
        self.normalizer.normalize(input.into(), overrides, &self.locale)
    }

    /// Normalizes and renders `input`.
    ///
    /// Never panics: if anything goes wrong while handling, the minimal shape
    /// with a generic message, the default code and status 500 is returned.
    pub fn handle(&self, input: impl Into<ErrorInput>, overrides: &Overrides) -> ApiResponse {
        let input = input.into();
        let carries_context = input.carries_context();

        let handled = catch_unwind(AssertUnwindSafe(|| {
            let normalized = self.normalizer.normalize(input, overrides, &self.locale);
            if carries_context {
                error!(
                    message = %normalized.message,
                    code = %normalized.code,
                    status = normalized.http_status,
                    file = normalized.debug.as_ref().map(|d| d.file.as_str()).unwrap_or(""),
                    "request failed"
                );
            }
            self.render(&normalized)
        }));

        handled.unwrap_or_else(|_| {
            error!("error handler failed, returning fallback response");
            self.fallback()
        })
    }

    /// Renders an already normalized error with the active template.
    pub fn render(&self, normalized: &NormalizedError) -> ApiResponse {
        let vars = RenderVars::from(normalized);
        let body = ResponseRenderer::new(&self.config.response)
            .render_active(&vars, self.config.show_debug_meta());
        ApiResponse {
            status: normalized.http_status,
            body,
        }
    }

    /// 422 response listing the first message of every invalid field.
    pub fn validation_response(&self, errors: &BTreeMap<String, Vec<String>>) -> ApiResponse {
        let first_messages: Map<String, Value> = errors
            .iter()
            .filter_map(|(field, messages)| {
                messages
                    .first()
                    .map(|message| (field.clone(), Value::String(message.clone())))
            })
            .collect();

        let mut meta = Map::new();
        meta.insert("validation_errors".to_string(), Value::Object(first_messages));

        let vars = RenderVars::new(VALIDATION_MESSAGE, ErrorCode::from(VALIDATION_CODE))
            .with_meta(Value::Object(meta));
        ApiResponse {
            status: 422,
            body: ResponseRenderer::new(&self.config.response).render_active(&vars, true),
        }
    }

    /// 503 response for maintenance mode.
    pub fn maintenance_response(&self) -> ApiResponse {
        let vars = RenderVars::new(MAINTENANCE_MESSAGE, ErrorCode::from(MAINTENANCE_CODE));
        ApiResponse {
            status: 503,
            body: ResponseRenderer::new(&self.config.response).render_active(&vars, false),
        }
    }

    fn fallback(&self) -> ApiResponse {
        let vars = RenderVars::new(UNEXPECTED_ERROR_MESSAGE, self.config.default_code());
        ApiResponse {
            status: DEFAULT_HTTP_STATUS,
            body: minimal(&vars, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builtin::main_group,
        key::DEFAULT_GROUP_SUFFIX,
        normalize::{ErrorResponse, Failure, FailureKind},
    };
    use serde_json::json;

    struct Panicking;

    impl Translator for Panicking {
        fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, Error> {
            panic!("translator exploded")
        }
    }

    struct Pattern(Config);

    impl Translator for Pattern {
        fn translate(&self, _: &str, case_key: &str, locale: &str) -> Result<String, Error> {
            Ok(self.0.translations.default_message(case_key, locale))
        }
    }

    fn handler(config: Config) -> ErrorHandler {
        let translator = Arc::new(Pattern(config.clone()));
        ErrorHandler::new(Arc::new(config), translator)
    }

    #[test]
    fn test_handle_text() {
        let response = handler(Config::default()).handle("Custom error", &Overrides::code(1001));
        assert_eq!(response.status, 500);
        assert_eq!(
            response.body,
            json!({"success": false, "data": null, "error": {"message": "Custom error", "code": 1001}})
        );
    }

    #[test]
    fn test_handle_typed_case() {
        let case = main_group()
            .case("AppVersionOutdated", DEFAULT_GROUP_SUFFIX)
            .unwrap();
        let response = handler(Config::default()).handle(case, &Overrides::none());
        assert_eq!(response.status, 426);
        assert_eq!(response.body["error"]["code"], json!(426));
        assert_eq!(
            response.body["error"]["message"],
            json!("App version outdated error occurred.")
        );
    }

    #[test]
    fn test_handle_shows_meta_only_in_debug() {
        let raised = ErrorResponse::new("Order locked").with_http_status(423);

        let response = handler(Config::default()).handle(raised.clone(), &Overrides::none());
        assert!(response.body.get("meta").is_none());

        let debug = Config {
            app_debug: true,
            ..Config::default()
        };
        let response = handler(debug).handle(raised, &Overrides::none());
        assert_eq!(response.status, 423);
        assert!(response.body["meta"]["file"].as_str().is_some_and(|f| f.ends_with("handler.rs")));
    }

    #[test]
    fn test_handle_failure() {
        let failure = Failure::new(FailureKind::NotFound, "No query results");
        let response = handler(Config::default()).handle(failure, &Overrides::none());
        assert_eq!(response.status, 404);
        assert_eq!(response.body["error"]["code"], json!(-1));
    }

    #[test]
    fn test_handle_recovers_from_panics() {
        let handler = ErrorHandler::new(Arc::new(Config::default()), Arc::new(Panicking));
        let case = main_group().case("NotFound", DEFAULT_GROUP_SUFFIX).unwrap();
        let response = handler.handle(case, &Overrides::none());
        assert_eq!(response.status, 500);
        assert_eq!(
            response.body,
            json!({"success": false, "data": null, "error": {"message": "Unexpected server error", "code": -1}})
        );
    }

    #[test]
    fn test_validation_response() {
        let mut errors = BTreeMap::new();
        errors.insert(
            "email".to_string(),
            vec!["The email field is required.".to_string(), "second".to_string()],
        );
        errors.insert("name".to_string(), Vec::new());

        let response = handler(Config::default()).validation_response(&errors);
        assert_eq!(response.status, 422);
        assert_eq!(response.body["error"]["code"], json!(1002));
        assert_eq!(
            response.body["meta"]["validation_errors"],
            json!({"email": "The email field is required."})
        );
    }

    #[test]
    fn test_maintenance_response() {
        let response = handler(Config::default()).maintenance_response();
        assert_eq!(response.status, 503);
        assert_eq!(response.body["error"]["message"], json!(MAINTENANCE_MESSAGE));
        assert_eq!(response.body["error"]["code"], json!(503));
    }

    #[test]
    fn test_from_registry_rejects_unknown_driver() {
        let config = Config {
            translations: crate::config::TranslationSettings {
                driver: "redis".to_string(),
                ..Default::default()
            },
            ..Config::default()
        };
        let result = ErrorHandler::from_registry(Arc::new(config), &TranslatorRegistry::new());
        assert!(matches!(result, Err(Error::UnknownDriver(_))));
    }
}
