//! Turns any failure signal into a [`NormalizedError`].
//!
//! Inputs form the closed [`ErrorInput`] enum and are resolved by one
//! exhaustive match in [`Normalizer::normalize`]. Every branch produces a
//! message, a code and an HTTP status; none of them can fail.

use std::{fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{
    config::{Config, StatusInference},
    debug::{DebugContext, source_chain},
    traits::Translator,
    types::{ErrorCode, TypedCase},
};

pub const UNEXPECTED_ERROR_MESSAGE: &str = "Unexpected server error";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";
pub const DEFAULT_HTTP_STATUS: u16 = 500;

/// The canonical outcome of normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedError {
    pub message: String,
    pub code: ErrorCode,
    pub http_status: u16,
    pub debug: Option<DebugContext>,
}

/// Code and status supplied by the caller alongside the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub code: Option<ErrorCode>,
    pub http_status: Option<u16>,
}

impl Overrides {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn code(code: impl Into<ErrorCode>) -> Self {
        Self {
            code: Some(code.into()),
            http_status: None,
        }
    }

    /// Uses a typed case as the override: its value as code, its declared
    /// status (if any) as status.
    pub fn case(case: &TypedCase) -> Self {
        Self {
            code: Some(ErrorCode::from(case.code.code)),
            http_status: case.code.http_status,
        }
    }

    pub fn with_code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

/// Broad class of a native failure, used to infer its HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FailureKind {
    Authentication,
    Authorization,
    NotFound,
    MethodNotAllowed,
    TokenMismatch,
    RateLimited,
    Validation,
    #[default]
    Other,
}

impl FailureKind {
    pub fn status(&self) -> Option<u16> {
        match self {
            FailureKind::Authentication => Some(401),
            FailureKind::Authorization => Some(403),
            FailureKind::NotFound => Some(404),
            FailureKind::MethodNotAllowed => Some(405),
            FailureKind::TokenMismatch => Some(419),
            FailureKind::RateLimited => Some(429),
            FailureKind::Validation => Some(422),
            FailureKind::Other => None,
        }
    }
}

/// A native failure from the host application or a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    /// Code carried by the failure itself.
    pub code: Option<ErrorCode>,
    /// Status the failure reports for itself.
    pub status: Option<u16>,
    pub context: DebugContext,
}

impl Failure {
    #[track_caller]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            status: None,
            context: DebugContext::capture(),
        }
    }

    /// Wraps any error, recording its `source()` chain as the trace.
    #[track_caller]
    pub fn from_error(kind: FailureKind, error: &(dyn std::error::Error + 'static)) -> Self {
        Self {
            kind,
            message: error.to_string(),
            code: None,
            status: None,
            context: DebugContext::from_error(error),
        }
    }

    pub fn with_code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

/// What an [`ErrorResponse`] was raised with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    Text(String),
    Case(TypedCase),
}

/// An error raised on purpose by application code, carrying the code and
/// status it should answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    payload: ErrorPayload,
    code: Option<ErrorCode>,
    http_status: Option<u16>,
    context: DebugContext,
}

impl ErrorResponse {
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::raise(ErrorPayload::Text(message.into()))
    }

    #[track_caller]
    pub fn from_case(case: TypedCase) -> Self {
        Self::raise(ErrorPayload::Case(case))
    }

    /// Raises a message or a typed case, recording the caller's location.
    #[track_caller]
    pub fn raise(payload: impl Into<ErrorPayload>) -> Self {
        Self {
            payload: payload.into(),
            code: None,
            http_status: None,
            context: DebugContext::capture(),
        }
    }

    pub fn with_code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Records the `source()` chain of `cause` as the trace.
    pub fn with_cause(mut self, cause: &(dyn std::error::Error + 'static)) -> Self {
        self.context.trace = source_chain(cause);
        self
    }

    pub fn payload(&self) -> &ErrorPayload {
        &self.payload
    }

    pub fn context(&self) -> &DebugContext {
        &self.context
    }

    /// Explicit code, else the code of the case it was raised with.
    pub fn resolved_code(&self) -> Option<ErrorCode> {
        match (&self.code, &self.payload) {
            (Some(code), _) if !code.is_empty() => Some(code.clone()),
            (_, ErrorPayload::Case(case)) => Some(ErrorCode::from(case.code.code)),
            _ => None,
        }
    }

    /// Explicit status, else the declared status of its case.
    pub fn resolved_http_status(&self) -> Option<u16> {
        match &self.payload {
            _ if self.http_status.is_some_and(|s| s > 0) => self.http_status,
            ErrorPayload::Case(case) => case.code.http_status,
            ErrorPayload::Text(_) => None,
        }
    }
}

impl Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.payload {
            ErrorPayload::Text(message) => f.write_str(message),
            ErrorPayload::Case(case) => write!(f, "{}::{}", case.group_key, case.code.name),
        }
    }
}

impl std::error::Error for ErrorResponse {}

impl From<String> for ErrorPayload {
    fn from(message: String) -> Self {
        ErrorPayload::Text(message)
    }
}

impl From<&str> for ErrorPayload {
    fn from(message: &str) -> Self {
        ErrorPayload::Text(message.to_string())
    }
}

impl From<TypedCase> for ErrorPayload {
    fn from(case: TypedCase) -> Self {
        ErrorPayload::Case(case)
    }
}

#[track_caller]
fn raised(payload: ErrorPayload, code: Option<ErrorCode>) -> ErrorResponse {
    let error = ErrorResponse::raise(payload);
    match code {
        Some(code) => error.with_code(code),
        None => error,
    }
}

/// Returns `Err` with `payload` (a message or a typed case) when `condition`
/// holds. `code` overrides the code the response answers with.
#[track_caller]
pub fn error_if(
    condition: bool,
    payload: impl Into<ErrorPayload>,
    code: Option<ErrorCode>,
) -> Result<(), ErrorResponse> {
    if condition {
        Err(raised(payload.into(), code))
    } else {
        Ok(())
    }
}

/// Returns `Err` with `payload` unless `condition` holds.
#[track_caller]
pub fn error_unless(
    condition: bool,
    payload: impl Into<ErrorPayload>,
    code: Option<ErrorCode>,
) -> Result<(), ErrorResponse> {
    error_if(!condition, payload, code)
}

/// Builds the error now, at the caller's location, and hands it out later.
/// Fits `ok_or_else` and `unwrap_or_else` on the error path.
#[track_caller]
pub fn deferred_error(
    payload: impl Into<ErrorPayload>,
    code: Option<ErrorCode>,
) -> impl FnOnce() -> ErrorResponse {
    let error = raised(payload.into(), code);
    move || error
}

/// Every shape of failure the normalizer accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorInput {
    Case(TypedCase),
    Raised(ErrorResponse),
    Failure(Failure),
    /// `[message, code?, http_status?]`
    Parts(Vec<Value>),
    Text(String),
}

impl ErrorInput {
    /// Text input from raw bytes; invalid UTF-8 is replaced, never rejected.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        ErrorInput::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    /// True for the inputs that carry a raise location.
    pub fn carries_context(&self) -> bool {
        matches!(self, ErrorInput::Raised(_) | ErrorInput::Failure(_))
    }
}

impl From<TypedCase> for ErrorInput {
    fn from(case: TypedCase) -> Self {
        ErrorInput::Case(case)
    }
}

impl From<ErrorResponse> for ErrorInput {
    fn from(error: ErrorResponse) -> Self {
        ErrorInput::Raised(error)
    }
}

impl From<Failure> for ErrorInput {
    fn from(failure: Failure) -> Self {
        ErrorInput::Failure(failure)
    }
}

impl From<Vec<Value>> for ErrorInput {
    fn from(parts: Vec<Value>) -> Self {
        ErrorInput::Parts(parts)
    }
}

impl From<String> for ErrorInput {
    fn from(text: String) -> Self {
        ErrorInput::Text(text)
    }
}

impl From<&str> for ErrorInput {
    fn from(text: &str) -> Self {
        ErrorInput::Text(text.to_string())
    }
}

/// HTTP status implied by the hundreds digit of a code: 2xx..5xx map to
/// 200..500, anything else to 500.
pub fn status_from_magnitude(code: u32) -> u16 {
    match code / 100 {
        hundreds @ 2..=5 => (hundreds * 100) as u16,
        _ => DEFAULT_HTTP_STATUS,
    }
}

fn is_error_status(status: i64) -> bool {
    (400..=599).contains(&status)
}

#[derive(Clone)]
pub struct Normalizer {
    config: Arc<Config>,
    translator: Arc<dyn Translator>,
}

impl Normalizer {
    pub fn new(config: Arc<Config>, translator: Arc<dyn Translator>) -> Self {
        Self { config, translator }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn normalize(&self, input: ErrorInput, overrides: &Overrides, locale: &str) -> NormalizedError {
        let show_debug = self.config.show_debug_meta();

        let (message, code, http_status, debug) = match input {
            ErrorInput::Case(case) => {
                let message = self.case_message(&case, locale);
                let http = case
                    .code
                    .http_status
                    .or(overrides.http_status)
                    .unwrap_or_else(|| status_from_magnitude(case.code.code));
                (message, Some(ErrorCode::from(case.code.code)), Some(http), None)
            }
            ErrorInput::Raised(error) => {
                let message = match error.payload() {
                    ErrorPayload::Text(text) => text.clone(),
                    ErrorPayload::Case(case) => self.case_message(case, locale),
                };
                let code = error.resolved_code().or_else(|| overrides.code.clone());
                let http = error.resolved_http_status().or(overrides.http_status);
                (message, code, http, Some(error.context().clone()))
            }
            ErrorInput::Failure(failure) => {
                let message = if failure.message.is_empty() {
                    UNEXPECTED_ERROR_MESSAGE.to_string()
                } else {
                    failure.message.clone()
                };
                let code = overrides.code.clone().or_else(|| failure.code.clone());
                let http = overrides.http_status.or_else(|| self.failure_status(&failure));
                (message, code, http, Some(failure.context))
            }
            ErrorInput::Parts(parts) => {
                let message = match parts.first() {
                    None | Some(Value::Null) => UNKNOWN_ERROR_MESSAGE.to_string(),
                    Some(Value::String(text)) => text.clone(),
                    Some(other) => other.to_string(),
                };
                let code = parts
                    .get(1)
                    .and_then(ErrorCode::from_value)
                    .or_else(|| overrides.code.clone());
                let http = parts
                    .get(2)
                    .and_then(status_from_value)
                    .or(overrides.http_status);
                (message, code, http, None)
            }
            ErrorInput::Text(text) => (text, overrides.code.clone(), overrides.http_status, None),
        };

        NormalizedError {
            message,
            code: self.fallback_code(code),
            http_status: http_status.filter(|s| *s > 0).unwrap_or(DEFAULT_HTTP_STATUS),
            debug: debug.filter(|_| show_debug),
        }
    }

    fn case_message(&self, case: &TypedCase, locale: &str) -> String {
        let case_key = case.case_key();
        match self.translator.translate(&case.group_key, &case_key, locale) {
            Ok(message) if !message.is_empty() => message,
            Ok(_) => self.config.translations.default_message(&case_key, locale),
            Err(e) => {
                warn!(group = %case.group_key, case = %case_key, locale, error = %e, "translation failed, using default text");
                self.config.translations.default_message(&case_key, locale)
            }
        }
    }

    fn failure_status(&self, failure: &Failure) -> Option<u16> {
        let reported = failure.status.filter(|s| *s > 0);
        match self.config.exception_status {
            StatusInference::KindTable => failure.kind.status().or(reported),
            StatusInference::CarriedCode => reported.or_else(|| match &failure.code {
                Some(ErrorCode::Int(code)) if is_error_status(*code) => Some(*code as u16),
                _ => None,
            }),
        }
    }

    fn fallback_code(&self, code: Option<ErrorCode>) -> ErrorCode {
        match code {
            Some(code) if !code.is_empty() => code.normalized(),
            _ => self.config.default_code(),
        }
    }
}

fn status_from_value(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|s| u16::try_from(s).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
