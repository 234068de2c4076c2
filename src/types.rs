//! Core types for respcode.
//! Providers decode into these; the sync engine and the normalizer consume them.

use std::{collections::BTreeMap, fmt::Display};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    key::{case_key, group_key},
};

lazy_static! {
    static ref CASE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap();
}

/// Returns true when `name` is usable as a response-code case name.
pub fn is_valid_case_name(name: &str) -> bool {
    CASE_NAME_REGEX.is_match(name)
}

/// A single named, integer-valued response code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ResponseCode {
    /// Stable programmatic name (e.g. `UserNotFound`).
    pub name: String,

    /// Numeric code sent to API clients.
    pub code: u32,

    /// HTTP status this case answers with, when it declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub http_status: Option<u16>,

    /// Declared default message, used instead of the pattern text when asked.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub message: Option<String>,
}

impl ResponseCode {
    pub fn new(name: impl Into<String>, code: u32) -> Self {
        Self {
            name: name.into(),
            code,
            http_status: None,
            message: None,
        }
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The catalog lookup key of this case.
    pub fn key(&self) -> String {
        case_key(&self.name)
    }
}

impl Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.name, self.code)
    }
}

/// Serialized shape of a group manifest, validated into a [`CodeGroup`].
#[derive(Debug, Clone, Deserialize)]
struct GroupManifest {
    name: String,
    #[serde(default)]
    cases: Vec<ResponseCode>,
}

/// A named, ordered collection of response codes belonging to one feature area.
///
/// Declaration order is kept; it is the default iteration and display order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "GroupManifest")]
pub struct CodeGroup {
    name: String,
    cases: Vec<ResponseCode>,
}

impl CodeGroup {
    /// Builds a group, rejecting invalid or duplicate case names.
    pub fn new(name: impl Into<String>, cases: Vec<ResponseCode>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let mut seen = std::collections::HashSet::new();
        for case in &cases {
            if !is_valid_case_name(&case.name) {
                return Err(ValidationError::InvalidCaseName(case.name.clone()));
            }
            if !seen.insert(case.name.as_str()) {
                return Err(ValidationError::DuplicateCase(case.name.clone()));
            }
        }

        Ok(Self { name, cases })
    }

    /// Builds a group whose cases are known to be valid at compile time.
    pub(crate) fn from_trusted(name: &str, cases: Vec<ResponseCode>) -> Self {
        Self {
            name: name.to_string(),
            cases,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Catalog identifier of the group (`MainRespCode` → `main`).
    pub fn key(&self, suffix: &str) -> String {
        group_key(&self.name, suffix)
    }

    pub fn cases(&self) -> &[ResponseCode] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&ResponseCode> {
        self.cases.iter().find(|c| c.name == name)
    }

    /// Returns an owned, group-qualified handle for `name`, ready to be raised.
    pub fn case(&self, name: &str, suffix: &str) -> Option<TypedCase> {
        self.find(name).map(|code| TypedCase {
            group_key: self.key(suffix),
            code: code.clone(),
        })
    }
}

impl TryFrom<GroupManifest> for CodeGroup {
    type Error = ValidationError;

    fn try_from(manifest: GroupManifest) -> Result<Self, Self::Error> {
        CodeGroup::new(manifest.name, manifest.cases)
    }
}

/// A response code qualified by the catalog key of its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedCase {
    pub group_key: String,
    pub code: ResponseCode,
}

impl TypedCase {
    pub fn new(group_key: impl Into<String>, code: ResponseCode) -> Self {
        Self {
            group_key: group_key.into(),
            code,
        }
    }

    pub fn case_key(&self) -> String {
        self.code.key()
    }
}

/// An error code as sent to clients: an integer, or free text when the
/// caller supplied a non-numeric code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Int(i64),
    Text(String),
}

impl ErrorCode {
    /// Turns numeric-looking text into an integer; everything else is kept.
    pub fn normalized(self) -> Self {
        match self {
            ErrorCode::Text(text) => match text.trim().parse::<i64>() {
                Ok(value) => ErrorCode::Int(value),
                Err(_) => ErrorCode::Text(text),
            },
            int => int,
        }
    }

    /// True for an empty text code, which callers treat as absent.
    pub fn is_empty(&self) -> bool {
        matches!(self, ErrorCode::Text(text) if text.is_empty())
    }

    /// Reads a code out of an arbitrary JSON value. `null` means absent.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .map(ErrorCode::Int),
            serde_json::Value::String(s) => Some(ErrorCode::Text(s.clone())),
            other => Some(ErrorCode::Text(other.to_string())),
        }
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Int(-1)
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Int(value) => write!(f, "{}", value),
            ErrorCode::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(value: i64) -> Self {
        ErrorCode::Int(value)
    }
}

impl From<i32> for ErrorCode {
    fn from(value: i32) -> Self {
        ErrorCode::Int(i64::from(value))
    }
}

impl From<u32> for ErrorCode {
    fn from(value: u32) -> Self {
        ErrorCode::Int(i64::from(value))
    }
}

impl From<&str> for ErrorCode {
    fn from(value: &str) -> Self {
        ErrorCode::Text(value.to_string()).normalized()
    }
}

impl From<String> for ErrorCode {
    fn from(value: String) -> Self {
        ErrorCode::Text(value).normalized()
    }
}

/// Message text for one `(group, locale)` pair, keyed by case key.
///
/// Keys are always iterated and serialized in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), message.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.entries
    }
}

impl From<BTreeMap<String, String>> for Catalog {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_name_validation() {
        assert!(is_valid_case_name("UserNotFound"));
        assert!(is_valid_case_name("user_not_found_2"));
        assert!(!is_valid_case_name("2User"));
        assert!(!is_valid_case_name("_User"));
        assert!(!is_valid_case_name("User-Not"));
        assert!(!is_valid_case_name(""));
    }

    #[test]
    fn test_code_group_rejects_duplicates() {
        let result = CodeGroup::new(
            "Main",
            vec![ResponseCode::new("NotFound", 404), ResponseCode::new("NotFound", 405)],
        );
        assert_eq!(result, Err(ValidationError::DuplicateCase("NotFound".to_string())));
    }

    #[test]
    fn test_code_group_rejects_invalid_name() {
        let result = CodeGroup::new("Main", vec![ResponseCode::new("not found", 404)]);
        assert!(matches!(result, Err(ValidationError::InvalidCaseName(_))));
    }

    #[test]
    fn test_code_group_keeps_declaration_order() {
        let group = CodeGroup::new(
            "UserRespCode",
            vec![
                ResponseCode::new("UserNotFound", 3000),
                ResponseCode::new("AccountLocked", 2000),
            ],
        )
        .unwrap();
        let names: Vec<_> = group.cases().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["UserNotFound", "AccountLocked"]);
        assert_eq!(group.key("RespCode"), "user");
    }

    #[test]
    fn test_code_group_manifest_deserialization_validates() {
        let json = r#"{"name": "Main", "cases": [{"name": "9Bad", "code": 1}]}"#;
        assert!(serde_json::from_str::<CodeGroup>(json).is_err());

        let json = r#"{"name": "Main", "cases": [{"name": "Good", "code": 1, "http_status": 400}]}"#;
        let group: CodeGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.find("Good").unwrap().http_status, Some(400));
    }

    #[test]
    fn test_typed_case_from_group() {
        let group = CodeGroup::new("Main", vec![ResponseCode::new("AppMissingHeaders", 1000)]).unwrap();
        let case = group.case("AppMissingHeaders", "RespCode").unwrap();
        assert_eq!(case.group_key, "main");
        assert_eq!(case.case_key(), "app_missing_headers");
        assert!(group.case("Missing", "RespCode").is_none());
    }

    #[test]
    fn test_error_code_normalization() {
        assert_eq!(ErrorCode::from("1001"), ErrorCode::Int(1001));
        assert_eq!(ErrorCode::from(" 42 "), ErrorCode::Int(42));
        assert_eq!(ErrorCode::from("E_AUTH"), ErrorCode::Text("E_AUTH".to_string()));
        assert!(ErrorCode::Text(String::new()).is_empty());
        assert!(!ErrorCode::Int(0).is_empty());
    }

    #[test]
    fn test_error_code_serialization() {
        assert_eq!(serde_json::to_string(&ErrorCode::Int(1001)).unwrap(), "1001");
        assert_eq!(
            serde_json::to_string(&ErrorCode::Text("E1".to_string())).unwrap(),
            "\"E1\""
        );
    }

    #[test]
    fn test_error_code_from_value() {
        assert_eq!(ErrorCode::from_value(&serde_json::json!(null)), None);
        assert_eq!(ErrorCode::from_value(&serde_json::json!(7)), Some(ErrorCode::Int(7)));
        assert_eq!(
            ErrorCode::from_value(&serde_json::json!("x")),
            Some(ErrorCode::Text("x".to_string()))
        );
    }

    #[test]
    fn test_catalog_empty_message_is_still_a_key() {
        let mut catalog = Catalog::new();
        catalog.insert("a", "");
        catalog.insert("b", "B");
        assert!(catalog.contains_key("a"));
        assert_eq!(catalog.get("a"), Some(""));
        assert!(!catalog.contains_key("c"));
    }

    #[test]
    fn test_catalog_sorted_serialization() {
        let catalog: Catalog = vec![("zeta", "Z"), ("alpha", "A")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&catalog).unwrap(),
            r#"{"alpha":"A","zeta":"Z"}"#
        );
    }
}
