//! Validation and persistence of new response-code groups.
//!
//! [`validate`] is pure: it turns raw user input into a [`GenerateRequest`]
//! or the first rule it violates. Nothing is written until it succeeds.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use crate::{
    catalog::write_if_changed,
    error::{Error, ValidationError},
    key::strip_suffix_ignore_case,
    types::{CodeGroup, ResponseCode, is_valid_case_name},
};

lazy_static! {
    static ref BASE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").unwrap();
}

/// Unvalidated input for a new group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGenerate {
    pub name: String,
    /// One `Name=Code` or `Name:Code` pair per entry.
    pub cases: Vec<String>,
}

impl RawGenerate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    /// Adds every pair of a comma-separated list.
    pub fn with_case_list(mut self, list: &str) -> Self {
        self.cases.extend(split_pairs(list));
        self
    }

    pub fn with_case(mut self, pair: impl Into<String>) -> Self {
        self.cases.push(pair.into());
        self
    }
}

/// Validated input, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Name without the suffix, first letter uppercase (`User`).
    pub base_name: String,
    pub group: CodeGroup,
}

/// Whether a manifest was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestOutcome {
    Created(PathBuf),
    Overwritten(PathBuf),
    /// A manifest already existed and `force` was not set.
    Skipped(PathBuf),
}

impl ManifestOutcome {
    pub fn path(&self) -> &Path {
        match self {
            ManifestOutcome::Created(path)
            | ManifestOutcome::Overwritten(path)
            | ManifestOutcome::Skipped(path) => path,
        }
    }
}

/// Splits a comma-separated pair list, dropping blank entries.
pub fn split_pairs(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(str::to_string)
        .collect()
}

/// Checks a group base name and normalizes it: the suffix is stripped and
/// the first letter uppercased (`userRespCode` → `User`).
pub fn validate_base_name(name: &str, suffix: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    let base = strip_suffix_ignore_case(trimmed, suffix);
    if !BASE_NAME_REGEX.is_match(base) {
        return Err(ValidationError::InvalidName(trimmed.to_string()));
    }

    let mut chars = base.chars();
    Ok(match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    })
}

/// Checks one case name and code.
pub fn validate_case(name: &str, code: &str) -> Result<ResponseCode, ValidationError> {
    let name = name.trim();
    let code = code.trim();
    if !is_valid_case_name(name) {
        return Err(ValidationError::InvalidCaseName(name.to_string()));
    }

    let value = code
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then(|| code.parse::<u32>().ok())
        .flatten()
        .ok_or_else(|| ValidationError::InvalidCode {
            case: name.to_string(),
            code: code.to_string(),
        })?;

    Ok(ResponseCode::new(name, value).with_http_status(http_status_for(value)))
}

/// Parses one `Name=Code` or `Name:Code` pair.
pub fn parse_pair(pair: &str) -> Result<ResponseCode, ValidationError> {
    let (name, code) = pair
        .split_once(['=', ':'])
        .ok_or_else(|| ValidationError::MalformedPair(pair.trim().to_string()))?;
    validate_case(name, code)
}

/// Validates a whole request. Rules are checked in order: name, each pair,
/// duplicates, at least one case.
pub fn validate(raw: &RawGenerate, suffix: &str) -> Result<GenerateRequest, ValidationError> {
    let base_name = validate_base_name(&raw.name, suffix)?;

    let cases = raw
        .cases
        .iter()
        .map(|pair| parse_pair(pair))
        .collect::<Result<Vec<_>, _>>()?;

    if cases.is_empty() {
        return Err(ValidationError::NoCases);
    }

    let group = CodeGroup::new(format!("{}{}", base_name, suffix), cases)?;
    Ok(GenerateRequest { base_name, group })
}

/// HTTP status given to a generated case: the code itself when it is one of
/// the common client or gateway errors, else 500.
pub fn http_status_for(code: u32) -> u16 {
    match code {
        400 | 401 | 403 | 404 | 405 | 406 | 409 | 410 | 412 | 413 | 415 | 422 | 426 | 429
        | 502 | 503 | 504 => code as u16,
        _ => 500,
    }
}

/// Writes the manifest of `group` into `dir` as `{name}.json`.
pub fn write_manifest(dir: &Path, group: &CodeGroup, force: bool) -> Result<ManifestOutcome, Error> {
    let path = dir.join(format!("{}.json", group.name()));
    let existed = path.exists();
    if existed && !force {
        return Ok(ManifestOutcome::Skipped(path));
    }

    let mut rendered = serde_json::to_string_pretty(group)?;
    rendered.push('\n');
    write_if_changed(&path, rendered.as_bytes())?;
    info!(path = %path.display(), cases = group.len(), "wrote response-code manifest");

    Ok(if existed {
        ManifestOutcome::Overwritten(path)
    } else {
        ManifestOutcome::Created(path)
    })
}
