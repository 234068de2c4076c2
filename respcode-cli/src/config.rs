//! Loading the workspace configuration from TOML or JSON.

use std::path::Path;

use respcode::Config;

use crate::validation::validate_file_path;

/// Picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "respcode.toml";

/// Loads `path`, or [`DEFAULT_CONFIG_FILE`] when present, or the defaults.
pub fn load_config(path: Option<&str>) -> Result<Config, String> {
    match path {
        Some(path) => {
            validate_file_path(path)?;
            read_config(Path::new(path))
        }
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            read_config(Path::new(DEFAULT_CONFIG_FILE))
        }
        None => Ok(Config::default()),
    }
}

fn read_config(path: &Path) -> Result<Config, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Config::from_json_str(&text)
            .map_err(|e| format!("Invalid JSON config '{}': {}", path.display(), e))
    } else {
        toml::from_str(&text).map_err(|e| format!("Invalid TOML config '{}': {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use respcode::{ErrorCode, Layout};
    use tempfile::TempDir;

    #[test]
    fn test_load_toml_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("respcode.toml");
        std::fs::write(
            &path,
            r#"
default_error_code = 9000
app_debug = true

[cases]
dir = "codes"

[translations]
base_path = "resources/lang"
layout = "locale-file"
locales = ["en", "uz"]
"#,
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.default_error_code, ErrorCode::Int(9000));
        assert!(config.app_debug);
        assert_eq!(config.cases.dir, Path::new("codes"));
        assert_eq!(config.cases.suffix, "RespCode");
        assert_eq!(config.translations.layout, Layout::LocaleFile);
        assert_eq!(config.translations.locales, vec!["en", "uz"]);
    }

    #[test]
    fn test_load_json_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("respcode.json");
        std::fs::write(&path, r#"{"default_error_code": "E_UNKNOWN"}"#).unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.default_error_code, ErrorCode::Text("E_UNKNOWN".to_string()));
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.toml");
        std::fs::write(&path, "layout = [").unwrap();

        let err = load_config(path.to_str()).unwrap_err();
        assert!(err.contains("Invalid TOML config"));
        assert!(load_config(Some("/no/such/respcode.toml")).is_err());
    }
}
