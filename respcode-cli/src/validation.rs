use std::path::Path;
use unic_langid::LanguageIdentifier;

/// Validation context for the commands that touch the filesystem
#[derive(Debug, Default)]
pub struct ValidationContext {
    pub manifest_dir: Option<String>,
    pub locales: Vec<String>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manifest_dir(mut self, dir: String) -> Self {
        self.manifest_dir = Some(dir);
        self
    }

    pub fn with_locale(mut self, locale: String) -> Self {
        self.locales.push(locale);
        self
    }
}

/// Validate file path exists and is readable
pub fn validate_file_path(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        return Err(format!("File does not exist: {}", path));
    }

    if !path_obj.is_file() {
        return Err(format!("Path is not a file: {}", path));
    }

    Ok(())
}

/// Validate that a directory either exists or can be created
pub fn validate_output_dir(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if path_obj.exists() && !path_obj.is_dir() {
        return Err(format!("Path is not a directory: {}", path));
    }

    if !path_obj.exists()
        && let Err(e) = std::fs::create_dir_all(path_obj)
    {
        return Err(format!("Cannot create directory {}: {}", path, e));
    }

    Ok(())
}

/// Validate locale format using unic-langid (same as the library)
pub fn validate_locale(locale: &str) -> Result<(), String> {
    if locale.trim().is_empty() {
        return Err("Locale cannot be empty".to_string());
    }

    // Catalog locales are often written with underscores (`pt_BR`)
    match locale.trim().replace('_', "-").parse::<LanguageIdentifier>() {
        Ok(_) => Ok(()),
        Err(_) => Err(format!(
            "Invalid locale: {}. Expected a BCP 47 language identifier such as en or pt-BR",
            locale
        )),
    }
}

/// Validate every locale of a comma-separated list
pub fn validate_locale_list(list: &str) -> Result<(), String> {
    let mut seen = 0;
    for locale in list.split(',').filter(|l| !l.trim().is_empty()) {
        validate_locale(locale)?;
        seen += 1;
    }

    if seen == 0 {
        return Err("No valid locale specified (use --locale en or configure translations.locales)".to_string());
    }

    Ok(())
}

/// Validate a complete validation context
pub fn validate_context(context: &ValidationContext) -> Result<(), String> {
    if let Some(ref dir) = context.manifest_dir {
        validate_output_dir(dir)
            .map_err(|e| format!("Manifest directory validation failed: {}", e))?;
    }

    for locale in &context.locales {
        validate_locale(locale).map_err(|e| format!("Locale validation failed: {}", e))?;
    }

    Ok(())
}
