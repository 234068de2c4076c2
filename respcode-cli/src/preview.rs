use std::sync::Arc;

use respcode::{
    ApiResponse, CaseProvider, Config, ErrorCode, ErrorHandler, ErrorInput, ErrorResponse,
    ManifestDirectory, Overrides, TranslatorRegistry, TypedCase,
};

use crate::validation::validate_locale;

#[derive(Debug, Clone, Default)]
pub struct PreviewOptions {
    pub message: Option<String>,
    /// `Group::Case`, `Group.Case` or `Group/Case`.
    pub case: Option<String>,
    pub code: Option<String>,
    pub status: Option<u16>,
    pub locale: Option<String>,
    /// Force debug meta on and attach the call site as context.
    pub debug: bool,
    pub maintenance: bool,
}

/// Splits `Group::Case` into its two names.
pub fn parse_case_ref(reference: &str) -> Result<(&str, &str), String> {
    let (group, case) = reference
        .split_once("::")
        .or_else(|| reference.split_once(['.', '/']))
        .ok_or_else(|| format!("Invalid case reference '{}': expected Group::Case", reference))?;

    let (group, case) = (group.trim(), case.trim());
    if group.is_empty() || case.is_empty() {
        return Err(format!("Invalid case reference '{}': expected Group::Case", reference));
    }
    Ok((group, case))
}

fn resolve_case(config: &Config, reference: &str) -> Result<TypedCase, String> {
    let (group_name, case_name) = parse_case_ref(reference)?;
    let provider = ManifestDirectory::new(&config.cases.dir)
        .with_suffix(&config.cases.suffix)
        .with_builtin();
    let group = provider
        .load_group(group_name)
        .map_err(|e| format!("Cannot load group '{}': {}", group_name, e))?;

    group
        .case(case_name, &config.cases.suffix)
        .ok_or_else(|| format!("Group '{}' has no case '{}'", group.name(), case_name))
}

/// Renders the response a message or case would produce.
pub fn run_preview_command(config: Config, opts: PreviewOptions) -> Result<ApiResponse, String> {
    if let Some(locale) = &opts.locale {
        validate_locale(locale)?;
    }

    let mut config = config;
    if opts.debug {
        config.force_debug_meta = Some(true);
    }
    let locale = opts
        .locale
        .clone()
        .unwrap_or_else(|| config.translations.locale_fallback.clone());

    let handler = ErrorHandler::from_registry(Arc::new(config.clone()), &TranslatorRegistry::new())
        .map_err(|e| format!("Cannot create error handler: {}", e))?
        .with_locale(locale);

    if opts.maintenance {
        return Ok(handler.maintenance_response());
    }

    let input: ErrorInput = match (&opts.case, &opts.message) {
        (Some(reference), _) => {
            let case = resolve_case(&config, reference)?;
            if opts.debug {
                ErrorResponse::from_case(case).into()
            } else {
                case.into()
            }
        }
        (None, Some(message)) if opts.debug => ErrorResponse::new(message.as_str()).into(),
        (None, Some(message)) => message.as_str().into(),
        (None, None) => return Err("Nothing to preview: pass --message or --case".to_string()),
    };

    let mut overrides = Overrides::none();
    if let Some(code) = &opts.code {
        overrides = overrides.with_code(ErrorCode::from(code.as_str()));
    }
    if let Some(status) = opts.status {
        overrides = overrides.with_http_status(status);
    }

    Ok(handler.handle(input, &overrides))
}
