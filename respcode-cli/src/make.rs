use std::io::{BufRead, IsTerminal, Write};

use respcode::{
    Config, SyncOptions as LibSyncOptions, TranslationSync,
    generate::{ManifestOutcome, RawGenerate, parse_pair, split_pairs, validate, write_manifest},
    normalize_locales,
};

use crate::validation::{ValidationContext, validate_context, validate_locale_list};

#[derive(Debug, Clone, Default)]
pub struct MakeOptions {
    pub name: Option<String>,
    /// Comma-separated `Name=Code` pairs, possibly repeated.
    pub cases: Vec<String>,
    pub locales: Option<String>,
    pub force: bool,
    /// Seed catalogs with each case's declared message instead of the pattern.
    pub use_messages: bool,
}

/// Asks for whatever `raw` is missing: the group name, then cases until an
/// empty line. Invalid pairs are rejected and asked again.
pub fn prompt_missing<R: BufRead, W: Write>(
    raw: &mut RawGenerate,
    input: &mut R,
    output: &mut W,
) -> Result<(), String> {
    let io_err = |e: std::io::Error| format!("Failed to read input: {}", e);

    if raw.name.trim().is_empty() {
        write!(output, "Group name (e.g. User): ").map_err(io_err)?;
        output.flush().map_err(io_err)?;
        raw.name = read_line(input).map_err(io_err)?;
    }

    if raw.cases.is_empty() {
        writeln!(output, "Enter cases as Name=Code, empty line to finish.").map_err(io_err)?;
        loop {
            write!(output, "case> ").map_err(io_err)?;
            output.flush().map_err(io_err)?;
            let line = read_line(input).map_err(io_err)?;
            if line.is_empty() {
                break;
            }
            for pair in split_pairs(&line) {
                match parse_pair(&pair) {
                    Ok(_) => raw.cases.push(pair),
                    Err(e) => writeln!(output, "  {}", e).map_err(io_err)?,
                }
            }
        }
    }

    Ok(())
}

/// Reads one trimmed line; end of input reads as an empty line.
fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn run_make_command(config: &Config, opts: MakeOptions) -> Result<(), String> {
    let mut context = ValidationContext::new();
    if let Some(list) = &opts.locales {
        validate_locale_list(list)?;
        for locale in split_pairs(list) {
            context = context.with_locale(locale);
        }
    }
    validate_context(&context)?;

    let mut raw = RawGenerate::new(opts.name.clone().unwrap_or_default());
    for list in &opts.cases {
        raw = raw.with_case_list(list);
    }

    if raw.name.trim().is_empty() || raw.cases.is_empty() {
        if !std::io::stdin().is_terminal() {
            return Err(
                "A group name and at least one case (--cases Name=Code) are required when not running interactively"
                    .to_string(),
            );
        }
        let stdin = std::io::stdin();
        prompt_missing(&mut raw, &mut stdin.lock(), &mut std::io::stdout())?;
    }

    let request = validate(&raw, &config.cases.suffix).map_err(|e| format!("Validation failed: {}", e))?;
    validate_context(
        &ValidationContext::new().with_manifest_dir(config.cases.dir.to_string_lossy().into_owned()),
    )?;

    let outcome = write_manifest(&config.cases.dir, &request.group, opts.force)
        .map_err(|e| format!("Error writing manifest: {}", e))?;
    match &outcome {
        ManifestOutcome::Created(path) => println!("✅ Created {}", path.display()),
        ManifestOutcome::Overwritten(path) => println!("✅ Overwrote {}", path.display()),
        ManifestOutcome::Skipped(path) => {
            println!(
                "⚠️  {} already exists, keeping it (use --force to overwrite)",
                path.display()
            );
            return Ok(());
        }
    }

    let locales = normalize_locales(opts.locales.as_deref(), &config.translations.locales);
    let options = LibSyncOptions {
        prefer_declared_messages: opts.use_messages,
        dry_run: false,
    };
    let report = TranslationSync::from_config(config)
        .sync(&request.group, &locales, &options)
        .map_err(|e| format!("Error syncing translations: {}", e))?;

    println!(
        "🌐 {}: {} message(s) added, {} already present ({})",
        report.group,
        report.added,
        report.already_present,
        locales.join(", ")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prompt_fills_name_and_cases() {
        let mut raw = RawGenerate::default();
        let mut input = Cursor::new("Order\nOrderNotFound=4040, OrderLocked:4091\nbad pair\n\n");
        let mut output = Vec::new();

        prompt_missing(&mut raw, &mut input, &mut output).unwrap();
        assert_eq!(raw.name, "Order");
        assert_eq!(raw.cases, vec!["OrderNotFound=4040", "OrderLocked:4091"]);

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Group name"));
        assert!(shown.contains("bad pair"));
    }

    #[test]
    fn test_prompt_keeps_given_values() {
        let mut raw = RawGenerate::new("User").with_case("UserNotFound=3000");
        let mut input = Cursor::new("should not be read\n");
        let mut output = Vec::new();

        prompt_missing(&mut raw, &mut input, &mut output).unwrap();
        assert_eq!(raw.name, "User");
        assert_eq!(raw.cases.len(), 1);
        assert!(output.is_empty());
    }

    #[test]
    fn test_prompt_stops_at_end_of_input() {
        let mut raw = RawGenerate::new("User");
        let mut input = Cursor::new("UserNotFound=3000\n");
        let mut output = Vec::new();

        prompt_missing(&mut raw, &mut input, &mut output).unwrap();
        assert_eq!(raw.cases, vec!["UserNotFound=3000"]);
    }
}
