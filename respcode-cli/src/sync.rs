use crate::validation::{validate_locale_list, validate_output_dir};
use respcode::{
    BatchReport, CaseProvider, Config, ManifestDirectory, SyncOptions as LibSyncOptions,
    TranslationSync, normalize_locales,
};
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Group to sync; every discovered group when `None`.
    pub group: Option<String>,
    pub all: bool,
    pub locales: Option<String>,
    pub dry_run: bool,
    pub use_messages: bool,
    pub report_json: Option<String>,
}

fn provider_for(config: &Config) -> ManifestDirectory {
    ManifestDirectory::new(&config.cases.dir)
        .with_suffix(&config.cases.suffix)
        .with_builtin()
}

fn write_report(
    path: &str,
    options: &SyncOptions,
    locales: &[String],
    batch: &BatchReport,
) -> Result<(), String> {
    let payload = json!({
        "group": options.group,
        "locales": locales,
        "dry_run": options.dry_run,
        "summary": {
            "groups": batch.reports.len(),
            "added": batch.added(),
            "already_present": batch.already_present(),
            "failed": batch.failures.len(),
        },
        "reports": batch.reports,
        "failures": batch.failures,
    });

    let text = serde_json::to_string_pretty(&payload)
        .map_err(|e| format!("Failed to serialize report JSON: {}", e))?;
    std::fs::write(path, text).map_err(|e| format!("Failed to write report JSON '{}': {}", path, e))
}

fn print_batch(batch: &BatchReport, dry_run: bool) {
    for report in &batch.reports {
        println!(
            "🔄 {} ({} case(s)): {} added, {} already present",
            report.group, report.total_cases, report.added, report.already_present
        );
        for location in &report.written {
            println!("   ✏️  {}", location);
        }
    }
    for failure in &batch.failures {
        eprintln!("❌ {}: {}", failure.group, failure.reason);
    }

    let verb = if dry_run { "Would add" } else { "Added" };
    println!(
        "{} {} message(s) across {} group(s), {} already present",
        verb,
        batch.added(),
        batch.reports.len(),
        batch.already_present()
    );
}

/// Syncs one group, or every discovered group, and returns the batch.
///
/// Fails when a locale is invalid, when a named group cannot be loaded, or
/// when any group of the batch failed. The batch is still printed and, if
/// requested, written as a JSON report before failing.
pub fn run_sync_command(config: &Config, opts: SyncOptions) -> Result<BatchReport, String> {
    if let Some(list) = &opts.locales {
        validate_locale_list(list)?;
    }
    if let Some(report) = &opts.report_json
        && let Some(parent) = std::path::Path::new(report).parent()
        && !parent.as_os_str().is_empty()
    {
        validate_output_dir(&parent.to_string_lossy())?;
    }

    let locales = normalize_locales(opts.locales.as_deref(), &config.translations.locales);
    if locales.is_empty() {
        return Err(
            "No valid locale specified (use --locale en or configure translations.locales)"
                .to_string(),
        );
    }

    let options = LibSyncOptions {
        prefer_declared_messages: opts.use_messages,
        dry_run: opts.dry_run,
    };
    let engine = TranslationSync::from_config(config);
    let provider = provider_for(config);

    let batch = match opts.group.as_deref().filter(|_| !opts.all) {
        Some(name) => {
            let group = provider
                .load_group(name)
                .map_err(|e| format!("Cannot load group '{}': {}", name, e))?;
            let report = engine
                .sync(&group, &locales, &options)
                .map_err(|e| format!("Error syncing '{}': {}", group.name(), e))?;
            BatchReport {
                reports: vec![report],
                failures: Vec::new(),
            }
        }
        None => engine
            .sync_all(&provider, &locales, &options)
            .map_err(|e| format!("Error discovering groups: {}", e))?,
    };

    print_batch(&batch, opts.dry_run);
    if let Some(path) = &opts.report_json {
        write_report(path, &opts, &locales, &batch)?;
    }

    if batch.is_success() {
        Ok(batch)
    } else {
        Err(format!("{} group(s) failed to sync", batch.failures.len()))
    }
}
