use std::process::ExitCode;

use clap::{Parser, Subcommand};
use respcode_cli::{
    load_config,
    make::{MakeOptions, run_make_command},
    preview::{PreviewOptions, run_preview_command},
    sync::{SyncOptions, run_sync_command},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (TOML or JSON); defaults to ./respcode.toml when present
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log library activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a response-code group manifest and seed its messages.
    Make {
        /// Group name, with or without the suffix (e.g. User or UserRespCode)
        name: Option<String>,

        /// Cases as comma-separated Name=Code pairs (e.g. UserNotFound=3000,UserBanned:3001)
        #[arg(long, value_name = "PAIRS")]
        cases: Vec<String>,

        /// Target locales (comma-separated); defaults to translations.locales
        #[arg(short, long)]
        locale: Option<String>,

        /// Overwrite an existing manifest
        #[arg(short, long)]
        force: bool,

        /// Seed catalogs with each case's declared message
        #[arg(long)]
        use_messages: bool,
    },

    /// Fill missing messages into the catalogs of one or all groups.
    Sync {
        /// Group to sync; all discovered groups when omitted
        group: Option<String>,

        /// Sync all groups found in the manifest directory
        #[arg(long)]
        all: bool,

        /// Target locales (comma-separated); defaults to translations.locales
        #[arg(short, long)]
        locale: Option<String>,

        /// Report what would be added without writing
        #[arg(long)]
        dry_run: bool,

        /// Seed catalogs with each case's declared message
        #[arg(long)]
        use_messages: bool,

        /// Write a JSON report of the run to this path
        #[arg(long, value_name = "PATH")]
        report_json: Option<String>,
    },

    /// Print the response an error would produce.
    Preview {
        /// Plain error message
        #[arg(short, long, conflicts_with = "case")]
        message: Option<String>,

        /// Typed case as Group::Case (e.g. Main::NotFound)
        #[arg(long)]
        case: Option<String>,

        /// Code override
        #[arg(long)]
        code: Option<String>,

        /// HTTP status override
        #[arg(long)]
        status: Option<u16>,

        /// Locale used to translate typed cases
        #[arg(short, long)]
        locale: Option<String>,

        /// Include debug meta
        #[arg(long)]
        debug: bool,

        /// Show the maintenance response instead
        #[arg(long, conflicts_with_all = ["message", "case"])]
        maintenance: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env("RESPCODE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "respcode=debug,respcode_cli=debug"
        } else {
            "respcode=warn"
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!(cases = %config.cases.dir.display(), catalogs = %config.translations.base_path.display(), "configuration loaded");

    let result = match args.commands {
        Commands::Make {
            name,
            cases,
            locale,
            force,
            use_messages,
        } => run_make_command(
            &config,
            MakeOptions {
                name,
                cases,
                locales: locale,
                force,
                use_messages,
            },
        ),
        Commands::Sync {
            group,
            all,
            locale,
            dry_run,
            use_messages,
            report_json,
        } => run_sync_command(
            &config,
            SyncOptions {
                group,
                all,
                locales: locale,
                dry_run,
                use_messages,
                report_json,
            },
        )
        .map(|_| ()),
        Commands::Preview {
            message,
            case,
            code,
            status,
            locale,
            debug,
            maintenance,
        } => run_preview_command(
            config,
            PreviewOptions {
                message,
                case,
                code,
                status,
                locale,
                debug,
                maintenance,
            },
        )
        .and_then(|response| {
            let text = serde_json::to_string_pretty(&response)
                .map_err(|e| format!("Failed to serialize response: {}", e))?;
            println!("{}", text);
            Ok(())
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
